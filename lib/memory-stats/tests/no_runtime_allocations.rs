//! Allocation test for the queriers.
//!
//! Note: this is an integration test as the global allocator must be overridden to track all allocations made, and
//! doing so in normal unit tests could interfere with other tests.

use dhat::{HeapStats, Profiler};
use memory_stats::{ProcessQuerier, SystemQuerier};

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

#[test]
fn no_runtime_allocations() {
    // This test ensures that after initially creating the queriers, there are _no_ runtime allocations made when
    // querying memory usage: the procfs backend's scan buffer is allocated once up front and reused, and the other
    // backends never touch the heap at all.
    //
    // This invariant should always hold, and should do so for all supported platforms.
    let mut process_querier = ProcessQuerier::default();
    let mut system_querier = SystemQuerier::default();

    let _profiler = Profiler::builder().testing().build();
    let _resident = process_querier.resident_memory().unwrap();
    let _resident = process_querier.resident_memory().unwrap();
    let _virtual = process_querier.virtual_memory().unwrap();
    let _free = system_querier.free_memory().unwrap();
    let _total = system_querier.total_memory().unwrap();
    let stats = HeapStats::get();

    dhat::assert_eq!(stats.total_blocks, 0);
    dhat::assert_eq!(stats.total_bytes, 0);
    dhat::assert_eq!(stats.max_blocks, 0);
    dhat::assert_eq!(stats.max_bytes, 0);
    dhat::assert_eq!(stats.curr_blocks, 0);
    dhat::assert_eq!(stats.curr_bytes, 0);
}
