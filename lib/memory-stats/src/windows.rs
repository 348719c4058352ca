use std::mem::MaybeUninit;

use windows_sys::Win32::System::{
    ProcessStatus::{GetProcessMemoryInfo, PROCESS_MEMORY_COUNTERS},
    SystemInformation::{GlobalMemoryStatusEx, MEMORYSTATUSEX},
    Threading::GetCurrentProcess,
};

/// A process memory usage querier.
#[derive(Default)]
pub struct ProcessQuerier;

impl ProcessQuerier {
    /// Gets the resident memory of this process, in bytes.
    ///
    /// This is the working set size: the pages of the process currently backed by physical memory. If the value
    /// cannot be determined, `None` is returned, which should generally be considered an incredibly rare/unlikely
    /// event.
    pub fn resident_memory(&mut self) -> Option<u64> {
        process_memory_counters().map(|pmc| pmc.WorkingSetSize as u64)
    }

    /// Gets the virtual memory of this process, in bytes.
    ///
    /// This is the pagefile usage, i.e. the commit charge: the address space the process has committed, whether or
    /// not it is currently resident. If the value cannot be determined, `None` is returned.
    pub fn virtual_memory(&mut self) -> Option<u64> {
        process_memory_counters().map(|pmc| pmc.PagefileUsage as u64)
    }
}

fn process_memory_counters() -> Option<PROCESS_MEMORY_COUNTERS> {
    // Prepare a holding struct for the process memory counters.
    let mut pmc = MaybeUninit::<PROCESS_MEMORY_COUNTERS>::uninit();
    let pmc_len = std::mem::size_of::<PROCESS_MEMORY_COUNTERS>() as u32;

    // SAFETY: We're passing a valid pointer, and byte length, for the counters output.
    let result = unsafe { GetProcessMemoryInfo(GetCurrentProcess(), pmc.as_mut_ptr(), pmc_len) };
    match result {
        // Failed to get the process memory counters.
        //
        // This could be for a number of reasons, but should generally be considered an incredibly rare/unlikely event.
        0 => None,

        // SAFETY: We know the structure has been populated by `GetProcessMemoryInfo` at this point.
        _ => Some(unsafe { pmc.assume_init() }),
    }
}

/// A system memory usage querier.
#[derive(Default)]
pub struct SystemQuerier;

impl SystemQuerier {
    /// Gets the free physical memory of the system, in bytes.
    ///
    /// This is the available physical memory reported by `GlobalMemoryStatusEx`, which includes standby pages the
    /// system can repurpose without paging. If the value cannot be determined, `None` is returned.
    pub fn free_memory(&mut self) -> Option<u64> {
        memory_status().map(|status| status.ullAvailPhys)
    }

    /// Gets the total physical memory of the system, in bytes.
    ///
    /// If the value cannot be determined, `None` is returned.
    pub fn total_memory(&mut self) -> Option<u64> {
        memory_status().map(|status| status.ullTotalPhys)
    }
}

fn memory_status() -> Option<MEMORYSTATUSEX> {
    let mut status = MaybeUninit::<MEMORYSTATUSEX>::uninit();

    // SAFETY: `dwLength` must describe the structure size before the call, and is the only field the call reads.
    unsafe {
        (*status.as_mut_ptr()).dwLength = std::mem::size_of::<MEMORYSTATUSEX>() as u32;
    }

    // SAFETY: We're passing a valid pointer to a length-initialized structure.
    let result = unsafe { GlobalMemoryStatusEx(status.as_mut_ptr()) };
    match result {
        0 => None,

        // SAFETY: We know the structure has been populated by `GlobalMemoryStatusEx` at this point.
        _ => Some(unsafe { status.assume_init() }),
    }
}
