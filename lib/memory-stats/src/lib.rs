//! Process and system memory querying.
//!
//! This crate provides a cross-platform way to query the resident and virtual memory usage of the calling process,
//! as well as the free and total physical memory of the system it runs on. All values are reported in bytes.
//!
//! ## Linux / Android
//!
//! On Linux and Android, [procfs](https://docs.kernel.org/filesystems/proc.html) is used. Process values come from
//! the labeled fields of `/proc/self/status` (`VmRSS` and `VmSize`), and system values from `/proc/meminfo`
//! (`MemTotal` for total memory, and `MemFree` plus `Cached` for free memory, as page cache can be reclaimed under
//! pressure).
//!
//! ## macOS / iOS
//!
//! On Apple platforms, we query the kernel directly for Mach task and host information. Process values are the
//! `resident_size` and `virtual_size` fields of `mach_task_basic_info`, free memory is derived from the host's
//! 64-bit virtual memory statistics, and total memory comes from `sysctl`.
//!
//! ## Windows
//!
//! On Windows, `GetProcessMemoryInfo` provides the process counters (working set size, and pagefile usage for the
//! committed virtual size) and `GlobalMemoryStatusEx` the system-wide ones.
//!
//! ## Other platforms
//!
//! On all other platforms, every query returns `None`.

#[cfg(any(target_os = "linux", target_os = "android"))]
mod linux;

#[cfg(any(target_os = "linux", target_os = "android"))]
pub use linux::{ProcessQuerier, SystemQuerier};

#[cfg(any(target_os = "macos", target_os = "ios"))]
mod darwin;

#[cfg(any(target_os = "macos", target_os = "ios"))]
pub use darwin::{ProcessQuerier, SystemQuerier};

#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "windows")]
pub use windows::{ProcessQuerier, SystemQuerier};

#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios",
    target_os = "windows"
)))]
mod fallback {
    /// A process memory usage querier.
    #[derive(Default)]
    pub struct ProcessQuerier;

    impl ProcessQuerier {
        /// Gets the resident memory of this process, in bytes.
        ///
        /// Always `None` on this platform.
        pub fn resident_memory(&mut self) -> Option<u64> {
            None
        }

        /// Gets the virtual memory of this process, in bytes.
        ///
        /// Always `None` on this platform.
        pub fn virtual_memory(&mut self) -> Option<u64> {
            None
        }
    }

    /// A system memory usage querier.
    #[derive(Default)]
    pub struct SystemQuerier;

    impl SystemQuerier {
        /// Gets the free physical memory of the system, in bytes.
        ///
        /// Always `None` on this platform.
        pub fn free_memory(&mut self) -> Option<u64> {
            None
        }

        /// Gets the total physical memory of the system, in bytes.
        ///
        /// Always `None` on this platform.
        pub fn total_memory(&mut self) -> Option<u64> {
            None
        }
    }
}

#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios",
    target_os = "windows"
)))]
pub use fallback::{ProcessQuerier, SystemQuerier};
