use std::mem::MaybeUninit;

use libc::{
    host_statistics64, mach_msg_type_number_t, mach_port_t, mach_task_basic_info_data_t, mach_task_self, sysconf,
    sysctl, task_info, task_info_t, vm_statistics64, CTL_HW, HOST_VM_INFO64, HOST_VM_INFO64_COUNT, HW_MEMSIZE,
    KERN_SUCCESS, MACH_TASK_BASIC_INFO, MACH_TASK_BASIC_INFO_COUNT, _SC_PAGESIZE,
};

extern "C" {
    // Bound manually: libc exposes the host statistics call but not the port that feeds it.
    fn mach_host_self() -> mach_port_t;
}

/// A process memory usage querier.
#[derive(Default)]
pub struct ProcessQuerier;

impl ProcessQuerier {
    /// Gets the resident memory of this process, in bytes.
    ///
    /// This is the `resident_size` field of `mach_task_basic_info`, the documented successor of the older
    /// `task_basic_info` structure: the pages of the task currently backed by physical memory. Under memory
    /// pressure, this will track the task's dirty footprint closely. If the value cannot be determined, `None` is
    /// returned, which should generally be considered an incredibly rare/unlikely event.
    pub fn resident_memory(&mut self) -> Option<u64> {
        task_basic_info().map(|info| info.resident_size)
    }

    /// Gets the virtual memory of this process, in bytes.
    ///
    /// This is the `virtual_size` field of `mach_task_basic_info`: the total address space the task has reserved,
    /// whether or not it is backed by physical pages. If the value cannot be determined, `None` is returned.
    pub fn virtual_memory(&mut self) -> Option<u64> {
        task_basic_info().map(|info| info.virtual_size)
    }
}

fn task_basic_info() -> Option<mach_task_basic_info_data_t> {
    // Prepare a holding struct for the task info.
    //
    // This represents a set of integers, each relating to a specific task value, and `task_info` expects a pointer
    // to this struct and the number of integers it is able to write into it, which is already derived for us in
    // `MACH_TASK_BASIC_INFO_COUNT`.
    let mut basic_task_info = MaybeUninit::<mach_task_basic_info_data_t>::uninit();
    let mut basic_task_info_len = MACH_TASK_BASIC_INFO_COUNT;

    // SAFETY: We're passing a valid pointer, and struct length, for the task info output.
    let result = unsafe {
        task_info(
            mach_task_self(),
            MACH_TASK_BASIC_INFO,
            basic_task_info.as_mut_ptr() as task_info_t,
            &mut basic_task_info_len as *mut mach_msg_type_number_t,
        )
    };
    match result {
        // SAFETY: We know the structure has been populated by `task_info` at this point.
        KERN_SUCCESS => Some(unsafe { basic_task_info.assume_init() }),

        // Failed to get the task info.
        //
        // This could be for a number of reasons, but should generally be considered an incredibly rare/unlikely event.
        _ => None,
    }
}

/// A system memory usage querier.
#[derive(Default)]
pub struct SystemQuerier;

impl SystemQuerier {
    /// Gets the free physical memory of the system, in bytes.
    ///
    /// This is the host's free page count multiplied by the page size. Pages on the inactive list are not counted:
    /// the value tracks what the kernel itself reports as free. If the value cannot be determined, `None` is
    /// returned.
    pub fn free_memory(&mut self) -> Option<u64> {
        let page_size = page_size()?;

        let mut vm_stats = MaybeUninit::<vm_statistics64>::uninit();
        let mut vm_stats_len = HOST_VM_INFO64_COUNT;

        // SAFETY: We're passing a valid pointer, and struct length, for the statistics output.
        let result = unsafe {
            host_statistics64(
                mach_host_self(),
                HOST_VM_INFO64,
                vm_stats.as_mut_ptr() as *mut _,
                &mut vm_stats_len as *mut mach_msg_type_number_t,
            )
        };
        match result {
            // SAFETY: We know the structure has been populated by `host_statistics64` at this point.
            KERN_SUCCESS => {
                let vm_stats = unsafe { vm_stats.assume_init() };
                Some(u64::from(vm_stats.free_count) * page_size)
            }

            _ => None,
        }
    }

    /// Gets the total physical memory of the system, in bytes.
    ///
    /// This is the `hw.memsize` sysctl value. If the value cannot be determined, `None` is returned.
    pub fn total_memory(&mut self) -> Option<u64> {
        let mut total: u64 = 0;
        let mut total_len = std::mem::size_of::<u64>();
        let mut mib = [CTL_HW, HW_MEMSIZE];

        // SAFETY: We're passing a valid MIB array, and a valid pointer/length pair for the output value.
        let result = unsafe {
            sysctl(
                mib.as_mut_ptr(),
                mib.len() as libc::c_uint,
                &mut total as *mut u64 as *mut libc::c_void,
                &mut total_len,
                std::ptr::null_mut(),
                0,
            )
        };
        if result == 0 && total > 0 {
            Some(total)
        } else {
            None
        }
    }
}

fn page_size() -> Option<u64> {
    // SAFETY: No pointers involved; `sysconf` simply returns a value.
    let page_size = unsafe { sysconf(_SC_PAGESIZE) };
    if page_size <= 0 {
        None
    } else {
        Some(page_size as u64)
    }
}
