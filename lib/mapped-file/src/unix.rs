use std::{fs::File, io, os::unix::io::AsRawFd as _, ptr};

use tracing::error;

pub(crate) struct Mapping {
    ptr: *mut libc::c_void,
    len: usize,
}

impl Mapping {
    pub(crate) fn map(file: &File, len: usize) -> io::Result<Self> {
        // SAFETY: We're mapping a valid, open descriptor with a length the kernel validates against the file, and
        // letting the kernel pick the placement address.
        let ptr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                len,
                libc::PROT_READ,
                libc::MAP_PRIVATE,
                file.as_raw_fd(),
                0,
            )
        };
        if ptr == libc::MAP_FAILED {
            return Err(io::Error::last_os_error());
        }

        Ok(Self { ptr, len })
    }

    pub(crate) fn ptr(&self) -> *const u8 {
        self.ptr as *const u8
    }
}

impl Drop for Mapping {
    fn drop(&mut self) {
        // SAFETY: `ptr` and `len` describe a live mapping created by `map`, and this is the only place it is ever
        // released.
        let result = unsafe { libc::munmap(self.ptr, self.len) };
        if result != 0 {
            // Nothing can be done about it here, and a drop must not panic: log it and move on.
            error!(error = %io::Error::last_os_error(), "Failed to unmap file.");
        }
    }
}
