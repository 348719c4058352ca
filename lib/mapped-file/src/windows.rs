use std::{fs::File, io, os::windows::io::AsRawHandle as _, ptr};

use tracing::error;
use windows_sys::Win32::{
    Foundation::{CloseHandle, HANDLE},
    System::Memory::{
        CreateFileMappingW, MapViewOfFile, UnmapViewOfFile, FILE_MAP_READ, MEMORY_MAPPED_VIEW_ADDRESS, PAGE_READONLY,
    },
};

pub(crate) struct Mapping {
    mapping: HANDLE,
    view: MEMORY_MAPPED_VIEW_ADDRESS,
}

impl Mapping {
    pub(crate) fn map(file: &File, _len: usize) -> io::Result<Self> {
        // SAFETY: The file handle is valid for the duration of the call, and a zero high/low size pair sizes the
        // mapping to the entire file.
        let mapping = unsafe {
            CreateFileMappingW(
                file.as_raw_handle() as HANDLE,
                ptr::null(),
                PAGE_READONLY,
                0,
                0,
                ptr::null(),
            )
        };
        if mapping.is_null() {
            return Err(io::Error::last_os_error());
        }

        // SAFETY: `mapping` is a valid file mapping handle, and a zero length maps the whole mapping.
        let view = unsafe { MapViewOfFile(mapping, FILE_MAP_READ, 0, 0, 0) };
        if view.Value.is_null() {
            let source = io::Error::last_os_error();

            // SAFETY: `mapping` was returned by `CreateFileMappingW` and has not been closed yet.
            unsafe { CloseHandle(mapping) };

            return Err(source);
        }

        Ok(Self { mapping, view })
    }

    pub(crate) fn ptr(&self) -> *const u8 {
        self.view.Value as *const u8
    }
}

impl Drop for Mapping {
    fn drop(&mut self) {
        // SAFETY: The view and the mapping handle are both live and owned exclusively by us, and this is the only
        // place either is ever released.
        let unmapped = unsafe { UnmapViewOfFile(self.view) };
        if unmapped == 0 {
            // Nothing can be done about it here, and a drop must not panic: log it and move on.
            error!(error = %io::Error::last_os_error(), "Failed to unmap file view.");
        }

        // SAFETY: As above.
        let closed = unsafe { CloseHandle(self.mapping) };
        if closed == 0 {
            error!(error = %io::Error::last_os_error(), "Failed to close file mapping handle.");
        }
    }
}
