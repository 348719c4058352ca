//! The host-facing plugin surface.
//!
//! This crate exposes the memory queries and the file mapping pair through a fixed C ABI, for consumption by an
//! external host runtime that loads the library dynamically (`cdylib`) or links it into its own binary
//! (`staticlib`). The export names match the host's existing import declarations and must not change.
//!
//! All failures are encoded in return values, never surfaced as unwinding: memory queries report 0 when a value is
//! unavailable, and mapping reports a null handle alongside a null data pointer and a length of -1. The host is
//! expected to treat these as "value unavailable on this platform/configuration" rather than retry.
//!
//! No process-global facilities (allocators, logging subscribers, panic hooks) are installed here: the host owns
//! those. Diagnostic events are emitted through `tracing` and go nowhere unless the embedding process has installed
//! a subscriber of its own.

// The export names are fixed by the host's import table.
#![allow(non_snake_case)]

use std::{
    ffi::{c_char, CStr},
    ptr,
};

use mapped_file::MappedFile;
use memory_stats::{ProcessQuerier, SystemQuerier};
use tracing::debug;

/// An open file mapping, owned by the host between a map call and its matching unmap call.
///
/// Opaque to the host: the only valid use of a non-null handle is passing it back to [`MemoryUnmapFile`] exactly
/// once.
pub struct MemoryMapping {
    _inner: MappedFile,
}

/// Gets the resident memory of the calling process, in bytes.
///
/// Returns 0 if the value cannot be determined.
#[no_mangle]
pub extern "C" fn ProcessResidentMemory() -> i64 {
    to_abi_count(ProcessQuerier::default().resident_memory())
}

/// Gets the virtual memory of the calling process, in bytes.
///
/// Returns 0 if the value cannot be determined.
#[no_mangle]
pub extern "C" fn ProcessVirtualMemory() -> i64 {
    to_abi_count(ProcessQuerier::default().virtual_memory())
}

/// Gets the free physical memory of the system, in bytes.
///
/// Returns 0 if the value cannot be determined.
#[no_mangle]
pub extern "C" fn SystemFreeMemory() -> i64 {
    to_abi_count(SystemQuerier::default().free_memory())
}

/// Gets the total physical memory of the system, in bytes.
///
/// Returns 0 if the value cannot be determined.
#[no_mangle]
pub extern "C" fn SystemTotalMemory() -> i64 {
    to_abi_count(SystemQuerier::default().total_memory())
}

/// Maps the file at `path` into memory, read-only.
///
/// On success, returns an opaque handle owning the mapping, and writes the address of the mapped bytes to
/// `out_data` and their length to `out_size`. On failure of any kind (null, unreadable, or non-UTF-8 path; missing
/// or empty file; the mapping itself failing), returns null and writes null/-1 instead. Either out-parameter may be
/// null, in which case it is skipped.
///
/// # Safety
///
/// `path` must be null or point to a valid NUL-terminated string, and `out_data`/`out_size` must each be null or
/// valid for writes.
#[no_mangle]
pub unsafe extern "C" fn MemoryMapFile(
    path: *const c_char, out_data: *mut *const u8, out_size: *mut i64,
) -> *mut MemoryMapping {
    // Write the failure values first, so that every early return below leaves the out-parameters in the documented
    // failure state.
    if !out_data.is_null() {
        // SAFETY: Non-null and valid for writes, per our contract.
        unsafe { out_data.write(ptr::null()) };
    }
    if !out_size.is_null() {
        // SAFETY: As above.
        unsafe { out_size.write(-1) };
    }

    if path.is_null() {
        return ptr::null_mut();
    }

    // SAFETY: `path` is non-null and NUL-terminated, per our contract.
    let raw_path = unsafe { CStr::from_ptr(path) };
    let path = match raw_path.to_str() {
        Ok(path) => path,
        Err(_) => {
            debug!("Mapping path is not valid UTF-8.");
            return ptr::null_mut();
        }
    };

    let mapped = match MappedFile::open(path) {
        Ok(mapped) => mapped,
        Err(error) => {
            debug!(%error, path, "Failed to map file.");
            return ptr::null_mut();
        }
    };

    if !out_data.is_null() {
        // SAFETY: As above.
        unsafe { out_data.write(mapped.data().as_ptr()) };
    }
    if !out_size.is_null() {
        // SAFETY: As above.
        unsafe { out_size.write(mapped.len() as i64) };
    }

    Box::into_raw(Box::new(MemoryMapping { _inner: mapped }))
}

/// Releases a mapping produced by a successful [`MemoryMapFile`] call.
///
/// A null handle is a no-op. The `data` and `size` arguments mirror the host wrapper's own bookkeeping and are not
/// consulted: the handle alone owns the mapping.
///
/// # Safety
///
/// `handle` must be null, or a value returned by a successful [`MemoryMapFile`] call that has not already been
/// passed to this function.
#[no_mangle]
pub unsafe extern "C" fn MemoryUnmapFile(handle: *mut MemoryMapping, _data: *const u8, _size: i64) {
    if handle.is_null() {
        return;
    }

    // SAFETY: `handle` came out of `Box::into_raw` in `MemoryMapFile`, and is reclaimed at most once per our
    // contract.
    drop(unsafe { Box::from_raw(handle) });
}

/// Converts a query result to its ABI encoding: the byte count on success, 0 on failure.
fn to_abi_count(value: Option<u64>) -> i64 {
    match value {
        // Counts beyond `i64::MAX` can't be represented in the ABI; clamp rather than wrap to a negative value the
        // host would misread.
        Some(bytes) => i64::try_from(bytes).unwrap_or(i64::MAX),
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use std::{ffi::CString, fs, ptr, slice};

    use super::*;

    #[test]
    fn memory_queries_never_negative() {
        assert!(ProcessResidentMemory() >= 0);
        assert!(ProcessVirtualMemory() >= 0);
        assert!(SystemFreeMemory() >= 0);
        assert!(SystemTotalMemory() >= 0);
    }

    #[cfg(any(
        target_os = "linux",
        target_os = "android",
        target_os = "macos",
        target_os = "ios",
        target_os = "windows"
    ))]
    #[test]
    fn system_total_at_least_free() {
        let total = SystemTotalMemory();
        let free = SystemFreeMemory();
        assert!(total > 0);
        assert!(total >= free);
    }

    #[test]
    fn map_and_unmap_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mapped.bin");
        fs::write(&path, b"twelve bytes").unwrap();

        let raw_path = CString::new(path.to_str().unwrap()).unwrap();
        let mut data: *const u8 = ptr::null();
        let mut size = 0i64;

        // SAFETY: Valid NUL-terminated path and valid out-pointers.
        let handle = unsafe { MemoryMapFile(raw_path.as_ptr(), &mut data, &mut size) };
        assert!(!handle.is_null());
        assert!(!data.is_null());
        assert_eq!(size, 12);

        // SAFETY: `data` points to `size` mapped bytes for as long as the handle stays open.
        let view = unsafe { slice::from_raw_parts(data, size as usize) };
        assert_eq!(view, b"twelve bytes");

        // SAFETY: `handle` came from a successful map call, unmapped exactly once.
        unsafe { MemoryUnmapFile(handle, data, size) };

        // The mapping is released, so the file can be rewritten.
        fs::write(&path, b"rewritten").unwrap();
    }

    #[test]
    fn map_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.bin");

        let raw_path = CString::new(path.to_str().unwrap()).unwrap();
        let mut data: *const u8 = ptr::null();
        let mut size = 0i64;

        // SAFETY: Valid NUL-terminated path and valid out-pointers.
        let handle = unsafe { MemoryMapFile(raw_path.as_ptr(), &mut data, &mut size) };
        assert!(handle.is_null());
        assert!(data.is_null());
        assert_eq!(size, -1);
    }

    #[test]
    fn map_empty_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.bin");
        fs::write(&path, b"").unwrap();

        let raw_path = CString::new(path.to_str().unwrap()).unwrap();
        let mut data: *const u8 = ptr::null();
        let mut size = 0i64;

        // SAFETY: Valid NUL-terminated path and valid out-pointers.
        let handle = unsafe { MemoryMapFile(raw_path.as_ptr(), &mut data, &mut size) };
        assert!(handle.is_null());
        assert!(data.is_null());
        assert_eq!(size, -1);
    }

    #[test]
    fn map_null_path_fails() {
        // Null out-parameters are allowed, and must simply be skipped.
        let handle = unsafe { MemoryMapFile(ptr::null(), ptr::null_mut(), ptr::null_mut()) };
        assert!(handle.is_null());
    }

    #[test]
    fn unmap_null_handle_is_noop() {
        // SAFETY: A null handle is explicitly allowed.
        unsafe { MemoryUnmapFile(ptr::null_mut(), ptr::null(), -1) };
    }
}
