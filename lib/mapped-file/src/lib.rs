//! Scoped, read-only memory-mapped files.
//!
//! [`MappedFile`] maps a file's entire contents into the process's address space, exposing them as a byte slice
//! without explicit read calls, and releases the mapping when dropped. Acquisition and release are strictly
//! one-to-one on every exit path, including failures partway through mapping, so the underlying OS resources (file
//! descriptor, mapping handle, mapped view) can never leak.
#![deny(warnings)]
#![deny(missing_docs)]

use std::{
    fs::File,
    io,
    path::{Path, PathBuf},
    slice,
};

use snafu::{OptionExt as _, ResultExt as _, Snafu};

#[cfg(unix)]
mod unix;
#[cfg(unix)]
use self::unix as sys;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
use self::windows as sys;

#[cfg(not(any(unix, windows)))]
mod unsupported;
#[cfg(not(any(unix, windows)))]
use self::unsupported as sys;

/// A file mapping error.
#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)))]
pub enum MapError {
    /// The file could not be opened or examined.
    #[snafu(display("Failed to open '{}'.", path.display()))]
    Open {
        /// Path of the file that could not be opened.
        path: PathBuf,

        /// Error source.
        source: io::Error,
    },

    /// The file is empty.
    ///
    /// Zero-length mappings are invalid at the OS level, so empty files cannot be mapped.
    #[snafu(display("Cannot map empty file '{}'.", path.display()))]
    Empty {
        /// Path of the empty file.
        path: PathBuf,
    },

    /// The file is too large to map in a single view.
    #[snafu(display("Cannot map '{}': length {} exceeds the address space.", path.display(), len))]
    TooLarge {
        /// Path of the oversized file.
        path: PathBuf,

        /// Length of the file, in bytes.
        len: u64,
    },

    /// The mapping could not be created.
    #[snafu(display("Failed to map '{}' into memory.", path.display()))]
    Map {
        /// Path of the file that could not be mapped.
        path: PathBuf,

        /// Error source.
        source: io::Error,
    },
}

/// A read-only view of a file, mapped into memory.
///
/// The view covers the entire file as it existed when the mapping was created: [`len`](Self::len) always equals the
/// file's on-disk size at that point, and [`data`](Self::data) exposes exactly its contents. The mapping is released
/// when the value is dropped, after which the underlying file can be reopened, rewritten, or deleted freely.
pub struct MappedFile {
    mapping: sys::Mapping,
    len: usize,
}

impl MappedFile {
    /// Maps the file at `path` into memory, read-only.
    ///
    /// ## Errors
    ///
    /// If the file cannot be opened or examined, is empty, or the mapping itself cannot be created, an error is
    /// returned. No OS resources are held in any error case.
    pub fn open<P>(path: P) -> Result<Self, MapError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let file = File::open(path).context(Open { path })?;
        let file_len = file.metadata().context(Open { path })?.len();

        if file_len == 0 {
            return Empty { path }.fail();
        }

        let len = usize::try_from(file_len).ok().context(TooLarge { path, len: file_len })?;

        // The descriptor (or handle) backing `file` only needs to live for the duration of this call: the mapping
        // keeps its own reference to the file once created.
        let mapping = sys::Mapping::map(&file, len).context(Map { path })?;

        Ok(Self { mapping, len })
    }

    /// Returns the mapped bytes.
    pub fn data(&self) -> &[u8] {
        // SAFETY: The mapping is valid for `len` bytes, read-only, and lives for as long as `self` does.
        unsafe { slice::from_raw_parts(self.mapping.ptr(), self.len) }
    }

    /// Returns the length of the mapping, in bytes.
    ///
    /// Always equal to the size of the file at the time it was mapped.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the mapping is empty.
    ///
    /// In practice this is always `false`, as empty files cannot be mapped.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl AsRef<[u8]> for MappedFile {
    fn as_ref(&self) -> &[u8] {
        self.data()
    }
}

// SAFETY: The view is immutable, privately mapped, and not tied to any thread-local state, so both shared and
// transferred access across threads are sound.
unsafe impl Send for MappedFile {}
unsafe impl Sync for MappedFile {}
