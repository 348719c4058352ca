use std::{fs::File, io};

pub(crate) struct Mapping;

impl Mapping {
    pub(crate) fn map(_file: &File, _len: usize) -> io::Result<Self> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "file mapping is not supported on this platform",
        ))
    }

    pub(crate) fn ptr(&self) -> *const u8 {
        // `map` never succeeds here, so no `Mapping` can exist to call this on.
        unreachable!()
    }
}
