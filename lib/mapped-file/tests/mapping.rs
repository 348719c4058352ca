//! End-to-end tests for `MappedFile` against real files on disk.

use std::fs;

use mapped_file::{MapError, MappedFile};

#[test]
fn maps_file_contents_exactly() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.bin");
    fs::write(&path, b"hello mapped world").unwrap();

    let mapped = MappedFile::open(&path).unwrap();
    assert_eq!(mapped.len(), 18);
    assert!(!mapped.is_empty());
    assert_eq!(mapped.data(), b"hello mapped world");
    assert_eq!(mapped.as_ref(), b"hello mapped world");
}

#[test]
fn maps_file_crossing_page_boundary() {
    // 4097 bytes lands one byte past a typical page size, so the view has to span two pages and the trailing page
    // must still reflect the file rather than zero fill beyond its length.
    let contents = (0..4097u32).map(|n| n as u8).collect::<Vec<_>>();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pages.bin");
    fs::write(&path, &contents).unwrap();

    let mapped = MappedFile::open(&path).unwrap();
    assert_eq!(mapped.len(), contents.len());
    assert_eq!(mapped.data(), &contents[..]);
}

#[test]
fn nonexistent_file_fails() {
    let dir = tempfile::tempdir().unwrap();

    let result = MappedFile::open(dir.path().join("missing.bin"));
    assert!(matches!(result, Err(MapError::Open { .. })));
}

#[test]
fn empty_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.bin");
    fs::write(&path, b"").unwrap();

    let result = MappedFile::open(&path);
    assert!(matches!(result, Err(MapError::Empty { .. })));
}

#[test]
fn drop_releases_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reused.bin");
    fs::write(&path, b"first contents").unwrap();

    let mapped = MappedFile::open(&path).unwrap();
    assert_eq!(mapped.data(), b"first contents");
    drop(mapped);

    // With the mapping released, the file must be writable and deletable again. (On Windows in particular, a leaked
    // mapping handle would make both of these fail with a sharing violation.)
    fs::write(&path, b"second contents, a bit longer").unwrap();

    let remapped = MappedFile::open(&path).unwrap();
    assert_eq!(remapped.len(), 29);
    assert_eq!(remapped.data(), b"second contents, a bit longer");
    drop(remapped);

    fs::remove_file(&path).unwrap();
}

#[test]
fn mapping_outlives_open_handle() {
    // The `File` used to create the mapping is closed before the mapping is read; the view must stay valid.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("closed.bin");
    fs::write(&path, b"still here").unwrap();

    let mapped = MappedFile::open(&path).unwrap();
    assert_eq!(mapped.data(), b"still here");
}
