//! In-memory `FileStore` with fault injection
//!
//! Used by tests and host simulation to reproduce failed writes and power
//! loss in the middle of a write.

use pocket_core::{FileStore, PocketError, Result};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Debug, Default)]
struct MemoryInner {
    files: BTreeMap<PathBuf, Vec<u8>>,
    /// Upcoming `write_file` calls that fail outright
    failing_writes: u32,
    /// Next `write_file` keeps only this many bytes, then fails
    torn_write: Option<usize>,
    writes: usize,
}

/// Shared in-memory file map
///
/// Clones share the same files, so a test can keep a handle while the
/// engine owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileStore {
    inner: Rc<RefCell<MemoryInner>>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a file directly, bypassing fault injection
    pub fn insert(&self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) {
        self.inner
            .borrow_mut()
            .files
            .insert(path.into(), bytes.into());
    }

    pub fn contents(&self, path: &Path) -> Option<Vec<u8>> {
        self.inner.borrow().files.get(path).cloned()
    }

    /// All stored paths, sorted
    pub fn paths(&self) -> Vec<PathBuf> {
        self.inner.borrow().files.keys().cloned().collect()
    }

    /// Make the next `count` writes fail without touching any file
    pub fn fail_next_writes(&self, count: u32) {
        self.inner.borrow_mut().failing_writes = count;
    }

    /// Simulate power loss: the next write stores a truncated file and fails
    pub fn crash_during_next_write(&self, keep_bytes: usize) {
        self.inner.borrow_mut().torn_write = Some(keep_bytes);
    }

    /// Successful writes so far
    pub fn write_count(&self) -> usize {
        self.inner.borrow().writes
    }
}

fn not_found(path: &Path) -> PocketError {
    PocketError::Io(io::Error::new(
        io::ErrorKind::NotFound,
        format!("{} not found", path.display()),
    ))
}

impl FileStore for MemoryFileStore {
    fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        self.contents(path).ok_or_else(|| not_found(path))
    }

    fn write_file(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let mut inner = self.inner.borrow_mut();

        if inner.failing_writes > 0 {
            inner.failing_writes -= 1;
            return Err(PocketError::Io(io::Error::other("injected write failure")));
        }

        if let Some(keep) = inner.torn_write.take() {
            let torn = bytes[..keep.min(bytes.len())].to_vec();
            inner.files.insert(path.to_path_buf(), torn);
            return Err(PocketError::Io(io::Error::other("power lost during write")));
        }

        inner.files.insert(path.to_path_buf(), bytes.to_vec());
        inner.writes += 1;
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        let bytes = inner.files.remove(from).ok_or_else(|| not_found(from))?;
        inner.files.insert(to.to_path_buf(), bytes);
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        self.inner
            .borrow_mut()
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| not_found(path))
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner.borrow().files.contains_key(path)
    }
}
