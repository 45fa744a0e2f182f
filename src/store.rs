//! File access seam for the patch pipeline.
//!
//! The applier and verifier run against [`FileStore`] rather than `std::fs`
//! directly, so the whole pipeline can execute in memory ([`MemStore`]) for
//! tests and `--dry-run`, or against disk ([`DiskStore`]) for real runs.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub trait FileStore {
    fn exists(&self, path: &Path) -> bool;
    fn read(&self, path: &Path) -> io::Result<String>;
    fn write(&mut self, path: &Path, content: &str) -> io::Result<()>;
}

/// Disk-backed store with atomic writes.
#[derive(Debug, Default)]
pub struct DiskStore;

impl DiskStore {
    pub fn new() -> Self {
        Self
    }
}

impl FileStore for DiskStore {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&mut self, path: &Path, content: &str) -> io::Result<()> {
        atomic_write(path, content.as_bytes())
    }
}

/// Atomic file write: tempfile + fsync + rename.
///
/// The tempfile lives in the target's own directory so the rename never
/// crosses filesystems. An interrupted run leaves the original file intact.
fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "path has no parent directory")
    })?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}

/// In-memory store backing tests and `--dry-run`.
#[derive(Debug, Clone, Default)]
pub struct MemStore {
    files: BTreeMap<PathBuf, String>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }

    pub fn get(&self, path: &Path) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    /// Copy the given paths out of another store, silently skipping any
    /// that do not exist there. The applier reports those as missing later,
    /// exactly as a disk run would.
    pub fn mirror_from(store: &dyn FileStore, paths: &[PathBuf]) -> io::Result<Self> {
        let mut mem = Self::new();
        for path in paths {
            if !store.exists(path) {
                continue;
            }
            mem.insert(path.clone(), store.read(path)?);
        }
        Ok(mem)
    }
}

impl FileStore for MemStore {
    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn read(&self, path: &Path) -> io::Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }

    fn write(&mut self, path: &Path, content: &str) -> io::Result<()> {
        self.files.insert(path.to_path_buf(), content.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mem_store_roundtrip() {
        let mut mem = MemStore::new();
        let path = Path::new("a/b.php");

        assert!(!mem.exists(path));
        mem.write(path, "content").unwrap();
        assert!(mem.exists(path));
        assert_eq!(mem.read(path).unwrap(), "content");
    }

    #[test]
    fn test_mem_store_read_missing_is_not_found() {
        let mem = MemStore::new();
        let err = mem.read(Path::new("missing.php")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_disk_store_atomic_write_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("target.php");
        std::fs::write(&path, "original").unwrap();

        let mut disk = DiskStore::new();
        disk.write(&path, "patched").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "patched");
    }

    #[test]
    fn test_mirror_from_skips_missing_paths() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("present.php");
        let absent = dir.path().join("absent.php");
        std::fs::write(&present, "content").unwrap();

        let mem = MemStore::mirror_from(&DiskStore::new(), &[present.clone(), absent.clone()])
            .unwrap();
        assert!(mem.exists(&present));
        assert!(!mem.exists(&absent));
    }
}
