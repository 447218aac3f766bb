//! In-memory file system implementation

use crate::error::{VfsError, VfsResult};
use crate::VirtualFileSystem;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// An in-memory file system implementation.
///
/// Files are stored in a `BTreeMap` keyed by normalized path. Directories are
/// implicit: a directory exists as soon as some file lives below it.
/// Clones share the same storage.
///
/// # Example
/// ```
/// use bootcheck_vfs::{MemoryFileSystem, VirtualFileSystem};
/// use std::path::Path;
///
/// let fs = MemoryFileSystem::new();
/// fs.write_file(Path::new("/stage0.mod"), b"\0mod").unwrap();
/// assert_eq!(fs.read_file(Path::new("/stage0.mod")).unwrap(), b"\0mod");
/// assert!(fs.is_dir(Path::new("/")));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    files: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryFileSystem {
    /// Create a new empty memory file system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new memory file system pre-populated with `(path, content)` pairs.
    pub fn with_files<I, S, C>(files: I) -> Self
    where
        I: IntoIterator<Item = (S, C)>,
        S: AsRef<str>,
        C: AsRef<[u8]>,
    {
        let fs = Self::new();
        {
            let mut map = fs.write_guard();
            for (path, content) in files {
                map.insert(normalize(Path::new(path.as_ref())), content.as_ref().to_vec());
            }
        }
        fs
    }

    /// Remove a file, returning whether it existed.
    pub fn remove_file(&self, path: &Path) -> bool {
        self.write_guard().remove(&normalize(path)).is_some()
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.files.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.files.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Forward slashes, no trailing slash except for the root.
fn normalize(path: &Path) -> String {
    let text = path.to_string_lossy().replace('\\', "/");
    let trimmed = text.trim_end_matches('/');
    if trimmed.is_empty() && text.starts_with('/') {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

fn dir_prefix(normalized: &str) -> String {
    if normalized.ends_with('/') {
        normalized.to_string()
    } else {
        format!("{normalized}/")
    }
}

impl VirtualFileSystem for MemoryFileSystem {
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let normalized = normalize(path);
        self.read_guard()
            .get(&normalized)
            .cloned()
            .ok_or(VfsError::NotFound { path: normalized })
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()> {
        self.write_guard().insert(normalize(path), content.to_vec());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.is_file(path) || self.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.read_guard().contains_key(&normalize(path))
    }

    fn is_dir(&self, path: &Path) -> bool {
        let prefix = dir_prefix(&normalize(path));
        self.read_guard().keys().any(|key| key.starts_with(&prefix))
    }

    fn read_dir(&self, path: &Path) -> VfsResult<Vec<PathBuf>> {
        let normalized = normalize(path);
        let prefix = dir_prefix(&normalized);
        let files = self.read_guard();

        let children: BTreeSet<String> = files
            .keys()
            .filter_map(|key| key.strip_prefix(&prefix))
            .filter_map(|rest| rest.split('/').next())
            .filter(|name| !name.is_empty())
            .map(|name| format!("{prefix}{name}"))
            .collect();

        if children.is_empty() {
            return Err(if files.contains_key(&normalized) {
                VfsError::NotADirectory { path: normalized }
            } else {
                VfsError::NotFound { path: normalized }
            });
        }

        Ok(children.into_iter().map(PathBuf::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_read() {
        let fs = MemoryFileSystem::new();
        let path = Path::new("/test.txt");

        fs.write_file(path, b"hello world").unwrap();
        assert_eq!(fs.read_file(path).unwrap(), b"hello world");
    }

    #[test]
    fn test_read_nonexistent() {
        let fs = MemoryFileSystem::new();
        let result = fs.read_file(Path::new("/nonexistent.txt"));
        assert!(matches!(result, Err(VfsError::NotFound { .. })));
    }

    #[test]
    fn test_binary_content() {
        let fs = MemoryFileSystem::new();
        let path = Path::new("/binary.mod");

        let binary_data: Vec<u8> = (0..=255).collect();
        fs.write_file(path, &binary_data).unwrap();
        assert_eq!(fs.read_file(path).unwrap(), binary_data);
    }

    #[test]
    fn test_implicit_directories() {
        let fs = MemoryFileSystem::with_files([("/corpus/sub/a.src", b"a".to_vec())]);

        assert!(fs.is_dir(Path::new("/corpus")));
        assert!(fs.is_dir(Path::new("/corpus/sub/")));
        assert!(!fs.is_dir(Path::new("/corpus/sub/a.src")));
        assert!(fs.is_file(Path::new("/corpus/sub/a.src")));
        assert!(fs.exists(Path::new("/corpus")));
        assert!(!fs.exists(Path::new("/other")));
    }

    #[test]
    fn test_read_dir_lists_direct_children_sorted() {
        let fs = MemoryFileSystem::with_files([
            ("/tests/echo.src", b"e".to_vec()),
            ("/tests/add.src", b"a".to_vec()),
            ("/tests/echo.in", b"42\n".to_vec()),
            ("/tests/nested/deep.src", b"d".to_vec()),
            ("/testsuite/other.src", b"o".to_vec()),
        ]);

        let entries = fs.read_dir(Path::new("/tests")).unwrap();
        assert_eq!(
            entries,
            vec![
                PathBuf::from("/tests/add.src"),
                PathBuf::from("/tests/echo.in"),
                PathBuf::from("/tests/echo.src"),
                PathBuf::from("/tests/nested"),
            ]
        );
    }

    #[test]
    fn test_read_dir_errors() {
        let fs = MemoryFileSystem::with_files([("/a.src", b"a".to_vec())]);

        assert!(matches!(
            fs.read_dir(Path::new("/missing")),
            Err(VfsError::NotFound { .. })
        ));
        assert!(matches!(
            fs.read_dir(Path::new("/a.src")),
            Err(VfsError::NotADirectory { .. })
        ));
    }

    #[test]
    fn test_remove_file() {
        let fs = MemoryFileSystem::with_files([("/out.mod", b"x".to_vec())]);
        assert!(fs.remove_file(Path::new("/out.mod")));
        assert!(!fs.remove_file(Path::new("/out.mod")));
    }

    #[test]
    fn test_clone_shares_data() {
        let fs1 = MemoryFileSystem::new();
        let path = Path::new("/shared.txt");
        fs1.write_file(path, b"shared").unwrap();

        let fs2 = fs1.clone();
        fs2.write_file(path, b"modified").unwrap();
        assert_eq!(fs1.read_file(path).unwrap(), b"modified");
    }
}
