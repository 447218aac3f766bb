//! Bootcheck Virtual File System
//!
//! A virtual file system abstraction with native and in-memory backends.
//! The harness reads the compiler source, the snapshot and the test corpus
//! only through [`VirtualFileSystem`], so tests can run against
//! [`MemoryFileSystem`].
//!
//! # Usage
//! ```
//! use bootcheck_vfs::{VirtualFileSystem, MemoryFileSystem};
//! use std::path::Path;
//!
//! let fs = MemoryFileSystem::new();
//! fs.write_file(Path::new("/tests/add.src"), b"(+ 1 2)").unwrap();
//! let entries = fs.read_dir(Path::new("/tests")).unwrap();
//! assert_eq!(entries.len(), 1);
//! ```

mod error;
mod memory;
mod native;
mod r#trait;

pub use error::{VfsError, VfsResult};
pub use memory::MemoryFileSystem;
pub use native::NativeFileSystem;
pub use r#trait::VirtualFileSystem;

/// Create a new memory-based file system.
pub fn memory_fs() -> MemoryFileSystem {
    MemoryFileSystem::new()
}

/// Create a new native file system.
pub fn native_fs() -> NativeFileSystem {
    NativeFileSystem::new()
}
