//! Asset storage abstraction.
//!
//! The core never touches the filesystem directly. Everything it needs,
//! from resolving a logical path to an absolute one, through existence
//! checks and directory creation, to reading an image's header, goes
//! through the [`AssetStore`] trait.
//!
//! Logical paths are `/`-separated and rooted at the store root
//! (`/img/test.jpg`). They never contain `..`; [`normalize_logical`] rejects
//! them before any store sees them.
//!
//! [`LocalStore`] is the default implementation over a document-root
//! directory.

mod local;

pub use local::LocalStore;

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("unreadable image {path}: {reason}")]
    Unreadable { path: String, reason: String },

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Metadata for one stored image. Produced fresh by [`AssetStore::describe`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetDescriptor {
    /// Logical path, e.g. `/img/test.jpg`.
    pub path: String,
    /// Logical directory, `/` for files at the root.
    pub dirname: String,
    /// File stem, e.g. `test`.
    pub filename: String,
    /// File name with extension, e.g. `test.jpg`.
    pub basename: String,
    /// Extension as stored on disk, without the dot.
    pub extension: String,
    /// Storage-resolved absolute path.
    pub real_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub mime: String,
}

impl AssetDescriptor {
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Byte-level storage operations and URL mapping.
///
/// Implementations must be `Sync`: one store is shared by every request a
/// [`Service`](crate::service::Service) handles, including the CLI's rayon
/// workers.
pub trait AssetStore: Sync {
    /// Absolute filesystem path for a logical path.
    fn resolve_path(&self, logical: &str) -> StorageResult<PathBuf>;

    /// Public URL for a logical path.
    fn resolve_url(&self, logical: &str) -> StorageResult<String>;

    /// Logical paths of the files under `dir`, sorted.
    fn list_files(&self, dir: &str, recursive: bool) -> StorageResult<Vec<String>>;

    fn exists(&self, logical: &str) -> bool;

    /// Create a directory and its parents. Succeeds if it already exists.
    fn make_directory(&self, logical: &str) -> StorageResult<()>;

    fn delete(&self, logical: &str) -> StorageResult<()>;

    /// Read dimensions and type of the image at `logical`.
    fn describe(&self, logical: &str) -> StorageResult<AssetDescriptor>;
}

/// Normalize a logical path: leading `/`, no empty or `.` segments.
///
/// ```text
/// "img/test.jpg"      → "/img/test.jpg"
/// "/img/./a//b.png"   → "/img/a/b.png"
/// ""                  → "/"
/// "/img/../etc"       → InvalidPath
/// ```
pub fn normalize_logical(path: &str) -> StorageResult<String> {
    let mut segments = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => return Err(StorageError::InvalidPath(path.to_string())),
            s => segments.push(s),
        }
    }
    Ok(format!("/{}", segments.join("/")))
}

/// The pieces of a normalized logical file path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LogicalParts {
    pub dirname: String,
    pub stem: String,
    pub basename: String,
    pub extension: String,
}

pub(crate) fn split_logical(path: &str) -> LogicalParts {
    let (dirname, basename) = match path.rsplit_once('/') {
        Some(("", base)) => ("/", base),
        Some((dir, base)) => (dir, base),
        None => ("/", path),
    };
    let (stem, extension) = match basename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, ext),
        _ => (basename, ""),
    };
    LogicalParts {
        dirname: dirname.to_string(),
        stem: stem.to_string(),
        basename: basename.to_string(),
        extension: extension.to_string(),
    }
}
