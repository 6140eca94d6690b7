//! Filesystem-backed asset store.

use super::{AssetDescriptor, AssetStore, StorageError, StorageResult, normalize_logical, split_logical};
use image::ImageReader;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Asset store over a document-root directory.
///
/// Logical `/img/test.jpg` lives at `<root>/img/test.jpg` and is served at
/// `<base_url>/img/test.jpg`.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
    base_url: String,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn absolute(&self, normalized: &str) -> PathBuf {
        self.root.join(normalized.trim_start_matches('/'))
    }

    fn logical_of(&self, dir: &str, relative: &Path) -> String {
        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if dir == "/" {
            format!("/{relative}")
        } else {
            format!("{dir}/{relative}")
        }
    }
}

impl AssetStore for LocalStore {
    fn resolve_path(&self, logical: &str) -> StorageResult<PathBuf> {
        Ok(self.absolute(&normalize_logical(logical)?))
    }

    fn resolve_url(&self, logical: &str) -> StorageResult<String> {
        Ok(format!("{}{}", self.base_url, normalize_logical(logical)?))
    }

    fn list_files(&self, dir: &str, recursive: bool) -> StorageResult<Vec<String>> {
        let dir = normalize_logical(dir)?;
        let abs = self.absolute(&dir);
        if !abs.is_dir() {
            return Ok(Vec::new());
        }

        let walker = WalkDir::new(&abs)
            .min_depth(1)
            .max_depth(if recursive { usize::MAX } else { 1 })
            .sort_by_file_name();

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Ok(relative) = entry.path().strip_prefix(&abs) {
                files.push(self.logical_of(&dir, relative));
            }
        }
        files.sort();
        Ok(files)
    }

    fn exists(&self, logical: &str) -> bool {
        self.resolve_path(logical).is_ok_and(|p| p.exists())
    }

    fn make_directory(&self, logical: &str) -> StorageResult<()> {
        fs::create_dir_all(self.resolve_path(logical)?)?;
        Ok(())
    }

    fn delete(&self, logical: &str) -> StorageResult<()> {
        let path = self.resolve_path(logical)?;
        fs::remove_file(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StorageError::NotFound(logical.to_string()),
            _ => StorageError::Io(e),
        })
    }

    fn describe(&self, logical: &str) -> StorageResult<AssetDescriptor> {
        let normalized = normalize_logical(logical)?;
        let real_path = self.absolute(&normalized);
        if !real_path.is_file() {
            return Err(StorageError::NotFound(normalized));
        }

        let unreadable = |reason: String| StorageError::Unreadable {
            path: normalized.clone(),
            reason,
        };
        let reader = ImageReader::open(&real_path)?
            .with_guessed_format()
            .map_err(|e| unreadable(e.to_string()))?;
        let mime = reader
            .format()
            .map(|f| f.to_mime_type())
            .unwrap_or("application/octet-stream")
            .to_string();
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| unreadable(e.to_string()))?;

        let parts = split_logical(&normalized);
        Ok(AssetDescriptor {
            path: normalized,
            dirname: parts.dirname,
            filename: parts.stem,
            basename: parts.basename,
            extension: parts.extension,
            real_path,
            width,
            height,
            mime,
        })
    }
}
