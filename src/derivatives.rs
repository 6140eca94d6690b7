//! Listing and removing an original's derivatives.
//!
//! Derivatives of `/img/test.jpg` live anywhere under `/img/modify/` and
//! share the original's stem (`test.jpg`, `test.png`, ...). Since cache keys
//! ignore file content, replacing an original in place should be followed by
//! [`Derivatives::delete`] to drop stale copies.

use crate::cache::modify_root;
use crate::storage::{AssetStore, StorageError, StorageResult, normalize_logical, split_logical};
use tracing::{info, warn};

/// View over the derivatives of one original.
pub struct Derivatives<'a, S: AssetStore> {
    store: &'a S,
    original: String,
    dir: String,
    stem: String,
}

impl<'a, S: AssetStore> Derivatives<'a, S> {
    pub fn new(store: &'a S, original: &str) -> StorageResult<Self> {
        let original = normalize_logical(original)?;
        let parts = split_logical(&original);
        Ok(Self {
            store,
            original,
            dir: parts.dirname,
            stem: parts.stem,
        })
    }

    /// Logical path of the original.
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Every derivative on disk, sorted.
    pub fn list(&self) -> StorageResult<Vec<String>> {
        let files = self.store.list_files(&modify_root(&self.dir), true)?;
        Ok(files
            .into_iter()
            .filter(|f| *f != self.original && split_logical(f).stem == self.stem)
            .collect())
    }

    pub fn has_any(&self) -> StorageResult<bool> {
        Ok(!self.list()?.is_empty())
    }

    /// Remove every derivative, and the original too if asked. Returns the
    /// number of files removed.
    ///
    /// A derivative already gone when its turn comes is skipped.
    pub fn delete(&self, delete_original: bool) -> StorageResult<usize> {
        let mut removed = 0;
        for path in self.list()? {
            match self.store.delete(&path) {
                Ok(()) => removed += 1,
                Err(StorageError::NotFound(_)) => warn!(path = %path, "derivative vanished before delete"),
                Err(e) => return Err(e),
            }
        }
        if delete_original && self.store.exists(&self.original) {
            self.store.delete(&self.original)?;
            removed += 1;
        }
        info!(original = %self.original, removed, "deleted derivatives");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    fn seed(store: &crate::storage::LocalStore) {
        let root = store.root();
        write_test_jpeg(&root.join("img/test.jpg"), 8, 8);
        write_test_jpeg(&root.join("img/other.jpg"), 8, 8);
        write_test_jpeg(&root.join("img/modify/99/resize/4x4/test.jpg"), 4, 4);
        write_test_png(&root.join("img/modify/55/resize/png/test.png"), 8, 8);
        write_test_jpeg(&root.join("img/modify/99/resize/other.jpg"), 8, 8);
    }

    #[test]
    fn lists_only_matching_stem() {
        let (_tmp, store) = fixture_store();
        seed(&store);
        let d = Derivatives::new(&store, "img/test.jpg").unwrap();
        assert_eq!(d.original(), "/img/test.jpg");
        assert_eq!(
            d.list().unwrap(),
            vec![
                "/img/modify/55/resize/png/test.png",
                "/img/modify/99/resize/4x4/test.jpg",
            ]
        );
        assert!(d.has_any().unwrap());
    }

    #[test]
    fn none_without_modify_dir() {
        let (_tmp, store) = fixture_store();
        write_test_jpeg(&store.root().join("a.jpg"), 2, 2);
        let d = Derivatives::new(&store, "/a.jpg").unwrap();
        assert!(!d.has_any().unwrap());
    }

    #[test]
    fn delete_keeps_original_when_asked() {
        let (_tmp, store) = fixture_store();
        seed(&store);
        let d = Derivatives::new(&store, "/img/test.jpg").unwrap();
        assert_eq!(d.delete(false).unwrap(), 2);
        assert!(store.exists("/img/test.jpg"));
        assert!(store.exists("/img/modify/99/resize/other.jpg"));
        assert!(!d.has_any().unwrap());
    }

    #[test]
    fn delete_with_original() {
        let (_tmp, store) = fixture_store();
        seed(&store);
        let d = Derivatives::new(&store, "/img/test.jpg").unwrap();
        assert_eq!(d.delete(true).unwrap(), 3);
        assert!(!store.exists("/img/test.jpg"));
        assert!(store.exists("/img/other.jpg"));
    }
}
