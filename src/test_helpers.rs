//! Shared test utilities for the imgmod test suite.
//!
//! Provides an isolated [`LocalStore`] over a temp directory, synthetic image
//! writers, and the policy most request tests run against.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let (_tmp, store) = fixture_store();
//! write_test_jpeg(&store.root().join("img/test.jpg"), 400, 300);
//! let original = store.describe("/img/test.jpg").unwrap();
//! ```

use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::policy::{AllowedSizes, ValidationPolicy};
use crate::storage::{AssetDescriptor, LocalStore};

// =========================================================================
// Fixture setup
// =========================================================================

/// A [`LocalStore`] rooted at a fresh temp directory.
///
/// Keep the returned `TempDir` alive for the duration of the test.
pub fn fixture_store() -> (TempDir, LocalStore) {
    let tmp = TempDir::new().unwrap();
    let store = LocalStore::new(tmp.path(), "https://img.test");
    (tmp, store)
}

/// `sizes = "*"`, `formats = [jpg, png, webp]`, `methods = [resize, crop, fit]`,
/// `quality = 99`.
pub fn scenario_policy() -> ValidationPolicy {
    ValidationPolicy {
        sizes: AllowedSizes::Any,
        formats: vec!["jpg".into(), "png".into(), "webp".into()],
        methods: vec!["resize".into(), "crop".into(), "fit".into()],
        quality: Some(99),
    }
}

/// Descriptor for a file that need not exist, for pure request tests.
pub fn descriptor(path: &str, width: u32, height: u32) -> AssetDescriptor {
    let parts = crate::storage::split_logical(path);
    AssetDescriptor {
        path: path.to_string(),
        dirname: parts.dirname,
        filename: parts.stem,
        basename: parts.basename,
        extension: parts.extension,
        real_path: PathBuf::from(path),
        width,
        height,
        mime: "image/jpeg".to_string(),
    }
}

// =========================================================================
// Synthetic images
// =========================================================================

/// Write a gradient JPEG, creating parent directories. The path's extension
/// is ignored.
pub fn write_test_jpeg(path: &Path, width: u32, height: u32) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    img.save_with_format(path, ImageFormat::Jpeg).unwrap();
}

/// Write a PNG with a transparent left half, creating parent directories.
pub fn write_test_png(path: &Path, width: u32, height: u32) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let img = RgbaImage::from_fn(width, height, |x, _| {
        let alpha = if x < width / 2 { 0 } else { 255 };
        Rgba([200, 40, 40, alpha])
    });
    img.save_with_format(path, ImageFormat::Png).unwrap();
}
