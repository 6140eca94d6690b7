//! Transform backend trait and shared types.
//!
//! The [`TransformBackend`] trait defines the five steps a derivative is
//! built from: load, apply_quality, resize, convert and save. The processor
//! decides *which* steps run; the backend only knows *how*.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests use the recording [`MockBackend`](tests::MockBackend).

use super::params::{ConvertOptions, ResizeOptions};
use crate::params::Method;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("cannot load {path}: {reason}")]
    Load { path: String, reason: String },
    #[error("unsupported method: {0}")]
    Method(String),
    #[error("unsupported format: {0}")]
    Format(String),
    #[error("quality {0} out of range 1-100")]
    Quality(u32),
    #[error("cannot save {path}: {reason}")]
    Save { path: String, reason: String },
}

/// Trait for transform backends.
///
/// A backend works on an opaque in-memory [`Handle`](Self::Handle): `load`
/// produces one, the middle steps mutate it, `save` persists it. `save` must
/// never leave a partially written file at the destination.
pub trait TransformBackend: Sync {
    type Handle;

    /// Decode the original at `path`.
    fn load(&self, path: &Path) -> Result<Self::Handle, BackendError>;

    /// Set the encoding quality used by `save`. Must be 1–100.
    fn apply_quality(&self, handle: &mut Self::Handle, quality: u32) -> Result<(), BackendError>;

    /// Resize by `method`. Zero on an axis follows the aspect ratio.
    fn resize(
        &self,
        handle: &mut Self::Handle,
        method: Method,
        width: u32,
        height: u32,
        options: &ResizeOptions,
    ) -> Result<(), BackendError>;

    /// Switch the output encoding to `format`.
    fn convert(
        &self,
        handle: &mut Self::Handle,
        format: &str,
        quality: u32,
        options: &ConvertOptions,
    ) -> Result<(), BackendError>;

    /// Encode and write to `destination`.
    fn save(&self, handle: &Self::Handle, destination: &Path) -> Result<(), BackendError>;
}
