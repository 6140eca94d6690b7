//! Pixel work: decode, resize, convert, encode.
//!
//! | Step | Crate / function |
//! |---|---|
//! | **Load** | `image::ImageReader` |
//! | **Resize / Fit / Crop** | Lanczos3 `resize_exact` + `crop_imm` |
//! | **Convert** | alias lookup + alpha flattening |
//! | **Save** | per-format encoder into a temp file, renamed into place |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: `Quality` and the backend option structs
//! - **Backend**: [`TransformBackend`] trait + [`RustBackend`]

pub mod backend;
mod calculations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, TransformBackend};
pub use params::{Anchor, ConvertOptions, Quality, ResizeOptions, TransformOptions};
pub use rust_backend::{ImageHandle, RustBackend};
