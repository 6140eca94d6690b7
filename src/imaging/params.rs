//! Parameter types for backend operations.
//!
//! These structs describe *how* the backend should carry out a step the
//! [`Processor`](crate::processor::Processor) has already decided on. They
//! are the interface between request normalization and pixel work, which
//! keeps the backend swappable (e.g. for a recording mock in tests).
//!
//! ## Types
//!
//! - [`Quality`]: lossy encoding quality (1–100, default 95). Clamped on construction.
//! - [`Anchor`]: gravity for `fit` and `crop` windows.
//! - [`ResizeOptions`]: enlargement policy, anchor and explicit crop offset.
//! - [`ConvertOptions`]: background used when a target format drops alpha.
//! - [`TransformOptions`]: both of the above, as loaded from `[transform]`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Quality(u32);

impl Quality {
    /// Quality used when neither the request nor the policy names one.
    pub const FALLBACK: i64 = 95;

    pub fn new(value: i64) -> Self {
        Self(value.clamp(1, 100) as u32)
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self::new(Self::FALLBACK)
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a `fit` or `crop` window sits inside the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    TopLeft,
    Top,
    TopRight,
    Left,
    #[default]
    Center,
    Right,
    BottomLeft,
    Bottom,
    BottomRight,
}

impl Anchor {
    /// Placement on each axis in half-steps of the free space:
    /// 0 = start, 1 = middle, 2 = end.
    pub(crate) fn halves(self) -> (u32, u32) {
        match self {
            Anchor::TopLeft => (0, 0),
            Anchor::Top => (1, 0),
            Anchor::TopRight => (2, 0),
            Anchor::Left => (0, 1),
            Anchor::Center => (1, 1),
            Anchor::Right => (2, 1),
            Anchor::BottomLeft => (0, 2),
            Anchor::Bottom => (1, 2),
            Anchor::BottomRight => (2, 2),
        }
    }
}

/// Options for the resize step.
///
/// - `allow_enlarge`: permit output larger than the source (default off)
/// - `position`: anchor for `fit` and for `crop` without explicit offsets
/// - `x`, `y`: explicit top-left corner of a `crop` window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeOptions {
    pub allow_enlarge: bool,
    pub position: Anchor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<u32>,
}

impl ResizeOptions {
    /// Explicit crop offset, when either coordinate is set.
    pub fn offset(&self) -> Option<(u32, u32)> {
        match (self.x, self.y) {
            (None, None) => None,
            (x, y) => Some((x.unwrap_or(0), y.unwrap_or(0))),
        }
    }
}

/// Options for the format conversion step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvertOptions {
    /// RGB colour that transparent pixels are flattened onto when the target
    /// format has no alpha channel. `None` drops alpha without blending.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<[u8; 3]>,
}

/// Backend options for both steps, as configured under `[transform]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformOptions {
    pub resize: ResizeOptions,
    pub convert: ConvertOptions,
}
