//! Output format aliases.
//!
//! Requests and originals name formats loosely: `jpg`, `JPEG`, `image/pjpeg`
//! and `jfif` all mean the same encoder. This module resolves those aliases
//! through a single static table to a small closed set of [`OutputFormat`]
//! tags. Conversion detection goes through it, so asking for `jpg` on a
//! `.jpeg` original is not a conversion. Cache paths flatten MIME-style
//! names (`image/webp` is written as `webp`); plain extensions keep the
//! requested spelling, so `jpg` and `jpeg` conversions are cached apart.
//!
//! | Tag | Aliases |
//! |-----|---------|
//! | `Jpeg` | `jpg`, `jpeg`, `jfif`, `jpe`, `image/jpeg`, `image/jpg`, `image/pjpeg`, `image/jfif`, `image/jp2` |
//! | `Png` | `png`, `image/png`, `image/x-png` |
//! | `Gif` | `gif`, `image/gif` |
//! | `Bmp` | `bmp`, `ms-bmp`, `x-bmp`, `x-ms-bmp`, `image/bmp`, `image/x-bmp`, ... |
//! | `Webp` | `webp`, `image/webp`, `image/x-webp` |
//! | `Avif` | `avif`, `image/avif` |
//! | `Tiff` | `tif`, `tiff`, `image/tiff` |

use serde::Serialize;
use std::fmt;

/// Closed set of formats the derivative pipeline can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    Png,
    Gif,
    Bmp,
    Webp,
    Avif,
    Tiff,
}

const ALIASES: &[(&str, OutputFormat)] = &[
    ("jpg", OutputFormat::Jpeg),
    ("jpeg", OutputFormat::Jpeg),
    ("jpe", OutputFormat::Jpeg),
    ("jfif", OutputFormat::Jpeg),
    ("image/jpeg", OutputFormat::Jpeg),
    ("image/jpg", OutputFormat::Jpeg),
    ("image/pjpeg", OutputFormat::Jpeg),
    ("image/jfif", OutputFormat::Jpeg),
    ("image/jp2", OutputFormat::Jpeg),
    ("png", OutputFormat::Png),
    ("image/png", OutputFormat::Png),
    ("image/x-png", OutputFormat::Png),
    ("gif", OutputFormat::Gif),
    ("image/gif", OutputFormat::Gif),
    ("bmp", OutputFormat::Bmp),
    ("ms-bmp", OutputFormat::Bmp),
    ("x-bitmap", OutputFormat::Bmp),
    ("x-bmp", OutputFormat::Bmp),
    ("x-ms-bmp", OutputFormat::Bmp),
    ("x-win-bitmap", OutputFormat::Bmp),
    ("x-windows-bmp", OutputFormat::Bmp),
    ("x-xbitmap", OutputFormat::Bmp),
    ("image/bmp", OutputFormat::Bmp),
    ("image/ms-bmp", OutputFormat::Bmp),
    ("image/x-bitmap", OutputFormat::Bmp),
    ("image/x-bmp", OutputFormat::Bmp),
    ("image/x-ms-bmp", OutputFormat::Bmp),
    ("image/x-win-bitmap", OutputFormat::Bmp),
    ("image/x-windows-bmp", OutputFormat::Bmp),
    ("image/x-xbitmap", OutputFormat::Bmp),
    ("webp", OutputFormat::Webp),
    ("image/webp", OutputFormat::Webp),
    ("image/x-webp", OutputFormat::Webp),
    ("avif", OutputFormat::Avif),
    ("image/avif", OutputFormat::Avif),
    ("tif", OutputFormat::Tiff),
    ("tiff", OutputFormat::Tiff),
    ("image/tiff", OutputFormat::Tiff),
];

impl OutputFormat {
    /// Resolve an alias (extension or MIME name, any case) to its tag.
    pub fn from_alias(alias: &str) -> Option<Self> {
        let alias = alias.trim().to_ascii_lowercase();
        ALIASES
            .iter()
            .find(|(name, _)| *name == alias)
            .map(|(_, format)| *format)
    }

    /// Canonical file extension written for this format.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::Gif => "gif",
            OutputFormat::Bmp => "bmp",
            OutputFormat::Webp => "webp",
            OutputFormat::Avif => "avif",
            OutputFormat::Tiff => "tiff",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::Gif => "image/gif",
            OutputFormat::Bmp => "image/bmp",
            OutputFormat::Webp => "image/webp",
            OutputFormat::Avif => "image/avif",
            OutputFormat::Tiff => "image/tiff",
        }
    }

    /// Whether the encoder keeps an alpha channel.
    pub fn supports_alpha(self) -> bool {
        !matches!(self, OutputFormat::Jpeg | OutputFormat::Bmp)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Whether two format names denote the same output format.
///
/// Known aliases compare by tag (`jpg` ≡ `JPEG` ≡ `image/jpeg`); unknown
/// names fall back to a case-insensitive comparison.
pub fn same_format(a: &str, b: &str) -> bool {
    match (OutputFormat::from_alias(a), OutputFormat::from_alias(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a.trim().eq_ignore_ascii_case(b.trim()),
    }
}

/// Normalize a requested format name for use in a cache path.
///
/// Lowercases the name. MIME-style aliases (`image/webp`) become the tag's
/// extension so the name is a single path segment; plain extensions keep the
/// spelling the caller chose (`jpeg` stays `jpeg`).
pub fn canonical_name(format: &str) -> String {
    let lowered = format.trim().to_ascii_lowercase();
    if lowered.contains('/')
        && let Some(tag) = OutputFormat::from_alias(&lowered)
    {
        return tag.extension().to_string();
    }
    lowered
}
