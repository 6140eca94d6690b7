//! Derivative cache paths.
//!
//! A derivative's location *is* its cache key. Nothing is hashed and there
//! is no manifest: two requests that normalize to the same parameters land
//! on the same path, and the existence of that path is the cache hit.
//!
//! # Layout
//!
//! ```text
//! {dir}/modify/{quality}/{method}/[{W}x{H}/][{format}/]{file}
//! ```
//!
//! - the size segment appears only when the request resizes;
//! - the format segment appears only when the request converts;
//! - `{file}` is `{stem}.{format}` when converting, else the original basename.
//!
//! ```text
//! /img/test.jpg  q=99 resize 200x110        → /img/modify/99/resize/200x110/test.jpg
//! /img/test.jpg  q=22 resize 200x130 → png  → /img/modify/22/resize/200x130/png/test.png
//! /img/test.jpg  q=55 → png                 → /img/modify/55/resize/png/test.png
//! /test.jpg      q=95                       → /modify/95/resize/test.jpg
//! ```
//!
//! Keys are logical path plus parameters only. An original overwritten in
//! place keeps serving its old derivatives until they are deleted through
//! [`Derivatives::delete`](crate::derivatives::Derivatives::delete).

use crate::params::{Method, Size};
use serde::Serialize;
use std::fmt;

/// Directory segment under an original's directory that holds its derivatives.
pub const MODIFY_DIR: &str = "modify";

/// Everything the cache path depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivativeKey<'a> {
    /// Logical directory of the original (`/img`, or `/` at the root).
    pub dir: &'a str,
    pub stem: &'a str,
    pub basename: &'a str,
    pub quality: u32,
    pub method: Method,
    /// Set only when the request resizes.
    pub resize: Option<Size>,
    /// Canonical format name, set only when the request converts.
    pub convert: Option<&'a str>,
}

/// A derived cache location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CachePath {
    /// Directory that must exist before the derivative is written.
    pub dir: String,
    /// Full logical path of the derivative.
    pub path: String,
}

/// `{dir}/modify` for an original's directory.
pub fn modify_root(dir: &str) -> String {
    format!("{}/{MODIFY_DIR}", dir.trim_end_matches('/'))
}

/// Derive the cache path for a normalized request.
pub fn derive(key: &DerivativeKey<'_>) -> CachePath {
    let mut dir = format!("{}/{}/{}", modify_root(key.dir), key.quality, key.method);
    if let Some(size) = key.resize {
        dir.push('/');
        dir.push_str(&size.to_string());
    }
    let file = match key.convert {
        Some(format) => {
            dir.push('/');
            dir.push_str(format);
            format!("{}.{format}", key.stem)
        }
        None => key.basename.to_string(),
    };
    let path = format!("{dir}/{file}");
    CachePath { dir, path }
}

/// Whether a request was served from an existing derivative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    Hit,
    Generated,
}

/// Summary statistics for a batch of requests.
#[derive(Debug, Default)]
pub struct CacheStats {
    pub hits: u32,
    pub generated: u32,
}

impl CacheStats {
    pub fn record(&mut self, status: CacheStatus) {
        match status {
            CacheStatus::Hit => self.hits += 1,
            CacheStatus::Generated => self.generated += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.hits + self.generated
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(
                f,
                "{} cached, {} generated ({} total)",
                self.hits,
                self.generated,
                self.total()
            )
        } else {
            write!(f, "{} generated", self.generated)
        }
    }
}
