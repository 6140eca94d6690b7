//! Request normalization and validation.
//!
//! [`RequestConfig`] turns a loose [`ParameterSet`] into a validated plan for
//! one original: which method, which size (if any), which format (if any) and
//! which quality. It also answers the two questions that drive everything
//! downstream: does the request need a resize, and does it need a conversion.
//!
//! ## Normalization rules
//!
//! | Field | Source, in order | Check |
//! |-------|------------------|-------|
//! | format | request, else original's format | allow-list (case-insensitive) |
//! | size | request, else none | `WxH` parse, allow-list unless `"*"` |
//! | method | request, else `resize` | known method and allow-list |
//! | quality | request (non-zero), else policy, else 95 | clamped to 1–100 |
//!
//! Checks run in that order and the first failure wins. Every setter validates
//! before assigning, so a rejected value leaves the config unchanged.
//!
//! An original's format is its extension, or for a file without one, the
//! format its header declares. An original whose own format is not allowed
//! is rejected unless the request converts it to one that is.

use crate::cache::{self, CachePath, DerivativeKey};
use crate::format::{OutputFormat, canonical_name, same_format};
use crate::imaging::Quality;
use crate::params::{Method, ParameterSet, RawSize, Size};
use crate::policy::{ConfigValidationError, ValidationPolicy};
use crate::storage::AssetDescriptor;
use serde::Serialize;

/// The effective parameters of a request after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedParams {
    pub method: Method,
    pub format: String,
    pub quality: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
}

/// A validated, normalized request against one original.
#[derive(Debug, Clone)]
pub struct RequestConfig<'a> {
    policy: &'a ValidationPolicy,
    original: AssetDescriptor,
    quality: Quality,
    method: Method,
    format: String,
    size: Option<Size>,
    resize: bool,
    convert: bool,
}

impl<'a> RequestConfig<'a> {
    pub fn new(
        policy: &'a ValidationPolicy,
        params: &ParameterSet,
        original: AssetDescriptor,
    ) -> Result<Self, ConfigValidationError> {
        let mut config = Self {
            policy,
            format: source_format(&original),
            original,
            quality: Quality::default(),
            method: Method::default(),
            size: None,
            resize: false,
            convert: false,
        };

        let format = params
            .format
            .clone()
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| config.format.clone());
        config.set_format(&format)?;
        if let Some(size) = &params.size {
            config.set_size(size)?;
        }
        let method = params
            .method
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(Method::Resize.as_str());
        config.set_method(method)?;

        let quality = params
            .quality
            .filter(|&q| q != 0)
            .or(policy.quality)
            .unwrap_or(Quality::FALLBACK);
        config.set_quality(quality);

        Ok(config)
    }

    // =========================================================================
    // Setters
    // =========================================================================

    /// Set the quality, clamped to 1–100. Never fails.
    pub fn set_quality(&mut self, quality: i64) {
        self.quality = Quality::new(quality);
    }

    /// Set or clear the target size. `None` means no resize.
    pub fn set_size(&mut self, size: &RawSize) -> Result<(), ConfigValidationError> {
        let size = size.normalize()?;
        if let Some(s) = size
            && !self.policy.permits_size(s)
        {
            return Err(ConfigValidationError::SizeNotAllowed(s.to_string()));
        }
        self.size = size;
        self.resize = size.is_some_and(|s| s.as_tuple() != self.original.size());
        Ok(())
    }

    pub fn set_method(&mut self, method: &str) -> Result<(), ConfigValidationError> {
        let parsed: Method = method.parse()?;
        if !self.policy.allows_method(parsed) {
            return Err(ConfigValidationError::MethodNotAllowed(method.to_string()));
        }
        self.method = parsed;
        Ok(())
    }

    /// Set the output format. An empty name falls back to the original's
    /// own format, which never converts.
    pub fn set_format(&mut self, format: &str) -> Result<(), ConfigValidationError> {
        if format.trim().is_empty() {
            self.format = source_format(&self.original);
            self.convert = false;
            return Ok(());
        }
        if !self.policy.allows_format(format) {
            return Err(ConfigValidationError::FormatNotAllowed(format.to_string()));
        }
        let canonical = canonical_name(format);
        self.convert = !same_format(&canonical, &source_format(&self.original));
        self.format = canonical;
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn quality(&self) -> u32 {
        self.quality.value()
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn size(&self) -> Option<Size> {
        self.size
    }

    pub fn needs_resize(&self) -> bool {
        self.resize
    }

    pub fn needs_convert(&self) -> bool {
        self.convert
    }

    pub fn original(&self) -> &AssetDescriptor {
        &self.original
    }

    pub fn policy(&self) -> &'a ValidationPolicy {
        self.policy
    }

    /// Target size, only when the request resizes.
    pub fn resize_target(&self) -> Option<Size> {
        self.size.filter(|_| self.resize)
    }

    /// Target format, only when the request converts.
    pub fn convert_target(&self) -> Option<&str> {
        self.convert.then_some(self.format.as_str())
    }

    pub fn cache_path(&self) -> CachePath {
        cache::derive(&DerivativeKey {
            dir: &self.original.dirname,
            stem: &self.original.filename,
            basename: &self.original.basename,
            quality: self.quality(),
            method: self.method,
            resize: self.resize_target(),
            convert: self.convert_target(),
        })
    }

    pub fn params(&self) -> AppliedParams {
        AppliedParams {
            method: self.method,
            format: self.format.clone(),
            quality: self.quality(),
            size: self.size,
        }
    }
}

/// The original's own format name.
fn source_format(original: &AssetDescriptor) -> String {
    if !original.extension.is_empty() {
        return original.extension.to_ascii_lowercase();
    }
    OutputFormat::from_alias(&original.mime)
        .map(|f| f.extension().to_string())
        .unwrap_or_default()
}
