//! Result of a processed request.

use crate::storage::AssetDescriptor;
use serde::Serialize;
use std::path::Path;

/// Descriptors for a derivative and its original, with their public URLs.
///
/// Built once by [`Processor::process`](crate::processor::Processor::process)
/// from fresh store reads; read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Paths {
    derivative: AssetDescriptor,
    derivative_url: String,
    original: AssetDescriptor,
    original_url: String,
}

impl Paths {
    pub(crate) fn new(
        derivative: AssetDescriptor,
        derivative_url: String,
        original: AssetDescriptor,
        original_url: String,
    ) -> Self {
        Self {
            derivative,
            derivative_url,
            original,
            original_url,
        }
    }

    pub fn info(&self) -> &AssetDescriptor {
        &self.derivative
    }

    /// Absolute filesystem path of the derivative.
    pub fn path(&self) -> &Path {
        &self.derivative.real_path
    }

    /// Logical path of the derivative, which is also its cache key.
    pub fn logical_path(&self) -> &str {
        &self.derivative.path
    }

    pub fn url(&self) -> &str {
        &self.derivative_url
    }

    pub fn original_info(&self) -> &AssetDescriptor {
        &self.original
    }

    pub fn original_path(&self) -> &Path {
        &self.original.real_path
    }

    pub fn original_url(&self) -> &str {
        &self.original_url
    }
}
