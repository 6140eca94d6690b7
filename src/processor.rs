//! Derivative orchestration.
//!
//! A [`Processor`] owns one validated [`RequestConfig`] and runs it through
//! the generate-once pipeline:
//!
//! ```text
//! PLANNED ─► DIR_ENSURED ─► ┬─ CACHE_HIT ─────────────────┬─► DESCRIBED
//!                           └─ GENERATING ─► PERSISTED ───┘
//! ```
//!
//! 1. Derive the cache directory and path from the request.
//! 2. Create the directory (idempotent).
//! 3. Under the per-path lock, check whether the derivative exists. If not,
//!    load the original, apply quality, resize and convert as needed, save.
//! 4. Describe the derivative and the original and return [`Paths`].
//!
//! A present file is always a complete file: backends save atomically. The
//! lock makes concurrent requests for the same missing derivative generate
//! it once; every later caller sees a cache hit.

use crate::cache::CacheStatus;
use crate::imaging::{BackendError, ConvertOptions, ResizeOptions, TransformBackend, TransformOptions};
use crate::locks::PathLocks;
use crate::params::RawSize;
use crate::paths::Paths;
use crate::policy::ConfigValidationError;
use crate::request::{AppliedParams, RequestConfig};
use crate::storage::{AssetStore, StorageError};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("invalid request: {0}")]
    Config(#[from] ConfigValidationError),
    #[error("transform failed: {0}")]
    Imaging(#[from] BackendError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    Planned,
    DirEnsured,
    CacheHit,
    Generating,
    Persisted,
    Described,
}

/// Runs one request against a backend and a store.
pub struct Processor<'a, B: TransformBackend, S: AssetStore> {
    backend: &'a B,
    store: &'a S,
    locks: &'a PathLocks,
    config: RequestConfig<'a>,
    options: TransformOptions,
}

impl<'a, B: TransformBackend, S: AssetStore> Processor<'a, B, S> {
    pub fn new(
        backend: &'a B,
        store: &'a S,
        locks: &'a PathLocks,
        config: RequestConfig<'a>,
        options: TransformOptions,
    ) -> Self {
        Self {
            backend,
            store,
            locks,
            config,
            options,
        }
    }

    // =========================================================================
    // Fluent setters
    // =========================================================================

    /// Override the quality (clamped to 1–100).
    pub fn quality(mut self, quality: i64) -> Self {
        self.config.set_quality(quality);
        self
    }

    pub fn size(mut self, size: impl Into<RawSize>) -> Result<Self, ConfigValidationError> {
        self.config.set_size(&size.into())?;
        Ok(self)
    }

    pub fn method(mut self, method: &str) -> Result<Self, ConfigValidationError> {
        self.config.set_method(method)?;
        Ok(self)
    }

    pub fn format(mut self, format: &str) -> Result<Self, ConfigValidationError> {
        self.config.set_format(format)?;
        Ok(self)
    }

    pub fn resize_options(mut self, options: ResizeOptions) -> Self {
        self.options.resize = options;
        self
    }

    pub fn convert_options(mut self, options: ConvertOptions) -> Self {
        self.options.convert = options;
        self
    }

    pub fn params(&self) -> AppliedParams {
        self.config.params()
    }

    pub fn config(&self) -> &RequestConfig<'a> {
        &self.config
    }

    // =========================================================================
    // Pipeline
    // =========================================================================

    pub fn process(&self) -> Result<Paths, ProcessError> {
        self.process_with_status().map(|(paths, _)| paths)
    }

    /// Like [`process`](Self::process), also reporting whether the derivative
    /// was already cached.
    pub fn process_with_status(&self) -> Result<(Paths, CacheStatus), ProcessError> {
        let target = self.config.cache_path();
        debug!(stage = ?Stage::Planned, path = %target.path);

        self.store.make_directory(&target.dir)?;
        debug!(stage = ?Stage::DirEnsured, dir = %target.dir);

        let status = {
            let _guard = self.locks.acquire(&target.path);
            if self.store.exists(&target.path) {
                debug!(stage = ?Stage::CacheHit, path = %target.path);
                CacheStatus::Hit
            } else {
                self.generate(&target.path)?;
                info!(path = %target.path, "generated derivative");
                CacheStatus::Generated
            }
        };

        let original_path = &self.config.original().path;
        let derivative_url = self.store.resolve_url(&target.path)?;
        let original_url = self.store.resolve_url(original_path)?;
        let paths = Paths::new(
            self.store.describe(&target.path)?,
            derivative_url,
            self.store.describe(original_path)?,
            original_url,
        );
        debug!(stage = ?Stage::Described, path = %target.path);
        Ok((paths, status))
    }

    fn generate(&self, path: &str) -> Result<(), ProcessError> {
        debug!(stage = ?Stage::Generating, path);
        let quality = self.config.quality();
        let source = self.store.resolve_path(&self.config.original().path)?;

        let mut handle = self.backend.load(&source)?;
        self.backend.apply_quality(&mut handle, quality)?;
        if let Some(size) = self.config.resize_target() {
            self.backend.resize(
                &mut handle,
                self.config.method(),
                size.width,
                size.height,
                &self.options.resize,
            )?;
        }
        if let Some(format) = self.config.convert_target() {
            self.backend
                .convert(&mut handle, format, quality, &self.options.convert)?;
        }

        let destination = self.store.resolve_path(path)?;
        self.backend.save(&handle, &destination)?;
        debug!(stage = ?Stage::Persisted, path);
        Ok(())
    }
}
