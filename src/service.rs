//! Composition root for request handling.
//!
//! A [`Service`] owns everything a request needs: the validation policy,
//! default backend options, the backend, the store and the per-path locks.
//! It is built explicitly (by the CLI's `main` or by a test) and passed
//! around by reference; there is no global instance.
//!
//! ```rust,no_run
//! use imgmod::{LocalStore, ParameterSet, RustBackend, Service, ValidationPolicy};
//! use imgmod::imaging::TransformOptions;
//!
//! let service = Service::new(
//!     ValidationPolicy::default(),
//!     TransformOptions::default(),
//!     RustBackend::new(),
//!     LocalStore::new("/srv/www", "https://img.example.com"),
//! );
//! let paths = service
//!     .modify("/img/test.jpg", &ParameterSet::default().with_size("200x0"))?
//!     .process()?;
//! println!("{}", paths.url());
//! # Ok::<(), imgmod::ProcessError>(())
//! ```

use crate::config::ServiceConfig;
use crate::derivatives::Derivatives;
use crate::imaging::{TransformBackend, TransformOptions};
use crate::locks::PathLocks;
use crate::params::ParameterSet;
use crate::policy::ValidationPolicy;
use crate::processor::{ProcessError, Processor};
use crate::request::RequestConfig;
use crate::storage::{AssetStore, LocalStore, StorageResult};
use tracing::debug;

pub struct Service<B: TransformBackend, S: AssetStore> {
    policy: ValidationPolicy,
    transform: TransformOptions,
    backend: B,
    store: S,
    locks: PathLocks,
}

impl<B: TransformBackend> Service<B, LocalStore> {
    /// Build a service over a [`LocalStore`] from loaded configuration.
    pub fn from_config(config: &ServiceConfig, backend: B) -> Self {
        Self::new(
            config.policy.clone(),
            config.transform,
            backend,
            LocalStore::new(config.storage.root.clone(), config.storage.base_url.clone()),
        )
    }
}

impl<B: TransformBackend, S: AssetStore> Service<B, S> {
    pub fn new(policy: ValidationPolicy, transform: TransformOptions, backend: B, store: S) -> Self {
        Self {
            policy,
            transform,
            backend,
            store,
            locks: PathLocks::new(),
        }
    }

    /// Validate `params` against the original at `path` and return a
    /// processor ready to run.
    pub fn modify(
        &self,
        path: &str,
        params: &ParameterSet,
    ) -> Result<Processor<'_, B, S>, ProcessError> {
        let original = self.store.describe(path)?;
        debug!(original = %original.path, ?params, "new request");
        let config = RequestConfig::new(&self.policy, params, original)?;
        Ok(Processor::new(
            &self.backend,
            &self.store,
            &self.locks,
            config,
            self.transform,
        ))
    }

    /// [`modify`](Self::modify) with parameters in path form, e.g.
    /// `r/200x110/f/png/q/50/`.
    pub fn modify_str(&self, path: &str, segments: &str) -> Result<Processor<'_, B, S>, ProcessError> {
        let params = ParameterSet::from_segments(segments)?;
        self.modify(path, &params)
    }

    pub fn derivatives(&self, path: &str) -> StorageResult<Derivatives<'_, S>> {
        Derivatives::new(&self.store, path)
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockBackend;
    use crate::policy::ConfigValidationError;
    use crate::storage::StorageError;
    use crate::test_helpers::*;
    use tempfile::TempDir;

    fn service() -> (TempDir, Service<MockBackend, LocalStore>) {
        let (tmp, store) = fixture_store();
        write_test_jpeg(&store.root().join("img/test.jpg"), 400, 300);
        let service = Service::new(
            scenario_policy(),
            TransformOptions::default(),
            MockBackend::new(),
            store,
        );
        (tmp, service)
    }

    #[test]
    fn modify_and_process() {
        let (_tmp, service) = service();
        let paths = service
            .modify("/img/test.jpg", &ParameterSet::default().with_size("200x110"))
            .unwrap()
            .process()
            .unwrap();
        assert_eq!(paths.logical_path(), "/img/modify/99/resize/200x110/test.jpg");
        assert_eq!(paths.url(), "https://img.test/img/modify/99/resize/200x110/test.jpg");
        assert_eq!(paths.original_url(), "https://img.test/img/test.jpg");
    }

    #[test]
    fn modify_str_parses_segments() {
        let (_tmp, service) = service();
        let paths = service
            .modify_str("img/test.jpg", "r/200x130/f/png/q/22/")
            .unwrap()
            .process()
            .unwrap();
        assert_eq!(
            paths.logical_path(),
            "/img/modify/22/resize/200x130/png/test.png"
        );
    }

    #[test]
    fn missing_original_is_storage_error() {
        let (_tmp, service) = service();
        let result = service.modify("/img/nope.jpg", &ParameterSet::default());
        assert!(matches!(
            result,
            Err(ProcessError::Storage(StorageError::NotFound(_)))
        ));
    }

    #[test]
    fn disallowed_format_is_config_error() {
        let (_tmp, service) = service();
        let result = service.modify("/img/test.jpg", &ParameterSet::default().with_format("mp3"));
        assert!(matches!(
            result,
            Err(ProcessError::Config(ConfigValidationError::FormatNotAllowed(_)))
        ));
    }

    #[test]
    fn traversal_is_rejected() {
        let (_tmp, service) = service();
        let result = service.modify("/img/../../etc/passwd", &ParameterSet::default());
        assert!(matches!(
            result,
            Err(ProcessError::Storage(StorageError::InvalidPath(_)))
        ));
    }

    #[test]
    fn derivatives_see_processed_files() {
        let (_tmp, service) = service();
        service
            .modify_str("/img/test.jpg", "f/webp/")
            .unwrap()
            .process()
            .unwrap();
        let derivatives = service.derivatives("/img/test.jpg").unwrap();
        assert_eq!(
            derivatives.list().unwrap(),
            vec!["/img/modify/99/resize/webp/test.webp"]
        );
    }
}
