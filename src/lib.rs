//! # imgmod
//!
//! On-demand image derivatives. A request names an original by its logical
//! path plus a few parameters (size, format, quality, method); imgmod
//! validates the request against a policy, derives a deterministic cache path
//! from the normalized parameters, and produces the derivative there once.
//! Every later identical request is served from disk.
//!
//! # Request Flow
//!
//! ```text
//! 1. Validate   ParameterSet + policy  →  RequestConfig   (pure, no I/O)
//! 2. Derive     RequestConfig          →  cache path      (pure, no I/O)
//! 3. Process    cache path missing?    →  load, resize, convert, save
//! 4. Describe   original + derivative  →  Paths           (paths, URLs, dims)
//! ```
//!
//! Steps 1 and 2 are pure, so validation rules and path layout are unit
//! tested without touching the filesystem or encoding images.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`params`] | Request parameters as received: `ParameterSet`, `Method`, `Size` |
//! | [`policy`] | Allow-lists for sizes, formats, methods; `ConfigValidationError` |
//! | [`format`] | Output format names and their aliases (`jpg` = `jpeg`) |
//! | [`request`] | `RequestConfig`: the validated, normalized request |
//! | [`cache`] | Cache path derivation and hit/generated bookkeeping |
//! | [`storage`] | `AssetStore` trait and the filesystem-backed `LocalStore` |
//! | [`imaging`] | `TransformBackend` trait and the pure-Rust `RustBackend` |
//! | [`locks`] | Per-path locks so concurrent identical requests generate once |
//! | [`processor`] | Runs one request end to end |
//! | [`paths`] | Result of a request: derivative and original locations |
//! | [`derivatives`] | List and delete everything derived from one original |
//! | [`service`] | Composition root tying policy, backend and store together |
//! | [`config`] | `imgmod.toml` loading, merging and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## The Path Is the Cache Key
//!
//! There is no manifest and no hashing. A derivative's location is built from
//! its normalized parameters (see [`cache`]), so checking the cache is a single
//! existence check and the cache can be inspected or purged with `ls` and `rm`.
//!
//! ## Validate Before Touching Pixels
//!
//! Every check a request can fail runs in [`RequestConfig::new`], before any
//! file is opened for decoding. A rejected request costs one header read.
//!
//! ## Atomic Writes
//!
//! Backends encode into a temp file beside the destination and rename it into
//! place. Together with [`locks`], a reader never sees a half-written
//! derivative and two identical requests never encode twice.

pub mod cache;
pub mod config;
pub mod derivatives;
pub mod format;
pub mod imaging;
pub mod locks;
pub mod output;
pub mod params;
pub mod paths;
pub mod policy;
pub mod processor;
pub mod request;
pub mod service;
pub mod storage;

pub use cache::{CacheStats, CacheStatus};
pub use derivatives::Derivatives;
pub use imaging::{RustBackend, TransformBackend};
pub use params::{Method, ParameterSet, RawSize, Size};
pub use paths::Paths;
pub use policy::{AllowedSizes, ConfigValidationError, ValidationPolicy};
pub use processor::{ProcessError, Processor};
pub use request::RequestConfig;
pub use service::Service;
pub use storage::{AssetDescriptor, AssetStore, LocalStore, StorageError};

#[cfg(test)]
pub(crate) mod test_helpers;
