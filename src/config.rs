//! Service configuration module.
//!
//! Handles loading, validating, and merging `imgmod.toml`. Stock defaults
//! are serialized to a TOML table and the user file is deep-merged on top,
//! so a config file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [storage]
//! root = "."                # Document root holding the originals
//! base_url = ""             # Prefix for public URLs
//!
//! [policy]
//! sizes = "*"               # "*" or a list like ["200x110", "640x0"]
//! formats = ["jpg", "jpeg", "gif", "png", "webp"]
//! methods = ["resize", "fit", "crop"]
//! # quality = 90            # Default quality (omit for 95)
//!
//! [transform.resize]
//! allow_enlarge = false     # Permit output larger than the source
//! position = "center"       # Anchor for fit and crop
//! # x = 0                   # Explicit crop offset
//! # y = 0
//!
//! [transform.convert]
//! # background = [255, 255, 255]  # Flatten alpha for JPEG/BMP output
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::TransformOptions;
use crate::policy::{ConfigValidationError, ValidationPolicy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILENAME: &str = "imgmod.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Policy error: {0}")]
    Policy(#[from] ConfigValidationError),
}

/// Service configuration loaded from `imgmod.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// Where originals live and how they are addressed.
    pub storage: StorageConfig,
    /// Allow-lists applied to every request.
    pub policy: ValidationPolicy,
    /// Default backend options for resize and convert.
    pub transform: TransformOptions,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl ServiceConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.policy.validate()?;
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub root: PathBuf,
    pub base_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            base_url: String::new(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(ServiceConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(file: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !file.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(file)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ServiceConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ServiceConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `file`, falling back to stock defaults if it is absent.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(file: &Path) -> Result<ServiceConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(file)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `imgmod.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# imgmod Configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Storage
# ---------------------------------------------------------------------------
[storage]
# Document root. Logical paths like /img/test.jpg resolve under it.
root = "."

# Prefix for public URLs, e.g. "https://img.example.com".
base_url = ""

# ---------------------------------------------------------------------------
# Validation policy
# ---------------------------------------------------------------------------
[policy]
# "*" allows any size, or list exact sizes as "WxH" strings.
# A zero axis keeps the aspect ratio: "640x0", "0x480".
sizes = "*"

# Output formats a request may name (case-insensitive).
formats = ["jpg", "jpeg", "gif", "png", "webp"]

# Methods a request may name: resize, fit, crop.
methods = ["resize", "fit", "crop"]

# Default quality (1-100) when a request names none. Omit for 95.
# quality = 90

# ---------------------------------------------------------------------------
# Transform options
# ---------------------------------------------------------------------------
[transform.resize]
# Allow output larger than the original.
allow_enlarge = false

# Anchor for fit and crop: top-left, top, top-right, left, center,
# right, bottom-left, bottom, bottom-right.
position = "center"

# Explicit top-left corner for crop windows.
# x = 0
# y = 0

[transform.convert]
# RGB colour that transparent pixels are flattened onto when converting
# to a format without alpha (JPEG, BMP).
# background = [255, 255, 255]

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers for batch processing.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Anchor;
    use crate::policy::AllowedSizes;
    use tempfile::TempDir;

    fn write_config(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join(CONFIG_FILENAME);
        fs::write(&path, body).unwrap();
        path
    }

    // =========================================================================
    // Defaults
    // =========================================================================

    #[test]
    fn default_config_is_valid() {
        assert!(ServiceConfig::default().validate().is_ok());
    }

    #[test]
    fn stock_config_toml_matches_defaults() {
        let value: toml::Value = toml::from_str(stock_config_toml()).unwrap();
        let config = resolve_config(stock_defaults_value().unwrap(), Some(value)).unwrap();
        assert_eq!(config, ServiceConfig::default());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join(CONFIG_FILENAME)).unwrap();
        assert_eq!(config, ServiceConfig::default());
    }

    // =========================================================================
    // Merging
    // =========================================================================

    #[test]
    fn partial_config_overrides_only_given_keys() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(
            tmp.path(),
            r#"
[policy]
quality = 80
sizes = ["200x110"]

[transform.resize]
position = "top-left"
"#,
        );
        let config = load_config(&path).unwrap();
        assert_eq!(config.policy.quality, Some(80));
        assert_eq!(
            config.policy.sizes,
            AllowedSizes::Only(["200x110".to_string()].into_iter().collect())
        );
        assert_eq!(config.transform.resize.position, Anchor::TopLeft);
        assert!(!config.transform.resize.allow_enlarge);
        assert_eq!(config.policy.formats, ValidationPolicy::default().formats);
    }

    #[test]
    fn merge_toml_replaces_arrays_wholesale() {
        let base: toml::Value = toml::from_str(r#"a = [1, 2]
[t]
x = 1
y = 2"#)
        .unwrap();
        let overlay: toml::Value = toml::from_str(r#"a = [3]
[t]
y = 5"#)
        .unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_array().unwrap().len(), 1);
        assert_eq!(merged["t"]["x"].as_integer(), Some(1));
        assert_eq!(merged["t"]["y"].as_integer(), Some(5));
    }

    // =========================================================================
    // Rejection
    // =========================================================================

    #[test]
    fn unknown_keys_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(tmp.path(), "[policy]\ncolour = 1\n");
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn invalid_policy_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(tmp.path(), "[policy]\nmethods = [\"rotate\"]\n");
        assert!(matches!(load_config(&path), Err(ConfigError::Policy(_))));
    }

    #[test]
    fn zero_processes_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(tmp.path(), "[processing]\nmax_processes = 0\n");
        assert!(matches!(load_config(&path), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn malformed_toml_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(tmp.path(), "[policy\n");
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    // =========================================================================
    // effective_threads
    // =========================================================================

    #[test]
    fn effective_threads_caps_at_cores() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let config = ProcessingConfig {
            max_processes: Some(usize::MAX),
        };
        assert_eq!(effective_threads(&config), cores);
        assert_eq!(effective_threads(&ProcessingConfig::default()), cores);
        assert_eq!(
            effective_threads(&ProcessingConfig {
                max_processes: Some(1)
            }),
            1
        );
    }
}
