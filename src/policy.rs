//! Allow-list rules applied to every request.
//!
//! A [`ValidationPolicy`] is loaded once from the `[policy]` config section
//! and borrowed read-only by every [`RequestConfig`](crate::request::RequestConfig).
//!
//! ```toml
//! [policy]
//! sizes = "*"                       # or ["200x110", "640x0"]
//! formats = ["jpg", "jpeg", "png"]
//! methods = ["resize", "crop", "fit"]
//! quality = 90                      # optional default
//! ```

use crate::params::{Method, Size};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use thiserror::Error;

/// A request (or the policy itself) failed validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("format '{0}' is not allowed")]
    FormatNotAllowed(String),
    #[error("size '{0}' is not allowed")]
    SizeNotAllowed(String),
    #[error("method '{0}' is not allowed")]
    MethodNotAllowed(String),
    #[error("malformed size '{0}': expected WxH with non-negative integers")]
    MalformedSize(String),
    #[error("malformed quality '{0}': expected an integer")]
    MalformedQuality(String),
    #[error("malformed policy: {0}")]
    MalformedPolicy(String),
}

const WILDCARD: &str = "*";

/// Sizes a request may ask for.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AllowedSizes {
    /// `"*"`: any parsable size.
    #[default]
    Any,
    /// Explicit `WxH` entries.
    Only(BTreeSet<String>),
}

impl AllowedSizes {
    pub fn permits(&self, size: Size) -> bool {
        match self {
            AllowedSizes::Any => true,
            AllowedSizes::Only(entries) => entries
                .iter()
                .any(|entry| entry.parse::<Size>().is_ok_and(|allowed| allowed == size)),
        }
    }
}

impl Serialize for AllowedSizes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AllowedSizes::Any => serializer.serialize_str(WILDCARD),
            AllowedSizes::Only(entries) => entries.serialize(serializer),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAllowedSizes {
    Marker(String),
    List(Vec<String>),
}

impl<'de> Deserialize<'de> for AllowedSizes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;
        match RawAllowedSizes::deserialize(deserializer) {
            Ok(RawAllowedSizes::Marker(m)) if m == WILDCARD => Ok(AllowedSizes::Any),
            Ok(RawAllowedSizes::Marker(m)) => Err(D::Error::custom(format!(
                "sizes must be \"*\" or a list of WxH strings, got \"{m}\""
            ))),
            Ok(RawAllowedSizes::List(list)) => Ok(AllowedSizes::Only(list.into_iter().collect())),
            Err(_) => Err(D::Error::custom(
                "sizes must be \"*\" or a list of WxH strings",
            )),
        }
    }
}

/// Allow-lists for methods, sizes and formats, plus the default quality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationPolicy {
    pub sizes: AllowedSizes,
    pub formats: Vec<String>,
    pub methods: Vec<String>,
    /// Quality used when a request names none. Falls back to 95.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<i64>,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            sizes: AllowedSizes::Any,
            formats: ["jpg", "jpeg", "gif", "png", "webp"]
                .into_iter()
                .map(String::from)
                .collect(),
            methods: Method::ALL.iter().map(|m| m.as_str().to_string()).collect(),
            quality: None,
        }
    }
}

impl ValidationPolicy {
    /// Case-insensitive format membership.
    pub fn allows_format(&self, format: &str) -> bool {
        let format = format.trim();
        self.formats.iter().any(|f| f.eq_ignore_ascii_case(format))
    }

    pub fn allows_method(&self, method: Method) -> bool {
        self.methods
            .iter()
            .any(|m| m.trim().eq_ignore_ascii_case(method.as_str()))
    }

    pub fn permits_size(&self, size: Size) -> bool {
        self.sizes.permits(size)
    }

    /// Reject a policy no request could satisfy or that names unknown values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.formats.is_empty() {
            return Err(ConfigValidationError::MalformedPolicy(
                "formats must not be empty".into(),
            ));
        }
        if self.methods.is_empty() {
            return Err(ConfigValidationError::MalformedPolicy(
                "methods must not be empty".into(),
            ));
        }
        for method in &self.methods {
            method.parse::<Method>().map_err(|_| {
                ConfigValidationError::MalformedPolicy(format!("unknown method '{method}'"))
            })?;
        }
        if let AllowedSizes::Only(entries) = &self.sizes {
            for entry in entries {
                entry.parse::<Size>().map_err(|_| {
                    ConfigValidationError::MalformedPolicy(format!("malformed size entry '{entry}'"))
                })?;
            }
        }
        if let Some(q) = self.quality
            && !(1..=100).contains(&q)
        {
            return Err(ConfigValidationError::MalformedPolicy(format!(
                "quality must be 1-100, got {q}"
            )));
        }
        Ok(())
    }
}
