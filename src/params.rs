//! Raw transform requests.
//!
//! A [`ParameterSet`] is what a caller asks for, before any policy has been
//! applied: an optional method name, size, format and quality. Everything is
//! kept loose here (strings and signed integers) so that validation happens
//! in exactly one place, [`RequestConfig`](crate::request::RequestConfig).
//!
//! Two input forms are supported:
//!
//! - Builder / serde: `{"resize": "200x110", "format": "png", "quality": 50}`
//!   or `ParameterSet::default().with_size("200x110")`.
//! - Path segments: `r/200x110/f/png/q/50/m/crop/`, see
//!   [`ParameterSet::from_segments`].

use crate::policy::ConfigValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Transformation method applied when a size is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Scale to the target size (zero axis follows the aspect ratio).
    #[default]
    Resize,
    /// Cover the target box, then crop the overflow at the configured anchor.
    Fit,
    /// Cut a window of the target size out of the source.
    Crop,
}

impl Method {
    pub const ALL: [Method; 3] = [Method::Resize, Method::Fit, Method::Crop];

    pub fn as_str(self) -> &'static str {
        match self {
            Method::Resize => "resize",
            Method::Fit => "fit",
            Method::Crop => "crop",
        }
    }
}

impl FromStr for Method {
    type Err = ConfigValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Method::ALL
            .into_iter()
            .find(|m| m.as_str() == lowered)
            .ok_or_else(|| ConfigValidationError::MethodNotAllowed(s.to_string()))
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized target size. Zero on an axis is the "follow the aspect
/// ratio" sentinel; `0x0` is accepted and leaves the image as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

fn parse_axis(component: &str, whole: &str) -> Result<u32, ConfigValidationError> {
    let component = component.trim();
    if component.is_empty() {
        return Ok(0);
    }
    component
        .parse::<u32>()
        .map_err(|_| ConfigValidationError::MalformedSize(whole.to_string()))
}

impl FromStr for Size {
    type Err = ConfigValidationError;

    /// Parses `WxH`. An empty component means 0, so `x200` is `0x200`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| ConfigValidationError::MalformedSize(s.to_string()))?;
        Ok(Size::new(parse_axis(w, s)?, parse_axis(h, s)?))
    }
}

/// A size as supplied by the caller: `"WxH"` text or a `[w, h]` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawSize {
    Text(String),
    Pair([i64; 2]),
}

impl RawSize {
    /// Normalize to an integer pair. Empty text means "no size".
    pub fn normalize(&self) -> Result<Option<Size>, ConfigValidationError> {
        match self {
            RawSize::Text(text) if text.trim().is_empty() => Ok(None),
            RawSize::Text(text) => text.parse().map(Some),
            RawSize::Pair([w, h]) => {
                let axis = |v: i64| {
                    u32::try_from(v)
                        .map_err(|_| ConfigValidationError::MalformedSize(format!("[{w}, {h}]")))
                };
                Ok(Some(Size::new(axis(*w)?, axis(*h)?)))
            }
        }
    }
}

impl From<&str> for RawSize {
    fn from(s: &str) -> Self {
        RawSize::Text(s.to_string())
    }
}

impl From<String> for RawSize {
    fn from(s: String) -> Self {
        RawSize::Text(s)
    }
}

impl From<(u32, u32)> for RawSize {
    fn from((w, h): (u32, u32)) -> Self {
        RawSize::Pair([w as i64, h as i64])
    }
}

impl From<[i64; 2]> for RawSize {
    fn from(pair: [i64; 2]) -> Self {
        RawSize::Pair(pair)
    }
}

impl From<Size> for RawSize {
    fn from(size: Size) -> Self {
        RawSize::from(size.as_tuple())
    }
}

/// Raw transform request. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParameterSet {
    pub method: Option<String>,
    #[serde(rename = "resize")]
    pub size: Option<RawSize>,
    pub format: Option<String>,
    pub quality: Option<i64>,
}

impl ParameterSet {
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_size(mut self, size: impl Into<RawSize>) -> Self {
        self.size = Some(size.into());
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_quality(mut self, quality: i64) -> Self {
        self.quality = Some(quality);
        self
    }

    /// Parse the compact path form `r/200x110/f/png/q/50/m/crop/`.
    ///
    /// Each key (`r` size, `f` format, `q` quality, `m` method) takes the
    /// segment after it as its value, wherever the pair appears; other
    /// segments are skipped. An empty value leaves the field unset. When a
    /// key repeats, the first occurrence wins.
    pub fn from_segments(input: &str) -> Result<Self, ConfigValidationError> {
        let segments: Vec<&str> = input.split('/').collect();
        let mut params = ParameterSet::default();

        let mut i = 0;
        while let Some(&key) = segments.get(i) {
            if !matches!(key, "r" | "f" | "q" | "m") {
                i += 1;
                continue;
            }
            let Some(value) = segments.get(i + 1).map(|v| v.trim()) else {
                break;
            };
            i += 2;
            if value.is_empty() {
                continue;
            }
            match key {
                "r" if params.size.is_none() => params.size = Some(RawSize::from(value)),
                "f" if params.format.is_none() => params.format = Some(value.to_string()),
                "m" if params.method.is_none() => params.method = Some(value.to_string()),
                "q" if params.quality.is_none() => {
                    let quality = value
                        .parse::<i64>()
                        .map_err(|_| ConfigValidationError::MalformedQuality(value.to_string()))?;
                    params.quality = Some(quality);
                }
                _ => {}
            }
        }

        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Method
    // =========================================================================

    #[test]
    fn method_parses_case_insensitively() {
        assert_eq!("resize".parse::<Method>().unwrap(), Method::Resize);
        assert_eq!("FIT".parse::<Method>().unwrap(), Method::Fit);
        assert_eq!(" crop ".parse::<Method>().unwrap(), Method::Crop);
    }

    #[test]
    fn unknown_method_is_rejected() {
        assert!(matches!(
            "rotate".parse::<Method>(),
            Err(ConfigValidationError::MethodNotAllowed(m)) if m == "rotate"
        ));
    }

    // =========================================================================
    // Size
    // =========================================================================

    #[test]
    fn size_parses_wxh() {
        assert_eq!("200x110".parse::<Size>().unwrap(), Size::new(200, 110));
    }

    #[test]
    fn size_empty_component_is_zero() {
        assert_eq!("x200".parse::<Size>().unwrap(), Size::new(0, 200));
        assert_eq!("300x".parse::<Size>().unwrap(), Size::new(300, 0));
        assert_eq!("0x0".parse::<Size>().unwrap(), Size::new(0, 0));
    }

    #[test]
    fn size_rejects_malformed_input() {
        for bad in ["200", "axb", "-5x10", "10x2.5"] {
            assert!(
                matches!(bad.parse::<Size>(), Err(ConfigValidationError::MalformedSize(_))),
                "{bad} should be malformed"
            );
        }
    }

    #[test]
    fn size_display_is_canonical() {
        assert_eq!(Size::new(200, 0).to_string(), "200x0");
    }

    // =========================================================================
    // RawSize
    // =========================================================================

    #[test]
    fn raw_size_pair_normalizes() {
        let raw = RawSize::from([640, 480]);
        assert_eq!(raw.normalize().unwrap(), Some(Size::new(640, 480)));
    }

    #[test]
    fn raw_size_negative_pair_is_malformed() {
        let raw = RawSize::from([-1, 480]);
        assert!(matches!(
            raw.normalize(),
            Err(ConfigValidationError::MalformedSize(_))
        ));
    }

    #[test]
    fn raw_size_empty_text_is_absent() {
        assert_eq!(RawSize::from("").normalize().unwrap(), None);
        assert_eq!(RawSize::from("  ").normalize().unwrap(), None);
    }

    #[test]
    fn raw_size_deserializes_both_forms() {
        let text: ParameterSet = serde_json::from_str(r#"{"resize": "200x110"}"#).unwrap();
        assert_eq!(text.size, Some(RawSize::Text("200x110".into())));

        let pair: ParameterSet = serde_json::from_str(r#"{"resize": [200, 110]}"#).unwrap();
        assert_eq!(pair.size, Some(RawSize::Pair([200, 110])));
    }

    #[test]
    fn parameter_set_rejects_unknown_fields() {
        let result: Result<ParameterSet, _> = serde_json::from_str(r#"{"rotate": 90}"#);
        assert!(result.is_err());
    }

    // =========================================================================
    // from_segments
    // =========================================================================

    #[test]
    fn segments_parse_all_keys() {
        let params = ParameterSet::from_segments("r/200x110/f/png/q/50/m/crop/").unwrap();
        assert_eq!(params.size, Some(RawSize::Text("200x110".into())));
        assert_eq!(params.format.as_deref(), Some("png"));
        assert_eq!(params.quality, Some(50));
        assert_eq!(params.method.as_deref(), Some("crop"));
    }

    #[test]
    fn segments_ignore_unknown_keys_and_dangling_key() {
        let params = ParameterSet::from_segments("/z/whatever/f/webp/q").unwrap();
        assert_eq!(params.format.as_deref(), Some("webp"));
        assert_eq!(params.quality, None);
        assert_eq!(params.size, None);
    }

    #[test]
    fn segments_non_integer_quality_is_malformed() {
        assert!(matches!(
            ParameterSet::from_segments("q/high/"),
            Err(ConfigValidationError::MalformedQuality(q)) if q == "high"
        ));
    }

    #[test]
    fn segments_after_a_leading_prefix() {
        let params = ParameterSet::from_segments("img/r/200x110/f/png/").unwrap();
        assert_eq!(params.size, Some(RawSize::Text("200x110".into())));
        assert_eq!(params.format.as_deref(), Some("png"));
    }

    #[test]
    fn segments_empty_value_is_absent() {
        let params = ParameterSet::from_segments("r//f/png/").unwrap();
        assert_eq!(params.size, None);
        assert_eq!(params.format.as_deref(), Some("png"));

        let params = ParameterSet::from_segments("q//m/fit/").unwrap();
        assert_eq!(params.quality, None);
        assert_eq!(params.method.as_deref(), Some("fit"));
    }

    #[test]
    fn segments_first_occurrence_wins() {
        let params = ParameterSet::from_segments("f/png/f/webp/").unwrap();
        assert_eq!(params.format.as_deref(), Some("png"));
    }

    #[test]
    fn segments_empty_input_is_empty_set() {
        assert_eq!(
            ParameterSet::from_segments("").unwrap(),
            ParameterSet::default()
        );
    }
}
