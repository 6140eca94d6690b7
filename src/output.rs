//! CLI output formatting for all commands.
//!
//! # Output Format
//!
//! ## Process
//!
//! ```text
//! 001 /img/test.jpg (400x300)
//!     Plan: resize 200x110, jpg, q99
//!     Derivative: /img/modify/99/resize/200x110/test.jpg (200x110): generated
//!     URL: https://img.example.com/img/modify/99/resize/200x110/test.jpg
//! 002 /img/missing.jpg
//!     Error: storage error: not found: /img/missing.jpg
//! ```
//!
//! ## List
//!
//! ```text
//! /img/test.jpg (2 derivatives)
//!     /img/modify/55/resize/png/test.png
//!     /img/modify/99/resize/200x110/test.jpg
//! ```
//!
//! ## Delete
//!
//! ```text
//! /img/test.jpg: removed 3 files (original included)
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::cache::CacheStatus;
use crate::config::{ServiceConfig, effective_threads};
use crate::paths::Paths;
use crate::policy::AllowedSizes;
use crate::request::AppliedParams;
use std::fmt;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn status_label(status: CacheStatus) -> &'static str {
    match status {
        CacheStatus::Hit => "cached",
        CacheStatus::Generated => "generated",
    }
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

// ============================================================================
// process
// ============================================================================

/// Format one processed original.
pub fn format_result(
    index: usize,
    paths: &Paths,
    params: &AppliedParams,
    status: CacheStatus,
) -> Vec<String> {
    let original = paths.original_info();
    let derivative = paths.info();
    let size = params
        .size
        .map(|s| format!(" {s}"))
        .unwrap_or_default();

    vec![
        format!(
            "{} {} ({}x{})",
            format_index(index),
            original.path,
            original.width,
            original.height
        ),
        format!(
            "{}Plan: {}{}, {}, q{}",
            indent(1),
            params.method,
            size,
            params.format,
            params.quality
        ),
        format!(
            "{}Derivative: {} ({}x{}): {}",
            indent(1),
            derivative.path,
            derivative.width,
            derivative.height,
            status_label(status)
        ),
        format!("{}URL: {}", indent(1), paths.url()),
    ]
}

/// Format a failed request.
pub fn format_failure(index: usize, path: &str, error: &dyn fmt::Display) -> Vec<String> {
    vec![
        format!("{} {}", format_index(index), path),
        format!("{}Error: {}", indent(1), error),
    ]
}

pub fn print_result(index: usize, paths: &Paths, params: &AppliedParams, status: CacheStatus) {
    print_lines(format_result(index, paths, params, status));
}

pub fn print_failure(index: usize, path: &str, error: &dyn fmt::Display) {
    print_lines(format_failure(index, path, error));
}

// ============================================================================
// list / delete
// ============================================================================

pub fn format_derivatives(original: &str, derivatives: &[String]) -> Vec<String> {
    let mut lines = vec![match derivatives.len() {
        0 => format!("{original} (no derivatives)"),
        1 => format!("{original} (1 derivative)"),
        n => format!("{original} ({n} derivatives)"),
    }];
    lines.extend(derivatives.iter().map(|d| format!("{}{}", indent(1), d)));
    lines
}

pub fn print_derivatives(original: &str, derivatives: &[String]) {
    print_lines(format_derivatives(original, derivatives));
}

pub fn format_deletion(original: &str, removed: usize, original_deleted: bool) -> Vec<String> {
    let noun = if removed == 1 { "file" } else { "files" };
    let suffix = if original_deleted {
        " (original included)"
    } else {
        ""
    };
    vec![format!("{original}: removed {removed} {noun}{suffix}")]
}

pub fn print_deletion(original: &str, removed: usize, original_deleted: bool) {
    print_lines(format_deletion(original, removed, original_deleted));
}

// ============================================================================
// check
// ============================================================================

/// Summarize a validated configuration.
pub fn format_config_check(config: &ServiceConfig) -> Vec<String> {
    let sizes = match &config.policy.sizes {
        AllowedSizes::Any => "any".to_string(),
        AllowedSizes::Only(list) => list.iter().cloned().collect::<Vec<_>>().join(", "),
    };
    let quality = config
        .policy
        .quality
        .map(|q| q.to_string())
        .unwrap_or_else(|| "95 (fallback)".to_string());

    vec![
        "Config OK".to_string(),
        format!("{}Root: {}", indent(1), config.storage.root.display()),
        format!("{}Sizes: {}", indent(1), sizes),
        format!("{}Formats: {}", indent(1), config.policy.formats.join(", ")),
        format!("{}Methods: {}", indent(1), config.policy.methods.join(", ")),
        format!("{}Quality: {}", indent(1), quality),
        format!(
            "{}Workers: {}",
            indent(1),
            effective_threads(&config.processing)
        ),
    ]
}

pub fn print_config_check(config: &ServiceConfig) {
    print_lines(format_config_check(config));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{Method, Size};
    use crate::test_helpers::descriptor;

    fn sample_paths() -> Paths {
        Paths::new(
            descriptor("/img/modify/99/resize/200x110/test.jpg", 200, 110),
            "https://img.test/img/modify/99/resize/200x110/test.jpg".into(),
            descriptor("/img/test.jpg", 400, 300),
            "https://img.test/img/test.jpg".into(),
        )
    }

    #[test]
    fn result_lines() {
        let params = AppliedParams {
            method: Method::Resize,
            format: "jpg".into(),
            quality: 99,
            size: Some(Size::new(200, 110)),
        };
        let lines = format_result(1, &sample_paths(), &params, CacheStatus::Generated);
        assert_eq!(
            lines,
            vec![
                "001 /img/test.jpg (400x300)",
                "    Plan: resize 200x110, jpg, q99",
                "    Derivative: /img/modify/99/resize/200x110/test.jpg (200x110): generated",
                "    URL: https://img.test/img/modify/99/resize/200x110/test.jpg",
            ]
        );
    }

    #[test]
    fn result_without_size_and_cached() {
        let params = AppliedParams {
            method: Method::Crop,
            format: "png".into(),
            quality: 55,
            size: None,
        };
        let lines = format_result(12, &sample_paths(), &params, CacheStatus::Hit);
        assert_eq!(lines[0], "012 /img/test.jpg (400x300)");
        assert_eq!(lines[1], "    Plan: crop, png, q55");
        assert!(lines[2].ends_with(": cached"));
    }

    #[test]
    fn failure_lines() {
        let lines = format_failure(3, "/img/x.jpg", &"not found: /img/x.jpg");
        assert_eq!(lines, vec!["003 /img/x.jpg", "    Error: not found: /img/x.jpg"]);
    }

    #[test]
    fn derivatives_listing() {
        let list = vec!["/img/modify/95/resize/test.jpg".to_string()];
        assert_eq!(
            format_derivatives("/img/test.jpg", &list),
            vec![
                "/img/test.jpg (1 derivative)",
                "    /img/modify/95/resize/test.jpg"
            ]
        );
        assert_eq!(
            format_derivatives("/img/test.jpg", &[]),
            vec!["/img/test.jpg (no derivatives)"]
        );
    }

    #[test]
    fn deletion_summary() {
        assert_eq!(
            format_deletion("/img/test.jpg", 3, true),
            vec!["/img/test.jpg: removed 3 files (original included)"]
        );
        assert_eq!(
            format_deletion("/img/test.jpg", 1, false),
            vec!["/img/test.jpg: removed 1 file"]
        );
    }

    #[test]
    fn config_check_summary() {
        let lines = format_config_check(&ServiceConfig::default());
        assert_eq!(lines[0], "Config OK");
        assert!(lines.contains(&"    Sizes: any".to_string()));
        assert!(lines.contains(&"    Quality: 95 (fallback)".to_string()));
        assert!(lines.contains(&"    Methods: resize, fit, crop".to_string()));
    }
}
