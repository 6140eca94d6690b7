//! Pure calculation functions for derivative geometry.
//!
//! All functions here are pure and testable without any I/O or images.
//! Dimensions are `(width, height)` tuples; a zero on one target axis is the
//! "follow the aspect ratio" sentinel.

use super::params::Anchor;

fn scale(value: u32, numerator: u32, denominator: u32) -> u32 {
    (value as f64 * numerator as f64 / denominator as f64).round() as u32
}

/// Output dimensions for the `resize` method.
///
/// - both axes set: exact size
/// - one axis zero: the other follows the source aspect ratio
/// - both zero: source size unchanged
///
/// Without `allow_enlarge`, an exact resize caps each axis at the source
/// size, and an aspect-preserving resize that would grow the image keeps the
/// source size.
///
/// ```text
/// (400, 300) → (200, 0)   = (200, 150)
/// (400, 300) → (0, 600)   = (400, 300)   without allow_enlarge
/// (400, 300) → (500, 100) = (400, 100)   without allow_enlarge
/// ```
pub fn resize_dimensions(
    source: (u32, u32),
    target: (u32, u32),
    allow_enlarge: bool,
) -> (u32, u32) {
    let (src_w, src_h) = source;
    if src_w == 0 || src_h == 0 {
        return source;
    }

    let (w, h, keeps_aspect) = match target {
        (0, 0) => return source,
        (w, 0) => (w, scale(src_h, w, src_w), true),
        (0, h) => (scale(src_w, h, src_h), h, true),
        (w, h) => (w, h, false),
    };

    let (w, h) = if allow_enlarge {
        (w, h)
    } else if keeps_aspect {
        if w > src_w || h > src_h {
            return source;
        }
        (w, h)
    } else {
        (w.min(src_w), h.min(src_h))
    };

    (w.max(1), h.max(1))
}

/// Calculate dimensions needed to fill a target area (resize before crop).
///
/// Returns dimensions that completely cover the target area while maintaining
/// the source aspect ratio. One dimension will match exactly, the other may exceed.
pub fn fill_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let src_aspect = src_w as f64 / src_h as f64;
    let tgt_aspect = tgt_w as f64 / tgt_h as f64;

    if src_aspect > tgt_aspect {
        // Source is wider: height will match, width will exceed
        let h = tgt_h;
        let w = (h as f64 * src_aspect).round() as u32;
        (w.max(tgt_w), h)
    } else {
        // Source is taller: width will match, height will exceed
        let w = tgt_w;
        let h = (w as f64 / src_aspect).round() as u32;
        (w, h.max(tgt_h))
    }
}

/// Target box for the `fit` method.
///
/// A zero height means a square box. A zero width takes the width from
/// the height. Without `allow_enlarge`, a box larger than the source is
/// scaled down, keeping its own ratio, until it fits inside the source.
pub fn fit_box(source: (u32, u32), target: (u32, u32), allow_enlarge: bool) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (w, h) = match target {
        (0, 0) => return source,
        (w, 0) => (w, w),
        (0, h) => (h, h),
        (w, h) => (w, h),
    };

    if allow_enlarge || (w <= src_w && h <= src_h) {
        return (w, h);
    }

    let factor = (src_w as f64 / w as f64).min(src_h as f64 / h as f64);
    let w = (w as f64 * factor).round() as u32;
    let h = (h as f64 * factor).round() as u32;
    (w.clamp(1, src_w.max(1)), h.clamp(1, src_h.max(1)))
}

/// Top-left corner of an `inner` window placed inside `outer` at `anchor`.
pub fn anchor_offset(outer: (u32, u32), inner: (u32, u32), anchor: Anchor) -> (u32, u32) {
    let free_w = outer.0.saturating_sub(inner.0);
    let free_h = outer.1.saturating_sub(inner.1);
    let (hx, hy) = anchor.halves();
    (free_w * hx / 2, free_h * hy / 2)
}

/// A crop window: `(x, y, width, height)` inside the source image.
pub type CropWindow = (u32, u32, u32, u32);

/// Window for the `crop` method.
///
/// A zero axis spans the full source extent. The window is clamped to the
/// source size; an explicit `offset` is clamped so the window stays in
/// bounds, otherwise the window is placed at `anchor`.
pub fn crop_window(
    source: (u32, u32),
    target: (u32, u32),
    offset: Option<(u32, u32)>,
    anchor: Anchor,
) -> CropWindow {
    let (src_w, src_h) = source;
    let w = if target.0 == 0 { src_w } else { target.0.min(src_w) };
    let h = if target.1 == 0 { src_h } else { target.1.min(src_h) };

    let (x, y) = match offset {
        Some((x, y)) => (x.min(src_w - w), y.min(src_h - h)),
        None => anchor_offset(source, (w, h), anchor),
    };

    (x, y, w, h)
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // resize_dimensions
    // =========================================================================

    #[test]
    fn resize_exact_within_source() {
        assert_eq!(resize_dimensions((400, 300), (200, 110), false), (200, 110));
    }

    #[test]
    fn resize_zero_height_follows_aspect() {
        assert_eq!(resize_dimensions((400, 300), (200, 0), false), (200, 150));
    }

    #[test]
    fn resize_zero_width_follows_aspect() {
        assert_eq!(resize_dimensions((400, 300), (0, 150), false), (200, 150));
    }

    #[test]
    fn resize_both_zero_is_identity() {
        assert_eq!(resize_dimensions((400, 300), (0, 0), true), (400, 300));
    }

    #[test]
    fn resize_exact_caps_each_axis_without_enlarge() {
        assert_eq!(resize_dimensions((400, 300), (500, 100), false), (400, 100));
    }

    #[test]
    fn resize_aspect_growth_keeps_source_without_enlarge() {
        assert_eq!(resize_dimensions((400, 300), (0, 600), false), (400, 300));
    }

    #[test]
    fn resize_enlarges_when_allowed() {
        assert_eq!(resize_dimensions((400, 300), (800, 0), true), (800, 600));
        assert_eq!(resize_dimensions((400, 300), (500, 500), true), (500, 500));
    }

    #[test]
    fn resize_degenerate_source_is_untouched() {
        assert_eq!(resize_dimensions((0, 300), (100, 100), true), (0, 300));
    }

    // =========================================================================
    // fill_dimensions
    // =========================================================================

    #[test]
    fn fill_wider_source_matches_height() {
        assert_eq!(fill_dimensions((400, 200), (100, 100)), (200, 100));
    }

    #[test]
    fn fill_taller_source_matches_width() {
        assert_eq!(fill_dimensions((200, 400), (100, 100)), (100, 200));
    }

    // =========================================================================
    // fit_box
    // =========================================================================

    #[test]
    fn fit_box_zero_height_is_square() {
        assert_eq!(fit_box((400, 300), (100, 0), false), (100, 100));
    }

    #[test]
    fn fit_box_shrinks_to_source_keeping_ratio() {
        // 800x200 box (4:1) inside 400x300 → 400x100
        assert_eq!(fit_box((400, 300), (800, 200), false), (400, 100));
    }

    #[test]
    fn fit_box_allows_enlarge() {
        assert_eq!(fit_box((400, 300), (800, 200), true), (800, 200));
    }

    // =========================================================================
    // anchor_offset / crop_window
    // =========================================================================

    #[test]
    fn anchor_offset_positions() {
        let outer = (300, 200);
        let inner = (100, 100);
        assert_eq!(anchor_offset(outer, inner, Anchor::TopLeft), (0, 0));
        assert_eq!(anchor_offset(outer, inner, Anchor::Center), (100, 50));
        assert_eq!(anchor_offset(outer, inner, Anchor::BottomRight), (200, 100));
        assert_eq!(anchor_offset(outer, inner, Anchor::Top), (100, 0));
    }

    #[test]
    fn crop_window_centered_by_default() {
        assert_eq!(
            crop_window((400, 300), (200, 100), None, Anchor::Center),
            (100, 100, 200, 100)
        );
    }

    #[test]
    fn crop_window_zero_axis_spans_source() {
        assert_eq!(
            crop_window((400, 300), (200, 0), None, Anchor::Left),
            (0, 0, 200, 300)
        );
    }

    #[test]
    fn crop_window_explicit_offset_is_clamped() {
        assert_eq!(
            crop_window((400, 300), (200, 100), Some((350, 10)), Anchor::Center),
            (200, 10, 200, 100)
        );
    }

    #[test]
    fn crop_window_larger_than_source_is_clamped() {
        assert_eq!(
            crop_window((400, 300), (1000, 1000), None, Anchor::Center),
            (0, 0, 400, 300)
        );
    }
}
