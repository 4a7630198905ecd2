//! Decorative-logo heuristics.

use super::geometry::Rect;

/// Long/short side ratio above which a box is considered a rule or banner.
const MAX_ASPECT_RATIO: f32 = 4.0;

/// The page centre region spans 20%–80% of each dimension.
const CENTER_LOW: f32 = 0.2;
const CENTER_HIGH: f32 = 0.8;

/// Thresholds for one class of candidate (raster images or vector drawings).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogoThresholds {
    /// Boxes larger than this in either dimension are content
    pub max_dim: f32,
    /// Distance from both edges of a corner that still counts as "in the corner"
    pub corner_threshold: f32,
}

impl LogoThresholds {
    /// Defaults for embedded raster images.
    pub const RASTER: LogoThresholds = LogoThresholds {
        max_dim: 80.0,
        corner_threshold: 40.0,
    };

    /// Stricter defaults for vector drawings, which are usually smaller logos.
    pub const VECTOR: LogoThresholds = LogoThresholds {
        max_dim: 60.0,
        corner_threshold: 30.0,
    };
}

/// Decide whether `bbox` is most likely a logo rather than content.
///
/// Small, roughly square boxes near a page corner are logos; anything whose
/// centre falls inside the central 60%×60% of the page never is.
pub fn is_likely_logo(
    bbox: &Rect,
    page_width: f32,
    page_height: f32,
    max_dim: f32,
    corner_threshold: f32,
) -> bool {
    let (width, height) = (bbox.width(), bbox.height());

    if width > max_dim || height > max_dim {
        return false;
    }

    let short = width.min(height);
    if short <= 0.0 || width.max(height) / short > MAX_ASPECT_RATIO {
        return false;
    }

    let (cx, cy) = bbox.center();
    let in_center = cx > CENTER_LOW * page_width
        && cx < CENTER_HIGH * page_width
        && cy > CENTER_LOW * page_height
        && cy < CENTER_HIGH * page_height;
    if in_center {
        return false;
    }

    bbox.is_near_corner(page_width, page_height, corner_threshold)
}

/// [`is_likely_logo`] with a threshold preset.
pub fn is_likely_logo_with(
    bbox: &Rect,
    page_width: f32,
    page_height: f32,
    thresholds: LogoThresholds,
) -> bool {
    is_likely_logo(
        bbox,
        page_width,
        page_height,
        thresholds.max_dim,
        thresholds.corner_threshold,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: f32 = 600.0;
    const H: f32 = 800.0;

    #[test]
    fn test_corner_box_is_logo() {
        let bbox = Rect::from_xywh(5.0, 5.0, 30.0, 30.0);
        assert!(is_likely_logo(&bbox, W, H, 80.0, 40.0));

        let bottom_right = Rect::from_xywh(W - 35.0, H - 35.0, 30.0, 30.0);
        assert!(is_likely_logo(&bottom_right, W, H, 80.0, 40.0));
    }

    #[test]
    fn test_center_box_is_never_logo() {
        let bbox = Rect::from_xywh(285.0, 385.0, 30.0, 30.0);
        assert!(!is_likely_logo(&bbox, W, H, 80.0, 40.0));
        // Even with a corner threshold that covers the whole page.
        assert!(!is_likely_logo(&bbox, W, H, 80.0, 10_000.0));
    }

    #[test]
    fn test_large_or_elongated_box_is_content() {
        let large = Rect::from_xywh(0.0, 0.0, 120.0, 60.0);
        assert!(!is_likely_logo(&large, W, H, 80.0, 40.0));

        let rule = Rect::from_xywh(0.0, 0.0, 75.0, 10.0);
        assert!(!is_likely_logo(&rule, W, H, 80.0, 40.0));

        let degenerate = Rect::from_xywh(0.0, 0.0, 30.0, 0.0);
        assert!(!is_likely_logo(&degenerate, W, H, 80.0, 40.0));
    }

    #[test]
    fn test_edge_but_not_corner() {
        let bbox = Rect::from_xywh(5.0, 100.0, 30.0, 30.0);
        assert!(!is_likely_logo(&bbox, W, H, 80.0, 40.0));
    }

    #[test]
    fn test_vector_preset_is_stricter() {
        let bbox = Rect::from_xywh(35.0, 35.0, 50.0, 50.0);
        assert!(!is_likely_logo_with(&bbox, W, H, LogoThresholds::VECTOR));
        let small = Rect::from_xywh(10.0, 10.0, 40.0, 40.0);
        assert!(is_likely_logo_with(&small, W, H, LogoThresholds::VECTOR));
    }
}
