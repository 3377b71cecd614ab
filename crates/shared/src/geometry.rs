use serde::{Deserialize, Serialize};

/// Signature-field coordinate system.
///
/// Field positions are stored in PDF point units at scale 1 ("normalized"),
/// never in pixels. A page rendered at `render_width_px` converts between
/// the two spaces through `scale_factor = render_width_px / page_width_points`.
/// A US-Letter page is 612x792 points; at a 600px render width the factor
/// is ~0.98.
// Minimum on-screen field extent in pixels
pub const MIN_FIELD_WIDTH_PX: f64 = 50.0;
pub const MIN_FIELD_HEIGHT_PX: f64 = 20.0;

// Extent of a freshly placed field, in pixels at the current scale
pub const DEFAULT_FIELD_WIDTH_PX: f64 = 160.0;
pub const DEFAULT_FIELD_HEIGHT_PX: f64 = 50.0;

// Horizontal room reserved around a rendered page
pub const PAGE_PADDING_MOBILE_PX: f64 = 24.0;
pub const PAGE_PADDING_DESKTOP_PX: f64 = 48.0;

// Render width clamp bounds
pub const MIN_RENDER_WIDTH_MOBILE_PX: f64 = 280.0;
pub const MIN_RENDER_WIDTH_DESKTOP_PX: f64 = 320.0;
pub const MAX_RENDER_WIDTH_PX: f64 = 900.0;

// Device-class breakpoints (viewport width in pixels). The builder switches
// earlier than the signing viewer; both call sites predate unification.
pub const BUILDER_MOBILE_BREAKPOINT_PX: f64 = 768.0;
pub const VIEWER_MOBILE_BREAKPOINT_PX: f64 = 1024.0;

// Tap-to-place anchor cycle, as fractions of page width/height
pub const TAP_ANCHORS: [(f64, f64); 4] = [(0.1, 0.1), (0.7, 0.1), (0.1, 0.7), (0.7, 0.7)];

/// A point in on-screen pixel space, relative to a page's rendered top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

/// A rectangle in on-screen pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Field position and extent in PDF point units at scale 1.
///
/// All four values stay non-negative; width/height are floored at the
/// minimum pixel extent translated through the active scale factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPosition {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Per-page render parameters: natural page dimensions plus the width the
/// page is currently drawn at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderContext {
    pub page_width_points: f64,
    pub page_height_points: f64,
    pub render_width_px: f64,
}

impl RenderContext {
    /// Current pixel-per-point factor. Falls back through
    /// [`compute_scale_factor`] when the page has not been measured yet.
    pub fn scale_factor(&self) -> f64 {
        compute_scale_factor(self.render_width_px, self.page_width_points)
    }

    /// Height the page occupies on screen at the current factor.
    pub fn render_height_px(&self) -> f64 {
        self.page_height_points * self.scale_factor()
    }
}

/// Convert a page-relative pixel point to normalized point coordinates.
/// Precondition: `ctx.scale_factor() > 0` (callers pass measured pages).
pub fn to_normalized(point: PixelPoint, ctx: &RenderContext) -> (f64, f64) {
    let scale = ctx.scale_factor();
    (point.x / scale, point.y / scale)
}

/// Project a normalized position onto the screen at the context's factor.
pub fn to_pixels(position: NormalizedPosition, ctx: &RenderContext) -> PixelRect {
    let scale = ctx.scale_factor();
    PixelRect {
        x: position.x * scale,
        y: position.y * scale,
        width: position.width * scale,
        height: position.height * scale,
    }
}

/// Floor a position's extent at the minimum on-screen size (50x20 px),
/// expressed in normalized units through the given factor.
pub fn clamp_min_size(position: NormalizedPosition, scale_factor: f64) -> NormalizedPosition {
    NormalizedPosition {
        width: position.width.max(MIN_FIELD_WIDTH_PX / scale_factor),
        height: position.height.max(MIN_FIELD_HEIGHT_PX / scale_factor),
        ..position
    }
}

/// Pull a position back inside the page's top-left quadrant.
pub fn clamp_non_negative(position: NormalizedPosition) -> NormalizedPosition {
    NormalizedPosition {
        x: position.x.max(0.0),
        y: position.y.max(0.0),
        ..position
    }
}

/// Extent of a freshly placed field in normalized units at the given factor.
pub fn default_extent(scale_factor: f64) -> (f64, f64) {
    (
        DEFAULT_FIELD_WIDTH_PX / scale_factor,
        DEFAULT_FIELD_HEIGHT_PX / scale_factor,
    )
}

/// Page render width for a viewport: viewport minus padding, clamped to the
/// device-class minimum and the global 900px ceiling.
pub fn compute_page_render_width(viewport_width_px: f64, is_mobile: bool) -> f64 {
    let padding = if is_mobile {
        PAGE_PADDING_MOBILE_PX
    } else {
        PAGE_PADDING_DESKTOP_PX
    };
    let min_width = if is_mobile {
        MIN_RENDER_WIDTH_MOBILE_PX
    } else {
        MIN_RENDER_WIDTH_DESKTOP_PX
    };
    (viewport_width_px - padding).clamp(min_width, MAX_RENDER_WIDTH_PX)
}

/// Pixel-per-point factor for a page. A page that has not reported its
/// natural width yet counts as 1 point wide, so the factor degrades to the
/// render width instead of dividing by zero.
pub fn compute_scale_factor(render_width_px: f64, page_natural_width_points: f64) -> f64 {
    let natural = if page_natural_width_points > 0.0 {
        page_natural_width_points
    } else {
        1.0
    };
    render_width_px / natural
}

/// Normalized top-left for a tap-to-place anchor. Indexes cycle round-robin.
pub fn tap_anchor_position(
    index: usize,
    page_width_points: f64,
    page_height_points: f64,
) -> (f64, f64) {
    let (fx, fy) = TAP_ANCHORS[index % TAP_ANCHORS.len()];
    (fx * page_width_points, fy * page_height_points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letter_at_600() -> RenderContext {
        RenderContext {
            page_width_points: 612.0,
            page_height_points: 792.0,
            render_width_px: 600.0,
        }
    }

    #[test]
    fn test_scale_factor_letter_page() {
        let ctx = letter_at_600();
        assert!((ctx.scale_factor() - 0.980392).abs() < 1e-4);
    }

    #[test]
    fn test_to_normalized_basic() {
        let ctx = letter_at_600();
        let (x, y) = to_normalized(PixelPoint { x: 100.0, y: 200.0 }, &ctx);
        assert!((x - 102.0).abs() < 1.0);
        assert!((y - 204.0).abs() < 1.0);
    }

    #[test]
    fn test_round_trip_preserves_position() {
        let ctx = letter_at_600();
        let p = NormalizedPosition {
            x: 73.2,
            y: 410.9,
            width: 163.0,
            height: 51.0,
        };
        let px = to_pixels(p, &ctx);
        let (x, y) = to_normalized(PixelPoint { x: px.x, y: px.y }, &ctx);
        assert!((x - p.x).abs() < 1e-9);
        assert!((y - p.y).abs() < 1e-9);
        let scale = ctx.scale_factor();
        assert!((px.width / scale - p.width).abs() < 1e-9);
        assert!((px.height / scale - p.height).abs() < 1e-9);
    }

    #[test]
    fn test_round_trip_across_factors() {
        let p = NormalizedPosition {
            x: 10.0,
            y: 20.0,
            width: 120.0,
            height: 40.0,
        };
        for render_width in [61.2, 306.0, 612.0, 1224.0, 3060.0] {
            let ctx = RenderContext {
                page_width_points: 612.0,
                page_height_points: 792.0,
                render_width_px: render_width,
            };
            let px = to_pixels(p, &ctx);
            let (x, y) = to_normalized(PixelPoint { x: px.x, y: px.y }, &ctx);
            assert!((x - p.x).abs() < 1e-9);
            assert!((y - p.y).abs() < 1e-9);
        }
    }

    #[test]
    fn test_clamp_min_size_floors_pixel_extent() {
        // The floor must hold in pixels across the whole usable factor range.
        for scale in [0.1, 0.5, 0.98, 2.0, 5.0] {
            let squeezed = NormalizedPosition {
                x: 5.0,
                y: 5.0,
                width: 0.001,
                height: 0.001,
            };
            let clamped = clamp_min_size(squeezed, scale);
            assert!(clamped.width * scale >= MIN_FIELD_WIDTH_PX - 1e-9);
            assert!(clamped.height * scale >= MIN_FIELD_HEIGHT_PX - 1e-9);
        }
    }

    #[test]
    fn test_clamp_min_size_leaves_large_fields_alone() {
        let p = NormalizedPosition {
            x: 0.0,
            y: 0.0,
            width: 300.0,
            height: 100.0,
        };
        let clamped = clamp_min_size(p, 1.0);
        assert!((clamped.width - 300.0).abs() < 1e-9);
        assert!((clamped.height - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_clamp_non_negative() {
        let p = NormalizedPosition {
            x: -40.0,
            y: -0.5,
            width: 160.0,
            height: 50.0,
        };
        let clamped = clamp_non_negative(p);
        assert!((clamped.x - 0.0).abs() < 1e-9);
        assert!((clamped.y - 0.0).abs() < 1e-9);
        assert!((clamped.width - 160.0).abs() < 1e-9);
    }

    #[test]
    fn test_render_width_desktop_floor() {
        assert!((compute_page_render_width(100.0, false) - 320.0).abs() < 1e-9);
    }

    #[test]
    fn test_render_width_desktop_ceiling() {
        assert!((compute_page_render_width(2000.0, false) - 900.0).abs() < 1e-9);
    }

    #[test]
    fn test_render_width_desktop_midrange() {
        // 700 - 48 = 652, inside the clamp band
        assert!((compute_page_render_width(700.0, false) - 652.0).abs() < 1e-9);
    }

    #[test]
    fn test_render_width_mobile_band() {
        let w = compute_page_render_width(600.0, true);
        assert!(w >= 280.0);
        assert!(w <= 600.0 - 24.0 + 1e-9);
    }

    #[test]
    fn test_render_width_mobile_floor() {
        assert!((compute_page_render_width(200.0, true) - 280.0).abs() < 1e-9);
    }

    #[test]
    fn test_scale_factor_unmeasured_page_falls_back() {
        // Unmeasured pages count as 1pt wide
        assert!((compute_scale_factor(600.0, 0.0) - 600.0).abs() < 1e-9);
        assert!((compute_scale_factor(600.0, -3.0) - 600.0).abs() < 1e-9);
    }

    #[test]
    fn test_default_extent_scales() {
        let (w, h) = default_extent(2.0);
        assert!((w - 80.0).abs() < 1e-9);
        assert!((h - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_tap_anchor_cycle() {
        let (x, y) = tap_anchor_position(0, 612.0, 792.0);
        assert!((x - 61.2).abs() < 1e-9);
        assert!((y - 79.2).abs() < 1e-9);
        let (x, y) = tap_anchor_position(1, 612.0, 792.0);
        assert!((x - 428.4).abs() < 1e-9);
        assert!((y - 79.2).abs() < 1e-9);
        // Index 4 wraps to the first anchor
        let first = tap_anchor_position(0, 612.0, 792.0);
        let wrapped = tap_anchor_position(4, 612.0, 792.0);
        assert!((first.0 - wrapped.0).abs() < 1e-9);
        assert!((first.1 - wrapped.1).abs() < 1e-9);
    }
}
