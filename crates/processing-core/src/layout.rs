//! Vertical canvas layout planning.
//!
//! Places a sharp, aspect-preserving foreground in the middle of the 9:16
//! canvas and a cover-scaled, center-cropped copy of the same frame behind it.

use reelcut_clip_model::layout::{Rect, RenderLayout, Size};
use reelcut_common::config::LayoutConfig;

/// Plan the foreground/background layers for a source resolution.
///
/// A source relatively wider than the target is fit to the target width
/// minus the margin; anything else is fit to the target height minus the
/// margin. The axis derived from the aspect ratio is rounded to an even pixel
/// count for chroma-subsampled encoders.
///
/// `source` must have non-zero dimensions; degenerate sizes are rejected by
/// the caller before planning.
pub fn plan_layout(source: Size, target: Size, config: &LayoutConfig) -> RenderLayout {
    debug_assert!(!source.is_degenerate(), "source size must be non-zero");
    debug_assert!(!target.is_degenerate(), "target size must be non-zero");

    let (sw, sh) = (source.width as f64, source.height as f64);
    let (tw, th) = (target.width as f64, target.height as f64);

    let (foreground_scale, foreground_size) = if source.aspect() > target.aspect() {
        let margin = config.foreground_margin_px.min(target.width.saturating_sub(2));
        let width = target.width - margin;
        let scale = width as f64 / sw;
        let height = round_even(sh * scale).clamp(2, target.height);
        (scale, Size::new(width, height))
    } else {
        let margin = config.foreground_margin_px.min(target.height.saturating_sub(2));
        let height = target.height - margin;
        let scale = height as f64 / sh;
        let width = round_even(sw * scale).clamp(2, target.width);
        (scale, Size::new(width, height))
    };

    let background_scale = (tw / sw).max(th / sh);
    let background_scaled = Size::new(
        ((sw * background_scale).round() as u32).max(target.width),
        ((sh * background_scale).round() as u32).max(target.height),
    );
    let background_crop = Rect::new(
        (background_scaled.width - target.width) / 2,
        (background_scaled.height - target.height) / 2,
        target.width,
        target.height,
    );

    RenderLayout {
        target,
        foreground_scale,
        foreground_size,
        foreground_x: (target.width - foreground_size.width) / 2,
        foreground_y: (target.height - foreground_size.height) / 2,
        background_scaled,
        background_crop,
        blur_radius: config.blur_radius_px,
        dim_opacity: config.dim_opacity.clamp(0.0, 1.0),
    }
}

fn round_even(value: f64) -> u32 {
    ((value / 2.0).round() * 2.0) as u32
}
