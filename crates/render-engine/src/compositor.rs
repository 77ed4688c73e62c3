//! Frame compositor: layers background, foreground, and captions.
//!
//! Composition is expressed as a single ffmpeg filter graph. Input 0 is the
//! source (already trimmed to the clip window), inputs `1..` are the caption
//! bitmaps in display order.

use std::path::PathBuf;

use reelcut_clip_model::caption::CaptionChunk;
use reelcut_clip_model::layout::{RenderLayout, Size};
use reelcut_common::config::CaptionConfig;

/// One caption bitmap placed on the canvas for a time interval.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionOverlay {
    /// PNG file holding the rendered caption.
    pub image_path: PathBuf,

    /// Top-left position on the canvas.
    pub x: u32,
    pub y: u32,

    /// Clip-relative display interval `[start, end)` in seconds.
    pub start: f64,
    pub end: f64,
}

impl CaptionOverlay {
    pub fn new(image_path: PathBuf, position: (u32, u32), chunk: &CaptionChunk) -> Self {
        Self {
            image_path,
            x: position.0,
            y: position.1,
            start: chunk.relative_start,
            end: chunk.relative_end,
        }
    }
}

/// Horizontal span available to captions: the canvas minus the right-hand
/// exclusion band covered by platform buttons.
pub fn caption_safe_width(target: Size, config: &CaptionConfig) -> u32 {
    let fraction = config.right_safe_fraction.clamp(0.0, 0.9);
    ((target.width as f64 * (1.0 - fraction)).floor() as u32).max(1)
}

/// Top-left position for a caption bitmap of `bitmap` size.
///
/// The bitmap is centered horizontally within the safe width and vertically
/// on the configured anchor line, then pushed up if it would reach into the
/// bottom exclusion band.
pub fn caption_position(target: Size, bitmap: Size, config: &CaptionConfig) -> (u32, u32) {
    let safe_width = caption_safe_width(target, config);
    let x = safe_width.saturating_sub(bitmap.width) / 2;

    let anchor = config.vertical_anchor.clamp(0.0, 1.0);
    let bottom_fraction = config.bottom_safe_fraction.clamp(0.0, 0.9);
    let safe_bottom = (target.height as f64 * (1.0 - bottom_fraction)).floor() as u32;

    let centered = (target.height as f64 * anchor - bitmap.height as f64 / 2.0).round();
    let centered = centered.max(0.0) as u32;
    let y = centered.min(safe_bottom.saturating_sub(bitmap.height));

    (x, y)
}

/// Build the `-filter_complex` graph for a clip.
///
/// Output label is `[vout]`.
pub fn build_filter_graph(layout: &RenderLayout, captions: &[CaptionOverlay]) -> String {
    let crop = layout.background_crop;
    let mut graph = format!(
        "[0:v]split=2[bgsrc][fgsrc];\
         [bgsrc]scale={bw}:{bh},crop={cw}:{ch}:{cx}:{cy},gblur=sigma={sigma},\
         drawbox=x=0:y=0:w=iw:h=ih:color=black@{dim:.2}:t=fill[bg];\
         [fgsrc]scale={fw}:{fh}:flags=lanczos[fg];\
         [bg][fg]overlay=x={fx}:y={fy}[layer0]",
        bw = layout.background_scaled.width,
        bh = layout.background_scaled.height,
        cw = crop.width,
        ch = crop.height,
        cx = crop.x,
        cy = crop.y,
        sigma = layout.blur_radius.max(1),
        dim = layout.dim_opacity,
        fw = layout.foreground_size.width,
        fh = layout.foreground_size.height,
        fx = layout.foreground_x,
        fy = layout.foreground_y,
    );

    for (i, caption) in captions.iter().enumerate() {
        graph.push_str(&format!(
            ";[layer{i}][{input}:v]overlay=x={x}:y={y}:eof_action=pass:enable='gte(t,{start:.3})*lt(t,{end:.3})'[layer{next}]",
            input = i + 1,
            x = caption.x,
            y = caption.y,
            start = caption.start,
            end = caption.end,
            next = i + 1,
        ));
    }

    graph.push_str(&format!(";[layer{}]format=yuv420p,setsar=1[vout]", captions.len()));
    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelcut_clip_model::layout::Rect;

    fn landscape_layout() -> RenderLayout {
        RenderLayout {
            target: Size::VERTICAL_HD,
            foreground_scale: 1020.0 / 1920.0,
            foreground_size: Size::new(1020, 574),
            foreground_x: 30,
            foreground_y: 673,
            background_scaled: Size::new(3413, 1920),
            background_crop: Rect::new(1166, 0, 1080, 1920),
            blur_radius: 51,
            dim_opacity: 0.6,
        }
    }

    #[test]
    fn test_caption_position_defaults() {
        let config = CaptionConfig::default();
        assert_eq!(caption_safe_width(Size::VERTICAL_HD, &config), 950);

        let (x, y) = caption_position(Size::VERTICAL_HD, Size::new(950, 168), &config);
        assert_eq!(x, 0);
        // 0.65 * 1920 - 84
        assert_eq!(y, 1164);
    }

    #[test]
    fn test_caption_never_enters_bottom_band() {
        let config = CaptionConfig {
            vertical_anchor: 0.95,
            ..CaptionConfig::default()
        };
        let (_, y) = caption_position(Size::VERTICAL_HD, Size::new(500, 200), &config);
        assert!(y + 200 <= 1632);
    }

    #[test]
    fn test_narrow_caption_is_centered_in_safe_width() {
        let (x, _) = caption_position(
            Size::VERTICAL_HD,
            Size::new(350, 100),
            &CaptionConfig::default(),
        );
        assert_eq!(x, 300);
        assert!(x + 350 <= 950);
    }

    #[test]
    fn test_filter_graph_without_captions() {
        let graph = build_filter_graph(&landscape_layout(), &[]);
        assert!(graph.starts_with("[0:v]split=2[bgsrc][fgsrc];"));
        assert!(graph.contains("scale=3413:1920,crop=1080:1920:1166:0,gblur=sigma=51"));
        assert!(graph.contains("color=black@0.60"));
        assert!(graph.contains("[fgsrc]scale=1020:574"));
        assert!(graph.contains("overlay=x=30:y=673[layer0]"));
        assert!(graph.ends_with("[layer0]format=yuv420p,setsar=1[vout]"));
    }

    #[test]
    fn test_filter_graph_gates_each_caption() {
        let captions = vec![
            CaptionOverlay {
                image_path: PathBuf::from("a.png"),
                x: 0,
                y: 1164,
                start: 0.0,
                end: 1.9,
            },
            CaptionOverlay {
                image_path: PathBuf::from("b.png"),
                x: 0,
                y: 1164,
                start: 2.0,
                end: 3.9,
            },
        ];
        let graph = build_filter_graph(&landscape_layout(), &captions);
        assert!(graph.contains(
            "[layer0][1:v]overlay=x=0:y=1164:eof_action=pass:enable='gte(t,0.000)*lt(t,1.900)'[layer1]"
        ));
        assert!(graph.contains("[layer1][2:v]overlay=x=0:y=1164:eof_action=pass:enable='gte(t,2.000)*lt(t,3.900)'[layer2]"));
        assert!(graph.ends_with("[layer2]format=yuv420p,setsar=1[vout]"));
    }
}
