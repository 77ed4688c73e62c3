//! Caption text rasterization.
//!
//! Each caption chunk becomes a transparent RGBA bitmap with outlined text
//! centered on it. The outline is produced by drawing the text in the stroke
//! color at eight offsets before drawing the fill once on top.

use std::path::{Path, PathBuf};

use ab_glyph::{point, Font, FontVec, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};

use reelcut_clip_model::color::Color;
use reelcut_clip_model::layout::Size;
use reelcut_common::config::CaptionConfig;
use reelcut_common::error::{ReelcutError, ReelcutResult};

use crate::builtin_font;

/// Smallest font size shrink-to-fit will step down to.
pub const MIN_FONT_SIZE: u32 = 24;

/// Transparent margin around the outlined text.
const CAPTION_PADDING: u32 = 20;

/// Bold sans fonts commonly present on Linux, macOS, and Windows hosts.
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSansBold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

/// Visual style of burned-in captions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font_size: u32,
    pub fill: Color,
    pub stroke: Color,
    pub stroke_width: u32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 80,
            fill: Color::YELLOW,
            stroke: Color::BLACK,
            stroke_width: 4,
        }
    }
}

impl TextStyle {
    pub fn from_config(config: &CaptionConfig) -> ReelcutResult<Self> {
        let parse = |field: &str, raw: &str| {
            raw.parse::<Color>()
                .map_err(|e| ReelcutError::config(format!("captions.{field}: {e}")))
        };
        Ok(Self {
            font_size: config.font_size.max(1),
            fill: parse("fill_color", &config.fill_color)?,
            stroke: parse("stroke_color", &config.stroke_color)?,
            stroke_width: config.stroke_width,
        })
    }
}

/// The font captions are drawn with.
pub enum CaptionFont {
    /// A TrueType/OpenType font loaded from disk.
    Outline { font: FontVec, path: PathBuf },
    /// The built-in 5x7 bitmap font.
    Builtin,
}

impl std::fmt::Debug for CaptionFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Outline { path, .. } => f.debug_tuple("Outline").field(path).finish(),
            Self::Builtin => f.write_str("Builtin"),
        }
    }
}

impl CaptionFont {
    /// Load an outline font file.
    pub fn load(path: &Path) -> ReelcutResult<Self> {
        let bytes = std::fs::read(path)?;
        let font = FontVec::try_from_vec(bytes).map_err(|e| {
            ReelcutError::rasterization(format!("Invalid font {}: {e}", path.display()))
        })?;
        Ok(Self::Outline {
            font,
            path: path.to_path_buf(),
        })
    }

    /// Resolve the caption font: the configured path first, then well-known
    /// system fonts, then the built-in bitmap font. Never fails.
    pub fn resolve(configured: Option<&Path>) -> Self {
        if let Some(path) = configured {
            match Self::load(path) {
                Ok(font) => return font,
                Err(err) => tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "Configured caption font unusable, trying system fonts"
                ),
            }
        }

        for candidate in SYSTEM_FONT_CANDIDATES {
            let path = Path::new(candidate);
            if !path.exists() {
                continue;
            }
            if let Ok(font) = Self::load(path) {
                tracing::debug!(path = %path.display(), "Using system caption font");
                return font;
            }
        }

        tracing::warn!("No outline font found, captions use the built-in bitmap font");
        Self::Builtin
    }

    pub fn name(&self) -> String {
        match self {
            Self::Outline { path, .. } => path.display().to_string(),
            Self::Builtin => "builtin-5x7".to_string(),
        }
    }

    fn can_render(&self, c: char) -> bool {
        if c.is_whitespace() {
            return true;
        }
        match self {
            Self::Outline { font, .. } => font.glyph_id(c).0 != 0,
            Self::Builtin => builtin_font::glyph(c).is_some(),
        }
    }

    fn measure(&self, text: &str, font_size: u32) -> (u32, u32) {
        match self {
            Self::Outline { font, .. } => text_size(PxScale::from(font_size as f32), font, text),
            Self::Builtin => builtin_font::measure(text, font_size),
        }
    }

    /// Rows covered by ink relative to the `y` passed to [`Self::draw`], as
    /// `(top, bottom)` with `bottom` exclusive.
    fn ink_rows(&self, text: &str, font_size: u32) -> (i32, i32) {
        match self {
            Self::Outline { font, .. } => {
                let scale = PxScale::from(font_size as f32);
                let scaled = font.as_scaled(scale);
                let bounds = text
                    .chars()
                    .filter_map(|c| {
                        let glyph = scaled
                            .glyph_id(c)
                            .with_scale_and_position(scale, point(0.0, scaled.ascent()));
                        scaled.outline_glyph(glyph)
                    })
                    .map(|outlined| outlined.px_bounds())
                    .fold(None, |rows: Option<(f32, f32)>, bb| match rows {
                        None => Some((bb.min.y, bb.max.y)),
                        Some((top, bottom)) => Some((top.min(bb.min.y), bottom.max(bb.max.y))),
                    });
                match bounds {
                    Some((top, bottom)) => (top.round() as i32, bottom.round() as i32),
                    None => (0, 0),
                }
            }
            Self::Builtin => (0, builtin_font::measure(text, font_size).1 as i32),
        }
    }

    fn draw(&self, canvas: &mut RgbaImage, color: Rgba<u8>, x: i32, y: i32, font_size: u32, text: &str) {
        match self {
            Self::Outline { font, .. } => {
                draw_text_mut(canvas, color, x, y, PxScale::from(font_size as f32), font, text)
            }
            Self::Builtin => builtin_font::draw_text(canvas, color, x, y, font_size, text),
        }
    }
}

/// Renders caption text into transparent bitmaps.
#[derive(Debug)]
pub struct CaptionRasterizer {
    font: CaptionFont,
    style: TextStyle,
}

impl CaptionRasterizer {
    pub fn new(font: CaptionFont, style: TextStyle) -> Self {
        Self { font, style }
    }

    /// Build a rasterizer from caption configuration, resolving the font.
    pub fn from_config(config: &CaptionConfig) -> ReelcutResult<Self> {
        let style = TextStyle::from_config(config)?;
        let font = CaptionFont::resolve(config.font_path.as_deref());
        Ok(Self::new(font, style))
    }

    pub fn style(&self) -> &TextStyle {
        &self.style
    }

    pub fn font(&self) -> &CaptionFont {
        &self.font
    }

    /// Canvas size for a caption line that must fit within `max_width`.
    pub fn canvas_size(&self, max_width: u32) -> Size {
        let line = self.style.font_size + self.style.font_size / 2;
        Size::new(
            max_width.max(1),
            line + 2 * (self.style.stroke_width + CAPTION_PADDING),
        )
    }

    /// Render `text` centered on a transparent canvas of `canvas` size.
    ///
    /// The font size steps down (not below [`MIN_FONT_SIZE`]) until the
    /// outlined text fits the canvas width. Text still too wide at the
    /// minimum size gets a wider bitmap instead of being cut off. Fails when
    /// the text is blank or contains no character the font can draw.
    pub fn rasterize(&self, text: &str, canvas: Size) -> ReelcutResult<RgbaImage> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ReelcutError::rasterization("Caption text is empty"));
        }
        if canvas.is_degenerate() {
            return Err(ReelcutError::rasterization("Caption canvas has zero size"));
        }
        if !text.chars().any(|c| !c.is_whitespace() && self.font.can_render(c)) {
            return Err(ReelcutError::rasterization(format!(
                "Font {} has no glyphs for {text:?}",
                self.font.name()
            )));
        }

        let stroke = self.style.stroke_width;
        let font_size = self.fit_font_size(text, canvas.width.saturating_sub(2 * stroke));
        let (text_w, _) = self.font.measure(text, font_size);
        let (ink_top, ink_bottom) = self.font.ink_rows(text, font_size);

        let mut width = canvas.width;
        if text_w + 2 * stroke > width {
            width = text_w + 2 * (stroke + CAPTION_PADDING);
            tracing::warn!(
                text,
                font_size,
                width,
                safe_width = canvas.width,
                "Caption wider than the safe area at minimum size, widening bitmap"
            );
        }

        let mut image = RgbaImage::new(width, canvas.height);
        let x = (width as i32 - text_w as i32) / 2;
        let y = (canvas.height as i32 - (ink_bottom - ink_top)) / 2 - ink_top;

        if stroke > 0 {
            let s = stroke as i32;
            let stroke_color = Rgba(self.style.stroke.to_rgba());
            for (dx, dy) in [(-s, 0), (s, 0), (0, -s), (0, s), (-s, -s), (-s, s), (s, -s), (s, s)] {
                self.font.draw(&mut image, stroke_color, x + dx, y + dy, font_size, text);
            }
        }
        self.font
            .draw(&mut image, Rgba(self.style.fill.to_rgba()), x, y, font_size, text);

        Ok(image)
    }

    fn fit_font_size(&self, text: &str, max_width: u32) -> u32 {
        let floor = MIN_FONT_SIZE.min(self.style.font_size);
        let mut size = self.style.font_size;
        while size > floor && self.font.measure(text, size).0 > max_width {
            size = ((size as f64 * 0.9) as u32).max(floor);
        }
        if size != self.style.font_size {
            tracing::debug!(text, from = self.style.font_size, to = size, "Shrunk caption to fit");
        }
        size
    }
}
