//! Pixel geometry for the vertical render canvas.
//!
//! Unlike timing data, everything here is in integer output pixels.

use serde::{Deserialize, Serialize};

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    /// The fixed 9:16 target canvas.
    pub const VERTICAL_HD: Size = Size {
        width: 1080,
        height: 1920,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width divided by height. Callers must ensure `height > 0`.
    pub fn aspect(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /// True when either axis is zero.
    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// An axis-aligned pixel rectangle. `(x, y)` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge (exclusive).
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Whether `other` lies entirely inside this rectangle.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

/// Layer placement for one render, derived from the source resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderLayout {
    /// Output canvas.
    pub target: Size,

    /// Uniform scale applied to the source for the sharp foreground.
    pub foreground_scale: f64,

    /// Foreground size after scaling.
    pub foreground_size: Size,

    /// Top-left of the foreground on the canvas.
    pub foreground_x: u32,
    pub foreground_y: u32,

    /// Source size after the cover scale, before cropping.
    pub background_scaled: Size,

    /// Crop window inside `background_scaled`; always exactly `target`.
    pub background_crop: Rect,

    /// Gaussian blur radius for the background.
    pub blur_radius: u32,

    /// Black overlay opacity dimming the background.
    pub dim_opacity: f64,
}

impl RenderLayout {
    /// Placement rectangle of the foreground on the canvas.
    pub fn foreground_rect(&self) -> Rect {
        Rect::new(
            self.foreground_x,
            self.foreground_y,
            self.foreground_size.width,
            self.foreground_size.height,
        )
    }

    /// Full canvas rectangle.
    pub fn canvas_rect(&self) -> Rect {
        Rect::new(0, 0, self.target.width, self.target.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertical_aspect() {
        assert!((Size::VERTICAL_HD.aspect() - 9.0 / 16.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_size() {
        assert!(Size::new(1920, 0).is_degenerate());
        assert!(!Size::new(1, 1).is_degenerate());
    }

    #[test]
    fn test_rect_containment() {
        let canvas = Rect::new(0, 0, 1080, 1920);
        assert!(canvas.contains_rect(&Rect::new(30, 656, 1020, 608)));
        assert!(!canvas.contains_rect(&Rect::new(100, 0, 1000, 10)));
    }
}
