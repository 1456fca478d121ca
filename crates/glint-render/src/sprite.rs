//! Per-draw sprite parameters.

use glam::Vec2;

/// Normalized texture sub-rectangle: origin `(x, y)` and size.
///
/// A negative width or height samples the region mirrored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl UvRect {
    /// The whole texture.
    pub const FULL: UvRect = UvRect::new(0.0, 0.0, 1.0, 1.0);

    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Cell `index` of a sheet laid out left-to-right, top-to-bottom.
    ///
    /// Indices wrap around the total cell count, so an ever-increasing frame
    /// counter loops the animation.
    pub fn from_frame(index: u32, columns: u32, rows: u32) -> Self {
        let columns = columns.max(1);
        let rows = rows.max(1);
        let index = index % (columns * rows);

        let width = 1.0 / columns as f32;
        let height = 1.0 / rows as f32;
        Self {
            x: (index % columns) as f32 * width,
            y: (index / columns) as f32 * height,
            width,
            height,
        }
    }

    /// Region given in pixels of a `texture_size` image.
    pub fn from_pixels(x: f32, y: f32, width: f32, height: f32, texture_size: Vec2) -> Self {
        Self {
            x: x / texture_size.x,
            y: y / texture_size.y,
            width: width / texture_size.x,
            height: height / texture_size.y,
        }
    }

    pub fn flip_horizontal(self) -> Self {
        Self {
            x: self.x + self.width,
            width: -self.width,
            ..self
        }
    }

    pub fn flip_vertical(self) -> Self {
        Self {
            y: self.y + self.height,
            height: -self.height,
            ..self
        }
    }

    pub fn min(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}

impl Default for UvRect {
    fn default() -> Self {
        Self::FULL
    }
}

/// Placement of one textured quad.
///
/// `origin` is the pivot as a fraction of the footprint: `(0, 0)` is the
/// top-left corner, `(0.5, 0.5)` the center. Rotation is in radians around
/// the pivot.
///
/// ```
/// use glam::Vec2;
/// use glint_render::{SpriteDraw, UvRect};
///
/// let sprite = SpriteDraw::at(Vec2::new(100.0, 50.0))
///     .rotation(std::f32::consts::FRAC_PI_4)
///     .origin(Vec2::splat(0.5))
///     .uv(UvRect::from_frame(3, 15, 1));
/// assert_eq!(sprite.scale, Vec2::ONE);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteDraw {
    pub position: Vec2,
    pub rotation: f32,
    pub origin: Vec2,
    pub scale: Vec2,
    pub uv: UvRect,
}

impl SpriteDraw {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn rotation(mut self, radians: f32) -> Self {
        self.rotation = radians;
        self
    }

    pub fn origin(mut self, origin: Vec2) -> Self {
        self.origin = origin;
        self
    }

    pub fn scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    pub fn uv(mut self, uv: UvRect) -> Self {
        self.uv = uv;
        self
    }
}

impl Default for SpriteDraw {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
            origin: Vec2::ZERO,
            scale: Vec2::ONE,
            uv: UvRect::FULL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_frames() {
        let frame = UvRect::from_frame(3, 15, 1);
        assert!((frame.x - 3.0 / 15.0).abs() < 1e-6);
        assert_eq!(frame.y, 0.0);
        assert!((frame.width - 1.0 / 15.0).abs() < 1e-6);
        assert_eq!(frame.height, 1.0);
    }

    #[test]
    fn test_frames_wrap() {
        assert_eq!(UvRect::from_frame(17, 15, 1), UvRect::from_frame(2, 15, 1));
    }

    #[test]
    fn test_sheet_rows() {
        let frame = UvRect::from_frame(5, 4, 2);
        assert_eq!(frame, UvRect::new(0.25, 0.5, 0.25, 0.5));
    }

    #[test]
    fn test_flip_horizontal() {
        let flipped = UvRect::FULL.flip_horizontal();
        assert_eq!(flipped, UvRect::new(1.0, 0.0, -1.0, 1.0));
        assert_eq!(flipped.flip_horizontal(), UvRect::FULL);
    }

    #[test]
    fn test_from_pixels() {
        let uv = UvRect::from_pixels(16.0, 0.0, 16.0, 32.0, Vec2::new(64.0, 32.0));
        assert_eq!(uv, UvRect::new(0.25, 0.0, 0.25, 1.0));
    }
}
