//! Math types used across Glint.
//!
//! Everything here is a thin re-export of [`glam`]; Glint does not carry its
//! own vector or matrix implementations.
//!
//! ```
//! use glint_core::math::{Mat4, Vec2};
//!
//! let position = Vec2::new(10.0, 20.0);
//! let moved = position + Vec2::splat(0.5);
//! let identity = Mat4::IDENTITY;
//! # let _ = (moved, identity);
//! ```
//!
//! [`glam`]: https://docs.rs/glam

pub use glam::{Mat2, Mat3, Mat4, Vec2, Vec3, Vec4};

/// Packed types for interop with other math crates.
pub mod packed {
    pub use mint::{ColumnMatrix4, Vector2, Vector3, Vector4};
}

/// Top-left origin orthographic projection for a `width` x `height` viewport.
///
/// Y grows downward and depth spans `-1..=1`, which suits 2D overlays drawn
/// in pixel coordinates.
pub fn ortho_top_left(width: f32, height: f32) -> Mat4 {
    Mat4::orthographic_rh(0.0, width, height, 0.0, -1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ortho_maps_corners() {
        let proj = ortho_top_left(800.0, 600.0);

        let top_left = proj * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!((top_left.x + 1.0).abs() < 1e-6);
        assert!((top_left.y - 1.0).abs() < 1e-6);

        let bottom_right = proj * Vec4::new(800.0, 600.0, 0.0, 1.0);
        assert!((bottom_right.x - 1.0).abs() < 1e-6);
        assert!((bottom_right.y + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_packed_interop() {
        let packed: packed::Vector2<f32> = Vec2::new(3.0, 4.0).into();
        assert_eq!((packed.x, packed.y), (3.0, 4.0));

        let matrix: packed::ColumnMatrix4<f32> = Mat4::IDENTITY.into();
        assert_eq!(Mat4::from(matrix), Mat4::IDENTITY);
    }
}
