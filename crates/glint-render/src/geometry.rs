//! Quad construction, independent of any device.

use glam::Vec2;

use crate::{sprite::SpriteDraw, vertex::Vertex};

/// Index pattern of one quad: two triangles fanning from the first corner.
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

/// Build the four corners of a sprite.
///
/// Corner order is top-left, bottom-left, bottom-right, top-right in
/// texture space, matching [`QUAD_INDICES`].
pub fn build_quad(texture_size: Vec2, sprite: &SpriteDraw, color: [f32; 4]) -> [Vertex; 4] {
    let uv = sprite.uv;
    let footprint = texture_size * uv.size().abs();
    let pivot = sprite.origin * footprint;

    // Corners relative to the pivot, scaled.
    let min = -pivot * sprite.scale;
    let max = (footprint - pivot) * sprite.scale;
    let mut corners = [
        Vec2::new(min.x, min.y),
        Vec2::new(min.x, max.y),
        Vec2::new(max.x, max.y),
        Vec2::new(max.x, min.y),
    ];

    let (sin, cos) = if sprite.rotation != 0.0 {
        let (sin, cos) = sprite.rotation.sin_cos();
        let rotate = |p: Vec2| Vec2::new(cos * p.x - sin * p.y, sin * p.x + cos * p.y);
        corners[0] = rotate(corners[0]);
        corners[1] = rotate(corners[1]);
        corners[2] = rotate(corners[2]);
        corners[3] = corners[0] + (corners[2] - corners[1]);
        (sin, cos)
    } else {
        (0.0, 1.0)
    };

    let translation = sprite.position + pivot;
    let (u1, v1) = (uv.x, uv.y);
    let (u2, v2) = (uv.x + uv.width, uv.y + uv.height);
    let tex_coords = [[u1, v1], [u1, v2], [u2, v2], [u2, v1]];
    let tangent = [cos, sin, 0.0];

    std::array::from_fn(|i| Vertex {
        position: (corners[i] + translation).to_array(),
        tex_coord: tex_coords[i],
        color,
        tangent,
    })
}

/// Indices for the quad whose first vertex is `base`.
pub fn quad_indices(base: u32) -> [u32; 6] {
    QUAD_INDICES.map(|i| base + i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprite::UvRect;

    const WHITE: [f32; 4] = [1.0; 4];

    fn assert_close(actual: [f32; 2], expected: [f32; 2]) {
        assert!(
            (actual[0] - expected[0]).abs() < 1e-4 && (actual[1] - expected[1]).abs() < 1e-4,
            "{:?} != {:?}",
            actual,
            expected
        );
    }

    #[test]
    fn test_axis_aligned_quad() {
        let quad = build_quad(
            Vec2::splat(32.0),
            &SpriteDraw::at(Vec2::new(10.0, 20.0)),
            WHITE,
        );

        let positions: Vec<[f32; 2]> = quad.iter().map(|v| v.position).collect();
        let uvs: Vec<[f32; 2]> = quad.iter().map(|v| v.tex_coord).collect();
        assert_eq!(positions, vec![[10.0, 20.0], [10.0, 52.0], [42.0, 52.0], [42.0, 20.0]]);
        assert_eq!(uvs, vec![[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]]);
        assert_eq!(quad[0].tangent, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_quarter_turn() {
        let sprite = SpriteDraw::default().rotation(std::f32::consts::FRAC_PI_2);
        let quad = build_quad(Vec2::splat(32.0), &sprite, WHITE);

        // The pivot corner stays put, the (32, 0) corner maps to (0, 32).
        assert_close(quad[0].position, [0.0, 0.0]);
        assert_close(quad[3].position, [0.0, 32.0]);
        assert_close(quad[2].position, [-32.0, 32.0]);
        assert_close([quad[0].tangent[0], quad[0].tangent[1]], [0.0, 1.0]);
    }

    #[test]
    fn test_centered_origin_and_scale() {
        let sprite = SpriteDraw::at(Vec2::new(100.0, 100.0))
            .origin(Vec2::splat(0.5))
            .scale(Vec2::new(2.0, 1.0));
        let quad = build_quad(Vec2::new(16.0, 8.0), &sprite, WHITE);

        // Scaling happens around the pivot, which lands at position + pivot.
        assert_close(quad[0].position, [92.0, 100.0]);
        assert_close(quad[2].position, [124.0, 108.0]);
    }

    #[test]
    fn test_uv_rect_sets_footprint() {
        let sprite = SpriteDraw::default().uv(UvRect::from_frame(2, 15, 1));
        let quad = build_quad(Vec2::new(480.0, 32.0), &sprite, WHITE);

        assert_close(quad[2].position, [32.0, 32.0]);
        assert_close(quad[0].tex_coord, [2.0 / 15.0, 0.0]);
        assert_close(quad[2].tex_coord, [3.0 / 15.0, 1.0]);
    }

    #[test]
    fn test_flipped_uv_keeps_positive_footprint() {
        let sprite = SpriteDraw::default().uv(UvRect::FULL.flip_horizontal());
        let quad = build_quad(Vec2::splat(8.0), &sprite, WHITE);

        assert_close(quad[2].position, [8.0, 8.0]);
        assert_close(quad[0].tex_coord, [1.0, 0.0]);
        assert_close(quad[2].tex_coord, [0.0, 1.0]);
    }

    #[test]
    fn test_indices_are_offset() {
        assert_eq!(quad_indices(8), [8, 9, 10, 8, 10, 11]);
    }
}
