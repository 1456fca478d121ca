//! Interleaved sprite vertex and the attribute layout describing it.

use bytemuck::{Pod, Zeroable};
use glint_test_utils::{BufferId, GraphicsDevice, LayoutId, VertexAttribute};
use static_assertions::const_assert_eq;

/// One corner of a batched quad.
///
/// The tangent is only read by tangent-space lighting shaders; the stock
/// sprite shader forwards it and otherwise ignores it.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub tex_coord: [f32; 2],
    pub color: [f32; 4],
    pub tangent: [f32; 3],
}

const_assert_eq!(std::mem::size_of::<Vertex>(), 44);

impl Vertex {
    pub const STRIDE: u64 = std::mem::size_of::<Vertex>() as u64;
}

/// Describes how interleaved vertex fields map to shader input locations.
///
/// Attributes are appended in order; each one gets the next shader location
/// and an offset immediately after the previous attribute.
///
/// ```
/// use glint_render::VertexLayout;
///
/// let layout = VertexLayout::new(16)
///     .attribute(wgpu::VertexFormat::Float32x2)
///     .attribute(wgpu::VertexFormat::Float32x2);
/// assert_eq!(layout.attributes()[1].offset, 8);
/// assert_eq!(layout.attributes()[1].shader_location, 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct VertexLayout {
    stride: u64,
    attributes: Vec<VertexAttribute>,
    next_offset: u64,
}

impl VertexLayout {
    pub fn new(stride: u64) -> Self {
        Self {
            stride,
            attributes: Vec::new(),
            next_offset: 0,
        }
    }

    /// Append an attribute of `format` after the previous one.
    pub fn attribute(mut self, format: wgpu::VertexFormat) -> Self {
        let shader_location = self.attributes.len() as u32;
        self.attributes.push(VertexAttribute {
            format,
            offset: self.next_offset,
            shader_location,
        });
        self.next_offset += format.size();
        self
    }

    /// Layout of [`Vertex`]: position, uv, color, tangent at locations 0-3.
    pub fn sprite() -> Self {
        Self::new(Vertex::STRIDE)
            .attribute(wgpu::VertexFormat::Float32x2)
            .attribute(wgpu::VertexFormat::Float32x2)
            .attribute(wgpu::VertexFormat::Float32x4)
            .attribute(wgpu::VertexFormat::Float32x3)
    }

    pub fn stride(&self) -> u64 {
        self.stride
    }

    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    /// Register this layout with the device, bound to the given buffers.
    pub fn create(
        &self,
        device: &dyn GraphicsDevice,
        vertex_buffer: BufferId,
        index_buffer: BufferId,
    ) -> LayoutId {
        debug_assert!(
            self.next_offset <= self.stride,
            "vertex attributes span {} bytes but stride is {}",
            self.next_offset,
            self.stride
        );
        device.create_vertex_layout(vertex_buffer, index_buffer, self.stride, &self.attributes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sprite_layout_matches_vertex() {
        let layout = VertexLayout::sprite();
        let offsets: Vec<u64> = layout.attributes().iter().map(|a| a.offset).collect();

        assert_eq!(layout.stride(), 44);
        assert_eq!(offsets, vec![0, 8, 16, 32]);
        assert_eq!(
            std::mem::offset_of!(Vertex, tangent) as u64,
            layout.attributes()[3].offset
        );
    }

    #[test]
    fn test_locations_are_sequential() {
        let layout = VertexLayout::sprite();
        for (i, attr) in layout.attributes().iter().enumerate() {
            assert_eq!(attr.shader_location, i as u32);
        }
    }
}
