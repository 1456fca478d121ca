//! Trait abstracting the graphics device the batcher submits to.
//!
//! The surface is deliberately close to a classic immediate-mode API: the
//! device holds the "currently bound" shader, texture slots and blend state,
//! and [`GraphicsDevice::draw_indexed`] executes under whatever state is
//! current at the moment it is called.

use crate::gpu_types::*;

/// Graphics operations needed by the sprite batcher.
///
/// # Borrow Checking Pattern
///
/// Methods take `&self` and hand back `Copy` handles, so a device can sit
/// behind an `Arc` and be shared by the batcher, the caller's textures and
/// shaders without lifetimes leaking into their types. Implementations use
/// interior mutability for their bookkeeping.
///
/// # Example
///
/// ```rust,no_run
/// use glint_test_utils::{BufferKind, BufferUsage, GraphicsDevice, UploadMode};
///
/// fn upload(device: &dyn GraphicsDevice, bytes: &[u8]) {
///     let buffer = device.create_buffer(BufferKind::Vertex, BufferUsage::DynamicDraw);
///     device.upload_buffer(buffer, bytes, UploadMode::Reallocate);
///     device.destroy_buffer(buffer);
/// }
/// ```
pub trait GraphicsDevice: Send + Sync {
    // Buffers

    fn create_buffer(&self, kind: BufferKind, usage: BufferUsage) -> BufferId;

    /// Upload `data` to the start of `buffer`.
    ///
    /// With [`UploadMode::SubData`] the caller guarantees `data` fits the
    /// current allocation.
    fn upload_buffer(&self, buffer: BufferId, data: &[u8], mode: UploadMode);

    /// Reserve `size` bytes for `buffer` without uploading anything.
    ///
    /// Replaces any existing allocation. Contents are unspecified until the
    /// next upload.
    fn allocate_buffer(&self, buffer: BufferId, size: u64);

    fn destroy_buffer(&self, buffer: BufferId);

    // Vertex layouts

    /// Tie a vertex buffer, an index buffer and an attribute description together.
    fn create_vertex_layout(
        &self,
        vertex_buffer: BufferId,
        index_buffer: BufferId,
        stride: u64,
        attributes: &[VertexAttribute],
    ) -> LayoutId;

    fn destroy_vertex_layout(&self, layout: LayoutId);

    // Shaders

    fn create_shader(&self, desc: &ShaderDesc) -> Result<ShaderId, ShaderError>;

    fn destroy_shader(&self, shader: ShaderId);

    /// Make `shader` current, or unbind with `None`.
    fn bind_shader(&self, shader: Option<ShaderId>);

    fn uniform_location(&self, shader: ShaderId, name: &str) -> Option<UniformLocation>;

    fn set_uniform(&self, shader: ShaderId, location: UniformLocation, value: UniformValue);

    // Textures

    fn create_texture(&self, desc: &TextureDesc) -> TextureId;

    fn destroy_texture(&self, texture: TextureId);

    fn bind_texture(&self, texture: TextureId, slot: u32);

    // Fixed-function state

    fn set_blend_enabled(&self, enabled: bool);

    fn set_blend_factors(&self, factors: BlendFactors);

    fn set_depth_test(&self, enabled: bool);

    fn set_depth_write(&self, enabled: bool);

    fn set_cull_face(&self, enabled: bool);

    fn set_front_face(&self, face: wgpu::FrontFace);

    // Drawing

    /// Draw `index_count` indices from `layout` as a triangle list.
    fn draw_indexed(&self, layout: LayoutId, index_count: u32);
}
