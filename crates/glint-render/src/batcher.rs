//! The sprite batcher.
//!
//! [`GeometryBatcher`] accumulates textured quads into one vertex/index
//! buffer pair and submits them with a single indexed draw whenever a state
//! change, a texture switch or the capacity bound forces it.

use std::sync::Arc;

use glam::{Mat4, Vec2};
use glint_core::{math::ortho_top_left, profiling::profile_function};
use glint_test_utils::{BlendFactors, BufferKind, BufferUsage, GraphicsDevice, LayoutId};

use crate::{
    blend::{BlendMode, BlendState},
    buffer::GpuBuffer,
    color::Color,
    error::BatchError,
    geometry::{build_quad, quad_indices},
    shader::{PROJ_VIEW_UNIFORM, ShaderProgram, TEXTURE_UNIFORM},
    sprite::{SpriteDraw, UvRect},
    texture::Texture,
    vertex::{Vertex, VertexLayout},
};

/// Maximum number of quads submitted by one draw call.
pub const SPRITE_CAPACITY: usize = 30_000;

const VERTICES_PER_QUAD: usize = 4;
const INDICES_PER_QUAD: usize = 6;

/// Construction parameters for a [`GeometryBatcher`].
#[derive(Debug, Clone, PartialEq)]
pub struct BatcherDescriptor {
    pub label: Option<&'static str>,
    /// Viewport width in pixels, used for the default projection.
    pub width: u32,
    /// Viewport height in pixels, used for the default projection.
    pub height: u32,
    /// Quads per submission, `1..=SPRITE_CAPACITY`.
    pub capacity: usize,
    pub blend: BlendState,
}

impl Default for BatcherDescriptor {
    fn default() -> Self {
        Self {
            label: None,
            width: 800,
            height: 600,
            capacity: SPRITE_CAPACITY,
            blend: BlendState::DISABLED,
        }
    }
}

impl BatcherDescriptor {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn label(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }

    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn blend(mut self, blend: impl Into<BlendState>) -> Self {
        self.blend = blend.into();
        self
    }
}

/// Counters accumulated since construction or the last [`GeometryBatcher::reset_stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchStats {
    /// Flushes requested, including ones with nothing pending
    pub flushes: u64,
    /// Indexed draws actually submitted
    pub draw_calls: u64,
    /// Quads appended
    pub quads: u64,
    /// Flushes caused by a change of texture
    pub texture_switches: u64,
}

/// A render-state mutation that may need pending geometry flushed first.
#[derive(Debug, Clone)]
enum StateChange {
    Projection(Mat4),
    View(Mat4),
    Shader(ShaderProgram),
    Blend(BlendState),
}

/// Batches textured quads into as few device submissions as possible.
///
/// # Example
///
/// ```rust
/// # #[cfg(feature = "mock")]
/// # {
/// use std::sync::Arc;
/// use glam::Vec2;
/// use glint_render::{GeometryBatcher, SpriteDraw, Texture};
/// use glint_test_utils::{MockGraphicsDevice, TextureFilter};
///
/// let device = Arc::new(MockGraphicsDevice::new());
/// let texture = Texture::from_rgba8(&*device, None, 2, 2, &[255; 16], TextureFilter::Nearest).unwrap();
/// let mut batcher = GeometryBatcher::new(device.clone(), 800, 600).unwrap();
///
/// batcher.begin();
/// for i in 0..100 {
///     batcher.draw_sprite(&texture, SpriteDraw::at(Vec2::new(i as f32, 0.0)));
/// }
/// batcher.end();
///
/// assert_eq!(device.count_draws(), 1);
/// # }
/// ```
pub struct GeometryBatcher {
    device: Arc<dyn GraphicsDevice>,
    label: &'static str,
    capacity: usize,

    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    vertex_buffer: GpuBuffer,
    index_buffer: GpuBuffer,
    layout: LayoutId,

    projection: Mat4,
    view: Mat4,
    default_shader: ShaderProgram,
    current_shader: ShaderProgram,
    last_texture: Option<Texture>,
    color: Color,
    blend: BlendState,
    device_blend: bool,

    drawing: bool,
    warned_outside_session: bool,
    stats: BatchStats,
}

impl GeometryBatcher {
    /// Create a batcher for a `width` x `height` viewport with default settings.
    pub fn new(
        device: Arc<dyn GraphicsDevice>,
        width: u32,
        height: u32,
    ) -> Result<Self, BatchError> {
        Self::with_descriptor(device, BatcherDescriptor::new(width, height))
    }

    pub fn with_descriptor(
        device: Arc<dyn GraphicsDevice>,
        descriptor: BatcherDescriptor,
    ) -> Result<Self, BatchError> {
        profile_function!();

        let BatcherDescriptor {
            label,
            width,
            height,
            capacity,
            blend,
        } = descriptor;

        if width == 0 || height == 0 {
            return Err(BatchError::InvalidViewport { width, height });
        }
        if capacity == 0 || capacity > SPRITE_CAPACITY {
            return Err(BatchError::InvalidCapacity(capacity));
        }

        let default_shader = ShaderProgram::sprite(device.as_ref())?;

        let vertex_buffer = GpuBuffer::with_capacity(
            device.as_ref(),
            BufferKind::Vertex,
            BufferUsage::DynamicDraw,
            (capacity * VERTICES_PER_QUAD) as u64 * Vertex::STRIDE,
        );
        let index_buffer = GpuBuffer::with_capacity(
            device.as_ref(),
            BufferKind::Index,
            BufferUsage::DynamicDraw,
            (capacity * INDICES_PER_QUAD * std::mem::size_of::<u32>()) as u64,
        );
        let layout =
            VertexLayout::sprite().create(device.as_ref(), vertex_buffer.id(), index_buffer.id());

        device.set_depth_test(false);
        device.set_cull_face(false);
        device.set_front_face(wgpu::FrontFace::Ccw);
        device.set_blend_enabled(false);

        let label = label.unwrap_or("Geometry Batcher");
        tracing::debug!(
            "Created {} ({}x{}, capacity {} quads)",
            label,
            width,
            height,
            capacity
        );

        Ok(Self {
            device,
            label,
            capacity,
            vertices: Vec::with_capacity(capacity * VERTICES_PER_QUAD),
            indices: Vec::with_capacity(capacity * INDICES_PER_QUAD),
            vertex_buffer,
            index_buffer,
            layout,
            projection: ortho_top_left(width as f32, height as f32),
            view: Mat4::IDENTITY,
            current_shader: default_shader.clone(),
            default_shader,
            last_texture: None,
            color: Color::WHITE,
            blend,
            device_blend: false,
            drawing: false,
            warned_outside_session: false,
            stats: BatchStats::default(),
        })
    }

    /// Open a recording session. Calling it while open does nothing.
    pub fn begin(&mut self) {
        profile_function!();

        if self.drawing {
            return;
        }

        self.device.set_depth_write(false);
        self.current_shader.bind(self.device.as_ref());
        self.setup_matrices();
        self.drawing = true;
        self.warned_outside_session = false;
    }

    /// Close the session, submitting whatever is pending.
    pub fn end(&mut self) {
        profile_function!();

        if !self.drawing {
            return;
        }

        self.flush();
        self.last_texture = None;
        self.drawing = false;

        self.device.set_depth_write(true);
        self.current_shader.unbind(self.device.as_ref());
        if self.device_blend {
            self.device.set_blend_enabled(false);
            self.device_blend = false;
        }
    }

    /// Submit pending geometry as one indexed draw. Does not end the session.
    pub fn flush(&mut self) {
        profile_function!();

        self.stats.flushes += 1;
        if self.vertices.is_empty() {
            return;
        }

        let device = self.device.as_ref();

        // Outside a session nothing is bound yet.
        if !self.drawing {
            self.current_shader.bind(device);
            self.setup_matrices();
        }

        if let Some(texture) = &self.last_texture {
            texture.bind(device, 0);
        }

        self.vertex_buffer.update(device, &self.vertices);
        self.index_buffer.update(device, &self.indices);

        self.blend.apply(device);
        self.device_blend = self.blend.enabled;

        device.draw_indexed(self.layout, self.indices.len() as u32);

        tracing::trace!(
            "{}: flushed {} quads",
            self.label,
            self.vertices.len() / VERTICES_PER_QUAD
        );
        self.stats.draw_calls += 1;

        if !self.drawing {
            self.current_shader.unbind(device);
        }

        self.vertices.clear();
        self.indices.clear();
    }

    /// Queue a textured quad.
    ///
    /// `origin` is the pivot as a fraction of the footprint, `uv` the sampled
    /// sub-rectangle. See [`SpriteDraw`] for defaults.
    pub fn draw(
        &mut self,
        texture: &Texture,
        position: Vec2,
        rotation: f32,
        origin: Vec2,
        scale: Vec2,
        uv: UvRect,
    ) {
        self.draw_sprite(
            texture,
            SpriteDraw {
                position,
                rotation,
                origin,
                scale,
                uv,
            },
        );
    }

    pub fn draw_sprite(&mut self, texture: &Texture, sprite: SpriteDraw) {
        profile_function!();

        if !self.drawing {
            if !self.warned_outside_session {
                tracing::warn!("{}: draw() called outside begin()/end()", self.label);
                self.warned_outside_session = true;
            }
            self.flush();
        }

        if !texture.is_valid() {
            tracing::debug!("{}: skipping draw with invalid texture {:?}", self.label, texture.id());
            self.flush();
            self.last_texture = None;
            return;
        }

        let same_texture = self.last_texture.map(|last| last.id()) == Some(texture.id());
        if !same_texture {
            if self.last_texture.is_some() && !self.vertices.is_empty() {
                self.stats.texture_switches += 1;
            }
            self.switch_texture(*texture);
        } else if self.pending_quads() >= self.capacity {
            self.flush();
        }

        let base = self.vertices.len() as u32;
        let quad = build_quad(texture.size(), &sprite, self.color.to_array());
        self.vertices.extend_from_slice(&quad);
        self.indices.extend_from_slice(&quad_indices(base));
        self.stats.quads += 1;
    }

    fn switch_texture(&mut self, texture: Texture) {
        self.flush();
        self.last_texture = Some(texture);
    }

    /// Upload `projection * view` and the texture slot to the current shader.
    fn setup_matrices(&self) {
        let device = self.device.as_ref();
        let proj_view = self.projection * self.view;
        self.current_shader.set_uniform(device, PROJ_VIEW_UNIFORM, proj_view);
        self.current_shader.set_uniform(device, TEXTURE_UNIFORM, 0i32);
    }

    /// Apply a state change, flushing first if geometry is pending.
    ///
    /// Returns false when the new value equals the current one.
    fn apply_state_change(&mut self, change: StateChange) -> bool {
        let unchanged = match &change {
            StateChange::Projection(m) => *m == self.projection,
            StateChange::View(m) => *m == self.view,
            StateChange::Shader(shader) => *shader == self.current_shader,
            StateChange::Blend(blend) => *blend == self.blend,
        };
        if unchanged {
            return false;
        }

        if !self.vertices.is_empty() {
            self.flush();
        }

        let needs_matrices = match change {
            StateChange::Projection(m) => {
                self.projection = m;
                true
            }
            StateChange::View(m) => {
                self.view = m;
                true
            }
            StateChange::Shader(shader) => {
                self.current_shader = shader;
                if self.drawing {
                    self.current_shader.bind(self.device.as_ref());
                }
                true
            }
            StateChange::Blend(blend) => {
                self.blend = blend;
                false
            }
        };

        if self.drawing && needs_matrices {
            self.setup_matrices();
        }
        true
    }

    /// Accepts a `glam` matrix or any column-major `mint` matrix.
    pub fn set_projection_matrix(&mut self, projection: impl Into<Mat4>) {
        self.apply_state_change(StateChange::Projection(projection.into()));
    }

    pub fn set_view_matrix(&mut self, view: impl Into<Mat4>) {
        self.apply_state_change(StateChange::View(view.into()));
    }

    /// Use `shader` for subsequent quads, or the built-in shader with `None`.
    ///
    /// A destroyed (null) program also selects the built-in shader. The
    /// batcher keeps a clone but never destroys a caller's shader.
    pub fn set_shader(&mut self, shader: Option<&ShaderProgram>) {
        let shader = match shader {
            Some(shader) if shader.id().is_null() => {
                tracing::warn!("{}: null shader, using the built-in one", self.label);
                &self.default_shader
            }
            Some(shader) => shader,
            None => &self.default_shader,
        }
        .clone();
        self.apply_state_change(StateChange::Shader(shader));
    }

    /// Tint for quads drawn after this call. Never flushes.
    pub fn set_color(&mut self, color: impl Into<Color>) {
        self.color = color.into();
    }

    /// Set identical color and alpha factors. Does not enable blending.
    pub fn set_blend_function(&mut self, src: wgpu::BlendFactor, dst: wgpu::BlendFactor) {
        self.set_blend_factors(BlendFactors::new(src, dst));
    }

    pub fn set_blend_function_separate(
        &mut self,
        src_color: wgpu::BlendFactor,
        dst_color: wgpu::BlendFactor,
        src_alpha: wgpu::BlendFactor,
        dst_alpha: wgpu::BlendFactor,
    ) {
        self.set_blend_factors(BlendFactors::separate(
            src_color, dst_color, src_alpha, dst_alpha,
        ));
    }

    fn set_blend_factors(&mut self, factors: BlendFactors) {
        self.apply_state_change(StateChange::Blend(BlendState {
            enabled: self.blend.enabled,
            factors: Some(factors),
        }));
    }

    /// Replace both the enable flag and the factors with a preset.
    pub fn set_blend_mode(&mut self, mode: BlendMode) {
        self.apply_state_change(StateChange::Blend(BlendState::from_mode(mode)));
    }

    pub fn enable_blending(&mut self) {
        self.apply_state_change(StateChange::Blend(BlendState {
            enabled: true,
            ..self.blend
        }));
    }

    pub fn disable_blending(&mut self) {
        self.apply_state_change(StateChange::Blend(BlendState {
            enabled: false,
            ..self.blend
        }));
    }

    /// Reset the projection to the top-left orthographic default for a new viewport.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), BatchError> {
        if width == 0 || height == 0 {
            return Err(BatchError::InvalidViewport { width, height });
        }
        self.set_projection_matrix(ortho_top_left(width as f32, height as f32));
        Ok(())
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    pub fn shader(&self) -> &ShaderProgram {
        &self.current_shader
    }

    pub fn default_shader(&self) -> &ShaderProgram {
        &self.default_shader
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn blend_state(&self) -> BlendState {
        self.blend
    }

    pub fn is_blending_enabled(&self) -> bool {
        self.blend.enabled
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    /// Quads queued since the last flush.
    pub fn pending_quads(&self) -> usize {
        self.vertices.len() / VERTICES_PER_QUAD
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> BatchStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = BatchStats::default();
    }

    pub fn device(&self) -> &Arc<dyn GraphicsDevice> {
        &self.device
    }
}

impl Drop for GeometryBatcher {
    fn drop(&mut self) {
        let device = self.device.as_ref();
        if self.drawing {
            tracing::warn!("{} dropped inside a session", self.label);
        }

        self.default_shader.destroy(device);
        device.destroy_vertex_layout(self.layout);
        self.vertex_buffer.destroy(device);
        self.index_buffer.destroy(device);
    }
}
