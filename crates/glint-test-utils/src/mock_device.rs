//! Mock implementation of [`GraphicsDevice`] for testing.
//!
//! Records every call and tracks just enough state (bound shader, bound
//! textures, blend state, buffer contents) to let tests assert what a draw
//! call would have rendered.

use ahash::AHashMap;
use parking_lot::Mutex;

use crate::{device::GraphicsDevice, gpu_types::*};

/// Snapshot of device state taken when a draw call is issued.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub layout: LayoutId,
    pub index_count: u32,
    pub shader: Option<ShaderId>,
    /// Texture bound to slot 0 at draw time.
    pub texture: Option<TextureId>,
    pub blend_enabled: bool,
    pub blend_factors: Option<BlendFactors>,
    /// Last bytes uploaded to the layout's vertex buffer.
    pub vertex_bytes: Vec<u8>,
    /// Last bytes uploaded to the layout's index buffer.
    pub index_bytes: Vec<u8>,
}

/// Records a device call for verification in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    CreateBuffer {
        buffer: BufferId,
        kind: BufferKind,
    },
    UploadBuffer {
        buffer: BufferId,
        size: usize,
        mode: UploadMode,
    },
    AllocateBuffer {
        buffer: BufferId,
        size: u64,
    },
    DestroyBuffer {
        buffer: BufferId,
    },
    CreateVertexLayout {
        layout: LayoutId,
        stride: u64,
        attributes: usize,
    },
    DestroyVertexLayout {
        layout: LayoutId,
    },
    CreateShader {
        shader: ShaderId,
        label: Option<String>,
    },
    DestroyShader {
        shader: ShaderId,
    },
    BindShader {
        shader: Option<ShaderId>,
    },
    SetUniform {
        shader: ShaderId,
        name: String,
        value: UniformValue,
    },
    CreateTexture {
        texture: TextureId,
        width: u32,
        height: u32,
    },
    DestroyTexture {
        texture: TextureId,
    },
    BindTexture {
        texture: TextureId,
        slot: u32,
    },
    SetBlendEnabled(bool),
    SetBlendFactors(BlendFactors),
    SetDepthTest(bool),
    SetDepthWrite(bool),
    SetCullFace(bool),
    SetFrontFace(wgpu::FrontFace),
    DrawIndexed(DrawRecord),
}

#[derive(Debug, Clone)]
struct MockBuffer {
    size: u64,
    data: Vec<u8>,
}

#[derive(Debug, Clone, Copy)]
struct MockLayout {
    vertex_buffer: BufferId,
    index_buffer: BufferId,
}

#[derive(Default)]
struct MockState {
    calls: Vec<DeviceCall>,
    next_id: u32,
    buffers: AHashMap<BufferId, MockBuffer>,
    layouts: AHashMap<LayoutId, MockLayout>,
    shaders: AHashMap<ShaderId, Vec<UniformDecl>>,
    textures: AHashMap<TextureId, (u32, u32)>,
    bound_shader: Option<ShaderId>,
    bound_textures: AHashMap<u32, TextureId>,
    blend_enabled: bool,
    blend_factors: Option<BlendFactors>,
    depth_write: bool,
}

impl MockState {
    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

/// Mock implementation of [`GraphicsDevice`] for testing.
///
/// # Borrow Checking Pattern: Interior Mutability
///
/// Trait methods take `&self` but have to record calls, so all state lives
/// behind one `parking_lot::Mutex`. `Mutex` rather than `RefCell` keeps the
/// device `Send + Sync` as the trait requires.
///
/// # Example
///
/// ```rust
/// use glint_test_utils::{GraphicsDevice, MockGraphicsDevice, TextureDesc, TextureFilter};
///
/// let mock = MockGraphicsDevice::new();
/// let pixels = vec![255u8; 4 * 4 * 4];
/// let texture = mock.create_texture(&TextureDesc {
///     label: Some("white"),
///     width: 4,
///     height: 4,
///     pixels: &pixels,
///     filter: TextureFilter::Nearest,
/// });
///
/// assert!(!texture.is_null());
/// assert_eq!(mock.live_textures(), 1);
/// ```
pub struct MockGraphicsDevice {
    state: Mutex<MockState>,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                depth_write: true,
                ..Default::default()
            }),
        }
    }

    /// Get a copy of all recorded calls (for test assertions).
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.state.lock().calls.clone()
    }

    /// Clear recorded calls (useful between test steps).
    ///
    /// Device state such as bindings and buffer contents is kept.
    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Get total number of recorded calls.
    pub fn call_count(&self) -> usize {
        self.state.lock().calls.len()
    }

    /// All draw calls in submission order.
    pub fn draws(&self) -> Vec<DrawRecord> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                DeviceCall::DrawIndexed(record) => Some(record.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count_draws(&self) -> usize {
        self.count(|call| matches!(call, DeviceCall::DrawIndexed(_)))
    }

    pub fn count_buffer_uploads(&self) -> usize {
        self.count(|call| matches!(call, DeviceCall::UploadBuffer { .. }))
    }

    pub fn count_reallocations(&self) -> usize {
        self.count(|call| {
            matches!(
                call,
                DeviceCall::UploadBuffer {
                    mode: UploadMode::Reallocate,
                    ..
                }
            )
        })
    }

    /// Size-only allocations, which carry no host data.
    pub fn count_allocations(&self) -> usize {
        self.count(|call| matches!(call, DeviceCall::AllocateBuffer { .. }))
    }

    pub fn count_shader_binds(&self) -> usize {
        self.count(|call| matches!(call, DeviceCall::BindShader { shader: Some(_) }))
    }

    pub fn count_blend_factor_sets(&self) -> usize {
        self.count(|call| matches!(call, DeviceCall::SetBlendFactors(_)))
    }

    /// Count uniform assignments to `name` on any shader.
    pub fn count_uniform_sets(&self, name: &str) -> usize {
        self.count(|call| matches!(call, DeviceCall::SetUniform { name: n, .. } if n == name))
    }

    /// The most recent value assigned to `name` on `shader`.
    pub fn last_uniform(&self, shader: ShaderId, name: &str) -> Option<UniformValue> {
        self.state
            .lock()
            .calls
            .iter()
            .rev()
            .find_map(|call| match call {
                DeviceCall::SetUniform {
                    shader: s,
                    name: n,
                    value,
                } if *s == shader && n == name => Some(*value),
                _ => None,
            })
    }

    /// Allocation size of a live buffer.
    pub fn buffer_size(&self, buffer: BufferId) -> Option<u64> {
        self.state.lock().buffers.get(&buffer).map(|b| b.size)
    }

    pub fn bound_shader(&self) -> Option<ShaderId> {
        self.state.lock().bound_shader
    }

    pub fn bound_texture(&self, slot: u32) -> Option<TextureId> {
        self.state.lock().bound_textures.get(&slot).copied()
    }

    pub fn blend_enabled(&self) -> bool {
        self.state.lock().blend_enabled
    }

    pub fn depth_write(&self) -> bool {
        self.state.lock().depth_write
    }

    pub fn live_buffers(&self) -> usize {
        self.state.lock().buffers.len()
    }

    pub fn live_layouts(&self) -> usize {
        self.state.lock().layouts.len()
    }

    pub fn live_shaders(&self) -> usize {
        self.state.lock().shaders.len()
    }

    pub fn live_textures(&self) -> usize {
        self.state.lock().textures.len()
    }

    fn count(&self, predicate: impl Fn(&DeviceCall) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| predicate(c)).count()
    }
}

impl Default for MockGraphicsDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_buffer(&self, kind: BufferKind, _usage: BufferUsage) -> BufferId {
        let mut state = self.state.lock();
        let buffer = BufferId(state.next_id());
        state.buffers.insert(
            buffer,
            MockBuffer {
                size: 0,
                data: Vec::new(),
            },
        );
        state.calls.push(DeviceCall::CreateBuffer { buffer, kind });
        buffer
    }

    fn upload_buffer(&self, buffer: BufferId, data: &[u8], mode: UploadMode) {
        let mut state = self.state.lock();
        if let Some(entry) = state.buffers.get_mut(&buffer) {
            match mode {
                UploadMode::Reallocate => entry.size = data.len() as u64,
                UploadMode::SubData => assert!(
                    data.len() as u64 <= entry.size,
                    "sub-range upload of {} bytes overruns a {} byte buffer",
                    data.len(),
                    entry.size
                ),
            }
            entry.data = data.to_vec();
        }
        state.calls.push(DeviceCall::UploadBuffer {
            buffer,
            size: data.len(),
            mode,
        });
    }

    fn allocate_buffer(&self, buffer: BufferId, size: u64) {
        let mut state = self.state.lock();
        if let Some(entry) = state.buffers.get_mut(&buffer) {
            entry.size = size;
            entry.data.clear();
        }
        state.calls.push(DeviceCall::AllocateBuffer { buffer, size });
    }

    fn destroy_buffer(&self, buffer: BufferId) {
        let mut state = self.state.lock();
        state.buffers.remove(&buffer);
        state.calls.push(DeviceCall::DestroyBuffer { buffer });
    }

    fn create_vertex_layout(
        &self,
        vertex_buffer: BufferId,
        index_buffer: BufferId,
        stride: u64,
        attributes: &[VertexAttribute],
    ) -> LayoutId {
        let mut state = self.state.lock();
        let layout = LayoutId(state.next_id());
        state.layouts.insert(
            layout,
            MockLayout {
                vertex_buffer,
                index_buffer,
            },
        );
        state.calls.push(DeviceCall::CreateVertexLayout {
            layout,
            stride,
            attributes: attributes.len(),
        });
        layout
    }

    fn destroy_vertex_layout(&self, layout: LayoutId) {
        let mut state = self.state.lock();
        state.layouts.remove(&layout);
        state.calls.push(DeviceCall::DestroyVertexLayout { layout });
    }

    fn create_shader(&self, desc: &ShaderDesc) -> Result<ShaderId, ShaderError> {
        validate_shader_desc(desc)?;

        let mut state = self.state.lock();
        let shader = ShaderId(state.next_id());
        state.shaders.insert(shader, desc.uniforms.to_vec());
        state.calls.push(DeviceCall::CreateShader {
            shader,
            label: desc.label.map(|s| s.to_string()),
        });
        Ok(shader)
    }

    fn destroy_shader(&self, shader: ShaderId) {
        let mut state = self.state.lock();
        state.shaders.remove(&shader);
        if state.bound_shader == Some(shader) {
            state.bound_shader = None;
        }
        state.calls.push(DeviceCall::DestroyShader { shader });
    }

    fn bind_shader(&self, shader: Option<ShaderId>) {
        let mut state = self.state.lock();
        state.bound_shader = shader;
        state.calls.push(DeviceCall::BindShader { shader });
    }

    fn uniform_location(&self, shader: ShaderId, name: &str) -> Option<UniformLocation> {
        let state = self.state.lock();
        state
            .shaders
            .get(&shader)?
            .iter()
            .position(|decl| decl.name == name)
            .map(|index| UniformLocation(index as u32))
    }

    fn set_uniform(&self, shader: ShaderId, location: UniformLocation, value: UniformValue) {
        let mut state = self.state.lock();
        let Some(decl) = state
            .shaders
            .get(&shader)
            .and_then(|decls| decls.get(location.0 as usize))
            .cloned()
        else {
            return;
        };
        assert_eq!(
            decl.kind,
            value.kind(),
            "uniform `{}` assigned a value of the wrong type",
            decl.name
        );
        state.calls.push(DeviceCall::SetUniform {
            shader,
            name: decl.name.into_owned(),
            value,
        });
    }

    fn create_texture(&self, desc: &TextureDesc) -> TextureId {
        let mut state = self.state.lock();
        let texture = TextureId(state.next_id());
        state.textures.insert(texture, (desc.width, desc.height));
        state.calls.push(DeviceCall::CreateTexture {
            texture,
            width: desc.width,
            height: desc.height,
        });
        texture
    }

    fn destroy_texture(&self, texture: TextureId) {
        let mut state = self.state.lock();
        state.textures.remove(&texture);
        state.bound_textures.retain(|_, bound| *bound != texture);
        state.calls.push(DeviceCall::DestroyTexture { texture });
    }

    fn bind_texture(&self, texture: TextureId, slot: u32) {
        let mut state = self.state.lock();
        state.bound_textures.insert(slot, texture);
        state.calls.push(DeviceCall::BindTexture { texture, slot });
    }

    fn set_blend_enabled(&self, enabled: bool) {
        let mut state = self.state.lock();
        state.blend_enabled = enabled;
        state.calls.push(DeviceCall::SetBlendEnabled(enabled));
    }

    fn set_blend_factors(&self, factors: BlendFactors) {
        let mut state = self.state.lock();
        state.blend_factors = Some(factors);
        state.calls.push(DeviceCall::SetBlendFactors(factors));
    }

    fn set_depth_test(&self, enabled: bool) {
        self.state.lock().calls.push(DeviceCall::SetDepthTest(enabled));
    }

    fn set_depth_write(&self, enabled: bool) {
        let mut state = self.state.lock();
        state.depth_write = enabled;
        state.calls.push(DeviceCall::SetDepthWrite(enabled));
    }

    fn set_cull_face(&self, enabled: bool) {
        self.state.lock().calls.push(DeviceCall::SetCullFace(enabled));
    }

    fn set_front_face(&self, face: wgpu::FrontFace) {
        self.state.lock().calls.push(DeviceCall::SetFrontFace(face));
    }

    fn draw_indexed(&self, layout: LayoutId, index_count: u32) {
        let mut state = self.state.lock();
        let (vertex_bytes, index_bytes) = match state.layouts.get(&layout) {
            Some(l) => (
                state
                    .buffers
                    .get(&l.vertex_buffer)
                    .map(|b| b.data.clone())
                    .unwrap_or_default(),
                state
                    .buffers
                    .get(&l.index_buffer)
                    .map(|b| b.data.clone())
                    .unwrap_or_default(),
            ),
            None => (Vec::new(), Vec::new()),
        };

        let record = DrawRecord {
            layout,
            index_count,
            shader: state.bound_shader,
            texture: state.bound_textures.get(&0).copied(),
            blend_enabled: state.blend_enabled,
            blend_factors: state.blend_factors,
            vertex_bytes,
            index_bytes,
        };
        state.calls.push(DeviceCall::DrawIndexed(record));
    }
}
