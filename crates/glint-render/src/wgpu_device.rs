//! [`GraphicsDevice`] implementation on top of `wgpu`.
//!
//! The device emulates the bind-then-draw model the batcher expects. Bound
//! shader, textures and blend state live in one state struct behind a
//! mutex, and every [`draw_indexed`](GraphicsDevice::draw_indexed) records
//! its own render pass into the current target and submits it. Submitting
//! per draw keeps buffer and uniform writes ordered with the draws that read
//! them.

use std::{borrow::Cow, sync::Arc};

use ahash::AHashMap;
use glint_core::profiling::profile_function;
use glint_test_utils::{
    BlendFactors, BufferId, BufferKind, BufferUsage, GraphicsDevice, LayoutId, ShaderDesc,
    ShaderError, ShaderId, TextureDesc, TextureFilter, TextureId, UniformDecl, UniformLocation,
    UniformValue, UploadMode, VertexAttribute, validate_shader_desc,
};
use parking_lot::Mutex;

use crate::{context::GraphicsContext, uniform_block::UniformBlock};

struct BufferEntry {
    kind: BufferKind,
    buffer: Option<wgpu::Buffer>,
}

struct LayoutEntry {
    vertex_buffer: BufferId,
    index_buffer: BufferId,
    stride: u64,
    attributes: Vec<wgpu::VertexAttribute>,
}

struct ShaderEntry {
    label: String,
    module: wgpu::ShaderModule,
    vertex_entry: String,
    fragment_entry: String,
    uniforms: Vec<UniformDecl>,
    block: UniformBlock,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

struct TextureEntry {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PipelineKey {
    shader: ShaderId,
    layout: LayoutId,
    blend: Option<BlendFactors>,
    cull: bool,
    front_face: wgpu::FrontFace,
}

struct DeviceState {
    next_id: u32,
    buffers: AHashMap<BufferId, BufferEntry>,
    layouts: AHashMap<LayoutId, LayoutEntry>,
    shaders: AHashMap<ShaderId, ShaderEntry>,
    textures: AHashMap<TextureId, TextureEntry>,
    pipelines: AHashMap<PipelineKey, wgpu::RenderPipeline>,

    bound_shader: Option<ShaderId>,
    bound_textures: AHashMap<u32, TextureId>,
    blend_enabled: bool,
    blend_factors: BlendFactors,
    cull: bool,
    front_face: wgpu::FrontFace,
    target: Option<wgpu::TextureView>,
}

impl DeviceState {
    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

/// A [`GraphicsDevice`] that renders into a caller-provided texture view.
///
/// Depth state is accepted and ignored; the device renders without a depth
/// attachment.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use glint_render::{GeometryBatcher, GraphicsContext, WgpuDevice};
///
/// let context = GraphicsContext::new_owned_sync().unwrap();
/// let device = Arc::new(WgpuDevice::new(context.clone(), wgpu::TextureFormat::Rgba8UnormSrgb));
/// # let view: wgpu::TextureView = unimplemented!();
/// device.set_target(view);
///
/// let mut batcher = GeometryBatcher::new(device.clone(), 800, 600).unwrap();
/// batcher.begin();
/// batcher.end();
/// ```
pub struct WgpuDevice {
    context: Arc<GraphicsContext>,
    target_format: wgpu::TextureFormat,
    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    white: TextureEntry,
    state: Mutex<DeviceState>,
}

impl WgpuDevice {
    pub fn new(context: Arc<GraphicsContext>, target_format: wgpu::TextureFormat) -> Self {
        let device = context.device();

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Glint Uniform Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Glint Texture Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Glint Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let white = Self::upload_texture(
            &context,
            &texture_layout,
            &TextureDesc {
                label: Some("Glint White Texture"),
                width: 1,
                height: 1,
                pixels: &[255, 255, 255, 255],
                filter: TextureFilter::Nearest,
            },
        );

        Self {
            context,
            target_format,
            uniform_layout,
            texture_layout,
            pipeline_layout,
            white,
            state: Mutex::new(DeviceState {
                next_id: 0,
                buffers: AHashMap::new(),
                layouts: AHashMap::new(),
                shaders: AHashMap::new(),
                textures: AHashMap::new(),
                pipelines: AHashMap::new(),
                bound_shader: None,
                bound_textures: AHashMap::new(),
                blend_enabled: false,
                blend_factors: BlendFactors::new(wgpu::BlendFactor::One, wgpu::BlendFactor::Zero),
                cull: false,
                front_face: wgpu::FrontFace::Ccw,
                target: None,
            }),
        }
    }

    pub fn context(&self) -> &Arc<GraphicsContext> {
        &self.context
    }

    pub fn target_format(&self) -> wgpu::TextureFormat {
        self.target_format
    }

    /// Render subsequent draws into `view`. Its format must match
    /// [`target_format`](Self::target_format).
    pub fn set_target(&self, view: wgpu::TextureView) {
        self.state.lock().target = Some(view);
    }

    pub fn clear_target(&self) {
        self.state.lock().target = None;
    }

    /// Clear the current target to `color`.
    pub fn clear(&self, color: wgpu::Color) {
        let state = self.state.lock();
        let Some(target) = state.target.as_ref() else {
            tracing::warn!("clear() without a render target");
            return;
        };

        let mut encoder =
            self.context
                .device()
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Glint Clear Encoder"),
                });
        {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Glint Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
        }
        self.context.queue().submit(std::iter::once(encoder.finish()));
    }

    /// Number of cached render pipelines.
    pub fn pipeline_count(&self) -> usize {
        self.state.lock().pipelines.len()
    }

    fn upload_texture(
        context: &GraphicsContext,
        layout: &wgpu::BindGroupLayout,
        desc: &TextureDesc,
    ) -> TextureEntry {
        let size = wgpu::Extent3d {
            width: desc.width,
            height: desc.height,
            depth_or_array_layers: 1,
        };

        let texture = context.device().create_texture(&wgpu::TextureDescriptor {
            label: desc.label,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        context.queue().write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            desc.pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(desc.width * 4),
                rows_per_image: Some(desc.height),
            },
            size,
        );

        let filter = match desc.filter {
            TextureFilter::Nearest => wgpu::FilterMode::Nearest,
            TextureFilter::Linear => wgpu::FilterMode::Linear,
        };
        let sampler = context.device().create_sampler(&wgpu::SamplerDescriptor {
            label: desc.label,
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: filter,
            min_filter: filter,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = context.device().create_bind_group(&wgpu::BindGroupDescriptor {
            label: desc.label,
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        TextureEntry {
            texture,
            bind_group,
        }
    }

    fn create_pipeline(
        &self,
        state: &DeviceState,
        key: &PipelineKey,
    ) -> Option<wgpu::RenderPipeline> {
        let shader = state.shaders.get(&key.shader)?;
        let layout = state.layouts.get(&key.layout)?;
        let device = self.context.device();

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(shader.label.as_str()),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader.module,
                entry_point: Some(shader.vertex_entry.as_str()),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: layout.stride,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &layout.attributes,
                }],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader.module,
                entry_point: Some(shader.fragment_entry.as_str()),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.target_format,
                    blend: key.blend.map(BlendFactors::to_blend_state),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: key.front_face,
                cull_mode: key.cull.then_some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            tracing::error!("Failed to create pipeline for `{}`: {}", shader.label, err);
            return None;
        }

        tracing::debug!("Created pipeline {:?}", key);
        Some(pipeline)
    }

    /// Replace the storage behind `entry` with a fresh `size`-byte buffer.
    fn reallocate(&self, entry: &mut BufferEntry, size: u64) {
        if let Some(old) = entry.buffer.take() {
            old.destroy();
        }

        let usage = match entry.kind {
            BufferKind::Vertex => wgpu::BufferUsages::VERTEX,
            BufferKind::Index => wgpu::BufferUsages::INDEX,
            BufferKind::Uniform => wgpu::BufferUsages::UNIFORM,
        } | wgpu::BufferUsages::COPY_DST;

        entry.buffer = Some(self.context.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some("Glint Buffer"),
            size,
            usage,
            mapped_at_creation: false,
        }));
    }
}

impl GraphicsDevice for WgpuDevice {
    fn create_buffer(&self, kind: BufferKind, _usage: BufferUsage) -> BufferId {
        let mut state = self.state.lock();
        let id = BufferId(state.next_id());
        state.buffers.insert(id, BufferEntry { kind, buffer: None });
        id
    }

    fn upload_buffer(&self, buffer: BufferId, data: &[u8], mode: UploadMode) {
        let mut state = self.state.lock();
        let Some(entry) = state.buffers.get_mut(&buffer) else {
            tracing::warn!("Upload to unknown buffer {:?}", buffer);
            return;
        };

        // Queue writes must be a multiple of COPY_BUFFER_ALIGNMENT.
        let padded_len = (data.len() as u64).next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT);
        let bytes: Cow<[u8]> = if padded_len == data.len() as u64 {
            Cow::Borrowed(data)
        } else {
            let mut padded = data.to_vec();
            padded.resize(padded_len as usize, 0);
            Cow::Owned(padded)
        };

        let needs_allocation = match (&entry.buffer, mode) {
            (None, _) | (_, UploadMode::Reallocate) => true,
            (Some(existing), UploadMode::SubData) => existing.size() < padded_len,
        };

        if needs_allocation {
            if padded_len == 0 {
                return;
            }
            self.reallocate(entry, padded_len);
        }

        if let Some(target) = &entry.buffer
            && !bytes.is_empty()
        {
            self.context.queue().write_buffer(target, 0, &bytes);
        }
    }

    fn allocate_buffer(&self, buffer: BufferId, size: u64) {
        let mut state = self.state.lock();
        let Some(entry) = state.buffers.get_mut(&buffer) else {
            tracing::warn!("Allocation for unknown buffer {:?}", buffer);
            return;
        };
        if size == 0 {
            return;
        }
        self.reallocate(entry, size.next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT));
    }

    fn destroy_buffer(&self, buffer: BufferId) {
        if let Some(entry) = self.state.lock().buffers.remove(&buffer)
            && let Some(buffer) = entry.buffer
        {
            buffer.destroy();
        }
    }

    fn create_vertex_layout(
        &self,
        vertex_buffer: BufferId,
        index_buffer: BufferId,
        stride: u64,
        attributes: &[VertexAttribute],
    ) -> LayoutId {
        let mut state = self.state.lock();
        let id = LayoutId(state.next_id());
        state.layouts.insert(
            id,
            LayoutEntry {
                vertex_buffer,
                index_buffer,
                stride,
                attributes: attributes
                    .iter()
                    .map(|a| wgpu::VertexAttribute {
                        format: a.format,
                        offset: a.offset,
                        shader_location: a.shader_location,
                    })
                    .collect(),
            },
        );
        id
    }

    fn destroy_vertex_layout(&self, layout: LayoutId) {
        let mut state = self.state.lock();
        state.layouts.remove(&layout);
        state.pipelines.retain(|key, _| key.layout != layout);
    }

    fn create_shader(&self, desc: &ShaderDesc) -> Result<ShaderId, ShaderError> {
        profile_function!();
        validate_shader_desc(desc)?;

        let device = self.context.device();
        let label = desc.label.unwrap_or("Glint Shader").to_string();

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label.as_str()),
            source: wgpu::ShaderSource::Wgsl(Cow::Owned(desc.source.to_string())),
        });
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(ShaderError::Compile(err.to_string()));
        }

        let block = UniformBlock::new(desc.uniforms);
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label.as_str()),
            size: block.size(),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label.as_str()),
            layout: &self.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let mut state = self.state.lock();
        let id = ShaderId(state.next_id());
        state.shaders.insert(
            id,
            ShaderEntry {
                label,
                module,
                vertex_entry: desc.vertex_entry.to_string(),
                fragment_entry: desc.fragment_entry.to_string(),
                uniforms: desc.uniforms.to_vec(),
                block,
                uniform_buffer,
                bind_group,
            },
        );
        Ok(id)
    }

    fn destroy_shader(&self, shader: ShaderId) {
        let mut state = self.state.lock();
        if let Some(entry) = state.shaders.remove(&shader) {
            entry.uniform_buffer.destroy();
        }
        state.pipelines.retain(|key, _| key.shader != shader);
        if state.bound_shader == Some(shader) {
            state.bound_shader = None;
        }
    }

    fn bind_shader(&self, shader: Option<ShaderId>) {
        self.state.lock().bound_shader = shader;
    }

    fn uniform_location(&self, shader: ShaderId, name: &str) -> Option<UniformLocation> {
        let state = self.state.lock();
        state
            .shaders
            .get(&shader)?
            .uniforms
            .iter()
            .position(|decl| decl.name == name)
            .map(|index| UniformLocation(index as u32))
    }

    fn set_uniform(&self, shader: ShaderId, location: UniformLocation, value: UniformValue) {
        let mut state = self.state.lock();
        let Some(entry) = state.shaders.get_mut(&shader) else {
            return;
        };
        if !entry.block.set(location.0 as usize, value) {
            tracing::warn!(
                "Uniform {:?} of `{}` rejected a {:?} value",
                location,
                entry.label,
                value.kind()
            );
        }
    }

    fn create_texture(&self, desc: &TextureDesc) -> TextureId {
        let entry = Self::upload_texture(&self.context, &self.texture_layout, desc);
        let mut state = self.state.lock();
        let id = TextureId(state.next_id());
        state.textures.insert(id, entry);
        id
    }

    fn destroy_texture(&self, texture: TextureId) {
        let mut state = self.state.lock();
        if let Some(entry) = state.textures.remove(&texture) {
            entry.texture.destroy();
        }
        state.bound_textures.retain(|_, bound| *bound != texture);
    }

    fn bind_texture(&self, texture: TextureId, slot: u32) {
        self.state.lock().bound_textures.insert(slot, texture);
    }

    fn set_blend_enabled(&self, enabled: bool) {
        self.state.lock().blend_enabled = enabled;
    }

    fn set_blend_factors(&self, factors: BlendFactors) {
        self.state.lock().blend_factors = factors;
    }

    fn set_depth_test(&self, _enabled: bool) {}

    fn set_depth_write(&self, _enabled: bool) {}

    fn set_cull_face(&self, enabled: bool) {
        self.state.lock().cull = enabled;
    }

    fn set_front_face(&self, face: wgpu::FrontFace) {
        self.state.lock().front_face = face;
    }

    fn draw_indexed(&self, layout: LayoutId, index_count: u32) {
        profile_function!();

        let mut state = self.state.lock();
        let Some(shader_id) = state.bound_shader else {
            tracing::warn!("draw_indexed() with no shader bound");
            return;
        };

        let key = PipelineKey {
            shader: shader_id,
            layout,
            blend: state.blend_enabled.then_some(state.blend_factors),
            cull: state.cull,
            front_face: state.front_face,
        };
        let pipeline = match state.pipelines.get(&key).cloned() {
            Some(pipeline) => pipeline,
            None => {
                let Some(pipeline) = self.create_pipeline(&state, &key) else {
                    return;
                };
                state.pipelines.insert(key, pipeline.clone());
                pipeline
            }
        };

        let Some(target) = state.target.as_ref() else {
            tracing::warn!("draw_indexed() without a render target");
            return;
        };
        let (Some(shader), Some(layout)) = (state.shaders.get(&shader_id), state.layouts.get(&layout))
        else {
            return;
        };
        let buffer = |id: BufferId| state.buffers.get(&id).and_then(|b| b.buffer.as_ref());
        let (Some(vertex_buffer), Some(index_buffer)) =
            (buffer(layout.vertex_buffer), buffer(layout.index_buffer))
        else {
            tracing::warn!("draw_indexed() before vertex or index data was uploaded");
            return;
        };
        let texture_group = state
            .bound_textures
            .get(&0)
            .and_then(|id| state.textures.get(id))
            .map_or(&self.white.bind_group, |t| &t.bind_group);

        self.context
            .queue()
            .write_buffer(&shader.uniform_buffer, 0, shader.block.bytes());

        let mut encoder =
            self.context
                .device()
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Glint Batch Encoder"),
                });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Glint Batch Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            pass.set_pipeline(&pipeline);
            pass.set_bind_group(0, &shader.bind_group, &[]);
            pass.set_bind_group(1, texture_group, &[]);
            pass.set_vertex_buffer(0, vertex_buffer.slice(..));
            pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..index_count, 0, 0..1);
        }
        self.context.queue().submit(std::iter::once(encoder.finish()));
    }
}
