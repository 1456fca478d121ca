//! Batching behavior checked against the recording mock device.

use std::sync::Arc;

use glam::{Mat4, Vec2, Vec3};
use glint_render::{
    BatcherDescriptor, BlendMode, Color, GeometryBatcher, SPRITE_CAPACITY, ShaderProgram,
    SpriteDraw, Texture, UvRect, Vertex,
};
use glint_test_utils::{
    DeviceCall, GraphicsDevice, MockGraphicsDevice, TextureFilter, UniformDecl, UniformKind,
    UniformValue, UploadMode,
};

const EPSILON: f32 = 1e-4;

fn setup() -> (Arc<MockGraphicsDevice>, GeometryBatcher) {
    let device = Arc::new(MockGraphicsDevice::new());
    let batcher = GeometryBatcher::new(device.clone(), 800, 600).unwrap();
    device.clear_calls();
    (device, batcher)
}

fn setup_with_capacity(capacity: usize) -> (Arc<MockGraphicsDevice>, GeometryBatcher) {
    let device = Arc::new(MockGraphicsDevice::new());
    let batcher = GeometryBatcher::with_descriptor(
        device.clone(),
        BatcherDescriptor::new(800, 600).capacity(capacity),
    )
    .unwrap();
    device.clear_calls();
    (device, batcher)
}

fn texture(device: &MockGraphicsDevice, size: u32) -> Texture {
    let pixels = vec![255u8; (size * size * 4) as usize];
    Texture::from_rgba8(device, None, size, size, &pixels, TextureFilter::Nearest).unwrap()
}

fn vertices(bytes: &[u8]) -> Vec<Vertex> {
    bytemuck::pod_collect_to_vec(bytes)
}

fn assert_close(actual: [f32; 2], expected: [f32; 2]) {
    assert!(
        (actual[0] - expected[0]).abs() < EPSILON && (actual[1] - expected[1]).abs() < EPSILON,
        "{:?} is not within {} of {:?}",
        actual,
        EPSILON,
        expected
    );
}

#[test]
fn test_same_state_draws_flush_once_at_end() {
    let (device, mut batcher) = setup_with_capacity(64);
    let tex = texture(&device, 8);

    batcher.begin();
    for i in 0..64 {
        batcher.draw_sprite(&tex, SpriteDraw::at(Vec2::new(i as f32, 0.0)));
    }
    assert_eq!(device.count_draws(), 0);
    assert_eq!(batcher.pending_quads(), 64);
    batcher.end();

    let draws = device.draws();
    assert_eq!(draws.len(), 1);
    assert_eq!(draws[0].index_count, 64 * 6);
    assert_eq!(draws[0].texture, Some(tex.id()));
    assert_eq!(batcher.pending_quads(), 0);
}

#[test]
fn test_capacity_overflow_flushes_once() {
    let (device, mut batcher) = setup_with_capacity(16);
    let tex = texture(&device, 8);

    batcher.begin();
    for _ in 0..17 {
        batcher.draw_sprite(&tex, SpriteDraw::default());
    }

    assert_eq!(device.count_draws(), 1);
    assert_eq!(device.draws()[0].index_count, 16 * 6);
    assert_eq!(batcher.pending_quads(), 1);

    batcher.end();
    assert_eq!(device.count_draws(), 2);
}

#[test]
fn test_default_capacity_is_sprite_capacity() {
    let (device, mut batcher) = setup();
    let tex = texture(&device, 1);
    assert_eq!(batcher.capacity(), SPRITE_CAPACITY);

    batcher.begin();
    for _ in 0..SPRITE_CAPACITY + 1 {
        batcher.draw_sprite(&tex, SpriteDraw::default());
    }
    assert_eq!(device.count_draws(), 1);
    assert_eq!(batcher.pending_quads(), 1);
    batcher.end();
}

#[test]
fn test_texture_switch_preserves_order() {
    let (device, mut batcher) = setup();
    let a = texture(&device, 8);
    let b = texture(&device, 16);

    batcher.begin();
    batcher.draw_sprite(&a, SpriteDraw::default());
    batcher.draw_sprite(&b, SpriteDraw::default());
    assert_eq!(device.count_draws(), 1);
    batcher.end();

    let draws = device.draws();
    assert_eq!(draws.len(), 2);
    assert_eq!(draws[0].texture, Some(a.id()));
    assert_eq!(draws[1].texture, Some(b.id()));
    assert_eq!(batcher.stats().texture_switches, 1);

    // The second quad used b's 16x16 footprint.
    let quad = vertices(&draws[1].vertex_bytes);
    assert_close(quad[2].position, [16.0, 16.0]);
}

#[test]
fn test_uploaded_geometry() {
    let (device, mut batcher) = setup();
    let tex = texture(&device, 32);

    batcher.begin();
    batcher.draw(
        &tex,
        Vec2::new(10.0, 20.0),
        0.0,
        Vec2::ZERO,
        Vec2::ONE,
        UvRect::FULL,
    );
    batcher.end();

    let draws = device.draws();
    let draw = &draws[0];
    let quad = vertices(&draw.vertex_bytes);
    let positions: Vec<[f32; 2]> = quad.iter().map(|v| v.position).collect();
    let uvs: Vec<[f32; 2]> = quad.iter().map(|v| v.tex_coord).collect();

    assert_eq!(positions, vec![[10.0, 20.0], [10.0, 52.0], [42.0, 52.0], [42.0, 20.0]]);
    assert_eq!(uvs, vec![[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]]);

    let indices: Vec<u32> = bytemuck::pod_collect_to_vec(&draw.index_bytes);
    assert_eq!(&indices[..6], &[0, 1, 2, 0, 2, 3]);
}

#[test]
fn test_rotation_quarter_turn() {
    let (device, mut batcher) = setup();
    let tex = texture(&device, 32);

    batcher.begin();
    batcher.draw_sprite(
        &tex,
        SpriteDraw::default().rotation(std::f32::consts::FRAC_PI_2),
    );
    batcher.end();

    let quad = vertices(&device.draws()[0].vertex_bytes);
    assert_close(quad[0].position, [0.0, 0.0]);
    assert_close(quad[3].position, [0.0, 32.0]);
}

#[test]
fn test_second_quad_indices_are_offset() {
    let (device, mut batcher) = setup();
    let tex = texture(&device, 4);

    batcher.begin();
    batcher.draw_sprite(&tex, SpriteDraw::default());
    batcher.draw_sprite(&tex, SpriteDraw::default());
    batcher.end();

    let indices: Vec<u32> = bytemuck::pod_collect_to_vec(&device.draws()[0].index_bytes);
    assert_eq!(&indices[..12], &[0, 1, 2, 0, 2, 3, 4, 5, 6, 4, 6, 7]);
}

#[test]
fn test_color_is_captured_per_quad() {
    let (device, mut batcher) = setup();
    let tex = texture(&device, 4);

    batcher.begin();
    batcher.set_color(Color::RED);
    batcher.draw_sprite(&tex, SpriteDraw::default());
    batcher.set_color(Color::rgba(0.0, 0.0, 1.0, 0.5));
    batcher.draw_sprite(&tex, SpriteDraw::default());
    batcher.end();

    // Tint changes never flush.
    assert_eq!(device.count_draws(), 1);
    let quads = vertices(&device.draws()[0].vertex_bytes);
    assert_eq!(quads[0].color, [1.0, 0.0, 0.0, 1.0]);
    assert_eq!(quads[4].color, [0.0, 0.0, 1.0, 0.5]);
}

#[test]
fn test_blend_function_is_idempotent() {
    let (device, mut batcher) = setup();
    let tex = texture(&device, 4);

    batcher.begin();
    batcher.draw_sprite(&tex, SpriteDraw::default());
    batcher.set_blend_function(wgpu::BlendFactor::One, wgpu::BlendFactor::One);
    assert_eq!(device.count_draws(), 1);

    batcher.draw_sprite(&tex, SpriteDraw::default());
    batcher.set_blend_function(wgpu::BlendFactor::One, wgpu::BlendFactor::One);
    assert_eq!(device.count_draws(), 1);
    assert_eq!(batcher.pending_quads(), 1);
    batcher.end();
}

#[test]
fn test_blend_factors_only_sent_when_set() {
    let (device, mut batcher) = setup();
    let tex = texture(&device, 4);

    batcher.enable_blending();
    batcher.begin();
    batcher.draw_sprite(&tex, SpriteDraw::default());
    batcher.end();

    assert!(device.draws()[0].blend_enabled);
    assert_eq!(device.count_blend_factor_sets(), 0);

    batcher.set_blend_mode(BlendMode::Additive);
    batcher.begin();
    batcher.draw_sprite(&tex, SpriteDraw::default());
    batcher.end();

    assert_eq!(device.count_blend_factor_sets(), 1);
    assert_eq!(
        device.draws()[1].blend_factors,
        BlendMode::Additive.factors()
    );
}

#[test]
fn test_end_disables_device_blending() {
    let (device, mut batcher) = setup();
    let tex = texture(&device, 4);

    batcher.set_blend_mode(BlendMode::Alpha);
    batcher.begin();
    batcher.draw_sprite(&tex, SpriteDraw::default());
    batcher.end();

    assert!(device.draws()[0].blend_enabled);
    assert!(!device.blend_enabled());
    assert!(batcher.is_blending_enabled());
}

#[test]
fn test_disable_blending_flushes_pending() {
    let (device, mut batcher) = setup();
    let tex = texture(&device, 4);

    batcher.enable_blending();
    batcher.begin();
    batcher.draw_sprite(&tex, SpriteDraw::default());
    batcher.disable_blending();
    batcher.draw_sprite(&tex, SpriteDraw::default());
    batcher.end();

    let draws = device.draws();
    assert_eq!(draws.len(), 2);
    assert!(draws[0].blend_enabled);
    assert!(!draws[1].blend_enabled);
}

#[test]
fn test_begin_twice_equals_begin_once() {
    let (once, mut a) = setup();
    a.begin();

    let (twice, mut b) = setup();
    b.begin();
    b.begin();

    assert_eq!(once.calls(), twice.calls());
    assert_eq!(twice.count_uniform_sets("proj_view"), 1);
    assert_eq!(twice.count_shader_binds(), 1);
    assert!(!twice.depth_write());
}

#[test]
fn test_end_without_begin_is_noop() {
    let (device, mut batcher) = setup();
    batcher.end();
    assert_eq!(device.call_count(), 0);
    assert!(!batcher.is_drawing());
}

#[test]
fn test_end_restores_device_state() {
    let (device, mut batcher) = setup();
    batcher.begin();
    assert!(batcher.is_drawing());
    assert_eq!(device.bound_shader(), Some(batcher.default_shader().id()));

    batcher.end();
    assert!(device.depth_write());
    assert_eq!(device.bound_shader(), None);
}

#[test]
fn test_draw_outside_session_is_tolerated() {
    let (device, mut batcher) = setup();
    let tex = texture(&device, 4);

    batcher.draw_sprite(&tex, SpriteDraw::default());
    assert_eq!(batcher.pending_quads(), 1);

    // The next defensive flush submits it with the shader bound.
    batcher.draw_sprite(&tex, SpriteDraw::default());
    assert_eq!(device.count_draws(), 1);
    assert_eq!(
        device.draws()[0].shader,
        Some(batcher.default_shader().id())
    );
    assert_eq!(device.bound_shader(), None);
}

#[test]
fn test_invalid_texture_flushes_and_skips() {
    let (device, mut batcher) = setup();
    let tex = texture(&device, 4);

    batcher.begin();
    batcher.draw_sprite(&tex, SpriteDraw::default());
    batcher.draw_sprite(&Texture::null(), SpriteDraw::default());
    assert_eq!(device.count_draws(), 1);
    assert_eq!(batcher.pending_quads(), 0);

    batcher.draw_sprite(&tex, SpriteDraw::default());
    batcher.end();

    assert_eq!(device.count_draws(), 2);
    assert_eq!(batcher.stats().quads, 2);
}

#[test]
fn test_projection_change_flushes_and_uploads() {
    let (device, mut batcher) = setup();
    let tex = texture(&device, 4);
    let shader = batcher.default_shader().id();

    batcher.begin();
    batcher.draw_sprite(&tex, SpriteDraw::default());
    let projection = Mat4::orthographic_rh(0.0, 320.0, 240.0, 0.0, -1.0, 1.0);
    batcher.set_projection_matrix(projection);

    assert_eq!(device.count_draws(), 1);
    assert_eq!(
        device.last_uniform(shader, "proj_view"),
        Some(UniformValue::from(projection))
    );

    // Same value again does nothing.
    let calls = device.call_count();
    batcher.set_projection_matrix(projection);
    assert_eq!(device.call_count(), calls);
    batcher.end();
}

#[test]
fn test_view_matrix_multiplies_projection() {
    let (device, mut batcher) = setup();
    let shader = batcher.default_shader().id();
    let view = Mat4::from_translation(Vec3::new(-100.0, -50.0, 0.0));

    batcher.set_view_matrix(view);
    assert_eq!(device.count_uniform_sets("proj_view"), 0);

    batcher.begin();
    let expected = batcher.projection_matrix() * view;
    assert_eq!(
        device.last_uniform(shader, "proj_view"),
        Some(UniformValue::from(expected))
    );
    batcher.end();
}

#[test]
fn test_resize_resets_projection() {
    let (_device, mut batcher) = setup();
    batcher.resize(1024, 768).unwrap();
    assert_eq!(
        batcher.projection_matrix(),
        glint_core::math::ortho_top_left(1024.0, 768.0)
    );
    assert!(batcher.resize(0, 768).is_err());
}

#[test]
fn test_custom_shader_and_reset() {
    let (device, mut batcher) = setup();
    let tex = texture(&device, 4);
    let fragment = "@fragment\nfn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {\n    return input.color * uniforms.glow;\n}\n";
    let mut glow = ShaderProgram::with_fragment(
        &*device,
        "glow",
        fragment,
        &[UniformDecl::new("glow", UniformKind::Float)],
    )
    .unwrap();

    batcher.begin();
    batcher.draw_sprite(&tex, SpriteDraw::default());
    batcher.set_shader(Some(&glow));
    assert_eq!(device.count_draws(), 1);
    assert_eq!(device.bound_shader(), Some(glow.id()));
    assert!(device.last_uniform(glow.id(), "proj_view").is_some());

    glow.set_uniform(&*device, "glow", 2.0f32);
    batcher.draw_sprite(&tex, SpriteDraw::default());
    batcher.set_shader(None);
    batcher.end();

    let draws = device.draws();
    assert_eq!(draws[1].shader, Some(glow.id()));
    assert_eq!(batcher.shader(), batcher.default_shader());

    // The batcher does not own caller shaders.
    drop(batcher);
    assert_eq!(device.live_shaders(), 1);
    glow.destroy(&*device);
    assert_eq!(device.live_shaders(), 0);
}

#[test]
fn test_broken_shader_keeps_default_bound() {
    let (device, mut batcher) = setup();
    let result = ShaderProgram::with_fragment(&*device, "broken", "", &[]);
    assert!(result.is_err());

    batcher.begin();
    assert_eq!(device.bound_shader(), Some(batcher.default_shader().id()));
    batcher.end();
}

#[test]
fn test_vertex_buffer_is_preallocated() {
    let (device, mut batcher) = setup_with_capacity(8);
    let tex = texture(&device, 4);

    batcher.begin();
    for _ in 0..8 {
        batcher.draw_sprite(&tex, SpriteDraw::default());
    }
    batcher.end();

    assert_eq!(device.count_reallocations(), 0);
    assert!(device.calls().iter().any(|call| matches!(
        call,
        DeviceCall::UploadBuffer {
            mode: UploadMode::SubData,
            ..
        }
    )));
}

#[test]
fn test_drop_releases_batcher_resources() {
    let device = Arc::new(MockGraphicsDevice::new());
    let _tex = texture(&device, 4);
    {
        let _batcher = GeometryBatcher::new(device.clone(), 64, 64).unwrap();
        assert_eq!(device.live_buffers(), 2);
        assert_eq!(device.live_layouts(), 1);
        assert_eq!(device.live_shaders(), 1);
    }

    assert_eq!(device.live_buffers(), 0);
    assert_eq!(device.live_layouts(), 0);
    assert_eq!(device.live_shaders(), 0);
    // Caller textures are untouched.
    assert_eq!(device.live_textures(), 1);
}

#[test]
fn test_construction_sets_fixed_function_state() {
    let device = Arc::new(MockGraphicsDevice::new());
    let _batcher = GeometryBatcher::new(device.clone(), 64, 64).unwrap();

    let calls = device.calls();
    assert!(calls.contains(&DeviceCall::SetDepthTest(false)));
    assert!(calls.contains(&DeviceCall::SetCullFace(false)));
    assert!(calls.contains(&DeviceCall::SetFrontFace(wgpu::FrontFace::Ccw)));
    assert!(calls.contains(&DeviceCall::SetBlendEnabled(false)));
}

#[test]
fn test_frame_strip_animation() {
    let (device, mut batcher) = setup();
    let pixels = vec![255u8; 480 * 32 * 4];
    let strip =
        Texture::from_rgba8(&*device, None, 480, 32, &pixels, TextureFilter::Linear)
            .unwrap();

    batcher.begin();
    for frame in 0..30 {
        batcher.draw_sprite(
            &strip,
            SpriteDraw::at(Vec2::new(frame as f32 * 40.0, 0.0))
                .origin(Vec2::splat(0.5))
                .uv(UvRect::from_frame(frame, 15, 1)),
        );
    }
    batcher.end();

    assert_eq!(device.count_draws(), 1);
    let quads = vertices(&device.draws()[0].vertex_bytes);
    // Frame 16 wraps to frame 1.
    assert_close(quads[16 * 4].tex_coord, [1.0 / 15.0, 0.0]);
    // One 32x32 cell per quad; the origin only moves the pivot.
    assert_close(quads[0].position, [0.0, 0.0]);
    assert_close(quads[2].position, [32.0, 32.0]);
}

#[test]
fn test_stats_and_reset() {
    let (device, mut batcher) = setup();
    let tex = texture(&device, 4);

    batcher.begin();
    batcher.draw_sprite(&tex, SpriteDraw::default());
    batcher.flush();
    batcher.flush();
    batcher.end();

    let stats = batcher.stats();
    assert_eq!(stats.quads, 1);
    assert_eq!(stats.draw_calls, 1);
    assert_eq!(stats.flushes, 4);

    batcher.reset_stats();
    assert_eq!(batcher.stats(), Default::default());
}

#[test]
fn test_device_is_object_safe() {
    let device: Arc<dyn GraphicsDevice> = Arc::new(MockGraphicsDevice::new());
    let batcher = GeometryBatcher::new(device.clone(), 10, 10).unwrap();
    assert!(Arc::ptr_eq(batcher.device(), &device));
}

#[test]
fn test_destroyed_shader_falls_back_to_default() {
    let (device, mut batcher) = setup();
    let tex = texture(&device, 4);
    let fragment = "@fragment\nfn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {\n    return input.color;\n}\n";
    let mut flat = ShaderProgram::with_fragment(&*device, "flat", fragment, &[]).unwrap();
    flat.destroy(&*device);

    batcher.set_shader(Some(&flat));
    assert_eq!(batcher.shader().id(), batcher.default_shader().id());

    batcher.begin();
    batcher.draw_sprite(&tex, SpriteDraw::default());
    batcher.end();

    let draws = device.draws();
    assert_eq!(draws.len(), 1);
    assert_eq!(draws[0].shader, Some(batcher.default_shader().id()));
}

#[test]
fn test_construction_reserves_buffers_without_host_data() {
    let device = Arc::new(MockGraphicsDevice::new());
    let _batcher = GeometryBatcher::with_descriptor(
        device.clone(),
        BatcherDescriptor::new(64, 64).capacity(16),
    )
    .unwrap();

    let allocations: Vec<u64> = device
        .calls()
        .iter()
        .filter_map(|call| match call {
            DeviceCall::AllocateBuffer { size, .. } => Some(*size),
            _ => None,
        })
        .collect();
    assert_eq!(
        allocations,
        vec![16 * 4 * Vertex::STRIDE, 16 * 6 * std::mem::size_of::<u32>() as u64]
    );
    assert_eq!(device.count_buffer_uploads(), 0);
}

#[test]
fn test_view_change_flushes_before_upload() {
    let (device, mut batcher) = setup();
    let tex = texture(&device, 4);
    let shader = batcher.default_shader().id();
    let view = Mat4::from_scale(Vec3::new(2.0, 2.0, 1.0));

    batcher.begin();
    batcher.draw_sprite(&tex, SpriteDraw::default());
    batcher.set_view_matrix(view);
    assert_eq!(device.count_draws(), 1);
    assert_eq!(batcher.pending_quads(), 0);

    let expected = UniformValue::from(batcher.projection_matrix() * view);
    let calls = device.calls();
    let draw_at = calls
        .iter()
        .position(|call| matches!(call, DeviceCall::DrawIndexed(_)))
        .unwrap();
    let upload_at = calls
        .iter()
        .position(|call| {
            matches!(call, DeviceCall::SetUniform { name, value, .. }
                if name == "proj_view" && *value == expected)
        })
        .unwrap();
    assert!(draw_at < upload_at);
    assert_eq!(device.last_uniform(shader, "proj_view"), Some(expected));
    batcher.end();
}

#[test]
fn test_repeated_enable_blending_does_not_flush() {
    let (device, mut batcher) = setup();
    let tex = texture(&device, 4);

    batcher.begin();
    batcher.draw_sprite(&tex, SpriteDraw::default());
    batcher.enable_blending();
    assert_eq!(device.count_draws(), 1);

    batcher.draw_sprite(&tex, SpriteDraw::default());
    let calls = device.call_count();
    batcher.enable_blending();
    assert_eq!(device.call_count(), calls);
    assert_eq!(batcher.pending_quads(), 1);
    batcher.end();

    let draws = device.draws();
    assert_eq!(draws.len(), 2);
    assert!(draws[1].blend_enabled);
}

#[test]
fn test_matrices_accept_packed_types() {
    let (_device, mut batcher) = setup();
    let view = Mat4::from_translation(Vec3::new(8.0, -4.0, 0.0));
    let packed: glint_core::math::packed::ColumnMatrix4<f32> = view.into();

    batcher.set_view_matrix(packed);
    assert_eq!(batcher.view_matrix(), view);
}
