//! Headless bubbles: additive, normal-mapped sprites rendered offscreen.
//!
//! Builds a 15-frame "wobbling bubble" strip procedurally, pairs the stock
//! sprite vertex stage with a lit fragment stage, and draws a few thousand
//! animated bubbles into an offscreen texture in one session.
//!
//! Run with: `cargo run -p glint-render --example headless_bubbles`

use std::sync::Arc;

use glam::{Vec2, Vec3};
use glint_core::{
    config::{Config, ProfilingMode},
    profiling,
};
use glint_render::{
    BatcherDescriptor, Color, GeometryBatcher, GraphicsContext, ShaderProgram, SpriteDraw,
    Texture, UvRect, WgpuDevice,
};
use glint_test_utils::{TextureFilter, UniformDecl, UniformKind};

const WIDTH: u32 = 1280;
const HEIGHT: u32 = 720;
const FRAMES: u32 = 15;
const FRAME_SIZE: u32 = 32;
const BUBBLES: usize = 4000;
const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

const BUBBLE_FRAGMENT: &str = r#"
@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let sample = textureSample(sprite_texture, sprite_sampler, input.uv);
    let ts_normal = sample.rgb * 2.0 - vec3<f32>(1.0);
    let normal = normalize(
        input.tangent * ts_normal.x + input.bitangent * ts_normal.y + input.normal * ts_normal.z
    );
    let diffuse = max(dot(normal, normalize(uniforms.light_dir)), 0.0);
    let light = uniforms.ambient + diffuse;
    return vec4<f32>(input.color.rgb * light * sample.a, input.color.a * sample.a);
}
"#;

/// A horizontal strip of sphere normal maps whose radius wobbles per frame.
fn bubble_strip() -> Vec<u8> {
    let width = FRAMES * FRAME_SIZE;
    let mut pixels = vec![0u8; (width * FRAME_SIZE * 4) as usize];

    for frame in 0..FRAMES {
        let phase = frame as f32 / FRAMES as f32 * std::f32::consts::TAU;
        let radius = FRAME_SIZE as f32 * (0.42 + 0.04 * phase.sin());

        for y in 0..FRAME_SIZE {
            for x in 0..FRAME_SIZE {
                let d = Vec2::new(x as f32 + 0.5, y as f32 + 0.5) - Vec2::splat(FRAME_SIZE as f32 / 2.0);
                let r = d.length() / radius;
                let offset = ((y * width + frame * FRAME_SIZE + x) * 4) as usize;
                if r > 1.0 {
                    continue;
                }

                let n = Vec3::new(d.x / radius, d.y / radius, (1.0 - r * r).sqrt());
                let encoded = (n * 0.5 + Vec3::splat(0.5)) * 255.0;
                pixels[offset] = encoded.x as u8;
                pixels[offset + 1] = encoded.y as u8;
                pixels[offset + 2] = encoded.z as u8;
                // Thin shell: bright rim, faint interior.
                pixels[offset + 3] = (255.0 * (0.25 + 0.75 * r.powi(4))) as u8;
            }
        }
    }
    pixels
}

/// Deterministic xorshift so the scene is the same every run.
struct Rng(u32);

impl Rng {
    fn next_f32(&mut self) -> f32 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 17;
        self.0 ^= self.0 << 5;
        (self.0 >> 8) as f32 / (1u32 << 24) as f32
    }
}

struct Bubble {
    position: Vec2,
    velocity: Vec2,
    scale: f32,
    frame: u32,
    color: Color,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    glint_core::init(&Config {
        profiling: ProfilingMode::On,
        ..Default::default()
    });

    let context = GraphicsContext::new_owned_sync()?;
    tracing::info!("Rendering on {}", context.info().name);

    let target = context.device().create_texture(&wgpu::TextureDescriptor {
        label: Some("Bubbles Target"),
        size: wgpu::Extent3d {
            width: WIDTH,
            height: HEIGHT,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });

    let device = Arc::new(WgpuDevice::new(context.clone(), FORMAT));
    device.set_target(target.create_view(&wgpu::TextureViewDescriptor::default()));

    let mut strip = Texture::from_rgba8(
        &*device,
        Some("Bubble Strip"),
        FRAMES * FRAME_SIZE,
        FRAME_SIZE,
        &bubble_strip(),
        TextureFilter::Linear,
    )?;

    let mut bubble_shader = ShaderProgram::with_fragment(
        &*device,
        "Bubble Shader",
        BUBBLE_FRAGMENT,
        &[
            UniformDecl::new("light_dir", UniformKind::Vec3),
            UniformDecl::new("ambient", UniformKind::Float),
        ],
    )?;
    bubble_shader.set_uniform(&*device, "light_dir", Vec3::new(-0.4, -0.6, 0.7));
    bubble_shader.set_uniform(&*device, "ambient", 0.2f32);

    let mut batcher = GeometryBatcher::with_descriptor(
        device.clone(),
        BatcherDescriptor::new(WIDTH, HEIGHT).label("Bubble Batcher"),
    )?;
    batcher.set_shader(Some(&bubble_shader));
    batcher.set_blend_function(wgpu::BlendFactor::One, wgpu::BlendFactor::One);
    batcher.enable_blending();

    let mut rng = Rng(0x9E37_79B9);
    let mut bubbles: Vec<Bubble> = (0..BUBBLES)
        .map(|_| Bubble {
            position: Vec2::new(rng.next_f32() * WIDTH as f32, rng.next_f32() * HEIGHT as f32),
            velocity: Vec2::new(rng.next_f32() - 0.5, -0.5 - rng.next_f32()) * 60.0,
            scale: 0.5 + rng.next_f32() * 1.5,
            frame: (rng.next_f32() * FRAMES as f32) as u32,
            color: Color::rgba(0.3 + rng.next_f32() * 0.4, 0.6, 0.9, 1.0).dimmed(0.5),
        })
        .collect();

    let dt = 1.0 / 60.0;
    for _ in 0..3 {
        profiling::new_frame();
        device.clear(Color::rgb(0.02, 0.03, 0.08).to_wgpu());

        batcher.begin();
        for bubble in &mut bubbles {
            bubble.position += bubble.velocity * dt;
            if bubble.position.y < -(FRAME_SIZE as f32) {
                bubble.position.y += HEIGHT as f32 + FRAME_SIZE as f32;
            }
            bubble.frame = bubble.frame.wrapping_add(1);

            batcher.set_color(bubble.color);
            batcher.draw_sprite(
                &strip,
                SpriteDraw::at(bubble.position)
                    .origin(Vec2::splat(0.5))
                    .scale(Vec2::splat(bubble.scale))
                    .uv(UvRect::from_frame(bubble.frame, FRAMES, 1)),
            );
        }
        batcher.end();
    }

    let stats = batcher.stats();
    tracing::info!(
        "Rendered {} quads in {} draw calls ({} flushes)",
        stats.quads,
        stats.draw_calls,
        stats.flushes
    );

    drop(batcher);
    bubble_shader.destroy(&*device);
    strip.destroy(&*device);
    Ok(())
}
