//! Glint Render - 2D sprite batching
//!
//! The centre of this crate is [`GeometryBatcher`], which turns a stream of
//! "draw this texture here" calls into as few indexed draws as possible:
//!
//! - Quads sharing a texture, shader and blend state go into one submission.
//! - A texture switch, a state change or reaching the capacity bound flushes
//!   the pending quads first, so draw order is preserved.
//!
//! The batcher drives any [`GraphicsDevice`](glint_test_utils::GraphicsDevice).
//! [`WgpuDevice`] renders with `wgpu`; the recording mock from
//! `glint-test-utils` (feature `mock`) lets the batching logic be tested
//! without a GPU.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use glam::Vec2;
//! use glint_render::*;
//! use glint_test_utils::TextureFilter;
//!
//! let context = GraphicsContext::new_owned_sync().expect("no GPU");
//! let device = Arc::new(WgpuDevice::new(context, wgpu::TextureFormat::Rgba8UnormSrgb));
//! # let view: wgpu::TextureView = unimplemented!();
//! device.set_target(view);
//!
//! let pixels = vec![255u8; 16 * 16 * 4];
//! let texture =
//!     Texture::from_rgba8(&*device, Some("tile"), 16, 16, &pixels, TextureFilter::Nearest)
//!         .unwrap();
//!
//! let mut batcher = GeometryBatcher::new(device.clone(), 800, 600).unwrap();
//! batcher.set_blend_mode(BlendMode::Alpha);
//! batcher.begin();
//! batcher.draw_sprite(&texture, SpriteDraw::at(Vec2::new(32.0, 32.0)));
//! batcher.end();
//! ```

mod batcher;
mod blend;
mod buffer;
mod color;
mod context;
mod error;
mod geometry;
mod shader;
mod sprite;
mod texture;
mod uniform_block;
mod vertex;
mod wgpu_device;

pub use batcher::*;
pub use blend::*;
pub use buffer::*;
pub use color::*;
pub use context::*;
pub use error::*;
pub use geometry::*;
pub use shader::*;
pub use sprite::*;
pub use texture::*;
pub use vertex::*;
pub use wgpu_device::*;
