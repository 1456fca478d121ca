//! Device abstraction and test utilities for Glint.
//!
//! The batcher in `glint-render` never talks to a graphics API directly. It
//! drives a [`GraphicsDevice`], which is implemented by the `wgpu` backend in
//! `glint-render` and by `MockGraphicsDevice` here (requires the `mock`
//! feature).
//!
//! # Example
//!
//! ```rust
//! # #[cfg(feature = "mock")]
//! # {
//! use glint_test_utils::{BufferKind, BufferUsage, GraphicsDevice, MockGraphicsDevice, UploadMode};
//!
//! let mock = MockGraphicsDevice::new();
//! let buffer = mock.create_buffer(BufferKind::Vertex, BufferUsage::DynamicDraw);
//! mock.upload_buffer(buffer, &[0u8; 64], UploadMode::Reallocate);
//!
//! assert_eq!(mock.count_buffer_uploads(), 1);
//! assert_eq!(mock.buffer_size(buffer), Some(64));
//! # }
//! ```
//!
//! # Design
//!
//! - All resources are addressed by small `Copy` handles (`BufferId`,
//!   `ShaderId`, ...). Nothing borrows from the device.
//! - Methods take `&self`; implementations use interior mutability, which
//!   keeps the trait object safe and lets a device be shared through `Arc`.

pub mod device;
pub mod gpu_types;
#[cfg(feature = "mock")]
pub mod mock_device;

pub use device::*;
pub use gpu_types::*;
#[cfg(feature = "mock")]
pub use mock_device::*;
