use glam::Vec2;
use glint_test_utils::{GraphicsDevice, TextureDesc, TextureFilter, TextureId};

use crate::error::TextureError;

/// A 2D RGBA image on the device.
///
/// `Texture` is a `Copy` value: the handle plus cached dimensions. The
/// batcher compares textures by handle and never destroys them; call
/// [`destroy`](Self::destroy) once no queued draw can still reference it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Texture {
    id: TextureId,
    width: u32,
    height: u32,
}

impl Texture {
    /// Upload tightly packed RGBA8 pixels.
    pub fn from_rgba8(
        device: &dyn GraphicsDevice,
        label: Option<&str>,
        width: u32,
        height: u32,
        pixels: &[u8],
        filter: TextureFilter,
    ) -> Result<Self, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::InvalidDimensions { width, height });
        }

        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(TextureError::DataSizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }

        let id = device.create_texture(&TextureDesc {
            label,
            width,
            height,
            pixels,
            filter,
        });
        tracing::debug!("Created texture {:?} ({}x{})", id, width, height);

        Ok(Self { id, width, height })
    }

    /// Wrap a texture created directly through the device.
    pub fn from_raw(id: TextureId, width: u32, height: u32) -> Self {
        Self { id, width, height }
    }

    /// The null texture. Drawing it is skipped.
    pub const fn null() -> Self {
        Self {
            id: TextureId::NULL,
            width: 0,
            height: 0,
        }
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    /// True for a non-null handle with a nonzero size.
    pub fn is_valid(&self) -> bool {
        !self.id.is_null() && self.width > 0 && self.height > 0
    }

    pub fn bind(&self, device: &dyn GraphicsDevice, slot: u32) {
        device.bind_texture(self.id, slot);
    }

    /// Release the device image. Copies of this value become dangling.
    pub fn destroy(&mut self, device: &dyn GraphicsDevice) {
        if !self.id.is_null() {
            device.destroy_texture(self.id);
            *self = Self::null();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_test_utils::MockGraphicsDevice;

    #[test]
    fn test_from_rgba8_validates_input() {
        let mock = MockGraphicsDevice::new();

        assert_eq!(
            Texture::from_rgba8(&mock, None, 0, 4, &[], TextureFilter::Linear),
            Err(TextureError::InvalidDimensions {
                width: 0,
                height: 4
            })
        );
        assert_eq!(
            Texture::from_rgba8(&mock, None, 2, 2, &[0; 15], TextureFilter::Linear),
            Err(TextureError::DataSizeMismatch {
                expected: 16,
                actual: 15
            })
        );
        assert_eq!(mock.live_textures(), 0);
    }

    #[test]
    fn test_lifecycle() {
        let mock = MockGraphicsDevice::new();
        let mut texture =
            Texture::from_rgba8(&mock, Some("t"), 2, 2, &[255; 16], TextureFilter::Nearest)
                .unwrap();

        assert!(texture.is_valid());
        assert_eq!(texture.size(), Vec2::new(2.0, 2.0));

        texture.destroy(&mock);
        assert!(!texture.is_valid());
        assert_eq!(mock.live_textures(), 0);
    }

    #[test]
    fn test_null_is_invalid() {
        assert!(!Texture::null().is_valid());
        assert!(!Texture::from_raw(TextureId(7), 0, 16).is_valid());
    }
}
