use glint_test_utils::ShaderError;

/// Errors returned while constructing a [`GeometryBatcher`](crate::GeometryBatcher).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    /// The default sprite shader failed to compile
    Shader(ShaderError),
    /// Width or height was zero
    InvalidViewport { width: u32, height: u32 },
    /// Capacity outside `1..=SPRITE_CAPACITY`
    InvalidCapacity(usize),
}

impl std::fmt::Display for BatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Shader(err) => write!(f, "Default sprite shader failed: {}", err),
            Self::InvalidViewport { width, height } => {
                write!(f, "Invalid viewport size {}x{}", width, height)
            }
            Self::InvalidCapacity(capacity) => write!(
                f,
                "Invalid batch capacity {} (expected 1..={})",
                capacity,
                crate::SPRITE_CAPACITY
            ),
        }
    }
}

impl std::error::Error for BatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Shader(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ShaderError> for BatchError {
    fn from(err: ShaderError) -> Self {
        Self::Shader(err)
    }
}

/// Errors creating a [`Texture`](crate::Texture) from pixel data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureError {
    InvalidDimensions { width: u32, height: u32 },
    DataSizeMismatch { expected: usize, actual: usize },
}

impl std::fmt::Display for TextureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDimensions { width, height } => {
                write!(f, "Invalid texture dimensions {}x{}", width, height)
            }
            Self::DataSizeMismatch { expected, actual } => write!(
                f,
                "Texture data size mismatch: expected {} bytes, got {}",
                expected, actual
            ),
        }
    }
}

impl std::error::Error for TextureError {}

/// Errors creating a [`GraphicsContext`](crate::GraphicsContext).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    /// No adapter matched the requested backends and options
    NoAdapter,
    /// The adapter refused to create a device
    DeviceCreationFailed(String),
}

impl std::fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoAdapter => write!(f, "Failed to find a suitable GPU adapter"),
            Self::DeviceCreationFailed(msg) => write!(f, "Failed to create device: {}", msg),
        }
    }
}

impl std::error::Error for GraphicsError {}
