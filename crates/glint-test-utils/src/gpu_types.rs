//! Handle and value types shared by every [`GraphicsDevice`](crate::GraphicsDevice).
//!
//! Handles are plain integers. Id `0` is reserved as the null handle so a
//! default-constructed handle never aliases a live resource.

use std::borrow::Cow;

use glam::{Mat2, Mat3, Mat4, Vec2, Vec3, Vec4};

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(pub u32);

        impl $name {
            /// The null handle.
            pub const NULL: Self = Self(0);

            pub fn is_null(self) -> bool {
                self.0 == 0
            }
        }
    };
}

handle!(
    /// Device-side storage for vertex, index or uniform data.
    BufferId
);
handle!(
    /// Binding of a vertex buffer, an index buffer and an attribute layout.
    LayoutId
);
handle!(
    /// A compiled and linked shader program.
    ShaderId
);
handle!(
    /// A 2D RGBA image.
    TextureId
);

/// What a buffer stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    Vertex,
    Index,
    Uniform,
}

/// Usage hint passed at creation, mirroring the classic draw-usage hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BufferUsage {
    StaticDraw,
    #[default]
    DynamicDraw,
    StreamDraw,
}

/// How an upload treats the existing device allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadMode {
    /// Replace the allocation with one sized to the new data.
    Reallocate,
    /// Overwrite the start of the existing allocation in place.
    SubData,
}

/// One interleaved vertex field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    pub format: wgpu::VertexFormat,
    pub offset: u64,
    pub shader_location: u32,
}

/// The type of a named uniform as declared by a shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformKind {
    Int,
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

/// A uniform a shader exposes by name.
///
/// Declarations are listed in the same order as the fields of the shader's
/// uniform block.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UniformDecl {
    pub name: Cow<'static, str>,
    pub kind: UniformKind,
}

impl UniformDecl {
    pub const fn new(name: &'static str, kind: UniformKind) -> Self {
        Self {
            name: Cow::Borrowed(name),
            kind,
        }
    }
}

/// Opaque location of a named uniform inside one program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

/// A value assigned to a uniform.
///
/// Matrix variants carry a transpose flag for callers whose matrices are
/// stored row-major.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat2 { value: Mat2, transpose: bool },
    Mat3 { value: Mat3, transpose: bool },
    Mat4 { value: Mat4, transpose: bool },
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Int(_) => UniformKind::Int,
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Vec2(_) => UniformKind::Vec2,
            UniformValue::Vec3(_) => UniformKind::Vec3,
            UniformValue::Vec4(_) => UniformKind::Vec4,
            UniformValue::Mat2 { .. } => UniformKind::Mat2,
            UniformValue::Mat3 { .. } => UniformKind::Mat3,
            UniformValue::Mat4 { .. } => UniformKind::Mat4,
        }
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        UniformValue::Int(v)
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Float(v)
    }
}

impl From<Vec2> for UniformValue {
    fn from(v: Vec2) -> Self {
        UniformValue::Vec2(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        UniformValue::Vec3(v)
    }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self {
        UniformValue::Vec4(v)
    }
}

impl From<Mat2> for UniformValue {
    fn from(value: Mat2) -> Self {
        UniformValue::Mat2 {
            value,
            transpose: false,
        }
    }
}

impl From<Mat3> for UniformValue {
    fn from(value: Mat3) -> Self {
        UniformValue::Mat3 {
            value,
            transpose: false,
        }
    }
}

impl From<Mat4> for UniformValue {
    fn from(value: Mat4) -> Self {
        UniformValue::Mat4 {
            value,
            transpose: false,
        }
    }
}

/// Source for a shader program holding both stages.
#[derive(Debug, Clone, Copy)]
pub struct ShaderDesc<'a> {
    pub label: Option<&'a str>,
    pub source: &'a str,
    pub vertex_entry: &'a str,
    pub fragment_entry: &'a str,
    pub uniforms: &'a [UniformDecl],
}

/// Sampling filter for a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureFilter {
    Nearest,
    #[default]
    Linear,
}

/// RGBA8 texture creation parameters.
#[derive(Debug, Clone, Copy)]
pub struct TextureDesc<'a> {
    pub label: Option<&'a str>,
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8 rows, `width * height * 4` bytes.
    pub pixels: &'a [u8],
    pub filter: TextureFilter,
}

/// Separate color and alpha blend factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendFactors {
    pub src_color: wgpu::BlendFactor,
    pub dst_color: wgpu::BlendFactor,
    pub src_alpha: wgpu::BlendFactor,
    pub dst_alpha: wgpu::BlendFactor,
}

impl BlendFactors {
    /// Same factors for color and alpha.
    pub const fn new(src: wgpu::BlendFactor, dst: wgpu::BlendFactor) -> Self {
        Self {
            src_color: src,
            dst_color: dst,
            src_alpha: src,
            dst_alpha: dst,
        }
    }

    pub const fn separate(
        src_color: wgpu::BlendFactor,
        dst_color: wgpu::BlendFactor,
        src_alpha: wgpu::BlendFactor,
        dst_alpha: wgpu::BlendFactor,
    ) -> Self {
        Self {
            src_color,
            dst_color,
            src_alpha,
            dst_alpha,
        }
    }

    /// Additive blend equation with these factors.
    pub fn to_blend_state(self) -> wgpu::BlendState {
        wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: self.src_color,
                dst_factor: self.dst_color,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: self.src_alpha,
                dst_factor: self.dst_alpha,
                operation: wgpu::BlendOperation::Add,
            },
        }
    }
}

/// Shader compilation or linking failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderError {
    /// The source was empty
    EmptySource,
    /// A required entry point was not found in the source
    MissingEntryPoint(String),
    /// The backend rejected the source
    Compile(String),
}

impl std::fmt::Display for ShaderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySource => write!(f, "Shader source is empty"),
            Self::MissingEntryPoint(name) => write!(f, "Shader entry point `{}` not found", name),
            Self::Compile(msg) => write!(f, "Shader compilation failed: {}", msg),
        }
    }
}

impl std::error::Error for ShaderError {}

/// Checks every backend performs before handing source to its compiler.
pub fn validate_shader_desc(desc: &ShaderDesc) -> Result<(), ShaderError> {
    if desc.source.trim().is_empty() {
        return Err(ShaderError::EmptySource);
    }

    for entry in [desc.vertex_entry, desc.fragment_entry] {
        if !desc.source.contains(&format!("fn {}", entry)) {
            return Err(ShaderError::MissingEntryPoint(entry.to_string()));
        }
    }

    Ok(())
}
