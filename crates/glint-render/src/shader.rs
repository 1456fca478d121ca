//! Shader programs and the stock sprite shader sources.

use std::{fmt::Write as _, sync::Arc};

use ahash::AHashMap;
use glint_test_utils::{
    GraphicsDevice, ShaderDesc, ShaderError, ShaderId, UniformDecl, UniformKind, UniformLocation,
    UniformValue,
};
use parking_lot::Mutex;

/// Name of the combined `projection * view` matrix uniform.
pub const PROJ_VIEW_UNIFORM: &str = "proj_view";
/// Name of the integer uniform selecting the sampled texture slot.
pub const TEXTURE_UNIFORM: &str = "texture_slot";

/// Uniforms every sprite shader declares, in block order.
pub const SPRITE_UNIFORMS: &[UniformDecl] = &[
    UniformDecl::new(PROJ_VIEW_UNIFORM, UniformKind::Mat4),
    UniformDecl::new(TEXTURE_UNIFORM, UniformKind::Int),
];

/// Vertex stage of the stock sprite shader.
///
/// Pair it with a custom fragment stage through
/// [`ShaderProgram::with_fragment`]. The fragment input struct is
/// `VertexOutput` with `color`, `uv`, `tangent`, `bitangent` and `normal`.
pub const SPRITE_VERTEX_WGSL: &str = include_str!("shaders/sprite_vertex.wgsl");

/// Fragment stage of the stock sprite shader: tint times texture sample.
pub const SPRITE_FRAGMENT_WGSL: &str = include_str!("shaders/sprite_fragment.wgsl");

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// WGSL declaration of the `uniforms` block for `decls`.
pub fn uniform_block_wgsl(decls: &[UniformDecl]) -> String {
    let mut out = String::from("struct Uniforms {\n");
    for decl in decls {
        let ty = match decl.kind {
            UniformKind::Int => "i32",
            UniformKind::Float => "f32",
            UniformKind::Vec2 => "vec2<f32>",
            UniformKind::Vec3 => "vec3<f32>",
            UniformKind::Vec4 => "vec4<f32>",
            UniformKind::Mat2 => "mat2x2<f32>",
            UniformKind::Mat3 => "mat3x3<f32>",
            UniformKind::Mat4 => "mat4x4<f32>",
        };
        let _ = writeln!(out, "    {}: {},", decl.name, ty);
    }
    out.push_str("}\n\n@group(0) @binding(0)\nvar<uniform> uniforms: Uniforms;\n\n");
    out
}

/// A linked program plus a cache of resolved uniform locations.
///
/// Clones share the same program and cache. The batcher holds clones of
/// caller shaders and never destroys them.
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    id: ShaderId,
    locations: Arc<Mutex<AHashMap<String, Option<UniformLocation>>>>,
}

impl ShaderProgram {
    /// Compile and link `desc`. Failures are logged and returned.
    pub fn link(device: &dyn GraphicsDevice, desc: &ShaderDesc) -> Result<Self, ShaderError> {
        match device.create_shader(desc) {
            Ok(id) => {
                tracing::debug!("Linked shader {:?} ({})", id, desc.label.unwrap_or("unnamed"));
                Ok(Self {
                    id,
                    locations: Arc::new(Mutex::new(AHashMap::new())),
                })
            }
            Err(err) => {
                tracing::error!(
                    "Failed to link shader `{}`: {}",
                    desc.label.unwrap_or("unnamed"),
                    err
                );
                Err(err)
            }
        }
    }

    /// The built-in sprite shader.
    pub fn sprite(device: &dyn GraphicsDevice) -> Result<Self, ShaderError> {
        Self::with_fragment(device, "Sprite Shader", SPRITE_FRAGMENT_WGSL, &[])
    }

    /// The stock sprite vertex stage combined with a custom fragment stage.
    ///
    /// `extra_uniforms` are appended to the sprite uniforms and become fields
    /// of the `uniforms` block visible to `fragment_source`.
    pub fn with_fragment(
        device: &dyn GraphicsDevice,
        label: &str,
        fragment_source: &str,
        extra_uniforms: &[UniformDecl],
    ) -> Result<Self, ShaderError> {
        let mut uniforms = SPRITE_UNIFORMS.to_vec();
        uniforms.extend_from_slice(extra_uniforms);

        let mut source = uniform_block_wgsl(&uniforms);
        source.push_str(SPRITE_VERTEX_WGSL);
        source.push('\n');
        source.push_str(fragment_source);

        Self::link(
            device,
            &ShaderDesc {
                label: Some(label),
                source: &source,
                vertex_entry: VERTEX_ENTRY,
                fragment_entry: FRAGMENT_ENTRY,
                uniforms: &uniforms,
            },
        )
    }

    pub fn id(&self) -> ShaderId {
        self.id
    }

    pub fn bind(&self, device: &dyn GraphicsDevice) {
        device.bind_shader(Some(self.id));
    }

    pub fn unbind(&self, device: &dyn GraphicsDevice) {
        device.bind_shader(None);
    }

    /// Resolve `name`, consulting the cache first.
    ///
    /// A name the program does not declare is logged on first lookup only.
    pub fn location(&self, device: &dyn GraphicsDevice, name: &str) -> Option<UniformLocation> {
        let mut locations = self.locations.lock();
        if let Some(cached) = locations.get(name) {
            return *cached;
        }

        let location = device.uniform_location(self.id, name);
        if location.is_none() {
            tracing::warn!("Uniform `{}` not found in shader {:?}", name, self.id);
        }
        locations.insert(name.to_string(), location);
        location
    }

    /// Assign a named uniform. Returns false if the program lacks it.
    pub fn set_uniform(
        &self,
        device: &dyn GraphicsDevice,
        name: &str,
        value: impl Into<UniformValue>,
    ) -> bool {
        match self.location(device, name) {
            Some(location) => {
                device.set_uniform(self.id, location, value.into());
                true
            }
            None => false,
        }
    }

    pub fn destroy(&mut self, device: &dyn GraphicsDevice) {
        if !self.id.is_null() {
            device.destroy_shader(self.id);
            self.id = ShaderId::NULL;
            self.locations.lock().clear();
        }
    }
}

impl PartialEq for ShaderProgram {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ShaderProgram {}
