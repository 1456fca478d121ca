//! CPU-side image of a WGSL uniform block.
//!
//! Named uniforms set through the device are packed into a byte buffer
//! following WGSL's uniform address-space layout, then written to the GPU
//! right before each draw.

use glam::{Mat3, Mat4};
use glint_test_utils::{UniformDecl, UniformKind, UniformValue};

/// `(align, size)` of a uniform kind in the uniform address space.
pub(crate) fn layout_of(kind: UniformKind) -> (usize, usize) {
    match kind {
        UniformKind::Int | UniformKind::Float => (4, 4),
        UniformKind::Vec2 => (8, 8),
        UniformKind::Vec3 => (16, 12),
        UniformKind::Vec4 => (16, 16),
        UniformKind::Mat2 => (8, 16),
        UniformKind::Mat3 => (16, 48),
        UniformKind::Mat4 => (16, 64),
    }
}

fn align_to(value: usize, align: usize) -> usize {
    value.div_ceil(align) * align
}

#[derive(Debug, Clone)]
pub(crate) struct UniformBlock {
    fields: Vec<(UniformKind, usize)>,
    data: Vec<u8>,
}

impl UniformBlock {
    pub fn new(decls: &[UniformDecl]) -> Self {
        let mut offset = 0;
        let mut max_align = 16;
        let mut fields = Vec::with_capacity(decls.len());

        for decl in decls {
            let (align, size) = layout_of(decl.kind);
            offset = align_to(offset, align);
            fields.push((decl.kind, offset));
            offset += size;
            max_align = max_align.max(align);
        }

        let size = align_to(offset.max(16), max_align);
        Self {
            fields,
            data: vec![0; size],
        }
    }

    /// Write `value` into field `index`. Returns false on a type mismatch.
    pub fn set(&mut self, index: usize, value: UniformValue) -> bool {
        let Some(&(kind, offset)) = self.fields.get(index) else {
            return false;
        };
        if kind != value.kind() {
            return false;
        }

        match value {
            UniformValue::Int(v) => self.write(offset, bytemuck::bytes_of(&v)),
            UniformValue::Float(v) => self.write(offset, bytemuck::bytes_of(&v)),
            UniformValue::Vec2(v) => self.write(offset, bytemuck::bytes_of(&v)),
            UniformValue::Vec3(v) => self.write(offset, bytemuck::bytes_of(&v)),
            UniformValue::Vec4(v) => self.write(offset, bytemuck::bytes_of(&v)),
            UniformValue::Mat2 { value, transpose } => {
                let m = if transpose { value.transpose() } else { value };
                self.write(offset, bytemuck::bytes_of(&m));
            }
            UniformValue::Mat3 { value, transpose } => {
                let m: Mat3 = if transpose { value.transpose() } else { value };
                // Each column is padded to 16 bytes.
                for (i, column) in m.to_cols_array_2d().iter().enumerate() {
                    self.write(offset + i * 16, bytemuck::bytes_of(column));
                }
            }
            UniformValue::Mat4 { value, transpose } => {
                let m: Mat4 = if transpose { value.transpose() } else { value };
                self.write(offset, bytemuck::bytes_of(&m));
            }
        }
        true
    }

    fn write(&mut self, offset: usize, bytes: &[u8]) {
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}
