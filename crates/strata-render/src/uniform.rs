//! Named uniform groups and their std140 encoding.
//!
//! ```
//! use strata_render::uniform::{UniformGroup, UniformValue};
//! use glam::Vec4;
//!
//! let mut group = UniformGroup::local_template();
//! group.set("uColor", UniformValue::Vec4(Vec4::new(1.0, 0.0, 0.0, 1.0))).unwrap();
//! assert_eq!(group.byte_size(), 80);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use glam::{Mat3, Vec2, Vec4};
use indexmap::IndexMap;
use strata_core::math::mat3_to_std140;

use crate::error::{RenderError, RenderResult};

/// Per-draw transform.
pub const TRANSFORM_MATRIX: &str = "uTransformMatrix";
/// Per-draw premultiplied color.
pub const COLOR: &str = "uColor";
/// Non-zero to snap vertices to whole pixels.
pub const ROUND: &str = "uRound";

static NEXT_GROUP_UID: AtomicU64 = AtomicU64::new(1);

/// Declared type of a uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformType {
    F32,
    Vec2,
    Vec4,
    Mat3,
}

impl UniformType {
    /// Size in bytes under std140, including column padding.
    pub const fn size(self) -> u64 {
        match self {
            UniformType::F32 => 4,
            UniformType::Vec2 => 8,
            UniformType::Vec4 => 16,
            UniformType::Mat3 => 48,
        }
    }

    /// Base alignment under std140.
    pub const fn align(self) -> u64 {
        match self {
            UniformType::F32 => 4,
            UniformType::Vec2 => 8,
            UniformType::Vec4 | UniformType::Mat3 => 16,
        }
    }
}

/// A uniform value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    F32(f32),
    Vec2(Vec2),
    Vec4(Vec4),
    Mat3(Mat3),
}

impl UniformValue {
    pub fn ty(&self) -> UniformType {
        match self {
            UniformValue::F32(_) => UniformType::F32,
            UniformValue::Vec2(_) => UniformType::Vec2,
            UniformValue::Vec4(_) => UniformType::Vec4,
            UniformValue::Mat3(_) => UniformType::Mat3,
        }
    }

    fn write_std140(&self, out: &mut Vec<u8>) {
        match self {
            UniformValue::F32(v) => out.extend_from_slice(bytemuck::bytes_of(v)),
            UniformValue::Vec2(v) => out.extend_from_slice(bytemuck::bytes_of(v)),
            UniformValue::Vec4(v) => out.extend_from_slice(bytemuck::bytes_of(v)),
            UniformValue::Mat3(m) => {
                out.extend_from_slice(bytemuck::cast_slice(&mat3_to_std140(m)));
            }
        }
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::F32(v)
    }
}

impl From<Vec2> for UniformValue {
    fn from(v: Vec2) -> Self {
        UniformValue::Vec2(v)
    }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self {
        UniformValue::Vec4(v)
    }
}

impl From<[f32; 4]> for UniformValue {
    fn from(v: [f32; 4]) -> Self {
        UniformValue::Vec4(Vec4::from_array(v))
    }
}

impl From<Mat3> for UniformValue {
    fn from(m: Mat3) -> Self {
        UniformValue::Mat3(m)
    }
}

/// An ordered set of named uniforms backing one bind slot.
///
/// Members are laid out in insertion order. The set of members and their
/// types is fixed after construction; [`UniformGroup::set`] only replaces
/// values. Every successful write bumps [`UniformGroup::dirty_id`].
#[derive(Debug)]
pub struct UniformGroup {
    uid: u64,
    label: &'static str,
    entries: IndexMap<&'static str, UniformValue>,
    dirty_id: u64,
}

impl UniformGroup {
    pub fn new(label: &'static str) -> Self {
        Self {
            uid: NEXT_GROUP_UID.fetch_add(1, Ordering::Relaxed),
            label,
            entries: IndexMap::new(),
            dirty_id: 0,
        }
    }

    /// Declare a member with its initial value.
    pub fn with(mut self, name: &'static str, value: impl Into<UniformValue>) -> Self {
        self.entries.insert(name, value.into());
        self
    }

    /// The per-draw template every adaptor allocates at `init`: identity
    /// transform, white color, rounding off.
    pub fn local_template() -> Self {
        Self::new("local_uniforms")
            .with(TRANSFORM_MATRIX, Mat3::IDENTITY)
            .with(COLOR, Vec4::ONE)
            .with(ROUND, 0.0_f32)
    }

    /// Process-unique identity.
    pub fn uid(&self) -> u64 {
        self.uid
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Incremented on every write.
    pub fn dirty_id(&self) -> u64 {
        self.dirty_id
    }

    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.entries.get(name)
    }

    /// Replace the value of an existing member.
    pub fn set(&mut self, name: &str, value: impl Into<UniformValue>) -> RenderResult<()> {
        let value = value.into();
        let slot = self
            .entries
            .get_mut(name)
            .ok_or_else(|| RenderError::UnknownUniform(name.to_string()))?;

        if slot.ty() != value.ty() {
            return Err(RenderError::UniformTypeMismatch {
                name: name.to_string(),
                expected: slot.ty(),
                found: value.ty(),
            });
        }

        *slot = value;
        self.dirty_id += 1;
        Ok(())
    }

    /// Size of the std140 block, rounded up to 16 bytes.
    pub fn byte_size(&self) -> u64 {
        let end = self.entries.values().fold(0u64, |offset, value| {
            let ty = value.ty();
            offset.next_multiple_of(ty.align()) + ty.size()
        });
        end.next_multiple_of(16)
    }

    /// Append the std140 block to `out`.
    pub fn write_std140(&self, out: &mut Vec<u8>) {
        let base = out.len();
        for value in self.entries.values() {
            let aligned = (out.len() - base).next_multiple_of(value.ty().align() as usize);
            out.resize(base + aligned, 0);
            value.write_std140(out);
        }
        out.resize(base + self.byte_size() as usize, 0);
    }

    pub fn to_std140_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.byte_size() as usize);
        self.write_std140(&mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_template_layout() {
        let group = UniformGroup::local_template();
        // mat3 (48) + vec4 (16) + f32 (4) padded to 16
        assert_eq!(group.byte_size(), 80);

        let bytes = group.to_std140_bytes();
        assert_eq!(bytes.len(), 80);
        let floats: Vec<f32> = bytemuck::pod_collect_to_vec(&bytes);
        assert_eq!(&floats[0..12], &mat3_to_std140(&Mat3::IDENTITY));
        assert_eq!(&floats[12..16], &[1.0, 1.0, 1.0, 1.0]);
        assert_eq!(floats[16], 0.0);
    }

    #[test]
    fn test_vec2_alignment() {
        let group = UniformGroup::new("test")
            .with("a", 1.0_f32)
            .with("b", Vec2::new(2.0, 3.0));
        let floats: Vec<f32> = bytemuck::pod_collect_to_vec(&group.to_std140_bytes());
        assert_eq!(floats, vec![1.0, 0.0, 2.0, 3.0]);
    }

    #[test]
    fn test_byte_size_pads_to_member_alignment() {
        let group = UniformGroup::new("mixed")
            .with("a", 1.0_f32)
            .with("b", Vec4::ONE)
            .with("c", 2.0_f32);
        // f32 at 0, vec4 at 16, f32 at 32, end rounded up to 48.
        assert_eq!(group.byte_size(), 48);
        assert_eq!(group.to_std140_bytes().len(), 48);
    }

    #[test]
    fn test_set_bumps_dirty_id() {
        let mut group = UniformGroup::local_template();
        let before = group.dirty_id();
        group.set(COLOR, [0.5, 0.5, 0.5, 0.5]).unwrap();
        assert_eq!(group.dirty_id(), before + 1);
        assert_eq!(
            group.get(COLOR),
            Some(&UniformValue::Vec4(Vec4::splat(0.5)))
        );
    }

    #[test]
    fn test_set_rejects_unknown_and_mistyped() {
        let mut group = UniformGroup::local_template();
        assert_eq!(
            group.set("uMissing", 1.0_f32),
            Err(RenderError::UnknownUniform("uMissing".into()))
        );
        assert_eq!(
            group.set(COLOR, 1.0_f32),
            Err(RenderError::UniformTypeMismatch {
                name: COLOR.into(),
                expected: UniformType::Vec4,
                found: UniformType::F32,
            })
        );
        assert_eq!(group.dirty_id(), 0);
    }

    #[test]
    fn test_uids_are_unique() {
        let a = UniformGroup::local_template();
        let b = UniformGroup::local_template();
        assert_ne!(a.uid(), b.uid());
    }
}
