//! Frame-global uniforms bound at slot 0.

use glam::{Mat3, Vec2, Vec4};
use strata_core::math::ortho_projection;

use crate::color::Color;
use crate::error::RenderResult;
use crate::uniform::UniformGroup;

pub const PROJECTION_MATRIX: &str = "uProjectionMatrix";
pub const WORLD_TRANSFORM_MATRIX: &str = "uWorldTransformMatrix";
pub const WORLD_COLOR_ALPHA: &str = "uWorldColorAlpha";
pub const RESOLUTION: &str = "uResolution";

/// Values shared by every draw in a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalUniformData {
    pub projection: Mat3,
    pub world_transform: Mat3,
    /// Premultiplied world tint.
    pub world_color: Color,
    /// View size in pixels.
    pub resolution: Vec2,
}

impl GlobalUniformData {
    /// Globals for a `width` x `height` view with no world transform.
    pub fn for_view(width: f32, height: f32) -> Self {
        Self {
            projection: ortho_projection(width, height),
            world_transform: Mat3::IDENTITY,
            world_color: Color::WHITE,
            resolution: Vec2::new(width, height),
        }
    }
}

impl Default for GlobalUniformData {
    fn default() -> Self {
        Self::for_view(0.0, 0.0)
    }
}

/// The slot-0 uniform group.
#[derive(Debug)]
pub struct GlobalUniforms {
    group: UniformGroup,
}

impl GlobalUniforms {
    pub fn new() -> Self {
        Self {
            group: UniformGroup::new("global_uniforms")
                .with(PROJECTION_MATRIX, Mat3::IDENTITY)
                .with(WORLD_TRANSFORM_MATRIX, Mat3::IDENTITY)
                .with(WORLD_COLOR_ALPHA, Vec4::ONE)
                .with(RESOLUTION, Vec2::ZERO),
        }
    }

    pub fn update(&mut self, data: &GlobalUniformData) -> RenderResult<()> {
        self.group.set(PROJECTION_MATRIX, data.projection)?;
        self.group.set(WORLD_TRANSFORM_MATRIX, data.world_transform)?;
        self.group.set(WORLD_COLOR_ALPHA, data.world_color.to_array())?;
        self.group.set(RESOLUTION, data.resolution)?;
        Ok(())
    }

    pub fn group(&self) -> &UniformGroup {
        &self.group
    }
}

impl Default for GlobalUniforms {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uniform::UniformValue;

    #[test]
    fn test_update_writes_every_member() {
        let mut globals = GlobalUniforms::new();
        let data = GlobalUniformData::for_view(800.0, 600.0);
        globals.update(&data).unwrap();

        assert_eq!(
            globals.group().get(RESOLUTION),
            Some(&UniformValue::Vec2(Vec2::new(800.0, 600.0)))
        );
        assert_eq!(
            globals.group().get(PROJECTION_MATRIX),
            Some(&UniformValue::Mat3(ortho_projection(800.0, 600.0)))
        );
        // two mat3, vec4, vec2 padded to 16
        assert_eq!(globals.group().byte_size(), 48 + 48 + 16 + 16);
    }
}
