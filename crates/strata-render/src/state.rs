//! Pipeline state shared by every draw issued through a pipe.

use strata_test_utils::RasterState;

use crate::blend::BlendMode;

/// Fixed-function state a pipe hands to its adaptor.
///
/// The pipe owns one instance and adaptors overwrite `blend_mode` in place
/// on every execute. Not safe to share between concurrently executing
/// renderables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineState {
    pub blend_mode: BlendMode,
    /// Cull back faces (default: false)
    pub culling: bool,
    /// Treat clockwise winding as front-facing (default: false)
    pub clockwise_front_face: bool,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::for_2d()
    }
}

impl PipelineState {
    /// State for 2D drawing: blending on, no culling.
    pub const fn for_2d() -> Self {
        Self {
            blend_mode: BlendMode::Normal,
            culling: false,
            clockwise_front_face: false,
        }
    }

    pub fn to_raster_state(&self) -> RasterState {
        RasterState {
            blend: self.blend_mode.to_blend_state(),
            cull_mode: self.culling.then_some(wgpu::Face::Back),
            front_face: if self.clockwise_front_face {
                wgpu::FrontFace::Cw
            } else {
                wgpu::FrontFace::Ccw
            },
        }
    }
}
