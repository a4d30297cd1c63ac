//! The graphics pipe: backend-agnostic state in front of an adaptor.

use std::sync::Arc;

use glam::Mat3;

use crate::backend::BackendKind;
use crate::batched::{BatchRenderStats, RendererBackendAdaptor};
use crate::blend::BlendMode;
use crate::error::RenderResult;
use crate::globals::GlobalUniformData;
use crate::paint::{PaintContextId, PaintContextProvider};
use crate::shader::ShaderProgram;
use crate::state::PipelineState;

/// Per-pipe state shared by every renderable the pipe executes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipeState {
    pub pipeline_state: PipelineState,
    /// Snap vertices to whole pixels for every renderable.
    pub round_pixels: bool,
}

/// A drawable as seen by the pipe.
#[derive(Debug, Clone)]
pub struct GraphicsRenderable {
    pub context: PaintContextId,
    pub transform: Mat3,
    /// Tint in `0xAABBGGRR`, straight alpha.
    pub color: u32,
    pub blend_mode: BlendMode,
    pub round_pixels: bool,
    pub custom_shader: Option<Arc<ShaderProgram>>,
}

impl GraphicsRenderable {
    /// An opaque white, untransformed renderable.
    pub fn new(context: PaintContextId) -> Self {
        Self {
            context,
            transform: Mat3::IDENTITY,
            color: 0xFFFF_FFFF,
            blend_mode: BlendMode::Normal,
            round_pixels: false,
            custom_shader: None,
        }
    }

    pub fn with_transform(mut self, transform: Mat3) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_color(mut self, color: u32) -> Self {
        self.color = color;
        self
    }

    pub fn with_blend_mode(mut self, blend_mode: impl Into<BlendMode>) -> Self {
        self.blend_mode = blend_mode.into();
        self
    }

    pub fn with_round_pixels(mut self, round_pixels: bool) -> Self {
        self.round_pixels = round_pixels;
        self
    }

    pub fn with_shader(mut self, shader: Arc<ShaderProgram>) -> Self {
        self.custom_shader = Some(shader);
        self
    }
}

/// Routes renderables to whichever adaptor is active.
pub struct GraphicsPipe {
    adaptor: Box<dyn RendererBackendAdaptor>,
    state: PipeState,
}

impl GraphicsPipe {
    pub fn new(adaptor: Box<dyn RendererBackendAdaptor>) -> Self {
        Self {
            adaptor,
            state: PipeState::default(),
        }
    }

    pub fn with_round_pixels(mut self, round_pixels: bool) -> Self {
        self.state.round_pixels = round_pixels;
        self
    }

    pub fn init(&mut self) -> RenderResult<()> {
        self.adaptor.init()
    }

    pub fn begin_frame(&mut self, globals: &GlobalUniformData) -> RenderResult<()> {
        self.adaptor.begin_frame(globals)
    }

    pub fn execute(
        &mut self,
        renderable: &GraphicsRenderable,
        contexts: &mut dyn PaintContextProvider,
    ) -> RenderResult<BatchRenderStats> {
        self.adaptor.execute(&mut self.state, renderable, contexts)
    }

    pub fn end_frame(&mut self) -> RenderResult<()> {
        self.adaptor.end_frame()
    }

    pub fn release_textures(&mut self, texture_ids: &[u64]) -> RenderResult<()> {
        self.adaptor.release_textures(texture_ids)
    }

    pub fn destroy(&mut self) -> RenderResult<()> {
        self.adaptor.destroy()
    }

    pub fn state(&self) -> &PipeState {
        &self.state
    }

    pub fn kind(&self) -> BackendKind {
        self.adaptor.kind()
    }

    pub fn adaptor(&self) -> &dyn RendererBackendAdaptor {
        self.adaptor.as_ref()
    }
}
