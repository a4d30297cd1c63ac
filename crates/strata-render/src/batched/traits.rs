//! The `RendererBackendAdaptor` trait implemented by both backends.

use std::sync::Arc;

use crate::backend::BackendKind;
use crate::blend::BlendMode;
use crate::color::unpack_color_premultiplied;
use crate::error::{RenderError, RenderResult};
use crate::globals::GlobalUniformData;
use crate::paint::PaintContextProvider;
use crate::pipe::{GraphicsRenderable, PipeState};
use crate::shader::ShaderProgram;
use crate::uniform::{self, UniformGroup};

use super::types::BatchRenderStats;

/// Slot of the frame-global uniforms.
pub const GLOBAL_UNIFORM_SLOT: u32 = 0;
/// Slot of a batch's texture set.
pub const TEXTURE_SLOT: u32 = 1;
/// Slot of the per-draw uniforms.
pub const LOCAL_UNIFORM_SLOT: u32 = 2;

/// Drives one graphics API on behalf of the graphics pipe.
///
/// The lifecycle is `init()`, then per frame `begin_frame()`, any number of
/// `execute()` calls and `end_frame()`, and finally `destroy()`. Every
/// method except `kind`, `stats` and `is_active` fails with
/// [`RenderError::NotInitialized`] before `init` and
/// [`RenderError::AdaptorDestroyed`] after `destroy`.
///
/// `execute` mutates the pipe's pipeline state and the adaptor's local
/// uniform group in place, so an adaptor serves one batch-list traversal at
/// a time.
pub trait RendererBackendAdaptor: Send {
    /// Returns the API this adaptor drives.
    fn kind(&self) -> BackendKind;

    /// Compile the shared program and allocate the local uniform template.
    ///
    /// Calling this on an active adaptor releases the previous program first.
    fn init(&mut self) -> RenderResult<()>;

    /// Refresh frame-global uniforms and rewind per-frame allocations.
    fn begin_frame(&mut self, globals: &GlobalUniformData) -> RenderResult<()>;

    /// Issue the draw calls for one renderable.
    ///
    /// A paint context with no batches is a no-op: no state is touched and
    /// no draw is issued. Every live batch is checked against the geometry
    /// before anything is bound, so either every batch draws or none does.
    fn execute(
        &mut self,
        pipe: &mut PipeState,
        renderable: &GraphicsRenderable,
        contexts: &mut dyn PaintContextProvider,
    ) -> RenderResult<BatchRenderStats>;

    /// Flush anything batched during the frame.
    fn end_frame(&mut self) -> RenderResult<()>;

    /// Forget cached texture bindings that reference these textures.
    fn release_textures(&mut self, texture_ids: &[u64]) -> RenderResult<()>;

    /// Release the shared program and every cache. Terminal.
    fn destroy(&mut self) -> RenderResult<()>;

    /// Statistics accumulated since the last `begin_frame`.
    fn stats(&self) -> BatchRenderStats;

    fn is_active(&self) -> bool;

    /// The program used when a renderable has no custom shader.
    fn default_shader(&self) -> RenderResult<Arc<ShaderProgram>>;
}

/// The renderable's custom shader if it has one, else `default`.
pub(crate) fn resolve_shader(
    default: &Arc<ShaderProgram>,
    renderable: &GraphicsRenderable,
    kind: BackendKind,
) -> RenderResult<Arc<ShaderProgram>> {
    match &renderable.custom_shader {
        Some(shader) if shader.kind() != kind => Err(RenderError::BackendMismatch {
            adaptor: kind,
            backend: shader.kind(),
        }),
        Some(shader) => Ok(shader.clone()),
        None => Ok(default.clone()),
    }
}

/// Write transform, premultiplied color and pixel rounding.
pub(crate) fn write_local_uniforms(
    locals: &mut UniformGroup,
    renderable: &GraphicsRenderable,
    round_pixels: bool,
) -> RenderResult<()> {
    locals.set(uniform::TRANSFORM_MATRIX, renderable.transform)?;
    locals.set(uniform::COLOR, unpack_color_premultiplied(renderable.color))?;
    let round = if round_pixels || renderable.round_pixels {
        1.0_f32
    } else {
        0.0
    };
    locals.set(uniform::ROUND, round)?;
    Ok(())
}

/// A batch's own blend mode wins unless it is `Normal`.
pub(crate) fn effective_blend(renderable: BlendMode, batch: BlendMode) -> BlendMode {
    if batch == BlendMode::Normal {
        renderable
    } else {
        batch
    }
}
