//! Frame driver owning the graphics pipe, paint contexts and render view.

use strata_core::profiling::{self, profile_function};
use strata_test_utils::GpuGeometry;

use crate::backend::{BackendKind, RenderBackend};
use crate::batched::{AdaptorOptions, BatchRenderStats, RendererBackendAdaptor, create_graphics_adaptor};
use crate::color::Color;
use crate::error::RenderResult;
use crate::globals::GlobalUniformData;
use crate::paint::{BatchablePrimitive, PaintContextCache, PaintContextId};
use crate::pipe::{GraphicsPipe, GraphicsRenderable};

/// Renderer configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RendererOptions {
    pub width: u32,
    pub height: u32,
    /// Device pixels per logical pixel.
    pub resolution: f32,
    pub background: Color,
    pub round_pixels: bool,
    pub adaptor: AdaptorOptions,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            resolution: 1.0,
            background: Color::BLACK,
            round_pixels: false,
            adaptor: AdaptorOptions::default(),
        }
    }
}

/// The surface a renderer draws into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderView {
    pub width: u32,
    pub height: u32,
    pub resolution: f32,
    pub background: Color,
}

impl RenderView {
    /// Size in device pixels.
    pub fn physical_size(&self) -> (u32, u32) {
        (
            (self.width as f32 * self.resolution).round() as u32,
            (self.height as f32 * self.resolution).round() as u32,
        )
    }

    fn globals(&self) -> GlobalUniformData {
        GlobalUniformData::for_view(self.width as f32, self.height as f32)
    }
}

/// Runs `begin_frame`, one `execute` per renderable, then `end_frame`.
pub struct Renderer {
    pipe: GraphicsPipe,
    contexts: PaintContextCache,
    view: Option<RenderView>,
    last_frame_stats: BatchRenderStats,
    frame: u64,
}

impl Renderer {
    /// Wrap an uninitialised adaptor and initialise it.
    pub fn new(
        adaptor: Box<dyn RendererBackendAdaptor>,
        options: &RendererOptions,
    ) -> RenderResult<Self> {
        let mut pipe = GraphicsPipe::new(adaptor).with_round_pixels(options.round_pixels);
        pipe.init()?;

        tracing::debug!(
            "Renderer created: {} backend, {}x{} @{}",
            pipe.kind(),
            options.width,
            options.height,
            options.resolution
        );

        Ok(Self {
            pipe,
            contexts: PaintContextCache::new(options.adaptor.max_textures),
            view: Some(RenderView {
                width: options.width,
                height: options.height,
                resolution: options.resolution,
                background: options.background,
            }),
            last_frame_stats: BatchRenderStats::default(),
            frame: 0,
        })
    }

    /// Build the adaptor for `backend` and initialise it.
    pub fn from_backend(backend: &RenderBackend, options: &RendererOptions) -> RenderResult<Self> {
        Self::new(create_graphics_adaptor(backend, &options.adaptor), options)
    }

    /// Replace a paint context's geometry and primitives.
    pub fn update_context(
        &mut self,
        id: PaintContextId,
        geometry: GpuGeometry,
        primitives: Vec<BatchablePrimitive>,
    ) -> RenderResult<()> {
        self.contexts.update(id, geometry, primitives)
    }

    /// Forget a paint context, optionally evicting texture bindings built
    /// from it.
    pub fn release_context(&mut self, id: PaintContextId, release_textures: bool) -> RenderResult<()> {
        let texture_ids = self.contexts.remove(id)?;
        if release_textures && !texture_ids.is_empty() {
            self.pipe.release_textures(&texture_ids)?;
        }
        tracing::trace!("Released paint context {:?}", id);
        Ok(())
    }

    /// Draw one frame.
    pub fn render<'a>(
        &mut self,
        renderables: impl IntoIterator<Item = &'a GraphicsRenderable>,
    ) -> RenderResult<BatchRenderStats> {
        profile_function!();
        let globals = self.view.map(|view| view.globals()).unwrap_or_default();

        self.pipe.begin_frame(&globals)?;
        let mut stats = BatchRenderStats::default();
        for renderable in renderables {
            stats += self.pipe.execute(renderable, &mut self.contexts)?;
        }
        self.pipe.end_frame()?;

        self.frame += 1;
        self.last_frame_stats = stats;
        tracing::trace!(
            "Frame {}: {} draws, {} bind group switches",
            self.frame,
            stats.draw_calls,
            stats.bind_group_switches
        );
        profiling::new_frame();
        Ok(stats)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if let Some(view) = &mut self.view {
            view.width = width;
            view.height = height;
        }
    }

    /// Detach the render view. Later frames use zero-sized globals.
    pub fn remove_view(&mut self) -> Option<RenderView> {
        self.view.take()
    }

    /// Destroy the adaptor and drop every paint context.
    pub fn destroy(&mut self, remove_view: bool) -> RenderResult<()> {
        self.pipe.destroy()?;
        self.contexts.clear();
        if remove_view {
            self.view = None;
        }
        tracing::debug!("Renderer destroyed after {} frames", self.frame);
        Ok(())
    }

    pub fn view(&self) -> Option<&RenderView> {
        self.view.as_ref()
    }

    pub fn kind(&self) -> BackendKind {
        self.pipe.kind()
    }

    pub fn pipe(&self) -> &GraphicsPipe {
        &self.pipe
    }

    pub fn paint_contexts(&self) -> &PaintContextCache {
        &self.contexts
    }

    pub fn last_frame_stats(&self) -> BatchRenderStats {
        self.last_frame_stats
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use std::sync::Arc;
    use strata_test_utils::{EncoderCall, MockGpuEncoder};

    fn renderer() -> (Arc<MockGpuEncoder>, Renderer) {
        let encoder = Arc::new(MockGpuEncoder::new());
        let renderer = Renderer::from_backend(
            &RenderBackend::Modern(encoder.clone()),
            &RendererOptions::default(),
        )
        .unwrap();
        (encoder, renderer)
    }

    #[test]
    fn test_render_counts_frames() {
        let (_, mut renderer) = renderer();
        renderer.render(std::iter::empty()).unwrap();
        renderer.render(std::iter::empty()).unwrap();
        assert_eq!(renderer.frame_count(), 2);
        assert_eq!(renderer.kind(), BackendKind::Modern);
    }

    #[test]
    fn test_destroy_then_render_fails() {
        let (encoder, mut renderer) = renderer();
        renderer.destroy(true).unwrap();
        assert!(renderer.view().is_none());
        assert_eq!(
            encoder.count_where(|call| matches!(call, EncoderCall::DestroyProgram { .. })),
            1
        );
        assert!(matches!(
            renderer.render(std::iter::empty()),
            Err(RenderError::AdaptorDestroyed(_))
        ));
    }

    #[test]
    fn test_release_unknown_context_fails() {
        let (_, mut renderer) = renderer();
        assert_eq!(
            renderer.release_context(PaintContextId::new(9), true),
            Err(RenderError::UnknownPaintContext(PaintContextId::new(9)))
        );
    }

    #[test]
    fn test_physical_size_scales_with_resolution() {
        let view = RenderView {
            width: 100,
            height: 50,
            resolution: 2.0,
            background: Color::BLACK,
        };
        assert_eq!(view.physical_size(), (200, 100));
    }
}
