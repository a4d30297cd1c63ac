//! Legacy-rasterizer adaptor.
//!
//! Binds uniforms by value and textures to units right before each draw.
//! Nothing is batched across renderables.

use std::sync::Arc;

use strata_core::profiling::{profile_function, profile_scope};
use strata_test_utils::{GlEncoder, GpuTexture};

use crate::backend::{BackendKind, RenderBackend};
use crate::bind_group::TextureBindGroupCache;
use crate::error::{RenderError, RenderResult};
use crate::globals::{GlobalUniformData, GlobalUniforms};
use crate::lifecycle::Lifecycle;
use crate::paint::PaintContextProvider;
use crate::pipe::{GraphicsRenderable, PipeState};
use crate::shader::{ShaderProgram, graphics_bits};
use crate::uniform::UniformGroup;

use super::traits::{
    GLOBAL_UNIFORM_SLOT, LOCAL_UNIFORM_SLOT, RendererBackendAdaptor, TEXTURE_SLOT,
    effective_blend, resolve_shader, write_local_uniforms,
};
use super::types::BatchRenderStats;

const NAME: &str = "legacy graphics adaptor";

struct LegacyState {
    shader: Arc<ShaderProgram>,
    local_uniforms: UniformGroup,
    globals: GlobalUniforms,
    global_bytes: Vec<u8>,
    local_bytes: Vec<u8>,
    texture_groups: TextureBindGroupCache,
    bound_textures: Vec<GpuTexture>,
}

pub struct LegacyGraphicsAdaptor {
    encoder: Arc<dyn GlEncoder>,
    max_textures: usize,
    state: Lifecycle<LegacyState>,
    frame_stats: BatchRenderStats,
}

impl LegacyGraphicsAdaptor {
    pub fn new(encoder: Arc<dyn GlEncoder>, max_textures: usize) -> Self {
        Self {
            encoder,
            max_textures,
            state: Lifecycle::Uninitialized,
            frame_stats: BatchRenderStats::default(),
        }
    }

    pub fn from_backend(backend: &RenderBackend, max_textures: usize) -> RenderResult<Self> {
        match backend {
            RenderBackend::Legacy(encoder) => Ok(Self::new(encoder.clone(), max_textures)),
            RenderBackend::Modern(_) => Err(RenderError::BackendMismatch {
                adaptor: BackendKind::Legacy,
                backend: BackendKind::Modern,
            }),
        }
    }
}

impl RendererBackendAdaptor for LegacyGraphicsAdaptor {
    fn kind(&self) -> BackendKind {
        BackendKind::Legacy
    }

    fn init(&mut self) -> RenderResult<()> {
        if self.state.is_destroyed() {
            return Err(RenderError::AdaptorDestroyed(NAME));
        }

        let shader = ShaderProgram::compile_legacy(
            self.encoder.as_ref(),
            "graphics",
            &graphics_bits(BackendKind::Legacy, self.max_textures),
        );
        let globals = GlobalUniforms::new();
        let global_bytes = globals.group().to_std140_bytes();
        let previous = self.state.activate(LegacyState {
            shader,
            local_uniforms: UniformGroup::local_template(),
            globals,
            global_bytes,
            local_bytes: Vec::new(),
            texture_groups: TextureBindGroupCache::new(),
            bound_textures: Vec::with_capacity(self.max_textures),
        });

        if let Some(previous) = previous {
            tracing::warn!("{} initialised twice, releasing previous program", NAME);
            self.encoder.delete_program(previous.shader.program());
        }
        tracing::debug!("{} ready", NAME);
        Ok(())
    }

    fn begin_frame(&mut self, globals: &GlobalUniformData) -> RenderResult<()> {
        let state = self.state.get_mut(NAME)?;
        state.globals.update(globals)?;
        state.global_bytes.clear();
        state.globals.group().write_std140(&mut state.global_bytes);
        self.frame_stats = BatchRenderStats::default();
        Ok(())
    }

    fn execute(
        &mut self,
        pipe: &mut PipeState,
        renderable: &GraphicsRenderable,
        contexts: &mut dyn PaintContextProvider,
    ) -> RenderResult<BatchRenderStats> {
        profile_function!();
        let encoder = self.encoder.as_ref();
        let state = self.state.get_mut(NAME)?;
        let shader = resolve_shader(&state.shader, renderable, BackendKind::Legacy)?;
        let mut stats = BatchRenderStats::default();

        let batch_count = contexts
            .gpu_context(renderable.context)
            .ok_or(RenderError::UnknownPaintContext(renderable.context))?
            .batches
            .len();
        let data = contexts
            .render_data_mut(renderable.context)
            .ok_or(RenderError::UnknownPaintContext(renderable.context))?;

        if batch_count == 0 || !data.instructions.has_draws() {
            tracing::trace!("Skipping empty paint context {:?}", renderable.context);
            stats.empty_skips = 1;
            self.frame_stats += stats;
            return Ok(stats);
        }
        data.instructions
            .validate(data.geometry.index_count(), self.max_textures)?;

        pipe.pipeline_state.blend_mode = renderable.blend_mode;
        write_local_uniforms(&mut state.local_uniforms, renderable, pipe.round_pixels)?;

        let program = shader.program();
        encoder.use_program(program);
        encoder.set_raster_state(&pipe.pipeline_state.to_raster_state());
        encoder.bind_geometry(&data.geometry, program);
        stats.pipeline_state_sets += 1;

        encoder.upload_uniforms(GLOBAL_UNIFORM_SLOT, &state.global_bytes, program);
        state.local_bytes.clear();
        state.local_uniforms.write_std140(&mut state.local_bytes);
        encoder.upload_uniforms(LOCAL_UNIFORM_SLOT, &state.local_bytes, program);
        stats.bind_group_switches += 2;

        let created_before = state.texture_groups.created();
        let mut current_blend = renderable.blend_mode;
        let mut bound_group = None;

        profile_scope!("draw_batches");
        for batch in data.instructions.active_mut() {
            if batch.size == 0 {
                continue;
            }

            let blend = effective_blend(renderable.blend_mode, batch.blend_mode);
            if blend != current_blend {
                let mut batch_state = pipe.pipeline_state;
                batch_state.blend_mode = blend;
                encoder.set_raster_state(&batch_state.to_raster_state());
                stats.pipeline_state_sets += 1;
                current_blend = blend;
            }

            let group = batch.binding_group_or_init(&mut state.texture_groups);
            if bound_group != Some(group.uid()) {
                state.bound_textures.clear();
                state.bound_textures.extend(group.textures());
                encoder.bind_textures(TEXTURE_SLOT, &state.bound_textures, program);
                bound_group = Some(group.uid());
                stats.bind_group_switches += 1;
            }

            encoder.draw_elements(batch.size, batch.start);
            stats.draw_calls += 1;
        }

        stats.texture_groups_created = (state.texture_groups.created() - created_before) as u32;
        stats.renderables = 1;
        self.frame_stats += stats;
        Ok(stats)
    }

    fn end_frame(&mut self) -> RenderResult<()> {
        self.state.get(NAME)?;
        Ok(())
    }

    fn release_textures(&mut self, texture_ids: &[u64]) -> RenderResult<()> {
        let state = self.state.get_mut(NAME)?;
        for id in texture_ids {
            state.texture_groups.evict_texture(*id);
        }
        Ok(())
    }

    fn destroy(&mut self) -> RenderResult<()> {
        if self.state.is_destroyed() {
            return Err(RenderError::AdaptorDestroyed(NAME));
        }
        if let Some(mut state) = self.state.destroy() {
            self.encoder.delete_program(state.shader.program());
            state.texture_groups.clear();
        }
        tracing::debug!("{} destroyed", NAME);
        Ok(())
    }

    fn stats(&self) -> BatchRenderStats {
        self.frame_stats
    }

    fn is_active(&self) -> bool {
        self.state.is_active()
    }

    fn default_shader(&self) -> RenderResult<Arc<ShaderProgram>> {
        Ok(self.state.get(NAME)?.shader.clone())
    }
}
