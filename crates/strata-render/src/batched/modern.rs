//! Modern-compute adaptor.
//!
//! Per-draw uniforms go through the [`UniformBatchAllocator`] so a frame's
//! uniform data reaches the GPU in a handful of buffer writes. Resource
//! binding groups compile once per program and slot and are reused across
//! frames.

use std::sync::Arc;

use strata_core::profiling::{profile_function, profile_scope};
use strata_test_utils::GpuEncoder;

use crate::backend::{BackendKind, RenderBackend};
use crate::bind_group::{BindGroupCache, ResourceBindingGroup, TextureBindGroupCache};
use crate::error::{RenderError, RenderResult};
use crate::globals::{GlobalUniformData, GlobalUniforms};
use crate::lifecycle::Lifecycle;
use crate::paint::PaintContextProvider;
use crate::pipe::{GraphicsRenderable, PipeState};
use crate::shader::{ShaderProgram, graphics_bits};
use crate::uniform::UniformGroup;
use crate::uniform_batch::{UniformBatchAllocator, UniformBatchConfig};

use super::traits::{
    GLOBAL_UNIFORM_SLOT, LOCAL_UNIFORM_SLOT, RendererBackendAdaptor, TEXTURE_SLOT,
    effective_blend, resolve_shader, write_local_uniforms,
};
use super::types::{BatchRenderStats, BatchTexture};

const NAME: &str = "modern graphics adaptor";

struct ModernState {
    shader: Arc<ShaderProgram>,
    local_uniforms: UniformGroup,
    globals: GlobalUniforms,
    global_binding: Option<Arc<ResourceBindingGroup>>,
    uniform_batch: UniformBatchAllocator,
    bind_groups: BindGroupCache,
    texture_groups: TextureBindGroupCache,
    /// Fills texture slots a batch leaves unused.
    placeholder: BatchTexture,
}

pub struct ModernGraphicsAdaptor {
    encoder: Arc<dyn GpuEncoder>,
    max_textures: usize,
    uniform_config: UniformBatchConfig,
    state: Lifecycle<ModernState>,
    frame_stats: BatchRenderStats,
}

impl ModernGraphicsAdaptor {
    pub fn new(
        encoder: Arc<dyn GpuEncoder>,
        max_textures: usize,
        uniform_config: UniformBatchConfig,
    ) -> Self {
        Self {
            encoder,
            max_textures,
            uniform_config,
            state: Lifecycle::Uninitialized,
            frame_stats: BatchRenderStats::default(),
        }
    }

    pub fn from_backend(
        backend: &RenderBackend,
        max_textures: usize,
        uniform_config: UniformBatchConfig,
    ) -> RenderResult<Self> {
        match backend {
            RenderBackend::Modern(encoder) => {
                Ok(Self::new(encoder.clone(), max_textures, uniform_config))
            }
            RenderBackend::Legacy(_) => Err(RenderError::BackendMismatch {
                adaptor: BackendKind::Modern,
                backend: BackendKind::Legacy,
            }),
        }
    }
}

impl RendererBackendAdaptor for ModernGraphicsAdaptor {
    fn kind(&self) -> BackendKind {
        BackendKind::Modern
    }

    fn init(&mut self) -> RenderResult<()> {
        if self.state.is_destroyed() {
            return Err(RenderError::AdaptorDestroyed(NAME));
        }

        let shader = ShaderProgram::compile_modern(
            self.encoder.as_ref(),
            "graphics",
            &graphics_bits(BackendKind::Modern, self.max_textures),
        );
        let placeholder = BatchTexture {
            texture: self.encoder.create_texture(1, 1, &[255; 4]),
            sampler: self.encoder.create_sampler(),
        };
        let previous = self.state.activate(ModernState {
            shader,
            local_uniforms: UniformGroup::local_template(),
            globals: GlobalUniforms::new(),
            global_binding: None,
            uniform_batch: UniformBatchAllocator::new(self.uniform_config),
            bind_groups: BindGroupCache::new(),
            texture_groups: TextureBindGroupCache::padded(self.max_textures.max(1), placeholder),
            placeholder,
        });

        if let Some(mut previous) = previous {
            tracing::warn!("{} initialised twice, releasing previous program", NAME);
            self.encoder.destroy_program(previous.shader.program());
            previous.uniform_batch.destroy(self.encoder.as_ref());
            self.encoder.destroy_texture(&previous.placeholder.texture);
            previous.bind_groups.clear(self.encoder.as_ref());
        }
        tracing::debug!("{} ready", NAME);
        Ok(())
    }

    fn begin_frame(&mut self, globals: &GlobalUniformData) -> RenderResult<()> {
        let encoder = self.encoder.as_ref();
        let state = self.state.get_mut(NAME)?;
        state.uniform_batch.begin_frame();
        state.globals.update(globals)?;
        state.global_binding = Some(state.uniform_batch.get_uniform_bind_group(
            encoder,
            state.globals.group(),
            true,
        )?);
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
        let shader = resolve_shader(&state.shader, renderable, BackendKind::Modern)?;
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
        encoder.set_pipeline_state(&data.geometry, program, &pipe.pipeline_state.to_raster_state());
        encoder.set_geometry(&data.geometry);
        stats.pipeline_state_sets += 1;

        // No binding means no frame is open: rewind and pack the globals.
        let global_binding = match &state.global_binding {
            Some(binding) => binding.clone(),
            None => {
                state.uniform_batch.begin_frame();
                let binding = state.uniform_batch.get_uniform_bind_group(
                    encoder,
                    state.globals.group(),
                    true,
                )?;
                state.global_binding = Some(binding.clone());
                binding
            }
        };
        let global_group =
            state
                .bind_groups
                .get_or_compile(encoder, &global_binding, program, GLOBAL_UNIFORM_SLOT);
        encoder.set_bind_group(GLOBAL_UNIFORM_SLOT, &global_group, program);

        let local_binding =
            state
                .uniform_batch
                .get_uniform_bind_group(encoder, &state.local_uniforms, true)?;
        let local_group =
            state
                .bind_groups
                .get_or_compile(encoder, &local_binding, program, LOCAL_UNIFORM_SLOT);
        encoder.set_bind_group(LOCAL_UNIFORM_SLOT, &local_group, program);
        stats.bind_group_switches += 2;
        stats.uniform_blocks_packed += 1;

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
                encoder.set_pipeline_state(&data.geometry, program, &batch_state.to_raster_state());
                stats.pipeline_state_sets += 1;
                current_blend = blend;
            }

            let group = batch.binding_group_or_init(&mut state.texture_groups);
            if bound_group != Some(group.uid()) {
                let compiled =
                    state
                        .bind_groups
                        .get_or_compile(encoder, group, program, TEXTURE_SLOT);
                encoder.set_bind_group(TEXTURE_SLOT, &compiled, program);
                bound_group = Some(group.uid());
                stats.bind_group_switches += 1;
            }

            encoder.draw_indexed(batch.size, 1, batch.start);
            stats.draw_calls += 1;
        }

        stats.texture_groups_created = (state.texture_groups.created() - created_before) as u32;
        stats.renderables = 1;
        self.frame_stats += stats;
        Ok(stats)
    }

    fn end_frame(&mut self) -> RenderResult<()> {
        let state = self.state.get_mut(NAME)?;
        state.uniform_batch.end_frame(self.encoder.as_ref());
        tracing::trace!(
            "Flushed {} uniform blocks across {} chunks",
            state.uniform_batch.blocks_packed(),
            state.uniform_batch.chunk_count()
        );
        state.global_binding = None;
        Ok(())
    }

    fn release_textures(&mut self, texture_ids: &[u64]) -> RenderResult<()> {
        let state = self.state.get_mut(NAME)?;
        for id in texture_ids {
            for uid in state.texture_groups.evict_texture(*id) {
                state.bind_groups.evict_group(self.encoder.as_ref(), uid);
            }
        }
        Ok(())
    }

    fn destroy(&mut self) -> RenderResult<()> {
        if self.state.is_destroyed() {
            return Err(RenderError::AdaptorDestroyed(NAME));
        }
        if let Some(mut state) = self.state.destroy() {
            let encoder = self.encoder.as_ref();
            encoder.destroy_program(state.shader.program());
            state.uniform_batch.destroy(encoder);
            encoder.destroy_texture(&state.placeholder.texture);
            state.bind_groups.clear(encoder);
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
