//! Core types for batched draw execution.

use std::sync::Arc;

use strata_test_utils::{GpuSampler, GpuTexture};

use crate::bind_group::{ResourceBindingGroup, TextureBindGroupCache};
use crate::blend::BlendMode;
use crate::error::{RenderError, RenderResult};

/// Maximum number of textures one batch can bind.
pub const MAX_BATCH_TEXTURES: usize = 16;

/// A texture and the sampler it is read with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BatchTexture {
    pub texture: GpuTexture,
    pub sampler: GpuSampler,
}

/// Ordered set of at most [`MAX_BATCH_TEXTURES`] textures.
///
/// Order is binding order, so `[a, b]` and `[b, a]` are different sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TextureBatch {
    textures: Vec<BatchTexture>,
}

impl TextureBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_slice(textures: &[BatchTexture]) -> RenderResult<Self> {
        let mut batch = Self::new();
        for texture in textures {
            batch.insert(*texture)?;
        }
        Ok(batch)
    }

    /// Add `texture` unless already present, returning its slot index.
    pub fn insert(&mut self, texture: BatchTexture) -> RenderResult<usize> {
        if let Some(index) = self.index_of(&texture) {
            return Ok(index);
        }
        if self.textures.len() == MAX_BATCH_TEXTURES {
            return Err(RenderError::TooManyTextures {
                count: self.textures.len() + 1,
                max: MAX_BATCH_TEXTURES,
            });
        }
        self.textures.push(texture);
        Ok(self.textures.len() - 1)
    }

    pub fn index_of(&self, texture: &BatchTexture) -> Option<usize> {
        self.textures.iter().position(|t| t == texture)
    }

    pub fn contains(&self, texture: &BatchTexture) -> bool {
        self.index_of(texture).is_some()
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    pub fn clear(&mut self) {
        self.textures.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BatchTexture> {
        self.textures.iter()
    }

    pub fn as_slice(&self) -> &[BatchTexture] {
        &self.textures
    }
}

/// One contiguous run of indices drawn with a single texture set and blend
/// mode.
///
/// The texture binding group is resolved lazily on first execute and reused
/// until the batch is rebuilt. Resolution needs `&mut self`, so two threads
/// can never race on it; sharing batches across threads would need a lock
/// around first use.
#[derive(Debug, Clone, Default)]
pub struct DrawBatch {
    /// First index in the shared index buffer.
    pub start: u32,
    /// Number of indices.
    pub size: u32,
    pub textures: TextureBatch,
    /// `Normal` inherits the renderable's blend mode.
    pub blend_mode: BlendMode,
    binding_group: Option<Arc<ResourceBindingGroup>>,
}

impl DrawBatch {
    pub fn new(start: u32, size: u32, textures: TextureBatch, blend_mode: BlendMode) -> Self {
        Self {
            start,
            size,
            textures,
            blend_mode,
            binding_group: None,
        }
    }

    /// One past the last index, widened so it cannot overflow.
    pub fn end(&self) -> u64 {
        self.start as u64 + self.size as u64
    }

    /// The cached texture binding group, if resolved.
    pub fn binding_group(&self) -> Option<&Arc<ResourceBindingGroup>> {
        self.binding_group.as_ref()
    }

    /// Resolve the texture binding group, consulting `cache` only the first
    /// time.
    pub fn binding_group_or_init(
        &mut self,
        cache: &mut TextureBindGroupCache,
    ) -> &Arc<ResourceBindingGroup> {
        self.binding_group
            .get_or_insert_with(|| cache.get_or_create(&self.textures))
    }

    /// Clear contents for reuse by a rebuild.
    pub(crate) fn reset(&mut self) {
        self.start = 0;
        self.size = 0;
        self.textures.clear();
        self.blend_mode = BlendMode::Normal;
        self.binding_group = None;
    }
}

/// Draw batches for one paint context.
///
/// Only the first [`instruction_size`](Self::instruction_size) entries are
/// live. Rebuilding reuses the backing storage.
#[derive(Debug, Default)]
pub struct InstructionList {
    instructions: Vec<DrawBatch>,
    instruction_size: usize,
}

impl InstructionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a rebuild. Storage is kept.
    pub fn reset(&mut self) {
        self.instruction_size = 0;
    }

    /// Claim the next slot, reusing a stale entry where possible.
    pub fn next_slot(&mut self) -> &mut DrawBatch {
        if self.instruction_size == self.instructions.len() {
            self.instructions.push(DrawBatch::default());
        }
        let batch = &mut self.instructions[self.instruction_size];
        batch.reset();
        self.instruction_size += 1;
        batch
    }

    pub fn add(&mut self, batch: DrawBatch) {
        *self.next_slot() = batch;
    }

    pub fn last_mut(&mut self) -> Option<&mut DrawBatch> {
        self.active_mut().last_mut()
    }

    pub fn active(&self) -> &[DrawBatch] {
        &self.instructions[..self.instruction_size]
    }

    pub fn active_mut(&mut self) -> &mut [DrawBatch] {
        &mut self.instructions[..self.instruction_size]
    }

    pub fn instruction_size(&self) -> usize {
        self.instruction_size
    }

    /// Whether any live batch has indices to draw.
    pub fn has_draws(&self) -> bool {
        self.active().iter().any(|batch| batch.size > 0)
    }

    /// Entries allocated, live or not.
    pub fn capacity(&self) -> usize {
        self.instructions.len()
    }

    /// Check every live batch against the geometry and texture limits.
    pub fn validate(&self, index_count: u32, max_textures: usize) -> RenderResult<()> {
        for (batch_index, batch) in self.active().iter().enumerate() {
            if batch.end() > index_count as u64 {
                return Err(RenderError::BatchOutOfBounds {
                    batch: batch_index,
                    start: batch.start,
                    size: batch.size,
                    index_count,
                });
            }
            if batch.textures.len() > max_textures {
                return Err(RenderError::TooManyTextures {
                    count: batch.textures.len(),
                    max: max_textures,
                });
            }
        }
        Ok(())
    }
}

/// Rendering statistics for one execute call or a whole frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchRenderStats {
    /// Renderables that reached the draw loop.
    pub renderables: u32,
    /// Renderables skipped because they had nothing to draw.
    pub empty_skips: u32,
    /// Number of GPU draw calls issued.
    pub draw_calls: u32,
    /// Number of bind group (or uniform/texture binding) switches.
    pub bind_group_switches: u32,
    /// Number of pipeline/raster state sets.
    pub pipeline_state_sets: u32,
    /// Texture binding groups constructed.
    pub texture_groups_created: u32,
    /// Uniform blocks copied into the batch buffers.
    pub uniform_blocks_packed: u32,
}

impl std::ops::AddAssign for BatchRenderStats {
    fn add_assign(&mut self, other: Self) {
        self.renderables += other.renderables;
        self.empty_skips += other.empty_skips;
        self.draw_calls += other.draw_calls;
        self.bind_group_switches += other.bind_group_switches;
        self.pipeline_state_sets += other.pipeline_state_sets;
        self.texture_groups_created += other.texture_groups_created;
        self.uniform_blocks_packed += other.uniform_blocks_packed;
    }
}
