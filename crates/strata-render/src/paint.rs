//! Paint contexts: the cached, transform-independent form of a drawable.
//!
//! A paint context is tessellated once into shared geometry plus a list of
//! [`BatchablePrimitive`]s. The batcher folds those into an
//! [`InstructionList`] that adaptors execute every frame with the
//! renderable's current transform and color.

use std::sync::atomic::{AtomicU64, Ordering};

use ahash::HashMap;
use strata_core::profiling::profile_function;
use strata_test_utils::GpuGeometry;

use crate::batched::{BatchTexture, InstructionList, build_instructions};
use crate::blend::BlendMode;
use crate::error::{RenderError, RenderResult};

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a paint context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PaintContextId(u64);

impl PaintContextId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// A fresh process-unique id.
    pub fn unique() -> Self {
        Self(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub const fn raw(&self) -> u64 {
        self.0
    }
}

/// One tessellated fill or stroke inside the shared geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchablePrimitive {
    /// First index in the shared index buffer.
    pub start: u32,
    /// Number of indices.
    pub size: u32,
    pub texture: Option<BatchTexture>,
    pub blend_mode: BlendMode,
}

/// Batching view of a paint context.
#[derive(Debug, Clone, Default)]
pub struct GpuPaintContext {
    pub batches: Vec<BatchablePrimitive>,
}

/// Geometry and the instructions built from it in the same pass.
#[derive(Debug)]
pub struct ContextRenderData {
    pub geometry: GpuGeometry,
    pub instructions: InstructionList,
}

/// Lookup of paint contexts by id, as adaptors see it.
pub trait PaintContextProvider {
    fn gpu_context(&self, id: PaintContextId) -> Option<&GpuPaintContext>;

    fn render_data_mut(&mut self, id: PaintContextId) -> Option<&mut ContextRenderData>;
}

struct CachedContext {
    gpu: GpuPaintContext,
    render: ContextRenderData,
}

/// Owns the GPU-side state of every live paint context.
pub struct PaintContextCache {
    contexts: HashMap<PaintContextId, CachedContext>,
    max_textures: usize,
}

impl PaintContextCache {
    pub fn new(max_textures: usize) -> Self {
        Self {
            contexts: HashMap::default(),
            max_textures,
        }
    }

    /// Replace a context's geometry and primitives and rebatch.
    ///
    /// An existing context keeps its instruction storage; every batch is
    /// rebuilt, so cached texture binding groups are dropped.
    pub fn update(
        &mut self,
        id: PaintContextId,
        geometry: GpuGeometry,
        primitives: Vec<BatchablePrimitive>,
    ) -> RenderResult<()> {
        profile_function!();
        let max_textures = self.max_textures;
        let cached = self.contexts.entry(id).or_insert_with(|| CachedContext {
            gpu: GpuPaintContext::default(),
            render: ContextRenderData {
                geometry,
                instructions: InstructionList::new(),
            },
        });

        build_instructions(&primitives, max_textures, &mut cached.render.instructions)?;
        cached.render.geometry = geometry;
        cached.gpu.batches = primitives;

        tracing::trace!(
            "Rebuilt paint context {:?}: {} primitives into {} batches",
            id,
            cached.gpu.batches.len(),
            cached.render.instructions.instruction_size()
        );
        Ok(())
    }

    /// Forget a context, returning the ids of the textures it referenced.
    pub fn remove(&mut self, id: PaintContextId) -> RenderResult<Vec<u64>> {
        let cached = self
            .contexts
            .remove(&id)
            .ok_or(RenderError::UnknownPaintContext(id))?;

        let mut texture_ids: Vec<u64> = cached
            .gpu
            .batches
            .iter()
            .filter_map(|primitive| primitive.texture.map(|t| t.texture.id()))
            .collect();
        texture_ids.sort_unstable();
        texture_ids.dedup();
        Ok(texture_ids)
    }

    pub fn contains(&self, id: PaintContextId) -> bool {
        self.contexts.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    pub fn clear(&mut self) {
        self.contexts.clear();
    }

    pub fn render_data(&self, id: PaintContextId) -> Option<&ContextRenderData> {
        self.contexts.get(&id).map(|cached| &cached.render)
    }
}

impl PaintContextProvider for PaintContextCache {
    fn gpu_context(&self, id: PaintContextId) -> Option<&GpuPaintContext> {
        self.contexts.get(&id).map(|cached| &cached.gpu)
    }

    fn render_data_mut(&mut self, id: PaintContextId) -> Option<&mut ContextRenderData> {
        self.contexts.get_mut(&id).map(|cached| &mut cached.render)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batched::MAX_BATCH_TEXTURES;
    use strata_test_utils::{GpuSampler, GpuTexture};

    fn primitive(start: u32, size: u32, texture: Option<u64>) -> BatchablePrimitive {
        BatchablePrimitive {
            start,
            size,
            texture: texture.map(|id| BatchTexture {
                texture: GpuTexture::new(id, 8, 8),
                sampler: GpuSampler::new(1),
            }),
            blend_mode: BlendMode::Normal,
        }
    }

    #[test]
    fn test_update_and_rebuild_reuses_storage() {
        let mut cache = PaintContextCache::new(MAX_BATCH_TEXTURES);
        let id = PaintContextId::unique();

        cache
            .update(
                id,
                GpuGeometry::new(1, 12),
                vec![primitive(0, 6, None), primitive(6, 6, None)],
            )
            .unwrap();
        assert_eq!(cache.render_data(id).unwrap().instructions.instruction_size(), 1);

        cache
            .update(id, GpuGeometry::new(1, 3), vec![primitive(0, 3, Some(7))])
            .unwrap();
        let data = cache.render_data(id).unwrap();
        assert_eq!(data.geometry.index_count(), 3);
        assert_eq!(data.instructions.instruction_size(), 1);
        assert_eq!(data.instructions.capacity(), 1);
    }

    #[test]
    fn test_remove_reports_textures() {
        let mut cache = PaintContextCache::new(MAX_BATCH_TEXTURES);
        let id = PaintContextId::unique();
        cache
            .update(
                id,
                GpuGeometry::new(1, 9),
                vec![
                    primitive(0, 3, Some(5)),
                    primitive(3, 3, Some(2)),
                    primitive(6, 3, Some(5)),
                ],
            )
            .unwrap();

        assert_eq!(cache.remove(id), Ok(vec![2, 5]));
        assert!(!cache.contains(id));
        assert_eq!(cache.remove(id), Err(RenderError::UnknownPaintContext(id)));
    }

    #[test]
    fn test_provider_lookup() {
        let mut cache = PaintContextCache::new(MAX_BATCH_TEXTURES);
        let id = PaintContextId::unique();
        cache.update(id, GpuGeometry::new(1, 0), Vec::new()).unwrap();

        assert!(cache.gpu_context(id).unwrap().batches.is_empty());
        assert!(cache.render_data_mut(id).is_some());
        assert!(cache.gpu_context(PaintContextId::new(u64::MAX)).is_none());
    }
}
