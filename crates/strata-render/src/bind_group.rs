//! Resource binding groups and the caches that keep them unique.
//!
//! A [`ResourceBindingGroup`] is the backend-agnostic description of what is
//! bound at one slot. The modern backend compiles it into a [`GpuBindGroup`]
//! once per `(group, program, slot)` through [`BindGroupCache`]; the legacy
//! backend binds the listed resources directly.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use ahash::HashMap;
use strata_test_utils::{BindingResource, GpuBindGroup, GpuEncoder, GpuProgram, GpuTexture};

use crate::batched::{BatchTexture, TextureBatch};

static NEXT_BINDING_UID: AtomicU64 = AtomicU64::new(1);

/// An immutable, ordered bundle of resources for one bind slot.
///
/// Identity is the process-unique [`uid`](Self::uid), not the resource list:
/// two groups with equal resources are still distinct cache entries.
#[derive(Debug)]
pub struct ResourceBindingGroup {
    uid: u64,
    resources: Vec<BindingResource>,
}

impl ResourceBindingGroup {
    pub fn new(resources: Vec<BindingResource>) -> Self {
        Self {
            uid: NEXT_BINDING_UID.fetch_add(1, Ordering::Relaxed),
            resources,
        }
    }

    pub fn uid(&self) -> u64 {
        self.uid
    }

    pub fn resources(&self) -> &[BindingResource] {
        &self.resources
    }

    /// Textures in binding order.
    pub fn textures(&self) -> impl Iterator<Item = GpuTexture> + '_ {
        self.resources.iter().filter_map(|resource| match resource {
            BindingResource::Texture(texture) => Some(*texture),
            _ => None,
        })
    }
}

/// Shares one binding group across every batch with the same ordered
/// texture set.
///
/// A padded cache fills the unused slots with a placeholder so every group
/// matches a layout declaring a fixed number of texture/sampler pairs.
#[derive(Debug, Default)]
pub struct TextureBindGroupCache {
    groups: HashMap<Vec<BatchTexture>, Arc<ResourceBindingGroup>>,
    padding: Option<(usize, BatchTexture)>,
    created: u64,
}

impl TextureBindGroupCache {
    /// A cache whose groups hold only the textures a batch uses.
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache whose groups always hold `slots` texture/sampler pairs.
    pub fn padded(slots: usize, placeholder: BatchTexture) -> Self {
        Self {
            padding: Some((slots, placeholder)),
            ..Self::default()
        }
    }

    /// Fetch the group for `textures`, building it on first request.
    pub fn get_or_create(&mut self, textures: &TextureBatch) -> Arc<ResourceBindingGroup> {
        let mut key = textures.as_slice().to_vec();
        if let Some((slots, placeholder)) = self.padding
            && key.len() < slots
        {
            key.resize(slots, placeholder);
        }
        if let Some(group) = self.groups.get(&key) {
            return group.clone();
        }

        let resources = key
            .iter()
            .flat_map(|slot| {
                [
                    BindingResource::Texture(slot.texture),
                    BindingResource::Sampler(slot.sampler),
                ]
            })
            .collect();
        let group = Arc::new(ResourceBindingGroup::new(resources));
        self.created += 1;
        tracing::trace!(
            "Built texture binding group {} for {} textures",
            group.uid(),
            textures.len()
        );
        self.groups.insert(key, group.clone());
        group
    }

    /// Drop every group that binds `texture_id`, returning their uids.
    pub fn evict_texture(&mut self, texture_id: u64) -> Vec<u64> {
        let mut evicted = Vec::new();
        self.groups.retain(|key, group| {
            let keep = !key.iter().any(|slot| slot.texture.id() == texture_id);
            if !keep {
                evicted.push(group.uid());
            }
            keep
        });
        evicted
    }

    /// Total groups built since creation.
    pub fn created(&self) -> u64 {
        self.created
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn clear(&mut self) {
        self.groups.clear();
    }
}

/// Compiled bind groups keyed by `(group uid, program id, slot)`.
///
/// Entries live until evicted or cleared.
#[derive(Debug, Default)]
pub struct BindGroupCache {
    compiled: HashMap<(u64, u64, u32), GpuBindGroup>,
}

impl BindGroupCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compile(
        &mut self,
        encoder: &dyn GpuEncoder,
        group: &ResourceBindingGroup,
        program: &GpuProgram,
        slot: u32,
    ) -> GpuBindGroup {
        *self
            .compiled
            .entry((group.uid(), program.id(), slot))
            .or_insert_with(|| encoder.create_bind_group(program, slot, group.resources()))
    }

    /// Release every compiled handle built from `group_uid`.
    pub fn evict_group(&mut self, encoder: &dyn GpuEncoder, group_uid: u64) {
        self.compiled.retain(|(uid, _, _), compiled| {
            let keep = *uid != group_uid;
            if !keep {
                encoder.destroy_bind_group(compiled);
            }
            keep
        });
    }

    pub fn len(&self) -> usize {
        self.compiled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }

    /// Release every compiled handle.
    pub fn clear(&mut self, encoder: &dyn GpuEncoder) {
        for (_, compiled) in self.compiled.drain() {
            encoder.destroy_bind_group(&compiled);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_test_utils::{EncoderCall, GpuSampler, MockGpuEncoder};

    fn slot(texture: u64) -> BatchTexture {
        BatchTexture {
            texture: GpuTexture::new(texture, 4, 4),
            sampler: GpuSampler::new(100),
        }
    }

    #[test]
    fn test_texture_groups_are_shared() {
        let mut cache = TextureBindGroupCache::new();
        let set = TextureBatch::from_slice(&[slot(1), slot(2)]).unwrap();

        let a = cache.get_or_create(&set);
        let b = cache.get_or_create(&set.clone());
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.created(), 1);
        assert_eq!(a.textures().map(|t| t.id()).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_texture_order_matters() {
        let mut cache = TextureBindGroupCache::new();
        let ab = TextureBatch::from_slice(&[slot(1), slot(2)]).unwrap();
        let ba = TextureBatch::from_slice(&[slot(2), slot(1)]).unwrap();

        let a = cache.get_or_create(&ab);
        let b = cache.get_or_create(&ba);
        assert_ne!(a.uid(), b.uid());
    }

    #[test]
    fn test_padded_groups_fill_every_slot() {
        let placeholder = BatchTexture {
            texture: GpuTexture::new(50, 1, 1),
            sampler: GpuSampler::new(51),
        };
        let mut cache = TextureBindGroupCache::padded(4, placeholder);

        let empty = cache.get_or_create(&TextureBatch::new());
        assert_eq!(empty.resources().len(), 8);
        assert!(empty.textures().all(|t| t == placeholder.texture));

        let one = cache.get_or_create(&TextureBatch::from_slice(&[slot(1)]).unwrap());
        assert_eq!(one.resources().len(), 8);
        assert_eq!(
            one.textures().map(|t| t.id()).collect::<Vec<_>>(),
            vec![1, 50, 50, 50]
        );
        assert_eq!(
            one.resources()[1],
            BindingResource::Sampler(GpuSampler::new(100))
        );

        // A set that already names the placeholder shares the padded group.
        let explicit = TextureBatch::from_slice(&[slot(1), placeholder]).unwrap();
        assert!(Arc::ptr_eq(&one, &cache.get_or_create(&explicit)));
        assert_eq!(cache.created(), 2);
    }

    #[test]
    fn test_evict_texture() {
        let mut cache = TextureBindGroupCache::new();
        let with = TextureBatch::from_slice(&[slot(1), slot(2)]).unwrap();
        let without = TextureBatch::from_slice(&[slot(3)]).unwrap();
        let evicted_group = cache.get_or_create(&with);
        cache.get_or_create(&without);

        assert_eq!(cache.evict_texture(2), vec![evicted_group.uid()]);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_compiled_cache_hits() {
        let encoder = MockGpuEncoder::new();
        let mut cache = BindGroupCache::new();
        let group = ResourceBindingGroup::new(vec![]);
        let program = GpuProgram::new(9);

        let first = cache.get_or_compile(&encoder, &group, &program, 1);
        let second = cache.get_or_compile(&encoder, &group, &program, 1);
        assert_eq!(first, second);
        assert_eq!(encoder.count_bind_group_creates(), 1);

        cache.get_or_compile(&encoder, &group, &program, 2);
        assert_eq!(encoder.count_bind_group_creates(), 2);

        let other = ResourceBindingGroup::new(vec![]);
        cache.get_or_compile(&encoder, &other, &program, 1);

        cache.evict_group(&encoder, group.uid());
        assert_eq!(cache.len(), 1);
        assert_eq!(
            encoder.count_where(|call| matches!(call, EncoderCall::DestroyBindGroup { .. })),
            2
        );

        cache.clear(&encoder);
        assert!(cache.is_empty());
        assert_eq!(
            encoder.count_where(|call| matches!(call, EncoderCall::DestroyBindGroup { .. })),
            3
        );
    }
}
