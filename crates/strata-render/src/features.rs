//! GPU feature flags reported by adapter probing.

use bitflags::bitflags;

bitflags! {
    /// Adapter features relevant to batched 2D drawing.
    ///
    /// Use `GpuFeatures::to_wgpu()` to convert to `wgpu::Features`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct GpuFeatures: u32 {
        /// Non-zero `first_instance` in indirect draws.
        const INDIRECT_FIRST_INSTANCE = 1 << 0;

        /// Push constants for small per-draw data.
        const PUSH_CONSTANTS = 1 << 1;

        /// Texture binding arrays, for larger texture batches.
        const TEXTURE_BINDING_ARRAY = 1 << 2;

        /// Partially bound binding arrays.
        const PARTIALLY_BOUND_BINDING_ARRAY = 1 << 3;

        /// Non-uniform indexing into sampled texture arrays.
        const SAMPLED_TEXTURE_AND_STORAGE_BUFFER_ARRAY_NON_UNIFORM_INDEXING = 1 << 4;

        /// 32-bit float texture filtering.
        const FLOAT32_FILTERABLE = 1 << 5;

        /// Timestamp queries for GPU profiling.
        const TIMESTAMP_QUERY = 1 << 6;
    }
}

const WGPU_MAPPING: &[(GpuFeatures, wgpu::Features)] = &[
    (
        GpuFeatures::INDIRECT_FIRST_INSTANCE,
        wgpu::Features::INDIRECT_FIRST_INSTANCE,
    ),
    (GpuFeatures::PUSH_CONSTANTS, wgpu::Features::PUSH_CONSTANTS),
    (
        GpuFeatures::TEXTURE_BINDING_ARRAY,
        wgpu::Features::TEXTURE_BINDING_ARRAY,
    ),
    (
        GpuFeatures::PARTIALLY_BOUND_BINDING_ARRAY,
        wgpu::Features::PARTIALLY_BOUND_BINDING_ARRAY,
    ),
    (
        GpuFeatures::SAMPLED_TEXTURE_AND_STORAGE_BUFFER_ARRAY_NON_UNIFORM_INDEXING,
        wgpu::Features::SAMPLED_TEXTURE_AND_STORAGE_BUFFER_ARRAY_NON_UNIFORM_INDEXING,
    ),
    (
        GpuFeatures::FLOAT32_FILTERABLE,
        wgpu::Features::FLOAT32_FILTERABLE,
    ),
    (GpuFeatures::TIMESTAMP_QUERY, wgpu::Features::TIMESTAMP_QUERY),
];

impl GpuFeatures {
    /// Convert to wgpu::Features.
    pub fn to_wgpu(self) -> wgpu::Features {
        WGPU_MAPPING
            .iter()
            .filter(|(ours, _)| self.contains(*ours))
            .fold(wgpu::Features::empty(), |acc, (_, theirs)| acc | *theirs)
    }

    /// Convert from wgpu::Features, dropping features not tracked here.
    pub fn from_wgpu(features: wgpu::Features) -> Self {
        WGPU_MAPPING
            .iter()
            .filter(|(_, theirs)| features.contains(*theirs))
            .fold(GpuFeatures::empty(), |acc, (ours, _)| acc | *ours)
    }

    /// Features in `self` that `available` lacks.
    pub fn missing_from(self, available: GpuFeatures) -> GpuFeatures {
        self - available
    }
}
