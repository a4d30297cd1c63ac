//! Opaque GPU handles shared by both backend APIs.
//!
//! Handles are minted by whichever encoder implementation created the
//! resource and are only meaningful to that encoder. They are plain `Copy`
//! ids, so caches can key on them without holding borrows of the device.

/// A GPU buffer handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpuBuffer {
    id: u64,
    size: u64,
}

impl GpuBuffer {
    pub const fn new(id: u64, size: u64) -> Self {
        Self { id, size }
    }

    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Size of the buffer in bytes.
    pub const fn size(&self) -> u64 {
        self.size
    }
}

/// A sampled texture handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpuTexture {
    id: u64,
    width: u32,
    height: u32,
}

impl GpuTexture {
    pub const fn new(id: u64, width: u32, height: u32) -> Self {
        Self { id, width, height }
    }

    pub const fn id(&self) -> u64 {
        self.id
    }

    pub const fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// A texture sampler handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpuSampler {
    id: u64,
}

impl GpuSampler {
    pub const fn new(id: u64) -> Self {
        Self { id }
    }

    pub const fn id(&self) -> u64 {
        self.id
    }
}

/// A compiled (linked) shader program handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpuProgram {
    id: u64,
}

impl GpuProgram {
    pub const fn new(id: u64) -> Self {
        Self { id }
    }

    pub const fn id(&self) -> u64 {
        self.id
    }
}

/// A backend-compiled bind group handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpuBindGroup {
    id: u64,
}

impl GpuBindGroup {
    pub const fn new(id: u64) -> Self {
        Self { id }
    }

    pub const fn id(&self) -> u64 {
        self.id
    }
}

/// Shared vertex + index geometry uploaded for one paint context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpuGeometry {
    id: u64,
    index_count: u32,
}

impl GpuGeometry {
    pub const fn new(id: u64, index_count: u32) -> Self {
        Self { id, index_count }
    }

    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Number of indices in the geometry's index buffer.
    pub const fn index_count(&self) -> u32 {
        self.index_count
    }
}

/// One GPU-visible resource inside a bind group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingResource {
    /// A byte range of a buffer.
    Buffer {
        buffer: GpuBuffer,
        offset: u64,
        size: u64,
    },
    Texture(GpuTexture),
    Sampler(GpuSampler),
}

/// Fixed-function raster state applied before drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RasterState {
    /// `None` disables blending.
    pub blend: Option<wgpu::BlendState>,
    pub cull_mode: Option<wgpu::Face>,
    pub front_face: wgpu::FrontFace,
}

/// Source for a program assembled from shader bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramDescriptor {
    pub label: String,
    pub vertex_source: String,
    pub fragment_source: String,
}
