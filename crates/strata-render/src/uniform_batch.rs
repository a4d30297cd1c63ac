//! Packs per-draw uniform blocks into a few large uniform buffers.
//!
//! Every call to [`UniformBatchAllocator::get_uniform_bind_group`] copies the
//! group's current values into CPU staging at the next aligned offset of the
//! current chunk and hands back a binding group addressing that range. At
//! [`end_frame`](UniformBatchAllocator::end_frame) each used chunk is uploaded
//! with a single `write_buffer`. The cursor only rewinds in
//! [`begin_frame`](UniformBatchAllocator::begin_frame).
//!
//! ```ignore
//! allocator.begin_frame();
//! for draw in draws {
//!     locals.set("uColor", draw.color)?;
//!     let group = allocator.get_uniform_bind_group(encoder, &locals, true)?;
//!     // bind `group` at slot 2
//! }
//! allocator.end_frame(encoder);
//! ```

use std::sync::Arc;

use ahash::HashMap;
use strata_core::profiling::profile_function;
use strata_test_utils::{BindingResource, GpuBuffer, GpuEncoder};

use crate::bind_group::ResourceBindingGroup;
use crate::capability::{AdapterReport, DEFAULT_UNIFORM_ALIGNMENT};
use crate::error::{RenderError, RenderResult};
use crate::uniform::UniformGroup;

/// Sizing of the uniform chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformBatchConfig {
    /// Size of each uniform buffer in bytes.
    pub chunk_size: u64,
    /// Offset alignment between blocks, a power of two.
    pub alignment: u64,
}

impl Default for UniformBatchConfig {
    fn default() -> Self {
        Self {
            chunk_size: 64 * 1024,
            alignment: DEFAULT_UNIFORM_ALIGNMENT as u64,
        }
    }
}

impl UniformBatchConfig {
    /// Match the adapter's offset alignment and binding size limit.
    pub fn from_report(report: &AdapterReport) -> Self {
        let defaults = Self::default();
        Self {
            chunk_size: defaults
                .chunk_size
                .min(report.max_uniform_binding_size as u64),
            alignment: (report.uniform_offset_alignment as u64).max(1),
        }
    }
}

struct UniformChunk {
    buffer: GpuBuffer,
    staging: Vec<u8>,
    cursor: u64,
}

struct PackedBlock {
    dirty_id: u64,
    binding: Arc<ResourceBindingGroup>,
}

/// Batched uniform block allocator.
pub struct UniformBatchAllocator {
    config: UniformBatchConfig,
    chunks: Vec<UniformChunk>,
    current: usize,
    /// Binding groups per `(chunk, offset, size)`, kept across frames.
    bindings: HashMap<(usize, u64, u64), Arc<ResourceBindingGroup>>,
    /// Last packing of each group this frame, by group uid.
    packed: HashMap<u64, PackedBlock>,
    scratch: Vec<u8>,
    blocks_packed: u32,
}

impl UniformBatchAllocator {
    pub fn new(config: UniformBatchConfig) -> Self {
        Self {
            config,
            chunks: Vec::new(),
            current: 0,
            bindings: HashMap::default(),
            packed: HashMap::default(),
            scratch: Vec::new(),
            blocks_packed: 0,
        }
    }

    pub fn config(&self) -> &UniformBatchConfig {
        &self.config
    }

    /// Rewind every chunk. Call before the frame's first draw.
    pub fn begin_frame(&mut self) {
        for chunk in &mut self.chunks {
            chunk.cursor = 0;
        }
        self.current = 0;
        self.packed.clear();
        self.blocks_packed = 0;
    }

    /// Pack `group` and return a binding group for its block.
    ///
    /// With `mark_dirty` false, a group already packed this frame whose
    /// values have not changed since returns its earlier binding.
    pub fn get_uniform_bind_group(
        &mut self,
        encoder: &dyn GpuEncoder,
        group: &UniformGroup,
        mark_dirty: bool,
    ) -> RenderResult<Arc<ResourceBindingGroup>> {
        profile_function!();
        if !mark_dirty
            && let Some(packed) = self.packed.get(&group.uid())
            && packed.dirty_id == group.dirty_id()
        {
            return Ok(packed.binding.clone());
        }

        let size = group.byte_size();
        if size > self.config.chunk_size {
            return Err(RenderError::UniformBlockTooLarge {
                size,
                chunk_size: self.config.chunk_size,
            });
        }

        self.scratch.clear();
        group.write_std140(&mut self.scratch);

        let (chunk_index, offset) = self.reserve(encoder, size);
        let chunk = &mut self.chunks[chunk_index];
        let start = offset as usize;
        chunk.staging[start..start + self.scratch.len()].copy_from_slice(&self.scratch);
        let buffer = chunk.buffer;

        let binding = self
            .bindings
            .entry((chunk_index, offset, size))
            .or_insert_with(|| {
                Arc::new(ResourceBindingGroup::new(vec![BindingResource::Buffer {
                    buffer,
                    offset,
                    size,
                }]))
            })
            .clone();

        self.packed.insert(
            group.uid(),
            PackedBlock {
                dirty_id: group.dirty_id(),
                binding: binding.clone(),
            },
        );
        self.blocks_packed += 1;
        Ok(binding)
    }

    /// Find room for `size` bytes, moving to the next chunk when the current
    /// one is full.
    fn reserve(&mut self, encoder: &dyn GpuEncoder, size: u64) -> (usize, u64) {
        loop {
            if self.current == self.chunks.len() {
                let buffer = encoder.create_buffer(
                    self.config.chunk_size,
                    wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                );
                tracing::debug!(
                    "Allocated uniform chunk {} ({} bytes)",
                    self.chunks.len(),
                    self.config.chunk_size
                );
                self.chunks.push(UniformChunk {
                    buffer,
                    staging: vec![0; self.config.chunk_size as usize],
                    cursor: 0,
                });
            }

            let chunk = &mut self.chunks[self.current];
            let offset = chunk.cursor.next_multiple_of(self.config.alignment);
            if offset + size <= self.config.chunk_size {
                chunk.cursor = offset + size;
                return (self.current, offset);
            }
            self.current += 1;
        }
    }

    /// Upload the used range of every chunk.
    pub fn end_frame(&mut self, encoder: &dyn GpuEncoder) {
        profile_function!();
        for chunk in &self.chunks {
            if chunk.cursor > 0 {
                encoder.write_buffer(&chunk.buffer, 0, &chunk.staging[..chunk.cursor as usize]);
            }
        }
    }

    /// Blocks packed since the last `begin_frame`.
    pub fn blocks_packed(&self) -> u32 {
        self.blocks_packed
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Release every chunk buffer and forget all bindings.
    pub fn destroy(&mut self, encoder: &dyn GpuEncoder) {
        for chunk in self.chunks.drain(..) {
            encoder.destroy_buffer(&chunk.buffer);
        }
        self.bindings.clear();
        self.packed.clear();
        self.current = 0;
    }
}
