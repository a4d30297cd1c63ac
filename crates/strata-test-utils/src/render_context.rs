//! Traits abstracting the two GPU command APIs a renderer can target.
//!
//! [`GpuEncoder`] models a bind-group based API where resources are
//! compiled into reusable groups and addressed by slot. [`GlEncoder`] models
//! a classic state-machine API where uniforms are uploaded by value and
//! textures are bound to units immediately before drawing.
//!
//! Both traits take `&self` and return owned `Copy` handles, so an encoder
//! can be shared behind an `Arc` and mocked with interior mutability.

use crate::gpu_types::*;
use wgpu::BufferUsages;

/// Bind-group based command encoding.
///
/// # Example
///
/// ```rust,no_run
/// use strata_test_utils::{BindingResource, GpuEncoder, GpuProgram};
/// use wgpu::BufferUsages;
///
/// fn upload_globals(encoder: &dyn GpuEncoder, program: &GpuProgram, bytes: &[u8]) {
///     let buffer = encoder.create_buffer(bytes.len() as u64, BufferUsages::UNIFORM);
///     encoder.write_buffer(&buffer, 0, bytes);
///     let group = encoder.create_bind_group(
///         program,
///         0,
///         &[BindingResource::Buffer { buffer, offset: 0, size: bytes.len() as u64 }],
///     );
///     encoder.set_bind_group(0, &group, program);
/// }
/// ```
pub trait GpuEncoder: Send + Sync {
    // Programs

    /// Compile a program from WGSL sources.
    fn create_program(&self, desc: &ProgramDescriptor) -> GpuProgram;

    /// Release a compiled program.
    fn destroy_program(&self, program: &GpuProgram);

    // Buffers

    /// Create a buffer of `size` bytes.
    fn create_buffer(&self, size: u64, usage: BufferUsages) -> GpuBuffer;

    /// Queue a write of `data` into `buffer` at `offset`.
    fn write_buffer(&self, buffer: &GpuBuffer, offset: u64, data: &[u8]);

    /// Release a buffer.
    fn destroy_buffer(&self, buffer: &GpuBuffer);

    // Textures

    /// Create a `width` x `height` RGBA8 texture holding `data`.
    fn create_texture(&self, width: u32, height: u32, data: &[u8]) -> GpuTexture;

    fn destroy_texture(&self, texture: &GpuTexture);

    /// Create a linear clamp-to-edge sampler.
    fn create_sampler(&self) -> GpuSampler;

    // Bind groups

    /// Compile `resources` into a bind group compatible with `program`'s
    /// layout at `slot`.
    fn create_bind_group(
        &self,
        program: &GpuProgram,
        slot: u32,
        resources: &[BindingResource],
    ) -> GpuBindGroup;

    /// Release a compiled bind group.
    fn destroy_bind_group(&self, group: &GpuBindGroup);

    // Encoding

    /// Select the pipeline for `program` with the given raster state and
    /// vertex layout of `geometry`.
    fn set_pipeline_state(&self, geometry: &GpuGeometry, program: &GpuProgram, state: &RasterState);

    /// Bind vertex and index buffers.
    fn set_geometry(&self, geometry: &GpuGeometry);

    /// Bind a compiled group at `slot`.
    fn set_bind_group(&self, slot: u32, group: &GpuBindGroup, program: &GpuProgram);

    /// Draw `index_count` indices starting at `first_index`.
    fn draw_indexed(&self, index_count: u32, instance_count: u32, first_index: u32);
}

/// State-machine command encoding.
pub trait GlEncoder: Send + Sync {
    /// Compile and link a program from GLSL sources.
    fn compile_program(&self, desc: &ProgramDescriptor) -> GpuProgram;

    fn delete_program(&self, program: &GpuProgram);

    /// Make `program` current.
    fn use_program(&self, program: &GpuProgram);

    fn set_raster_state(&self, state: &RasterState);

    /// Bind the vertex array for `geometry`.
    fn bind_geometry(&self, geometry: &GpuGeometry, program: &GpuProgram);

    /// Upload the uniform block for `slot` by value.
    fn upload_uniforms(&self, slot: u32, data: &[u8], program: &GpuProgram);

    /// Bind `textures` to consecutive texture units, starting at unit 0, for
    /// the sampler array at `slot`.
    fn bind_textures(&self, slot: u32, textures: &[GpuTexture], program: &GpuProgram);

    /// Draw `index_count` indices starting at `first_index`.
    fn draw_elements(&self, index_count: u32, first_index: u32);
}
