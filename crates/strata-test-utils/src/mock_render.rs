//! Mock encoders for testing.
//!
//! Both mocks record every call into an [`EncoderCall`] log without touching
//! a GPU. Handles are minted from a monotonically increasing id counter
//! starting at 1.

use crate::{
    gpu_types::*,
    render_context::{GlEncoder, GpuEncoder},
};
use parking_lot::Mutex;
use wgpu::BufferUsages;

/// Records an encoder call for verification in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum EncoderCall {
    CreateProgram {
        label: String,
        program: u64,
    },
    DestroyProgram {
        program: u64,
    },
    CreateBuffer {
        buffer: u64,
        size: u64,
        usage: BufferUsages,
    },
    WriteBuffer {
        buffer: u64,
        offset: u64,
        data: Vec<u8>,
    },
    DestroyBuffer {
        buffer: u64,
    },
    CreateTexture {
        texture: u64,
        width: u32,
        height: u32,
    },
    DestroyTexture {
        texture: u64,
    },
    CreateSampler {
        sampler: u64,
    },
    CreateBindGroup {
        group: u64,
        program: u64,
        slot: u32,
        resources: Vec<BindingResource>,
    },
    DestroyBindGroup {
        group: u64,
    },
    SetPipelineState {
        geometry: u64,
        program: u64,
        state: RasterState,
    },
    SetGeometry {
        geometry: u64,
    },
    SetBindGroup {
        slot: u32,
        group: u64,
        program: u64,
    },
    DrawIndexed {
        index_count: u32,
        instance_count: u32,
        first_index: u32,
    },
    UseProgram {
        program: u64,
    },
    SetRasterState {
        state: RasterState,
    },
    BindGeometry {
        geometry: u64,
        program: u64,
    },
    UploadUniforms {
        slot: u32,
        data: Vec<u8>,
        program: u64,
    },
    BindTextures {
        slot: u32,
        textures: Vec<u64>,
        program: u64,
    },
    DrawElements {
        index_count: u32,
        first_index: u32,
    },
}

impl EncoderCall {
    /// `(first_index, index_count)` if this call issues a draw.
    pub fn draw_range(&self) -> Option<(u32, u32)> {
        match self {
            EncoderCall::DrawIndexed {
                index_count,
                first_index,
                ..
            }
            | EncoderCall::DrawElements {
                index_count,
                first_index,
            } => Some((*first_index, *index_count)),
            _ => None,
        }
    }
}

/// Shared call log and id counter.
#[derive(Debug, Default)]
struct CallLog {
    calls: Mutex<Vec<EncoderCall>>,
    next_id: Mutex<u64>,
}

impl CallLog {
    fn record(&self, call: EncoderCall) {
        self.calls.lock().push(call);
    }

    fn next_id(&self) -> u64 {
        let mut next = self.next_id.lock();
        *next += 1;
        *next
    }

    fn count(&self, predicate: impl Fn(&EncoderCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|call| predicate(call)).count()
    }

    fn draws(&self) -> Vec<(u32, u32)> {
        self.calls
            .lock()
            .iter()
            .filter_map(EncoderCall::draw_range)
            .collect()
    }
}

macro_rules! call_log_accessors {
    ($ty:ty) => {
        impl $ty {
            /// Get a copy of all recorded calls (for test assertions).
            pub fn calls(&self) -> Vec<EncoderCall> {
                self.log.calls.lock().clone()
            }

            /// Clear recorded calls (useful between test steps).
            pub fn clear_calls(&self) {
                self.log.calls.lock().clear();
            }

            /// Get total number of recorded calls.
            pub fn call_count(&self) -> usize {
                self.log.calls.lock().len()
            }

            /// Count calls matching `predicate`.
            pub fn count_where(&self, predicate: impl Fn(&EncoderCall) -> bool) -> usize {
                self.log.count(predicate)
            }

            /// `(first_index, index_count)` of every draw, in issue order.
            pub fn draws(&self) -> Vec<(u32, u32)> {
                self.log.draws()
            }

            /// Count draw calls.
            pub fn count_draws(&self) -> usize {
                self.log.draws().len()
            }
        }

        impl Default for $ty {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

/// Mock implementation of [`GpuEncoder`].
///
/// # Example
///
/// ```rust
/// use strata_test_utils::{GpuEncoder, MockGpuEncoder};
///
/// let mock = MockGpuEncoder::new();
/// mock.draw_indexed(6, 1, 0);
///
/// assert_eq!(mock.draws(), vec![(0, 6)]);
/// ```
#[derive(Debug)]
pub struct MockGpuEncoder {
    log: CallLog,
}

impl MockGpuEncoder {
    pub fn new() -> Self {
        Self {
            log: CallLog::default(),
        }
    }

    /// Count program compilations.
    pub fn count_program_creates(&self) -> usize {
        self.log
            .count(|call| matches!(call, EncoderCall::CreateProgram { .. }))
    }

    /// Count buffer creates.
    pub fn count_buffer_creates(&self) -> usize {
        self.log
            .count(|call| matches!(call, EncoderCall::CreateBuffer { .. }))
    }

    /// Count buffer write operations.
    pub fn count_buffer_writes(&self) -> usize {
        self.log
            .count(|call| matches!(call, EncoderCall::WriteBuffer { .. }))
    }

    /// Count bind group compilations.
    pub fn count_bind_group_creates(&self) -> usize {
        self.log
            .count(|call| matches!(call, EncoderCall::CreateBindGroup { .. }))
    }

    /// Count bind group creates at `slot`.
    pub fn count_bind_group_creates_at(&self, slot: u32) -> usize {
        self.log.count(
            |call| matches!(call, EncoderCall::CreateBindGroup { slot: s, .. } if *s == slot),
        )
    }

    /// Count `set_bind_group` calls at `slot`.
    pub fn count_bind_group_sets_at(&self, slot: u32) -> usize {
        self.log
            .count(|call| matches!(call, EncoderCall::SetBindGroup { slot: s, .. } if *s == slot))
    }

    /// Resources of every bind group created at `slot`, in issue order.
    pub fn bind_group_resources_at(&self, slot: u32) -> Vec<Vec<BindingResource>> {
        self.log
            .calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                EncoderCall::CreateBindGroup {
                    slot: s, resources, ..
                } if *s == slot => Some(resources.clone()),
                _ => None,
            })
            .collect()
    }

    /// Count pipeline state changes.
    pub fn count_pipeline_sets(&self) -> usize {
        self.log
            .count(|call| matches!(call, EncoderCall::SetPipelineState { .. }))
    }

    /// Bytes of every write to `buffer`, in issue order.
    pub fn writes_to(&self, buffer: &GpuBuffer) -> Vec<(u64, Vec<u8>)> {
        self.log
            .calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                EncoderCall::WriteBuffer {
                    buffer: id,
                    offset,
                    data,
                } if *id == buffer.id() => Some((*offset, data.clone())),
                _ => None,
            })
            .collect()
    }
}

call_log_accessors!(MockGpuEncoder);

impl GpuEncoder for MockGpuEncoder {
    fn create_program(&self, desc: &ProgramDescriptor) -> GpuProgram {
        let program = GpuProgram::new(self.log.next_id());
        self.log.record(EncoderCall::CreateProgram {
            label: desc.label.clone(),
            program: program.id(),
        });
        program
    }

    fn destroy_program(&self, program: &GpuProgram) {
        self.log.record(EncoderCall::DestroyProgram {
            program: program.id(),
        });
    }

    fn create_buffer(&self, size: u64, usage: BufferUsages) -> GpuBuffer {
        let buffer = GpuBuffer::new(self.log.next_id(), size);
        self.log.record(EncoderCall::CreateBuffer {
            buffer: buffer.id(),
            size,
            usage,
        });
        buffer
    }

    fn write_buffer(&self, buffer: &GpuBuffer, offset: u64, data: &[u8]) {
        self.log.record(EncoderCall::WriteBuffer {
            buffer: buffer.id(),
            offset,
            data: data.to_vec(),
        });
    }

    fn destroy_buffer(&self, buffer: &GpuBuffer) {
        self.log.record(EncoderCall::DestroyBuffer {
            buffer: buffer.id(),
        });
    }

    fn create_texture(&self, width: u32, height: u32, _data: &[u8]) -> GpuTexture {
        let texture = GpuTexture::new(self.log.next_id(), width, height);
        self.log.record(EncoderCall::CreateTexture {
            texture: texture.id(),
            width,
            height,
        });
        texture
    }

    fn destroy_texture(&self, texture: &GpuTexture) {
        self.log.record(EncoderCall::DestroyTexture {
            texture: texture.id(),
        });
    }

    fn create_sampler(&self) -> GpuSampler {
        let sampler = GpuSampler::new(self.log.next_id());
        self.log.record(EncoderCall::CreateSampler {
            sampler: sampler.id(),
        });
        sampler
    }

    fn create_bind_group(
        &self,
        program: &GpuProgram,
        slot: u32,
        resources: &[BindingResource],
    ) -> GpuBindGroup {
        let group = GpuBindGroup::new(self.log.next_id());
        self.log.record(EncoderCall::CreateBindGroup {
            group: group.id(),
            program: program.id(),
            slot,
            resources: resources.to_vec(),
        });
        group
    }

    fn destroy_bind_group(&self, group: &GpuBindGroup) {
        self.log.record(EncoderCall::DestroyBindGroup { group: group.id() });
    }

    fn set_pipeline_state(&self, geometry: &GpuGeometry, program: &GpuProgram, state: &RasterState) {
        self.log.record(EncoderCall::SetPipelineState {
            geometry: geometry.id(),
            program: program.id(),
            state: *state,
        });
    }

    fn set_geometry(&self, geometry: &GpuGeometry) {
        self.log.record(EncoderCall::SetGeometry {
            geometry: geometry.id(),
        });
    }

    fn set_bind_group(&self, slot: u32, group: &GpuBindGroup, program: &GpuProgram) {
        self.log.record(EncoderCall::SetBindGroup {
            slot,
            group: group.id(),
            program: program.id(),
        });
    }

    fn draw_indexed(&self, index_count: u32, instance_count: u32, first_index: u32) {
        self.log.record(EncoderCall::DrawIndexed {
            index_count,
            instance_count,
            first_index,
        });
    }
}

/// Mock implementation of [`GlEncoder`].
#[derive(Debug)]
pub struct MockGlEncoder {
    log: CallLog,
}

impl MockGlEncoder {
    pub fn new() -> Self {
        Self {
            log: CallLog::default(),
        }
    }

    /// Count program compilations.
    pub fn count_program_compiles(&self) -> usize {
        self.log
            .count(|call| matches!(call, EncoderCall::CreateProgram { .. }))
    }

    /// Count uniform uploads at `slot`.
    pub fn count_uniform_uploads_at(&self, slot: u32) -> usize {
        self.log
            .count(|call| matches!(call, EncoderCall::UploadUniforms { slot: s, .. } if *s == slot))
    }

    /// Count texture binds.
    pub fn count_texture_binds(&self) -> usize {
        self.log
            .count(|call| matches!(call, EncoderCall::BindTextures { .. }))
    }

    /// Bytes of the most recent upload at `slot`.
    pub fn last_upload_at(&self, slot: u32) -> Option<Vec<u8>> {
        self.log.calls.lock().iter().rev().find_map(|call| match call {
            EncoderCall::UploadUniforms { slot: s, data, .. } if *s == slot => Some(data.clone()),
            _ => None,
        })
    }
}

call_log_accessors!(MockGlEncoder);

impl GlEncoder for MockGlEncoder {
    fn compile_program(&self, desc: &ProgramDescriptor) -> GpuProgram {
        let program = GpuProgram::new(self.log.next_id());
        self.log.record(EncoderCall::CreateProgram {
            label: desc.label.clone(),
            program: program.id(),
        });
        program
    }

    fn delete_program(&self, program: &GpuProgram) {
        self.log.record(EncoderCall::DestroyProgram {
            program: program.id(),
        });
    }

    fn use_program(&self, program: &GpuProgram) {
        self.log.record(EncoderCall::UseProgram {
            program: program.id(),
        });
    }

    fn set_raster_state(&self, state: &RasterState) {
        self.log.record(EncoderCall::SetRasterState { state: *state });
    }

    fn bind_geometry(&self, geometry: &GpuGeometry, program: &GpuProgram) {
        self.log.record(EncoderCall::BindGeometry {
            geometry: geometry.id(),
            program: program.id(),
        });
    }

    fn upload_uniforms(&self, slot: u32, data: &[u8], program: &GpuProgram) {
        self.log.record(EncoderCall::UploadUniforms {
            slot,
            data: data.to_vec(),
            program: program.id(),
        });
    }

    fn bind_textures(&self, slot: u32, textures: &[GpuTexture], program: &GpuProgram) {
        self.log.record(EncoderCall::BindTextures {
            slot,
            textures: textures.iter().map(GpuTexture::id).collect(),
            program: program.id(),
        });
    }

    fn draw_elements(&self, index_count: u32, first_index: u32) {
        self.log.record(EncoderCall::DrawElements {
            index_count,
            first_index,
        });
    }
}
