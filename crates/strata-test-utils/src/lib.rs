//! Test utilities for Strata.
//!
//! This crate provides the encoder traits the renderer issues GPU work
//! through, plus recording mock encoders for testing without a device.
//!
//! # Overview
//!
//! - [`GpuEncoder`] - bind-group based command encoding
//! - [`GlEncoder`] - state-machine command encoding
//! - `MockGpuEncoder` / `MockGlEncoder` - recording mocks (requires `mock` feature)
//! - Handle types (`GpuBuffer`, `GpuTexture`, `GpuBindGroup`, ...)
//!
//! # Example
//!
//! ```rust
//! # #[cfg(feature = "mock")]
//! # {
//! use strata_test_utils::{GpuEncoder, MockGpuEncoder};
//! use wgpu::BufferUsages;
//!
//! let mock = MockGpuEncoder::new();
//! let buffer = mock.create_buffer(256, BufferUsages::UNIFORM);
//! mock.write_buffer(&buffer, 0, &[0u8; 64]);
//!
//! assert_eq!(mock.count_buffer_creates(), 1);
//! assert_eq!(mock.count_buffer_writes(), 1);
//! # }
//! ```

pub mod gpu_types;
#[cfg(feature = "mock")]
pub mod mock_render;
pub mod render_context;

// Re-export main types at crate root
pub use gpu_types::*;
#[cfg(feature = "mock")]
pub use mock_render::*;
pub use render_context::*;
