//! Strata Render
//!
//! Backend adaptors and batched draw execution for a 2D scene-graph renderer.
//! A [`GraphicsPipe`] forwards renderables to a [`RendererBackendAdaptor`],
//! which walks each paint context's precomputed [`InstructionList`] and issues
//! draws through either the legacy-rasterizer or modern-compute encoder.

pub mod backend;
pub mod batched;
pub mod bind_group;
pub mod blend;
pub mod capability;
pub mod color;
pub mod error;
pub mod features;
pub mod globals;
pub mod lifecycle;
pub mod paint;
pub mod pipe;
pub mod renderer;
pub mod shader;
pub mod state;
pub mod uniform;
pub mod uniform_batch;

pub use backend::{BackendKind, BackendPreference, BackendProvider, RenderBackend};
pub use batched::{
    AdaptorOptions, BatchRenderStats, BatchTexture, DrawBatch, InstructionList,
    LegacyGraphicsAdaptor, ModernGraphicsAdaptor, RendererBackendAdaptor, TextureBatch,
    create_graphics_adaptor,
};
pub use bind_group::{BindGroupCache, ResourceBindingGroup, TextureBindGroupCache};
pub use blend::BlendMode;
pub use capability::{AdapterReport, probe_wgpu_adapter, probe_wgpu_adapter_blocking, select_backend};
pub use color::{Color, pack_color, unpack_color, unpack_color_premultiplied};
pub use error::{RenderError, RenderResult};
pub use features::GpuFeatures;
pub use globals::{GlobalUniformData, GlobalUniforms};
pub use lifecycle::Lifecycle;
pub use paint::{
    BatchablePrimitive, ContextRenderData, GpuPaintContext, PaintContextCache, PaintContextId,
    PaintContextProvider,
};
pub use pipe::{GraphicsPipe, GraphicsRenderable, PipeState};
pub use renderer::{RenderView, Renderer, RendererOptions};
pub use shader::{ShaderBit, ShaderProgram};
pub use state::PipelineState;
pub use uniform::{UniformGroup, UniformType, UniformValue};
pub use uniform_batch::{UniformBatchAllocator, UniformBatchConfig};
