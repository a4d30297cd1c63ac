//! Batched draw execution.
//!
//! Paint contexts are reduced to an [`InstructionList`] of [`DrawBatch`]es
//! when their geometry changes. Each frame a [`RendererBackendAdaptor`]
//! walks those lists and issues draws for whichever API is active:
//!
//! | Backend | Uniforms | Textures |
//! |---------|----------|----------|
//! | Legacy  | uploaded by value per draw | bound to units per batch |
//! | Modern  | packed into shared uniform chunks | cached bind groups |

mod batcher;
mod legacy;
mod modern;
mod traits;
mod types;

pub use batcher::build_instructions;
pub use legacy::LegacyGraphicsAdaptor;
pub use modern::ModernGraphicsAdaptor;
pub use traits::*;
pub use types::*;

use crate::backend::RenderBackend;
use crate::capability::AdapterReport;
use crate::uniform_batch::UniformBatchConfig;

/// Sizing knobs shared by both adaptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdaptorOptions {
    /// Texture slots per batch, clamped to `1..=MAX_BATCH_TEXTURES`.
    pub max_textures: usize,
    pub uniform_batch: UniformBatchConfig,
}

impl Default for AdaptorOptions {
    fn default() -> Self {
        Self {
            max_textures: MAX_BATCH_TEXTURES,
            uniform_batch: UniformBatchConfig::default(),
        }
    }
}

impl AdaptorOptions {
    /// Fit the options to what the adapter reports.
    pub fn from_report(report: &AdapterReport) -> Self {
        Self {
            max_textures: (report.max_texture_slots as usize).clamp(1, MAX_BATCH_TEXTURES),
            uniform_batch: UniformBatchConfig::from_report(report),
        }
    }

    fn clamped_textures(&self) -> usize {
        self.max_textures.clamp(1, MAX_BATCH_TEXTURES)
    }
}

/// Create the graphics adaptor matching `backend`.
///
/// The adaptor is returned uninitialised.
pub fn create_graphics_adaptor(
    backend: &RenderBackend,
    options: &AdaptorOptions,
) -> Box<dyn RendererBackendAdaptor> {
    let max_textures = options.clamped_textures();
    tracing::info!(
        "Creating graphics adaptor: {} ({} texture slots)",
        backend.kind(),
        max_textures
    );

    match backend {
        RenderBackend::Legacy(encoder) => {
            Box::new(LegacyGraphicsAdaptor::new(encoder.clone(), max_textures))
        }
        RenderBackend::Modern(encoder) => Box::new(ModernGraphicsAdaptor::new(
            encoder.clone(),
            max_textures,
            options.uniform_batch,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendKind;
    use std::sync::Arc;
    use strata_test_utils::{MockGlEncoder, MockGpuEncoder};

    #[test]
    fn test_factory_matches_backend() {
        let options = AdaptorOptions::default();

        let legacy = create_graphics_adaptor(
            &RenderBackend::Legacy(Arc::new(MockGlEncoder::new())),
            &options,
        );
        assert_eq!(legacy.kind(), BackendKind::Legacy);
        assert!(!legacy.is_active());

        let modern = create_graphics_adaptor(
            &RenderBackend::Modern(Arc::new(MockGpuEncoder::new())),
            &options,
        );
        assert_eq!(modern.kind(), BackendKind::Modern);
    }

    #[test]
    fn test_options_follow_report() {
        let mut report = AdapterReport::all_backends("test");
        report.max_texture_slots = 64;
        assert_eq!(AdaptorOptions::from_report(&report).max_textures, MAX_BATCH_TEXTURES);

        report.max_texture_slots = 8;
        assert_eq!(AdaptorOptions::from_report(&report).max_textures, 8);
    }
}
