//! The two graphics APIs a renderer can drive, and how one gets chosen.

use std::sync::Arc;

use strata_test_utils::{GlEncoder, GpuEncoder};

use crate::capability::AdapterReport;
use crate::error::RenderResult;

/// Which low-level API a backend speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// State-machine rasterizer API, uniforms uploaded by value.
    Legacy,
    /// Bind-group API with batched uniform buffers.
    Modern,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Legacy => write!(f, "legacy-rasterizer"),
            BackendKind::Modern => write!(f, "modern-compute"),
        }
    }
}

/// Caller preference used when selecting a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BackendPreference {
    /// Modern if available, legacy otherwise.
    #[default]
    Auto,
    Legacy,
    Modern,
}

impl BackendPreference {
    /// Backends to try, most preferred first.
    pub fn candidates(self) -> [BackendKind; 2] {
        match self {
            BackendPreference::Auto | BackendPreference::Modern => {
                [BackendKind::Modern, BackendKind::Legacy]
            }
            BackendPreference::Legacy => [BackendKind::Legacy, BackendKind::Modern],
        }
    }
}

/// A connected backend: the encoder every draw is issued through.
#[derive(Clone)]
pub enum RenderBackend {
    Legacy(Arc<dyn GlEncoder>),
    Modern(Arc<dyn GpuEncoder>),
}

impl RenderBackend {
    pub fn kind(&self) -> BackendKind {
        match self {
            RenderBackend::Legacy(_) => BackendKind::Legacy,
            RenderBackend::Modern(_) => BackendKind::Modern,
        }
    }
}

impl std::fmt::Debug for RenderBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("RenderBackend").field(&self.kind()).finish()
    }
}

/// Capability detection and device connection.
///
/// Probing is the single await point before the first frame.
pub trait BackendProvider {
    /// Report which backends this machine can run.
    fn probe(&self) -> impl Future<Output = RenderResult<AdapterReport>> + Send;

    /// Open the selected backend.
    fn connect(&self, kind: BackendKind, report: &AdapterReport) -> RenderResult<RenderBackend>;
}
