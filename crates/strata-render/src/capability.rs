//! Adapter capability probing and backend selection.
//!
//! ```ignore
//! use strata_render::capability::{probe_wgpu_adapter_blocking, select_backend};
//! use strata_render::BackendPreference;
//!
//! let report = probe_wgpu_adapter_blocking(wgpu::Backends::all())?;
//! let kind = select_backend(&report, BackendPreference::Auto)?;
//! ```

use crate::backend::{BackendKind, BackendPreference};
use crate::error::{RenderError, RenderResult};
use crate::features::GpuFeatures;

/// Default `min_uniform_buffer_offset_alignment` on most desktop adapters.
pub const DEFAULT_UNIFORM_ALIGNMENT: u32 = 256;

/// Texture slots a single draw batch may bind.
pub const DEFAULT_MAX_TEXTURE_SLOTS: u32 = 16;

/// What an adapter can do, as far as backend selection cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterReport {
    /// Human-readable adapter name.
    pub name: String,
    pub modern_available: bool,
    pub legacy_available: bool,
    pub features: GpuFeatures,
    /// `min_uniform_buffer_offset_alignment`.
    pub uniform_offset_alignment: u32,
    pub max_uniform_binding_size: u32,
    /// Texture slots per batch, capped at [`DEFAULT_MAX_TEXTURE_SLOTS`].
    pub max_texture_slots: u32,
}

impl AdapterReport {
    /// A report for an adapter that runs both backends with default limits.
    pub fn all_backends(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modern_available: true,
            legacy_available: true,
            features: GpuFeatures::empty(),
            uniform_offset_alignment: DEFAULT_UNIFORM_ALIGNMENT,
            max_uniform_binding_size: 64 * 1024,
            max_texture_slots: DEFAULT_MAX_TEXTURE_SLOTS,
        }
    }

    /// A report for an adapter limited to the legacy backend.
    pub fn legacy_only(name: impl Into<String>) -> Self {
        Self {
            modern_available: false,
            ..Self::all_backends(name)
        }
    }

    /// Build a report from a live wgpu adapter.
    ///
    /// GL adapters and adapters without compute shaders only get the legacy
    /// backend.
    pub fn from_adapter(adapter: &wgpu::Adapter) -> Self {
        let info = adapter.get_info();
        let limits = adapter.limits();
        let downlevel = adapter.get_downlevel_capabilities();

        let modern_available = info.backend != wgpu::Backend::Gl
            && downlevel
                .flags
                .contains(wgpu::DownlevelFlags::COMPUTE_SHADERS);

        Self {
            name: info.name,
            modern_available,
            legacy_available: true,
            features: GpuFeatures::from_wgpu(adapter.features()),
            uniform_offset_alignment: limits.min_uniform_buffer_offset_alignment,
            max_uniform_binding_size: limits.max_uniform_buffer_binding_size,
            max_texture_slots: limits
                .max_sampled_textures_per_shader_stage
                .min(DEFAULT_MAX_TEXTURE_SLOTS),
        }
    }

    pub fn supports(&self, kind: BackendKind) -> bool {
        match kind {
            BackendKind::Legacy => self.legacy_available,
            BackendKind::Modern => self.modern_available,
        }
    }
}

/// Request an adapter and report its capabilities.
pub async fn probe_wgpu_adapter(backends: wgpu::Backends) -> RenderResult<AdapterReport> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends,
        ..Default::default()
    });

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .map_err(|e| RenderError::AdapterRequest(e.to_string()))?;

    let report = AdapterReport::from_adapter(&adapter);
    tracing::debug!(
        "Probed adapter '{}': modern={}, legacy={}, features={:?}",
        report.name,
        report.modern_available,
        report.legacy_available,
        report.features
    );
    Ok(report)
}

/// Blocking variant of [`probe_wgpu_adapter`].
pub fn probe_wgpu_adapter_blocking(backends: wgpu::Backends) -> RenderResult<AdapterReport> {
    pollster::block_on(probe_wgpu_adapter(backends))
}

/// Pick the backend to run, falling back to the other one when the
/// preferred backend is unavailable.
pub fn select_backend(
    report: &AdapterReport,
    preference: BackendPreference,
) -> RenderResult<BackendKind> {
    let [preferred, fallback] = preference.candidates();

    if report.supports(preferred) {
        tracing::info!("Selected {} backend on '{}'", preferred, report.name);
        Ok(preferred)
    } else if report.supports(fallback) {
        if preference != BackendPreference::Auto {
            tracing::warn!(
                "{} backend unavailable on '{}', falling back to {}",
                preferred,
                report.name,
                fallback
            );
        }
        tracing::info!("Selected {} backend on '{}'", fallback, report.name);
        Ok(fallback)
    } else {
        Err(RenderError::NoCompatibleBackend)
    }
}
