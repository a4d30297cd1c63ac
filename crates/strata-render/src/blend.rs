//! Blend modes a drawable can be composited with.

/// Predefined blend modes for compositing drawables.
///
/// Colors reaching the fragment stage are premultiplied, so the default
/// mode blends premultiplied source over destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    /// Premultiplied source-over.
    ///
    /// Formula: `src.rgb + dst.rgb * (1 - src.a)`
    #[default]
    Normal,

    /// Blending disabled, source replaces destination.
    Disabled,

    /// Additive blending.
    ///
    /// Formula: `src.rgb + dst.rgb`
    Add,

    /// Multiplicative blending.
    ///
    /// Formula: `src.rgb * dst.rgb + dst.rgb * (1 - src.a)`
    Multiply,

    /// Screen blending.
    ///
    /// Formula: `src.rgb + dst.rgb * (1 - src.rgb)`
    Screen,

    /// Custom blend state for advanced use cases.
    Custom(wgpu::BlendState),
}

impl BlendMode {
    /// Convert to wgpu BlendState. `Disabled` maps to `None`.
    pub fn to_blend_state(self) -> Option<wgpu::BlendState> {
        let alpha_over = wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        };
        match self {
            BlendMode::Normal => Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
            BlendMode::Disabled => None,
            BlendMode::Add => Some(wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
            }),
            BlendMode::Multiply => Some(wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::Dst,
                    dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: alpha_over,
            }),
            BlendMode::Screen => Some(wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::OneMinusSrc,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: alpha_over,
            }),
            BlendMode::Custom(state) => Some(state),
        }
    }
}

impl From<BlendMode> for Option<wgpu::BlendState> {
    fn from(mode: BlendMode) -> Self {
        mode.to_blend_state()
    }
}

impl From<wgpu::BlendState> for BlendMode {
    fn from(state: wgpu::BlendState) -> Self {
        BlendMode::Custom(state)
    }
}
