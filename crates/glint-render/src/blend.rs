//! Blend configuration for batched sprites.

use glint_test_utils::{BlendFactors, GraphicsDevice};

/// Predefined blend modes for common use cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    /// No blending - source completely replaces destination.
    Replace,

    /// Standard alpha blending for transparent content.
    ///
    /// Formula: `src.rgb * src.a + dst.rgb * (1 - src.a)`
    #[default]
    Alpha,

    /// Premultiplied alpha blending.
    ///
    /// Formula: `src.rgb + dst.rgb * (1 - src.a)`
    PremultipliedAlpha,

    /// Additive blending - colors are added together.
    ///
    /// Use for: Glow effects, particles, light sources.
    Additive,

    /// Multiplicative blending.
    ///
    /// Use for: Shadows, color tinting.
    Multiply,

    /// Explicit factors.
    Custom(BlendFactors),
}

impl BlendMode {
    /// Factors for this mode, or `None` when blending should be disabled.
    pub fn factors(self) -> Option<BlendFactors> {
        use wgpu::BlendFactor as F;

        match self {
            BlendMode::Replace => None,
            BlendMode::Alpha => Some(BlendFactors::new(F::SrcAlpha, F::OneMinusSrcAlpha)),
            BlendMode::PremultipliedAlpha => Some(BlendFactors::new(F::One, F::OneMinusSrcAlpha)),
            BlendMode::Additive => Some(BlendFactors::separate(F::SrcAlpha, F::One, F::One, F::One)),
            BlendMode::Multiply => Some(BlendFactors::separate(F::Dst, F::Zero, F::DstAlpha, F::Zero)),
            BlendMode::Custom(factors) => Some(factors),
        }
    }
}

impl From<BlendFactors> for BlendMode {
    fn from(factors: BlendFactors) -> Self {
        BlendMode::Custom(factors)
    }
}

/// Blending as the batcher believes it should be applied at the next flush.
///
/// `factors` stays `None` until factors are set explicitly; flushing then
/// only toggles blending and leaves the device's factors untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BlendState {
    pub enabled: bool,
    pub factors: Option<BlendFactors>,
}

impl BlendState {
    pub const DISABLED: BlendState = BlendState {
        enabled: false,
        factors: None,
    };

    pub fn from_mode(mode: BlendMode) -> Self {
        match mode.factors() {
            Some(factors) => Self {
                enabled: true,
                factors: Some(factors),
            },
            None => Self::DISABLED,
        }
    }

    pub(crate) fn apply(&self, device: &dyn GraphicsDevice) {
        if !self.enabled {
            device.set_blend_enabled(false);
            return;
        }

        device.set_blend_enabled(true);
        if let Some(factors) = self.factors {
            device.set_blend_factors(factors);
        }
    }
}

impl From<BlendMode> for BlendState {
    fn from(mode: BlendMode) -> Self {
        Self::from_mode(mode)
    }
}
