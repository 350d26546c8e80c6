// Copyright 2026 @lucent

use crate::math::constants::{Float, Vector3f};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AlphaMode {
    Opaque,
    Blend,
    // Below the cutoff the surface is skipped entirely.
    Mask { cutoff: Float },
}

/// Flat matte material record. Shading graphs are out of scope; the
/// integrator only consumes the resolved base color and opacity.
#[derive(Clone)]
pub struct Material {
    pub base_color: Vector3f,
    pub opacity: Float,
    pub alpha_mode: AlphaMode,
}

/// Material output at a hit point, consumed by the integrator.
#[derive(Clone, Copy)]
pub struct MaterialValues {
    pub base_color: Vector3f,
    pub opacity: Float,
}

impl Material {
    pub fn new(base_color: Vector3f, opacity: Float, alpha_mode: AlphaMode) -> Self {
        Self { base_color, opacity, alpha_mode }
    }

    pub fn matte(base_color: Vector3f) -> Self {
        Self::new(base_color, 1.0, AlphaMode::Opaque)
    }

    pub fn evaluate(&self) -> MaterialValues {
        let opacity = match self.alpha_mode {
            AlphaMode::Opaque => 1.0,
            AlphaMode::Blend => self.opacity,
            AlphaMode::Mask { cutoff } => {
                if self.opacity < cutoff {
                    0.0
                } else {
                    1.0
                }
            }
        };
        MaterialValues { base_color: self.base_color, opacity }
    }
}
