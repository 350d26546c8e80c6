// Copyright 2026 @lucent

use crate::math::constants::{Float, Vector3f, Vector4f, FLOAT_MAX};

/// Next-event estimation strategy: shade against every light instance, or
/// pick one uniformly per sample and scale by the light count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LightStrategy {
    All,
    Single,
}

/// Committed renderer parameters consumed by the integrator. Mutations go
/// through `Scene::set_renderer` so the commit epoch advances with them.
#[derive(Clone)]
pub struct Renderer {
    pub background: Vector4f,
    pub ambient_color: Vector3f,
    pub ambient_intensity: Float,
    pub ao_samples: u32,
    pub occlusion_distance: Float,
    pub direct_clamp: Float,
    pub light_strategy: LightStrategy,
    pub checkerboard: bool,
    pub denoise: bool,
}

impl Default for Renderer {
    fn default() -> Self {
        Self {
            background: Vector4f::new(0.0, 0.0, 0.0, 1.0),
            ambient_color: Vector3f::new(1.0, 1.0, 1.0),
            ambient_intensity: 0.0,
            ao_samples: 0,
            occlusion_distance: 1e20,
            direct_clamp: FLOAT_MAX,
            light_strategy: LightStrategy::All,
            checkerboard: false,
            denoise: false,
        }
    }
}

impl Renderer {
    pub fn with_background(mut self, background: Vector4f) -> Self {
        self.background = background;
        self
    }

    pub fn with_ambient(mut self, color: Vector3f, intensity: Float) -> Self {
        self.ambient_color = color;
        self.ambient_intensity = intensity;
        self
    }

    pub fn with_ao_samples(mut self, samples: u32) -> Self {
        // Mirrors the committed clamp on the original parameter.
        self.ao_samples = samples.min(256);
        self
    }

    pub fn with_checkerboard(mut self, enabled: bool) -> Self {
        self.checkerboard = enabled;
        self
    }

    pub fn with_denoise(mut self, enabled: bool) -> Self {
        self.denoise = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ao_samples_clamped() {
        let r = Renderer::default().with_ao_samples(10_000);
        assert_eq!(r.ao_samples, 256);
    }
}
