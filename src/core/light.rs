// Copyright 2026 @lucent

use crate::math::constants::{Float, Vector3f, FLOAT_MAX};

/// Closed set of light kinds; next-event estimation switches on the tag.
#[derive(Clone)]
pub enum Light {
    Ambient {
        color: Vector3f,
        intensity: Float,
    },
    Directional {
        // Direction the light travels, world space.
        direction: Vector3f,
        color: Vector3f,
        irradiance: Float,
    },
    Point {
        position: Vector3f,
        color: Vector3f,
        intensity: Float,
    },
}

/// One light's view from a shading point: incident direction, distance to
/// the emitter (for the shadow ray bound) and unoccluded radiance.
pub struct LightSample {
    pub direction: Vector3f,
    pub distance: Float,
    pub radiance: Vector3f,
}

impl Light {
    pub fn directional(direction: Vector3f, color: Vector3f, irradiance: Float) -> Self {
        Light::Directional { direction: direction.normalize(), color, irradiance }
    }

    pub fn point(position: Vector3f, color: Vector3f, intensity: Float) -> Self {
        Light::Point { position, color, intensity }
    }

    pub fn ambient(color: Vector3f, intensity: Float) -> Self {
        Light::Ambient { color, intensity }
    }

    pub fn is_ambient(&self) -> bool {
        matches!(self, Light::Ambient { .. })
    }

    /// Samples the light from `p`; `None` for ambient lights, which are
    /// handled by the occlusion-weighted ambient term instead.
    pub fn sample(&self, p: Vector3f) -> Option<LightSample> {
        match self {
            Light::Ambient { .. } => None,
            Light::Directional { direction, color, irradiance } => Some(LightSample {
                direction: -direction,
                distance: FLOAT_MAX,
                radiance: color * *irradiance,
            }),
            Light::Point { position, color, intensity } => {
                let to_light = position - p;
                let dist2 = to_light.dot(&to_light);
                if dist2 <= 0.0 {
                    return None;
                }
                let distance = dist2.sqrt();
                Some(LightSample {
                    direction: to_light / distance,
                    distance,
                    radiance: color * (*intensity / dist2),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_light_inverse_square() {
        let light = Light::point(Vector3f::new(0.0, 2.0, 0.0), Vector3f::new(1.0, 1.0, 1.0), 4.0);
        let s = light.sample(Vector3f::zeros()).expect("sample");
        assert!((s.distance - 2.0).abs() < 1e-5);
        assert!((s.radiance.x - 1.0).abs() < 1e-5);
        assert!((s.direction.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_directional_light_opposes_travel() {
        let light = Light::directional(
            Vector3f::new(0.0, -1.0, 0.0),
            Vector3f::new(1.0, 1.0, 1.0),
            2.0,
        );
        let s = light.sample(Vector3f::zeros()).expect("sample");
        assert!((s.direction.y - 1.0).abs() < 1e-5);
        assert_eq!(s.distance, FLOAT_MAX);
    }

    #[test]
    fn test_ambient_has_no_sample() {
        let light = Light::ambient(Vector3f::new(1.0, 1.0, 1.0), 0.3);
        assert!(light.sample(Vector3f::zeros()).is_none());
        assert!(light.is_ambient());
    }
}
