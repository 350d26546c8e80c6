// Copyright 2026 @lucent

use crate::math::constants::{Float, Vector2f, Vector3f, Vector4f};
use crate::math::ray::Ray3f;

/// Closed set of camera kinds; the integrator switches on the tag rather
/// than dispatching through a trait object.
#[derive(Clone)]
pub enum CameraKind {
    Perspective {
        dir_00: Vector3f,
        dir_du: Vector3f,
        dir_dv: Vector3f,
    },
    Orthographic {
        pos_00: Vector3f,
        pos_du: Vector3f,
        pos_dv: Vector3f,
        dir: Vector3f,
    },
}

#[derive(Clone)]
pub struct Camera {
    position: Vector3f,
    // Normalized screen sub-rect, (x0, y0, x1, y1).
    region: Vector4f,
    kind: CameraKind,
}

impl Camera {
    pub fn perspective(position: Vector3f,
                       target: Vector3f,
                       up: Vector3f,
                       fov_y_radians: Float,
                       aspect: Float) -> Self {
        let forward = (target - position).normalize();
        let right = forward.cross(&up).normalize();
        let up = right.cross(&forward).normalize();

        let image_height = 2.0 * (0.5 * fov_y_radians).tan();
        let image_width = image_height * aspect;

        let dir_du = right * image_width;
        let dir_dv = up * image_height;
        let dir_00 = forward - 0.5 * dir_du - 0.5 * dir_dv;

        Self {
            position,
            region: Vector4f::new(0.0, 0.0, 1.0, 1.0),
            kind: CameraKind::Perspective { dir_00, dir_du, dir_dv },
        }
    }

    pub fn orthographic(position: Vector3f,
                        direction: Vector3f,
                        up: Vector3f,
                        height: Float,
                        aspect: Float) -> Self {
        let dir = direction.normalize();
        let right = dir.cross(&up).normalize();
        let up = right.cross(&dir).normalize();

        let pos_du = right * height * aspect;
        let pos_dv = up * height;
        let pos_00 = position - 0.5 * pos_du - 0.5 * pos_dv;

        Self {
            position,
            region: Vector4f::new(0.0, 0.0, 1.0, 1.0),
            kind: CameraKind::Orthographic { pos_00, pos_du, pos_dv, dir },
        }
    }

    pub fn set_region(&mut self, region: Vector4f) {
        self.region = region;
    }

    /// Primary ray for a normalized screen coordinate in [0,1)^2.
    pub fn ray(&self, screen: Vector2f) -> Ray3f {
        let u = self.region.x + screen.x * (self.region.z - self.region.x);
        let v = self.region.y + screen.y * (self.region.w - self.region.y);

        match &self.kind {
            CameraKind::Perspective { dir_00, dir_du, dir_dv } => {
                let dir = dir_00 + dir_du * u + dir_dv * v;
                Ray3f::new(self.position, dir, None, None)
            }
            CameraKind::Orthographic { pos_00, pos_du, pos_dv, dir } => {
                let origin = pos_00 + pos_du * u + pos_dv * v;
                Ray3f::new(origin, *dir, None, None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perspective_center_ray() {
        let cam = Camera::perspective(
            Vector3f::zeros(),
            Vector3f::new(0.0, 0.0, -1.0),
            Vector3f::new(0.0, 1.0, 0.0),
            std::f32::consts::FRAC_PI_2,
            1.0,
        );

        let ray = cam.ray(Vector2f::new(0.5, 0.5));
        let dir = ray.dir();
        assert!((dir.x - 0.0).abs() < 1e-6);
        assert!((dir.y - 0.0).abs() < 1e-6);
        assert!((dir.z + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_region_remaps_screen() {
        let mut cam = Camera::perspective(
            Vector3f::zeros(),
            Vector3f::new(0.0, 0.0, -1.0),
            Vector3f::new(0.0, 1.0, 0.0),
            std::f32::consts::FRAC_PI_2,
            1.0,
        );
        let full = cam.ray(Vector2f::new(0.25, 0.25));

        // The lower-left quadrant as a sub-rect: its center is the full
        // image's (0.25, 0.25).
        cam.set_region(Vector4f::new(0.0, 0.0, 0.5, 0.5));
        let sub = cam.ray(Vector2f::new(0.5, 0.5));
        assert!((full.dir() - sub.dir()).norm() < 1e-6);
    }

    #[test]
    fn test_orthographic_rays_parallel() {
        let cam = Camera::orthographic(
            Vector3f::new(0.0, 0.0, 5.0),
            Vector3f::new(0.0, 0.0, -1.0),
            Vector3f::new(0.0, 1.0, 0.0),
            2.0,
            1.0,
        );

        let r0 = cam.ray(Vector2f::new(0.1, 0.1));
        let r1 = cam.ray(Vector2f::new(0.9, 0.9));
        assert!((r0.dir() - r1.dir()).norm() < 1e-6);
        assert!((r0.origin() - r1.origin()).norm() > 1e-3);
    }
}
