// Copyright 2026 @lucent

use crate::core::snapshot::VolumeState;
use crate::math::constants::{Float, Vector3f, FLOAT_MAX, OPACITY_THRESHOLD};
use crate::math::ray::Ray3f;

/// Premultiplied color and opacity gathered along a ray segment, plus the
/// distance of the first non-empty sample for depth/id attribution.
pub struct VolumeContribution {
    pub color: Vector3f,
    pub opacity: Float,
    pub depth: Float,
    pub volume_id: u32,
    pub instance_id: u32,
}

impl VolumeContribution {
    fn empty() -> Self {
        Self {
            color: Vector3f::zeros(),
            opacity: 0.0,
            depth: FLOAT_MAX,
            volume_id: crate::core::interaction::INVALID_ID,
            instance_id: crate::core::interaction::INVALID_ID,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.opacity <= 0.0
    }
}

/// Marches every volume overlapping `[ray.min_t, ray.max_t]` front to back
/// and composites their samples under the premultiplied "over" operator.
/// `jitter` in [0,1) offsets the first sample of each cell to decorrelate
/// banding across accumulated frames; the traversal itself is pure, so
/// identical inputs always produce identical output.
pub fn ray_march(volumes: &[VolumeState], ray: &Ray3f, jitter: Float) -> VolumeContribution {
    let mut contrib = VolumeContribution::empty();

    // Entry-ordered overlap list; overlapping volumes composite in the
    // order their bounds are first reached.
    let mut spans: Vec<(Float, Float, &VolumeState)> = volumes
        .iter()
        .filter_map(|v| {
            v.bounds
                .ray_intersect_range(ray)
                .map(|(t0, t1)| (t0.max(ray.min_t), t1.min(ray.max_t), v))
        })
        .filter(|(t0, t1, _)| t1 > t0)
        .collect();
    spans.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    for (t0, t1, state) in spans {
        march_segment(state, ray, t0, t1, jitter, &mut contrib, false);
        if contrib.opacity >= OPACITY_THRESHOLD {
            break;
        }
    }

    contrib
}

/// Shadow-ray variant: transmittance through all volume segments on the
/// ray, with the same skip structure but no color accumulation.
pub fn ray_march_transmittance(volumes: &[VolumeState], ray: &Ray3f, jitter: Float) -> Float {
    let mut contrib = VolumeContribution::empty();
    for state in volumes {
        if let Some((t0, t1)) = state.bounds.ray_intersect_range(ray) {
            let t0 = t0.max(ray.min_t);
            let t1 = t1.min(ray.max_t);
            if t1 <= t0 {
                continue;
            }
            march_segment(state, ray, t0, t1, jitter, &mut contrib, true);
            if contrib.opacity >= OPACITY_THRESHOLD {
                return 0.0;
            }
        }
    }
    1.0 - contrib.opacity
}

/// DDA over one volume's macro-cell grid: whole cells whose precomputed max
/// opacity is zero are stepped over without touching the field.
fn march_segment(state: &VolumeState,
                 ray: &Ray3f,
                 seg_t0: Float,
                 seg_t1: Float,
                 jitter: Float,
                 contrib: &mut VolumeContribution,
                 opacity_only: bool) {
    let grid = state.field.grid();
    let dims = grid.dims();
    let bounds = grid.world_bounds();
    let cell_size = grid.cell_size();
    let dir = ray.dir();
    let step = state.step_size;

    // Nudge the entry point inside so the start cell resolves.
    let entry = ray.at(seg_t0 + 1e-5 * (seg_t1 - seg_t0));
    let (mut cx, mut cy, mut cz) = match grid.cell_of_point(entry) {
        Some(cell) => cell,
        None => return,
    };

    // Amanatides & Woo setup.
    let mut t_next = [FLOAT_MAX; 3];
    let mut t_delta = [FLOAT_MAX; 3];
    let mut cell_step = [0i32; 3];
    let cell = [cx, cy, cz];
    for axis in 0..3 {
        let d = dir[axis];
        if d.abs() < 1e-8 {
            continue;
        }
        let size = cell_size[axis].max(1e-8);
        cell_step[axis] = if d > 0.0 { 1 } else { -1 };
        t_delta[axis] = size / d.abs();
        let boundary = bounds.p_min[axis]
            + (cell[axis] + if d > 0.0 { 1 } else { 0 }) as Float * size;
        t_next[axis] = seg_t0 + (boundary - entry[axis]) / d;
    }

    let mut t = seg_t0;
    while t < seg_t1 {
        let axis = if t_next[0] < t_next[1] && t_next[0] < t_next[2] {
            0
        } else if t_next[1] < t_next[2] {
            1
        } else {
            2
        };
        let cell_exit = t_next[axis].min(seg_t1);

        let skip = match grid.cell_index(cx, cy, cz) {
            Some(idx) => state.max_opacities[idx] <= 0.0,
            None => true,
        };

        if !skip {
            // Uniform samples across the cell span, jittered once per ray.
            let mut s = t + jitter * step;
            while s < cell_exit {
                let value = state.field.sample(ray.at(s));
                let rgba = state.volume.tf.classify(value);
                let alpha = (rgba.w * state.volume.density_scale).min(1.0);
                if alpha > 0.0 {
                    let weight = (1.0 - contrib.opacity) * alpha;
                    if !opacity_only {
                        contrib.color += Vector3f::new(rgba.x, rgba.y, rgba.z) * weight;
                        if contrib.depth == FLOAT_MAX {
                            contrib.depth = s;
                            contrib.volume_id = state.volume.id;
                            contrib.instance_id = state.instance_id;
                        }
                    }
                    contrib.opacity += weight;
                    if contrib.opacity >= OPACITY_THRESHOLD {
                        return;
                    }
                }
                s += step;
            }
        }

        t = cell_exit;
        match axis {
            0 => cx += cell_step[0],
            1 => cy += cell_step[1],
            _ => cz += cell_step[2],
        }
        t_next[axis] += t_delta[axis];
        if cx < 0 || cy < 0 || cz < 0 || cx >= dims.x || cy >= dims.y || cz >= dims.z {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::field::{FieldFilter, StructuredField};
    use crate::core::volume::{TransferFunction, Volume};
    use std::sync::Arc;

    fn opaque_tf() -> TransferFunction {
        TransferFunction::new(
            vec![Vector3f::new(1.0, 1.0, 1.0)],
            vec![0.0, 1.0],
            (0.0, 1.0),
        )
        .expect("valid tf")
    }

    fn state_for(data: Vec<Float>, dims: (usize, usize, usize)) -> VolumeState {
        let field = Arc::new(
            StructuredField::new(
                data,
                dims,
                Vector3f::zeros(),
                Vector3f::new(1.0, 1.0, 1.0),
                FieldFilter::Trilinear,
            )
            .expect("valid field"),
        );
        let volume = Arc::new(Volume::new(0, opaque_tf(), 1.0, 42));
        let max_opacities = volume.compute_max_opacities(field.grid());
        VolumeState {
            bounds: field.bounds(),
            step_size: field.step_size(),
            max_opacities,
            instance_id: 5,
            volume,
            field,
        }
    }

    fn axis_ray() -> Ray3f {
        Ray3f::new(
            Vector3f::new(-5.0, 7.5, 7.5),
            Vector3f::new(1.0, 0.0, 0.0),
            None,
            None,
        )
    }

    #[test]
    fn test_dense_volume_saturates() {
        let state = state_for(vec![1.0; 16 * 16 * 16], (16, 16, 16));
        let contrib = ray_march(std::slice::from_ref(&state), &axis_ray(), 0.5);
        assert!(contrib.opacity >= OPACITY_THRESHOLD);
        assert_eq!(contrib.volume_id, 42);
        assert_eq!(contrib.instance_id, 5);
        // First sample lands near the entry face at x = 0.
        assert!(contrib.depth > 4.0 && contrib.depth < 6.0);
    }

    #[test]
    fn test_empty_volume_contributes_nothing() {
        let state = state_for(vec![0.0; 16 * 16 * 16], (16, 16, 16));
        let contrib = ray_march(std::slice::from_ref(&state), &axis_ray(), 0.5);
        assert!(contrib.is_empty());
        assert_eq!(contrib.depth, FLOAT_MAX);
        assert_eq!(contrib.volume_id, crate::core::interaction::INVALID_ID);
    }

    #[test]
    fn test_marching_is_idempotent() {
        let mut data = vec![0.0; 16 * 16 * 16];
        for (i, v) in data.iter_mut().enumerate() {
            *v = (i % 5) as Float / 10.0;
        }
        let state = state_for(data, (16, 16, 16));
        let ray = axis_ray();
        let a = ray_march(std::slice::from_ref(&state), &ray, 0.25);
        let b = ray_march(std::slice::from_ref(&state), &ray, 0.25);
        assert_eq!(a.opacity, b.opacity);
        assert_eq!(a.color, b.color);
        assert_eq!(a.depth, b.depth);
    }

    #[test]
    fn test_shadow_transmittance_attenuates() {
        let state = state_for(vec![0.4; 16 * 16 * 16], (16, 16, 16));
        let tr = ray_march_transmittance(std::slice::from_ref(&state), &axis_ray(), 0.5);
        assert!(tr < 1.0);

        let miss = Ray3f::new(
            Vector3f::new(-5.0, 100.0, 100.0),
            Vector3f::new(1.0, 0.0, 0.0),
            None,
            None,
        );
        let clear = ray_march_transmittance(std::slice::from_ref(&state), &miss, 0.5);
        assert_eq!(clear, 1.0);
    }

    #[test]
    fn test_interval_clip_respects_ray_bounds() {
        let state = state_for(vec![1.0; 16 * 16 * 16], (16, 16, 16));
        // Far bound stops the ray before it reaches the volume at x = 0.
        let ray = Ray3f::new(
            Vector3f::new(-5.0, 7.5, 7.5),
            Vector3f::new(1.0, 0.0, 0.0),
            None,
            Some(2.0),
        );
        let contrib = ray_march(std::slice::from_ref(&state), &ray, 0.5);
        assert!(contrib.is_empty());
    }
}
