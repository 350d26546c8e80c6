// Copyright 2026 @lucent

use crate::core::field::UniformGrid;
use crate::math::constants::{Float, Vector3f, Vector4f};

const TF_LUT_DIM: usize = 128;

/// 1D transfer function discretized into a fixed-size lookup table from
/// color and opacity control points spread linearly over `value_range`.
pub struct TransferFunction {
    lut: Vec<Vector4f>,
    value_range: (Float, Float),
}

impl TransferFunction {
    pub fn new(color: Vec<Vector3f>,
               opacity: Vec<Float>,
               value_range: (Float, Float)) -> Result<Self, String> {
        if color.is_empty() {
            return Err("transfer function: missing 'color' control points".to_string());
        }
        if opacity.is_empty() {
            return Err("transfer function: missing 'opacity' control points".to_string());
        }
        if value_range.1 <= value_range.0 {
            return Err("transfer function: degenerate value range".to_string());
        }

        let mut lut = Vec::with_capacity(TF_LUT_DIM);
        for i in 0..TF_LUT_DIM {
            let p = i as Float / (TF_LUT_DIM - 1) as Float;
            let c = interpolate_vec3(&color, p);
            let o = interpolate_scalar(&opacity, p);
            lut.push(Vector4f::new(c.x, c.y, c.z, o));
        }

        Ok(Self { lut, value_range })
    }

    pub fn value_range(&self) -> (Float, Float) {
        self.value_range
    }

    /// Color and opacity for a raw field value.
    pub fn classify(&self, value: Float) -> Vector4f {
        let (lo, hi) = self.value_range;
        let p = ((value - lo) / (hi - lo)).clamp(0.0, 1.0);
        let f = p * (TF_LUT_DIM - 1) as Float;
        let i0 = f.floor() as usize;
        let i1 = (i0 + 1).min(TF_LUT_DIM - 1);
        let t = f - i0 as Float;
        self.lut[i0] * (1.0 - t) + self.lut[i1] * t
    }

    /// Largest opacity the table can produce for any value in `[lo, hi]`.
    /// Feeds the per-cell skip table for empty-space skipping.
    pub fn max_opacity_in(&self, lo: Float, hi: Float) -> Float {
        let (vlo, vhi) = self.value_range;
        let inv = 1.0 / (vhi - vlo);
        let p0 = ((lo - vlo) * inv).clamp(0.0, 1.0);
        let p1 = ((hi - vlo) * inv).clamp(0.0, 1.0);
        let i0 = (p0 * (TF_LUT_DIM - 1) as Float).floor() as usize;
        let i1 = ((p1 * (TF_LUT_DIM - 1) as Float).ceil() as usize).min(TF_LUT_DIM - 1);

        let mut max_o: Float = 0.0;
        for i in i0..=i1 {
            max_o = max_o.max(self.lut[i].w);
        }
        max_o
    }
}

/// Scalar volume: a spatial field seen through a transfer function.
pub struct Volume {
    pub field: usize,
    pub tf: TransferFunction,
    pub density_scale: Float,
    pub id: u32,
}

impl Volume {
    pub fn new(field: usize, tf: TransferFunction, density_scale: Float, id: u32) -> Self {
        Self { field, tf, density_scale, id }
    }

    /// Per-macro-cell max opacities, derived from the field's precomputed
    /// value ranges. Recomputed whenever field or transfer function change.
    pub fn compute_max_opacities(&self, grid: &UniformGrid) -> Vec<Float> {
        let mut out = Vec::with_capacity(grid.cell_count());
        for cell in 0..grid.cell_count() {
            let (lo, hi) = grid.value_range(cell);
            if lo > hi {
                out.push(0.0);
            } else {
                out.push(self.tf.max_opacity_in(lo, hi));
            }
        }
        out
    }
}

fn interpolate_scalar(points: &[Float], p: Float) -> Float {
    if points.len() == 1 {
        return points[0];
    }
    let f = p * (points.len() - 1) as Float;
    let i0 = f.floor() as usize;
    let i1 = (i0 + 1).min(points.len() - 1);
    let t = f - i0 as Float;
    points[i0] * (1.0 - t) + points[i1] * t
}

fn interpolate_vec3(points: &[Vector3f], p: Float) -> Vector3f {
    if points.len() == 1 {
        return points[0];
    }
    let f = p * (points.len() - 1) as Float;
    let i0 = f.floor() as usize;
    let i1 = (i0 + 1).min(points.len() - 1);
    let t = f - i0 as Float;
    points[i0] * (1.0 - t) + points[i1] * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::field::{FieldFilter, StructuredField};

    fn ramp_tf() -> TransferFunction {
        TransferFunction::new(
            vec![Vector3f::new(0.0, 0.0, 1.0), Vector3f::new(1.0, 0.0, 0.0)],
            vec![0.0, 1.0],
            (0.0, 1.0),
        )
        .expect("valid tf")
    }

    #[test]
    fn test_classify_endpoints() {
        let tf = ramp_tf();
        let lo = tf.classify(0.0);
        let hi = tf.classify(1.0);
        assert!((lo.z - 1.0).abs() < 1e-4 && lo.w.abs() < 1e-4);
        assert!((hi.x - 1.0).abs() < 1e-4 && (hi.w - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_classify_clamps_outside_range() {
        let tf = ramp_tf();
        let below = tf.classify(-5.0);
        let above = tf.classify(5.0);
        assert!(below.w.abs() < 1e-4);
        assert!((above.w - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_max_opacity_over_subrange() {
        let tf = ramp_tf();
        assert!(tf.max_opacity_in(0.0, 0.25) < 0.3);
        assert!((tf.max_opacity_in(0.0, 1.0) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_missing_control_points_rejected() {
        assert!(TransferFunction::new(vec![], vec![1.0], (0.0, 1.0)).is_err());
        assert!(TransferFunction::new(vec![Vector3f::zeros()], vec![], (0.0, 1.0)).is_err());
        assert!(TransferFunction::new(vec![Vector3f::zeros()], vec![1.0], (1.0, 1.0)).is_err());
    }

    #[test]
    fn test_cell_max_opacities_track_field_values() {
        // Field stays at 0 except one corner pushed to the top of the range.
        let mut data = vec![0.0; 16 * 16 * 16];
        data[0] = 1.0;
        let field = StructuredField::new(
            data,
            (16, 16, 16),
            Vector3f::zeros(),
            Vector3f::new(1.0, 1.0, 1.0),
            FieldFilter::Trilinear,
        )
        .expect("valid field");

        let volume = Volume::new(0, ramp_tf(), 1.0, 1);
        let max_opacities = volume.compute_max_opacities(field.grid());
        assert_eq!(max_opacities.len(), field.grid().cell_count());
        // Cell containing the hot voxel saturates; a far cell stays empty.
        assert!((max_opacities[0] - 1.0).abs() < 1e-4);
        assert!(max_opacities[max_opacities.len() - 1] < 1e-4);
    }
}
