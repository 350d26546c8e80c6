// Copyright 2026 @lucent

use crate::math::constants::{Float, Vector3f};

/// Sentinel for "no object" in the id channels.
pub const INVALID_ID: u32 = !0u32;

/// Nearest-surface-hit record produced by the snapshot's classifier and
/// consumed within the same integrator iteration; never persisted.
pub struct SurfaceHit {
    pub t: Float,
    pub p: Vector3f,
    pub geo_normal: Vector3f,
    pub sh_normal: Vector3f,
    pub material: usize,
    pub prim_id: u32,
    pub object_id: u32,
    pub instance_id: u32,
    /// Offset applied when restarting the ray past this hit, scaled with
    /// distance to keep self-intersection at bay.
    pub epsilon: Float,
}

impl SurfaceHit {
    pub fn offset_epsilon(t: Float) -> Float {
        (1e-3 * t).max(1e-4)
    }
}
