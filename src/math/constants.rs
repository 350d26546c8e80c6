/* Copyright 2026 @lucent */

pub type Float = f32;
pub type Int = i32;

pub type Vector2f = nalgebra::Vector2<Float>;
pub type Vector3f = nalgebra::Vector3<Float>;
pub type Vector4f = nalgebra::Vector4<Float>;
pub type Vector3i = nalgebra::Vector3<Int>;

pub const FLOAT_MIN: Float = std::f32::MIN;
pub const FLOAT_MAX: Float = std::f32::MAX;

pub const PI: Float = 3.14159265359;

/// Accumulated opacity at which a ray is considered fully absorbed.
pub const OPACITY_THRESHOLD: Float = 0.99;
