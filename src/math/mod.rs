// Copyright 2026 @lucent

pub mod aabb;
pub mod constants;
pub mod ray;
