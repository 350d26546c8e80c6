// Copyright 2026 @lucent

pub mod bvh;
pub mod camera;
pub mod field;
pub mod geometry;
pub mod interaction;
pub mod light;
pub mod material;
pub mod rng;
pub mod scene;
pub mod snapshot;
pub mod volume;
