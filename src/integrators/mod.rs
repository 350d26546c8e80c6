// Copyright 2026 @lucent

pub mod marcher;
pub mod raygen;
