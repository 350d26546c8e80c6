// Copyright 2026 @lucent

pub mod exr_utils;
pub mod png_utils;
