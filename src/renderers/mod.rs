// Copyright 2026 @lucent

pub mod renderer;
