// Copyright 2026 @lucent

pub extern crate nalgebra as na;

pub mod core;
pub mod frame;
pub mod integrators;
pub mod io;
pub mod math;
pub mod renderers;
