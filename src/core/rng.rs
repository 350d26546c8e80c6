// Copyright 2026 @lucent

use crate::math::constants::Float;

pub struct LcgRng {
    state: u64,
}

impl LcgRng {
    pub fn new(seed: u64) -> Self {
        // Scramble the raw seed so nearby pixel/frame pairs start far apart.
        let mut z = seed.wrapping_add(0x9E3779B97F4A7C15);
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
        Self { state: z ^ (z >> 31) }
    }

    /// Per-pixel, per-frame stream: uncorrelated across accumulated frames.
    pub fn for_pixel(frame_id: u32, x: u32, y: u32) -> Self {
        let seed = ((frame_id as u64) << 40)
            | (((y as u64) & 0xFFFFF) << 20)
            | ((x as u64) & 0xFFFFF);
        Self::new(seed)
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.state >> 32) as u32
    }

    pub fn next_f32(&mut self) -> Float {
        (self.next_u32() as Float) / (u32::MAX as Float)
    }
}
