// Copyright 2026 @lucent

use crate::math::constants::Float;

/// Channels a frame can expose through `map`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    Color,
    /// Raw float color, bypassing the configured output format.
    ColorGpu,
    Depth,
    DepthGpu,
    PrimitiveId,
    ObjectId,
    InstanceId,
    Normal,
    Albedo,
}

/// Output encoding for the `Color` channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorFormat {
    UFixed8,
    UFixed8Srgb,
    Float32,
}

/// Element type of a mapped channel. `Unknown` marks channels that were
/// not requested at frame construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelType {
    Unknown,
    UFixed8x4,
    Float32,
    Float32x3,
    Float32x4,
    UInt32,
}

/// Owned copy of one channel's pixels, tagged with its element type.
#[derive(Clone, Debug, PartialEq)]
pub enum ChannelData {
    Unknown,
    UFixed8x4(Vec<[u8; 4]>),
    Float32(Vec<Float>),
    Float32x3(Vec<[Float; 3]>),
    Float32x4(Vec<[Float; 4]>),
    UInt32(Vec<u32>),
}

pub struct MappedChannel {
    pub pixel_type: PixelType,
    pub size: (u32, u32),
    pub data: ChannelData,
}

impl MappedChannel {
    pub fn unknown(size: (u32, u32)) -> Self {
        Self { pixel_type: PixelType::Unknown, size, data: ChannelData::Unknown }
    }
}

pub fn to_unorm8(v: Float) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

pub fn linear_to_srgb(v: Float) -> Float {
    if v <= 0.0031308 {
        v * 12.92
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}
