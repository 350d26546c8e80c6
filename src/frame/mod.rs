// Copyright 2026 @lucent

pub mod channel;
pub mod future;
pub mod state;

use crate::core::scene::Scene;
use crate::core::snapshot::SceneSnapshot;
use crate::integrators::raygen::{self, ScreenSample};
use crate::math::constants::{Float, Vector3f, Vector4f, FLOAT_MAX};
use channel::{Channel, ChannelData, ColorFormat, MappedChannel, PixelType};
use future::RenderFuture;
use state::{FrameState, PassInfo};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Post-accumulation hook applied to the normalized color buffer when the
/// renderer's denoise flag is set.
pub trait Denoiser: Send {
    fn denoise(&self, size: (u32, u32), color: &mut [[Float; 4]]);
}

/// Auxiliary channels requested at frame construction. Unrequested
/// channels map as `PixelType::Unknown` and hold no storage.
#[derive(Clone, Copy, Default)]
pub struct ChannelRequest {
    pub depth: bool,
    pub primitive_id: bool,
    pub object_id: bool,
    pub instance_id: bool,
    pub normal: bool,
    pub albedo: bool,
}

#[derive(Clone, Copy)]
pub struct FrameConfig {
    pub size: (u32, u32),
    pub color_format: ColorFormat,
    pub channels: ChannelRequest,
    /// Accumulation stops once this many full frames are summed.
    pub sample_limit: Option<u32>,
}

impl FrameConfig {
    pub fn new(size: (u32, u32)) -> Self {
        Self {
            size,
            color_format: ColorFormat::UFixed8Srgb,
            channels: ChannelRequest::default(),
            sample_limit: None,
        }
    }
}

struct FrameBuffers {
    accum_color: Vec<Vector4f>,
    depth: Option<Vec<Float>>,
    primitive_id: Option<Vec<u32>>,
    object_id: Option<Vec<u32>>,
    instance_id: Option<Vec<u32>>,
    accum_normal: Option<Vec<Vector3f>>,
    accum_albedo: Option<Vec<Vector3f>>,
    // Per-pixel sample counts. With checkerboarding the sub-patterns are
    // refreshed one pass at a time, so counts diverge across pixels
    // mid-cycle and a single global divisor would mis-normalize.
    sample_count: Vec<u32>,
}

impl FrameBuffers {
    fn new(config: &FrameConfig) -> Self {
        let count = (config.size.0 * config.size.1) as usize;
        let ids = |on: bool| if on { Some(vec![crate::core::interaction::INVALID_ID; count]) } else { None };
        let vecs = |on: bool| if on { Some(vec![Vector3f::zeros(); count]) } else { None };
        Self {
            accum_color: vec![Vector4f::zeros(); count],
            depth: if config.channels.depth { Some(vec![FLOAT_MAX; count]) } else { None },
            primitive_id: ids(config.channels.primitive_id),
            object_id: ids(config.channels.object_id),
            instance_id: ids(config.channels.instance_id),
            accum_normal: vecs(config.channels.normal),
            accum_albedo: vecs(config.channels.albedo),
            sample_count: vec![0; count],
        }
    }

    fn write(&mut self, idx: usize, sample: &ScreenSample, pass: &PassInfo) {
        if pass.overwrite {
            self.accum_color[idx] = sample.color;
            self.sample_count[idx] = 1;
        } else {
            self.accum_color[idx] += sample.color;
            self.sample_count[idx] += 1;
        }

        // First-hit channels are taken from frame zero only.
        if pass.frame_id == 0 {
            if let Some(depth) = &mut self.depth {
                depth[idx] = sample.depth;
            }
            if let Some(ids) = &mut self.primitive_id {
                ids[idx] = sample.prim_id;
            }
            if let Some(ids) = &mut self.object_id {
                ids[idx] = sample.object_id;
            }
            if let Some(ids) = &mut self.instance_id {
                ids[idx] = sample.instance_id;
            }
        }

        if let Some(normal) = &mut self.accum_normal {
            if pass.overwrite {
                normal[idx] = sample.normal;
            } else {
                normal[idx] += sample.normal;
            }
        }
        if let Some(albedo) = &mut self.accum_albedo {
            if pass.overwrite {
                albedo[idx] = sample.albedo;
            } else {
                albedo[idx] += sample.albedo;
            }
        }
    }
}

/// Progressive frame: owns the accumulation buffers, the state machine and
/// at most one in-flight launch at a time.
pub struct Frame {
    config: FrameConfig,
    state: FrameState,
    buffers: Arc<Mutex<FrameBuffers>>,
    duration: Arc<Mutex<Duration>>,
    in_flight: Option<thread::JoinHandle<()>>,
    denoiser: Option<Box<dyn Denoiser>>,
    last_denoise: bool,
}

impl Frame {
    pub fn new(config: FrameConfig) -> Result<Self, String> {
        if config.size.0 == 0 || config.size.1 == 0 {
            return Err(format!("invalid frame size {}x{}", config.size.0, config.size.1));
        }
        Ok(Self {
            buffers: Arc::new(Mutex::new(FrameBuffers::new(&config))),
            state: FrameState::new(config.sample_limit),
            duration: Arc::new(Mutex::new(Duration::from_secs(0))),
            in_flight: None,
            denoiser: None,
            last_denoise: false,
            config,
        })
    }

    /// Attaching or replacing the denoiser restarts accumulation.
    pub fn set_denoiser(&mut self, denoiser: Box<dyn Denoiser>) {
        self.denoiser = Some(denoiser);
        self.state.invalidate();
    }

    pub fn size(&self) -> (u32, u32) {
        self.config.size
    }

    /// Completed full frames accumulated so far.
    pub fn num_samples(&self) -> u32 {
        self.state.num_samples()
    }

    /// Wall time of the most recent launch.
    pub fn duration(&self) -> Duration {
        self.duration.lock().map(|d| *d).unwrap_or_default()
    }

    /// Whether the next render would restart accumulation, without
    /// rendering anything.
    pub fn next_frame_reset(&self, scene: &Scene) -> bool {
        let denoise = scene.renderer().map(|r| r.denoise).unwrap_or(false);
        self.state
            .next_frame_reset(scene.last_commit_epoch(), scene.last_upload_epoch(), denoise)
    }

    /// Kicks off one accumulation pass without blocking on a previous one;
    /// back-to-back passes are chained on the launch thread. Returns an
    /// already-completed future when the scene is not renderable or the
    /// sample limit is reached.
    pub fn render(&mut self, scene: &mut Scene) -> RenderFuture {
        let snapshot = match scene.flush() {
            Some(snapshot) => snapshot,
            None => {
                log::warn!("skipping render of incomplete scene (camera or renderer missing)");
                return RenderFuture::completed();
            }
        };
        let checkerboard = snapshot.renderer().checkerboard;
        let denoise = snapshot.renderer().denoise;

        let pass = match self.state.begin(
            scene.last_commit_epoch(),
            scene.last_upload_epoch(),
            denoise,
        ) {
            Some(pass) => pass,
            None => return RenderFuture::completed(),
        };
        self.state.end(checkerboard);
        self.last_denoise = denoise;

        let (render_future, inner) = RenderFuture::pending();
        let buffers = self.buffers.clone();
        let duration = self.duration.clone();
        let size = self.config.size;
        let prev = self.in_flight.take();

        self.in_flight = Some(thread::spawn(move || {
            if let Some(handle) = prev {
                if handle.join().is_err() {
                    log::error!("render launch panicked");
                }
            }
            let start = Instant::now();
            launch(&snapshot, size, pass, checkerboard, &buffers);
            if let Ok(mut d) = duration.lock() {
                *d = start.elapsed();
            }
            inner.complete();
        }));

        render_future
    }

    /// Blocking channel read. Waits for the in-flight launch, then returns
    /// an owned copy; mapping the same channel twice yields equal data.
    pub fn map(&mut self, channel: Channel) -> MappedChannel {
        self.wait_in_flight();

        let size = self.config.size;
        let buffers = match self.buffers.lock() {
            Ok(buffers) => buffers,
            Err(_) => return MappedChannel::unknown(size),
        };

        match channel {
            Channel::Color => {
                let mut pixels = normalized_color(&buffers.accum_color, &buffers.sample_count);
                if self.last_denoise {
                    if let Some(denoiser) = &self.denoiser {
                        denoiser.denoise(size, &mut pixels);
                    }
                }
                encode_color(pixels, self.config.color_format, size)
            }
            Channel::ColorGpu => MappedChannel {
                pixel_type: PixelType::Float32x4,
                size,
                data: ChannelData::Float32x4(normalized_color(&buffers.accum_color, &buffers.sample_count)),
            },
            Channel::Depth | Channel::DepthGpu => match &buffers.depth {
                Some(depth) => MappedChannel {
                    pixel_type: PixelType::Float32,
                    size,
                    data: ChannelData::Float32(depth.clone()),
                },
                None => MappedChannel::unknown(size),
            },
            Channel::PrimitiveId => map_ids(&buffers.primitive_id, size),
            Channel::ObjectId => map_ids(&buffers.object_id, size),
            Channel::InstanceId => map_ids(&buffers.instance_id, size),
            Channel::Normal => map_vec3(&buffers.accum_normal, &buffers.sample_count, size),
            Channel::Albedo => map_vec3(&buffers.accum_albedo, &buffers.sample_count, size),
        }
    }

    fn wait_in_flight(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            if handle.join().is_err() {
                log::error!("render launch panicked");
            }
        }
    }
}

impl Drop for Frame {
    fn drop(&mut self) {
        self.wait_in_flight();
    }
}

/// One accumulation pass over all rows: workers pull row indices from a
/// shared counter and publish finished rows under the buffer lock.
fn launch(snapshot: &SceneSnapshot,
          size: (u32, u32),
          pass: PassInfo,
          checkerboard: bool,
          buffers: &Arc<Mutex<FrameBuffers>>) {
    let workers = thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
    let next_row = AtomicUsize::new(0);

    thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| loop {
                let y = next_row.fetch_add(1, Ordering::Relaxed) as u32;
                if y >= size.1 {
                    break;
                }

                let mut row: Vec<(u32, ScreenSample)> = Vec::with_capacity(size.0 as usize);
                for x in 0..size.0 {
                    if checkerboard && ((x & 1) + ((y & 1) << 1)) != pass.checkerboard_id {
                        continue;
                    }
                    row.push((x, raygen::render_pixel(snapshot, x, y, size, pass.frame_id)));
                }

                if let Ok(mut buf) = buffers.lock() {
                    for (x, sample) in &row {
                        buf.write((y * size.0 + x) as usize, sample, &pass);
                    }
                }
            });
        }
    });
}

fn normalized_color(accum: &[Vector4f], counts: &[u32]) -> Vec<[Float; 4]> {
    accum
        .iter()
        .zip(counts)
        .map(|(c, &n)| {
            let inv = 1.0 / n.max(1) as Float;
            [c.x * inv, c.y * inv, c.z * inv, c.w * inv]
        })
        .collect()
}

fn encode_color(pixels: Vec<[Float; 4]>, format: ColorFormat, size: (u32, u32)) -> MappedChannel {
    match format {
        ColorFormat::Float32 => MappedChannel {
            pixel_type: PixelType::Float32x4,
            size,
            data: ChannelData::Float32x4(pixels),
        },
        ColorFormat::UFixed8 => MappedChannel {
            pixel_type: PixelType::UFixed8x4,
            size,
            data: ChannelData::UFixed8x4(
                pixels
                    .iter()
                    .map(|p| {
                        [
                            channel::to_unorm8(p[0]),
                            channel::to_unorm8(p[1]),
                            channel::to_unorm8(p[2]),
                            channel::to_unorm8(p[3]),
                        ]
                    })
                    .collect(),
            ),
        },
        ColorFormat::UFixed8Srgb => MappedChannel {
            pixel_type: PixelType::UFixed8x4,
            size,
            data: ChannelData::UFixed8x4(
                pixels
                    .iter()
                    .map(|p| {
                        [
                            channel::to_unorm8(channel::linear_to_srgb(p[0])),
                            channel::to_unorm8(channel::linear_to_srgb(p[1])),
                            channel::to_unorm8(channel::linear_to_srgb(p[2])),
                            channel::to_unorm8(p[3]),
                        ]
                    })
                    .collect(),
            ),
        },
    }
}

fn map_ids(ids: &Option<Vec<u32>>, size: (u32, u32)) -> MappedChannel {
    match ids {
        Some(ids) => MappedChannel {
            pixel_type: PixelType::UInt32,
            size,
            data: ChannelData::UInt32(ids.clone()),
        },
        None => MappedChannel::unknown(size),
    }
}

fn map_vec3(accum: &Option<Vec<Vector3f>>, counts: &[u32], size: (u32, u32)) -> MappedChannel {
    match accum {
        Some(accum) => MappedChannel {
            pixel_type: PixelType::Float32x3,
            size,
            data: ChannelData::Float32x3(
                accum
                    .iter()
                    .zip(counts)
                    .map(|(v, &n)| {
                        let inv = 1.0 / n.max(1) as Float;
                        [v.x * inv, v.y * inv, v.z * inv]
                    })
                    .collect(),
            ),
        },
        None => MappedChannel::unknown(size),
    }
}
