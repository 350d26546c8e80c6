// Copyright 2026 @lucent

use lucent::core::camera::Camera;
use lucent::core::field::{FieldFilter, StructuredField};
use lucent::core::geometry::Geometry;
use lucent::core::light::Light;
use lucent::core::material::{AlphaMode, Material};
use lucent::core::scene::Scene;
use lucent::core::volume::{TransferFunction, Volume};
use lucent::frame::channel::{Channel, ChannelData, ColorFormat};
use lucent::frame::{ChannelRequest, Frame, FrameConfig};
use lucent::io::{exr_utils, png_utils};
use lucent::math::constants::{Float, Vector3f, Vector4f};
use lucent::renderers::renderer::Renderer;

use indicatif::{ProgressBar, ProgressStyle};
use std::env;

struct Options {
    output: String,
    size: (u32, u32),
    spp: u32,
    checkerboard: bool,
}

fn parse_args() -> Result<Options, String> {
    let mut options = Options {
        output: "lucent".to_string(),
        size: (800, 600),
        spp: 32,
        checkerboard: false,
    };

    let args: Vec<String> = env::args().skip(1).collect();
    let mut idx = 0;
    while idx < args.len() {
        match args[idx].as_str() {
            "--spp" => {
                idx += 1;
                let value = args.get(idx).ok_or("--spp needs a value")?;
                options.spp = value.parse().map_err(|_| format!("bad --spp value: {}", value))?;
            }
            "--size" => {
                idx += 1;
                let value = args.get(idx).ok_or("--size needs a value, e.g. 800x600")?;
                let mut parts = value.splitn(2, 'x');
                let w = parts.next().and_then(|s| s.parse().ok());
                let h = parts.next().and_then(|s| s.parse().ok());
                match (w, h) {
                    (Some(w), Some(h)) => options.size = (w, h),
                    _ => return Err(format!("bad --size value: {}", value)),
                }
            }
            "--checkerboard" => options.checkerboard = true,
            other if !other.starts_with("--") => options.output = other.to_string(),
            other => return Err(format!("unknown option: {}", other)),
        }
        idx += 1;
    }

    Ok(options)
}

/// Spherical puff of smoke: density falls off linearly from the center.
fn smoke_field() -> Result<StructuredField, String> {
    const N: usize = 32;
    let mut data = vec![0.0; N * N * N];
    let center = (N as Float - 1.0) / 2.0;
    for z in 0..N {
        for y in 0..N {
            for x in 0..N {
                let dx = (x as Float - center) / center;
                let dy = (y as Float - center) / center;
                let dz = (z as Float - center) / center;
                let d = (dx * dx + dy * dy + dz * dz).sqrt();
                data[(z * N + y) * N + x] = (1.0 - d).max(0.0);
            }
        }
    }

    let extent = 1.6;
    StructuredField::new(
        data,
        (N, N, N),
        Vector3f::new(-0.8, 1.0, -0.8),
        Vector3f::new(extent / (N - 1) as Float,
                      extent / (N - 1) as Float,
                      extent / (N - 1) as Float),
        FieldFilter::Trilinear,
    )
}

fn build_scene(options: &Options) -> Result<Scene, String> {
    let mut scene = Scene::new();

    // Ground quad.
    let ground = scene.add_geometry(Geometry::quads(
        vec![
            Vector3f::new(-5.0, 0.0, -5.0),
            Vector3f::new(5.0, 0.0, -5.0),
            Vector3f::new(5.0, 0.0, 5.0),
            Vector3f::new(-5.0, 0.0, 5.0),
        ],
        Some(vec![[0, 1, 2, 3]]),
        None,
    )?);
    let ground_mat = scene.add_material(Material::matte(Vector3f::new(0.55, 0.55, 0.55)));
    let ground_surf = scene.add_surface(ground, ground_mat, 1);

    let spheres = scene.add_geometry(Geometry::spheres(
        vec![Vector3f::new(-1.0, 0.5, 0.0), Vector3f::new(1.1, 0.5, 0.4)],
        vec![0.5, 0.5],
    )?);
    let red = scene.add_material(Material::matte(Vector3f::new(0.8, 0.15, 0.1)));
    let glassy = scene.add_material(Material::new(
        Vector3f::new(0.2, 0.4, 0.9),
        0.45,
        AlphaMode::Blend,
    ));
    let red_surf = scene.add_surface(spheres, red, 2);
    let blue_surf = scene.add_surface(spheres, glassy, 3);
    scene.add_surface_instance(vec![ground_surf, red_surf, blue_surf], 0);

    let field = scene.add_field(smoke_field()?);
    let tf = TransferFunction::new(
        vec![Vector3f::new(0.9, 0.55, 0.15), Vector3f::new(0.95, 0.9, 0.8)],
        vec![0.0, 0.0, 0.3, 0.8],
        (0.0, 1.0),
    )?;
    let volume = scene.add_volume(Volume::new(field, tf, 2.0, 10));
    scene.add_volume_instance(vec![volume], 1);

    scene.add_light(Light::directional(
        Vector3f::new(-0.4, -1.0, 0.3),
        Vector3f::new(1.0, 0.97, 0.92),
        2.5,
    ));
    scene.add_light(Light::ambient(Vector3f::new(0.6, 0.7, 1.0), 0.15));

    scene.set_camera(Camera::perspective(
        Vector3f::new(0.0, 1.6, -4.2),
        Vector3f::new(0.0, 0.8, 0.0),
        Vector3f::new(0.0, 1.0, 0.0),
        40.0_f32.to_radians(),
        options.size.0 as Float / options.size.1 as Float,
    ));
    scene.set_renderer(
        Renderer::default()
            .with_background(Vector4f::new(0.03, 0.04, 0.08, 1.0))
            .with_ambient(Vector3f::new(1.0, 1.0, 1.0), 0.1)
            .with_ao_samples(2)
            .with_checkerboard(options.checkerboard),
    );

    Ok(scene)
}

fn run() -> Result<(), String> {
    let options = parse_args()?;
    let mut scene = build_scene(&options)?;

    let mut config = FrameConfig::new(options.size);
    config.color_format = ColorFormat::UFixed8Srgb;
    config.channels = ChannelRequest {
        depth: true,
        object_id: true,
        ..ChannelRequest::default()
    };
    config.sample_limit = Some(options.spp);
    let mut frame = Frame::new(config)?;

    log::info!(
        "Rendering {}x{} at {} spp{}.",
        options.size.0, options.size.1, options.spp,
        if options.checkerboard { " (checkerboard)" } else { "" }
    );

    let bar = ProgressBar::new(options.spp as u64);
    if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} frames ({elapsed})") {
        bar.set_style(style);
    }
    while frame.num_samples() < options.spp {
        frame.render(&mut scene).wait();
        bar.set_position(frame.num_samples() as u64);
    }
    bar.finish();
    log::info!("Last pass took {:?}.", frame.duration());

    let (width, height) = frame.size();
    match frame.map(Channel::ColorGpu).data {
        ChannelData::Float32x4(pixels) => {
            let rgb: Vec<(Float, Float, Float)> =
                pixels.iter().map(|p| (p[0], p[1], p[2])).collect();
            exr_utils::write_exr_to_file(
                &rgb,
                width as usize,
                height as usize,
                &format!("{}.exr", options.output),
            )?;
        }
        _ => return Err("color channel unavailable".to_string()),
    }

    match frame.map(Channel::Color).data {
        ChannelData::UFixed8x4(pixels) => {
            png_utils::write_png_to_file(
                &pixels,
                width,
                height,
                &format!("{}.png", options.output),
            )?;
        }
        _ => return Err("color channel unavailable".to_string()),
    }

    Ok(())
}

fn main() {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("lucent: {}", e);
        std::process::exit(1);
    }
}
