mod accel;
mod bbox;
mod camera;
mod error;
mod filter;
mod float4;
mod framebuffer;
mod group;
mod hash;
mod integrator;
mod interval;
mod io;
mod lerp;
mod light;
mod math;
mod object;
mod primitive;
mod ray;
mod renderer;
mod sampler;
mod sampling;
mod shader;
mod tiler;
mod timer;

use std::path::Path;
use std::process;
use std::sync::Arc;

use clap::{App, Arg};

use crate::accel::bvh::Bvh;
use crate::camera::Camera;
use crate::framebuffer::Framebuffer;
use crate::group::ObjectGroup;
use crate::light::PointLight;
use crate::math::{Point, RotateOrder, TransformSampleList, Vector};
use crate::object::ObjectInstance;
use crate::primitive::mesh::Mesh;
use crate::renderer::{NullCallbacks, Renderer, RendererConfig, SamplerType};
use crate::shader::DiffuseShader;

/// Builds the scene-graph text parser would otherwise hand us: a unit cube
/// lit by a single point light, matching the "cube + point light" reference
/// scene. There being no parser here, the scene is wired up directly.
fn demo_scene() -> (Camera, Arc<ObjectGroup>) {
    let points = vec![
        Point::new(-1.0, -1.0, -1.0),
        Point::new(1.0, -1.0, -1.0),
        Point::new(1.0, 1.0, -1.0),
        Point::new(-1.0, 1.0, -1.0),
        Point::new(-1.0, -1.0, 1.0),
        Point::new(1.0, -1.0, 1.0),
        Point::new(1.0, 1.0, 1.0),
        Point::new(-1.0, 1.0, 1.0),
    ];
    let faces = vec![
        [0, 1, 2],
        [0, 2, 3], // -z
        [5, 4, 7],
        [5, 7, 6], // +z
        [4, 0, 3],
        [4, 3, 7], // -x
        [1, 5, 6],
        [1, 6, 2], // +x
        [3, 2, 6],
        [3, 6, 7], // +y
        [4, 5, 1],
        [4, 1, 0], // -y
    ];

    let mut bvh = Bvh::new(Box::new(Mesh::new(points, faces)));
    bvh.build().expect("cube accelerator build");

    let mut instance =
        ObjectInstance::new_surface(Box::new(bvh), TransformSampleList::new(), vec![Box::new(DiffuseShader { cd: (0.8, 0.8, 0.8) })]);

    let mut light_transforms = TransformSampleList::new();
    light_transforms.push_translate(Vector::new(1.0, 12.0, 3.0), 0.0);
    instance.lights.push(Box::new(PointLight::new(light_transforms, (1.0, 1.0, 1.0), 400.0)));
    instance.preprocess_lights();

    let mut group = ObjectGroup::new();
    group.add_instance(Arc::new(instance));
    group.build().expect("world group build");

    let mut cam_transforms = TransformSampleList::new();
    cam_transforms.rotate_order = RotateOrder::Zxy;
    cam_transforms.push_rotate(Vector::new((-35.264f32).to_radians(), 45.0f32.to_radians(), 0.0), 0.0);
    cam_transforms.push_translate(Vector::new(3.0, 3.0, 3.0), 0.0);
    let camera = Camera::new(cam_transforms, 40.0f32.to_radians());

    (camera, Arc::new(group))
}

fn parse_resolution(s: &str) -> Result<(usize, usize), String> {
    let mut parts = s.split('x');
    let w = parts.next().and_then(|p| p.parse().ok());
    let h = parts.next().and_then(|p| p.parse().ok());
    match (w, h, parts.next()) {
        (Some(w), Some(h), None) => Ok((w, h)),
        _ => Err(format!("'{}' is not a valid WIDTHxHEIGHT resolution", s)),
    }
}

fn main() {
    let app = App::new("raycore")
        .version("0.1.0")
        .about("Offline ray-traced renderer render core")
        .arg(
            Arg::with_name("resolution")
                .short("r")
                .long("resolution")
                .value_name("WIDTHxHEIGHT")
                .help("Output image resolution")
                .takes_value(true)
                .default_value("320x240"),
        )
        .arg(
            Arg::with_name("spp")
                .short("s")
                .long("spp")
                .value_name("N")
                .help("Pixel samples per axis (NxN samples per pixel)")
                .takes_value(true)
                .default_value("3")
                .validator(|s| s.parse::<usize>().map(|_| ()).map_err(|e| e.to_string())),
        )
        .arg(
            Arg::with_name("threads")
                .short("t")
                .long("threads")
                .value_name("N")
                .help("Number of threads to render with (0 for all logical cores)")
                .takes_value(true)
                .default_value("0")
                .validator(|s| s.parse::<u32>().map(|_| ()).map_err(|e| e.to_string())),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .value_name("FILE")
                .help("Output file path (.fb or .pto)")
                .takes_value(true)
                .default_value("render.fb"),
        )
        .arg(
            Arg::with_name("crop")
                .long("crop")
                .value_name("XMIN,YMIN,XMAX,YMAX")
                .help("Render only a sub-rectangle of the image")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("sampler")
                .long("sampler")
                .value_name("fixed|adaptive")
                .help("Pixel sampler: a fixed jittered grid or recursive adaptive subdivision")
                .takes_value(true)
                .possible_values(&["fixed", "adaptive"])
                .default_value("fixed"),
        )
        .arg(
            Arg::with_name("max_subdivision")
                .long("max-subdivision")
                .value_name("N")
                .help("Adaptive sampler: maximum number of recursive halvings per pixel")
                .takes_value(true)
                .default_value("4")
                .validator(|s| s.parse::<u32>().map(|_| ()).map_err(|e| e.to_string())),
        )
        .arg(
            Arg::with_name("subdivision_threshold")
                .long("subdivision-threshold")
                .value_name("T")
                .help("Adaptive sampler: per-channel corner spread above which a region subdivides")
                .takes_value(true)
                .default_value("0.1")
                .validator(|s| s.parse::<f32>().map(|_| ()).map_err(|e| e.to_string())),
        );

    let matches = app.get_matches();

    let resolution = match parse_resolution(matches.value_of("resolution").unwrap()) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    let spp: usize = matches.value_of("spp").unwrap().parse().unwrap();
    let threads: u32 = matches.value_of("threads").unwrap().parse().unwrap();
    let output = matches.value_of("output").unwrap();
    let max_subdivision: u32 = matches.value_of("max_subdivision").unwrap().parse().unwrap();
    let subdivision_threshold: f32 = matches.value_of("subdivision_threshold").unwrap().parse().unwrap();

    let mut config = RendererConfig::new(resolution);
    config.pixel_samples = (spp, spp);
    config.sampler_type = match matches.value_of("sampler").unwrap() {
        "adaptive" => SamplerType::Adaptive,
        _ => SamplerType::Fixed,
    };
    config.max_subdivision = max_subdivision;
    config.subdivision_threshold = subdivision_threshold;
    if threads == 0 {
        config.use_max_thread = true;
    } else {
        config.thread_count = threads;
    }

    if let Some(crop) = matches.value_of("crop") {
        let parts: Vec<usize> = crop.split(',').filter_map(|p| p.trim().parse().ok()).collect();
        if parts.len() != 4 {
            eprintln!("Error: --crop expects XMIN,YMIN,XMAX,YMAX");
            process::exit(1);
        }
        config.render_region = (parts[0], parts[1], parts[2], parts[3]);
    }

    let (camera, world) = demo_scene();
    let renderer = Renderer::new(camera, world, config.clone());
    let mut framebuffer = Framebuffer::new(config.resolution.0, config.resolution.1);

    println!("Rendering {}x{} at {}x{} samples/pixel...", config.resolution.0, config.resolution.1, spp, spp);
    let stats = match renderer.render_scene(&mut framebuffer, &NullCallbacks) {
        Ok(stats) => stats,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    println!(
        "Done in {:.2}s -- {} tiles rendered, {} tiles skipped",
        stats.total_time, stats.tiles_rendered, stats.tiles_skipped
    );

    let path = Path::new(output);
    let write_result = match path.extension().and_then(|e| e.to_str()) {
        Some("pto") => framebuffer.write_pto(path),
        _ => framebuffer.write_fb(path),
    };
    if let Err(e) = write_result {
        eprintln!("Error writing {}: {}", output, e);
        process::exit(1);
    }
}
