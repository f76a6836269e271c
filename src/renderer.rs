#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use scoped_threadpool::Pool;

use crate::camera::Camera;
use crate::error::ConfigError;
use crate::filter::Filter;
use crate::framebuffer::{Color4, Framebuffer};
use crate::group::ObjectGroup;
use crate::integrator::TraceContext;
use crate::sampler::adaptive_grid::AdaptiveGridSampler;
use crate::sampler::fixed_grid::FixedGridSampler;
use crate::tiler::{Tile, Tiler};
use crate::timer::Timer;

/// Which per-pixel sampler `render_tile` drives. `Fixed` draws a regular
/// jittered grid of `pixel_samples` and reconstructs with `filter`.
/// `Adaptive` recursively subdivides each pixel up to `max_subdivision`
/// times wherever corner shades disagree by more than
/// `subdivision_threshold`, bypassing the filter entirely.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SamplerType {
    Fixed,
    Adaptive,
}

/// Return value of every render callback: `Interrupt` propagates up and
/// aborts the surrounding loop -- tile, or frame, as appropriate.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CallbackStatus {
    Continue,
    Interrupt,
}

#[derive(Debug, Copy, Clone)]
pub struct FrameInfo {
    pub frame_id: i32,
    pub resolution: (usize, usize),
    pub tile_count: usize,
}

#[derive(Debug, Copy, Clone)]
pub struct TileInfo {
    pub frame_id: i32,
    pub tile_id: usize,
    pub region: (usize, usize, usize, usize),
    /// Fraction of tiles completed so far, including this one.
    pub progress: f32,
}

/// Pure-observer hooks the driver calls around frame and tile boundaries.
/// Implementations must be `Sync`: tile callbacks run concurrently across
/// worker threads.
pub trait RenderCallbacks: Sync {
    fn frame_start(&self, _info: &FrameInfo) -> CallbackStatus {
        CallbackStatus::Continue
    }
    fn frame_done(&self, _info: &FrameInfo) {}
    fn tile_start(&self, _info: &TileInfo) -> CallbackStatus {
        CallbackStatus::Continue
    }
    fn sample_done(&self, _info: &TileInfo) -> CallbackStatus {
        CallbackStatus::Continue
    }
    fn tile_done(&self, _info: &TileInfo, _pixels: &[Color4]) {}
}

pub struct NullCallbacks;
impl RenderCallbacks for NullCallbacks {}

#[derive(Debug, Copy, Clone)]
pub struct RenderStats {
    pub total_time: f32,
    pub tiles_rendered: usize,
    pub tiles_skipped: usize,
}

/// Fixed configuration for one `render_scene` call. Everything here must
/// be settled before rendering starts -- accelerators, shaders, lights and
/// the scene graph are read-only for the duration of the render.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub resolution: (usize, usize),
    pub render_region: (usize, usize, usize, usize),
    pub tile_size: (usize, usize),
    pub filter: Filter,
    pub sampler_type: SamplerType,
    pub pixel_samples: (usize, usize),
    pub sample_jitter: f32,
    pub max_subdivision: u32,
    pub subdivision_threshold: f32,
    pub sample_time_range: (f32, f32),
    pub cast_shadow: bool,
    pub max_reflect_depth: u32,
    pub max_refract_depth: u32,
    pub raymarch_step_camera: f32,
    pub raymarch_step_shadow: f32,
    pub raymarch_step_reflect: f32,
    pub raymarch_step_refract: f32,
    pub use_max_thread: bool,
    pub thread_count: u32,
}

impl RendererConfig {
    pub fn new(resolution: (usize, usize)) -> RendererConfig {
        RendererConfig {
            resolution,
            render_region: (0, 0, resolution.0, resolution.1),
            tile_size: (32, 32),
            filter: Filter::Gaussian { width: 2.0, height: 2.0 },
            sampler_type: SamplerType::Fixed,
            pixel_samples: (3, 3),
            sample_jitter: 1.0,
            max_subdivision: 4,
            subdivision_threshold: 0.1,
            sample_time_range: (0.0, 0.0),
            cast_shadow: true,
            max_reflect_depth: 5,
            max_refract_depth: 5,
            raymarch_step_camera: 0.05,
            raymarch_step_shadow: 0.2,
            raymarch_step_reflect: 0.1,
            raymarch_step_refract: 0.1,
            use_max_thread: false,
            thread_count: 1,
        }
    }

    fn resolve_thread_count(&self) -> u32 {
        if self.use_max_thread {
            num_cpus::get() as u32
        } else {
            self.thread_count.max(1)
        }
    }
}

/// Drives a tile-parallel render of `world` as seen through `camera` into a
/// caller-supplied framebuffer.
pub struct Renderer {
    pub camera: Camera,
    pub world: Arc<ObjectGroup>,
    pub config: RendererConfig,
}

impl Renderer {
    pub fn new(camera: Camera, world: Arc<ObjectGroup>, config: RendererConfig) -> Renderer {
        Renderer { camera, world, config }
    }

    pub fn render_scene<C: RenderCallbacks>(
        &self,
        framebuffer: &mut Framebuffer,
        callbacks: &C,
    ) -> Result<RenderStats, ConfigError> {
        if !self.world.has_built() {
            return Err(ConfigError::AcceleratorNotBuilt);
        }
        if framebuffer.width() != self.config.resolution.0 || framebuffer.height() != self.config.resolution.1 {
            return Err(ConfigError::NoFramebuffer);
        }

        let mut timer = Timer::new();

        let mut camera = self.camera.clone();
        camera.set_aspect_from_resolution(self.config.resolution.0, self.config.resolution.1);

        // Light preprocessing (step 3 of RenderScene) runs on
        // `ObjectInstance::preprocess_lights` before an instance is wrapped
        // in `Arc` and handed to the world group, since lights become
        // read-only for the rest of the render from that point on.

        let (xmin, ymin, xmax, ymax) = self.config.render_region;
        let tiler = Tiler::new(self.config.resolution, self.config.tile_size);
        let tiles = tiler.generate_tiles(xmin, ymin, xmax, ymax);

        let seed = next_frame_id();
        let frame_info = FrameInfo {
            frame_id: seed,
            resolution: self.config.resolution,
            tile_count: tiles.len(),
        };

        if callbacks.frame_start(&frame_info) == CallbackStatus::Interrupt {
            return Ok(RenderStats {
                total_time: timer.tick(),
                tiles_rendered: 0,
                tiles_skipped: tiles.len(),
            });
        }

        let aborted = AtomicBool::new(false);
        let tiles_done = AtomicUsize::new(0);
        let tiles_rendered = AtomicUsize::new(0);
        let tiles_skipped = AtomicUsize::new(0);
        let fb_mutex = Mutex::new(framebuffer);

        let thread_count = self.config.resolve_thread_count();
        let mut pool = Pool::new(thread_count);

        pool.scoped(|scope| {
            for (i, tile) in tiles.iter().enumerate() {
                let frame_info = &frame_info;
                let aborted = &aborted;
                let tiles_done = &tiles_done;
                let tiles_rendered = &tiles_rendered;
                let tiles_skipped = &tiles_skipped;
                let fb_mutex = &fb_mutex;
                let camera = &camera;
                let world = &self.world;
                let config = &self.config;
                scope.execute(move || {
                    if aborted.load(Ordering::Relaxed) {
                        tiles_skipped.fetch_add(1, Ordering::Relaxed);
                        return;
                    }

                    let done = render_tile(i, tile, frame_info, camera, world, config, callbacks, aborted, fb_mutex);
                    let n = tiles_done.fetch_add(1, Ordering::Relaxed) + 1;
                    let _ = n;
                    if done {
                        tiles_rendered.fetch_add(1, Ordering::Relaxed);
                    } else {
                        tiles_skipped.fetch_add(1, Ordering::Relaxed);
                    }
                });
            }
        });

        callbacks.frame_done(&frame_info);

        Ok(RenderStats {
            total_time: timer.tick(),
            tiles_rendered: tiles_rendered.load(Ordering::Relaxed),
            tiles_skipped: tiles_skipped.load(Ordering::Relaxed),
        })
    }
}

#[allow(clippy::too_many_arguments)]
fn render_tile<C: RenderCallbacks>(
    tile_id: usize,
    tile: &Tile,
    frame_info: &FrameInfo,
    camera: &Camera,
    world: &Arc<ObjectGroup>,
    config: &RendererConfig,
    callbacks: &C,
    aborted: &AtomicBool,
    fb_mutex: &Mutex<&mut Framebuffer>,
) -> bool {
    let region = (tile.xmin, tile.ymin, tile.xmax, tile.ymax);

    let mut tile_info = TileInfo { frame_id: frame_info.frame_id, tile_id, region, progress: 0.0 };

    if callbacks.tile_start(&tile_info) == CallbackStatus::Interrupt {
        return false;
    }

    let trace_point = |u: f32, v: f32, time: f32| -> crate::integrator::Rgba {
        let mut ctx = TraceContext::new(world.clone(), time);
        ctx.cast_shadow = config.cast_shadow;
        ctx.max_reflect_depth = config.max_reflect_depth;
        ctx.max_refract_depth = config.max_refract_depth;
        ctx.raymarch_step_camera = config.raymarch_step_camera;
        ctx.raymarch_step_shadow = config.raymarch_step_shadow;
        ctx.raymarch_step_reflect = config.raymarch_step_reflect;
        ctx.raymarch_step_refract = config.raymarch_step_refract;

        let ray = camera.get_ray(u, v, time);
        let (hit, rgba, _t) = ctx.trace(ray.orig, ray.dir, ray.tmin, ray.tmax);
        if hit {
            rgba
        } else {
            crate::integrator::Rgba::clear()
        }
    };

    let mut pixels = Vec::with_capacity(tile.width() * tile.height());

    match config.sampler_type {
        SamplerType::Fixed => {
            let mut sampler = FixedGridSampler::new(config.resolution, config.pixel_samples, config.filter.extent());
            sampler.jitter = config.sample_jitter;
            sampler.sample_time_range = config.sample_time_range;

            'fixed_pixels: for py in tile.ymin..tile.ymax {
                for px in tile.xmin..tile.xmax {
                    if aborted.load(Ordering::Relaxed) {
                        break 'fixed_pixels;
                    }

                    let samples = sampler.samples_for_pixel(px, py, frame_info.frame_id as u32);

                    let mut sum = (0.0f32, 0.0f32, 0.0f32, 0.0f32);
                    let mut weight_sum = 0.0f32;
                    for sample in &samples {
                        let rgba = trace_point(sample.uv.0, sample.uv.1, sample.time);

                        let dx = (config.resolution.0 as f32 * sample.uv.0) - (px as f32 + 0.5);
                        let dy = (config.resolution.1 as f32 * (1.0 - sample.uv.1)) - (py as f32 + 0.5);
                        let w = config.filter.weight(dx, dy);
                        if w <= 0.0 {
                            continue;
                        }

                        sum.0 += rgba.r * w;
                        sum.1 += rgba.g * w;
                        sum.2 += rgba.b * w;
                        sum.3 += rgba.a * w;
                        weight_sum += w;
                    }

                    let color = if weight_sum > 0.0 {
                        Color4::new(sum.0 / weight_sum, sum.1 / weight_sum, sum.2 / weight_sum, sum.3 / weight_sum)
                    } else {
                        Color4::black()
                    };
                    pixels.push(color);

                    if callbacks.sample_done(&tile_info) == CallbackStatus::Interrupt {
                        aborted.store(true, Ordering::Relaxed);
                        break 'fixed_pixels;
                    }
                }
            }
        }
        SamplerType::Adaptive => {
            let mut sampler = AdaptiveGridSampler::new(config.max_subdivision, config.subdivision_threshold);
            sampler.sample_time_range = config.sample_time_range;

            'adaptive_pixels: for py in tile.ymin..tile.ymax {
                for px in tile.xmin..tile.xmax {
                    if aborted.load(Ordering::Relaxed) {
                        break 'adaptive_pixels;
                    }

                    let (rgba, _shaded) = sampler.sample_pixel(px, py, config.resolution, |u, v, time| {
                        let c = trace_point(u, v, time);
                        (c.r, c.g, c.b, c.a)
                    });
                    pixels.push(Color4::new(rgba.0, rgba.1, rgba.2, rgba.3));

                    if callbacks.sample_done(&tile_info) == CallbackStatus::Interrupt {
                        aborted.store(true, Ordering::Relaxed);
                        break 'adaptive_pixels;
                    }
                }
            }
        }
    }

    {
        let mut fb = fb_mutex.lock().unwrap();
        let mut i = 0;
        'write: for py in tile.ymin..tile.ymax {
            for px in tile.xmin..tile.xmax {
                if i >= pixels.len() {
                    break 'write;
                }
                fb.set(px, py, pixels[i]);
                i += 1;
            }
        }
    }

    tile_info.progress = 1.0;
    callbacks.tile_done(&tile_info, &pixels);
    true
}

fn next_frame_id() -> i32 {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.subsec_nanos()).unwrap_or(0);
    (crate::hash::hash_u32(nanos, 0) & 0x7FFF_FFFF) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accel::bvh::Bvh;
    use crate::math::{Point, TransformSampleList, Vector};
    use crate::object::ObjectInstance;
    use crate::primitive::mesh::Mesh;
    use crate::shader::DiffuseShader;

    fn lit_plane_scene() -> (Camera, Arc<ObjectGroup>) {
        let points = vec![
            Point::new(-10.0, -10.0, 0.0),
            Point::new(10.0, -10.0, 0.0),
            Point::new(10.0, 10.0, 0.0),
            Point::new(-10.0, 10.0, 0.0),
        ];
        let faces = vec![[0, 1, 2], [0, 2, 3]];
        let mut bvh = Bvh::new(Box::new(Mesh::new(points, faces)));
        bvh.build().unwrap();

        let mut instance = ObjectInstance::new_surface(
            Box::new(bvh),
            TransformSampleList::new(),
            vec![Box::new(DiffuseShader { cd: (1.0, 1.0, 1.0) })],
        );
        let mut light_transforms = TransformSampleList::new();
        light_transforms.push_translate(Vector::new(0.0, 0.0, 5.0), 0.0);
        instance
            .lights
            .push(Box::new(crate::light::PointLight::new(light_transforms, (1.0, 1.0, 1.0), 50.0)));

        let mut group = ObjectGroup::new();
        group.add_instance(Arc::new(instance));
        group.build().unwrap();

        let mut cam_transforms = TransformSampleList::new();
        cam_transforms.push_translate(Vector::new(0.0, 0.0, 10.0), 0.0);
        let camera = Camera::new(cam_transforms, std::f32::consts::FRAC_PI_4);

        (camera, Arc::new(group))
    }

    #[test]
    fn renders_nonempty_framebuffer() {
        let (camera, world) = lit_plane_scene();
        let config = RendererConfig::new((16, 16));
        let renderer = Renderer::new(camera, world, config);
        let mut fb = Framebuffer::new(16, 16);

        let stats = renderer.render_scene(&mut fb, &NullCallbacks).unwrap();
        assert!(stats.tiles_rendered > 0);

        let center = fb.get(8, 8);
        assert!(center.a > 0.0);
        assert!(center.r > 0.0);
    }

    #[test]
    fn adaptive_sampler_renders_nonempty_framebuffer() {
        let (camera, world) = lit_plane_scene();
        let mut config = RendererConfig::new((16, 16));
        config.sampler_type = SamplerType::Adaptive;
        config.max_subdivision = 2;
        config.subdivision_threshold = 0.05;
        let renderer = Renderer::new(camera, world, config);
        let mut fb = Framebuffer::new(16, 16);

        let stats = renderer.render_scene(&mut fb, &NullCallbacks).unwrap();
        assert!(stats.tiles_rendered > 0);

        let center = fb.get(8, 8);
        assert!(center.a > 0.0);
        assert!(center.r > 0.0);
    }

    #[test]
    fn rejects_mismatched_framebuffer_size() {
        let (camera, world) = lit_plane_scene();
        let config = RendererConfig::new((16, 16));
        let renderer = Renderer::new(camera, world, config);
        let mut fb = Framebuffer::new(8, 8);

        let result = renderer.render_scene(&mut fb, &NullCallbacks);
        assert!(result.is_err());
    }

    struct CountingCallbacks {
        tile_starts: AtomicUsize,
        tile_dones: AtomicUsize,
    }

    impl RenderCallbacks for CountingCallbacks {
        fn tile_start(&self, _info: &TileInfo) -> CallbackStatus {
            self.tile_starts.fetch_add(1, Ordering::Relaxed);
            CallbackStatus::Continue
        }
        fn tile_done(&self, _info: &TileInfo, _pixels: &[Color4]) {
            self.tile_dones.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn tile_callbacks_fire_once_per_tile() {
        let (camera, world) = lit_plane_scene();
        let mut config = RendererConfig::new((64, 64));
        config.tile_size = (32, 32);
        let renderer = Renderer::new(camera, world, config);
        let mut fb = Framebuffer::new(64, 64);

        let callbacks = CountingCallbacks { tile_starts: AtomicUsize::new(0), tile_dones: AtomicUsize::new(0) };
        renderer.render_scene(&mut fb, &callbacks).unwrap();

        assert_eq!(callbacks.tile_starts.load(Ordering::Relaxed), 4);
        assert_eq!(callbacks.tile_dones.load(Ordering::Relaxed), 4);
    }
}
