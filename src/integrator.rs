#![allow(dead_code)]

use std::sync::Arc;

use crate::group::ObjectGroup;
use crate::light::{Light, LightSample};
use crate::math::{dot, Point, Vector};
use crate::object::ObjectInstance;
use crate::ray::{Ray, DEFAULT_TMIN};
use crate::shader::{SurfaceInput, SurfaceOutput};

/// Non-premultiplied color-plus-opacity carried through the integrator.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Rgba {
        Rgba { r, g, b, a }
    }

    pub fn clear() -> Rgba {
        Rgba::new(0.0, 0.0, 0.0, 0.0)
    }

    /// Composites `self` in front of `under`, Porter-Duff "over".
    pub fn over(self, under: Rgba) -> Rgba {
        let inv = 1.0 - self.a;
        Rgba::new(
            self.r + under.r * inv,
            self.g + under.g * inv,
            self.b + under.b * inv,
            self.a + under.a * inv,
        )
    }
}

/// Which kind of ray is currently being traced, governing its bounce budget
/// and which `raymarch_step_*` applies.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RayContext {
    Camera,
    Shadow,
    Reflect,
    Refract,
    SelfHit,
}

/// Per-trace state threaded through a recursive render: the current
/// visibility scope, accumulated bounce depths, and the render's fixed
/// configuration (bounce limits, raymarch step sizes, opacity threshold).
/// Cloned and narrowed at each reflect/refract/shadow/self-hit boundary.
#[derive(Clone)]
pub struct TraceContext {
    pub world: Arc<ObjectGroup>,
    pub trace_target: Arc<ObjectGroup>,
    pub time: f32,
    pub ray_context: RayContext,
    pub cast_shadow: bool,
    pub opacity_threshold: f32,

    pub reflect_depth: u32,
    pub refract_depth: u32,
    pub shadow_depth: u32,
    pub max_reflect_depth: u32,
    pub max_refract_depth: u32,
    pub max_shadow_depth: u32,

    pub raymarch_step_camera: f32,
    pub raymarch_step_shadow: f32,
    pub raymarch_step_reflect: f32,
    pub raymarch_step_refract: f32,

    current_instance: Option<Arc<ObjectInstance>>,
}

impl TraceContext {
    pub fn new(world: Arc<ObjectGroup>, time: f32) -> TraceContext {
        TraceContext {
            trace_target: world.clone(),
            world,
            time,
            ray_context: RayContext::Camera,
            cast_shadow: true,
            opacity_threshold: 0.995,
            reflect_depth: 0,
            refract_depth: 0,
            shadow_depth: 0,
            max_reflect_depth: 5,
            max_refract_depth: 5,
            max_shadow_depth: 1,
            raymarch_step_camera: 0.05,
            raymarch_step_shadow: 0.2,
            raymarch_step_reflect: 0.1,
            raymarch_step_refract: 0.1,
            current_instance: None,
        }
    }

    fn bounce_limit_reached(&self) -> bool {
        match self.ray_context {
            RayContext::Camera | RayContext::SelfHit => false,
            RayContext::Shadow => self.shadow_depth > self.max_shadow_depth,
            RayContext::Reflect => self.reflect_depth > self.max_reflect_depth,
            RayContext::Refract => self.refract_depth > self.max_refract_depth,
        }
    }

    fn raymarch_step(&self) -> f32 {
        match self.ray_context {
            RayContext::Camera | RayContext::SelfHit => self.raymarch_step_camera,
            RayContext::Shadow => self.raymarch_step_shadow,
            RayContext::Reflect => self.raymarch_step_reflect,
            RayContext::Refract => self.raymarch_step_refract,
        }
    }

    /// Top-level recursive trace: surface hit, then volume march in front
    /// of it, composited volume-over-surface.
    pub fn trace(&mut self, orig: Point, dir: Vector, tmin: f32, tmax: f32) -> (bool, Rgba, f32) {
        if self.bounce_limit_reached() {
            return (false, Rgba::clear(), std::f32::INFINITY);
        }

        let ray = Ray::with_range(orig, dir, tmin, tmax);
        let (surface_hit, surface_rgba, t_hit) = self.trace_surface(&ray);

        if self.ray_context == RayContext::Shadow && surface_rgba.a > self.opacity_threshold {
            return (true, surface_rgba, t_hit);
        }

        let mut march_ray = ray;
        if surface_hit {
            march_ray.tmax = t_hit;
        }
        let (volume_hit, volume_rgba) = self.raymarch_volume(&march_ray);

        let out = volume_rgba.over(surface_rgba);
        (surface_hit || volume_hit, out, t_hit)
    }

    fn trace_surface(&mut self, ray: &Ray) -> (bool, Rgba, f32) {
        let isect = match self.trace_target.intersect_surface(ray, self.time) {
            Some(i) => i,
            None => return (false, Rgba::clear(), std::f32::INFINITY),
        };

        let instance = self.trace_target.surface_instance(isect.object).clone();
        let input = SurfaceInput {
            p: isect.p,
            n: isect.n,
            cd: isect.cd,
            uv: isect.uv,
            i: ray.dir,
            dpdu: isect.dpdu,
            dpdv: isect.dpdv,
            shaded_object: isect.object,
        };

        self.current_instance = Some(instance.clone());
        let output = match instance.shader(isect.shading_group_id) {
            Some(shader) => shader.evaluate(self, &input),
            None => SurfaceOutput::new((0.0, 0.0, 0.0), 0.0),
        };

        let rgba = Rgba::new(output.cs.0, output.cs.1, output.cs.2, output.os);
        (true, rgba, isect.t_hit)
    }

    fn raymarch_volume(&mut self, ray: &Ray) -> (bool, Rgba) {
        let intervals = self.trace_target.intersect_volume(ray, self.time);
        if intervals.is_empty() {
            return (false, Rgba::clear());
        }

        let step = self.raymarch_step().max(1e-6);
        let t_start = intervals.min_t().max(ray.tmin);
        let t_end = intervals.max_t().min(ray.tmax);
        if t_start > t_end {
            return (false, Rgba::clear());
        }

        let shade = self.ray_context != RayContext::Shadow;
        let mut t = (t_start / step).ceil() * step;
        let mut out = Rgba::clear();
        let mut hit_any = false;

        while t <= t_end {
            let p = ray.point_at(t);
            let mut alpha = 0.0f32;
            let mut shaded = (0.0f32, 0.0f32, 0.0f32);

            for iv in intervals.containing(t) {
                let instance = self.trace_target.volume_instance(iv.object).clone();
                if let Some((n, density)) = instance.volume_sample(p, self.time) {
                    alpha = alpha.max(step * density);
                    if shade {
                        if let Some(shader) = instance.shader(0) {
                            let input = SurfaceInput {
                                p,
                                n,
                                cd: (1.0, 1.0, 1.0),
                                uv: (0.0, 0.0),
                                i: ray.dir,
                                dpdu: Vector::new(0.0, 0.0, 0.0),
                                dpdv: Vector::new(0.0, 0.0, 0.0),
                                shaded_object: iv.object,
                            };
                            self.current_instance = Some(instance.clone());
                            let out = shader.evaluate(self, &input);
                            shaded.0 += out.cs.0;
                            shaded.1 += out.cs.1;
                            shaded.2 += out.cs.2;
                        }
                    }
                }
            }

            let alpha = crate::math::clamp(alpha, 0.0, 1.0);
            if alpha > 0.0 {
                hit_any = true;
                let inv = 1.0 - out.a;
                out.r += shaded.0 * alpha * inv;
                out.g += shaded.1 * alpha * inv;
                out.b += shaded.2 * alpha * inv;
                out.a += alpha * inv;
            }

            if out.a >= self.opacity_threshold {
                out.a = 1.0;
                break;
            }
            t += step;
        }

        (hit_any, out)
    }

    /// Diffuse accumulation helper: sums each light's average, shadow-tested
    /// Lambertian contribution against the shading normal, scaled by `cd`.
    pub fn accumulate_diffuse(&mut self, input: &SurfaceInput, cd: (f32, f32, f32)) -> (f32, f32, f32) {
        let instance = match &self.current_instance {
            Some(i) => i.clone(),
            None => return (0.0, 0.0, 0.0),
        };

        let mut total = (0.0f32, 0.0f32, 0.0f32);
        for light in &instance.lights {
            let count = light.get_sample_count().max(1);
            let mut samples = Vec::new();
            light.get_samples(&mut samples, count, self.time);
            if samples.is_empty() {
                continue;
            }

            let mut light_sum = (0.0f32, 0.0f32, 0.0f32);
            for sample in &samples {
                let (ln, distance, cl) = self.illuminate(light.as_ref(), sample, input.p);
                if distance <= 0.0 {
                    continue;
                }
                let ndotl = dot(ln, input.n.into_vector()).max(0.0);
                if ndotl <= 0.0 {
                    continue;
                }
                light_sum.0 += cl.0 * ndotl;
                light_sum.1 += cl.1 * ndotl;
                light_sum.2 += cl.2 * ndotl;
            }

            let inv = 1.0 / samples.len() as f32;
            total.0 += light_sum.0 * inv;
            total.1 += light_sum.1 * inv;
            total.2 += light_sum.2 * inv;
        }

        (total.0 * cd.0, total.1 * cd.1, total.2 * cd.2)
    }

    /// `Illuminance`: direction, distance and shadow-attenuated color from
    /// a light sample toward `p`. Distance `0` means the sample contributes
    /// nothing (coincident point, or unreachable).
    fn illuminate(&mut self, light: &dyn Light, sample: &LightSample, p: Point) -> (Vector, f32, (f32, f32, f32)) {
        let to_light = sample.p - p;
        let distance = to_light.length();
        if distance < 1e-6 {
            return (Vector::new(0.0, 0.0, 0.0), 0.0, (0.0, 0.0, 0.0));
        }
        let ln = to_light * (1.0 / distance);
        let mut cl = light.illuminate(sample, p);

        if self.cast_shadow {
            let (hit, rgba, _t) = self.trace_shadow(p, ln, distance);
            let opacity = if hit { rgba.a.min(1.0) } else { 0.0 };
            let atten = 1.0 - opacity;
            cl = (cl.0 * atten, cl.1 * atten, cl.2 * atten);
        }

        (ln, distance, cl)
    }

    fn trace_shadow(&mut self, p: Point, dir: Vector, distance: f32) -> (bool, Rgba, f32) {
        let mut child = self.clone();
        child.ray_context = RayContext::Shadow;
        child.shadow_depth += 1;
        child.reflect_depth = 0;
        child.refract_depth = 0;
        child.trace_target = self
            .current_instance
            .as_ref()
            .and_then(|i| i.shadow_target.clone())
            .unwrap_or_else(|| self.world.clone());

        let tmax = (distance - DEFAULT_TMIN).max(0.0);
        child.trace(p, dir, DEFAULT_TMIN, tmax)
    }

    /// Issues a reflect ray from `p` along `dir`, narrowed to the current
    /// instance's `reflect_target` (falling back to the world group).
    pub fn trace_reflect(&mut self, p: Point, dir: Vector) -> (Rgba, f32) {
        if self.reflect_depth >= self.max_reflect_depth {
            return (Rgba::clear(), std::f32::INFINITY);
        }

        let mut child = self.clone();
        child.ray_context = RayContext::Reflect;
        child.reflect_depth += 1;
        child.trace_target = self
            .current_instance
            .as_ref()
            .and_then(|i| i.reflect_target.clone())
            .unwrap_or_else(|| self.world.clone());

        let (_, rgba, t) = child.trace(p, dir, DEFAULT_TMIN, std::f32::INFINITY);
        (rgba, t)
    }

    /// Issues a refract ray from `p` along `dir`, narrowed to the current
    /// instance's `refract_target` (falling back to the world group).
    pub fn trace_refract(&mut self, p: Point, dir: Vector) -> (Rgba, f32) {
        if self.refract_depth >= self.max_refract_depth {
            return (Rgba::clear(), std::f32::INFINITY);
        }

        let mut child = self.clone();
        child.ray_context = RayContext::Refract;
        child.refract_depth += 1;
        child.trace_target = self
            .current_instance
            .as_ref()
            .and_then(|i| i.refract_target.clone())
            .unwrap_or_else(|| self.world.clone());

        let (_, rgba, t) = child.trace(p, dir, DEFAULT_TMIN, std::f32::INFINITY);
        (rgba, t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accel::bvh::Bvh;
    use crate::light::PointLight;
    use crate::math::TransformSampleList;
    use crate::primitive::mesh::Mesh;
    use crate::shader::{ConstantShader, DiffuseShader};

    fn lit_plane_world() -> Arc<ObjectGroup> {
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
        instance.lights.push(Box::new(PointLight::new(light_transforms, (1.0, 1.0, 1.0), 50.0)));

        let mut group = ObjectGroup::new();
        group.add_instance(Arc::new(instance));
        group.build().unwrap();
        Arc::new(group)
    }

    #[test]
    fn camera_ray_hits_lit_diffuse_surface() {
        let world = lit_plane_world();
        let mut ctx = TraceContext::new(world, 0.0);
        let (hit, rgba, t_hit) = ctx.trace(Point::new(0.0, 0.0, 10.0), Vector::new(0.0, 0.0, -1.0), 0.0, 1000.0);
        assert!(hit);
        assert!((t_hit - 10.0).abs() < 1e-3);
        assert!(rgba.r > 0.0);
        assert_eq!(rgba.a, 1.0);
    }

    #[test]
    fn miss_returns_transparent_black() {
        let world = lit_plane_world();
        let mut ctx = TraceContext::new(world, 0.0);
        let (hit, rgba, _) = ctx.trace(Point::new(100.0, 100.0, 10.0), Vector::new(0.0, 0.0, -1.0), 0.0, 1000.0);
        assert!(!hit);
        assert_eq!(rgba.a, 0.0);
    }

    #[test]
    fn shadowed_point_receives_no_light() {
        let points = vec![
            Point::new(-10.0, -10.0, 0.0),
            Point::new(10.0, -10.0, 0.0),
            Point::new(10.0, 10.0, 0.0),
            Point::new(-10.0, 10.0, 0.0),
        ];
        let faces = vec![[0, 1, 2], [0, 2, 3]];
        let mut floor_bvh = Bvh::new(Box::new(Mesh::new(points, faces)));
        floor_bvh.build().unwrap();
        let mut floor = ObjectInstance::new_surface(
            Box::new(floor_bvh),
            TransformSampleList::new(),
            vec![Box::new(DiffuseShader { cd: (1.0, 1.0, 1.0) })],
        );
        let mut light_transforms = TransformSampleList::new();
        light_transforms.push_translate(Vector::new(0.0, 0.0, 5.0), 0.0);
        floor.lights.push(Box::new(PointLight::new(light_transforms, (1.0, 1.0, 1.0), 50.0)));

        let occ_points = vec![
            Point::new(-1.0, -1.0, 2.0),
            Point::new(1.0, -1.0, 2.0),
            Point::new(1.0, 1.0, 2.0),
            Point::new(-1.0, 1.0, 2.0),
        ];
        let occ_faces = vec![[0, 1, 2], [0, 2, 3]];
        let mut occ_bvh = Bvh::new(Box::new(Mesh::new(occ_points, occ_faces)));
        occ_bvh.build().unwrap();
        let occluder = ObjectInstance::new_surface(
            Box::new(occ_bvh),
            TransformSampleList::new(),
            vec![Box::new(ConstantShader { cd: (0.0, 0.0, 0.0) })],
        );

        let mut group = ObjectGroup::new();
        group.add_instance(Arc::new(floor));
        group.add_instance(Arc::new(occluder));
        group.build().unwrap();

        let mut ctx = TraceContext::new(Arc::new(group), 0.0);
        let (hit, rgba, _) = ctx.trace(Point::new(0.0, 0.0, 10.0), Vector::new(0.0, 0.0, -1.0), 0.0, 1000.0);
        assert!(hit);
        assert_eq!(rgba.r, 0.0);
    }

    #[test]
    fn reflect_depth_exhausts_to_black() {
        let world = lit_plane_world();
        let mut ctx = TraceContext::new(world, 0.0);
        ctx.ray_context = RayContext::Reflect;
        ctx.reflect_depth = ctx.max_reflect_depth;
        let (rgba, _) = ctx.trace_reflect(Point::new(0.0, 0.0, 1.0), Vector::new(0.0, 0.0, 1.0));
        assert_eq!(rgba.a, 0.0);
    }
}
