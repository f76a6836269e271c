#![allow(dead_code)]

use std::sync::Arc;

use crate::accel::volume_accel::VolumeBearing;
use crate::accel::Accelerator;
use crate::bbox::BBox;
use crate::error::ConfigError;
use crate::group::ObjectGroup;
use crate::interval::Interval;
use crate::light::Light;
use crate::math::TransformSampleList;
use crate::primitive::volume::Volume;
use crate::primitive::Intersection;
use crate::ray::Ray;
use crate::shader::Shader;

/// An object instance carries exactly one of these: a surface accelerator,
/// or a single volume. The two are mutually exclusive per instance.
pub enum Geometry {
    Surface(Box<dyn Accelerator>),
    Volume(Volume),
}

/// A transform + shader/light binding around a primitive set, placed in the
/// world. Shading-group id 0 selects `shaders[0]`, the default binding.
/// The four override groups redirect secondary rays cast while shading this
/// instance's hits to a restricted visibility set instead of the default
/// world group -- e.g. a mirror that should not reflect itself.
pub struct ObjectInstance {
    geometry: Geometry,
    pub transforms: TransformSampleList,
    pub shaders: Vec<Box<dyn Shader>>,
    pub lights: Vec<Box<dyn Light>>,
    pub reflect_target: Option<Arc<ObjectGroup>>,
    pub refract_target: Option<Arc<ObjectGroup>>,
    pub shadow_target: Option<Arc<ObjectGroup>>,
    pub self_hit_target: Option<Arc<ObjectGroup>>,
    bounds: BBox,
}

const BOUNDS_TIME_SAMPLES: usize = 5;

fn widened_world_bounds(local_bounds: BBox, transforms: &TransformSampleList) -> BBox {
    let r = local_bounds.diagonal() * 0.5;
    let c = local_bounds.center();
    let sphere_box = BBox::from_points(
        crate::math::Point::new(c[0] - r, c[1] - r, c[2] - r),
        crate::math::Point::new(c[0] + r, c[1] + r, c[2] + r),
    );

    let mut world = BBox::reverse_infinite();
    for i in 0..BOUNDS_TIME_SAMPLES {
        let t = i as f32 / (BOUNDS_TIME_SAMPLES - 1) as f32;
        let matrix = transforms.lerp_transform(t).matrix();
        world |= sphere_box.transformed(matrix);
    }
    world
}

impl ObjectInstance {
    pub fn new_surface(
        accelerator: Box<dyn Accelerator>,
        transforms: TransformSampleList,
        shaders: Vec<Box<dyn Shader>>,
    ) -> ObjectInstance {
        assert!(accelerator.has_built(), "accelerator must be built before instancing");
        let bounds = widened_world_bounds(accelerator.bounds(), &transforms);
        ObjectInstance {
            geometry: Geometry::Surface(accelerator),
            transforms,
            shaders,
            lights: Vec::new(),
            reflect_target: None,
            refract_target: None,
            shadow_target: None,
            self_hit_target: None,
            bounds,
        }
    }

    pub fn new_volume(volume: Volume, transforms: TransformSampleList, shaders: Vec<Box<dyn Shader>>) -> ObjectInstance {
        let bounds = widened_world_bounds(volume.bounds(), &transforms);
        ObjectInstance {
            geometry: Geometry::Volume(volume),
            transforms,
            shaders,
            lights: Vec::new(),
            reflect_target: None,
            refract_target: None,
            shadow_target: None,
            self_hit_target: None,
            bounds,
        }
    }

    pub fn is_surface(&self) -> bool {
        matches!(self.geometry, Geometry::Surface(_))
    }

    pub fn is_volume(&self) -> bool {
        matches!(self.geometry, Geometry::Volume(_))
    }

    /// Runs each light's one-time preprocessing (e.g. `DomeLight` building
    /// its importance table). Must be called before this instance is
    /// wrapped in an `Arc` and added to a group -- lights are read-only for
    /// the duration of a render, so there is no later point at which this
    /// can run.
    pub fn preprocess_lights(&mut self) {
        for light in &mut self.lights {
            light.preprocess();
        }
    }

    pub fn shader(&self, shading_group_id: usize) -> Option<&dyn Shader> {
        self.shaders.get(shading_group_id).map(|s| s.as_ref())
    }

    pub fn bounds(&self) -> BBox {
        self.bounds
    }

    /// Density and a world-space pseudo-normal at a world-space point,
    /// sampled from this instance's volume. `None` for surface instances.
    pub fn volume_sample(&self, p: crate::math::Point, time: f32) -> Option<(crate::math::Normal, f32)> {
        let volume = match &self.geometry {
            Geometry::Volume(v) => v,
            Geometry::Surface(_) => return None,
        };

        let transform = self.transforms.lerp_transform(time);
        let local_p = p * transform.inverse();
        let (_, local_n, density) = volume.sample_input(local_p);
        let world_n = (local_n * transform.matrix()).normalized();
        Some((world_n, density))
    }

    /// Transforms `ray` into local space, intersects the instance's surface
    /// accelerator, then transforms the hit back into world space. Returns
    /// `None` for volume-only instances.
    pub fn intersect(&self, ray: &Ray, time: f32) -> Option<Intersection> {
        let accel = match &self.geometry {
            Geometry::Surface(a) => a,
            Geometry::Volume(_) => return None,
        };

        let transform = self.transforms.lerp_transform(time);
        let inv = transform.inverse();
        let local_ray = Ray::with_range(ray.orig * inv, ray.dir * inv, ray.tmin, ray.tmax);

        let mut isect = accel.intersect(&local_ray, time)?;
        let fwd = transform.matrix();
        isect.p = isect.p * fwd;
        isect.n = isect.n * fwd;
        isect.dpdu = isect.dpdu * fwd;
        isect.dpdv = isect.dpdv * fwd;
        Some(isect)
    }
}

impl VolumeBearing for ObjectInstance {
    fn interval_intersect(&self, ray: &Ray, time: f32) -> Option<Interval> {
        let volume = match &self.geometry {
            Geometry::Volume(v) => v,
            Geometry::Surface(_) => return None,
        };

        let transform = self.transforms.lerp_transform(time);
        let inv = transform.inverse();
        let local_ray = Ray::with_range(ray.orig * inv, ray.dir * inv, ray.tmin, ray.tmax);
        volume.interval_intersect(&local_ray)
    }

    fn bounds(&self) -> BBox {
        self.bounds
    }
}

pub fn check_exclusive_geometry(has_surface: bool, has_volume: bool) -> Result<(), ConfigError> {
    if has_surface && has_volume {
        Err(ConfigError::BothSurfaceAndVolume)
    } else if !has_surface && !has_volume {
        Err(ConfigError::NeitherSurfaceNorVolume)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accel::bvh::Bvh;
    use crate::math::{Point, Vector};
    use crate::primitive::mesh::Mesh;

    fn triangle_instance() -> ObjectInstance {
        let points = vec![
            Point::new(-1.0, -1.0, 0.0),
            Point::new(1.0, -1.0, 0.0),
            Point::new(0.0, 1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2]];
        let mut bvh = Bvh::new(Box::new(Mesh::new(points, faces)));
        bvh.build().unwrap();

        let mut transforms = TransformSampleList::new();
        transforms.push_translate(Vector::new(0.0, 0.0, 5.0), 0.0);
        ObjectInstance::new_surface(Box::new(bvh), transforms, Vec::new())
    }

    #[test]
    fn intersects_in_world_space() {
        let inst = triangle_instance();
        let ray = Ray::with_range(Point::new(0.0, 0.0, 0.0), Vector::new(0.0, 0.0, 1.0), 0.0, 1000.0);
        let isect = inst.intersect(&ray, 0.0).unwrap();
        assert!((isect.t_hit - 5.0).abs() < 1e-4);
        assert!((isect.p[2] - 5.0).abs() < 1e-4);
    }

    #[test]
    fn bounds_widen_across_translation() {
        let points = vec![Point::new(-0.1, -0.1, -0.1), Point::new(0.1, 0.1, 0.1)];
        let faces: Vec<[u32; 3]> = Vec::new();
        let _ = (points, faces);

        let mut transforms = TransformSampleList::new();
        transforms.push_translate(Vector::new(0.0, 0.0, 0.0), 0.0);
        transforms.push_translate(Vector::new(10.0, 0.0, 0.0), 1.0);

        let b = widened_world_bounds(
            BBox::from_points(Point::new(-0.5, -0.5, -0.5), Point::new(0.5, 0.5, 0.5)),
            &transforms,
        );
        assert!(b.max[0] > 9.0);
        assert!(b.min[0] < 0.1);
    }
}
