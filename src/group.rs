#![allow(dead_code)]

use std::sync::Arc;

use crate::accel::bvh::Bvh;
use crate::accel::volume_accel::VolumeAccelerator;
use crate::accel::Accelerator;
use crate::bbox::BBox;
use crate::error::ConfigError;
use crate::interval::IntervalList;
use crate::object::ObjectInstance;
use crate::primitive::object_set::ObjectSet;
use crate::primitive::Intersection;
use crate::ray::Ray;

/// A set of instances acting as a visibility scope: the world, or a
/// restricted reflect/refract/shadow/self-hit target. Adding an instance
/// dispatches on whether it carries a surface or a volume, splitting it
/// into one of two independently-accelerated subsets.
pub struct ObjectGroup {
    surface_instances: Vec<Arc<ObjectInstance>>,
    volume_instances: Vec<Arc<ObjectInstance>>,
    surface_accel: Option<Bvh>,
    volume_accel: Option<VolumeAccelerator>,
    has_built: bool,
}

impl ObjectGroup {
    pub fn new() -> ObjectGroup {
        ObjectGroup {
            surface_instances: Vec::new(),
            volume_instances: Vec::new(),
            surface_accel: None,
            volume_accel: None,
            has_built: false,
        }
    }

    pub fn add_instance(&mut self, instance: Arc<ObjectInstance>) {
        if instance.is_surface() {
            self.surface_instances.push(instance);
        } else {
            self.volume_instances.push(instance);
        }
    }

    /// All instances in the group, surface-bearing first, in insertion
    /// order within each subset.
    pub fn instances(&self) -> impl Iterator<Item = &Arc<ObjectInstance>> {
        self.surface_instances.iter().chain(self.volume_instances.iter())
    }

    /// Instance at `isect.object` as returned by `intersect_surface`.
    pub fn surface_instance(&self, index: usize) -> &Arc<ObjectInstance> {
        &self.surface_instances[index]
    }

    /// Instance at `interval.object` as returned by `intersect_volume`.
    pub fn volume_instance(&self, index: usize) -> &Arc<ObjectInstance> {
        &self.volume_instances[index]
    }

    pub fn build(&mut self) -> Result<(), ConfigError> {
        if self.has_built {
            return Err(ConfigError::AcceleratorAlreadyBuilt);
        }

        if !self.surface_instances.is_empty() {
            let mut bvh = Bvh::new(Box::new(ObjectSet::new(self.surface_instances.clone())));
            bvh.build()?;
            self.surface_accel = Some(bvh);
        }

        if !self.volume_instances.is_empty() {
            let objects: Vec<Box<dyn crate::accel::volume_accel::VolumeBearing>> = self
                .volume_instances
                .iter()
                .cloned()
                .map(|i| Box::new(InstanceHandle(i)) as Box<dyn crate::accel::volume_accel::VolumeBearing>)
                .collect();
            let mut accel = VolumeAccelerator::new(objects);
            accel.build()?;
            self.volume_accel = Some(accel);
        }

        self.has_built = true;
        Ok(())
    }

    pub fn has_built(&self) -> bool {
        self.has_built
    }

    /// Nearest surface hit across every surface-bearing instance in the
    /// group; `isect.object` indexes `surface_instance`.
    pub fn intersect_surface(&self, ray: &Ray, time: f32) -> Option<Intersection> {
        self.surface_accel.as_ref()?.intersect(ray, time)
    }

    /// Every overlapping volume interval; `interval.object` indexes
    /// `volume_instance`.
    pub fn intersect_volume(&self, ray: &Ray, time: f32) -> IntervalList {
        match &self.volume_accel {
            Some(accel) => accel.intersect(ray, time),
            None => IntervalList::new(),
        }
    }

    pub fn bounds(&self) -> BBox {
        let mut b = BBox::reverse_infinite();
        if let Some(a) = &self.surface_accel {
            b |= a.bounds();
        }
        if let Some(a) = &self.volume_accel {
            b |= a.bounds();
        }
        b
    }
}

impl Default for ObjectGroup {
    fn default() -> ObjectGroup {
        ObjectGroup::new()
    }
}

/// Adapter so an `Arc<ObjectInstance>` can be stored behind the
/// `VolumeBearing` trait object the volume accelerator needs to own.
struct InstanceHandle(Arc<ObjectInstance>);

impl crate::accel::volume_accel::VolumeBearing for InstanceHandle {
    fn interval_intersect(&self, ray: &Ray, time: f32) -> Option<crate::interval::Interval> {
        self.0.interval_intersect(ray, time)
    }

    fn bounds(&self) -> BBox {
        self.0.bounds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accel::bvh::Bvh as BvhAccel;
    use crate::math::{Point, TransformSampleList, Vector};
    use crate::primitive::mesh::Mesh;

    fn instance_at(z: f32) -> Arc<ObjectInstance> {
        let points = vec![
            Point::new(-1.0, -1.0, 0.0),
            Point::new(1.0, -1.0, 0.0),
            Point::new(0.0, 1.0, 0.0),
        ];
        let mut bvh = BvhAccel::new(Box::new(Mesh::new(points, vec![[0, 1, 2]])));
        bvh.build().unwrap();
        let mut transforms = TransformSampleList::new();
        transforms.push_translate(Vector::new(0.0, 0.0, z), 0.0);
        Arc::new(ObjectInstance::new_surface(Box::new(bvh), transforms, Vec::new()))
    }

    #[test]
    fn finds_nearest_instance_in_group() {
        let mut group = ObjectGroup::new();
        group.add_instance(instance_at(5.0));
        group.add_instance(instance_at(10.0));
        group.build().unwrap();

        let ray = Ray::with_range(Point::new(0.0, 0.0, 0.0), Vector::new(0.0, 0.0, 1.0), 0.0, 1000.0);
        let isect = group.intersect_surface(&ray, 0.0).unwrap();
        assert!((isect.t_hit - 5.0).abs() < 1e-4);
    }

    #[test]
    fn empty_group_build_is_ok() {
        let mut group = ObjectGroup::new();
        assert!(group.build().is_ok());
        assert!(group.intersect_surface(&Ray::with_range(
            Point::new(0.0, 0.0, 0.0),
            Vector::new(0.0, 0.0, 1.0),
            0.0,
            1000.0
        ), 0.0).is_none());
    }

    #[test]
    fn second_build_errors() {
        let mut group = ObjectGroup::new();
        group.add_instance(instance_at(5.0));
        group.build().unwrap();
        assert!(group.build().is_err());
    }
}
