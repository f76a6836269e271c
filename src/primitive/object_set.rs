#![allow(dead_code)]

use std::sync::Arc;

use crate::bbox::BBox;
use crate::object::ObjectInstance;
use crate::primitive::{Intersection, PrimitiveSet};
use crate::ray::Ray;

/// A primitive set whose primitives are whole `ObjectInstance`s, used by
/// `ObjectGroup` to build a BVH over a set of surface-bearing instances.
pub struct ObjectSet {
    instances: Vec<Arc<ObjectInstance>>,
}

impl ObjectSet {
    pub fn new(instances: Vec<Arc<ObjectInstance>>) -> ObjectSet {
        ObjectSet { instances }
    }

    pub fn instance(&self, index: usize) -> &Arc<ObjectInstance> {
        &self.instances[index]
    }
}

impl PrimitiveSet for ObjectSet {
    fn ray_intersect(&self, prim_id: usize, ray: &Ray, time: f32) -> Option<Intersection> {
        let mut isect = self.instances[prim_id].intersect(ray, time)?;
        isect.object = prim_id;
        Some(isect)
    }

    fn box_intersect(&self, prim_id: usize, bbox: &BBox) -> bool {
        let b = self.instances[prim_id].bounds();
        for i in 0..3 {
            if b.min[i] > bbox.max[i] || b.max[i] < bbox.min[i] {
                return false;
            }
        }
        true
    }

    fn primitive_bounds(&self, prim_id: usize) -> BBox {
        self.instances[prim_id].bounds()
    }

    fn primitive_count(&self) -> usize {
        self.instances.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accel::bvh::Bvh;
    use crate::math::{Point, TransformSampleList, Vector};
    use crate::primitive::mesh::Mesh;

    fn instance_at(z: f32) -> Arc<ObjectInstance> {
        let points = vec![
            Point::new(-1.0, -1.0, 0.0),
            Point::new(1.0, -1.0, 0.0),
            Point::new(0.0, 1.0, 0.0),
        ];
        let mut bvh = Bvh::new(Box::new(Mesh::new(points, vec![[0, 1, 2]])));
        bvh.build().unwrap();
        let mut transforms = TransformSampleList::new();
        transforms.push_translate(Vector::new(0.0, 0.0, z), 0.0);
        Arc::new(ObjectInstance::new_surface(Box::new(bvh), transforms, Vec::new()))
    }

    #[test]
    fn ray_intersect_reports_instance_index() {
        let set = ObjectSet::new(vec![instance_at(5.0), instance_at(10.0)]);
        let ray = Ray::with_range(Point::new(0.0, 0.0, 0.0), Vector::new(0.0, 0.0, 1.0), 0.0, 1000.0);

        let isect = set.ray_intersect(1, &ray, 0.0).unwrap();
        assert_eq!(isect.object, 1);
        assert!((isect.t_hit - 10.0).abs() < 1e-4);
    }

    #[test]
    fn primitive_count_matches_instance_count() {
        let set = ObjectSet::new(vec![instance_at(1.0), instance_at(2.0), instance_at(3.0)]);
        assert_eq!(set.primitive_count(), 3);
    }
}
