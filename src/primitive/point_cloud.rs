#![allow(dead_code)]

use crate::bbox::BBox;
use crate::math::{dot, Point, Vector};
use crate::primitive::{Intersection, PrimitiveSet};
use crate::ray::Ray;

/// Spheres at point positions, each with its own radius and (optionally) a
/// per-point velocity for linear motion blur.
#[derive(Debug, Clone)]
pub struct PointCloud {
    points: Vec<Point>,
    radii: Vec<f32>,
    velocities: Option<Vec<Vector>>,
}

impl PointCloud {
    pub fn new(points: Vec<Point>, radii: Vec<f32>) -> PointCloud {
        assert_eq!(points.len(), radii.len());
        PointCloud {
            points,
            radii,
            velocities: None,
        }
    }

    pub fn set_velocities(&mut self, velocities: Vec<Vector>) {
        assert_eq!(velocities.len(), self.points.len());
        self.velocities = Some(velocities);
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn radii(&self) -> &[f32] {
        &self.radii
    }

    pub fn velocities(&self) -> Option<&[Vector]> {
        self.velocities.as_deref()
    }

    fn center_at(&self, i: usize, time: f32) -> Point {
        match &self.velocities {
            Some(v) => self.points[i] + (v[i] * time),
            None => self.points[i],
        }
    }

    fn sphere_bounds(&self, i: usize, time: f32) -> BBox {
        let c = self.center_at(i, time);
        let r = self.radii[i];
        let mut b = BBox::reverse_infinite();
        b.add_point(c);
        b.expand(r)
    }
}

/// Standard quadratic ray/sphere test. Returns the nearer of the two roots
/// that lies within `[ray.tmin, ray.tmax]`, or `None`.
fn ray_sphere(orig: Point, dir: Vector, center: Point, radius: f32, tmin: f32, tmax: f32) -> Option<f32> {
    let oc = orig - center;
    let a = dir.length2();
    let b = 2.0 * dot(oc, dir);
    let c = oc.length2() - (radius * radius);
    let disc = (b * b) - (4.0 * a * c);
    if disc < 0.0 {
        return None;
    }
    let sqrt_disc = disc.sqrt();
    let t0 = (-b - sqrt_disc) / (2.0 * a);
    let t1 = (-b + sqrt_disc) / (2.0 * a);

    if t0 >= tmin && t0 <= tmax {
        Some(t0)
    } else if t1 >= tmin && t1 <= tmax {
        Some(t1)
    } else {
        None
    }
}

impl PrimitiveSet for PointCloud {
    fn ray_intersect(&self, prim_id: usize, ray: &Ray, time: f32) -> Option<Intersection> {
        let center = self.center_at(prim_id, time);
        let radius = self.radii[prim_id];
        let t = ray_sphere(ray.orig, ray.dir, center, radius, ray.tmin, ray.tmax)?;

        let p = ray.point_at(t);
        let n = (p - center).normalized().into_normal();

        let mut isect = Intersection::new();
        isect.p = p;
        isect.n = n;
        isect.prim_id = prim_id;
        isect.t_hit = t;
        Some(isect)
    }

    fn box_intersect(&self, prim_id: usize, bbox: &BBox) -> bool {
        match &self.velocities {
            None => boxes_overlap(&self.sphere_bounds(prim_id, 0.0), bbox),
            Some(_) => {
                const STEPS: usize = 4;
                for i in 0..=STEPS {
                    let t = i as f32 / STEPS as f32;
                    if boxes_overlap(&self.sphere_bounds(prim_id, t), bbox) {
                        return true;
                    }
                }
                false
            }
        }
    }

    fn primitive_bounds(&self, prim_id: usize) -> BBox {
        let mut b = self.sphere_bounds(prim_id, 0.0);
        if self.velocities.is_some() {
            b |= self.sphere_bounds(prim_id, 1.0);
        }
        b
    }

    fn primitive_count(&self) -> usize {
        self.points.len()
    }
}

fn boxes_overlap(a: &BBox, b: &BBox) -> bool {
    for i in 0..3 {
        if a.min[i] > b.max[i] || a.max[i] < b.min[i] {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_hits_sphere_center() {
        let pc = PointCloud::new(vec![Point::new(0.0, 0.0, 0.0)], vec![1.0]);
        let ray = Ray::with_range(
            Point::new(0.0, 0.0, -5.0),
            Vector::new(0.0, 0.0, 1.0),
            0.0,
            1000.0,
        );
        let isect = pc.ray_intersect(0, &ray, 0.0).unwrap();
        assert!((isect.t_hit - 4.0).abs() < 1e-5);
    }

    #[test]
    fn ray_misses_sphere() {
        let pc = PointCloud::new(vec![Point::new(0.0, 0.0, 0.0)], vec![1.0]);
        let ray = Ray::with_range(
            Point::new(5.0, 5.0, -5.0),
            Vector::new(0.0, 0.0, 1.0),
            0.0,
            1000.0,
        );
        assert!(pc.ray_intersect(0, &ray, 0.0).is_none());
    }

    #[test]
    fn moving_sphere_bounds_widen() {
        let mut pc = PointCloud::new(vec![Point::new(0.0, 0.0, 0.0)], vec![1.0]);
        pc.set_velocities(vec![Vector::new(3.0, 0.0, 0.0)]);
        let b = pc.primitive_bounds(0);
        assert_eq!(b.max[0], 4.0);
    }
}
