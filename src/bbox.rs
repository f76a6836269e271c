#![allow(dead_code)]

use std::{
    iter::Iterator,
    ops::{BitOr, BitOrAssign},
};

use crate::{
    lerp::{lerp, lerp_slice, Lerp},
    math::{fast_minf32, Matrix4x4, Point, Vector},
};

const BBOX_MAXT_ADJUST: f32 = 1.000_000_24;

/// Bounds padding applied to primitive-set and accelerator bounds so that
/// primitives touching the exact edge of a box are not missed.
pub const BOUNDS_PADDING: f32 = 1e-4;

/// A 3D axis-aligned bounding box. A valid (non-reversed-infinite) box has
/// `min[i] <= max[i]` on every axis.
#[derive(Debug, Copy, Clone)]
pub struct BBox {
    pub min: Point,
    pub max: Point,
}

impl BBox {
    /// Creates a degenerate box with `min = +inf, max = -inf`, so that a
    /// sequence of `add_point` calls builds a tight bound.
    pub fn reverse_infinite() -> BBox {
        BBox {
            min: Point::new(std::f32::INFINITY, std::f32::INFINITY, std::f32::INFINITY),
            max: Point::new(
                std::f32::NEG_INFINITY,
                std::f32::NEG_INFINITY,
                std::f32::NEG_INFINITY,
            ),
        }
    }

    /// Creates a BBox with min as the minimum extent and max as the maximum
    /// extent.
    pub fn from_points(min: Point, max: Point) -> BBox {
        BBox { min: min, max: max }
    }

    /// Extends `min`/`max` elementwise to include `p`.
    pub fn add_point(&mut self, p: Point) {
        self.min = Point {
            co: self.min.co.v_min(p.co),
        };
        self.max = Point {
            co: self.max.co.v_max(p.co),
        };
    }

    /// Inflates the box by `delta` on both faces of every axis.
    pub fn expand(&self, delta: f32) -> BBox {
        let d = Vector::new(delta, delta, delta);
        BBox {
            min: self.min - d,
            max: self.max + d,
        }
    }

    /// Ray/box intersection via the slab method. On hit returns
    /// `(hit_tmin, hit_tmax)` clipped against `ray_tmin`/`ray_tmax`. A hit
    /// requires `hit_tmin < ray_tmax && hit_tmax > ray_tmin`.
    pub fn intersect_ray(
        &self,
        orig: Point,
        dir_inv: Vector,
        ray_tmin: f32,
        ray_tmax: f32,
    ) -> Option<(f32, f32)> {
        // Calculate slab intersections
        let t1 = (self.min.co - orig.co) * dir_inv.co;
        let t2 = (self.max.co - orig.co) * dir_inv.co;

        // Find the far and near intersection
        let mut far_t = t1.v_max(t2);
        let mut near_t = t1.v_min(t2);
        far_t.set_3(std::f32::INFINITY);
        near_t.set_3(std::f32::NEG_INFINITY);
        let hit_tmax = fast_minf32(far_t.h_min() * BBOX_MAXT_ADJUST, ray_tmax);
        let hit_tmin = near_t.h_max().max(ray_tmin);

        if hit_tmin < ray_tmax && hit_tmax > ray_tmin && hit_tmin <= hit_tmax {
            Some((hit_tmin, hit_tmax))
        } else {
            None
        }
    }

    // Creates a new BBox transformed into a different space.
    pub fn transformed(&self, xform: Matrix4x4) -> BBox {
        // BBox corners
        let vs = [
            Point::new(self.min[0], self.min[1], self.min[2]),
            Point::new(self.min[0], self.min[1], self.max[2]),
            Point::new(self.min[0], self.max[1], self.min[2]),
            Point::new(self.min[0], self.max[1], self.max[2]),
            Point::new(self.max[0], self.min[1], self.min[2]),
            Point::new(self.max[0], self.min[1], self.max[2]),
            Point::new(self.max[0], self.max[1], self.min[2]),
            Point::new(self.max[0], self.max[1], self.max[2]),
        ];

        // Transform BBox corners and make new bbox
        let mut b = BBox::reverse_infinite();
        for v in &vs {
            b.add_point(*v * xform);
        }

        b
    }

    pub fn surface_area(&self) -> f32 {
        let d = self.max - self.min;
        ((d.x() * d.y()) + (d.y() * d.z()) + (d.z() * d.x())) * 2.0
    }

    pub fn center(&self) -> Point {
        self.min.lerp(self.max, 0.5)
    }

    pub fn diagonal(&self) -> f32 {
        (self.max - self.min).length()
    }

    pub fn diagonal2(&self) -> f32 {
        (self.max - self.min).length2()
    }
}

/// Union of two `BBox`es.
impl BitOr for BBox {
    type Output = BBox;

    fn bitor(self, rhs: BBox) -> BBox {
        BBox::from_points(
            Point {
                co: self.min.co.v_min(rhs.min.co),
            },
            Point {
                co: self.max.co.v_max(rhs.max.co),
            },
        )
    }
}

impl BitOrAssign for BBox {
    fn bitor_assign(&mut self, rhs: BBox) {
        *self = *self | rhs;
    }
}

/// Expand `BBox` by a point.
impl BitOr<Point> for BBox {
    type Output = BBox;

    fn bitor(self, rhs: Point) -> BBox {
        BBox::from_points(
            Point {
                co: self.min.co.v_min(rhs.co),
            },
            Point {
                co: self.max.co.v_max(rhs.co),
            },
        )
    }
}

impl BitOrAssign<Point> for BBox {
    fn bitor_assign(&mut self, rhs: Point) {
        *self = *self | rhs;
    }
}

impl Lerp for BBox {
    fn lerp(self, other: BBox, alpha: f32) -> BBox {
        BBox {
            min: lerp(self.min, other.min, alpha),
            max: lerp(self.max, other.max, alpha),
        }
    }
}

pub fn transform_bbox_slice_from(bbs_in: &[BBox], xforms: &[Matrix4x4], bbs_out: &mut Vec<BBox>) {
    bbs_out.clear();

    // Transform the bounding boxes
    if xforms.is_empty() {
        bbs_out.extend_from_slice(bbs_in);
    } else if bbs_in.len() == xforms.len() {
        for (bb, xf) in Iterator::zip(bbs_in.iter(), xforms.iter()) {
            bbs_out.push(bb.transformed(xf.inverse()));
        }
    } else if bbs_in.len() > xforms.len() {
        let s = (bbs_in.len() - 1) as f32;
        for (i, bb) in bbs_in.iter().enumerate() {
            bbs_out.push(bb.transformed(lerp_slice(xforms, i as f32 / s).inverse()));
        }
    } else if bbs_in.len() < xforms.len() {
        let s = (xforms.len() - 1) as f32;
        for (i, xf) in xforms.iter().enumerate() {
            bbs_out.push(lerp_slice(bbs_in, i as f32 / s).transformed(xf.inverse()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_law() {
        let pts = [
            Point::new(1.0, -2.0, 3.0),
            Point::new(-4.0, 5.0, 0.5),
            Point::new(2.0, 2.0, -7.0),
        ];

        let mut b = BBox::reverse_infinite();
        for p in &pts {
            b.add_point(*p);
        }

        assert_eq!(b.min, Point::new(-4.0, -2.0, -7.0));
        assert_eq!(b.max, Point::new(2.0, 5.0, 3.0));
    }

    #[test]
    fn ray_box_round_trip() {
        let b = BBox::from_points(Point::new(-1.0, -1.0, -1.0), Point::new(1.0, 1.0, 1.0));
        let orig = Point::new(0.0, 0.0, 0.0);
        let dir_inv = Vector::new(1.0 / 0.3, 1.0 / 0.4, 1.0 / 0.866);

        let hit = b.intersect_ray(orig, dir_inv, 0.0, 1000.0);
        assert!(hit.is_some());
        let (tmin, tmax) = hit.unwrap();
        assert!(tmin <= 0.0);
        assert!(tmax >= 0.0);
    }

    #[test]
    fn ray_box_miss() {
        let b = BBox::from_points(Point::new(-1.0, -1.0, -1.0), Point::new(1.0, 1.0, 1.0));
        let orig = Point::new(5.0, 5.0, 5.0);
        let dir_inv = Vector::new(1.0, 1.0, 1.0);

        assert!(b.intersect_ray(orig, dir_inv, 0.0, 1000.0).is_none());
    }

    #[test]
    fn expand() {
        let b = BBox::from_points(Point::new(0.0, 0.0, 0.0), Point::new(1.0, 1.0, 1.0));
        let e = b.expand(0.5);
        assert_eq!(e.min, Point::new(-0.5, -0.5, -0.5));
        assert_eq!(e.max, Point::new(1.5, 1.5, 1.5));
    }
}
