#![allow(dead_code)]

use crate::bbox::BBox;
use crate::math::{cross, dot, Normal, Point, Vector};
use crate::primitive::{Intersection, PrimitiveSet};
use crate::ray::Ray;

/// Point-indexed triangle mesh. Per-point attributes (normal, uv, velocity)
/// are optional; when absent the mesh falls back to flat shading / no
/// motion. A face-indexed normal list, when present, overrides the
/// per-point normals for that face's three corners.
#[derive(Debug, Clone)]
pub struct Mesh {
    points: Vec<Point>,
    normals: Option<Vec<Normal>>,
    face_vertex_normals: Option<Vec<[u32; 3]>>,
    uvs: Option<Vec<(f32, f32)>>,
    velocities: Option<Vec<Vector>>,
    faces: Vec<[u32; 3]>,
    group_ids: Option<Vec<u32>>,
}

impl Mesh {
    pub fn new(points: Vec<Point>, faces: Vec<[u32; 3]>) -> Mesh {
        Mesh {
            points,
            normals: None,
            face_vertex_normals: None,
            uvs: None,
            velocities: None,
            faces,
            group_ids: None,
        }
    }

    pub fn set_normals(&mut self, normals: Vec<Normal>) {
        assert_eq!(normals.len(), self.points.len());
        self.normals = Some(normals);
    }

    pub fn set_face_vertex_normals(&mut self, normals: Vec<Normal>, indices: Vec<[u32; 3]>) {
        assert_eq!(indices.len(), self.faces.len());
        self.normals = Some(normals);
        self.face_vertex_normals = Some(indices);
    }

    pub fn set_uvs(&mut self, uvs: Vec<(f32, f32)>) {
        assert_eq!(uvs.len(), self.points.len());
        self.uvs = Some(uvs);
    }

    pub fn set_velocities(&mut self, velocities: Vec<Vector>) {
        assert_eq!(velocities.len(), self.points.len());
        self.velocities = Some(velocities);
    }

    pub fn set_group_ids(&mut self, group_ids: Vec<u32>) {
        assert_eq!(group_ids.len(), self.faces.len());
        self.group_ids = Some(group_ids);
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn faces(&self) -> &[[u32; 3]] {
        &self.faces
    }

    pub fn normals(&self) -> Option<&[Normal]> {
        self.normals.as_deref()
    }

    pub fn uvs(&self) -> Option<&[(f32, f32)]> {
        self.uvs.as_deref()
    }

    pub fn velocities(&self) -> Option<&[Vector]> {
        self.velocities.as_deref()
    }

    pub fn group_ids(&self) -> Option<&[u32]> {
        self.group_ids.as_deref()
    }

    fn point_at(&self, i: usize, time: f32) -> Point {
        match &self.velocities {
            Some(v) => self.points[i] + (v[i] * time),
            None => self.points[i],
        }
    }

    fn face_points(&self, face_id: usize, time: f32) -> (Point, Point, Point) {
        let f = self.faces[face_id];
        (
            self.point_at(f[0] as usize, time),
            self.point_at(f[1] as usize, time),
            self.point_at(f[2] as usize, time),
        )
    }

    fn face_bounds(&self, face_id: usize, time: f32) -> BBox {
        let (p0, p1, p2) = self.face_points(face_id, time);
        let mut b = BBox::reverse_infinite();
        b.add_point(p0);
        b.add_point(p1);
        b.add_point(p2);
        b
    }

    fn shading_normal(&self, face_id: usize, u: f32, v: f32, geom_n: Normal) -> Normal {
        let w = 1.0 - u - v;
        if let (Some(normals), Some(fvn)) = (&self.normals, &self.face_vertex_normals) {
            let idx = fvn[face_id];
            let n0 = normals[idx[0] as usize];
            let n1 = normals[idx[1] as usize];
            let n2 = normals[idx[2] as usize];
            return Normal::new(
                w * n0[0] + u * n1[0] + v * n2[0],
                w * n0[1] + u * n1[1] + v * n2[1],
                w * n0[2] + u * n1[2] + v * n2[2],
            );
        }
        if let Some(normals) = &self.normals {
            let f = self.faces[face_id];
            let n0 = normals[f[0] as usize];
            let n1 = normals[f[1] as usize];
            let n2 = normals[f[2] as usize];
            return Normal::new(
                w * n0[0] + u * n1[0] + v * n2[0],
                w * n0[1] + u * n1[1] + v * n2[1],
                w * n0[2] + u * n1[2] + v * n2[2],
            );
        }
        geom_n
    }

    fn face_uv(&self, face_id: usize, u: f32, v: f32) -> (f32, f32) {
        let w = 1.0 - u - v;
        match &self.uvs {
            Some(uvs) => {
                let f = self.faces[face_id];
                let (u0, v0) = uvs[f[0] as usize];
                let (u1, v1) = uvs[f[1] as usize];
                let (u2, v2) = uvs[f[2] as usize];
                (w * u0 + u * u1 + v * u2, w * v0 + u * v1 + v * v2)
            }
            None => (u, v),
        }
    }
}

/// Möller-Trumbore ray/triangle intersection. No backface culling.
/// Returns `(t, u, v)` barycentric coordinates of the hit.
fn moller_trumbore(
    orig: Point,
    dir: Vector,
    p0: Point,
    p1: Point,
    p2: Point,
) -> Option<(f32, f32, f32)> {
    const EPSILON: f32 = 1e-8;

    let edge1 = p1 - p0;
    let edge2 = p2 - p0;
    let pvec = cross(dir, edge2);
    let det = dot(edge1, pvec);

    if det.abs() < EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;

    let tvec = orig - p0;
    let u = dot(tvec, pvec) * inv_det;
    if u < 0.0 || u > 1.0 {
        return None;
    }

    let qvec = cross(tvec, edge1);
    let v = dot(dir, qvec) * inv_det;
    if v < 0.0 || (u + v) > 1.0 {
        return None;
    }

    let t = dot(edge2, qvec) * inv_det;
    Some((t, u, v))
}

impl PrimitiveSet for Mesh {
    fn ray_intersect(&self, prim_id: usize, ray: &Ray, time: f32) -> Option<Intersection> {
        let (p0, p1, p2) = self.face_points(prim_id, time);

        let (t, u, v) = moller_trumbore(ray.orig, ray.dir, p0, p1, p2)?;
        if t < ray.tmin || t > ray.tmax {
            return None;
        }

        let geom_n = cross(p1 - p0, p2 - p0).normalized().into_normal();
        let n = self.shading_normal(prim_id, u, v, geom_n);
        let uv = self.face_uv(prim_id, u, v);

        let edge1 = p1 - p0;
        let edge2 = p2 - p0;
        let (dpdu, dpdv) = match &self.uvs {
            Some(uvs) => {
                let f = self.faces[prim_id];
                let (u0, v0) = uvs[f[0] as usize];
                let (u1, v1) = uvs[f[1] as usize];
                let (u2, v2) = uvs[f[2] as usize];
                let du1 = u1 - u0;
                let du2 = u2 - u0;
                let dv1 = v1 - v0;
                let dv2 = v2 - v0;
                let det = (du1 * dv2) - (dv1 * du2);
                if det.abs() < 1e-12 {
                    (edge1, edge2)
                } else {
                    let inv = 1.0 / det;
                    let dpdu = (edge1 * dv2 - edge2 * dv1) * inv;
                    let dpdv = (edge2 * du1 - edge1 * du2) * inv;
                    (dpdu, dpdv)
                }
            }
            None => (edge1, edge2),
        };

        let mut isect = Intersection::new();
        isect.p = ray.point_at(t);
        isect.n = n;
        isect.uv = uv;
        isect.dpdu = dpdu;
        isect.dpdv = dpdv;
        isect.prim_id = prim_id;
        isect.shading_group_id = self
            .group_ids
            .as_ref()
            .map(|g| g[prim_id] as usize)
            .unwrap_or(0);
        isect.t_hit = t;
        Some(isect)
    }

    fn box_intersect(&self, prim_id: usize, bbox: &BBox) -> bool {
        match &self.velocities {
            None => {
                let b = self.face_bounds(prim_id, 0.0);
                boxes_overlap(&b, bbox)
            }
            Some(_) => {
                const STEPS: usize = 4;
                for i in 0..=STEPS {
                    let t = i as f32 / STEPS as f32;
                    if boxes_overlap(&self.face_bounds(prim_id, t), bbox) {
                        return true;
                    }
                }
                false
            }
        }
    }

    fn primitive_bounds(&self, prim_id: usize) -> BBox {
        let mut b = self.face_bounds(prim_id, 0.0);
        if self.velocities.is_some() {
            b |= self.face_bounds(prim_id, 1.0);
        }
        b
    }

    fn primitive_count(&self) -> usize {
        self.faces.len()
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

    fn triangle_mesh() -> Mesh {
        let points = vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(0.0, 1.0, 0.0),
        ];
        let faces = vec![[0u32, 1, 2]];
        Mesh::new(points, faces)
    }

    #[test]
    fn ray_hits_triangle() {
        let mesh = triangle_mesh();
        let ray = Ray::with_range(
            Point::new(0.25, 0.25, 1.0),
            Vector::new(0.0, 0.0, -1.0),
            0.0,
            1000.0,
        );
        let isect = mesh.ray_intersect(0, &ray, 0.0).unwrap();
        assert!((isect.t_hit - 1.0).abs() < 1e-5);
    }

    #[test]
    fn ray_misses_triangle() {
        let mesh = triangle_mesh();
        let ray = Ray::with_range(
            Point::new(5.0, 5.0, 1.0),
            Vector::new(0.0, 0.0, -1.0),
            0.0,
            1000.0,
        );
        assert!(mesh.ray_intersect(0, &ray, 0.0).is_none());
    }

    #[test]
    fn bounds_include_velocity() {
        let mut mesh = triangle_mesh();
        mesh.set_velocities(vec![
            Vector::new(0.0, 0.0, 0.0),
            Vector::new(2.0, 0.0, 0.0),
            Vector::new(0.0, 0.0, 0.0),
        ]);
        let b = mesh.primitive_bounds(0);
        assert_eq!(b.max[0], 3.0);
    }

    #[test]
    fn shading_normal_overrides_from_face_vertex_normals() {
        let mut mesh = triangle_mesh();
        let n = Normal::new(0.0, 0.0, 1.0);
        mesh.set_face_vertex_normals(vec![n, n, n], vec![[0u32, 1, 2]]);
        let ray = Ray::with_range(
            Point::new(0.25, 0.25, 1.0),
            Vector::new(0.0, 0.0, -1.0),
            0.0,
            1000.0,
        );
        let isect = mesh.ray_intersect(0, &ray, 0.0).unwrap();
        assert!((isect.n[2] - 1.0).abs() < 1e-5);
    }
}
