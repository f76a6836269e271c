#![allow(dead_code)]

use crate::accel::Accelerator;
use crate::bbox::BBox;
use crate::error::ConfigError;
use crate::math::{Point, Vector};
use crate::primitive::{Intersection, PrimitiveSet};
use crate::ray::Ray;

const MIN_CELLS_PER_AXIS: usize = 1;
const MAX_CELLS_PER_AXIS: usize = 512;

/// Uniform-grid accelerator: cells sized from the primitive count and the
/// bounding box's longest axis, each holding the list of primitives whose
/// padded AABB touches it. Traversal is 3D-DDA, stepping cell to cell
/// along the ray and testing only that cell's primitives.
pub struct UniformGrid {
    primitive_set: Box<dyn PrimitiveSet>,
    bounds: BBox,
    nx: usize,
    ny: usize,
    nz: usize,
    cells: Vec<Vec<usize>>,
    has_built: bool,
}

impl UniformGrid {
    pub fn new(primitive_set: Box<dyn PrimitiveSet>) -> UniformGrid {
        UniformGrid {
            primitive_set,
            bounds: BBox::reverse_infinite(),
            nx: 1,
            ny: 1,
            nz: 1,
            cells: Vec::new(),
            has_built: false,
        }
    }

    fn cell_size(&self) -> Vector {
        Vector::new(
            (self.bounds.max[0] - self.bounds.min[0]) / self.nx as f32,
            (self.bounds.max[1] - self.bounds.min[1]) / self.ny as f32,
            (self.bounds.max[2] - self.bounds.min[2]) / self.nz as f32,
        )
    }

    fn cell_box(&self, cx: usize, cy: usize, cz: usize) -> BBox {
        let s = self.cell_size();
        let min = Point::new(
            self.bounds.min[0] + cx as f32 * s.x(),
            self.bounds.min[1] + cy as f32 * s.y(),
            self.bounds.min[2] + cz as f32 * s.z(),
        );
        let max = Point::new(min[0] + s.x(), min[1] + s.y(), min[2] + s.z());
        BBox::from_points(min, max)
    }

    fn cell_index(&self, cx: usize, cy: usize, cz: usize) -> usize {
        (cz * self.ny + cy) * self.nx + cx
    }

    fn world_to_cell(&self, p: Point) -> (usize, usize, usize) {
        let s = self.cell_size();
        let cx = (((p[0] - self.bounds.min[0]) / s.x()) as isize)
            .max(0)
            .min(self.nx as isize - 1) as usize;
        let cy = (((p[1] - self.bounds.min[1]) / s.y()) as isize)
            .max(0)
            .min(self.ny as isize - 1) as usize;
        let cz = (((p[2] - self.bounds.min[2]) / s.z()) as isize)
            .max(0)
            .min(self.nz as isize - 1) as usize;
        (cx, cy, cz)
    }
}

impl Accelerator for UniformGrid {
    fn build(&mut self) -> Result<(), ConfigError> {
        if self.has_built {
            return Err(ConfigError::AcceleratorAlreadyBuilt);
        }

        let n = self.primitive_set.primitive_count();
        self.bounds = self.primitive_set.entire_bounds();
        if n == 0 {
            self.has_built = true;
            return Ok(());
        }

        let width_x = (self.bounds.max[0] - self.bounds.min[0]).max(1e-6);
        let width_y = (self.bounds.max[1] - self.bounds.min[1]).max(1e-6);
        let width_z = (self.bounds.max[2] - self.bounds.min[2]).max(1e-6);
        let max_width = width_x.max(width_y).max(width_z);

        let ncells_per_unit = 3.0 * (n as f32).cbrt() / max_width;
        let clamp = |v: f32| -> usize {
            (v.round() as isize).max(MIN_CELLS_PER_AXIS as isize).min(MAX_CELLS_PER_AXIS as isize) as usize
        };
        self.nx = clamp(width_x * ncells_per_unit);
        self.ny = clamp(width_y * ncells_per_unit);
        self.nz = clamp(width_z * ncells_per_unit);

        self.cells = vec![Vec::new(); self.nx * self.ny * self.nz];

        for i in 0..n {
            let pb = self.primitive_set.primitive_bounds(i);
            let (cx0, cy0, cz0) = self.world_to_cell(pb.min);
            let (cx1, cy1, cz1) = self.world_to_cell(pb.max);
            for cz in cz0..=cz1 {
                for cy in cy0..=cy1 {
                    for cx in cx0..=cx1 {
                        let cb = self.cell_box(cx, cy, cz);
                        if self.primitive_set.box_intersect(i, &cb) {
                            let idx = self.cell_index(cx, cy, cz);
                            self.cells[idx].push(i);
                        }
                    }
                }
            }
        }

        self.bounds = self.bounds.expand(crate::bbox::BOUNDS_PADDING);
        self.has_built = true;
        Ok(())
    }

    fn intersect(&self, ray: &Ray, time: f32) -> Option<Intersection> {
        if self.cells.is_empty() {
            return None;
        }

        let dir_inv = Vector::new(1.0 / ray.dir.x(), 1.0 / ray.dir.y(), 1.0 / ray.dir.z());
        let (box_tmin, box_tmax) = self.bounds.intersect_ray(ray.orig, dir_inv, ray.tmin, ray.tmax)?;

        let entry = ray.point_at(box_tmin);
        let (mut cx, mut cy, mut cz) = self.world_to_cell(entry);
        let s = self.cell_size();
        let ns = [self.nx, self.ny, self.nz];
        let dirs = [ray.dir.x(), ray.dir.y(), ray.dir.z()];
        let cell_sizes = [s.x(), s.y(), s.z()];
        let mut cell = [cx as isize, cy as isize, cz as isize];

        let mut t_next = [0.0f32; 3];
        let mut t_delta = [0.0f32; 3];
        let mut cell_step = [0isize; 3];
        let mut cell_end = [0isize; 3];

        for axis in 0..3 {
            let origin_axis = match axis {
                0 => self.bounds.min[0],
                1 => self.bounds.min[1],
                _ => self.bounds.min[2],
            };
            if dirs[axis] > 0.0 {
                cell_step[axis] = 1;
                cell_end[axis] = ns[axis] as isize;
                let next_boundary = origin_axis + (cell[axis] + 1) as f32 * cell_sizes[axis];
                t_next[axis] = box_tmin + (next_boundary - entry[axis]) / dirs[axis];
                t_delta[axis] = cell_sizes[axis] / dirs[axis];
            } else if dirs[axis] < 0.0 {
                cell_step[axis] = -1;
                cell_end[axis] = -1;
                let next_boundary = origin_axis + cell[axis] as f32 * cell_sizes[axis];
                t_next[axis] = box_tmin + (next_boundary - entry[axis]) / dirs[axis];
                t_delta[axis] = cell_sizes[axis] / -dirs[axis];
            } else {
                cell_step[axis] = 0;
                cell_end[axis] = -1;
                t_next[axis] = std::f32::INFINITY;
                t_delta[axis] = std::f32::INFINITY;
            }
        }

        let t_end = box_tmax.min(ray.tmax);
        let mut closest: Option<Intersection> = None;
        let mut tmax = ray.tmax;

        loop {
            cx = cell[0] as usize;
            cy = cell[1] as usize;
            cz = cell[2] as usize;
            let idx = self.cell_index(cx, cy, cz);
            let cb = self.cell_box(cx, cy, cz);

            for &prim_id in &self.cells[idx] {
                let narrowed = Ray::with_range(ray.orig, ray.dir, ray.tmin, tmax);
                if let Some(isect) = self.primitive_set.ray_intersect(prim_id, &narrowed, time) {
                    if point_in_box(isect.p, &cb) && isect.t_hit < tmax {
                        tmax = isect.t_hit;
                        closest = Some(isect);
                    }
                }
            }
            if closest.is_some() {
                break;
            }

            let axis = if t_next[0] <= t_next[1] && t_next[0] <= t_next[2] {
                0
            } else if t_next[1] <= t_next[2] {
                1
            } else {
                2
            };

            if t_next[axis] > t_end {
                break;
            }
            cell[axis] += cell_step[axis];
            if cell[axis] == cell_end[axis] {
                break;
            }
            t_next[axis] += t_delta[axis];
        }

        closest
    }

    fn bounds(&self) -> BBox {
        self.bounds
    }

    fn has_built(&self) -> bool {
        self.has_built
    }
}

fn point_in_box(p: Point, b: &BBox) -> bool {
    for i in 0..3 {
        if p[i] < b.min[i] - 1e-5 || p[i] > b.max[i] + 1e-5 {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::mesh::Mesh;

    fn grid_mesh(n: usize) -> Mesh {
        let mut points = Vec::new();
        let mut faces = Vec::new();
        for i in 0..n {
            let x = i as f32 * 3.0;
            points.push(Point::new(x, 0.0, 0.0));
            points.push(Point::new(x + 1.0, 0.0, 0.0));
            points.push(Point::new(x, 1.0, 0.0));
            faces.push([(i * 3) as u32, (i * 3 + 1) as u32, (i * 3 + 2) as u32]);
        }
        Mesh::new(points, faces)
    }

    #[test]
    fn finds_expected_triangle() {
        let mut grid = UniformGrid::new(Box::new(grid_mesh(10)));
        grid.build().unwrap();

        let ray = Ray::with_range(
            Point::new(3.25, 0.25, -5.0),
            Vector::new(0.0, 0.0, 1.0),
            0.0,
            1000.0,
        );
        let isect = grid.intersect(&ray, 0.0).unwrap();
        assert_eq!(isect.prim_id, 1);
    }

    #[test]
    fn agrees_with_bvh() {
        use crate::accel::bvh::Bvh;

        let mut grid = UniformGrid::new(Box::new(grid_mesh(15)));
        grid.build().unwrap();
        let mut bvh = Bvh::new(Box::new(grid_mesh(15)));
        bvh.build().unwrap();

        for i in 0..15 {
            let x = i as f32 * 3.0 + 0.25;
            let ray = Ray::with_range(
                Point::new(x, 0.25, -5.0),
                Vector::new(0.0, 0.0, 1.0),
                0.0,
                1000.0,
            );
            let a = grid.intersect(&ray, 0.0).map(|i| i.prim_id);
            let b = bvh.intersect(&ray, 0.0).map(|i| i.prim_id);
            assert_eq!(a, b);
        }
    }
}
