#![allow(dead_code)]

use crate::math::TransformSampleList;
use crate::ray::Ray;

/// Maps screen UV + time to a world-space ray via perspective projection
/// and the camera's sampled transform.
#[derive(Debug, Clone)]
pub struct Camera {
    pub transforms: TransformSampleList,
    fov: f32,
    aspect: f32,
    znear: f32,
    zfar: f32,
}

impl Camera {
    pub fn new(transforms: TransformSampleList, fov: f32) -> Camera {
        assert!(!transforms.is_empty(), "Camera has no transform samples!");

        Camera {
            transforms,
            fov,
            aspect: 1.0,
            znear: 1e-3,
            zfar: 1000.0,
        }
    }

    /// Sets the aspect ratio from a resolution, as the renderer driver does
    /// while preprocessing the camera before a frame.
    pub fn set_aspect_from_resolution(&mut self, width: usize, height: usize) {
        self.aspect = width as f32 / height as f32;
    }

    pub fn get_ray(&self, u: f32, v: f32, time: f32) -> Ray {
        let transform = self.transforms.lerp_transform(time);
        let matrix = transform.matrix();

        let uv_size_y = 2.0 * (self.fov / 2.0).tan();
        let uv_size_x = uv_size_y * self.aspect;

        let target = crate::math::Point::new(
            (u - 0.5) * uv_size_x,
            (v - 0.5) * uv_size_y,
            -1.0,
        ) * matrix;
        let orig = crate::math::Point::new(0.0, 0.0, 0.0) * matrix;

        let dir = (target - orig).normalized();

        Ray::with_range(orig, dir, self.znear, self.zfar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vector;

    #[test]
    fn straight_ahead_ray_points_down_minus_z() {
        let mut transforms = TransformSampleList::new();
        transforms.push_translate(Vector::new(0.0, 0.0, 0.0), 0.0);
        let cam = Camera::new(transforms, std::f32::consts::FRAC_PI_2);

        let ray = cam.get_ray(0.5, 0.5, 0.0);
        assert!(ray.dir.z() < 0.0);
        assert!((ray.dir.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn aspect_stretches_x_fov() {
        let mut transforms = TransformSampleList::new();
        transforms.push_translate(Vector::new(0.0, 0.0, 0.0), 0.0);
        let mut cam = Camera::new(transforms, std::f32::consts::FRAC_PI_2);
        cam.set_aspect_from_resolution(1600, 900);

        let left = cam.get_ray(0.0, 0.5, 0.0);
        let right = cam.get_ray(1.0, 0.5, 0.0);
        assert!((left.dir.x() + right.dir.x()).abs() < 1e-5);
        assert!(left.dir.x() < 0.0 && right.dir.x() > 0.0);
    }
}
