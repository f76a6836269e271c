#![allow(dead_code)]

use crate::math::Vector;
use std::f32::consts::FRAC_PI_4 as QPI_32;
use std::f32::consts::PI as PI_32;

/// Maps the unit square to the unit circle. `x, y` should be distributed
/// within `[-1, 1]`, not `[0, 1]`.
pub fn square_to_circle(x: f32, y: f32) -> (f32, f32) {
    debug_assert!(x >= -1.0 && x <= 1.0 && y >= -1.0 && y <= 1.0);

    if x == 0.0 && y == 0.0 {
        return (0.0, 0.0);
    }

    let (radius, angle) = if x > y.abs() {
        (x, QPI_32 * (y / x))
    } else if y > x.abs() {
        (y, QPI_32 * (2.0 - (x / y)))
    } else if x < -(y.abs()) {
        (-x, QPI_32 * (4.0 + (y / x)))
    } else {
        (-y, QPI_32 * (6.0 - (x / y)))
    };

    (radius * angle.cos(), radius * angle.sin())
}

pub fn uniform_sample_sphere(u: f32, v: f32) -> Vector {
    let z = 1.0 - (2.0 * u);
    let r = (1.0 - (z * z)).max(0.0).sqrt();
    let phi = 2.0 * PI_32 * v;
    Vector::new(r * phi.cos(), r * phi.sin(), z)
}

pub fn uniform_sample_hemisphere(u: f32, v: f32) -> Vector {
    let z = u;
    let r = (1.0 - (z * z)).max(0.0).sqrt();
    let phi = 2.0 * PI_32 * v;
    Vector::new(r * phi.cos(), r * phi.sin(), z)
}

pub fn cosine_sample_hemisphere(u: f32, v: f32) -> Vector {
    let (u, v) = square_to_circle((u * 2.0) - 1.0, (v * 2.0) - 1.0);
    let z = (1.0 - ((u * u) + (v * v))).max(0.0).sqrt();
    Vector::new(u, v, z)
}

/// Samples the cone of directions around `+Z` subtending `cos_theta_max`.
pub fn uniform_sample_cone(u: f32, v: f32, cos_theta_max: f32) -> Vector {
    let cos_theta = (1.0 - u) + (u * cos_theta_max);
    let sin_theta = (1.0 - (cos_theta * cos_theta)).max(0.0).sqrt();
    let phi = v * 2.0 * PI_32;
    Vector::new(phi.cos() * sin_theta, phi.sin() * sin_theta, cos_theta)
}

pub fn uniform_sample_cone_pdf(cos_theta_max: f32) -> f32 {
    1.0 / (2.0 * PI_32 * (1.0 - cos_theta_max))
}

/// Jittered low-discrepancy-ish 2D sample built from a hash of `(pixel_seed,
/// sample_index)`, used where a full sampler isn't warranted (e.g. light
/// sample positions).
pub fn hash_jitter_2d(seed: u32, index: u32) -> (f32, f32) {
    let h1 = crate::hash::hash_u32(index, seed);
    let h2 = crate::hash::hash_u32(index, seed.wrapping_add(0x9E3779B9));
    ((h1 as f32 / u32::MAX as f32), (h2 as f32 / u32::MAX as f32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_samples_are_unit_length() {
        for i in 0..16 {
            let (u, v) = hash_jitter_2d(7, i);
            let d = uniform_sample_sphere(u, v);
            assert!((d.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn cone_at_full_angle_matches_sphere_pdf() {
        let pdf = uniform_sample_cone_pdf(-1.0);
        assert!((pdf - 1.0 / (4.0 * PI_32)).abs() < 1e-5);
    }

    #[test]
    fn jitter_is_deterministic() {
        let a = hash_jitter_2d(1, 5);
        let b = hash_jitter_2d(1, 5);
        assert_eq!(a, b);
    }
}
