#![allow(dead_code)]

use crate::light::{Light, LightSample};
use crate::math::{dot, Point, TransformSampleList};
use crate::sampling::{hash_jitter_2d, uniform_sample_sphere};

/// An emissive sphere surface. Samples are drawn uniformly over the unit
/// sphere in local space and transformed into world space; a sample only
/// contributes when its outward normal faces the shaded point, giving a
/// one-sided emitter the way a solid sphere would.
#[derive(Debug, Clone)]
pub struct SphereLight {
    pub transforms: TransformSampleList,
    pub radius: f32,
    pub color: (f32, f32, f32),
    pub intensity: f32,
    pub sample_count: usize,
}

impl SphereLight {
    pub fn new(
        transforms: TransformSampleList,
        radius: f32,
        color: (f32, f32, f32),
        intensity: f32,
        sample_count: usize,
    ) -> SphereLight {
        SphereLight {
            transforms,
            radius,
            color,
            intensity,
            sample_count: sample_count.max(1),
        }
    }
}

impl Light for SphereLight {
    fn get_sample_count(&self) -> usize {
        self.sample_count
    }

    fn get_samples(&self, samples: &mut Vec<LightSample>, max: usize, time: f32) {
        let n = self.sample_count.min(max);
        if n == 0 {
            return;
        }
        let transform = self.transforms.lerp_transform(time);

        for i in 0..n {
            let (u, v) = hash_jitter_2d(0x5350_4852, i as u32);
            let local_n = uniform_sample_sphere(u, v);
            let local_p = Point::new(0.0, 0.0, 0.0) + (local_n * self.radius);

            let p = local_p * transform.matrix();
            let n_world = (local_n * transform.matrix()).normalized();
            samples.push(LightSample::new(p, n_world.into_normal()));
        }
    }

    fn illuminate(&self, sample: &LightSample, p_shaded: Point) -> (f32, f32, f32) {
        let to_shaded = p_shaded - sample.p;
        let d2 = to_shaded.length2().max(1e-6);
        let ln = to_shaded * (1.0 / d2.sqrt());

        let facing = dot(ln, sample.n.into_vector());
        if facing <= 0.0 {
            return (0.0, 0.0, 0.0);
        }

        let falloff = self.intensity / (self.sample_count as f32 * d2);
        (self.color.0 * falloff, self.color.1 * falloff, self.color.2 * falloff)
    }
}
