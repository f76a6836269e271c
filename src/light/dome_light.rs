#![allow(dead_code)]

use crate::light::{Light, LightSample};
use crate::math::{Point, TransformSampleList};
use crate::sampling::{hash_jitter_2d, uniform_sample_sphere};

/// Environment light surrounding the whole scene. Sample directions are
/// distributed uniformly over the sphere at preprocess time and reused for
/// every call to `get_samples`; a full texture-backed importance sampler is
/// outside this core's scope, so the dome radiates a single constant color
/// in every direction (stratified direction sampling still reduces variance
/// versus re-drawing per call).
#[derive(Debug, Clone)]
pub struct DomeLight {
    pub transforms: TransformSampleList,
    pub color: (f32, f32, f32),
    pub intensity: f32,
    sample_count: usize,
    directions: Vec<crate::math::Vector>,
}

const DOME_DISTANCE: f32 = 1.0e6;

impl DomeLight {
    pub fn new(transforms: TransformSampleList, color: (f32, f32, f32), intensity: f32, sample_count: usize) -> DomeLight {
        DomeLight {
            transforms,
            color,
            intensity,
            sample_count: sample_count.max(1),
            directions: Vec::new(),
        }
    }
}

impl Light for DomeLight {
    fn get_sample_count(&self) -> usize {
        self.sample_count
    }

    fn get_samples(&self, samples: &mut Vec<LightSample>, max: usize, time: f32) {
        let n = self.directions.len().min(max);
        if n == 0 {
            return;
        }
        let transform = self.transforms.lerp_transform(time);

        for dir in self.directions.iter().take(n) {
            let world_dir = (*dir * transform.matrix()).normalized();
            let p = Point::new(0.0, 0.0, 0.0) + (world_dir * DOME_DISTANCE);
            samples.push(LightSample::new(p, (-world_dir).into_normal()));
        }
    }

    fn illuminate(&self, _sample: &LightSample, _p_shaded: Point) -> (f32, f32, f32) {
        let falloff = self.intensity / self.sample_count as f32;
        (self.color.0 * falloff, self.color.1 * falloff, self.color.2 * falloff)
    }

    fn preprocess(&mut self) {
        self.directions = (0..self.sample_count)
            .map(|i| {
                let (u, v) = hash_jitter_2d(0x444F_4D45, i as u32);
                uniform_sample_sphere(u, v)
            })
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preprocess_builds_requested_sample_count() {
        let mut light = DomeLight::new(TransformSampleList::new(), (1.0, 1.0, 1.0), 1.0, 12);
        light.preprocess();
        let mut samples = Vec::new();
        light.get_samples(&mut samples, 100, 0.0);
        assert_eq!(samples.len(), 12);
    }

    #[test]
    fn samples_are_far_away() {
        let mut light = DomeLight::new(TransformSampleList::new(), (1.0, 1.0, 1.0), 1.0, 4);
        light.preprocess();
        let mut samples = Vec::new();
        light.get_samples(&mut samples, 4, 0.0);
        for s in &samples {
            let d = (s.p - Point::new(0.0, 0.0, 0.0)).length();
            assert!(d > 1000.0);
        }
    }

    #[test]
    fn no_samples_before_preprocess() {
        let light = DomeLight::new(TransformSampleList::new(), (1.0, 1.0, 1.0), 1.0, 4);
        let mut samples = Vec::new();
        light.get_samples(&mut samples, 4, 0.0);
        assert!(samples.is_empty());
    }
}
