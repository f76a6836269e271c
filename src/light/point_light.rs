#![allow(dead_code)]

use crate::light::{Light, LightSample};
use crate::math::{Normal, Point, TransformSampleList};

/// A single point of light with inverse-square falloff. Preprocessing is a
/// no-op, matching the reference's point light.
#[derive(Debug, Clone)]
pub struct PointLight {
    pub transforms: TransformSampleList,
    pub color: (f32, f32, f32),
    pub intensity: f32,
}

impl PointLight {
    pub fn new(transforms: TransformSampleList, color: (f32, f32, f32), intensity: f32) -> PointLight {
        PointLight {
            transforms,
            color,
            intensity,
        }
    }
}

impl Light for PointLight {
    fn get_sample_count(&self) -> usize {
        1
    }

    fn get_samples(&self, samples: &mut Vec<LightSample>, max: usize, time: f32) {
        if max == 0 {
            return;
        }
        let transform = self.transforms.lerp_transform(time);
        let p = Point::new(0.0, 0.0, 0.0) * transform.matrix();
        samples.push(LightSample::new(p, Normal::new(0.0, 0.0, 0.0)));
    }

    fn illuminate(&self, sample: &LightSample, p_shaded: Point) -> (f32, f32, f32) {
        let d2 = (sample.p - p_shaded).length2().max(1e-6);
        let falloff = self.intensity / d2;
        (self.color.0 * falloff, self.color.1 * falloff, self.color.2 * falloff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vector;

    #[test]
    fn single_sample_at_origin() {
        let mut transforms = TransformSampleList::new();
        transforms.push_translate(Vector::new(1.0, 12.0, 3.0), 0.0);
        let light = PointLight::new(transforms, (1.0, 1.0, 1.0), 1.0);

        let mut samples = Vec::new();
        light.get_samples(&mut samples, 4, 0.0);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].p, Point::new(1.0, 12.0, 3.0));
    }

    #[test]
    fn falloff_is_inverse_square() {
        let light = PointLight::new(TransformSampleList::new(), (1.0, 1.0, 1.0), 4.0);
        let sample = LightSample::new(Point::new(0.0, 0.0, 2.0), Normal::new(0.0, 0.0, 0.0));
        let (r, _, _) = light.illuminate(&sample, Point::new(0.0, 0.0, 0.0));
        assert!((r - 1.0).abs() < 1e-5);
    }
}
