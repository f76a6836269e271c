#![allow(dead_code)]

use crate::light::{Light, LightSample};
use crate::math::{dot, Normal, Point, TransformSampleList, Vector};
use crate::sampling::hash_jitter_2d;

/// A rectangular area light lying in its local XY plane, facing `+Z`.
/// Samples are laid out on a jittered regular grid across the rectangle,
/// the same subcell-jitter scheme the fixed-grid pixel sampler uses.
#[derive(Debug, Clone)]
pub struct GridLight {
    pub transforms: TransformSampleList,
    pub width: f32,
    pub height: f32,
    pub color: (f32, f32, f32),
    pub intensity: f32,
    pub rows: usize,
    pub cols: usize,
}

impl GridLight {
    pub fn new(
        transforms: TransformSampleList,
        width: f32,
        height: f32,
        color: (f32, f32, f32),
        intensity: f32,
        rows: usize,
        cols: usize,
    ) -> GridLight {
        GridLight {
            transforms,
            width,
            height,
            color,
            intensity,
            rows: rows.max(1),
            cols: cols.max(1),
        }
    }

    fn total_samples(&self) -> usize {
        self.rows * self.cols
    }
}

impl Light for GridLight {
    fn get_sample_count(&self) -> usize {
        self.total_samples()
    }

    fn get_samples(&self, samples: &mut Vec<LightSample>, max: usize, time: f32) {
        let transform = self.transforms.lerp_transform(time);
        let cell_w = self.width / self.cols as f32;
        let cell_h = self.height / self.rows as f32;
        let local_n = Vector::new(0.0, 0.0, 1.0);
        let n_world = (local_n * transform.matrix()).normalized().into_normal();

        let mut emitted = 0;
        'outer: for row in 0..self.rows {
            for col in 0..self.cols {
                if emitted >= max {
                    break 'outer;
                }
                let idx = (row * self.cols + col) as u32;
                let (ju, jv) = hash_jitter_2d(0x4752_4944, idx);

                let x = ((col as f32 + ju) * cell_w) - (self.width * 0.5);
                let y = ((row as f32 + jv) * cell_h) - (self.height * 0.5);
                let local_p = Point::new(x, y, 0.0);

                let p = local_p * transform.matrix();
                samples.push(LightSample::new(p, n_world));
                emitted += 1;
            }
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

        let area = self.width * self.height;
        let falloff = (self.intensity * area * facing) / (self.total_samples() as f32 * d2);
        (self.color.0 * falloff, self.color.1 * falloff, self.color.2 * falloff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_count_is_rows_times_cols() {
        let light = GridLight::new(TransformSampleList::new(), 2.0, 2.0, (1.0, 1.0, 1.0), 1.0, 3, 4);
        assert_eq!(light.get_sample_count(), 12);
    }

    #[test]
    fn get_samples_respects_max() {
        let light = GridLight::new(TransformSampleList::new(), 2.0, 2.0, (1.0, 1.0, 1.0), 1.0, 4, 4);
        let mut samples = Vec::new();
        light.get_samples(&mut samples, 5, 0.0);
        assert_eq!(samples.len(), 5);
    }

    #[test]
    fn samples_lie_within_rectangle_bounds() {
        let light = GridLight::new(TransformSampleList::new(), 4.0, 2.0, (1.0, 1.0, 1.0), 1.0, 2, 2);
        let mut samples = Vec::new();
        light.get_samples(&mut samples, 16, 0.0);
        for s in &samples {
            assert!(s.p[0].abs() <= 2.0 + 1e-5);
            assert!(s.p[1].abs() <= 1.0 + 1e-5);
        }
    }

    #[test]
    fn facing_toward_light_is_lit_away_is_dark() {
        let light = GridLight::new(TransformSampleList::new(), 2.0, 2.0, (1.0, 1.0, 1.0), 1.0, 1, 1);
        let sample = LightSample::new(Point::new(0.0, 0.0, 0.0), Normal::new(0.0, 0.0, 1.0));
        let (r, _, _) = light.illuminate(&sample, Point::new(0.0, 0.0, 1.0));
        assert!(r > 0.0);

        let (r2, _, _) = light.illuminate(&sample, Point::new(0.0, 0.0, -1.0));
        assert_eq!(r2, 0.0);
    }
}
