#![allow(dead_code)]

use crate::sampler::Sample;
use crate::sampling::hash_jitter_2d;

/// A regular subpixel grid of `pixel_samples.0 x pixel_samples.1` samples
/// per pixel, jittered within their subcell, plus a margin of extra
/// samples around each pixel so filters wider than one pixel have support.
/// Sample positions are keyed off absolute grid coordinates, so the same
/// margin sample comes out identically whichever neighboring pixel asks
/// for it.
#[derive(Debug, Clone)]
pub struct FixedGridSampler {
    pub resolution: (usize, usize),
    pub pixel_samples: (usize, usize),
    pub filter_width: (f32, f32),
    pub jitter: f32,
    pub sample_time_range: (f32, f32),
}

impl FixedGridSampler {
    pub fn new(resolution: (usize, usize), pixel_samples: (usize, usize), filter_width: (f32, f32)) -> FixedGridSampler {
        assert!(pixel_samples.0 > 0 && pixel_samples.1 > 0);
        FixedGridSampler {
            resolution,
            pixel_samples,
            filter_width,
            jitter: 1.0,
            sample_time_range: (0.0, 0.0),
        }
    }

    fn margin(&self) -> (usize, usize) {
        (
            (((self.filter_width.0 - 1.0).max(0.0) * self.pixel_samples.0 as f32) * 0.5).ceil() as usize,
            (((self.filter_width.1 - 1.0).max(0.0) * self.pixel_samples.1 as f32) * 0.5).ceil() as usize,
        )
    }

    pub fn samples_per_pixel(&self) -> usize {
        let (mx, my) = self.margin();
        (self.pixel_samples.0 + 2 * mx) * (self.pixel_samples.1 + 2 * my)
    }

    /// All samples belonging to pixel `(px, py)`, including its margin
    /// border. `seed` selects an independent stream, e.g. per render pass.
    pub fn samples_for_pixel(&self, px: usize, py: usize, seed: u32) -> Vec<Sample> {
        let (rx, ry) = self.pixel_samples;
        let (mx, my) = self.margin();
        let udelta = 1.0 / (rx * self.resolution.0) as f32;
        let vdelta = 1.0 / (ry * self.resolution.1) as f32;

        let mut samples = Vec::with_capacity((rx + 2 * mx) * (ry + 2 * my));
        for sy in 0..(ry + 2 * my) {
            for sx in 0..(rx + 2 * mx) {
                let gx = (px * rx) as i64 + sx as i64 - mx as i64;
                let gy = (py * ry) as i64 + sy as i64 - my as i64;
                let cell_seed = crate::hash::hash_u32(gx as i32 as u32, (gy as i32 as u32) ^ seed);

                let mut u = (0.5 + gx as f32) * udelta;
                let mut v = 1.0 - (0.5 + gy as f32) * vdelta;
                if self.jitter > 0.0 {
                    let (ju, jv) = hash_jitter_2d(seed, cell_seed);
                    u += udelta * (ju - 0.5) * self.jitter;
                    v += vdelta * (jv - 0.5) * self.jitter;
                }

                let time = if self.sample_time_range.0 < self.sample_time_range.1 {
                    let (jt, _) = hash_jitter_2d(seed.wrapping_add(0x5453_4D50), cell_seed);
                    self.sample_time_range.0 + jt * (self.sample_time_range.1 - self.sample_time_range.0)
                } else {
                    self.sample_time_range.0
                };

                samples.push(Sample { uv: (u, v), time });
            }
        }
        samples
    }
}
