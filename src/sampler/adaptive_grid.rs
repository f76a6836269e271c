#![allow(dead_code)]

use std::collections::HashMap;

/// Adaptively refines a pixel's shading by recursively subdividing it into
/// quadrants wherever the four corner shades disagree by more than
/// `subd_threshold`, down to a maximum depth of `max_subd` halvings.
/// Quadrants that stay within threshold are resolved as the area-weighted
/// bilinear average of their corners, which for an axis-aligned rectangle
/// equals the true integral average of the bilinear patch through those
/// corners.
#[derive(Debug, Copy, Clone)]
pub struct AdaptiveGridSampler {
    pub max_subd: u32,
    pub subd_threshold: f32,
    pub sample_time_range: (f32, f32),
}

impl AdaptiveGridSampler {
    pub fn new(max_subd: u32, subd_threshold: f32) -> AdaptiveGridSampler {
        AdaptiveGridSampler {
            max_subd,
            subd_threshold,
            sample_time_range: (0.0, 0.0),
        }
    }

    fn divisions(&self) -> u32 {
        1 << self.max_subd
    }

    /// Shades pixel `(px, py)` of an image at `resolution`, calling `shade`
    /// at however many corner points are needed. `shade` takes a `(u, v)`
    /// screen-space position and a time, and returns an `(r, g, b, a)`
    /// color. Returns the filtered color and the number of distinct points
    /// actually shaded.
    pub fn sample_pixel<F>(&self, px: usize, py: usize, resolution: (usize, usize), mut shade: F) -> ((f32, f32, f32, f32), usize)
    where
        F: FnMut(f32, f32, f32) -> (f32, f32, f32, f32),
    {
        let divs = self.divisions();
        let udelta = 1.0 / (divs as f32 * resolution.0 as f32);
        let vdelta = 1.0 / (divs as f32 * resolution.1 as f32);
        let time = self.sample_time_range.0;

        let mut state = PixelState {
            px,
            py,
            divs,
            udelta,
            vdelta,
            time,
            cache: HashMap::new(),
            shade: &mut shade,
        };

        let total_area = (divs * divs) as f32;
        let (r, g, b, a, area) = state.subdivide(0, 0, divs, divs, 0);
        debug_assert!((area - total_area).abs() < 1e-3);

        ((r / area, g / area, b / area, a / area), state.cache.len())
    }
}

struct PixelState<'a, F: 'a> {
    px: usize,
    py: usize,
    divs: u32,
    udelta: f32,
    vdelta: f32,
    time: f32,
    cache: HashMap<(u32, u32), (f32, f32, f32, f32)>,
    shade: &'a mut F,
}

impl<'a, F> PixelState<'a, F>
where
    F: FnMut(f32, f32, f32) -> (f32, f32, f32, f32),
{
    /// Shades the subsample grid corner `(x, y)`, caching the result so
    /// corners shared between adjacent quadrants are only shaded once.
    fn corner(&mut self, x: u32, y: u32) -> (f32, f32, f32, f32) {
        if let Some(c) = self.cache.get(&(x, y)) {
            return *c;
        }
        let u = (self.px as u32 * self.divs + x) as f32 * self.udelta;
        let v = 1.0 - (self.py as u32 * self.divs + y) as f32 * self.vdelta;
        let c = (self.shade)(u, v, self.time);
        self.cache.insert((x, y), c);
        c
    }

    /// Returns the area-weighted sum of color over the rectangle
    /// `[x0, x1] x [y0, y1]` in subsample-grid units, plus the area, so
    /// callers can combine children before dividing by total area once.
    fn subdivide(&mut self, x0: u32, y0: u32, x1: u32, y1: u32, depth: u32) -> (f32, f32, f32, f32, f32) {
        let c00 = self.corner(x0, y0);
        let c10 = self.corner(x1, y0);
        let c01 = self.corner(x0, y1);
        let c11 = self.corner(x1, y1);
        let area = ((x1 - x0) * (y1 - y0)) as f32;

        let reached_min = x1 - x0 < 2 || y1 - y0 < 2;
        let needs_subd = !reached_min && depth < self.max_subd && Self::corner_spread(&[c00, c10, c01, c11]) > self.subd_threshold;

        if !needs_subd {
            let avg = average4(c00, c10, c01, c11);
            return (avg.0 * area, avg.1 * area, avg.2 * area, avg.3 * area, area);
        }

        let xm = x0 + (x1 - x0) / 2;
        let ym = y0 + (y1 - y0) / 2;
        let children = [
            self.subdivide(x0, y0, xm, ym, depth + 1),
            self.subdivide(xm, y0, x1, ym, depth + 1),
            self.subdivide(x0, ym, xm, y1, depth + 1),
            self.subdivide(xm, ym, x1, y1, depth + 1),
        ];

        let mut sum = (0.0, 0.0, 0.0, 0.0, 0.0);
        for c in &children {
            sum.0 += c.0;
            sum.1 += c.1;
            sum.2 += c.2;
            sum.3 += c.3;
            sum.4 += c.4;
        }
        sum
    }

    fn corner_spread(corners: &[(f32, f32, f32, f32); 4]) -> f32 {
        let mut min = corners[0];
        let mut max = corners[0];
        for &c in &corners[1..] {
            min = (min.0.min(c.0), min.1.min(c.1), min.2.min(c.2), min.3.min(c.3));
            max = (max.0.max(c.0), max.1.max(c.1), max.2.max(c.2), max.3.max(c.3));
        }
        let d = (max.0 - min.0, max.1 - min.1, max.2 - min.2, max.3 - min.3);
        d.0.max(d.1).max(d.2).max(d.3)
    }
}

fn average4(a: (f32, f32, f32, f32), b: (f32, f32, f32, f32), c: (f32, f32, f32, f32), d: (f32, f32, f32, f32)) -> (f32, f32, f32, f32) {
    (
        (a.0 + b.0 + c.0 + d.0) * 0.25,
        (a.1 + b.1 + c.1 + d.1) * 0.25,
        (a.2 + b.2 + c.2 + d.2) * 0.25,
        (a.3 + b.3 + c.3 + d.3) * 0.25,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_field_shades_only_four_corners() {
        let s = AdaptiveGridSampler::new(4, 0.01);
        let (color, count) = s.sample_pixel(3, 3, (16, 16), |_, _, _| (0.5, 0.5, 0.5, 1.0));
        assert_eq!(color, (0.5, 0.5, 0.5, 1.0));
        assert_eq!(count, 4);
    }

    #[test]
    fn sharp_edge_forces_full_subdivision() {
        let s = AdaptiveGridSampler::new(3, 0.001);
        let (_, count) = s.sample_pixel(0, 0, (8, 8), |u, _, _| {
            if u > 0.5 / 8.0 {
                (1.0, 1.0, 1.0, 1.0)
            } else {
                (0.0, 0.0, 0.0, 1.0)
            }
        });
        let divs = s.divisions() + 1;
        assert_eq!(count, (divs * divs) as usize);
    }

    #[test]
    fn uniform_field_average_is_exact() {
        let s = AdaptiveGridSampler::new(2, 0.25);
        let (color, _) = s.sample_pixel(1, 1, (4, 4), |_, _, _| (0.2, 0.4, 0.6, 0.8));
        assert!((color.0 - 0.2).abs() < 1e-6);
        assert!((color.1 - 0.4).abs() < 1e-6);
        assert!((color.2 - 0.6).abs() < 1e-6);
        assert!((color.3 - 0.8).abs() < 1e-6);
    }
}
