#![allow(dead_code)]

/// Separable reconstruction filter: a pixel-space weight `w(dx, dy)` used
/// to combine nearby samples into a final pixel color.
#[derive(Debug, Copy, Clone)]
pub enum Filter {
    Box { width: f32, height: f32 },
    Gaussian { width: f32, height: f32 },
}

impl Filter {
    pub fn extent(&self) -> (f32, f32) {
        match *self {
            Filter::Box { width, height } | Filter::Gaussian { width, height } => (width, height),
        }
    }

    /// Weight of a sample offset `(dx, dy)` pixels from the target pixel
    /// center. Zero outside the filter's support for the box filter.
    pub fn weight(&self, dx: f32, dy: f32) -> f32 {
        match *self {
            Filter::Box { width, height } => {
                if dx.abs() <= width * 0.5 && dy.abs() <= height * 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
            Filter::Gaussian { width, height } => {
                let ex = (2.0 * dx / width).powi(2);
                let ey = (2.0 * dy / height).powi(2);
                (-2.0 * (ex + ey)).exp()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_filter_is_uniform_within_support() {
        let f = Filter::Box { width: 2.0, height: 2.0 };
        assert_eq!(f.weight(0.0, 0.0), 1.0);
        assert_eq!(f.weight(0.9, 0.9), 1.0);
        assert_eq!(f.weight(1.1, 0.0), 0.0);
    }

    #[test]
    fn gaussian_peaks_at_center_and_decays() {
        let f = Filter::Gaussian { width: 2.0, height: 2.0 };
        let center = f.weight(0.0, 0.0);
        let edge = f.weight(1.0, 0.0);
        assert_eq!(center, 1.0);
        assert!(edge < center);
        assert!(edge > 0.0);
    }
}
