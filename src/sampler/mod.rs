#![allow(dead_code)]

pub mod adaptive_grid;
pub mod fixed_grid;

pub use self::adaptive_grid::AdaptiveGridSampler;
pub use self::fixed_grid::FixedGridSampler;

/// A single sample's screen-space position (normalized `[0,1]` UV, `v`
/// increasing upward) and the time it was drawn for.
#[derive(Debug, Copy, Clone)]
pub struct Sample {
    pub uv: (f32, f32),
    pub time: f32,
}
