#![allow(dead_code)]

pub mod bvh;
pub mod grid;
pub mod volume_accel;

use crate::bbox::BBox;
use crate::error::ConfigError;
use crate::primitive::Intersection;
use crate::ray::Ray;

/// A spatial index over a `PrimitiveSet`, answering nearest-hit ray
/// queries. Must be built exactly once before `intersect` is called; the
/// renderer driver builds every accelerator before launching workers so
/// that `intersect` can be called safely from multiple threads at once.
pub trait Accelerator: Send + Sync {
    /// Idempotent: a second call returns `ConfigError::AcceleratorAlreadyBuilt`.
    fn build(&mut self) -> Result<(), ConfigError>;

    fn intersect(&self, ray: &Ray, time: f32) -> Option<Intersection>;

    /// Aggregate bounds of everything in the underlying primitive set,
    /// padded by `crate::bbox::BOUNDS_PADDING`. Valid only after `build()`.
    fn bounds(&self) -> BBox;

    fn has_built(&self) -> bool;
}

pub(crate) struct PrimRef {
    pub bounds: BBox,
    pub centroid: crate::math::Point,
    pub index: usize,
}
