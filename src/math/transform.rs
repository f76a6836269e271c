#![allow(dead_code)]

use crate::lerp::{lerp, Lerp};
use crate::math::{Matrix4x4, Vector};

/// Order in which translate/rotate/scale are composed into a matrix.
/// Encoded as indices `[0, 5]`, matching the reference renderer's combined
/// enum layout.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransformOrder {
    Srt = 0,
    Str = 1,
    Rst = 2,
    Rts = 3,
    Trs = 4,
    Tsr = 5,
}

impl TransformOrder {
    /// Out-of-range values are a fatal programmer error, not a recoverable
    /// one -- callers build these from constants, never from untrusted data.
    pub fn from_index(i: usize) -> TransformOrder {
        match i {
            0 => TransformOrder::Srt,
            1 => TransformOrder::Str,
            2 => TransformOrder::Rst,
            3 => TransformOrder::Rts,
            4 => TransformOrder::Trs,
            5 => TransformOrder::Tsr,
            _ => panic!("transform_order index {} out of range [0,5]", i),
        }
    }
}

/// Order in which the X/Y/Z Euler rotations are composed. Encoded as
/// indices `[6, 11]`, continuing the reference renderer's combined enum
/// layout after `TransformOrder`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RotateOrder {
    Xyz = 6,
    Xzy = 7,
    Yxz = 8,
    Yzx = 9,
    Zxy = 10,
    Zyx = 11,
}

impl RotateOrder {
    pub fn from_index(i: usize) -> RotateOrder {
        match i {
            6 => RotateOrder::Xyz,
            7 => RotateOrder::Xzy,
            8 => RotateOrder::Yxz,
            9 => RotateOrder::Yzx,
            10 => RotateOrder::Zxy,
            11 => RotateOrder::Zyx,
            _ => panic!("rotate_order index {} out of range [6,11]", i),
        }
    }
}

fn rotate_matrix(order: RotateOrder, r: Vector) -> Matrix4x4 {
    let rx = Matrix4x4::new_from_values(
        1.0, 0.0, 0.0, 0.0, 0.0, r.x().cos(), -r.x().sin(), 0.0, 0.0, r.x().sin(), r.x().cos(),
        0.0, 0.0, 0.0, 0.0, 1.0,
    );
    let ry = Matrix4x4::new_from_values(
        r.y().cos(), 0.0, r.y().sin(), 0.0, 0.0, 1.0, 0.0, 0.0, -r.y().sin(), 0.0, r.y().cos(),
        0.0, 0.0, 0.0, 0.0, 1.0,
    );
    let rz = Matrix4x4::new_from_values(
        r.z().cos(), -r.z().sin(), 0.0, 0.0, r.z().sin(), r.z().cos(), 0.0, 0.0, 0.0, 0.0, 1.0,
        0.0, 0.0, 0.0, 0.0, 1.0,
    );

    match order {
        RotateOrder::Xyz => rx * ry * rz,
        RotateOrder::Xzy => rx * rz * ry,
        RotateOrder::Yxz => ry * rx * rz,
        RotateOrder::Yzx => ry * rz * rx,
        RotateOrder::Zxy => rz * rx * ry,
        RotateOrder::Zyx => rz * ry * rx,
    }
}

fn scale_matrix(s: Vector) -> Matrix4x4 {
    Matrix4x4::new_from_values(
        s.x(), 0.0, 0.0, 0.0, 0.0, s.y(), 0.0, 0.0, 0.0, 0.0, s.z(), 0.0, 0.0, 0.0, 0.0, 1.0,
    )
}

fn translate_matrix(t: Vector) -> Matrix4x4 {
    Matrix4x4::new_from_values(
        1.0, 0.0, 0.0, t.x(), 0.0, 1.0, 0.0, t.y(), 0.0, 0.0, 1.0, t.z(), 0.0, 0.0, 0.0, 1.0,
    )
}

/// An ordered composition of translate/rotate/scale, cached as both the
/// forward matrix and its inverse.
#[derive(Debug, Copy, Clone)]
pub struct Transform {
    pub translation: Vector,
    pub rotation: Vector,
    pub scale: Vector,
    pub transform_order: TransformOrder,
    pub rotate_order: RotateOrder,
    matrix: Matrix4x4,
    inverse: Matrix4x4,
}

impl Transform {
    pub fn new(
        translation: Vector,
        rotation: Vector,
        scale: Vector,
        transform_order: TransformOrder,
        rotate_order: RotateOrder,
    ) -> Transform {
        let t = translate_matrix(translation);
        let r = rotate_matrix(rotate_order, rotation);
        let s = scale_matrix(scale);

        let matrix = match transform_order {
            TransformOrder::Srt => s * r * t,
            TransformOrder::Str => s * t * r,
            TransformOrder::Rst => r * s * t,
            TransformOrder::Rts => r * t * s,
            TransformOrder::Trs => t * r * s,
            TransformOrder::Tsr => t * s * r,
        };

        Transform {
            translation,
            rotation,
            scale,
            transform_order,
            rotate_order,
            matrix,
            inverse: matrix.inverse(),
        }
    }

    pub fn identity() -> Transform {
        Transform::new(
            Vector::new(0.0, 0.0, 0.0),
            Vector::new(0.0, 0.0, 0.0),
            Vector::new(1.0, 1.0, 1.0),
            TransformOrder::Trs,
            RotateOrder::Xyz,
        )
    }

    pub fn matrix(&self) -> Matrix4x4 {
        self.matrix
    }

    pub fn inverse(&self) -> Matrix4x4 {
        self.inverse
    }
}

#[derive(Debug, Copy, Clone)]
struct Key<T> {
    time: f32,
    value: T,
}

/// Per-entity list of keyed samples for translate/rotate/scale, each with
/// an associated time. Samples are stored sorted by time; a repeated time
/// overwrites the prior key. List size per channel is bounded by
/// `MAX_SAMPLES`.
#[derive(Debug, Clone)]
pub struct TransformSampleList {
    translates: Vec<Key<Vector>>,
    rotates: Vec<Key<Vector>>,
    scales: Vec<Key<Vector>>,
    pub transform_order: TransformOrder,
    pub rotate_order: RotateOrder,
}

pub const MAX_SAMPLES: usize = 8;

fn insert_key<T>(keys: &mut Vec<Key<T>>, time: f32, value: T) {
    match keys.iter().position(|k| k.time == time) {
        Some(i) => keys[i].value = value,
        None => {
            let pos = keys.iter().position(|k| k.time > time).unwrap_or(keys.len());
            keys.insert(pos, Key { time, value });
            if keys.len() > MAX_SAMPLES {
                keys.pop();
            }
        }
    }
}

fn lerp_keys<T: Lerp + Copy>(keys: &[Key<T>], time: f32, default: T) -> T {
    if keys.is_empty() {
        return default;
    }
    if time <= keys[0].time {
        return keys[0].value;
    }
    if time >= keys[keys.len() - 1].time {
        return keys[keys.len() - 1].value;
    }

    for w in keys.windows(2) {
        if time >= w[0].time && time <= w[1].time {
            let span = w[1].time - w[0].time;
            let alpha = if span > 0.0 { (time - w[0].time) / span } else { 0.0 };
            return lerp(w[0].value, w[1].value, alpha);
        }
    }

    keys[keys.len() - 1].value
}

impl TransformSampleList {
    pub fn new() -> TransformSampleList {
        TransformSampleList {
            translates: Vec::new(),
            rotates: Vec::new(),
            scales: Vec::new(),
            transform_order: TransformOrder::Trs,
            rotate_order: RotateOrder::Xyz,
        }
    }

    pub fn push_translate(&mut self, v: Vector, time: f32) {
        insert_key(&mut self.translates, time, v);
    }

    pub fn push_rotate(&mut self, v: Vector, time: f32) {
        insert_key(&mut self.rotates, time, v);
    }

    pub fn push_scale(&mut self, v: Vector, time: f32) {
        insert_key(&mut self.scales, time, v);
    }

    pub fn is_empty(&self) -> bool {
        self.translates.is_empty() && self.rotates.is_empty() && self.scales.is_empty()
    }

    /// Piecewise-linear interpolation per channel, then composed into a
    /// `Transform` using the list's own `transform_order`/`rotate_order`.
    pub fn lerp_transform(&self, time: f32) -> Transform {
        let t = lerp_keys(&self.translates, time, Vector::new(0.0, 0.0, 0.0));
        let r = lerp_keys(&self.rotates, time, Vector::new(0.0, 0.0, 0.0));
        let s = lerp_keys(&self.scales, time, Vector::new(1.0, 1.0, 1.0));

        Transform::new(t, r, s, self.transform_order, self.rotate_order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_round_trip() {
        let t = Transform::identity();
        let id = t.matrix() * t.inverse();
        assert!(id.aprx_eq(Matrix4x4::new(), 1e-6));
    }

    #[test]
    fn forward_inverse_for_every_order() {
        let orders = [
            TransformOrder::Srt,
            TransformOrder::Str,
            TransformOrder::Rst,
            TransformOrder::Rts,
            TransformOrder::Trs,
            TransformOrder::Tsr,
        ];
        let rotate_orders = [
            RotateOrder::Xyz,
            RotateOrder::Xzy,
            RotateOrder::Yxz,
            RotateOrder::Yzx,
            RotateOrder::Zxy,
            RotateOrder::Zyx,
        ];

        for &to in &orders {
            for &ro in &rotate_orders {
                let t = Transform::new(
                    Vector::new(1.0, 2.0, 3.0),
                    Vector::new(0.3, -0.2, 0.5),
                    Vector::new(1.5, 0.7, 2.0),
                    to,
                    ro,
                );
                let id = t.matrix() * t.inverse();
                assert!(id.aprx_eq(Matrix4x4::new(), 1e-5));
            }
        }
    }

    #[test]
    fn sample_list_endpoints_and_continuity() {
        let mut list = TransformSampleList::new();
        list.push_translate(Vector::new(0.0, 0.0, 0.0), 0.0);
        list.push_translate(Vector::new(1.0, 0.0, 0.0), 1.0);

        let t0 = list.lerp_transform(0.0);
        let t1 = list.lerp_transform(1.0);
        let tm = list.lerp_transform(0.5);

        assert_eq!(t0.translation, Vector::new(0.0, 0.0, 0.0));
        assert_eq!(t1.translation, Vector::new(1.0, 0.0, 0.0));
        assert_eq!(tm.translation, Vector::new(0.5, 0.0, 0.0));

        // Before first / after last sample clamps to the endpoint.
        assert_eq!(list.lerp_transform(-5.0).translation, t0.translation);
        assert_eq!(list.lerp_transform(5.0).translation, t1.translation);
    }

    #[test]
    fn dedup_overwrites_same_time() {
        let mut list = TransformSampleList::new();
        list.push_translate(Vector::new(0.0, 0.0, 0.0), 0.5);
        list.push_translate(Vector::new(9.0, 0.0, 0.0), 0.5);

        assert_eq!(list.translates.len(), 1);
        assert_eq!(list.translates[0].value, Vector::new(9.0, 0.0, 0.0));
    }

    #[test]
    fn bounded_sample_count() {
        let mut list = TransformSampleList::new();
        for i in 0..20 {
            list.push_translate(Vector::new(i as f32, 0.0, 0.0), i as f32);
        }
        assert!(list.translates.len() <= MAX_SAMPLES);
    }
}
