#![allow(dead_code)]

use crate::math::{dot, Normal, Vector};

/// Inputs a shader receives at a surface hit: position, shading normal,
/// vertex color, texture coordinate, incoming (viewing) direction, and
/// surface derivatives.
#[derive(Debug, Copy, Clone)]
pub struct SurfaceInput {
    pub p: crate::math::Point,
    pub n: Normal,
    pub cd: (f32, f32, f32),
    pub uv: (f32, f32),
    pub i: Vector,
    pub dpdu: Vector,
    pub dpdv: Vector,
    pub shaded_object: usize,
}

/// A shader's result: surface color plus opacity, clamped to `[0, 1]`.
#[derive(Debug, Copy, Clone)]
pub struct SurfaceOutput {
    pub cs: (f32, f32, f32),
    pub os: f32,
}

impl SurfaceOutput {
    pub fn new(cs: (f32, f32, f32), os: f32) -> SurfaceOutput {
        SurfaceOutput {
            cs,
            os: crate::math::clamp(os, 0.0, 1.0),
        }
    }
}

/// `evaluate` is expected to call back into `ctx` to issue secondary
/// reflect/refract/shadow rays via the integrator; shaders own their
/// property tables and are otherwise opaque to the core.
pub trait Shader: std::fmt::Debug + Send + Sync {
    fn evaluate(
        &self,
        ctx: &mut crate::integrator::TraceContext,
        input: &SurfaceInput,
    ) -> SurfaceOutput;
}

/// `Reflect(I, N) = I + 2(-I.N)N`
pub fn reflect(i: Vector, n: Normal) -> Vector {
    let nv = n.into_vector();
    i + (nv * (-2.0 * dot(i, nv)))
}

/// `Refract(I, N, eta)`, falling back to reflection on total internal
/// reflection.
pub fn refract(i: Vector, n: Normal, eta: f32) -> Vector {
    let nv = n.into_vector();
    let cos_i = -dot(i, nv);
    let sin2_t = eta * eta * (1.0 - cos_i * cos_i).max(0.0);
    if sin2_t > 1.0 {
        return reflect(i, n);
    }
    let cos_t = (1.0 - sin2_t).max(0.0).sqrt();
    (i * eta) + (nv * (eta * cos_i - cos_t))
}

/// Schlick's approximation to the Fresnel reflectance, with `k^2 = 0`.
pub fn fresnel(i: Vector, n: Normal, eta: f32) -> f32 {
    let cos_i = dot(i * -1.0, n.into_vector()).max(0.0).min(1.0);
    let r0 = ((1.0 - eta) / (1.0 + eta)).powi(2);
    r0 + (1.0 - r0) * (1.0 - cos_i).powi(5)
}

/// `Phong(I, N, L, roughness) = max(0, I.Reflect(L,N))^(1/max(0.001,roughness))`
pub fn phong(i: Vector, n: Normal, l: Vector, roughness: f32) -> f32 {
    let r = reflect(l, n);
    dot(i, r).max(0.0).powf(1.0 / roughness.max(0.001))
}

/// Finite-difference bump mapping: perturbs `N` by the luminance gradient
/// of `texture` across `dPdu`/`dPdv`, scaled by `amplitude`.
pub fn bump_map<F: Fn(f32, f32) -> f32>(
    texture: F,
    dpdu: Vector,
    dpdv: Vector,
    uv: (f32, f32),
    amplitude: f32,
    n: Normal,
) -> Normal {
    const EPS: f32 = 1e-3;
    let (u, v) = uv;
    let bu = (texture(u + EPS, v) - texture(u - EPS, v)) / (2.0 * EPS);
    let bv = (texture(u, v + EPS) - texture(u, v - EPS)) / (2.0 * EPS);

    let nv = n.into_vector();
    let perturbed = nv + ((crate::math::cross(nv, dpdu) * bv) - (crate::math::cross(nv, dpdv) * bu)) * amplitude;
    perturbed.normalized().into_normal()
}

/// Flat, unlit color -- used for shading-group fallback and tests.
#[derive(Debug, Clone, Copy)]
pub struct ConstantShader {
    pub cd: (f32, f32, f32),
}

impl Shader for ConstantShader {
    fn evaluate(
        &self,
        _ctx: &mut crate::integrator::TraceContext,
        _input: &SurfaceInput,
    ) -> SurfaceOutput {
        SurfaceOutput::new(self.cd, 1.0)
    }
}

/// Lambertian diffuse shader: sums `illuminate` contributions from every
/// light visible to the integrator's trace target.
#[derive(Debug, Clone, Copy)]
pub struct DiffuseShader {
    pub cd: (f32, f32, f32),
}

impl Shader for DiffuseShader {
    fn evaluate(
        &self,
        ctx: &mut crate::integrator::TraceContext,
        input: &SurfaceInput,
    ) -> SurfaceOutput {
        let (r, g, b) = ctx.accumulate_diffuse(input, self.cd);
        SurfaceOutput::new((r, g, b), 1.0)
    }
}

/// Perfect mirror: issues a single reflect trace and returns its color.
#[derive(Debug, Clone, Copy)]
pub struct MirrorShader;

impl Shader for MirrorShader {
    fn evaluate(
        &self,
        ctx: &mut crate::integrator::TraceContext,
        input: &SurfaceInput,
    ) -> SurfaceOutput {
        let dir = reflect(input.i, input.n);
        let (rgba, _t) = ctx.trace_reflect(input.p, dir);
        SurfaceOutput::new((rgba.r, rgba.g, rgba.b), rgba.a)
    }
}

/// Dielectric: blends a Fresnel-weighted reflection and refraction.
#[derive(Debug, Clone, Copy)]
pub struct GlassShader {
    pub ior: f32,
}

impl Shader for GlassShader {
    fn evaluate(
        &self,
        ctx: &mut crate::integrator::TraceContext,
        input: &SurfaceInput,
    ) -> SurfaceOutput {
        let kr = fresnel(input.i, input.n, 1.0 / self.ior);
        let refl_dir = reflect(input.i, input.n);
        let refr_dir = refract(input.i, input.n, 1.0 / self.ior);

        let (refl_rgba, _) = ctx.trace_reflect(input.p, refl_dir);
        let (refr_rgba, _) = ctx.trace_refract(input.p, refr_dir);

        let r = refl_rgba.r * kr + refr_rgba.r * (1.0 - kr);
        let g = refl_rgba.g * kr + refr_rgba.g * (1.0 - kr);
        let b = refl_rgba.b * kr + refr_rgba.b * (1.0 - kr);
        SurfaceOutput::new((r, g, b), 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reflect_across_flat_normal() {
        let i = Vector::new(1.0, -1.0, 0.0);
        let n = Normal::new(0.0, 1.0, 0.0);
        let r = reflect(i, n);
        assert!((r.x() - 1.0).abs() < 1e-5);
        assert!((r.y() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn fresnel_normal_incidence_matches_schlick_r0() {
        let i = Vector::new(0.0, 0.0, -1.0);
        let n = Normal::new(0.0, 0.0, 1.0);
        let eta = 1.0 / 1.5;
        let f = fresnel(i, n, eta);
        let r0 = ((1.0 - eta) / (1.0 + eta)).powi(2);
        assert!((f - r0).abs() < 1e-5);
    }

    #[test]
    fn refract_total_internal_reflection_falls_back() {
        let i = Vector::new(0.99, -0.14, 0.0).normalized();
        let n = Normal::new(0.0, 1.0, 0.0);
        let r = refract(i, n, 1.5);
        let reflected = reflect(i, n);
        assert!((r.x() - reflected.x()).abs() < 1e-4);
    }
}
