//! SPH smoothing kernel functions.
//!
//! Three kernels over `r in [0, h]`: Poly6 for density, tension and the
//! attractor falloff, Spiky for the pressure gradient, and the Viscosity
//! kernel whose Laplacian feeds the surface-tension curvature estimate.
//! Every kernel returns zero outside its support and at `r = 0`; the
//! neighbour-collection coincidence rule guarantees the pipeline never
//! evaluates one at exactly zero distance.

use std::f32::consts::PI;

use glam::Vec2;

/// Poly6 smoothing kernel.
///
/// ```text
/// W(r, h) = 315 / (64 pi h^9) * (h^2 - r^2)^3    for 0 < r < h
/// W(r, h) = 0                                    otherwise
/// ```
#[inline]
pub fn poly6(r: f32, h: f32) -> f32 {
    if r <= 0.0 || r >= h {
        return 0.0;
    }
    let h2 = h * h;
    let f = h2 - r * r;
    315.0 / (64.0 * PI * h.powi(9)) * f * f * f
}

/// Gradient of the Poly6 kernel along the unit direction `dir`.
///
/// ```text
/// grad W = -945 / (32 pi h^9) * r * (h^2 - r^2)^2 * dir
/// ```
///
/// `dir` is the unit vector from the neighbour toward the particle; the
/// returned gradient is antisymmetric in it.
#[inline]
pub fn poly6_gradient(r: f32, h: f32, dir: Vec2) -> Vec2 {
    if r <= 0.0 || r >= h {
        return Vec2::ZERO;
    }
    let f = h * h - r * r;
    let scale = -945.0 / (32.0 * PI * h.powi(9)) * r * f * f;
    scale * dir
}

/// Laplacian of the Poly6 kernel.
///
/// ```text
/// lap W = -945 / (32 pi h^9) * (5 r^4 - 6 h^2 r^2 + h^4)
/// ```
#[inline]
pub fn poly6_laplacian(r: f32, h: f32) -> f32 {
    if r <= 0.0 || r >= h {
        return 0.0;
    }
    let r2 = r * r;
    let h2 = h * h;
    -945.0 / (32.0 * PI * h.powi(9)) * (5.0 * r2 * r2 - 6.0 * h2 * r2 + h2 * h2)
}

/// Spiky kernel, 2D normalization.
///
/// ```text
/// W(r, h) = (h - r)^2 / (pi h^4 / 6)
/// ```
#[inline]
pub fn spiky(r: f32, h: f32) -> f32 {
    if r <= 0.0 || r >= h {
        return 0.0;
    }
    let f = h - r;
    f * f / (PI * h.powi(4) / 6.0)
}

/// Scalar magnitude of the Spiky kernel gradient.
///
/// ```text
/// dW/dr = 12 / (pi h^4) * (r - h)
/// ```
///
/// Negative inside the support. The caller multiplies by the stored
/// neighbour direction, so only the scalar is returned here.
#[inline]
pub fn spiky_gradient(r: f32, h: f32) -> f32 {
    if r <= 0.0 || r >= h {
        return 0.0;
    }
    12.0 / (PI * h.powi(4)) * (r - h)
}

/// Viscosity kernel.
///
/// ```text
/// W(r, h) = 15 / (2 pi h^3) * (-r^3 / (2 h^3) + r^2 / h^2 + h / (2 r) - 1)
/// ```
#[inline]
pub fn viscosity(r: f32, h: f32) -> f32 {
    if r <= 0.0 || r >= h {
        return 0.0;
    }
    let h3 = h * h * h;
    let term1 = -(r * r * r) / (2.0 * h3);
    let term2 = r * r / (h * h);
    let term3 = h / (2.0 * r);
    15.0 / (2.0 * PI * h3) * (term1 + term2 + term3 - 1.0)
}

/// Laplacian of the Viscosity kernel.
///
/// ```text
/// lap W = 45 / (pi h^6) * (h - r)
/// ```
#[inline]
pub fn viscosity_laplacian(r: f32, h: f32) -> f32 {
    if r <= 0.0 || r >= h {
        return 0.0;
    }
    45.0 / (PI * h.powi(6)) * (h - r)
}
