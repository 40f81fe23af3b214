//! SPH smoothing kernels (Müller et al. 2003).
//!
//! Coefficients depend only on the smoothing radius, so they are computed once
//! per solver. A non-positive radius yields all-zero kernels.

use crate::float::Float;

/// Precomputed poly6 / spiky / viscosity kernels for one smoothing radius.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SphKernels<F: Float> {
    h: F,
    h_sq: F,
    poly6: F,
    spiky_grad: F,
    viscosity_lap: F,
}

impl<F: Float> SphKernels<F> {
    pub fn new(h: F) -> Self {
        if !h.is_finite() || h <= F::from_f32(1e-12) {
            let z = F::zero();
            return SphKernels { h: z, h_sq: z, poly6: z, spiky_grad: z, viscosity_lap: z };
        }
        let pi = F::pi();
        let h2 = h * h;
        let h3 = h2 * h;
        let h6 = h3 * h3;
        let h9 = h6 * h3;
        SphKernels {
            h,
            h_sq: h2,
            poly6: F::from_f32(315.0) / (F::from_f32(64.0) * pi * h9),
            spiky_grad: F::from_f32(-45.0) / (pi * h6),
            viscosity_lap: F::from_f32(45.0) / (pi * h6),
        }
    }

    pub fn radius(&self) -> F {
        self.h
    }

    pub fn radius_sq(&self) -> F {
        self.h_sq
    }

    /// Density weight for a squared distance. No square root needed.
    pub fn poly6(&self, r_sq: F) -> F {
        if r_sq >= self.h_sq {
            return F::zero();
        }
        let d = self.h_sq - r_sq;
        self.poly6 * d * d * d
    }

    /// Magnitude of the spiky kernel gradient along the pair axis. Negative:
    /// the kernel falls off with distance.
    pub fn spiky_gradient(&self, r: F) -> F {
        if r >= self.h {
            return F::zero();
        }
        let d = self.h - r;
        self.spiky_grad * d * d
    }

    /// Laplacian of the viscosity kernel.
    pub fn viscosity_laplacian(&self, r: F) -> F {
        if r >= self.h {
            return F::zero();
        }
        self.viscosity_lap * (self.h - r)
    }
}
