//! Configuration shared by the particle solvers, plus the validation helpers
//! every constructor runs before a solver is handed out.

use crate::error::{PhysicsError, PhysicsResult};
use crate::float::Float;
use crate::vec::Vec;

/// Relaxation passes per frame when nothing else is configured.
pub const DEFAULT_ITERATIONS: usize = 5;

/// Velocity retention applied to the implicit Verlet velocity each step.
pub const DEFAULT_DAMPING: f32 = 0.99;

/// Configuration for the Verlet integrator and constraint relaxation.
///
/// # Builder Pattern
/// ```
/// use kinema::config::SolverConfig;
/// use kinema::vec::Vec2;
///
/// let config: SolverConfig<Vec2<f32>> = SolverConfig::new()
///     .with_iterations(8)
///     .with_gravity(Vec2::new(0.0, -9.81))
///     .with_sub_steps(2);
/// ```
#[derive(Clone, Debug)]
pub struct SolverConfig<V: Vec> {
    /// Constraint relaxation passes per sub-step. Fixed, not adaptive. Default: 5.
    pub iterations: usize,
    /// Gravity acceleration vector. Default: zero (no gravity).
    pub gravity: V,
    /// Number of sub-steps per frame. Higher = more stable. Default: 1.
    pub sub_steps: usize,
}

impl<V: Vec> SolverConfig<V> {
    /// Create a new config with default values.
    pub fn new() -> Self {
        SolverConfig {
            iterations: DEFAULT_ITERATIONS,
            gravity: V::zero(),
            sub_steps: 1,
        }
    }

    /// Set the number of constraint iterations.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the gravity vector.
    pub fn with_gravity(mut self, gravity: V) -> Self {
        self.gravity = gravity;
        self
    }

    /// Set the number of sub-steps.
    pub fn with_sub_steps(mut self, sub_steps: usize) -> Self {
        self.sub_steps = sub_steps.max(1);
        self
    }

    /// Check that the config describes a runnable solver.
    pub fn validate(&self) -> PhysicsResult<()> {
        if self.iterations == 0 {
            return Err(PhysicsError::InvalidParameter("iterations"));
        }
        if !self.gravity.is_finite() {
            return Err(PhysicsError::InvalidParameter("gravity"));
        }
        Ok(())
    }

    /// Per-sub-step timestep for a frame of length `dt`.
    pub fn sub_dt(&self, dt: V::Scalar) -> V::Scalar {
        dt / V::Scalar::from_usize(self.sub_steps.max(1))
    }
}

impl<V: Vec> Default for SolverConfig<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Reject non-positive or non-finite masses.
pub fn validate_mass<F: Float>(mass: F) -> PhysicsResult<F> {
    if mass.is_finite() && mass > F::zero() {
        Ok(mass)
    } else {
        Err(PhysicsError::InvalidMass)
    }
}

/// Reject stiffness outside (0, inf) and clamp anything above 1 down to 1.
pub fn validate_stiffness<F: Float>(stiffness: F) -> PhysicsResult<F> {
    if !stiffness.is_finite() || stiffness <= F::zero() {
        return Err(PhysicsError::InvalidStiffness);
    }
    if stiffness > F::one() {
        tracing::warn!(stiffness = ?stiffness, "stiffness above 1 clamped to 1");
        return Ok(F::one());
    }
    Ok(stiffness)
}

/// Damping is a retention factor in [0, 1].
pub fn validate_damping<F: Float>(damping: F) -> PhysicsResult<F> {
    if damping.is_finite() && damping >= F::zero() && damping <= F::one() {
        Ok(damping)
    } else {
        Err(PhysicsError::InvalidDamping)
    }
}

/// Require a finite value in [0, 1] for the named parameter.
pub fn validate_unit<F: Float>(value: F, name: &'static str) -> PhysicsResult<F> {
    if value.is_finite() && value >= F::zero() && value <= F::one() {
        Ok(value)
    } else {
        Err(PhysicsError::InvalidParameter(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vec::Vec2;

    #[test]
    fn defaults_match_reference_tuning() {
        let config: SolverConfig<Vec2<f32>> = SolverConfig::default();
        assert_eq!(config.iterations, 5);
        assert_eq!(config.sub_steps, 1);
        assert_eq!(config.gravity, Vec2::new(0.0, 0.0));
    }

    #[test]
    fn sub_steps_never_zero() {
        let config: SolverConfig<Vec2<f32>> = SolverConfig::new().with_sub_steps(0);
        assert_eq!(config.sub_steps, 1);
        assert!((config.sub_dt(0.5) - 0.5).abs() < 1e-7);
    }

    #[test]
    fn validate_rejects_zero_iterations_and_bad_gravity() {
        let ok: SolverConfig<Vec2<f32>> = SolverConfig::new();
        assert_eq!(ok.validate(), Ok(()));
        assert_eq!(
            ok.clone().with_iterations(0).validate(),
            Err(PhysicsError::InvalidParameter("iterations"))
        );
        assert_eq!(
            ok.with_gravity(Vec2::new(f32::NAN, 0.0)).validate(),
            Err(PhysicsError::InvalidParameter("gravity"))
        );
    }

    #[test]
    fn stiffness_is_clamped_or_rejected() {
        assert_eq!(validate_stiffness(2.5f32), Ok(1.0));
        assert_eq!(validate_stiffness(0.25f32), Ok(0.25));
        assert_eq!(validate_stiffness(0.0f32), Err(PhysicsError::InvalidStiffness));
        assert_eq!(validate_stiffness(f32::NAN), Err(PhysicsError::InvalidStiffness));
    }

    #[test]
    fn mass_must_be_positive() {
        assert!(validate_mass(1.0f64).is_ok());
        assert_eq!(validate_mass(0.0f64), Err(PhysicsError::InvalidMass));
        assert_eq!(validate_mass(-3.0f64), Err(PhysicsError::InvalidMass));
        assert_eq!(validate_mass(f64::INFINITY), Err(PhysicsError::InvalidMass));
    }

    #[test]
    fn damping_range() {
        assert!(validate_damping(0.99f32).is_ok());
        assert_eq!(validate_damping(1.5f32), Err(PhysicsError::InvalidDamping));
    }
}
