//! Iterative constraint solver for Verlet particle systems.
//!
//! `ConstraintSolver` owns a contiguous particle arena and a constraint list
//! that refers into it by index. Relaxation runs a fixed number of passes per
//! step rather than iterating to convergence, so per-frame cost is bounded.

use crate::config::{validate_damping, validate_mass, SolverConfig};
use crate::constraint::{Constraint, ConstraintDispatch, DistanceConstraint};
use crate::error::{PhysicsError, PhysicsResult};
use crate::float::Float;
use crate::observer::StepObserver;
use crate::particle::Particle;
use crate::vec::Vec;
use alloc::vec::Vec as AllocVec;

/// Iterative constraint solver for Verlet particle systems.
#[derive(Clone, Debug)]
pub struct ConstraintSolver<V: Vec> {
    particles: AllocVec<Particle<V>>,
    constraints: AllocVec<Constraint<V>>,
}

impl<V: Vec> ConstraintSolver<V> {
    pub fn new() -> Self {
        ConstraintSolver {
            particles: AllocVec::new(),
            constraints: AllocVec::new(),
        }
    }

    /// Add a particle and return its index. Free particles need a positive mass.
    pub fn add_particle(&mut self, particle: Particle<V>) -> PhysicsResult<usize> {
        if !particle.pinned {
            validate_mass(particle.mass)?;
        }
        validate_damping(particle.damping)?;
        if !particle.pos.is_finite() {
            return Err(PhysicsError::InvalidParameter("position"));
        }
        let idx = self.particles.len();
        self.particles.push(particle);
        Ok(idx)
    }

    /// Add a constraint. Every index it references must already exist.
    pub fn add_constraint(&mut self, constraint: Constraint<V>) -> PhysicsResult<()> {
        if let Some(index) = constraint.max_index() {
            let count = self.particles.len();
            if index >= count {
                return Err(PhysicsError::ParticleOutOfBounds { index, count });
            }
        }
        self.constraints.push(constraint);
        Ok(())
    }

    /// Connect two existing particles at their current distance.
    pub fn connect(&mut self, a: usize, b: usize, stiffness: V::Scalar) -> PhysicsResult<()> {
        let c = DistanceConstraint::from_particles(a, b, &self.particles, stiffness)?;
        self.constraints.push(Constraint::Distance(c));
        Ok(())
    }

    pub fn apply_force(&mut self, force: V) {
        for p in self.particles.iter_mut() {
            p.apply_force(force);
        }
    }

    /// Verlet-integrate every free particle under `external` acceleration.
    pub fn integrate(&mut self, dt: V::Scalar, external: V) {
        for p in self.particles.iter_mut() {
            p.integrate(dt, external);
        }
    }

    pub fn particle_count(&self) -> usize { self.particles.len() }
    pub fn constraint_count(&self) -> usize { self.constraints.len() }
    pub fn particle(&self, index: usize) -> &Particle<V> { &self.particles[index] }
    pub fn particle_mut(&mut self, index: usize) -> &mut Particle<V> { &mut self.particles[index] }
    pub fn particles(&self) -> &[Particle<V>] { &self.particles }
    pub fn constraints(&self) -> &[Constraint<V>] { &self.constraints }

    pub fn positions(&self) -> AllocVec<V> {
        self.particles.iter().map(|p| p.pos).collect()
    }

    /// Largest |distance - rest length| over all distance constraints.
    pub fn max_constraint_error(&self) -> V::Scalar {
        self.constraints
            .iter()
            .filter_map(|c| match c {
                Constraint::Distance(d) => Some(d.error(&self.particles)),
                _ => None,
            })
            .fold(V::Scalar::zero(), |acc, e| acc.max(e))
    }

    pub fn remove_constraint(&mut self, index: usize) -> Constraint<V> {
        self.constraints.swap_remove(index)
    }

    pub fn retain_constraints<P: FnMut(&Constraint<V>) -> bool>(&mut self, keep: P) {
        self.constraints.retain(keep);
    }

    pub fn clear_constraints(&mut self) {
        self.constraints.clear();
    }
}

impl<V: ConstraintDispatch> ConstraintSolver<V> {
    /// Run every constraint once per pass, `iterations` times.
    pub fn relax<O: StepObserver>(&mut self, iterations: usize, observer: &mut O) {
        for i in 0..iterations {
            for constraint in self.constraints.iter() {
                constraint.solve(&mut self.particles);
            }
            observer.on_constraint_iteration(i);
        }
    }

    /// One frame: per sub-step, integrate under gravity + `external`, then relax.
    pub fn step<O: StepObserver>(
        &mut self,
        dt: V::Scalar,
        external: V,
        config: &SolverConfig<V>,
        observer: &mut O,
    ) {
        if !dt.is_finite() || dt <= V::Scalar::zero() {
            tracing::warn!(dt = dt.to_f64(), "step ignored: timestep must be positive");
            return;
        }
        let sub_dt = config.sub_dt(dt);
        let accel = config.gravity + external;

        for _sub in 0..config.sub_steps.max(1) {
            self.integrate(sub_dt, accel);
            observer.on_integrate();
            self.relax(config.iterations, observer);
        }

        observer.on_step_complete();
    }
}

impl<V: Vec> Default for ConstraintSolver<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::PinConstraint;
    use crate::observer::NoOpStepObserver;
    use crate::vec::Vec2;

    #[test]
    fn rejects_dangling_constraint() {
        let mut solver: ConstraintSolver<Vec2<f32>> = ConstraintSolver::new();
        solver.add_particle(Particle::new(Vec2::new(0.0, 0.0), 1.0)).unwrap();
        let c = DistanceConstraint::new(0, 3, 1.0, 1.0).unwrap();
        assert_eq!(
            solver.add_constraint(Constraint::Distance(c)),
            Err(PhysicsError::ParticleOutOfBounds { index: 3, count: 1 })
        );
        assert_eq!(solver.constraint_count(), 0);
    }

    #[test]
    fn rejects_massless_free_particle() {
        let mut solver: ConstraintSolver<Vec2<f32>> = ConstraintSolver::new();
        assert_eq!(
            solver.add_particle(Particle::new(Vec2::new(0.0, 0.0), 0.0)),
            Err(PhysicsError::InvalidMass)
        );
        assert!(solver.add_particle(Particle::pinned(Vec2::new(0.0, 0.0))).is_ok());
    }

    #[test]
    fn pin_constraint_pulls_toward_anchor() {
        let mut solver: ConstraintSolver<Vec2<f32>> = ConstraintSolver::new();
        let i = solver.add_particle(Particle::new(Vec2::new(4.0, 0.0), 1.0)).unwrap();
        let pin = PinConstraint::new(i, Vec2::new(0.0, 0.0), 0.5).unwrap();
        solver.add_constraint(Constraint::Pin(pin)).unwrap();
        solver.relax(1, &mut NoOpStepObserver);
        assert!((solver.particle(i).pos.x - 2.0).abs() < 1e-6);
    }
}
