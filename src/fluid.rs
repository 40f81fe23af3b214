//! Smoothed-particle hydrodynamics in the plane.
//!
//! Each step runs a density pass, derives pressure from the equation of state
//! `stiffness * (density - rest_density)`, accumulates pressure, viscosity and
//! gravity forces, then advances with explicit Euler inside a reflecting box.
//! Particles carry no connectivity; neighbors are recomputed every step.
//!
//! Pressure is deliberately left unclamped: below rest density it turns
//! negative and pulls neighbors together.

use crate::config::{validate_mass, validate_unit};
use crate::error::{PhysicsError, PhysicsResult};
use crate::float::Float;
use crate::kernel::SphKernels;
use crate::neighbor::{NeighborGrid, NeighborSearch};
use crate::observer::StepObserver;
use crate::vec::{Vec, Vec2};
use alloc::vec::Vec as AllocVec;
use core::ops::Range;

/// Fluid parameters. Lengths share the unit of `smoothing_radius`.
#[derive(Clone, Debug)]
pub struct FluidConfig<F: Float> {
    /// Kernel support radius `h`.
    pub smoothing_radius: F,
    /// Density the equation of state treats as zero pressure.
    pub rest_density: F,
    /// Gas constant of the equation of state.
    pub stiffness: F,
    /// Viscosity coefficient.
    pub viscosity: F,
    /// Mass given to particles spawned without an explicit mass.
    pub particle_mass: F,
    /// Uniform gravity acceleration.
    pub gravity: Vec2<F>,
    /// Lower corner of the reflecting container.
    pub bounds_min: Vec2<F>,
    /// Upper corner of the reflecting container.
    pub bounds_max: Vec2<F>,
    /// Fraction of normal speed kept (and reversed) on wall contact.
    pub boundary_damping: F,
    pub neighbor_search: NeighborSearch,
}

impl<F: Float> Default for FluidConfig<F> {
    fn default() -> Self {
        FluidConfig {
            smoothing_radius: F::one(),
            rest_density: F::from_f32(5.0),
            stiffness: F::two(),
            viscosity: F::from_f32(0.1),
            particle_mass: F::one(),
            gravity: Vec2::new(F::zero(), F::from_f32(-9.81)),
            bounds_min: Vec2::new(F::zero(), F::zero()),
            bounds_max: Vec2::new(F::from_f32(20.0), F::from_f32(20.0)),
            boundary_damping: F::half(),
            neighbor_search: NeighborSearch::BruteForce,
        }
    }
}

impl<F: Float> FluidConfig<F> {
    pub fn with_smoothing_radius(mut self, h: F) -> Self {
        self.smoothing_radius = h;
        self
    }

    pub fn with_rest_density(mut self, rest_density: F) -> Self {
        self.rest_density = rest_density;
        self
    }

    pub fn with_stiffness(mut self, stiffness: F) -> Self {
        self.stiffness = stiffness;
        self
    }

    pub fn with_viscosity(mut self, viscosity: F) -> Self {
        self.viscosity = viscosity;
        self
    }

    pub fn with_gravity(mut self, gravity: Vec2<F>) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_bounds(mut self, min: Vec2<F>, max: Vec2<F>) -> Self {
        self.bounds_min = min;
        self.bounds_max = max;
        self
    }

    pub fn with_neighbor_search(mut self, search: NeighborSearch) -> Self {
        self.neighbor_search = search;
        self
    }

    pub fn validate(&self) -> PhysicsResult<()> {
        let h = self.smoothing_radius;
        if !h.is_finite() || h <= F::zero() {
            return Err(PhysicsError::InvalidSmoothingRadius);
        }
        validate_mass(self.particle_mass)?;
        if !self.rest_density.is_finite() || self.rest_density <= F::zero() {
            return Err(PhysicsError::InvalidParameter("rest_density"));
        }
        if !self.stiffness.is_finite() || self.stiffness < F::zero() {
            return Err(PhysicsError::InvalidStiffness);
        }
        if !self.viscosity.is_finite() || self.viscosity < F::zero() {
            return Err(PhysicsError::InvalidParameter("viscosity"));
        }
        if !self.gravity.is_finite() {
            return Err(PhysicsError::InvalidParameter("gravity"));
        }
        let (lo, hi) = (self.bounds_min, self.bounds_max);
        if !lo.is_finite() || !hi.is_finite() || lo.x >= hi.x || lo.y >= hi.y {
            return Err(PhysicsError::InvalidBounds);
        }
        validate_unit(self.boundary_damping, "boundary_damping")?;
        if self.neighbor_search == NeighborSearch::Grid
            && NeighborGrid::dimensions_for(lo, hi, h).is_none()
        {
            return Err(PhysicsError::InvalidParameter("neighbor_search"));
        }
        Ok(())
    }
}

/// One SPH particle. Density and pressure are outputs of the last step.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FluidParticle<F: Float> {
    pub position: Vec2<F>,
    pub velocity: Vec2<F>,
    pub density: F,
    pub pressure: F,
    pub mass: F,
}

/// SPH fluid solver.
#[derive(Clone, Debug)]
pub struct Fluid<F: Float> {
    particles: AllocVec<FluidParticle<F>>,
    forces: AllocVec<Vec2<F>>,
    config: FluidConfig<F>,
    kernels: SphKernels<F>,
    grid: Option<NeighborGrid<F>>,
    points: AllocVec<Vec2<F>>,
    scratch: AllocVec<usize>,
}

impl<F: Float> Fluid<F> {
    pub fn new(config: FluidConfig<F>) -> PhysicsResult<Self> {
        config.validate()?;
        let kernels = SphKernels::new(config.smoothing_radius);
        let grid = match config.neighbor_search {
            NeighborSearch::BruteForce => None,
            NeighborSearch::Grid => Some(NeighborGrid::new(
                config.bounds_min,
                config.bounds_max,
                config.smoothing_radius,
            )?),
        };
        tracing::debug!(
            smoothing_radius = config.smoothing_radius.to_f64(),
            search = ?config.neighbor_search,
            "fluid created"
        );
        Ok(Fluid {
            particles: AllocVec::new(),
            forces: AllocVec::new(),
            config,
            kernels,
            grid,
            points: AllocVec::new(),
            scratch: AllocVec::new(),
        })
    }

    /// Add a particle with the configured mass.
    pub fn add_particle(&mut self, position: Vec2<F>, velocity: Vec2<F>) -> PhysicsResult<usize> {
        self.add_particle_with_mass(position, velocity, self.config.particle_mass)
    }

    pub fn add_particle_with_mass(&mut self, position: Vec2<F>, velocity: Vec2<F>, mass: F) -> PhysicsResult<usize> {
        validate_mass(mass)?;
        if !position.is_finite() || !velocity.is_finite() {
            return Err(PhysicsError::InvalidParameter("position"));
        }
        let idx = self.particles.len();
        self.particles.push(FluidParticle {
            position,
            velocity,
            density: F::zero(),
            pressure: F::zero(),
            mass,
        });
        self.forces.push(Vec2::zero());
        Ok(idx)
    }

    /// Spawn a resting `cols` x `rows` block starting at `min`. Returns the new index range.
    pub fn spawn_block(&mut self, min: Vec2<F>, cols: usize, rows: usize, spacing: F) -> PhysicsResult<Range<usize>> {
        if !spacing.is_finite() || spacing <= F::zero() {
            return Err(PhysicsError::InvalidParameter("spacing"));
        }
        let start = self.particles.len();
        for row in 0..rows {
            for col in 0..cols {
                let offset = Vec2::new(F::from_usize(col) * spacing, F::from_usize(row) * spacing);
                self.add_particle(min + offset, Vec2::zero())?;
            }
        }
        Ok(start..self.particles.len())
    }

    /// Fill `scratch` with every index that may lie within `h` of particle `i`.
    fn gather(&mut self, i: usize) {
        match &self.grid {
            Some(grid) => grid.candidates(self.particles[i].position, &mut self.scratch),
            None => {
                self.scratch.clear();
                self.scratch.extend(0..self.particles.len());
            }
        }
    }

    fn rebuild_grid(&mut self) {
        if let Some(grid) = self.grid.as_mut() {
            self.points.clear();
            self.points.extend(self.particles.iter().map(|p| p.position));
            grid.rebuild(&self.points);
        }
    }

    /// Density and pressure for every particle.
    fn compute_density_pressure(&mut self) {
        let h_sq = self.kernels.radius_sq();
        for i in 0..self.particles.len() {
            self.gather(i);
            let pi = self.particles[i].position;
            let mut density = F::zero();
            for &j in self.scratch.iter() {
                let pj = &self.particles[j];
                let r_sq = pi.distance_sq(pj.position);
                if r_sq < h_sq {
                    density = density + pj.mass * self.kernels.poly6(r_sq);
                }
            }
            let p = &mut self.particles[i];
            p.density = density;
            p.pressure = self.config.stiffness * (density - self.config.rest_density);
        }
    }

    /// Pressure, viscosity and gravity forces.
    fn compute_forces(&mut self, accel: Vec2<F>) {
        let h_sq = self.kernels.radius_sq();
        let eps = F::from_f32(1e-12);
        for i in 0..self.particles.len() {
            self.gather(i);
            let pi = self.particles[i];
            let mut force = accel.scale(pi.density);
            for &j in self.scratch.iter() {
                if j == i {
                    continue;
                }
                let pj = &self.particles[j];
                let offset = pi.position - pj.position;
                let r_sq = offset.length_sq();
                if r_sq >= h_sq {
                    continue;
                }
                let r = r_sq.sqrt();
                if r < eps || pj.density <= eps {
                    continue; // coincident particles have no separation axis
                }
                let dir = offset.scale(F::one() / r);
                let shared = (pi.pressure + pj.pressure) / (F::two() * pj.density);
                force = force - dir.scale(pj.mass * shared * self.kernels.spiky_gradient(r));
                let visc = self.config.viscosity * pj.mass / pj.density * self.kernels.viscosity_laplacian(r);
                force = force + (pj.velocity - pi.velocity).scale(visc);
            }
            self.forces[i] = force;
        }
    }

    fn integrate(&mut self, dt: F) {
        let eps = F::from_f32(1e-12);
        let (lo, hi) = (self.config.bounds_min, self.config.bounds_max);
        let bounce = -self.config.boundary_damping;
        for (p, &force) in self.particles.iter_mut().zip(self.forces.iter()) {
            if p.density > eps {
                p.velocity = p.velocity + force.scale(dt / p.density);
            }
            p.position = p.position + p.velocity.scale(dt);

            if p.position.x < lo.x {
                p.position.x = lo.x;
                p.velocity.x = p.velocity.x * bounce;
            } else if p.position.x > hi.x {
                p.position.x = hi.x;
                p.velocity.x = p.velocity.x * bounce;
            }
            if p.position.y < lo.y {
                p.position.y = lo.y;
                p.velocity.y = p.velocity.y * bounce;
            } else if p.position.y > hi.y {
                p.position.y = hi.y;
                p.velocity.y = p.velocity.y * bounce;
            }
        }
    }

    /// Advance one frame under gravity plus an `external` acceleration.
    pub fn step<O: StepObserver>(&mut self, dt: F, external: Vec2<F>, observer: &mut O) {
        if !dt.is_finite() || dt <= F::zero() {
            tracing::warn!(dt = dt.to_f64(), "fluid step ignored: timestep must be positive");
            return;
        }
        if self.particles.is_empty() {
            observer.on_step_complete();
            return;
        }
        self.rebuild_grid();
        self.compute_density_pressure();
        self.compute_forces(self.config.gravity + external);
        self.integrate(dt);
        observer.on_integrate();

        let (lo, hi) = self.density_range();
        tracing::trace!(particles = self.particles.len(), min_density = lo.to_f64(), max_density = hi.to_f64(), "fluid step");
        observer.on_step_complete();
    }

    /// Smallest and largest density from the last step.
    pub fn density_range(&self) -> (F, F) {
        let mut iter = self.particles.iter().map(|p| p.density);
        let first = iter.next().unwrap_or_default();
        iter.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)))
    }

    /// Sum of particle masses. Constant for the lifetime of the fluid.
    pub fn total_mass(&self) -> F {
        self.particles.iter().fold(F::zero(), |acc, p| acc + p.mass)
    }

    pub fn kinetic_energy(&self) -> F {
        self.particles
            .iter()
            .fold(F::zero(), |acc, p| acc + F::half() * p.mass * p.velocity.length_sq())
    }

    pub fn positions(&self) -> AllocVec<Vec2<F>> {
        self.particles.iter().map(|p| p.position).collect()
    }

    pub fn particles(&self) -> &[FluidParticle<F>] {
        &self.particles
    }

    pub fn config(&self) -> &FluidConfig<F> {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::NoOpStepObserver;

    #[test]
    fn lone_particle_falls_at_gravity() {
        let mut fluid = Fluid::new(FluidConfig::<f64>::default()).unwrap();
        fluid.add_particle(Vec2::new(10.0, 10.0), Vec2::zero()).unwrap();
        let dt = 0.01;
        fluid.step(dt, Vec2::zero(), &mut NoOpStepObserver);
        let p = fluid.particles()[0];
        assert!((p.velocity.y - -9.81 * dt).abs() < 1e-9);
        assert!(p.density > 0.0, "self contribution counts toward density");
    }

    #[test]
    fn pressure_can_go_negative() {
        let mut fluid = Fluid::new(FluidConfig::<f32>::default().with_rest_density(100.0)).unwrap();
        fluid.add_particle(Vec2::new(5.0, 5.0), Vec2::zero()).unwrap();
        fluid.step(0.01, Vec2::zero(), &mut NoOpStepObserver);
        assert!(fluid.particles()[0].pressure < 0.0);
    }

    #[test]
    fn compressed_pair_pushes_apart() {
        let config = FluidConfig::<f64>::default()
            .with_gravity(Vec2::zero())
            .with_rest_density(0.5)
            .with_viscosity(0.0);
        let mut fluid = Fluid::new(config).unwrap();
        fluid.add_particle(Vec2::new(10.0, 10.0), Vec2::zero()).unwrap();
        fluid.add_particle(Vec2::new(10.2, 10.0), Vec2::zero()).unwrap();
        fluid.step(0.01, Vec2::zero(), &mut NoOpStepObserver);
        let ps = fluid.particles();
        assert!(ps[0].velocity.x < 0.0 && ps[1].velocity.x > 0.0);
    }

    #[test]
    fn wall_contact_reflects_and_damps() {
        let config = FluidConfig::<f64>::default().with_gravity(Vec2::zero());
        let mut fluid = Fluid::new(config).unwrap();
        fluid.add_particle(Vec2::new(0.05, 10.0), Vec2::new(-10.0, 0.0)).unwrap();
        fluid.step(0.01, Vec2::zero(), &mut NoOpStepObserver);
        let p = fluid.particles()[0];
        assert_eq!(p.position.x, 0.0);
        assert!((p.velocity.x - 5.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_zero_smoothing_radius() {
        let err = Fluid::new(FluidConfig::<f32>::default().with_smoothing_radius(0.0)).unwrap_err();
        assert_eq!(err, PhysicsError::InvalidSmoothingRadius);
    }

    #[test]
    fn rejects_inverted_bounds() {
        let config = FluidConfig::<f32>::default().with_bounds(Vec2::new(5.0, 0.0), Vec2::new(1.0, 10.0));
        assert_eq!(Fluid::new(config).unwrap_err(), PhysicsError::InvalidBounds);
    }
}
