//! Cloth: a grid of Verlet particles with structural, shear and bend links.
//!
//! The grid lies in the XY plane. Column `c` sits at `origin.x + c * spacing`
//! and row `r` hangs at `origin.y - r * spacing`, so row 0 is the top edge.
//! Row 0 is pinned on construction.

use crate::config::{validate_damping, validate_mass, validate_stiffness, SolverConfig, DEFAULT_DAMPING};
use crate::constraint::DistanceConstraint;
use crate::error::{PhysicsError, PhysicsResult};
use crate::float::Float;
use crate::observer::StepObserver;
use crate::particle::Particle;
use crate::vec::Vec;
use alloc::vec::Vec as AllocVec;

/// Configuration for a cloth grid.
#[derive(Clone, Debug)]
pub struct ClothConfig<F: Float> {
    pub cols: usize,
    pub rows: usize,
    pub spacing: F,
    pub structural_stiffness: F,
    pub shear_stiffness: F,
    pub bend_stiffness: F,
    pub particle_mass: F,
    pub damping: F,
}

impl<F: Float> Default for ClothConfig<F> {
    fn default() -> Self {
        ClothConfig {
            cols: 10,
            rows: 10,
            spacing: F::one(),
            structural_stiffness: F::one(),
            shear_stiffness: F::from_f32(0.5),
            bend_stiffness: F::from_f32(0.3),
            particle_mass: F::one(),
            damping: F::from_f32(DEFAULT_DAMPING),
        }
    }
}

impl<F: Float> ClothConfig<F> {
    pub fn with_size(mut self, cols: usize, rows: usize) -> Self {
        self.cols = cols;
        self.rows = rows;
        self
    }

    pub fn with_spacing(mut self, spacing: F) -> Self {
        self.spacing = spacing;
        self
    }

    /// Set structural, shear and bend stiffness at once.
    pub fn with_stiffness(mut self, structural: F, shear: F, bend: F) -> Self {
        self.structural_stiffness = structural;
        self.shear_stiffness = shear;
        self.bend_stiffness = bend;
        self
    }

    pub fn with_damping(mut self, damping: F) -> Self {
        self.damping = damping;
        self
    }

    /// Check dimensions and parameters; returns the config with stiffness clamped.
    pub fn validate(&self) -> PhysicsResult<Self> {
        if self.cols < 2 || self.rows < 2 {
            return Err(PhysicsError::InvalidGridDimensions { cols: self.cols, rows: self.rows });
        }
        if !self.spacing.is_finite() || self.spacing <= F::zero() {
            return Err(PhysicsError::InvalidParameter("spacing"));
        }
        Ok(ClothConfig {
            structural_stiffness: validate_stiffness(self.structural_stiffness)?,
            shear_stiffness: validate_stiffness(self.shear_stiffness)?,
            bend_stiffness: validate_stiffness(self.bend_stiffness)?,
            particle_mass: validate_mass(self.particle_mass)?,
            damping: validate_damping(self.damping)?,
            ..self.clone()
        })
    }
}

/// Constraint family of a cloth link.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ClothLink {
    /// Horizontal and vertical neighbors.
    Structural,
    /// Diagonal neighbors.
    Shear,
    /// Neighbors two apart, horizontally and vertically.
    Bend,
}

/// A cloth mesh built from a grid of Verlet particles.
#[derive(Clone, Debug)]
pub struct Cloth<V: Vec> {
    particles: AllocVec<Particle<V>>,
    structural: AllocVec<DistanceConstraint<V>>,
    shear: AllocVec<DistanceConstraint<V>>,
    bend: AllocVec<DistanceConstraint<V>>,
    cols: usize,
    rows: usize,
}

impl<V: Vec> Cloth<V> {
    /// Build a cloth whose top-left particle sits at `origin`.
    ///
    /// Particle at (col, row) has index `row * cols + col`.
    pub fn new(origin: V, config: &ClothConfig<V::Scalar>) -> PhysicsResult<Self> {
        let config = config.validate()?;
        let (cols, rows) = (config.cols, config.rows);
        let spacing = config.spacing;

        let mut particles = AllocVec::with_capacity(cols * rows);
        for row in 0..rows {
            for col in 0..cols {
                let offset = V::from_xy(
                    V::Scalar::from_usize(col) * spacing,
                    -(V::Scalar::from_usize(row) * spacing),
                );
                let mut p = Particle::new(origin + offset, config.particle_mass)
                    .with_damping(config.damping);
                if row == 0 {
                    p.pin();
                }
                particles.push(p);
            }
        }

        let diag_length = (spacing * spacing + spacing * spacing).sqrt();
        let bend_length = spacing * V::Scalar::two();
        let idx = |col: usize, row: usize| row * cols + col;

        let mut structural = AllocVec::new();
        for row in 0..rows {
            for col in 0..(cols - 1) {
                structural.push(DistanceConstraint::new(idx(col, row), idx(col + 1, row), spacing, config.structural_stiffness)?);
            }
        }
        for row in 0..(rows - 1) {
            for col in 0..cols {
                structural.push(DistanceConstraint::new(idx(col, row), idx(col, row + 1), spacing, config.structural_stiffness)?);
            }
        }

        let mut shear = AllocVec::new();
        for row in 0..(rows - 1) {
            for col in 0..(cols - 1) {
                shear.push(DistanceConstraint::new(idx(col, row), idx(col + 1, row + 1), diag_length, config.shear_stiffness)?);
                shear.push(DistanceConstraint::new(idx(col + 1, row), idx(col, row + 1), diag_length, config.shear_stiffness)?);
            }
        }

        let mut bend = AllocVec::new();
        for row in 0..rows {
            for col in 0..cols.saturating_sub(2) {
                bend.push(DistanceConstraint::new(idx(col, row), idx(col + 2, row), bend_length, config.bend_stiffness)?);
            }
        }
        for row in 0..rows.saturating_sub(2) {
            for col in 0..cols {
                bend.push(DistanceConstraint::new(idx(col, row), idx(col, row + 2), bend_length, config.bend_stiffness)?);
            }
        }

        tracing::debug!(
            cols,
            rows,
            structural = structural.len(),
            shear = shear.len(),
            bend = bend.len(),
            "cloth created"
        );

        Ok(Cloth { particles, structural, shear, bend, cols, rows })
    }

    /// Flat index of (col, row). Both must be inside the grid.
    pub fn index(&self, col: usize, row: usize) -> usize {
        debug_assert!(col < self.cols && row < self.rows, "cell ({}, {}) outside cloth", col, row);
        row * self.cols + col
    }

    fn checked_index(&self, col: usize, row: usize) -> PhysicsResult<usize> {
        if col < self.cols && row < self.rows {
            Ok(row * self.cols + col)
        } else {
            Err(PhysicsError::CellOutOfBounds { col, row, cols: self.cols, rows: self.rows })
        }
    }

    pub fn pin(&mut self, col: usize, row: usize) -> PhysicsResult<()> {
        let idx = self.checked_index(col, row)?;
        self.particles[idx].pin();
        Ok(())
    }

    pub fn unpin(&mut self, col: usize, row: usize, mass: V::Scalar) -> PhysicsResult<()> {
        let idx = self.checked_index(col, row)?;
        let mass = validate_mass(mass)?;
        self.particles[idx].unpin(mass);
        Ok(())
    }

    pub fn move_pin(&mut self, col: usize, row: usize, pos: V) -> PhysicsResult<()> {
        let idx = self.checked_index(col, row)?;
        self.particles[idx].move_to(pos);
        Ok(())
    }

    /// Cut the cloth at a particle by removing every link that touches it.
    pub fn tear_at(&mut self, col: usize, row: usize) -> PhysicsResult<()> {
        let idx = self.checked_index(col, row)?;
        for family in [&mut self.structural, &mut self.shear, &mut self.bend] {
            family.retain(|c| !c.touches(idx));
        }
        tracing::debug!(col, row, "cloth torn");
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

    /// Relax structural, then shear, then bend links, `iterations` times.
    pub fn relax<O: StepObserver>(&mut self, iterations: usize, observer: &mut O) {
        for i in 0..iterations {
            for family in [&self.structural, &self.shear, &self.bend] {
                for c in family.iter() {
                    c.solve(&mut self.particles);
                }
            }
            observer.on_constraint_iteration(i);
        }
    }

    /// One frame: per sub-step, integrate under gravity + `external` (e.g. wind), then relax.
    pub fn step<O: StepObserver>(
        &mut self,
        dt: V::Scalar,
        external: V,
        config: &SolverConfig<V>,
        observer: &mut O,
    ) {
        if !dt.is_finite() || dt <= V::Scalar::zero() {
            tracing::warn!(dt = dt.to_f64(), "cloth step ignored: timestep must be positive");
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

    pub fn positions(&self) -> AllocVec<V> {
        self.particles.iter().map(|p| p.pos).collect()
    }

    pub fn position_at(&self, col: usize, row: usize) -> V {
        self.particles[self.index(col, row)].pos
    }

    pub fn particle(&self, index: usize) -> &Particle<V> {
        &self.particles[index]
    }

    /// Largest |distance - rest length| over every link.
    pub fn max_constraint_error(&self) -> V::Scalar {
        self.structural
            .iter()
            .chain(self.shear.iter())
            .chain(self.bend.iter())
            .fold(V::Scalar::zero(), |acc, c| acc.max(c.error(&self.particles)))
    }

    pub fn cols(&self) -> usize { self.cols }
    pub fn rows(&self) -> usize { self.rows }
    pub fn particle_count(&self) -> usize { self.particles.len() }

    pub fn constraint_count(&self) -> usize {
        self.structural.len() + self.shear.len() + self.bend.len()
    }

    pub fn link_count(&self, link: ClothLink) -> usize {
        match link {
            ClothLink::Structural => self.structural.len(),
            ClothLink::Shear => self.shear.len(),
            ClothLink::Bend => self.bend.len(),
        }
    }
}
