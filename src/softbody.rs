//! Soft bodies: free Verlet particles over an arbitrary edge topology.
//!
//! Nothing is pinned by default, so a body free-falls under gravity unless it
//! is anchored or contained. No volume or area is preserved; large
//! deformations drift the rest shape.

use crate::config::{validate_damping, validate_mass, validate_stiffness, SolverConfig, DEFAULT_DAMPING};
use crate::constraint::{BoundsConstraint, Constraint, ConstraintDispatch, PinConstraint};
use crate::error::{PhysicsError, PhysicsResult};
use crate::float::Float;
use crate::observer::StepObserver;
use crate::particle::Particle;
use crate::solver::ConstraintSolver;
use crate::vec::{Vec, Vec2, Vec3};
use alloc::vec::Vec as AllocVec;

/// Per-body parameters shared by every particle and edge.
#[derive(Clone, Debug)]
pub struct SoftBodyConfig<F: Float> {
    pub stiffness: F,
    pub particle_mass: F,
    pub damping: F,
}

impl<F: Float> Default for SoftBodyConfig<F> {
    fn default() -> Self {
        SoftBodyConfig {
            stiffness: F::one(),
            particle_mass: F::one(),
            damping: F::from_f32(DEFAULT_DAMPING),
        }
    }
}

impl<F: Float> SoftBodyConfig<F> {
    pub fn with_stiffness(mut self, stiffness: F) -> Self {
        self.stiffness = stiffness;
        self
    }

    pub fn with_mass(mut self, mass: F) -> Self {
        self.particle_mass = mass;
        self
    }

    pub fn with_damping(mut self, damping: F) -> Self {
        self.damping = damping;
        self
    }

    pub fn validate(&self) -> PhysicsResult<Self> {
        Ok(SoftBodyConfig {
            stiffness: validate_stiffness(self.stiffness)?,
            particle_mass: validate_mass(self.particle_mass)?,
            damping: validate_damping(self.damping)?,
        })
    }
}

/// A deformable body relaxed with the shared constraint solver.
#[derive(Clone, Debug)]
pub struct SoftBody<V: Vec> {
    solver: ConstraintSolver<V>,
}

impl<V: ConstraintDispatch> SoftBody<V> {
    /// Build a body from vertex positions and an edge list. Each edge's rest
    /// length is the initial distance between its endpoints.
    pub fn from_topology(
        positions: &[V],
        edges: &[(usize, usize)],
        config: &SoftBodyConfig<V::Scalar>,
    ) -> PhysicsResult<Self> {
        let config = config.validate()?;
        let mut solver = ConstraintSolver::new();
        for &pos in positions {
            solver.add_particle(Particle::new(pos, config.particle_mass).with_damping(config.damping))?;
        }
        for &(a, b) in edges {
            solver.connect(a, b, config.stiffness)?;
        }
        tracing::debug!(
            particles = solver.particle_count(),
            edges = solver.constraint_count(),
            "soft body created"
        );
        Ok(SoftBody { solver })
    }

    /// Pull particle `index` toward a fixed world point every relaxation pass.
    pub fn anchor(&mut self, index: usize, position: V, stiffness: V::Scalar) -> PhysicsResult<()> {
        let pin = PinConstraint::new(index, position, stiffness)?;
        self.solver.add_constraint(Constraint::Pin(pin))
    }

    /// Keep every particle inside an axis-aligned box.
    pub fn set_bounds(&mut self, min: V, max: V, restitution: V::Scalar) -> PhysicsResult<()> {
        let bounds = BoundsConstraint::new(min, max, restitution)?;
        self.solver.add_constraint(Constraint::Bounds(bounds))
    }

    pub fn apply_force(&mut self, force: V) {
        self.solver.apply_force(force);
    }

    /// Apply an impulse at the nearest particle to `point`.
    pub fn poke(&mut self, point: V, impulse: V) {
        let nearest = self
            .solver
            .particles()
            .iter()
            .enumerate()
            .map(|(i, p)| (i, p.pos.distance_sq(point)))
            .fold(None, |best: Option<(usize, V::Scalar)>, (i, d)| match best {
                Some((_, bd)) if bd <= d => best,
                _ => Some((i, d)),
            });
        if let Some((idx, _)) = nearest {
            let p = self.solver.particle_mut(idx);
            // Verlet velocity = pos - prev_pos
            if !p.pinned {
                p.prev_pos = p.prev_pos - impulse;
            }
        }
    }

    pub fn integrate(&mut self, dt: V::Scalar, external: V) {
        self.solver.integrate(dt, external);
    }

    pub fn relax<O: StepObserver>(&mut self, iterations: usize, observer: &mut O) {
        self.solver.relax(iterations, observer);
    }

    pub fn step<O: StepObserver>(
        &mut self,
        dt: V::Scalar,
        external: V,
        config: &SolverConfig<V>,
        observer: &mut O,
    ) {
        self.solver.step(dt, external, config, observer);
    }

    /// Average particle position.
    pub fn centroid(&self) -> V {
        let particles = self.solver.particles();
        if particles.is_empty() {
            return V::zero();
        }
        let sum = particles.iter().fold(V::zero(), |acc, p| acc + p.pos);
        sum.scale(V::Scalar::one() / V::Scalar::from_usize(particles.len()))
    }

    pub fn positions(&self) -> AllocVec<V> {
        self.solver.positions()
    }

    pub fn particle(&self, index: usize) -> &Particle<V> {
        self.solver.particle(index)
    }

    pub fn max_constraint_error(&self) -> V::Scalar {
        self.solver.max_constraint_error()
    }

    pub fn particle_count(&self) -> usize {
        self.solver.particle_count()
    }

    pub fn constraint_count(&self) -> usize {
        self.solver.constraint_count()
    }
}

impl<F: Float> SoftBody<Vec3<F>> {
    /// Unit-sphere approximation: an icosahedron scaled to `radius`, with one
    /// constraint per polyhedron edge (12 particles, 30 edges).
    pub fn icosphere(center: Vec3<F>, radius: F, config: &SoftBodyConfig<F>) -> PhysicsResult<Self> {
        if !radius.is_finite() || radius <= F::zero() {
            return Err(PhysicsError::InvalidParameter("radius"));
        }
        let phi = (F::one() + F::from_f32(5.0).sqrt()) * F::half();
        let (o, z) = (F::one(), F::zero());
        let raw = [
            Vec3::new(-o, phi, z), Vec3::new(o, phi, z), Vec3::new(-o, -phi, z), Vec3::new(o, -phi, z),
            Vec3::new(z, -o, phi), Vec3::new(z, o, phi), Vec3::new(z, -o, -phi), Vec3::new(z, o, -phi),
            Vec3::new(phi, z, -o), Vec3::new(phi, z, o), Vec3::new(-phi, z, -o), Vec3::new(-phi, z, o),
        ];
        let positions: AllocVec<Vec3<F>> = raw
            .iter()
            .map(|v| center + v.normalize().scale(radius))
            .collect();

        // Icosahedron edges are exactly the vertex pairs two units apart
        // before normalization.
        let edge_sq = F::from_f32(4.0);
        let mut edges = AllocVec::with_capacity(30);
        for i in 0..raw.len() {
            for j in (i + 1)..raw.len() {
                if (raw[i].distance_sq(raw[j]) - edge_sq).abs() < F::from_f32(1e-3) {
                    edges.push((i, j));
                }
            }
        }
        Self::from_topology(&positions, &edges, config)
    }
}

impl<F: Float> SoftBody<Vec2<F>> {
    /// A closed ring of `segments` particles with braces across the diameter.
    pub fn circle(
        center: Vec2<F>,
        radius: F,
        segments: usize,
        config: &SoftBodyConfig<F>,
    ) -> PhysicsResult<Self> {
        if segments < 3 {
            return Err(PhysicsError::InsufficientSegments { min: 3, got: segments });
        }
        if !radius.is_finite() || radius <= F::zero() {
            return Err(PhysicsError::InvalidParameter("radius"));
        }
        let two_pi = F::two() * F::pi();
        let positions: AllocVec<Vec2<F>> = (0..segments)
            .map(|i| {
                let angle = two_pi * F::from_usize(i) / F::from_usize(segments);
                center + Vec2::from_angle(angle).scale(radius)
            })
            .collect();
        Self::from_topology(&positions, &ring_edges(segments), config)
    }

    /// A braced rectangular outline with `segments_per_side` particles per edge.
    pub fn rectangle(
        center: Vec2<F>,
        width: F,
        height: F,
        segments_per_side: usize,
        config: &SoftBodyConfig<F>,
    ) -> PhysicsResult<Self> {
        let segs = segments_per_side.max(2);
        let half_w = width * F::half();
        let half_h = height * F::half();
        let mut positions = AllocVec::with_capacity(segs * 4);

        for i in 0..segs {
            let t = F::from_usize(i) / F::from_usize(segs);
            positions.push(Vec2::new(center.x - half_w + width * t, center.y - half_h));
        }
        for i in 0..segs {
            let t = F::from_usize(i) / F::from_usize(segs);
            positions.push(Vec2::new(center.x + half_w, center.y - half_h + height * t));
        }
        for i in 0..segs {
            let t = F::from_usize(i) / F::from_usize(segs);
            positions.push(Vec2::new(center.x + half_w - width * t, center.y + half_h));
        }
        for i in 0..segs {
            let t = F::from_usize(i) / F::from_usize(segs);
            positions.push(Vec2::new(center.x - half_w, center.y + half_h - height * t));
        }

        Self::from_topology(&positions, &ring_edges(positions.len()), config)
    }

    /// Area of the particle polygon in index order (shoelace formula).
    pub fn area(&self) -> F {
        let particles = self.solver.particles();
        let n = particles.len();
        if n < 3 {
            return F::zero();
        }
        let mut sum = F::zero();
        for i in 0..n {
            let j = (i + 1) % n;
            sum = sum + particles[i].pos.cross(particles[j].pos);
        }
        (sum * F::half()).abs()
    }

    /// Check if a point is inside the particle polygon using ray casting.
    pub fn contains(&self, point: Vec2<F>) -> bool {
        let particles = self.solver.particles();
        let n = particles.len();
        if n < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let pi = particles[i].pos;
            let pj = particles[j].pos;
            let dy = pj.y - pi.y;
            if !dy.is_near_zero(F::from_f32(1e-10))
                && ((pi.y > point.y) != (pj.y > point.y))
                && (point.x < (pj.x - pi.x) * (point.y - pi.y) / dy + pi.x)
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }
}

/// Perimeter edges plus braces to the opposite particle.
fn ring_edges(n: usize) -> AllocVec<(usize, usize)> {
    let mut edges: AllocVec<(usize, usize)> = (0..n).map(|i| (i, (i + 1) % n)).collect();
    if n >= 4 {
        let half = n / 2;
        edges.extend((0..half).map(|i| (i, i + half)));
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icosphere_has_icosahedron_topology() {
        let body = SoftBody::icosphere(Vec3::new(0.0f32, 0.0, 0.0), 1.0, &SoftBodyConfig::default()).unwrap();
        assert_eq!(body.particle_count(), 12);
        assert_eq!(body.constraint_count(), 30);
        for p in body.positions() {
            assert!((p.length() - 1.0).abs() < 1e-5);
        }
        assert!(body.max_constraint_error() < 1e-5);
    }

    #[test]
    fn circle_area_approx_pi_r_squared() {
        let body = SoftBody::circle(Vec2::new(0.0f32, 0.0), 1.0, 32, &SoftBodyConfig::default()).unwrap();
        let expected = core::f32::consts::PI;
        assert!((body.area() - expected).abs() < 0.1, "area = {}", body.area());
    }

    #[test]
    fn contains_center() {
        let body = SoftBody::circle(Vec2::new(5.0f32, 5.0), 2.0, 16, &SoftBodyConfig::default()).unwrap();
        assert!(body.contains(Vec2::new(5.0, 5.0)), "Center should be inside");
        assert!(!body.contains(Vec2::new(100.0, 100.0)), "Far point should be outside");
    }

    #[test]
    fn centroid_at_center() {
        let body = SoftBody::circle(Vec2::new(3.0f32, 4.0), 1.0, 16, &SoftBodyConfig::default()).unwrap();
        let c = body.centroid();
        assert!((c.x - 3.0).abs() < 0.01, "centroid.x = {}", c.x);
        assert!((c.y - 4.0).abs() < 0.01, "centroid.y = {}", c.y);
    }

    #[test]
    fn rectangle_is_braced() {
        let body = SoftBody::rectangle(Vec2::new(0.0f32, 0.0), 4.0, 2.0, 3, &SoftBodyConfig::default()).unwrap();
        assert_eq!(body.particle_count(), 12);
        assert_eq!(body.constraint_count(), 12 + 6);
        assert!((body.area() - 8.0).abs() < 1e-4);
    }

    #[test]
    fn too_few_segments() {
        let err = SoftBody::circle(Vec2::new(0.0f32, 0.0), 1.0, 2, &SoftBodyConfig::default()).unwrap_err();
        assert_eq!(err, PhysicsError::InsufficientSegments { min: 3, got: 2 });
    }

    #[test]
    fn topology_rejects_bad_edges() {
        let positions = [Vec2::new(0.0f32, 0.0), Vec2::new(1.0, 0.0)];
        let err = SoftBody::from_topology(&positions, &[(0, 5)], &SoftBodyConfig::default()).unwrap_err();
        assert_eq!(err, PhysicsError::ParticleOutOfBounds { index: 5, count: 2 });
    }
}
