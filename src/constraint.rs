//! Position constraints for Verlet particles: distance, pin, bounds.

use crate::config::{validate_stiffness, validate_unit};
use crate::error::{PhysicsError, PhysicsResult};
use crate::float::Float;
use crate::particle::Particle;
use crate::vec::{Vec, Vec2, Vec3};

/// Trait for dispatching constraints that need per-component access,
/// which the generic `Vec` trait doesn't expose.
///
/// Implemented for `Vec2<F>` and `Vec3<F>`.
pub trait ConstraintDispatch: Vec + Sized {
    fn dispatch_bounds(c: &BoundsConstraint<Self>, particles: &mut [Particle<Self>]);
}

/// A constraint that can be applied to a set of particles.
#[derive(Clone, Debug)]
pub enum Constraint<V: Vec> {
    Distance(DistanceConstraint<V>),
    Pin(PinConstraint<V>),
    Bounds(BoundsConstraint<V>),
}

impl<V: ConstraintDispatch> Constraint<V> {
    pub fn solve(&self, particles: &mut [Particle<V>]) {
        match self {
            Constraint::Distance(c) => c.solve(particles),
            Constraint::Pin(c) => c.solve(particles),
            Constraint::Bounds(c) => V::dispatch_bounds(c, particles),
        }
    }
}

impl<V: Vec> Constraint<V> {
    /// Highest particle index referenced. Bounds act on every particle.
    pub fn max_index(&self) -> Option<usize> {
        match self {
            Constraint::Distance(c) => Some(c.a.max(c.b)),
            Constraint::Pin(c) => Some(c.particle),
            Constraint::Bounds(_) => None,
        }
    }
}

/// Keeps two particles `rest_length` apart.
///
/// The rest length is fixed at construction; only particle positions move.
#[derive(Clone, Debug)]
pub struct DistanceConstraint<V: Vec> {
    a: usize,
    b: usize,
    rest_length: V::Scalar,
    stiffness: V::Scalar,
}

impl<V: Vec> DistanceConstraint<V> {
    pub fn new(a: usize, b: usize, rest_length: V::Scalar, stiffness: V::Scalar) -> PhysicsResult<Self> {
        if a == b {
            return Err(PhysicsError::SelfConstraint(a));
        }
        if !rest_length.is_finite() || rest_length < V::Scalar::zero() {
            return Err(PhysicsError::InvalidParameter("rest_length"));
        }
        let stiffness = validate_stiffness(stiffness)?;
        Ok(DistanceConstraint { a, b, rest_length, stiffness })
    }

    /// Build a constraint whose rest length is the particles' current distance.
    pub fn from_particles(a: usize, b: usize, particles: &[Particle<V>], stiffness: V::Scalar) -> PhysicsResult<Self> {
        let count = particles.len();
        for index in [a, b] {
            if index >= count {
                return Err(PhysicsError::ParticleOutOfBounds { index, count });
            }
        }
        let rest_length = particles[a].pos.distance(particles[b].pos);
        Self::new(a, b, rest_length, stiffness)
    }

    pub fn a(&self) -> usize { self.a }
    pub fn b(&self) -> usize { self.b }
    pub fn rest_length(&self) -> V::Scalar { self.rest_length }
    pub fn stiffness(&self) -> V::Scalar { self.stiffness }

    pub fn touches(&self, index: usize) -> bool {
        self.a == index || self.b == index
    }

    /// Absolute difference between the live distance and the rest length.
    pub fn error(&self, particles: &[Particle<V>]) -> V::Scalar {
        (particles[self.a].pos.distance(particles[self.b].pos) - self.rest_length).abs()
    }

    /// One relaxation pass. Each free end moves half the stiffness-scaled
    /// correction along the connecting axis; pinned ends stay put.
    pub fn solve(&self, particles: &mut [Particle<V>]) {
        let (a_pinned, b_pinned) = (particles[self.a].pinned, particles[self.b].pinned);
        if a_pinned && b_pinned {
            return;
        }

        let delta = particles[self.b].pos - particles[self.a].pos;
        let dist = delta.length();
        if dist.is_near_zero(V::Scalar::from_f32(1e-10)) {
            return; // degenerate
        }

        let diff = (dist - self.rest_length) / dist;
        let correction = delta.scale(diff * self.stiffness * V::Scalar::half());

        if !a_pinned {
            particles[self.a].pos = particles[self.a].pos + correction;
        }
        if !b_pinned {
            particles[self.b].pos = particles[self.b].pos - correction;
        }
    }
}

/// Pulls one particle toward a fixed world position.
#[derive(Clone, Debug)]
pub struct PinConstraint<V: Vec> {
    pub particle: usize,
    pub position: V,
    stiffness: V::Scalar,
}

impl<V: Vec> PinConstraint<V> {
    pub fn new(particle: usize, position: V, stiffness: V::Scalar) -> PhysicsResult<Self> {
        let stiffness = validate_stiffness(stiffness)?;
        Ok(PinConstraint { particle, position, stiffness })
    }

    pub fn stiffness(&self) -> V::Scalar { self.stiffness }

    pub fn solve(&self, particles: &mut [Particle<V>]) {
        let p = &mut particles[self.particle];
        if p.pinned {
            return;
        }
        let correction = self.position - p.pos;
        p.pos = p.pos + correction.scale(self.stiffness);
    }
}

/// Axis-aligned container. Particles leaving it are clamped to the wall and
/// have the offending velocity component reflected, scaled by `restitution`.
#[derive(Clone, Debug)]
pub struct BoundsConstraint<V: Vec> {
    pub min: V,
    pub max: V,
    pub restitution: V::Scalar,
}

impl<V: Vec> BoundsConstraint<V> {
    pub fn new(min: V, max: V, restitution: V::Scalar) -> PhysicsResult<Self> {
        let restitution = validate_unit(restitution, "restitution")?;
        Ok(BoundsConstraint { min, max, restitution })
    }
}

/// Clamp one axis and reflect its implicit velocity.
fn reflect_axis<F: Float>(pos: &mut F, prev: &mut F, min: F, max: F, restitution: F) {
    let wall = if *pos < min {
        min
    } else if *pos > max {
        max
    } else {
        return;
    };
    *pos = wall;
    let vel = *pos - *prev;
    *prev = wall + vel * restitution;
}

impl<F: Float> BoundsConstraint<Vec2<F>> {
    pub fn solve_2d(&self, particles: &mut [Particle<Vec2<F>>]) {
        for p in particles.iter_mut().filter(|p| !p.pinned) {
            reflect_axis(&mut p.pos.x, &mut p.prev_pos.x, self.min.x, self.max.x, self.restitution);
            reflect_axis(&mut p.pos.y, &mut p.prev_pos.y, self.min.y, self.max.y, self.restitution);
        }
    }
}

impl<F: Float> BoundsConstraint<Vec3<F>> {
    pub fn solve_3d(&self, particles: &mut [Particle<Vec3<F>>]) {
        for p in particles.iter_mut().filter(|p| !p.pinned) {
            reflect_axis(&mut p.pos.x, &mut p.prev_pos.x, self.min.x, self.max.x, self.restitution);
            reflect_axis(&mut p.pos.y, &mut p.prev_pos.y, self.min.y, self.max.y, self.restitution);
            reflect_axis(&mut p.pos.z, &mut p.prev_pos.z, self.min.z, self.max.z, self.restitution);
        }
    }
}

impl<F: Float> ConstraintDispatch for Vec2<F> {
    fn dispatch_bounds(c: &BoundsConstraint<Self>, particles: &mut [Particle<Self>]) {
        c.solve_2d(particles);
    }
}

impl<F: Float> ConstraintDispatch for Vec3<F> {
    fn dispatch_bounds(c: &BoundsConstraint<Self>, particles: &mut [Particle<Self>]) {
        c.solve_3d(particles);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(a: Vec2<f32>, b: Vec2<f32>) -> [Particle<Vec2<f32>>; 2] {
        [Particle::new(a, 1.0), Particle::new(b, 1.0)]
    }

    #[test]
    fn stretched_pair_moves_symmetrically() {
        let mut particles = pair(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0));
        let c = DistanceConstraint::new(0, 1, 5.0, 1.0).unwrap();
        c.solve(&mut particles);
        // diff = 0.5, each end moves 10 * 0.5 * 0.5 = 2.5
        assert!((particles[0].pos.x - 2.5).abs() < 1e-6);
        assert!((particles[1].pos.x - 7.5).abs() < 1e-6);
    }

    #[test]
    fn pinned_end_does_not_move() {
        let mut particles = pair(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0));
        particles[0].pin();
        let c = DistanceConstraint::new(0, 1, 5.0, 1.0).unwrap();
        c.solve(&mut particles);
        assert_eq!(particles[0].pos, Vec2::new(0.0, 0.0));
        assert!((particles[1].pos.x - 7.5).abs() < 1e-6);
    }

    #[test]
    fn both_pinned_is_skipped() {
        let mut particles = pair(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0));
        particles[0].pin();
        particles[1].pin();
        DistanceConstraint::new(0, 1, 5.0, 1.0).unwrap().solve(&mut particles);
        assert_eq!(particles[1].pos, Vec2::new(10.0, 0.0));
    }

    #[test]
    fn coincident_particles_are_a_no_op() {
        let mut particles = pair(Vec2::new(3.0, 3.0), Vec2::new(3.0, 3.0));
        DistanceConstraint::new(0, 1, 1.0, 1.0).unwrap().solve(&mut particles);
        assert_eq!(particles[0].pos, Vec2::new(3.0, 3.0));
        assert!(particles[0].pos.is_finite());
    }

    #[test]
    fn rejects_self_constraint_and_bad_stiffness() {
        assert_eq!(
            DistanceConstraint::<Vec2<f32>>::new(2, 2, 1.0, 1.0).unwrap_err(),
            PhysicsError::SelfConstraint(2)
        );
        assert!(DistanceConstraint::<Vec2<f32>>::new(0, 1, 1.0, 0.0).is_err());
        let clamped = DistanceConstraint::<Vec2<f32>>::new(0, 1, 1.0, 3.0).unwrap();
        assert_eq!(clamped.stiffness(), 1.0);
    }

    #[test]
    fn bounds_reflect_velocity() {
        let mut particles = [Particle::new(Vec2::new(0.5f32, -1.0), 1.0)];
        particles[0].prev_pos = Vec2::new(0.5, 1.0);
        let bounds = BoundsConstraint::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0), 0.5).unwrap();
        bounds.solve_2d(&mut particles);
        assert_eq!(particles[0].pos.y, 0.0);
        // velocity into the wall is -1, reflected at half speed
        assert!((particles[0].prev_pos.y - -0.5).abs() < 1e-6);
    }
}
