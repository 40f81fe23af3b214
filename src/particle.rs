//! Verlet particles with position-based dynamics.

use crate::config::DEFAULT_DAMPING;
use crate::float::Float;
use crate::vec::Vec;

/// A Verlet particle: position-based dynamics with implicit velocity.
///
/// No velocity is stored: `pos - prev_pos` is the velocity of the last step.
/// Pinned particles have zero inverse mass and are skipped by integration
/// and by every constraint.
#[derive(Clone, Debug)]
pub struct Particle<V: Vec> {
    pub pos: V,
    pub prev_pos: V,
    pub acceleration: V,
    pub mass: V::Scalar,
    pub inv_mass: V::Scalar,
    pub damping: V::Scalar,
    pub pinned: bool,
}

impl<V: Vec> Particle<V> {
    pub fn new(pos: V, mass: V::Scalar) -> Self {
        let inv_mass = if mass.is_near_zero(V::Scalar::from_f32(1e-10)) {
            V::Scalar::zero()
        } else {
            V::Scalar::one() / mass
        };
        Particle {
            pos,
            prev_pos: pos,
            acceleration: V::zero(),
            mass,
            inv_mass,
            damping: V::Scalar::from_f32(DEFAULT_DAMPING),
            pinned: false,
        }
    }

    pub fn pinned(pos: V) -> Self {
        Particle {
            pos,
            prev_pos: pos,
            acceleration: V::zero(),
            mass: V::Scalar::zero(),
            inv_mass: V::Scalar::zero(),
            damping: V::Scalar::from_f32(DEFAULT_DAMPING),
            pinned: true,
        }
    }

    /// Set the per-step retention applied to the implicit velocity.
    pub fn with_damping(mut self, damping: V::Scalar) -> Self {
        self.damping = damping;
        self
    }

    pub fn apply_force(&mut self, force: V) {
        if !self.pinned {
            self.acceleration = self.acceleration + force.scale(self.inv_mass);
        }
    }

    pub fn apply_acceleration(&mut self, accel: V) {
        if !self.pinned {
            self.acceleration = self.acceleration + accel;
        }
    }

    /// One Verlet step: `pos += (pos - prev) * damping + (acc + external) * dt²`.
    pub fn integrate(&mut self, dt: V::Scalar, external: V) {
        if self.pinned {
            return;
        }
        let velocity = (self.pos - self.prev_pos).scale(self.damping);
        let accel = self.acceleration + external;
        let new_pos = self.pos + velocity + accel.scale(dt * dt);
        self.prev_pos = self.pos;
        self.pos = new_pos;
        self.acceleration = V::zero();
    }

    pub fn velocity(&self, dt: V::Scalar) -> V {
        if dt.is_near_zero(V::Scalar::from_f32(1e-30)) {
            return V::zero();
        }
        (self.pos - self.prev_pos).scale(V::Scalar::one() / dt)
    }

    pub fn velocity_raw(&self) -> V {
        self.pos - self.prev_pos
    }

    pub fn pin(&mut self) {
        self.pinned = true;
        self.inv_mass = V::Scalar::zero();
        self.prev_pos = self.pos;
        self.acceleration = V::zero();
    }

    pub fn unpin(&mut self, mass: V::Scalar) {
        self.pinned = false;
        self.mass = mass;
        self.inv_mass = if mass.is_near_zero(V::Scalar::from_f32(1e-10)) {
            V::Scalar::zero()
        } else {
            V::Scalar::one() / mass
        };
    }

    /// Teleport a pinned particle (e.g. dragging a cloth corner). Free
    /// particles ignore this.
    pub fn move_to(&mut self, pos: V) {
        if self.pinned {
            self.prev_pos = pos;
            self.pos = pos;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vec::Vec2;

    #[test]
    fn damping_scales_implicit_velocity_only() {
        let mut p = Particle::new(Vec2::new(1.0f64, 0.0), 1.0).with_damping(0.5);
        p.prev_pos = Vec2::new(0.0, 0.0);
        p.integrate(1.0, Vec2::new(0.0, 2.0));
        assert!((p.pos.x - 1.5).abs() < 1e-12);
        assert!((p.pos.y - 2.0).abs() < 1e-12);
        assert_eq!(p.prev_pos, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn acceleration_is_consumed() {
        let mut p = Particle::new(Vec2::new(0.0f32, 0.0), 2.0);
        p.apply_force(Vec2::new(4.0, 0.0));
        assert_eq!(p.acceleration, Vec2::new(2.0, 0.0));
        p.integrate(0.1, Vec2::zero());
        assert_eq!(p.acceleration, Vec2::zero());
    }
}
