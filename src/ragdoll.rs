//! Planar ragdoll: rigid boxes joined by anchor-and-angle constraints.
//!
//! Parts integrate with explicit Euler (they carry real velocities, unlike
//! the Verlet particles) and collide with a horizontal ground line. Joints are
//! relaxed the same way distance constraints are: a fixed number of passes,
//! each pulling anchor points together and clamping relative angles. Y is up.

use crate::config::{validate_mass, validate_stiffness, validate_unit, DEFAULT_ITERATIONS};
use crate::error::{PhysicsError, PhysicsResult};
use crate::float::Float;
use crate::observer::StepObserver;
use crate::vec::{Vec, Vec2};
use alloc::vec::Vec as AllocVec;

#[derive(Clone, Debug)]
pub struct RagdollConfig<F: Float> {
    pub gravity: Vec2<F>,
    /// Height of the ground line.
    pub ground_y: F,
    /// Joint relaxation passes per step. Default: 5.
    pub iterations: usize,
}

impl<F: Float> RagdollConfig<F> {
    pub fn new() -> Self {
        RagdollConfig {
            gravity: Vec2::new(F::zero(), F::from_f32(-9.81)),
            ground_y: F::zero(),
            iterations: DEFAULT_ITERATIONS,
        }
    }

    pub fn with_gravity(mut self, gravity: Vec2<F>) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_ground(mut self, ground_y: F) -> Self {
        self.ground_y = ground_y;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn validate(&self) -> PhysicsResult<()> {
        if !self.gravity.is_finite() {
            return Err(PhysicsError::InvalidParameter("gravity"));
        }
        if !self.ground_y.is_finite() {
            return Err(PhysicsError::InvalidParameter("ground_y"));
        }
        Ok(())
    }
}

impl<F: Float> Default for RagdollConfig<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// A rigid box. `half_extents` are measured in the part's local frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RagdollPart<F: Float> {
    pub position: Vec2<F>,
    pub velocity: Vec2<F>,
    pub angle: F,
    pub angular_velocity: F,
    mass: F,
    inv_mass: F,
    pub half_extents: Vec2<F>,
    /// Fraction of downward speed returned on ground contact.
    pub restitution: F,
    /// Fraction of sliding and spin removed per step of ground contact.
    pub friction: F,
    anchored: bool,
}

impl<F: Float> RagdollPart<F> {
    pub fn new(position: Vec2<F>, half_extents: Vec2<F>, mass: F) -> Self {
        RagdollPart {
            position,
            velocity: Vec2::zero(),
            angle: F::zero(),
            angular_velocity: F::zero(),
            mass,
            inv_mass: if mass > F::zero() { F::one() / mass } else { F::zero() },
            half_extents,
            restitution: F::from_f32(0.2),
            friction: F::from_f32(0.4),
            anchored: false,
        }
    }

    pub fn with_restitution(mut self, restitution: F) -> Self {
        self.restitution = restitution;
        self
    }

    pub fn with_friction(mut self, friction: F) -> Self {
        self.friction = friction;
        self
    }

    pub fn with_angle(mut self, angle: F) -> Self {
        self.angle = angle;
        self
    }

    /// Anchored parts never move; joints treat them as infinitely heavy.
    pub fn anchored(mut self) -> Self {
        self.anchored = true;
        self.inv_mass = F::zero();
        self
    }

    pub fn mass(&self) -> F { self.mass }
    pub fn inv_mass(&self) -> F { self.inv_mass }
    pub fn is_anchored(&self) -> bool { self.anchored }

    /// Half of the box's vertical span at its current angle.
    pub fn vertical_extent(&self) -> F {
        (self.half_extents.x * self.angle.sin()).abs() + (self.half_extents.y * self.angle.cos()).abs()
    }

    /// Lowest y the rotated box reaches.
    pub fn lower_extent(&self) -> F {
        self.position.y - self.vertical_extent()
    }

    /// World position of a point given in this part's local frame.
    pub fn world_point(&self, local: Vec2<F>) -> Vec2<F> {
        self.position + local.rotate(self.angle)
    }

    fn project_above(&mut self, ground_y: F) -> bool {
        let penetration = ground_y - self.lower_extent();
        if penetration > F::zero() {
            self.position.y = self.position.y + penetration;
            true
        } else {
            false
        }
    }
}

/// Connects two parts at local anchor points and limits their relative angle
/// (`angle_b - angle_a`) to `[angle_min, angle_max]`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RagdollJoint<F: Float> {
    pub part_a: usize,
    pub part_b: usize,
    pub anchor_a: Vec2<F>,
    pub anchor_b: Vec2<F>,
    pub angle_min: F,
    pub angle_max: F,
    pub stiffness: F,
}

impl<F: Float> RagdollJoint<F> {
    pub fn new(part_a: usize, part_b: usize, anchor_a: Vec2<F>, anchor_b: Vec2<F>) -> Self {
        RagdollJoint {
            part_a,
            part_b,
            anchor_a,
            anchor_b,
            angle_min: -F::pi(),
            angle_max: F::pi(),
            stiffness: F::one(),
        }
    }

    pub fn with_limits(mut self, min: F, max: F) -> Self {
        self.angle_min = min;
        self.angle_max = max;
        self
    }

    pub fn with_stiffness(mut self, stiffness: F) -> Self {
        self.stiffness = stiffness;
        self
    }
}

/// Part order of [`Ragdoll::humanoid`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HumanoidPart {
    Torso,
    Head,
    UpperArmLeft,
    LowerArmLeft,
    UpperArmRight,
    LowerArmRight,
    ThighLeft,
    ShinLeft,
    ThighRight,
    ShinRight,
}

impl HumanoidPart {
    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Debug)]
pub struct Ragdoll<F: Float> {
    parts: AllocVec<RagdollPart<F>>,
    joints: AllocVec<RagdollJoint<F>>,
    config: RagdollConfig<F>,
    snapshot: AllocVec<(Vec2<F>, F)>,
}

impl<F: Float> Ragdoll<F> {
    pub fn new(config: RagdollConfig<F>) -> PhysicsResult<Self> {
        config.validate()?;
        Ok(Ragdoll {
            parts: AllocVec::new(),
            joints: AllocVec::new(),
            config,
            snapshot: AllocVec::new(),
        })
    }

    /// Ten-part humanoid standing with its torso centered on `origin`.
    pub fn humanoid(origin: Vec2<F>, config: RagdollConfig<F>) -> PhysicsResult<Self> {
        let f = F::from_f32;
        let v = |x: f32, y: f32| Vec2::new(f(x), f(y));
        let mut doll = Self::new(config)?;

        let torso = doll.add_part(RagdollPart::new(origin, v(0.15, 0.3), f(10.0)))?;
        let head = doll.add_part(RagdollPart::new(origin + v(0.0, 0.45), v(0.1, 0.1), f(3.0)))?;
        doll.add_joint(RagdollJoint::new(torso, head, v(0.0, 0.3), v(0.0, -0.15)).with_limits(f(-0.6), f(0.6)))?;

        for side in [-1.0f32, 1.0] {
            let shoulder = v(side * 0.22, 0.28);
            let upper = doll.add_part(RagdollPart::new(origin + shoulder + v(0.0, -0.15), v(0.05, 0.15), f(2.0)))?;
            let lower = doll.add_part(RagdollPart::new(origin + shoulder + v(0.0, -0.45), v(0.04, 0.15), f(1.5)))?;
            doll.add_joint(RagdollJoint::new(torso, upper, shoulder, v(0.0, 0.15)).with_limits(f(-3.0), f(3.0)))?;
            let (lo, hi) = if side < 0.0 { (f(-2.4), F::zero()) } else { (F::zero(), f(2.4)) };
            doll.add_joint(RagdollJoint::new(upper, lower, v(0.0, -0.15), v(0.0, 0.15)).with_limits(lo, hi))?;
        }

        for side in [-1.0f32, 1.0] {
            let hip = v(side * 0.1, -0.3);
            let thigh = doll.add_part(RagdollPart::new(origin + hip + v(0.0, -0.2), v(0.07, 0.2), f(5.0)))?;
            let shin = doll.add_part(RagdollPart::new(origin + hip + v(0.0, -0.6), v(0.06, 0.2), f(4.0)))?;
            doll.add_joint(RagdollJoint::new(torso, thigh, hip, v(0.0, 0.2)).with_limits(f(-1.5), f(1.5)))?;
            doll.add_joint(RagdollJoint::new(thigh, shin, v(0.0, -0.2), v(0.0, 0.2)).with_limits(f(-2.4), F::zero()))?;
        }

        tracing::debug!(parts = doll.parts.len(), joints = doll.joints.len(), "humanoid ragdoll created");
        Ok(doll)
    }

    pub fn add_part(&mut self, part: RagdollPart<F>) -> PhysicsResult<usize> {
        validate_mass(part.mass)?;
        if !part.position.is_finite() || !part.angle.is_finite() {
            return Err(PhysicsError::InvalidParameter("position"));
        }
        let e = part.half_extents;
        if !e.is_finite() || e.x <= F::zero() || e.y <= F::zero() {
            return Err(PhysicsError::InvalidExtents);
        }
        validate_unit(part.restitution, "restitution")?;
        validate_unit(part.friction, "friction")?;
        self.parts.push(part);
        Ok(self.parts.len() - 1)
    }

    pub fn add_joint(&mut self, joint: RagdollJoint<F>) -> PhysicsResult<usize> {
        let count = self.parts.len();
        for index in [joint.part_a, joint.part_b] {
            if index >= count {
                return Err(PhysicsError::PartOutOfBounds { index, count });
            }
        }
        if joint.part_a == joint.part_b {
            return Err(PhysicsError::SelfConstraint(joint.part_a));
        }
        let limits_ok = joint.angle_min.is_finite()
            && joint.angle_max.is_finite()
            && joint.angle_min <= joint.angle_max
            && joint.angle_min >= -F::pi()
            && joint.angle_max <= F::pi();
        if !limits_ok || !joint.anchor_a.is_finite() || !joint.anchor_b.is_finite() {
            return Err(PhysicsError::InvalidAngleLimits(self.joints.len()));
        }
        let stiffness = validate_stiffness(joint.stiffness)?;
        self.joints.push(RagdollJoint { stiffness, ..joint });
        Ok(self.joints.len() - 1)
    }

    pub fn parts(&self) -> &[RagdollPart<F>] { &self.parts }
    pub fn joints(&self) -> &[RagdollJoint<F>] { &self.joints }
    pub fn config(&self) -> &RagdollConfig<F> { &self.config }

    pub fn part(&self, index: usize) -> Option<&RagdollPart<F>> {
        self.parts.get(index)
    }

    /// Instant velocity change of `impulse / mass`. No-op on anchored parts.
    pub fn apply_impulse(&mut self, index: usize, impulse: Vec2<F>) {
        if let Some(p) = self.parts.get_mut(index) {
            if !p.anchored {
                p.velocity = p.velocity + impulse.scale(p.inv_mass);
            }
        }
    }

    /// Distance between the two anchor points of joint `index`.
    pub fn joint_error(&self, index: usize) -> F {
        let j = &self.joints[index];
        let a = self.parts[j.part_a].world_point(j.anchor_a);
        let b = self.parts[j.part_b].world_point(j.anchor_b);
        a.distance(b)
    }

    pub fn max_joint_error(&self) -> F {
        (0..self.joints.len()).fold(F::zero(), |acc, i| acc.max(self.joint_error(i)))
    }

    fn integrate(&mut self, dt: F, acceleration: Vec2<F>) {
        for p in self.parts.iter_mut().filter(|p| !p.anchored) {
            p.velocity = p.velocity + acceleration.scale(dt);
            p.position = p.position + p.velocity.scale(dt);
            p.angle = p.angle + p.angular_velocity * dt;
        }
    }

    fn collide_ground(&mut self) {
        let ground = self.config.ground_y;
        for p in self.parts.iter_mut().filter(|p| !p.anchored) {
            if p.lower_extent() < ground {
                p.project_above(ground);
                if p.velocity.y < F::zero() {
                    p.velocity.y = -p.velocity.y * p.restitution;
                }
                let keep = F::one() - p.friction;
                p.velocity.x = p.velocity.x * keep;
                p.angular_velocity = p.angular_velocity * keep;
            }
        }
    }

    fn project_ground(&mut self) {
        let ground = self.config.ground_y;
        for p in self.parts.iter_mut().filter(|p| !p.anchored) {
            p.project_above(ground);
        }
    }

    fn solve_joint(&mut self, joint: RagdollJoint<F>) {
        let a = self.parts[joint.part_a];
        let b = self.parts[joint.part_b];

        let w = a.inv_mass + b.inv_mass;
        if w > F::zero() {
            let delta = b.world_point(joint.anchor_b) - a.world_point(joint.anchor_a);
            let correction = delta.scale(joint.stiffness / w);
            let pa = &mut self.parts[joint.part_a];
            pa.position = pa.position + correction.scale(a.inv_mass);
            let pb = &mut self.parts[joint.part_b];
            pb.position = pb.position - correction.scale(b.inv_mass);
        }

        let rel = (b.angle - a.angle).wrap_angle();
        let fix = rel.clamp(joint.angle_min, joint.angle_max) - rel;
        if fix != F::zero() {
            match (a.anchored, b.anchored) {
                (true, true) => {}
                (true, false) => self.parts[joint.part_b].angle = b.angle + fix,
                (false, true) => self.parts[joint.part_a].angle = a.angle - fix,
                (false, false) => {
                    let half = fix * F::half();
                    self.parts[joint.part_a].angle = a.angle - half;
                    self.parts[joint.part_b].angle = b.angle + half;
                }
            }
        }
    }

    /// Advance by `dt` with `external` acceleration on top of gravity.
    ///
    /// Position changes made by the joint passes are fed back into the
    /// velocities, and every part ends the step at or above the ground.
    pub fn step<O: StepObserver>(&mut self, dt: F, external: Vec2<F>, observer: &mut O) {
        if !dt.is_finite() || dt <= F::zero() {
            tracing::warn!(dt = dt.to_f64(), "ragdoll step ignored: timestep must be positive");
            return;
        }

        self.integrate(dt, self.config.gravity + external);
        observer.on_integrate();
        self.collide_ground();

        self.snapshot.clear();
        self.snapshot.extend(self.parts.iter().map(|p| (p.position, p.angle)));

        for iteration in 0..self.config.iterations {
            for j in 0..self.joints.len() {
                let joint = self.joints[j];
                self.solve_joint(joint);
            }
            self.project_ground();
            observer.on_constraint_iteration(iteration);
        }

        let inv_dt = F::one() / dt;
        for (p, &(pos, angle)) in self.parts.iter_mut().zip(self.snapshot.iter()) {
            if p.anchored {
                continue;
            }
            p.velocity = p.velocity + (p.position - pos).scale(inv_dt);
            p.angular_velocity = p.angular_velocity + (p.angle - angle) * inv_dt;
        }
        self.project_ground();
        observer.on_step_complete();
    }
}
