//! FABRIK inverse kinematics for planar joint chains.
//!
//! A chain is an ordered list of joints hanging off a fixed base. Bone `k`
//! runs from joint `k` to joint `k + 1`; its length is fixed when the chain
//! is built, and joint `k` limits the bone's angle relative to its parent
//! bone (or to the chain's base direction for the first bone).
//!
//! Solving never fails: an unreachable target stretches the chain straight
//! toward it, and running out of iterations leaves the closest pose any pass
//! produced.

use crate::error::{PhysicsError, PhysicsResult};
use crate::float::Float;
use crate::observer::StepObserver;
use crate::vec::{Vec, Vec2};
use alloc::vec::Vec as AllocVec;

/// Solver limits for one `solve` call.
#[derive(Clone, Debug)]
pub struct IkConfig<F: Float> {
    /// Backward/forward pass pairs before giving up. Default: 10.
    pub max_iterations: usize,
    /// End-effector distance that counts as reached. Default: 0.01.
    pub tolerance: F,
}

impl<F: Float> IkConfig<F> {
    pub fn new() -> Self {
        IkConfig {
            max_iterations: 10,
            tolerance: F::from_f32(0.01),
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_tolerance(mut self, tolerance: F) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Tolerance must be finite and non-negative.
    pub fn validate(&self) -> PhysicsResult<()> {
        if self.tolerance.is_finite() && self.tolerance >= F::zero() {
            Ok(())
        } else {
            Err(PhysicsError::InvalidParameter("tolerance"))
        }
    }
}

impl<F: Float> Default for IkConfig<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Length and angular limits of one bone.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IkSegment<F: Float> {
    pub length: F,
    pub angle_min: F,
    pub angle_max: F,
}

impl<F: Float> IkSegment<F> {
    /// A bone free to rotate through the full circle.
    pub fn new(length: F) -> Self {
        IkSegment { length, angle_min: -F::pi(), angle_max: F::pi() }
    }

    /// Restrict the bone to `[min, max]` radians relative to its parent.
    pub fn with_limits(mut self, min: F, max: F) -> Self {
        self.angle_min = min;
        self.angle_max = max;
        self
    }
}

/// One joint of a chain.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IkJoint<F: Float> {
    position: Vec2<F>,
    length: F,
    angle: F,
    angle_min: F,
    angle_max: F,
    fixed: bool,
}

impl<F: Float> IkJoint<F> {
    pub fn position(&self) -> Vec2<F> { self.position }
    /// Length of the bone to the next joint (zero for the end effector).
    pub fn length(&self) -> F { self.length }
    /// World angle of the outgoing bone, refreshed after every solve.
    pub fn angle(&self) -> F { self.angle }
    pub fn limits(&self) -> (F, F) { (self.angle_min, self.angle_max) }
    /// Only the root is fixed.
    pub fn is_fixed(&self) -> bool { self.fixed }
}

/// How a solve ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IkStatus {
    /// End effector within tolerance of the target.
    Reached,
    /// Iterations ran out; the pose is the best found.
    Approximate,
    /// Target beyond total reach; the chain points straight at it.
    Unreachable,
    /// Target was NaN or infinite; the pose is unchanged.
    InvalidTarget,
}

/// Outcome of a solve, for callers that care about convergence.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IkSolveReport<F: Float> {
    pub status: IkStatus,
    pub iterations: usize,
    /// End-effector distance to the target after solving.
    pub error: F,
}

/// A planar FABRIK chain.
#[derive(Clone, Debug)]
pub struct IkChain<F: Float> {
    joints: AllocVec<IkJoint<F>>,
    base: Vec2<F>,
    base_angle: F,
    total_length: F,
    best_pose: AllocVec<Vec2<F>>,
}

impl<F: Float> IkChain<F> {
    /// Build a chain rooted at `base`, laid out straight along +X.
    pub fn new(base: Vec2<F>, segments: &[IkSegment<F>]) -> PhysicsResult<Self> {
        if segments.is_empty() {
            return Err(PhysicsError::EmptyChain);
        }
        if !base.is_finite() {
            return Err(PhysicsError::InvalidParameter("base"));
        }

        let pi = F::pi();
        let mut joints = AllocVec::with_capacity(segments.len() + 1);
        let mut cursor = base;
        let mut total_length = F::zero();
        for (i, s) in segments.iter().enumerate() {
            if !s.length.is_finite() || s.length <= F::zero() {
                return Err(PhysicsError::InvalidSegmentLength(i));
            }
            let limits_ok = s.angle_min.is_finite()
                && s.angle_max.is_finite()
                && s.angle_min <= s.angle_max
                && s.angle_min >= -pi
                && s.angle_max <= pi;
            if !limits_ok {
                return Err(PhysicsError::InvalidAngleLimits(i));
            }
            joints.push(IkJoint {
                position: cursor,
                length: s.length,
                angle: F::zero(),
                angle_min: s.angle_min,
                angle_max: s.angle_max,
                fixed: i == 0,
            });
            cursor = cursor + Vec2::new(s.length, F::zero());
            total_length = total_length + s.length;
        }
        joints.push(IkJoint {
            position: cursor,
            length: F::zero(),
            angle: F::zero(),
            angle_min: -pi,
            angle_max: pi,
            fixed: false,
        });

        tracing::debug!(bones = segments.len(), reach = total_length.to_f64(), "ik chain created");
        Ok(IkChain { joints, base, base_angle: F::zero(), total_length, best_pose: AllocVec::new() })
    }

    /// Move the root. The rest of the chain follows on the next solve.
    pub fn set_base(&mut self, base: Vec2<F>) -> PhysicsResult<()> {
        if !base.is_finite() {
            return Err(PhysicsError::InvalidParameter("base"));
        }
        self.base = base;
        self.joints[0].position = base;
        Ok(())
    }

    /// Reference direction the first bone's limits are measured from.
    pub fn set_base_angle(&mut self, angle: F) -> PhysicsResult<()> {
        if !angle.is_finite() {
            return Err(PhysicsError::InvalidParameter("base_angle"));
        }
        self.base_angle = angle;
        Ok(())
    }

    pub fn base(&self) -> Vec2<F> { self.base }
    pub fn total_length(&self) -> F { self.total_length }
    pub fn joints(&self) -> &[IkJoint<F>] { &self.joints }
    pub fn bone_count(&self) -> usize { self.joints.len() - 1 }

    pub fn positions(&self) -> AllocVec<Vec2<F>> {
        self.joints.iter().map(|j| j.position).collect()
    }

    pub fn end_effector(&self) -> Vec2<F> {
        self.joints[self.joints.len() - 1].position
    }

    fn bone_angle(&self, k: usize) -> F {
        (self.joints[k + 1].position - self.joints[k].position).angle()
    }

    fn parent_angle(&self, k: usize) -> F {
        if k == 0 { self.base_angle } else { self.bone_angle(k - 1) }
    }

    /// Angle of bone `k` relative to its parent, in (-pi, pi].
    pub fn relative_angle(&self, k: usize) -> F {
        (self.bone_angle(k) - self.parent_angle(k)).wrap_angle()
    }

    /// Point `length` away from `from`, heading toward `toward`.
    fn place(from: Vec2<F>, toward: Vec2<F>, length: F, fallback_angle: F) -> Vec2<F> {
        let d = toward - from;
        let len = d.length();
        let dir = if len > F::from_f32(1e-12) {
            d.scale(F::one() / len)
        } else {
            Vec2::from_angle(fallback_angle)
        };
        from + dir.scale(length)
    }

    /// Clamp bone `k` against its parent after joint `k + 1` was placed.
    fn constrain_forward(&mut self, k: usize) {
        let parent = self.parent_angle(k);
        let rel = (self.bone_angle(k) - parent).wrap_angle();
        let joint = self.joints[k];
        let clamped = rel.clamp(joint.angle_min, joint.angle_max);
        if clamped != rel {
            self.joints[k + 1].position =
                joint.position + Vec2::from_angle(parent + clamped).scale(joint.length);
        }
    }

    /// Clamp child bone `k + 1` against bone `k` after joint `k` was placed,
    /// by swinging joint `k` around joint `k + 1`.
    fn constrain_backward(&mut self, k: usize) {
        let child = self.bone_angle(k + 1);
        let rel = (child - self.bone_angle(k)).wrap_angle();
        let limits = self.joints[k + 1];
        let clamped = rel.clamp(limits.angle_min, limits.angle_max);
        if clamped != rel {
            let heading = child - clamped;
            self.joints[k].position =
                limits.position - Vec2::from_angle(heading).scale(self.joints[k].length);
        }
    }

    fn backward_pass(&mut self, target: Vec2<F>) {
        let n = self.bone_count();
        self.joints[n].position = target;
        for k in (0..n).rev() {
            let fallback = self.base_angle + F::pi();
            self.joints[k].position = Self::place(
                self.joints[k + 1].position,
                self.joints[k].position,
                self.joints[k].length,
                fallback,
            );
            if k + 1 < n {
                self.constrain_backward(k);
            }
        }
    }

    fn forward_pass(&mut self) {
        self.joints[0].position = self.base;
        for k in 0..self.bone_count() {
            let fallback = self.parent_angle(k);
            self.joints[k + 1].position = Self::place(
                self.joints[k].position,
                self.joints[k + 1].position,
                self.joints[k].length,
                fallback,
            );
            self.constrain_forward(k);
        }
    }

    /// Fully extend the chain toward `target`, bone by bone.
    fn stretch_toward(&mut self, target: Vec2<F>) {
        self.joints[0].position = self.base;
        for k in 0..self.bone_count() {
            let fallback = self.parent_angle(k);
            self.joints[k + 1].position =
                Self::place(self.joints[k].position, target, self.joints[k].length, fallback);
            self.constrain_forward(k);
        }
    }

    /// True when every bone continues along its parent's direction.
    fn is_straight(&self) -> bool {
        let eps = F::from_f32(1e-4);
        (1..self.bone_count()).all(|k| self.relative_angle(k).abs() < eps)
    }

    /// End-effector offset from the base with bone 0 along +X and every
    /// later joint bent by `curl`, clamped to that joint's limits.
    fn curled_reach(&self, curl: F) -> Vec2<F> {
        let mut heading = F::zero();
        let mut end = Vec2::zero();
        for (k, joint) in self.joints[..self.bone_count()].iter().enumerate() {
            if k > 0 {
                heading = heading + curl.clamp(joint.angle_min, joint.angle_max);
            }
            end = end + Vec2::from_angle(heading).scale(joint.length);
        }
        end
    }

    /// Replace a straight pose with an even curl whose end lies at the
    /// target's distance, turned to face the target.
    ///
    /// Passes that start from a straight chain collinear with the target
    /// hand the same line back and forth and never bend it.
    fn curl_toward(&mut self, target: Vec2<F>) {
        let n = self.bone_count();
        if n < 2 {
            return;
        }
        let (room_ccw, room_cw) = self.joints[1..n]
            .iter()
            .fold((F::zero(), F::zero()), |(ccw, cw), j| (ccw + j.angle_max, cw - j.angle_min));
        let side = if room_ccw >= room_cw { F::one() } else { -F::one() };

        // Reach shrinks as the curl grows, up to a closed polygon at 2pi/n.
        let dist = self.base.distance(target);
        let mut lo = F::zero();
        let mut hi = F::two() * F::pi() / F::from_usize(n);
        for _ in 0..40 {
            let mid = (lo + hi) * F::half();
            if self.curled_reach(side * mid).length() > dist {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        let curl = side * (lo + hi) * F::half();

        let mut heading = (target - self.base).angle() - self.curled_reach(curl).angle();
        self.joints[0].position = self.base;
        for k in 0..n {
            let joint = self.joints[k];
            if k > 0 {
                heading = heading + curl.clamp(joint.angle_min, joint.angle_max);
            }
            self.joints[k + 1].position = joint.position + Vec2::from_angle(heading).scale(joint.length);
        }
        // Bone 0 may now break its limits against the base direction.
        self.forward_pass();
    }

    fn update_angles(&mut self) {
        let n = self.bone_count();
        for k in 0..n {
            self.joints[k].angle = self.bone_angle(k);
        }
        self.joints[n].angle = self.joints[n - 1].angle;
    }

    /// Move the end effector toward `target`.
    pub fn solve<O: StepObserver>(
        &mut self,
        target: Vec2<F>,
        config: &IkConfig<F>,
        observer: &mut O,
    ) -> IkSolveReport<F> {
        if !target.is_finite() {
            tracing::warn!("ik target is not finite; pose left unchanged");
            return IkSolveReport {
                status: IkStatus::InvalidTarget,
                iterations: 0,
                error: F::zero(),
            };
        }

        let report = if self.base.distance(target) > self.total_length {
            self.stretch_toward(target);
            IkSolveReport {
                status: IkStatus::Unreachable,
                iterations: 0,
                error: self.end_effector().distance(target),
            }
        } else {
            let mut iterations = 0;
            let mut error = self.end_effector().distance(target);
            if error > config.tolerance && self.is_straight() {
                self.curl_toward(target);
                error = self.end_effector().distance(target);
            }
            let mut best: Option<F> = None;
            while error > config.tolerance && iterations < config.max_iterations {
                self.backward_pass(target);
                self.forward_pass();
                observer.on_constraint_iteration(iterations);
                iterations += 1;
                error = self.end_effector().distance(target);
                if best.map_or(true, |b| error < b) {
                    best = Some(error);
                    self.best_pose.clear();
                    self.best_pose.extend(self.joints.iter().map(|j| j.position));
                }
            }
            // Tight limits can make later passes drift away from the target.
            if let Some(b) = best.filter(|&b| b < error) {
                for (joint, &pos) in self.joints.iter_mut().zip(self.best_pose.iter()) {
                    joint.position = pos;
                }
                error = b;
            }
            let status = if error <= config.tolerance { IkStatus::Reached } else { IkStatus::Approximate };
            IkSolveReport { status, iterations, error }
        };

        self.update_angles();
        tracing::trace!(status = ?report.status, iterations = report.iterations, error = report.error.to_f64(), "ik solved");
        observer.on_step_complete();
        report
    }
}
