//! Error types for solver configuration.
//!
//! Every fallible constructor returns `PhysicsResult<T>`. Nothing raised here
//! happens mid-simulation: degenerate geometry, unreachable targets and
//! non-convergence are all handled in place by the solvers.

use thiserror::Error;

/// Errors raised while building a solver or its topology.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhysicsError {
    /// Mass must be positive and finite.
    #[error("mass must be positive and finite")]
    InvalidMass,
    /// Stiffness must be positive and finite (values above 1 are clamped).
    #[error("stiffness must be positive and finite")]
    InvalidStiffness,
    /// Damping must lie in [0, 1].
    #[error("damping must be in [0, 1]")]
    InvalidDamping,
    /// Smoothing radius must be positive and finite.
    #[error("smoothing radius must be positive and finite")]
    InvalidSmoothingRadius,
    /// A named scalar parameter is out of its valid range.
    #[error("invalid parameter `{0}`")]
    InvalidParameter(&'static str),
    /// Particle index is out of bounds.
    #[error("particle index {index} out of bounds (count: {count})")]
    ParticleOutOfBounds { index: usize, count: usize },
    /// A constraint references the same particle at both ends.
    #[error("constraint connects particle {0} to itself")]
    SelfConstraint(usize),
    /// Cloth grid cell is outside the grid.
    #[error("cell ({col}, {row}) outside {cols}x{rows} cloth")]
    CellOutOfBounds { col: usize, row: usize, cols: usize, rows: usize },
    /// Grid dimensions must be at least 2x2.
    #[error("cloth grid must be at least 2x2 (got {cols}x{rows})")]
    InvalidGridDimensions { cols: usize, rows: usize },
    /// Shape needs more segments than were requested.
    #[error("shape needs at least {min} segments (got {got})")]
    InsufficientSegments { min: usize, got: usize },
    /// IK chain has no segments.
    #[error("ik chain needs at least one segment")]
    EmptyChain,
    /// IK segment length must be positive and finite.
    #[error("segment {0} has a non-positive length")]
    InvalidSegmentLength(usize),
    /// Angle limits must satisfy min <= max within [-pi, pi].
    #[error("angle limits of joint {0} are invalid")]
    InvalidAngleLimits(usize),
    /// Boundary box has min >= max on some axis.
    #[error("bounds min must be below max on every axis")]
    InvalidBounds,
    /// Ragdoll part index is out of bounds.
    #[error("part index {index} out of bounds (count: {count})")]
    PartOutOfBounds { index: usize, count: usize },
    /// Ragdoll part extents must be positive.
    #[error("part extents must be positive and finite")]
    InvalidExtents,
}

/// Convenience alias for `Result<T, PhysicsError>`.
pub type PhysicsResult<T> = Result<T, PhysicsError>;
