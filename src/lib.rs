//! Constraint-based physics and inverse kinematics for procedural game assets.
//!
//! `kinema` advances small simulations one frame at a time and exposes the
//! solved positions for an external renderer. Every solver owns its state and
//! is driven by a per-frame `step` call.
//!
//! # Features
//!
//! - **Verlet substrate**: particles with implicit velocity, distance/pin/bounds
//!   constraints relaxed for a fixed number of passes
//! - **Cloth**: rectangular grids with structural, shear and bend links, pinning and tearing
//! - **Soft bodies**: arbitrary edge topologies plus circle, rectangle and icosphere builders
//! - **Fluids**: 2D SPH with Müller kernels and an optional uniform-grid neighbor search
//! - **IK**: FABRIK chains with per-joint angle limits and a convergence report
//! - **Ragdolls**: rigid boxes joined by anchor and angle constraints, with ground contact
//! - **Observable**: monitor steps via the `StepObserver` trait
//! - **`no_std` compatible**: needs only `alloc`

#![no_std]

extern crate alloc;

pub mod float;
pub mod vec;
pub mod particle;
pub mod constraint;
pub mod solver;
pub mod cloth;
pub mod softbody;
pub mod kernel;
pub mod neighbor;
pub mod fluid;
pub mod ik;
pub mod ragdoll;
pub mod observer;
pub mod config;
pub mod error;

// Re-export primary API
pub use float::Float;
pub use vec::{Vec, Vec2, Vec3};
pub use particle::Particle;
pub use constraint::{BoundsConstraint, Constraint, ConstraintDispatch, DistanceConstraint, PinConstraint};
pub use solver::ConstraintSolver;
pub use cloth::{Cloth, ClothConfig, ClothLink};
pub use softbody::{SoftBody, SoftBodyConfig};
pub use kernel::SphKernels;
pub use neighbor::{NeighborGrid, NeighborSearch};
pub use fluid::{Fluid, FluidConfig, FluidParticle};
pub use ik::{IkChain, IkConfig, IkJoint, IkSegment, IkSolveReport, IkStatus};
pub use ragdoll::{HumanoidPart, Ragdoll, RagdollConfig, RagdollJoint, RagdollPart};
pub use config::SolverConfig;
pub use observer::{NoOpStepObserver, StepObserver, TracingStepObserver};
pub use error::{PhysicsError, PhysicsResult};
