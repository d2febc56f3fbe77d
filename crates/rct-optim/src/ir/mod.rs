//! Backend-independent intermediate representation of optimization problems.
//!
//! Problem builders describe parameter blocks and residual blocks here; the
//! backend compiles the IR into a solver graph. Blocks are referenced by name
//! in the initial-value and solution maps.

mod types;

pub use types::{
    FactorKind, FixedMask, ParamBlock, ParamId, ProblemIR, ResidualBlock, RobustLoss, POSE_DIM,
};
