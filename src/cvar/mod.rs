//! CVaR-constrained linear programming.
//!
//! This module wires and re-exports:
//! - `lp`: the solver-agnostic linear-program representation and the
//!   [`lp::LpSolver`] backend seam,
//! - `builder`: the Rockafellar-Uryasev construction of the CVaR program
//!   from a scenario matrix,
//! - `clarabel`: the shipped interior-point backend.

pub mod builder;
pub mod clarabel;
pub mod lp;

pub use builder::{CvarLpBuilder, CvarProgram};
pub use clarabel::ClarabelSolver;
pub use lp::{
    ConstraintOp, LinearConstraint, LinearProgram, LpSolution, LpSolver, Sense, VariableBounds,
};
