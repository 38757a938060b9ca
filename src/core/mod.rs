//! Shared domain types, configuration, and capability seams.
//!
//! This module wires and re-exports:
//! - `engine`: the crate-wide error enum, the `VolatilityFilter` seam, and
//!   the shock-profile payload exchanged across it,
//! - `types`: the serializable optimizer configuration.
//!
//! It is intentionally a facade: domain logic lives in submodules, while this
//! file defines the public import surface (`opencvar::core::*`).

pub mod engine;
pub mod types;

pub use engine::{OptimizerError, ShockProfile, VolatilityFilter};
pub use types::OptimizerConfig;
