//! Numerical support for the optimizer: sample statistics, empirical
//! quantiles, return transforms, and a box-constrained Nelder-Mead simplex
//! search used by the volatility-model likelihood maximization.
//!
//! This module is a facade: kernels live in submodules, and downstream code
//! imports through `opencvar::math::*`.

pub mod optimizers;
pub mod stats;

pub use optimizers::{
    BoxConstraints, ConvergenceInfo, NelderMeadOptions, TerminationReason, nelder_mead,
};
pub use stats::{
    empirical_quantile, sample_mean, sample_std_dev, sample_variance, simple_returns,
};
