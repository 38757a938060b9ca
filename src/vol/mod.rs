//! Conditional-volatility models used as shock extractors.
//!
//! The shipped model is GARCH(1,1) fitted by Gaussian quasi-maximum
//! likelihood; any other filter can be plugged in through
//! [`crate::core::VolatilityFilter`].

pub mod garch;

pub use garch::{Garch11Filter, Garch11Fit, Garch11Params, fit_garch11};
