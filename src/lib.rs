//! OpenCVaR computes risk-budgeted portfolio allocations: expected return is
//! maximized subject to a Conditional Value-at-Risk constraint over
//! scenario-based losses built by filtered historical simulation.
//!
//! The pipeline has three stages:
//! - per-asset GARCH(1,1) filtering separates the shape of historical shocks
//!   from the current volatility regime,
//! - joint resampling of standardized shock rows preserves cross-asset
//!   dependence while rescaling to forecasted volatility and the projection
//!   horizon,
//! - a linear program with the exact Rockafellar-Uryasev CVaR linearization
//!   maximizes expected scenario return under a budget constraint, per-asset
//!   caps and floors, and the CVaR budget.
//!
//! The volatility filter and the LP backend are injected capabilities:
//! swap in any conforming implementation through
//! [`core::VolatilityFilter`] and [`cvar::LpSolver`] without changing the
//! pipeline.
//!
//! References used across modules:
//! - Rockafellar and Uryasev (2000), optimization of conditional
//!   value-at-risk.
//! - Barone-Adesi, Giannopoulos, Vosper (1999), filtered historical
//!   simulation.
//! - Bollerslev (1986), GARCH.
//! - McNeil, Frey, Embrechts, *Quantitative Risk Management* (2005/2015).
//!
//! Numerical considerations:
//! - scenario generation consumes an explicitly seeded generator, so a fixed
//!   seed reproduces allocations bit for bit;
//! - the shipped backend is interior-point, so constraints hold to solver
//!   tolerance rather than exactly;
//! - infeasible requests (a cap too small for the asset count, a risk budget
//!   tighter than the scenario tails allow) surface as
//!   [`core::OptimizerError::Infeasible`], never as a silently degraded
//!   allocation.
//!
//! # Feature Flags
//! - `parallel`: fits per-asset volatility models on a Rayon pool.
//!
//! # Quick Start
//! ```rust
//! use opencvar::core::OptimizerConfig;
//! use opencvar::market::ReturnPanel;
//! use opencvar::optimize::optimize_portfolio;
//!
//! // Two synthetic assets with alternating daily returns.
//! let a: Vec<f64> = (0..120).map(|i| if i % 2 == 0 { 0.01 } else { -0.01 }).collect();
//! let b: Vec<f64> = (0..120).map(|i| if i % 2 == 0 { 0.02 } else { -0.02 }).collect();
//! let panel = ReturnPanel::from_returns(vec!["A".into(), "B".into()], vec![a, b]);
//!
//! let config = OptimizerConfig::default()
//!     .with_cap(0.6)
//!     .with_horizon(10.0, 200)
//!     .with_seed(42);
//!
//! let portfolio = optimize_portfolio(&panel, &config).unwrap();
//! let total: f64 = portfolio.weights.values().sum();
//! assert!((total - 1.0).abs() < 1.0e-6);
//! assert!(portfolio.model_cvar <= config.risk_level + 1.0e-6);
//! ```

pub mod core;
pub mod cvar;
pub mod market;
pub mod math;
pub mod optimize;
pub mod risk;
pub mod scenario;
pub mod vol;

/// Common imports for ergonomic usage.
pub mod prelude {
    pub use crate::core::{OptimizerConfig, OptimizerError, ShockProfile, VolatilityFilter};
    pub use crate::cvar::{ClarabelSolver, CvarLpBuilder, LinearProgram, LpSolver};
    pub use crate::market::{PricePanel, ReturnPanel, ReturnsSource};
    pub use crate::optimize::{CvarOptimizer, OptimizedPortfolio, optimize_portfolio};
    pub use crate::scenario::{ScenarioGenerator, ScenarioMatrix, ShockPanel};
    pub use crate::vol::Garch11Filter;
}
