//! Crate-wide error structures and the volatility-filter capability seam.

/// Errors surfaced by the optimization pipeline.
///
/// All four variants propagate to the caller unrecovered: the optimizer never
/// retries or silently relaxes constraints, so an infeasible request is a
/// visible failure rather than a degraded result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptimizerError {
    /// Too few observations for stable fitting or resampling.
    InsufficientData(String),
    /// The volatility model failed to converge or the input is degenerate.
    ModelFit(String),
    /// The linear program has no feasible region.
    Infeasible(String),
    /// Solver-internal failure or timeout.
    Solver(String),
}

impl std::fmt::Display for OptimizerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientData(msg) => write!(f, "insufficient data: {msg}"),
            Self::ModelFit(msg) => write!(f, "model fit failure: {msg}"),
            Self::Infeasible(msg) => write!(f, "infeasible program: {msg}"),
            Self::Solver(msg) => write!(f, "solver failure: {msg}"),
        }
    }
}

impl std::error::Error for OptimizerError {}

/// Per-asset output of a volatility filter.
///
/// `residuals` are the standardized innovations `eps_t / sigma_t` (mean ~ 0,
/// unit variance by construction of the model); `volatility_forecast` is the
/// one-step-ahead conditional volatility.
#[derive(Debug, Clone, PartialEq)]
pub struct ShockProfile {
    pub volatility_forecast: f64,
    pub residuals: Vec<f64>,
}

impl ShockProfile {
    pub fn new(volatility_forecast: f64, residuals: Vec<f64>) -> Self {
        assert!(
            volatility_forecast.is_finite() && volatility_forecast > 0.0,
            "volatility_forecast must be finite and > 0"
        );
        Self {
            volatility_forecast,
            residuals,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.residuals.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.residuals.is_empty()
    }
}

/// Volatility-model abstraction over a single asset's return series.
///
/// Implementations are pure functions of their input: fitting the same series
/// twice yields the same profile. Any conforming model (a different GARCH
/// variant, EWMA, a constant-volatility stub for tests) is swappable without
/// changing the pipeline.
pub trait VolatilityFilter: Send + Sync {
    /// Fits the model and extracts the shock profile.
    fn fit(&self, returns: &[f64]) -> Result<ShockProfile, OptimizerError>;
}
