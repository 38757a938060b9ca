//! Optimizer configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Parameters controlling the scenario model and the CVaR program.
///
/// Defaults match the reference setup: 5% risk budget at 95% confidence, a
/// 20% diversification cap, 2000 scenarios over a 10-day horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// CVaR budget `alpha` on the loss of the normalized portfolio.
    #[serde(default = "default_risk_level")]
    pub risk_level: f64,
    /// Tail confidence `beta` of the CVaR measure.
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    /// Diversification cap `gamma` in `(0, 1]`: maximum weight per asset.
    #[serde(default = "default_cap")]
    pub cap: f64,
    /// Small positive weight floor, guarding against degenerate zero weights.
    #[serde(default = "default_floor")]
    pub floor: f64,
    /// Projection horizon in trading days; scenarios scale by its square root.
    #[serde(default = "default_horizon_days")]
    pub horizon_days: f64,
    /// Number of resampled scenarios `J`.
    #[serde(default = "default_scenario_count")]
    pub scenario_count: usize,
    /// Seed for the scenario-resampling generator.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Minimum observations required per asset before fitting.
    #[serde(default = "default_min_observations")]
    pub min_observations: usize,
    /// Pin assets with negative historical mean return to zero weight.
    #[serde(default = "default_exclude_negative_mean")]
    pub exclude_negative_mean: bool,
    /// Optional wall-clock budget for each per-asset volatility fit.
    #[serde(default)]
    pub fit_timeout: Option<Duration>,
    /// Optional wall-clock budget for the LP solve.
    #[serde(default)]
    pub solve_timeout: Option<Duration>,
}

const fn default_risk_level() -> f64 {
    0.05
}

const fn default_confidence() -> f64 {
    0.95
}

const fn default_cap() -> f64 {
    0.2
}

const fn default_floor() -> f64 {
    1.0e-6
}

const fn default_horizon_days() -> f64 {
    10.0
}

const fn default_scenario_count() -> usize {
    2000
}

const fn default_seed() -> u64 {
    42
}

const fn default_min_observations() -> usize {
    50
}

const fn default_exclude_negative_mean() -> bool {
    true
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            risk_level: default_risk_level(),
            confidence: default_confidence(),
            cap: default_cap(),
            floor: default_floor(),
            horizon_days: default_horizon_days(),
            scenario_count: default_scenario_count(),
            seed: default_seed(),
            min_observations: default_min_observations(),
            exclude_negative_mean: default_exclude_negative_mean(),
            fit_timeout: None,
            solve_timeout: None,
        }
    }
}

impl OptimizerConfig {
    /// Sets the CVaR budget `alpha`.
    #[inline]
    pub fn with_risk_level(mut self, risk_level: f64) -> Self {
        self.risk_level = risk_level;
        self
    }

    /// Sets the tail confidence `beta`.
    #[inline]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    /// Sets the diversification cap `gamma`.
    #[inline]
    pub fn with_cap(mut self, cap: f64) -> Self {
        self.cap = cap;
        self
    }

    /// Sets the weight floor.
    #[inline]
    pub fn with_floor(mut self, floor: f64) -> Self {
        self.floor = floor;
        self
    }

    /// Sets horizon length and scenario count.
    #[inline]
    pub fn with_horizon(mut self, horizon_days: f64, scenario_count: usize) -> Self {
        self.horizon_days = horizon_days;
        self.scenario_count = scenario_count;
        self
    }

    /// Sets the resampling seed.
    #[inline]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Enables or disables the negative-historical-mean exclusion rule.
    #[inline]
    pub fn with_exclude_negative_mean(mut self, exclude: bool) -> Self {
        self.exclude_negative_mean = exclude;
        self
    }

    /// Sets the per-fit and solve wall-clock budgets.
    #[inline]
    pub fn with_timeouts(
        mut self,
        fit_timeout: Option<Duration>,
        solve_timeout: Option<Duration>,
    ) -> Self {
        self.fit_timeout = fit_timeout;
        self.solve_timeout = solve_timeout;
        self
    }

    /// Validates parameter ranges.
    ///
    /// # Panics
    /// Panics when a parameter is outside its documented domain. Invalid
    /// configuration is a caller bug, not a runtime condition.
    pub fn validate(&self) {
        assert!(
            self.risk_level.is_finite() && self.risk_level > 0.0 && self.risk_level < 1.0,
            "risk_level must be in (0,1)"
        );
        assert!(
            self.confidence.is_finite() && self.confidence > 0.0 && self.confidence < 1.0,
            "confidence must be in (0,1)"
        );
        assert!(
            self.cap.is_finite() && self.cap > 0.0 && self.cap <= 1.0,
            "cap must be in (0,1]"
        );
        assert!(
            self.floor.is_finite() && self.floor > 0.0 && self.floor <= self.cap,
            "floor must be in (0, cap]"
        );
        assert!(
            self.horizon_days.is_finite() && self.horizon_days > 0.0,
            "horizon_days must be finite and > 0"
        );
        assert!(self.scenario_count >= 1, "scenario_count must be >= 1");
        assert!(self.min_observations >= 2, "min_observations must be >= 2");
    }
}
