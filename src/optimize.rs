//! Orchestration of the optimization pipeline.
//!
//! fit volatility per asset -> align shocks -> resample scenarios ->
//! build the CVaR program -> solve -> validate realized risk.
//!
//! All entities are constructed fresh per call; nothing persists between
//! optimizations. The volatility filter and the LP backend are injected, so
//! any conforming implementations compose without touching this module.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::core::{OptimizerConfig, OptimizerError, ShockProfile, VolatilityFilter};
use crate::cvar::{ClarabelSolver, CvarLpBuilder, LpSolver};
use crate::market::ReturnPanel;
use crate::risk::realized_cvar;
use crate::scenario::{ScenarioGenerator, ShockPanel};
use crate::vol::Garch11Filter;

/// Solved allocation with model and validation diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizedPortfolio {
    /// Weight per asset identifier; excluded assets report exactly zero.
    pub weights: BTreeMap<String, f64>,
    /// Expected scenario return of the allocation (the objective value).
    pub expected_return: f64,
    /// Optimal VaR threshold `t` of the linearization.
    pub var_threshold: f64,
    /// Modeled CVaR at the optimum: `t + (1/((1-beta)J)) sum_j z_j`.
    pub model_cvar: f64,
    /// Realized-CVaR proxy on the original historical returns.
    pub realized_cvar: f64,
    /// Assets pinned to zero by the negative-historical-mean rule.
    pub excluded: Vec<String>,
}

/// End-to-end CVaR optimizer, generic over the volatility filter and the LP
/// backend.
#[derive(Debug, Clone)]
pub struct CvarOptimizer<V, S> {
    config: OptimizerConfig,
    filter: V,
    solver: S,
}

impl CvarOptimizer<Garch11Filter, ClarabelSolver> {
    /// Wires the default GARCH(1,1) filter and Clarabel backend.
    ///
    /// # Panics
    /// Panics when the configuration is out of its documented domain.
    pub fn from_config(config: OptimizerConfig) -> Self {
        config.validate();
        let filter = Garch11Filter::new(config.min_observations, config.fit_timeout);
        let solver = ClarabelSolver::new(200, config.solve_timeout);
        Self::new(config, filter, solver)
    }
}

impl<V: VolatilityFilter, S: LpSolver> CvarOptimizer<V, S> {
    /// # Panics
    /// Panics when the configuration is out of its documented domain.
    pub fn new(config: OptimizerConfig, filter: V, solver: S) -> Self {
        config.validate();
        Self {
            config,
            filter,
            solver,
        }
    }

    #[inline]
    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Runs the full pipeline on an aligned return panel.
    ///
    /// # Errors
    /// Propagates `InsufficientData`, `ModelFit`, `Infeasible`, and `Solver`
    /// unrecovered; no retries, no constraint relaxation.
    pub fn optimize(&self, panel: &ReturnPanel) -> Result<OptimizedPortfolio, OptimizerError> {
        let profiles = self.fit_profiles(panel)?;
        for (asset, profile) in panel.assets().iter().zip(&profiles) {
            debug!(
                asset = asset.as_str(),
                forecast = profile.volatility_forecast,
                shocks = profile.len(),
                "volatility fit complete"
            );
        }

        let shock_panel = ShockPanel::from_profiles(panel.n_assets(), &profiles)?;
        let generator =
            ScenarioGenerator::new(self.config.horizon_days, self.config.scenario_count);
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let scenarios = generator.generate(&shock_panel, &mut rng);
        info!(
            scenarios = scenarios.n_scenarios(),
            assets = scenarios.n_assets(),
            aligned_rows = shock_panel.n_rows(),
            horizon_days = self.config.horizon_days,
            "scenario matrix generated"
        );

        let means = panel.historical_means();
        let excluded_mask: Vec<bool> = if self.config.exclude_negative_mean {
            means.iter().map(|&m| m < 0.0).collect()
        } else {
            vec![false; panel.n_assets()]
        };
        let excluded: Vec<String> = panel
            .assets()
            .iter()
            .zip(&excluded_mask)
            .filter(|&(_, &e)| e)
            .map(|(a, _)| a.clone())
            .collect();
        if !excluded.is_empty() {
            info!(?excluded, "assets pinned to zero by negative-mean rule");
        }

        let builder = CvarLpBuilder::new(
            self.config.risk_level,
            self.config.confidence,
            self.config.cap,
            self.config.floor,
        );
        let mu = scenarios.mean_returns();
        let built = builder.build(&scenarios, &mu, &excluded_mask);

        let solution = self.solver.solve(&built.program)?;

        let var_threshold = solution.values[built.threshold_index()];
        let tail_weight =
            1.0 / ((1.0 - self.config.confidence) * built.n_scenarios() as f64);
        let shortfall_sum: f64 = (0..built.n_scenarios())
            .map(|j| solution.values[built.shortfall_index(j)])
            .sum();
        let model_cvar = var_threshold + tail_weight * shortfall_sum;

        let weight_values: Vec<f64> = (0..built.n_assets())
            .map(|i| {
                if excluded_mask[i] {
                    0.0
                } else {
                    solution.values[built.weight_index(i)]
                }
            })
            .collect();

        let realized = realized_cvar(panel, &weight_values, self.config.risk_level);
        info!(
            expected_return = solution.objective,
            model_cvar,
            realized_cvar = realized,
            "allocation solved"
        );

        let weights = panel
            .assets()
            .iter()
            .cloned()
            .zip(weight_values)
            .collect::<BTreeMap<_, _>>();

        Ok(OptimizedPortfolio {
            weights,
            expected_return: solution.objective,
            var_threshold,
            model_cvar,
            realized_cvar: realized,
            excluded,
        })
    }

    fn fit_profiles(&self, panel: &ReturnPanel) -> Result<Vec<ShockProfile>, OptimizerError> {
        let series: Vec<&[f64]> = (0..panel.n_assets()).map(|i| panel.series(i)).collect();

        #[cfg(feature = "parallel")]
        {
            let filter = &self.filter;
            series
                .par_iter()
                .map(|s| filter.fit(s))
                .collect::<Result<Vec<_>, _>>()
        }

        #[cfg(not(feature = "parallel"))]
        {
            series
                .iter()
                .map(|s| self.filter.fit(s))
                .collect::<Result<Vec<_>, _>>()
        }
    }
}

/// Convenience entry point: GARCH(1,1) filtering and the Clarabel backend.
///
/// # Errors
/// See [`CvarOptimizer::optimize`].
pub fn optimize_portfolio(
    panel: &ReturnPanel,
    config: &OptimizerConfig,
) -> Result<OptimizedPortfolio, OptimizerError> {
    CvarOptimizer::from_config(config.clone()).optimize(panel)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    /// Standardizes returns by their sample deviation; a cheap stand-in for
    /// the GARCH filter in orchestration tests.
    #[derive(Debug, Clone)]
    struct SampleVolFilter;

    impl VolatilityFilter for SampleVolFilter {
        fn fit(&self, returns: &[f64]) -> Result<ShockProfile, OptimizerError> {
            let std = crate::math::sample_std_dev(returns);
            if std <= 0.0 {
                return Err(OptimizerError::ModelFit("constant series".to_string()));
            }
            Ok(ShockProfile::new(
                std,
                returns.iter().map(|r| r / std).collect(),
            ))
        }
    }

    fn alternating_panel() -> ReturnPanel {
        let a: Vec<f64> = (0..120)
            .map(|i| if i % 2 == 0 { 0.01 } else { -0.01 })
            .collect();
        let b: Vec<f64> = (0..120)
            .map(|i| if i % 2 == 0 { 0.02 } else { -0.02 })
            .collect();
        ReturnPanel::from_returns(vec!["A".to_string(), "B".to_string()], vec![a, b])
    }

    fn test_config() -> OptimizerConfig {
        OptimizerConfig::default()
            .with_cap(0.6)
            .with_horizon(10.0, 200)
            .with_seed(42)
    }

    #[test]
    fn solved_weights_are_a_fully_invested_allocation() {
        let panel = alternating_panel();
        let optimizer = CvarOptimizer::new(test_config(), SampleVolFilter, ClarabelSolver::default());
        let portfolio = optimizer.optimize(&panel).unwrap();

        let total: f64 = portfolio.weights.values().sum();
        assert_relative_eq!(total, 1.0, epsilon = 1.0e-6);
        for &w in portfolio.weights.values() {
            assert!(w >= 1.0e-6 - 1.0e-7);
            assert!(w <= 0.6 + 1.0e-7);
        }
        assert!(portfolio.excluded.is_empty());
        assert!(portfolio.model_cvar <= 0.05 + 1.0e-6);
    }

    #[test]
    fn negative_mean_asset_reports_exact_zero() {
        let a: Vec<f64> = (0..120)
            .map(|i| if i % 2 == 0 { 0.011 } else { -0.01 })
            .collect();
        let b: Vec<f64> = (0..120)
            .map(|i| if i % 2 == 0 { 0.01 } else { -0.011 })
            .collect();
        let panel = ReturnPanel::from_returns(vec!["GOOD".to_string(), "BAD".to_string()], vec![
            a, b,
        ]);

        let config = test_config().with_cap(1.0);
        let optimizer = CvarOptimizer::new(config, SampleVolFilter, ClarabelSolver::default());
        let portfolio = optimizer.optimize(&panel).unwrap();

        assert_eq!(portfolio.weights["BAD"], 0.0);
        assert_eq!(portfolio.excluded, vec!["BAD".to_string()]);
        assert_relative_eq!(portfolio.weights["GOOD"], 1.0, epsilon = 1.0e-6);
    }

    #[test]
    fn exclusion_rule_can_be_disabled() {
        let a: Vec<f64> = (0..120)
            .map(|i| if i % 2 == 0 { 0.011 } else { -0.01 })
            .collect();
        let b: Vec<f64> = (0..120)
            .map(|i| if i % 2 == 0 { 0.01 } else { -0.011 })
            .collect();
        let panel = ReturnPanel::from_returns(vec!["GOOD".to_string(), "BAD".to_string()], vec![
            a, b,
        ]);

        let config = test_config().with_cap(0.6).with_exclude_negative_mean(false);
        let optimizer = CvarOptimizer::new(config, SampleVolFilter, ClarabelSolver::default());
        let portfolio = optimizer.optimize(&panel).unwrap();

        assert!(portfolio.excluded.is_empty());
        assert!(portfolio.weights["BAD"] > 0.0);
    }

    #[test]
    fn infeasible_cap_surfaces_as_infeasible() {
        let panel = ReturnPanel::from_returns(
            vec!["A".to_string(), "B".to_string(), "C".to_string()],
            vec![
                (0..100)
                    .map(|i| if i % 2 == 0 { 0.01 } else { -0.01 })
                    .collect(),
                (0..100)
                    .map(|i| if i % 2 == 0 { 0.02 } else { -0.02 })
                    .collect(),
                (0..100)
                    .map(|i| if i % 2 == 0 { 0.015 } else { -0.015 })
                    .collect(),
            ],
        );

        let config = OptimizerConfig::default()
            .with_cap(0.01)
            .with_floor(1.0e-6)
            .with_horizon(10.0, 100);
        let optimizer = CvarOptimizer::new(config, SampleVolFilter, ClarabelSolver::default());
        let err = optimizer.optimize(&panel).unwrap_err();
        assert!(matches!(err, OptimizerError::Infeasible(_)));
    }

    #[test]
    fn fixed_seed_reproduces_the_allocation() {
        let panel = alternating_panel();
        let optimizer = CvarOptimizer::new(test_config(), SampleVolFilter, ClarabelSolver::default());

        let first = optimizer.optimize(&panel).unwrap();
        let second = optimizer.optimize(&panel).unwrap();

        for (a, b) in first.weights.values().zip(second.weights.values()) {
            assert_relative_eq!(*a, *b, epsilon = 1.0e-12);
        }
        assert_relative_eq!(
            first.realized_cvar,
            second.realized_cvar,
            epsilon = 1.0e-12
        );
    }

}
