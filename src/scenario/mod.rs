//! Filtered historical simulation.
//!
//! Shocks are resampled jointly across assets: each scenario draws one
//! historical row of the aligned standardized-residual matrix, preserving
//! the cross-sectional dependence and tail shape of that day, and rescales
//! it by each asset's current volatility forecast and by the square root of
//! the projection horizon. Naive historical simulation would reuse stale
//! average volatility; decoupling the shock shape from the volatility scale
//! keeps scenarios responsive to the current regime.
//!
//! Randomness is injected through an explicit [`StdRng`], so a fixed seed
//! reproduces the scenario matrix bit for bit.
//!
//! References:
//! - Barone-Adesi, Giannopoulos, Vosper (1999), filtered historical
//!   simulation.

use nalgebra::DMatrix;
use rand::Rng;
use rand::rngs::StdRng;

use crate::core::{OptimizerError, ShockProfile};

/// Aligned standardized shocks and volatility forecasts for `N` assets.
///
/// The shock matrix has shape `T x N` with `T` the minimum residual length
/// across assets; longer series keep their trailing `T` observations so that
/// every row is a contemporaneous cross-section.
#[derive(Debug, Clone, PartialEq)]
pub struct ShockPanel {
    shocks: DMatrix<f64>,
    forecasts: Vec<f64>,
}

impl ShockPanel {
    /// Aligns per-asset shock profiles into a joint panel.
    ///
    /// # Errors
    /// - `InsufficientData` when `expected_assets` does not match the number
    ///   of profiles, or fewer than 2 aligned rows remain.
    pub fn from_profiles(
        expected_assets: usize,
        profiles: &[ShockProfile],
    ) -> Result<Self, OptimizerError> {
        if profiles.len() != expected_assets {
            return Err(OptimizerError::InsufficientData(format!(
                "expected {} shock profiles, got {}",
                expected_assets,
                profiles.len()
            )));
        }

        let t = profiles.iter().map(|p| p.len()).min().unwrap_or(0);
        if t < 2 {
            return Err(OptimizerError::InsufficientData(format!(
                "joint resampling needs at least 2 aligned shock rows, have {t}"
            )));
        }

        let n = profiles.len();
        let mut shocks = DMatrix::zeros(t, n);
        for (i, profile) in profiles.iter().enumerate() {
            let tail = &profile.residuals[profile.len() - t..];
            for (row, &z) in tail.iter().enumerate() {
                shocks[(row, i)] = z;
            }
        }

        Ok(Self {
            shocks,
            forecasts: profiles.iter().map(|p| p.volatility_forecast).collect(),
        })
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.shocks.nrows()
    }

    #[inline]
    pub fn n_assets(&self) -> usize {
        self.shocks.ncols()
    }

    #[inline]
    pub fn forecasts(&self) -> &[f64] {
        &self.forecasts
    }

    #[inline]
    pub fn shocks(&self) -> &DMatrix<f64> {
        &self.shocks
    }
}

/// Simulated joint asset returns, shape `J x N`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioMatrix {
    returns: DMatrix<f64>,
}

impl ScenarioMatrix {
    #[inline]
    pub fn n_scenarios(&self) -> usize {
        self.returns.nrows()
    }

    #[inline]
    pub fn n_assets(&self) -> usize {
        self.returns.ncols()
    }

    /// Simulated return of asset `i` in scenario `j`.
    #[inline]
    pub fn entry(&self, j: usize, i: usize) -> f64 {
        self.returns[(j, i)]
    }

    /// Column means: the expected scenario return per asset.
    pub fn mean_returns(&self) -> Vec<f64> {
        let j = self.n_scenarios() as f64;
        (0..self.n_assets())
            .map(|i| self.returns.column(i).iter().sum::<f64>() / j)
            .collect()
    }
}

/// Draws forward-looking scenarios from a shock panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScenarioGenerator {
    /// Projection horizon in trading days.
    pub horizon_days: f64,
    /// Number of scenarios `J` to draw.
    pub scenario_count: usize,
}

impl ScenarioGenerator {
    /// # Panics
    /// Panics when `horizon_days <= 0` or `scenario_count == 0`.
    pub fn new(horizon_days: f64, scenario_count: usize) -> Self {
        assert!(
            horizon_days.is_finite() && horizon_days > 0.0,
            "horizon_days must be finite and > 0"
        );
        assert!(scenario_count >= 1, "scenario_count must be >= 1");
        Self {
            horizon_days,
            scenario_count,
        }
    }

    /// Generates the `J x N` scenario matrix.
    ///
    /// Each scenario draws one historical row index uniformly with
    /// replacement, takes that row's full shock vector, scales column `i` by
    /// the asset's volatility forecast, and scales every entry by
    /// `sqrt(horizon_days)` (random-walk horizon projection).
    pub fn generate(&self, panel: &ShockPanel, rng: &mut StdRng) -> ScenarioMatrix {
        let t = panel.n_rows();
        let n = panel.n_assets();
        let horizon_scale = self.horizon_days.sqrt();

        let mut returns = DMatrix::zeros(self.scenario_count, n);
        for j in 0..self.scenario_count {
            let row = rng.random_range(0..t);
            for i in 0..n {
                returns[(j, i)] =
                    panel.shocks()[(row, i)] * panel.forecasts()[i] * horizon_scale;
            }
        }

        ScenarioMatrix { returns }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rand::SeedableRng;

    use super::*;

    /// Panel with recognizable rows: row `r` holds `[r, r + 100]`.
    fn tagged_panel(t: usize) -> ShockPanel {
        let profiles = vec![
            ShockProfile::new(1.0, (0..t).map(|r| r as f64).collect()),
            ShockProfile::new(1.0, (0..t).map(|r| r as f64 + 100.0).collect()),
        ];
        ShockPanel::from_profiles(2, &profiles).unwrap()
    }

    #[test]
    fn alignment_keeps_trailing_rows_of_longer_series() {
        let profiles = vec![
            ShockProfile::new(0.01, vec![1.0, 2.0, 3.0, 4.0, 5.0]),
            ShockProfile::new(0.02, vec![10.0, 20.0, 30.0]),
        ];
        let panel = ShockPanel::from_profiles(2, &profiles).unwrap();

        assert_eq!(panel.n_rows(), 3);
        assert_eq!(panel.n_assets(), 2);
        // Longer series dropped its two oldest observations.
        assert_relative_eq!(panel.shocks()[(0, 0)], 3.0, epsilon = 1.0e-12);
        assert_relative_eq!(panel.shocks()[(0, 1)], 10.0, epsilon = 1.0e-12);
        assert_relative_eq!(panel.shocks()[(2, 0)], 5.0, epsilon = 1.0e-12);
    }

    #[test]
    fn mismatched_profile_count_is_insufficient_data() {
        let profiles = vec![ShockProfile::new(0.01, vec![1.0, 2.0])];
        let err = ShockPanel::from_profiles(2, &profiles).unwrap_err();
        assert!(matches!(err, OptimizerError::InsufficientData(_)));
    }

    #[test]
    fn single_row_panel_is_insufficient_data() {
        let profiles = vec![
            ShockProfile::new(0.01, vec![1.0]),
            ShockProfile::new(0.02, vec![2.0, 3.0]),
        ];
        let err = ShockPanel::from_profiles(2, &profiles).unwrap_err();
        assert!(matches!(err, OptimizerError::InsufficientData(_)));
    }

    #[test]
    fn scenario_rows_come_from_exactly_one_historical_row() {
        let panel = tagged_panel(50);
        let mut rng = StdRng::seed_from_u64(1);
        let scenarios = ScenarioGenerator::new(1.0, 200).generate(&panel, &mut rng);

        for j in 0..scenarios.n_scenarios() {
            let a = scenarios.entry(j, 0);
            let b = scenarios.entry(j, 1);
            // Both entries must carry the same row tag: no cross-row mixing.
            assert_relative_eq!(b - a, 100.0, epsilon = 1.0e-12);
            assert!(a >= 0.0 && a < 50.0);
            assert_relative_eq!(a, a.round(), epsilon = 1.0e-12);
        }
    }

    #[test]
    fn scaling_is_per_asset_and_sqrt_in_horizon() {
        let profiles = vec![
            ShockProfile::new(0.01, vec![1.0, 1.0]),
            ShockProfile::new(0.03, vec![1.0, 1.0]),
        ];
        let panel = ShockPanel::from_profiles(2, &profiles).unwrap();

        let mut rng = StdRng::seed_from_u64(9);
        let one_day = ScenarioGenerator::new(1.0, 8).generate(&panel, &mut rng);
        let mut rng = StdRng::seed_from_u64(9);
        let four_day = ScenarioGenerator::new(4.0, 8).generate(&panel, &mut rng);

        for j in 0..8 {
            assert_relative_eq!(one_day.entry(j, 0), 0.01, epsilon = 1.0e-12);
            assert_relative_eq!(one_day.entry(j, 1), 0.03, epsilon = 1.0e-12);
            // Quadrupling the horizon doubles the scale: sqrt, not linear.
            assert_relative_eq!(
                four_day.entry(j, 0),
                2.0 * one_day.entry(j, 0),
                epsilon = 1.0e-12
            );
            assert_relative_eq!(
                four_day.entry(j, 1),
                2.0 * one_day.entry(j, 1),
                epsilon = 1.0e-12
            );
        }
    }

    #[test]
    fn fixed_seed_reproduces_the_scenario_matrix() {
        let panel = tagged_panel(30);
        let generator = ScenarioGenerator::new(10.0, 100);

        let mut rng = StdRng::seed_from_u64(42);
        let a = generator.generate(&panel, &mut rng);
        let mut rng = StdRng::seed_from_u64(42);
        let b = generator.generate(&panel, &mut rng);

        assert_eq!(a, b);
    }

    #[test]
    fn mean_returns_are_column_means() {
        let profiles = vec![
            ShockProfile::new(1.0, vec![1.0, 3.0]),
            ShockProfile::new(1.0, vec![2.0, 2.0]),
        ];
        let panel = ShockPanel::from_profiles(2, &profiles).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let scenarios = ScenarioGenerator::new(1.0, 500).generate(&panel, &mut rng);

        let mu = scenarios.mean_returns();
        // Resampling rows of {1,3} averages near 2; the second column is
        // constant at 2.
        assert!((mu[0] - 2.0).abs() < 0.2);
        assert_relative_eq!(mu[1], 2.0, epsilon = 1.0e-12);
    }
}
