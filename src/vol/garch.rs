//! GARCH(1,1) conditional-volatility model.
//!
//! Implements the Bollerslev (1986) variance recursion
//! `h_t = omega + alpha * eps_{t-1}^2 + beta * h_{t-1}`
//! fitted by Gaussian quasi-maximum likelihood under box constraints and the
//! covariance-stationarity restriction `alpha + beta < 1`. The fitted model
//! yields the one-step-ahead volatility forecast and the standardized
//! residual series consumed by the scenario generator.
//!
//! Numerical notes: the likelihood is maximized with the crate's
//! Nelder-Mead simplex; the surface flattens into a ridge when `alpha` sits
//! at zero (any `omega / (1 - beta)` with the same long-run variance fits
//! equally well), which the spread-based convergence criterion tolerates.
//!
//! References:
//! - Bollerslev (1986), generalized autoregressive conditional
//!   heteroskedasticity.
//! - Engle (1982), ARCH.

use std::f64::consts::PI;
use std::time::{Duration, Instant};

use crate::core::{OptimizerError, ShockProfile, VolatilityFilter};
use crate::math::{
    BoxConstraints, ConvergenceInfo, NelderMeadOptions, TerminationReason, nelder_mead,
    sample_mean, sample_variance, stats,
};

const MIN_VARIANCE: f64 = 1.0e-18;
/// Upper bound on `alpha + beta` enforced during fitting.
const MAX_PERSISTENCE: f64 = 0.9995;

/// GARCH(1,1) parameter set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Garch11Params {
    /// Long-run variance weight `omega > 0`.
    pub omega: f64,
    /// Shock (ARCH) coefficient `alpha >= 0`.
    pub alpha: f64,
    /// Persistence (GARCH) coefficient `beta >= 0`.
    pub beta: f64,
}

impl Garch11Params {
    /// `alpha + beta`; covariance stationarity requires this below 1.
    #[inline]
    pub fn persistence(&self) -> f64 {
        self.alpha + self.beta
    }

    #[inline]
    pub fn is_stationary(&self) -> bool {
        self.persistence() < 1.0
    }

    /// Unconditional variance `omega / (1 - alpha - beta)`.
    pub fn unconditional_variance(&self) -> f64 {
        self.omega / (1.0 - self.persistence()).max(1.0e-12)
    }
}

/// Full output of a GARCH(1,1) fit.
#[derive(Debug, Clone, PartialEq)]
pub struct Garch11Fit {
    pub params: Garch11Params,
    /// Maximized Gaussian log-likelihood (constants included).
    pub log_likelihood: f64,
    pub convergence: ConvergenceInfo,
    /// One-step-ahead conditional volatility forecast.
    pub volatility_forecast: f64,
    /// Standardized residuals `eps_t / sqrt(h_t)`.
    pub residuals: Vec<f64>,
}

impl Garch11Fit {
    /// Projects the shock profile consumed by the scenario generator.
    pub fn profile(&self) -> ShockProfile {
        ShockProfile::new(self.volatility_forecast, self.residuals.clone())
    }
}

/// Conditional variance series for demeaned innovations.
///
/// `h_0` is initialized at the sample variance of the innovations.
fn conditional_variances(eps: &[f64], params: Garch11Params, h0: f64) -> Vec<f64> {
    let mut h = Vec::with_capacity(eps.len());
    let mut prev_h = h0.max(MIN_VARIANCE);
    let mut prev_e2 = h0.max(MIN_VARIANCE);

    for &e in eps {
        let var = (params.omega + params.alpha * prev_e2 + params.beta * prev_h)
            .max(MIN_VARIANCE);
        h.push(var);
        prev_h = var;
        prev_e2 = e * e;
    }
    h
}

/// Negative Gaussian log-likelihood of the innovations under the recursion.
fn negative_log_likelihood(eps: &[f64], params: Garch11Params, h0: f64) -> f64 {
    if params.persistence() >= MAX_PERSISTENCE || params.omega <= 0.0 {
        return f64::INFINITY;
    }

    let h = conditional_variances(eps, params, h0);
    let mut nll = 0.0;
    for (&e, &var) in eps.iter().zip(&h) {
        nll += 0.5 * (var.ln() + e * e / var + (2.0 * PI).ln());
    }
    if nll.is_finite() { nll } else { f64::INFINITY }
}

/// Fits GARCH(1,1) on a return series by quasi-MLE.
///
/// Innovations are the demeaned returns; `h_0` backcasts to the sample
/// variance. The optional `deadline` is checked cooperatively inside the
/// simplex loop.
///
/// # Errors
/// - `InsufficientData` when fewer than `min_observations` returns are given.
/// - `ModelFit` when the series is numerically constant, the optimizer does
///   not converge, or the deadline expires.
pub fn fit_garch11(
    returns: &[f64],
    min_observations: usize,
    deadline: Option<Instant>,
) -> Result<Garch11Fit, OptimizerError> {
    if returns.len() < min_observations.max(2) {
        return Err(OptimizerError::InsufficientData(format!(
            "volatility fit needs at least {} observations, got {}",
            min_observations.max(2),
            returns.len()
        )));
    }
    if stats::is_degenerate(returns) {
        return Err(OptimizerError::ModelFit(
            "return series is numerically constant".to_string(),
        ));
    }

    let mu = sample_mean(returns);
    let eps: Vec<f64> = returns.iter().map(|r| r - mu).collect();
    let h0 = sample_variance(&eps).max(MIN_VARIANCE);

    // Parameterization: x = [omega, alpha, beta].
    let bounds = BoxConstraints::new(
        vec![1.0e-12, 0.0, 0.0],
        vec![10.0 * h0, 0.999, 0.999],
    )
    .map_err(OptimizerError::ModelFit)?;
    let initial = [0.05 * h0, 0.05, 0.90];

    // A small initial step keeps the starting simplex inside the
    // stationarity region `alpha + beta < 1`.
    let options = NelderMeadOptions {
        initial_step: 0.02,
        deadline,
        ..NelderMeadOptions::default()
    };

    let out = nelder_mead(&initial, &bounds, options, |x| {
        let candidate = Garch11Params {
            omega: x[0],
            alpha: x[1],
            beta: x[2],
        };
        negative_log_likelihood(&eps, candidate, h0)
    })
    .map_err(OptimizerError::ModelFit)?;

    match out.convergence.reason {
        TerminationReason::DeadlineExceeded => {
            return Err(OptimizerError::ModelFit(
                "volatility fit exceeded its deadline".to_string(),
            ));
        }
        TerminationReason::NumericalFailure => {
            return Err(OptimizerError::ModelFit(
                "likelihood became non-finite during fitting".to_string(),
            ));
        }
        TerminationReason::MaxIterations => {
            return Err(OptimizerError::ModelFit(format!(
                "likelihood maximization did not converge in {} iterations",
                out.convergence.iterations
            )));
        }
        TerminationReason::ObjectiveTolerance => {}
    }

    let params = Garch11Params {
        omega: out.x[0],
        alpha: out.x[1],
        beta: out.x[2],
    };
    if !out.objective.is_finite() {
        return Err(OptimizerError::ModelFit(
            "maximized likelihood is not finite".to_string(),
        ));
    }

    let h = conditional_variances(&eps, params, h0);
    let residuals: Vec<f64> = eps
        .iter()
        .zip(&h)
        .map(|(&e, &var)| e / var.sqrt())
        .collect();

    let last_e2 = eps.last().map_or(h0, |e| e * e);
    let last_h = h.last().copied().unwrap_or(h0);
    let forecast_var = (params.omega + params.alpha * last_e2 + params.beta * last_h)
        .max(MIN_VARIANCE);

    Ok(Garch11Fit {
        params,
        log_likelihood: -out.objective,
        convergence: out.convergence,
        volatility_forecast: forecast_var.sqrt(),
        residuals,
    })
}

/// [`VolatilityFilter`] backed by the GARCH(1,1) quasi-MLE.
#[derive(Debug, Clone)]
pub struct Garch11Filter {
    pub min_observations: usize,
    /// Wall-clock budget for a single fit.
    pub timeout: Option<Duration>,
}

impl Default for Garch11Filter {
    fn default() -> Self {
        Self {
            min_observations: 50,
            timeout: None,
        }
    }
}

impl Garch11Filter {
    pub fn new(min_observations: usize, timeout: Option<Duration>) -> Self {
        Self {
            min_observations,
            timeout,
        }
    }
}

impl VolatilityFilter for Garch11Filter {
    fn fit(&self, returns: &[f64]) -> Result<ShockProfile, OptimizerError> {
        let deadline = self.timeout.map(|t| Instant::now() + t);
        fit_garch11(returns, self.min_observations, deadline).map(|fit| fit.profile())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand_distr::{Distribution, StandardNormal};

    use super::*;
    use crate::math::sample_std_dev;

    /// Simulates a GARCH(1,1) return path with standard-normal innovations.
    fn garch_series(params: Garch11Params, n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut h = params.unconditional_variance();
        let mut prev_e = 0.0;
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            h = params.omega + params.alpha * prev_e * prev_e + params.beta * h;
            let z: f64 = StandardNormal.sample(&mut rng);
            let e = z * h.sqrt();
            out.push(e);
            prev_e = e;
        }
        out
    }

    #[test]
    fn fit_recovers_volatility_scale_on_simulated_data() {
        let truth = Garch11Params {
            omega: 4.0e-6,
            alpha: 0.08,
            beta: 0.90,
        };
        let returns = garch_series(truth, 2000, 42);
        let fit = fit_garch11(&returns, 50, None).unwrap();

        assert!(fit.convergence.converged);
        assert!(fit.params.is_stationary());
        // Long-run volatility should be recovered within a loose band.
        let truth_vol = truth.unconditional_variance().sqrt();
        let fit_vol = fit.params.unconditional_variance().sqrt();
        assert!(
            (fit_vol / truth_vol) > 0.5 && (fit_vol / truth_vol) < 2.0,
            "long-run vol off by more than 2x: {fit_vol} vs {truth_vol}"
        );
        assert!(fit.volatility_forecast > 0.0);
    }

    #[test]
    fn residuals_are_approximately_standardized() {
        let truth = Garch11Params {
            omega: 1.0e-5,
            alpha: 0.10,
            beta: 0.85,
        };
        let returns = garch_series(truth, 3000, 7);
        let fit = fit_garch11(&returns, 50, None).unwrap();

        assert_eq!(fit.residuals.len(), returns.len());
        let std = sample_std_dev(&fit.residuals);
        assert_relative_eq!(std, 1.0, epsilon = 0.1);
        assert!(sample_mean(&fit.residuals).abs() < 0.1);
    }

    #[test]
    fn constant_series_is_a_model_fit_error() {
        let returns = vec![0.001; 200];
        let err = fit_garch11(&returns, 50, None).unwrap_err();
        assert!(matches!(err, OptimizerError::ModelFit(_)));
    }

    #[test]
    fn short_series_is_insufficient_data() {
        let returns = vec![0.01, -0.01, 0.02];
        let err = fit_garch11(&returns, 50, None).unwrap_err();
        assert!(matches!(err, OptimizerError::InsufficientData(_)));
    }

    #[test]
    fn expired_deadline_surfaces_as_model_fit_error() {
        let truth = Garch11Params {
            omega: 4.0e-6,
            alpha: 0.08,
            beta: 0.90,
        };
        let returns = garch_series(truth, 500, 3);
        let deadline = Some(Instant::now() - Duration::from_millis(1));
        let err = fit_garch11(&returns, 50, deadline).unwrap_err();
        assert!(matches!(err, OptimizerError::ModelFit(_)));
    }

    #[test]
    fn filter_seam_produces_profile() {
        let truth = Garch11Params {
            omega: 4.0e-6,
            alpha: 0.05,
            beta: 0.92,
        };
        let returns = garch_series(truth, 600, 11);
        let filter = Garch11Filter::default();
        let profile = filter.fit(&returns).unwrap();

        assert_eq!(profile.residuals.len(), returns.len());
        assert!(profile.volatility_forecast > 0.0);
    }

    #[test]
    fn alternating_series_fits_with_unit_scale_residuals() {
        // Deterministic +-1% alternation: variance is constant, the fitted
        // model should standardize the shocks to +-1.
        let returns: Vec<f64> = (0..120)
            .map(|i| if i % 2 == 0 { 0.01 } else { -0.01 })
            .collect();
        let fit = fit_garch11(&returns, 50, None).unwrap();

        for z in fit.residuals.iter().skip(5) {
            assert_relative_eq!(z.abs(), 1.0, epsilon = 0.2);
        }
    }
}
