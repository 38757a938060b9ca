//! Historical VaR/ES estimators and the realized-CVaR validation of solved
//! weights.
//!
//! The module uses a loss-positive convention (`loss = -return`): tail
//! metrics come back as non-negative loss magnitudes. The realized-CVaR
//! proxy used for validation is the negated empirical `alpha`-quantile of
//! the portfolio return series; it sanity-checks the in-sample risk of a
//! solved allocation against the modeled constraint and never feeds back
//! into the optimization.
//!
//! References:
//! - McNeil, Frey, Embrechts, *Quantitative Risk Management* (2005/2015).

use crate::market::ReturnPanel;
use crate::math::empirical_quantile;

/// Historical Value-at-Risk from a P&L sample.
///
/// Positive P&L values are profits, negative values losses; the returned VaR
/// is a positive loss number.
///
/// # Panics
/// Panics if `pnl` is empty or `confidence` is outside `(0, 1)`.
pub fn historical_var(pnl: &[f64], confidence: f64) -> f64 {
    validate_inputs(pnl, confidence);
    let losses: Vec<f64> = pnl.iter().map(|x| -x).collect();
    empirical_quantile(&losses, confidence).max(0.0)
}

/// Historical Expected Shortfall (CVaR) from a P&L sample.
///
/// # Panics
/// Panics if `pnl` is empty or `confidence` is outside `(0, 1)`.
pub fn historical_expected_shortfall(pnl: &[f64], confidence: f64) -> f64 {
    validate_inputs(pnl, confidence);

    let var = historical_var(pnl, confidence);
    let mut tail_sum = 0.0;
    let mut tail_count = 0usize;

    for &x in pnl {
        let loss = -x;
        if loss >= var - 1.0e-12 {
            tail_sum += loss;
            tail_count += 1;
        }
    }

    if tail_count == 0 {
        var
    } else {
        (tail_sum / tail_count as f64).max(0.0)
    }
}

/// Daily portfolio return series implied by solved weights.
///
/// # Panics
/// Panics when `weights` length does not match the panel's asset count.
pub fn realized_portfolio_returns(panel: &ReturnPanel, weights: &[f64]) -> Vec<f64> {
    panel.portfolio_returns(weights)
}

/// Realized-CVaR proxy of a solved allocation: the negated empirical
/// `alpha`-quantile of the historical portfolio returns.
///
/// A positive value is the in-sample tail-loss magnitude at level `alpha`
/// and is directly comparable to the CVaR budget of the optimization.
///
/// # Panics
/// Panics when `weights` length mismatches the panel or `alpha` is outside
/// `(0, 1)`.
pub fn realized_cvar(panel: &ReturnPanel, weights: &[f64], alpha: f64) -> f64 {
    assert!(
        alpha.is_finite() && alpha > 0.0 && alpha < 1.0,
        "alpha must be in (0,1)"
    );
    let portfolio = realized_portfolio_returns(panel, weights);
    -empirical_quantile(&portfolio, alpha)
}

fn validate_inputs(pnl: &[f64], confidence: f64) {
    assert!(!pnl.is_empty(), "pnl must not be empty");
    assert!(
        confidence.is_finite() && confidence > 0.0 && confidence < 1.0,
        "confidence must be in (0,1)"
    );
}
