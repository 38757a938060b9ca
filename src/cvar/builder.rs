//! Rockafellar-Uryasev construction of the CVaR program.
//!
//! For scenario losses `L_j(w) = -sum_i s_{ji} w_i`, the constraint
//! `CVaR_beta(L) <= alpha` admits an exact linear representation through an
//! auxiliary threshold `t` and shortfall slacks `z_j >= L_j - t`:
//!
//! `t + (1 / ((1 - beta) J)) sum_j z_j <= alpha`
//!
//! The representation is exact (not an approximation) because the losses are
//! piecewise-linear in `w` for fixed scenarios. Construction is pure: no
//! solving happens here, so the constraint set is unit-testable without any
//! backend.
//!
//! References:
//! - Rockafellar and Uryasev (2000), optimization of conditional
//!   value-at-risk.

use crate::cvar::lp::{ConstraintOp, LinearProgram, Sense, VariableBounds};
use crate::scenario::ScenarioMatrix;

/// Builder for the CVaR-constrained allocation program.
#[derive(Debug, Clone, PartialEq)]
pub struct CvarLpBuilder {
    /// CVaR budget `alpha` on the normalized portfolio loss.
    pub risk_level: f64,
    /// Tail confidence `beta`.
    pub confidence: f64,
    /// Diversification cap `gamma`.
    pub cap: f64,
    /// Positive weight floor `epsilon`.
    pub floor: f64,
}

/// The assembled program plus the variable layout.
///
/// Layout: `x = [w_0 .. w_{N-1}, t, z_0 .. z_{J-1}]`.
#[derive(Debug, Clone, PartialEq)]
pub struct CvarProgram {
    pub program: LinearProgram,
    n_assets: usize,
    n_scenarios: usize,
}

impl CvarProgram {
    #[inline]
    pub fn n_assets(&self) -> usize {
        self.n_assets
    }

    #[inline]
    pub fn n_scenarios(&self) -> usize {
        self.n_scenarios
    }

    /// Index of weight variable `i`.
    #[inline]
    pub fn weight_index(&self, i: usize) -> usize {
        assert!(i < self.n_assets, "asset index out of range");
        i
    }

    /// Index of the VaR threshold variable `t`.
    #[inline]
    pub fn threshold_index(&self) -> usize {
        self.n_assets
    }

    /// Index of shortfall slack `z_j`.
    #[inline]
    pub fn shortfall_index(&self, j: usize) -> usize {
        assert!(j < self.n_scenarios, "scenario index out of range");
        self.n_assets + 1 + j
    }
}

impl CvarLpBuilder {
    /// # Panics
    /// Panics when `risk_level` or `confidence` is outside `(0, 1)`, `cap`
    /// is outside `(0, 1]`, or `floor` is outside `(0, cap]`.
    pub fn new(risk_level: f64, confidence: f64, cap: f64, floor: f64) -> Self {
        assert!(
            risk_level.is_finite() && risk_level > 0.0 && risk_level < 1.0,
            "risk_level must be in (0,1)"
        );
        assert!(
            confidence.is_finite() && confidence > 0.0 && confidence < 1.0,
            "confidence must be in (0,1)"
        );
        assert!(
            cap.is_finite() && cap > 0.0 && cap <= 1.0,
            "cap must be in (0,1]"
        );
        assert!(
            floor.is_finite() && floor > 0.0 && floor <= cap,
            "floor must be in (0, cap]"
        );
        Self {
            risk_level,
            confidence,
            cap,
            floor,
        }
    }

    /// Assembles the program for a scenario matrix.
    ///
    /// `mean_returns` is the objective vector (expected scenario return per
    /// asset); `excluded[i]` pins asset `i` to zero weight, overriding the
    /// floor (stacking `w_i = 0` on top of a positive floor would make the
    /// program trivially infeasible).
    ///
    /// # Panics
    /// Panics when `mean_returns` or `excluded` length does not match the
    /// scenario matrix, or the matrix is empty.
    pub fn build(
        &self,
        scenarios: &ScenarioMatrix,
        mean_returns: &[f64],
        excluded: &[bool],
    ) -> CvarProgram {
        let n = scenarios.n_assets();
        let j_count = scenarios.n_scenarios();
        assert!(n > 0 && j_count > 0, "scenario matrix must be non-empty");
        assert!(
            mean_returns.len() == n,
            "mean_returns length {} does not match {} assets",
            mean_returns.len(),
            n
        );
        assert!(
            excluded.len() == n,
            "excluded length {} does not match {} assets",
            excluded.len(),
            n
        );

        let num_vars = n + 1 + j_count;
        let mut lp = LinearProgram::new(num_vars, Sense::Maximize);

        let t_idx = n;
        let z_base = n + 1;

        // Objective: maximize expected scenario return.
        for (i, &mu) in mean_returns.iter().enumerate() {
            lp.set_objective(i, mu);
        }

        // Variable domains: w in [floor, cap] (pinned to zero when excluded),
        // t free, z >= 0.
        for i in 0..n {
            if excluded[i] {
                lp.set_bounds(i, VariableBounds::fixed(0.0));
            } else {
                lp.set_bounds(i, VariableBounds::boxed(self.floor, self.cap));
            }
        }
        for j in 0..j_count {
            lp.set_bounds(z_base + j, VariableBounds::non_negative());
        }

        // Budget: fully invested.
        lp.add_constraint(
            "budget",
            (0..n).map(|i| (i, 1.0)).collect(),
            ConstraintOp::Eq,
            1.0,
        );

        // Explicit diversification caps, kept alongside the variable bounds
        // so cap changes do not require re-declaring variable domains.
        for i in 0..n {
            if !excluded[i] {
                lp.add_constraint(format!("cap_{i}"), vec![(i, 1.0)], ConstraintOp::Le, self.cap);
            }
        }

        // Loss linearization: z_j >= -sum_i s_{ji} w_i - t.
        for j in 0..j_count {
            let mut terms: Vec<(usize, f64)> = Vec::with_capacity(n + 2);
            for i in 0..n {
                terms.push((i, -scenarios.entry(j, i)));
            }
            terms.push((t_idx, -1.0));
            terms.push((z_base + j, -1.0));
            lp.add_constraint(format!("loss_{j}"), terms, ConstraintOp::Le, 0.0);
        }

        // CVaR budget: t + (1 / ((1 - beta) J)) sum_j z_j <= alpha.
        let tail_weight = 1.0 / ((1.0 - self.confidence) * j_count as f64);
        let mut terms: Vec<(usize, f64)> = Vec::with_capacity(j_count + 1);
        terms.push((t_idx, 1.0));
        for j in 0..j_count {
            terms.push((z_base + j, tail_weight));
        }
        lp.add_constraint("cvar", terms, ConstraintOp::Le, self.risk_level);

        CvarProgram {
            program: lp,
            n_assets: n,
            n_scenarios: j_count,
        }
    }
}
