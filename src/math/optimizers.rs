//! Box-constrained derivative-free minimization.
//!
//! A single optimizer is provided: the Nelder-Mead simplex search with bound
//! clamping, which is what the GARCH quasi-likelihood maximization needs.
//! The likelihood surface is smooth but develops flat ridges near the
//! stationarity boundary, so convergence is judged on the objective spread of
//! the simplex alone.
//!
//! References:
//! - Nelder and Mead (1965), simplex direct search.
//! - Nocedal and Wright, *Numerical Optimization* (2nd ed.), Ch. 9.

use std::time::Instant;

/// Box constraints `lower <= x <= upper` shared by optimizer callers.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxConstraints {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl BoxConstraints {
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Result<Self, String> {
        if lower.is_empty() || lower.len() != upper.len() {
            return Err("constraints require same non-zero lower/upper dimensions".to_string());
        }
        for i in 0..lower.len() {
            if !lower[i].is_finite() || !upper[i].is_finite() || lower[i] > upper[i] {
                return Err(format!(
                    "invalid bound at index {i}: [{}, {}]",
                    lower[i], upper[i]
                ));
            }
        }
        Ok(Self { lower, upper })
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.lower.len()
    }

    pub fn clamp(&self, x: &[f64]) -> Vec<f64> {
        x.iter()
            .enumerate()
            .map(|(i, v)| v.clamp(self.lower[i], self.upper[i]))
            .collect()
    }
}

/// Optimizer termination reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    ObjectiveTolerance,
    MaxIterations,
    DeadlineExceeded,
    NumericalFailure,
}

/// Convergence metadata attached to every fit result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvergenceInfo {
    pub iterations: usize,
    pub objective_evaluations: usize,
    pub converged: bool,
    pub reason: TerminationReason,
}

#[derive(Debug, Clone, Copy)]
pub struct NelderMeadOptions {
    pub max_iterations: usize,
    pub initial_step: f64,
    pub reflection: f64,
    pub expansion: f64,
    pub contraction: f64,
    pub shrink: f64,
    pub tolerance: f64,
    /// Cooperative deadline: checked once per iteration.
    pub deadline: Option<Instant>,
}

impl Default for NelderMeadOptions {
    fn default() -> Self {
        Self {
            max_iterations: 600,
            initial_step: 0.08,
            reflection: 1.0,
            expansion: 2.0,
            contraction: 0.5,
            shrink: 0.5,
            tolerance: 1e-7,
            deadline: None,
        }
    }
}

/// Result payload for a simplex search.
#[derive(Debug, Clone)]
pub struct OptimisationResult {
    pub x: Vec<f64>,
    pub objective: f64,
    pub convergence: ConvergenceInfo,
}

/// Minimizes `objective_fn` over the box with the Nelder-Mead simplex.
///
/// The initial simplex is built from `initial` by perturbing each coordinate
/// by `initial_step` times the bound width, clamped back into the box.
pub fn nelder_mead<F>(
    initial: &[f64],
    bounds: &BoxConstraints,
    options: NelderMeadOptions,
    mut objective_fn: F,
) -> Result<OptimisationResult, String>
where
    F: FnMut(&[f64]) -> f64,
{
    let dim = bounds.dimension();
    if initial.len() != dim {
        return Err("Nelder-Mead initial vector dimension does not match bounds".to_string());
    }

    let mut simplex = Vec::with_capacity(dim + 1);
    let mut values = Vec::with_capacity(dim + 1);
    let mut evals = 0usize;

    let x0 = bounds.clamp(initial);
    simplex.push(x0.clone());
    values.push(objective_fn(&x0));
    evals += 1;

    for d in 0..dim {
        let mut x = x0.clone();
        let step = (bounds.upper[d] - bounds.lower[d]).abs() * options.initial_step.max(1e-4);
        x[d] = (x[d] + step).min(bounds.upper[d]);
        if (x[d] - x0[d]).abs() < 1e-14 {
            x[d] = (x[d] - step).max(bounds.lower[d]);
        }
        x = bounds.clamp(&x);
        simplex.push(x.clone());
        values.push(objective_fn(&x));
        evals += 1;
    }

    // Infinite vertices are tolerated (objectives may fence off regions by
    // returning infinity); the search only fails if no vertex is finite.
    if values.iter().all(|v| !v.is_finite()) {
        return Err("Nelder-Mead objective is not finite anywhere on the initial simplex"
            .to_string());
    }

    let mut iterations = 0usize;
    let mut reason = TerminationReason::MaxIterations;
    let mut converged = false;

    for iter in 0..options.max_iterations {
        iterations = iter + 1;

        if let Some(deadline) = options.deadline {
            if Instant::now() >= deadline {
                reason = TerminationReason::DeadlineExceeded;
                break;
            }
        }

        let mut order: Vec<usize> = (0..simplex.len()).collect();
        order.sort_by(|&i, &j| values[i].total_cmp(&values[j]));

        simplex = order.iter().map(|&i| simplex[i].clone()).collect();
        values = order.iter().map(|&i| values[i]).collect();

        if !values[0].is_finite() {
            reason = TerminationReason::NumericalFailure;
            break;
        }

        let spread = (values[dim] - values[0]).abs();
        if spread <= options.tolerance {
            converged = true;
            reason = TerminationReason::ObjectiveTolerance;
            break;
        }

        let centroid: Vec<f64> = (0..dim)
            .map(|d| simplex.iter().take(dim).map(|x| x[d]).sum::<f64>() / dim as f64)
            .collect();

        let xr: Vec<f64> = (0..dim)
            .map(|d| centroid[d] + options.reflection * (centroid[d] - simplex[dim][d]))
            .collect();
        let xr = bounds.clamp(&xr);
        let fr = objective_fn(&xr);
        evals += 1;

        if fr < values[0] {
            let xe: Vec<f64> = (0..dim)
                .map(|d| centroid[d] + options.expansion * (xr[d] - centroid[d]))
                .collect();
            let xe = bounds.clamp(&xe);
            let fe = objective_fn(&xe);
            evals += 1;

            if fe < fr {
                simplex[dim] = xe;
                values[dim] = fe;
            } else {
                simplex[dim] = xr;
                values[dim] = fr;
            }
            continue;
        }

        if fr < values[dim - 1] {
            simplex[dim] = xr;
            values[dim] = fr;
            continue;
        }

        let xc: Vec<f64> = (0..dim)
            .map(|d| centroid[d] + options.contraction * (simplex[dim][d] - centroid[d]))
            .collect();
        let xc = bounds.clamp(&xc);
        let fc = objective_fn(&xc);
        evals += 1;

        if fc < values[dim] {
            simplex[dim] = xc;
            values[dim] = fc;
            continue;
        }

        for i in 1..=dim {
            for d in 0..dim {
                simplex[i][d] = simplex[0][d] + options.shrink * (simplex[i][d] - simplex[0][d]);
            }
            simplex[i] = bounds.clamp(&simplex[i]);
            values[i] = objective_fn(&simplex[i]);
            evals += 1;
        }
    }

    let mut order: Vec<usize> = (0..simplex.len()).collect();
    order.sort_by(|&i, &j| values[i].total_cmp(&values[j]));

    let best = simplex[order[0]].clone();
    let best_val = values[order[0]];

    Ok(OptimisationResult {
        x: best,
        objective: best_val,
        convergence: ConvergenceInfo {
            iterations,
            objective_evaluations: evals,
            converged,
            reason,
        },
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn nelder_mead_handles_box_constraints() {
        let bounds = BoxConstraints::new(vec![-1.0, -1.0], vec![1.0, 1.0]).unwrap();
        let out = nelder_mead(&[0.9, 0.9], &bounds, NelderMeadOptions::default(), |x| {
            (x[0] - 0.25).powi(2) + (x[1] + 0.4).powi(2)
        })
        .unwrap();

        assert!(out.convergence.converged);
        assert!((out.x[0] - 0.25).abs() < 1e-4);
        assert!((out.x[1] + 0.4).abs() < 1e-4);
    }

    #[test]
    fn nelder_mead_clamps_unconstrained_minimum_to_boundary() {
        let bounds = BoxConstraints::new(vec![0.0], vec![1.0]).unwrap();
        let out = nelder_mead(&[0.5], &bounds, NelderMeadOptions::default(), |x| {
            (x[0] - 2.0).powi(2)
        })
        .unwrap();

        assert!((out.x[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn expired_deadline_reports_deadline_exceeded() {
        let bounds = BoxConstraints::new(vec![-1.0, -1.0], vec![1.0, 1.0]).unwrap();
        let options = NelderMeadOptions {
            deadline: Some(Instant::now() - Duration::from_millis(1)),
            ..NelderMeadOptions::default()
        };
        let out = nelder_mead(&[0.9, 0.9], &bounds, options, |x| {
            x[0] * x[0] + x[1] * x[1]
        })
        .unwrap();

        assert!(!out.convergence.converged);
        assert_eq!(
            out.convergence.reason,
            TerminationReason::DeadlineExceeded
        );
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let bounds = BoxConstraints::new(vec![0.0, 0.0], vec![1.0, 1.0]).unwrap();
        let result = nelder_mead(&[0.5], &bounds, NelderMeadOptions::default(), |x| x[0]);
        assert!(result.is_err());
    }
}
