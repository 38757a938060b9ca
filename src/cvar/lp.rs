//! Solver-agnostic linear-program representation.
//!
//! A program is a dense objective over continuous variables with per-variable
//! bounds and sparse labeled constraints. Construction is separate from
//! solving: builders assemble a [`LinearProgram`], backends implementing
//! [`LpSolver`] consume it.

use crate::core::OptimizerError;

/// Optimization direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Minimize,
    Maximize,
}

/// Constraint comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    /// `lhs == rhs`
    Eq,
    /// `lhs <= rhs`
    Le,
    /// `lhs >= rhs`
    Ge,
}

/// Per-variable box bounds; `None` means unbounded on that side.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VariableBounds {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl VariableBounds {
    pub fn free() -> Self {
        Self::default()
    }

    pub fn non_negative() -> Self {
        Self {
            lower: Some(0.0),
            upper: None,
        }
    }

    pub fn boxed(lower: f64, upper: f64) -> Self {
        assert!(lower <= upper, "lower bound must not exceed upper bound");
        Self {
            lower: Some(lower),
            upper: Some(upper),
        }
    }

    /// Both bounds pinned to a single value.
    pub fn fixed(value: f64) -> Self {
        Self::boxed(value, value)
    }
}

/// One sparse linear constraint `sum coeff * x[index] (op) rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    /// Diagnostic label, e.g. `"budget"` or `"loss_17"`.
    pub label: String,
    /// Sparse coefficients as `(variable index, coefficient)` pairs.
    pub terms: Vec<(usize, f64)>,
    pub op: ConstraintOp,
    pub rhs: f64,
}

/// A fully specified linear program over continuous variables.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearProgram {
    objective: Vec<f64>,
    sense: Sense,
    bounds: Vec<VariableBounds>,
    constraints: Vec<LinearConstraint>,
}

impl LinearProgram {
    /// Creates a program with `num_vars` free variables and a zero objective.
    pub fn new(num_vars: usize, sense: Sense) -> Self {
        Self {
            objective: vec![0.0; num_vars],
            sense,
            bounds: vec![VariableBounds::free(); num_vars],
            constraints: Vec::new(),
        }
    }

    #[inline]
    pub fn num_vars(&self) -> usize {
        self.objective.len()
    }

    #[inline]
    pub fn sense(&self) -> Sense {
        self.sense
    }

    #[inline]
    pub fn objective(&self) -> &[f64] {
        &self.objective
    }

    #[inline]
    pub fn bounds(&self) -> &[VariableBounds] {
        &self.bounds
    }

    #[inline]
    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    /// Sets the objective coefficient of one variable.
    ///
    /// # Panics
    /// Panics on an out-of-range variable index.
    pub fn set_objective(&mut self, var: usize, coeff: f64) {
        self.objective[var] = coeff;
    }

    /// Sets the bounds of one variable.
    ///
    /// # Panics
    /// Panics on an out-of-range variable index.
    pub fn set_bounds(&mut self, var: usize, bounds: VariableBounds) {
        self.bounds[var] = bounds;
    }

    /// Appends a constraint.
    ///
    /// # Panics
    /// Panics when a term references an out-of-range variable.
    pub fn add_constraint(
        &mut self,
        label: impl Into<String>,
        terms: Vec<(usize, f64)>,
        op: ConstraintOp,
        rhs: f64,
    ) {
        let n = self.num_vars();
        for &(idx, _) in &terms {
            assert!(idx < n, "constraint term references variable {idx} >= {n}");
        }
        self.constraints.push(LinearConstraint {
            label: label.into(),
            terms,
            op,
            rhs,
        });
    }

    /// Objective value of a candidate point, in the program's own sense.
    pub fn objective_value(&self, x: &[f64]) -> f64 {
        self.objective
            .iter()
            .zip(x)
            .map(|(c, v)| c * v)
            .sum::<f64>()
    }
}

/// Optimal point returned by a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct LpSolution {
    /// Optimal variable values, in program order.
    pub values: Vec<f64>,
    /// Optimal objective in the program's sense.
    pub objective: f64,
}

/// Backend seam: any conforming LP solver is swappable without touching the
/// program construction.
pub trait LpSolver {
    /// Solves the program to optimality.
    ///
    /// # Errors
    /// - `Infeasible` when no feasible point exists.
    /// - `Solver` for backend-internal failures or timeouts.
    fn solve(&self, program: &LinearProgram) -> Result<LpSolution, OptimizerError>;
}
