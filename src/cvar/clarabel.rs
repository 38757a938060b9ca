//! Clarabel backend for the [`LpSolver`] seam.
//!
//! The linear program is posed as a conic program with a zero quadratic
//! term: equality rows map to a zero cone, inequality rows (including
//! variable bounds, lowered to rows) to a nonnegative cone. Clarabel is an
//! interior-point solver, so returned points satisfy constraints to solver
//! tolerance rather than exactly.

use std::time::Duration;

use clarabel::algebra::*;
use clarabel::solver::*;

use crate::core::OptimizerError;
use crate::cvar::lp::{ConstraintOp, LinearProgram, LpSolution, LpSolver, Sense};

/// Interior-point LP backend.
#[derive(Debug, Clone)]
pub struct ClarabelSolver {
    pub max_iterations: u32,
    /// Wall-clock budget forwarded to the solver.
    pub time_limit: Option<Duration>,
    pub verbose: bool,
}

impl Default for ClarabelSolver {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            time_limit: None,
            verbose: false,
        }
    }
}

impl ClarabelSolver {
    pub fn new(max_iterations: u32, time_limit: Option<Duration>) -> Self {
        Self {
            max_iterations,
            time_limit,
            verbose: false,
        }
    }
}

/// One row of the conic constraint block `Ax + s = b`.
struct Row {
    terms: Vec<(usize, f64)>,
    rhs: f64,
}

fn csc_from_rows(rows: &[Row], num_vars: usize) -> CscMatrix<f64> {
    let mut cols: Vec<Vec<(usize, f64)>> = vec![Vec::new(); num_vars];
    for (r, row) in rows.iter().enumerate() {
        for &(col, val) in &row.terms {
            if val != 0.0 {
                cols[col].push((r, val));
            }
        }
    }

    let mut colptr = Vec::with_capacity(num_vars + 1);
    let mut rowval = Vec::new();
    let mut nzval = Vec::new();
    colptr.push(0);
    for col in &mut cols {
        col.sort_by_key(|(r, _)| *r);
        for &(r, v) in col.iter() {
            rowval.push(r);
            nzval.push(v);
        }
        colptr.push(rowval.len());
    }

    CscMatrix::new(rows.len(), num_vars, colptr, rowval, nzval)
}

impl LpSolver for ClarabelSolver {
    fn solve(&self, program: &LinearProgram) -> Result<LpSolution, OptimizerError> {
        let n = program.num_vars();

        // Equality rows feed the zero cone, inequality rows the nonnegative
        // cone; `>=` rows and lower bounds are flipped into `<=` form.
        let mut eq_rows: Vec<Row> = Vec::new();
        let mut ineq_rows: Vec<Row> = Vec::new();

        for c in program.constraints() {
            match c.op {
                ConstraintOp::Eq => eq_rows.push(Row {
                    terms: c.terms.clone(),
                    rhs: c.rhs,
                }),
                ConstraintOp::Le => ineq_rows.push(Row {
                    terms: c.terms.clone(),
                    rhs: c.rhs,
                }),
                ConstraintOp::Ge => ineq_rows.push(Row {
                    terms: c.terms.iter().map(|&(i, v)| (i, -v)).collect(),
                    rhs: -c.rhs,
                }),
            }
        }

        for (i, bounds) in program.bounds().iter().enumerate() {
            if let Some(lower) = bounds.lower {
                ineq_rows.push(Row {
                    terms: vec![(i, -1.0)],
                    rhs: -lower,
                });
            }
            if let Some(upper) = bounds.upper {
                ineq_rows.push(Row {
                    terms: vec![(i, 1.0)],
                    rhs: upper,
                });
            }
        }

        let mut all_rows = eq_rows;
        let m_eq = all_rows.len();
        all_rows.extend(ineq_rows);
        let m_ineq = all_rows.len() - m_eq;

        let a = csc_from_rows(&all_rows, n);
        let b: Vec<f64> = all_rows.iter().map(|r| r.rhs).collect();

        // Zero quadratic term: a pure LP.
        let p = CscMatrix::new(n, n, vec![0; n + 1], Vec::new(), Vec::new());
        let q: Vec<f64> = match program.sense() {
            Sense::Minimize => program.objective().to_vec(),
            Sense::Maximize => program.objective().iter().map(|c| -c).collect(),
        };

        let mut cones: Vec<SupportedConeT<f64>> = Vec::with_capacity(2);
        if m_eq > 0 {
            cones.push(ZeroConeT(m_eq));
        }
        if m_ineq > 0 {
            cones.push(NonnegativeConeT(m_ineq));
        }

        let settings = DefaultSettingsBuilder::default()
            .verbose(self.verbose)
            .max_iter(self.max_iterations)
            .time_limit(
                self.time_limit
                    .map_or(f64::INFINITY, |t| t.as_secs_f64()),
            )
            .build()
            .map_err(|e| OptimizerError::Solver(format!("failed to build settings: {e}")))?;

        let mut solver = DefaultSolver::new(&p, &q, &a, &b, &cones, settings)
            .map_err(|e| OptimizerError::Solver(format!("failed to create solver: {e:?}")))?;
        solver.solve();

        match solver.solution.status {
            SolverStatus::Solved | SolverStatus::AlmostSolved => {
                let values = solver.solution.x.clone();
                let objective = program.objective_value(&values);
                Ok(LpSolution { values, objective })
            }
            SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
                Err(OptimizerError::Infeasible(
                    "no feasible point satisfies the constraint set".to_string(),
                ))
            }
            SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
                Err(OptimizerError::Solver(
                    "program is unbounded (dual infeasible)".to_string(),
                ))
            }
            SolverStatus::MaxTime => Err(OptimizerError::Solver(
                "solve exceeded its time limit".to_string(),
            )),
            status => Err(OptimizerError::Solver(format!(
                "solver terminated with status {status:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::cvar::lp::VariableBounds;

    #[test]
    fn solves_a_small_bounded_lp() {
        // maximize x + 2y  s.t.  x + y <= 1.5,  x, y in [0, 1].
        let mut lp = LinearProgram::new(2, Sense::Maximize);
        lp.set_objective(0, 1.0);
        lp.set_objective(1, 2.0);
        lp.set_bounds(0, VariableBounds::boxed(0.0, 1.0));
        lp.set_bounds(1, VariableBounds::boxed(0.0, 1.0));
        lp.add_constraint("sum", vec![(0, 1.0), (1, 1.0)], ConstraintOp::Le, 1.5);

        let solution = ClarabelSolver::default().solve(&lp).unwrap();
        assert_relative_eq!(solution.values[0], 0.5, epsilon = 1.0e-6);
        assert_relative_eq!(solution.values[1], 1.0, epsilon = 1.0e-6);
        assert_relative_eq!(solution.objective, 2.5, epsilon = 1.0e-6);
    }

    #[test]
    fn honors_equality_constraints() {
        // maximize x  s.t.  x + y = 1,  x <= 0.6,  x, y >= 0.
        let mut lp = LinearProgram::new(2, Sense::Maximize);
        lp.set_objective(0, 1.0);
        lp.set_bounds(0, VariableBounds::non_negative());
        lp.set_bounds(1, VariableBounds::non_negative());
        lp.add_constraint("budget", vec![(0, 1.0), (1, 1.0)], ConstraintOp::Eq, 1.0);
        lp.add_constraint("cap", vec![(0, 1.0)], ConstraintOp::Le, 0.6);

        let solution = ClarabelSolver::default().solve(&lp).unwrap();
        assert_relative_eq!(solution.values[0], 0.6, epsilon = 1.0e-6);
        assert_relative_eq!(solution.values[1], 0.4, epsilon = 1.0e-6);
    }

    #[test]
    fn ge_rows_and_free_variables_are_supported() {
        // minimize t  s.t.  t >= -3, t free otherwise.
        let mut lp = LinearProgram::new(1, Sense::Minimize);
        lp.set_objective(0, 1.0);
        lp.add_constraint("lower", vec![(0, 1.0)], ConstraintOp::Ge, -3.0);

        let solution = ClarabelSolver::default().solve(&lp).unwrap();
        assert_relative_eq!(solution.values[0], -3.0, epsilon = 1.0e-5);
    }

    #[test]
    fn contradictory_bounds_are_infeasible() {
        // x in [0, 1] but x >= 2.
        let mut lp = LinearProgram::new(1, Sense::Maximize);
        lp.set_objective(0, 1.0);
        lp.set_bounds(0, VariableBounds::boxed(0.0, 1.0));
        lp.add_constraint("impossible", vec![(0, 1.0)], ConstraintOp::Ge, 2.0);

        let err = ClarabelSolver::default().solve(&lp).unwrap_err();
        assert!(matches!(err, OptimizerError::Infeasible(_)));
    }

    #[test]
    fn unreachable_budget_is_infeasible() {
        // Three weights capped at 0.01 cannot sum to 1.
        let mut lp = LinearProgram::new(3, Sense::Maximize);
        for i in 0..3 {
            lp.set_objective(i, 1.0);
            lp.set_bounds(i, VariableBounds::boxed(1.0e-6, 0.01));
        }
        lp.add_constraint(
            "budget",
            vec![(0, 1.0), (1, 1.0), (2, 1.0)],
            ConstraintOp::Eq,
            1.0,
        );

        let err = ClarabelSolver::default().solve(&lp).unwrap_err();
        assert!(matches!(err, OptimizerError::Infeasible(_)));
    }
}
