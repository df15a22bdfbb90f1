//! Clarabel interior-point backend.
//!
//! Clarabel solves the conic program
//!
//! ```text
//! minimize    ½ xᵀPx + qᵀx
//! subject to  Ax + s = b,   s ∈ K
//! ```
//!
//! Reconciliation maps onto it with `P = diag(h)`, `q = d` and two cone
//! blocks:
//!
//! | Rows | Cone | Meaning |
//! |------|------|---------|
//! | `E x + s = e` | Zero | conservation, `E x = e` |
//! | `xᵢ + s = uᵢ` | Nonnegative | `xᵢ ≤ uᵢ` |
//! | `-xᵢ + s = -lᵢ` | Nonnegative | `xᵢ ≥ lᵢ` |
//!
//! Bounds that are not finite are left out of the nonnegative block.

use super::{QpBackend, QpProblem, QpSettings, QpSolution};
use ::clarabel::{
    algebra::CscMatrix,
    solver::{DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus, SupportedConeT},
};
use flowrec_core::{FlowrecError, FlowrecResult};
use web_time::Instant;

#[derive(Debug, Clone, Default)]
pub struct ClarabelBackend {
    settings: QpSettings,
}

impl ClarabelBackend {
    pub fn new(settings: QpSettings) -> Self {
        Self { settings }
    }
}

/// Column-wise entries to CSC arrays.
fn to_csc(
    n_rows: usize,
    mut columns: Vec<Vec<(usize, f64)>>,
) -> CscMatrix<f64> {
    let n_cols = columns.len();
    let mut col_ptr = Vec::with_capacity(n_cols + 1);
    let mut row_idx = Vec::new();
    let mut values = Vec::new();
    let mut nnz = 0;

    for column in columns.iter_mut() {
        col_ptr.push(nnz);
        column.sort_by_key(|(r, _)| *r);
        for &(r, v) in column.iter() {
            row_idx.push(r);
            values.push(v);
            nnz += 1;
        }
    }
    col_ptr.push(nnz);

    CscMatrix::new(n_rows, n_cols, col_ptr, row_idx, values)
}

impl QpBackend for ClarabelBackend {
    fn name(&self) -> &'static str {
        "clarabel"
    }

    fn solve(&self, problem: &QpProblem<'_>) -> FlowrecResult<QpSolution> {
        problem.check_dimensions()?;
        let start = Instant::now();
        let n_var = problem.n_vars();

        let mut columns: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n_var];
        let mut rhs: Vec<f64> = Vec::new();
        let mut cones: Vec<SupportedConeT<f64>> = Vec::new();

        // Equality block (Zero cone)
        let n_eq = problem.equality.rows();
        for (&v, (row, col)) in problem.equality.iter() {
            columns[col].push((row, v));
        }
        rhs.extend_from_slice(problem.equality_rhs);
        if n_eq > 0 {
            cones.push(SupportedConeT::ZeroConeT(n_eq));
        }

        // Box block (Nonnegative cone): one row per finite bound
        let push_leq = |col: usize,
                        coeff: f64,
                        b: f64,
                        columns: &mut Vec<Vec<(usize, f64)>>,
                        rhs: &mut Vec<f64>,
                        cones: &mut Vec<SupportedConeT<f64>>| {
            let row = rhs.len();
            columns[col].push((row, coeff));
            rhs.push(b);
            match cones.last_mut() {
                Some(SupportedConeT::NonnegativeConeT(n)) => *n += 1,
                _ => cones.push(SupportedConeT::NonnegativeConeT(1)),
            }
        };

        for i in 0..n_var {
            let upper = problem.upper[i];
            if upper.is_finite() {
                push_leq(i, 1.0, upper, &mut columns, &mut rhs, &mut cones);
            }
            let lower = problem.lower[i];
            if lower.is_finite() {
                push_leq(i, -1.0, -lower, &mut columns, &mut rhs, &mut cones);
            }
        }

        let a_mat = to_csc(rhs.len(), columns);

        // P must be upper triangular; a diagonal qualifies
        let p_columns: Vec<Vec<(usize, f64)>> = problem
            .hessian_diag
            .iter()
            .enumerate()
            .map(|(i, &h)| if h != 0.0 { vec![(i, h)] } else { Vec::new() })
            .collect();
        let p_mat = to_csc(n_var, p_columns);

        let settings = DefaultSettingsBuilder::default()
            .verbose(false)
            .tol_gap_abs(self.settings.tol_gap_abs)
            .tol_gap_rel(self.settings.tol_gap_rel)
            .tol_feas(self.settings.tol_feas)
            .max_iter(self.settings.max_iter)
            .build()
            .map_err(|e| FlowrecError::Optimization(format!("Clarabel settings error: {:?}", e)))?;

        let mut solver =
            DefaultSolver::new(&p_mat, problem.linear, &a_mat, &rhs, &cones, settings).map_err(
                |e| FlowrecError::Optimization(format!("Clarabel initialization failed: {:?}", e)),
            )?;

        solver.solve();

        let sol = solver.solution;
        if !matches!(sol.status, SolverStatus::Solved | SolverStatus::AlmostSolved) {
            return Err(FlowrecError::Optimization(format!(
                "Clarabel returned status {:?}; bounds may conflict with conservation \
                 or the topology may be disconnected",
                sol.status
            )));
        }

        Ok(QpSolution {
            x: sol.x,
            iterations: sol.iterations,
            solve_time: start.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprs::TriMat;

    #[test]
    fn solves_single_node_balance() {
        // Two equally weighted meters around one node: 10 in, 8 out -> both 9
        let mut eq = TriMat::new((1, 2));
        eq.add_triplet(0, 0, 1.0);
        eq.add_triplet(0, 1, -1.0);
        let eq = eq.to_csr::<usize>();

        let h = [1.0, 1.0];
        let d = [-10.0, -8.0];
        let lower = [0.0, 0.0];
        let upper = [f64::INFINITY, f64::INFINITY];
        let problem = QpProblem {
            hessian_diag: &h,
            linear: &d,
            equality: eq.view(),
            equality_rhs: &[0.0],
            lower: &lower,
            upper: &upper,
        };

        let sol = ClarabelBackend::default().solve(&problem).expect("solve");
        assert!((sol.x[0] - 9.0).abs() < 1e-6, "x0 = {}", sol.x[0]);
        assert!((sol.x[1] - 9.0).abs() < 1e-6, "x1 = {}", sol.x[1]);
    }

    #[test]
    fn active_upper_bound_is_respected() {
        let mut eq = TriMat::new((1, 2));
        eq.add_triplet(0, 0, 1.0);
        eq.add_triplet(0, 1, -1.0);
        let eq = eq.to_csr::<usize>();

        let h = [1.0, 1.0];
        let d = [-10.0, -8.0];
        let lower = [0.0, 0.0];
        let upper = [8.5, f64::INFINITY];
        let problem = QpProblem {
            hessian_diag: &h,
            linear: &d,
            equality: eq.view(),
            equality_rhs: &[0.0],
            lower: &lower,
            upper: &upper,
        };

        let sol = ClarabelBackend::default().solve(&problem).expect("solve");
        assert!((sol.x[0] - 8.5).abs() < 1e-5, "x0 = {}", sol.x[0]);
        assert!((sol.x[1] - 8.5).abs() < 1e-5, "x1 = {}", sol.x[1]);
    }

    #[test]
    fn infeasible_bounds_are_optimization_errors() {
        let mut eq = TriMat::new((1, 2));
        eq.add_triplet(0, 0, 1.0);
        eq.add_triplet(0, 1, -1.0);
        let eq = eq.to_csr::<usize>();

        let h = [1.0, 1.0];
        let d = [-10.0, -8.0];
        let lower = [5.0, 7.0];
        let upper = [6.0, 9.0];
        let problem = QpProblem {
            hessian_diag: &h,
            linear: &d,
            equality: eq.view(),
            equality_rhs: &[0.0],
            lower: &lower,
            upper: &upper,
        };

        let err = ClarabelBackend::default().solve(&problem).unwrap_err();
        assert!(matches!(err, FlowrecError::Optimization(_)));
    }
}
