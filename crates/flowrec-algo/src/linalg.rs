//! Small dense helpers for covariance propagation.
//!
//! The matrices involved are node-by-node or flow-by-flow and stay small
//! enough for dense SVD.

use flowrec_core::{FlowrecError, FlowrecResult};
use nalgebra::{DMatrix, DVector};

/// Iteration cap handed to the SVD.
const MAX_SVD_ITERATIONS: usize = 10_000;

/// Moore-Penrose pseudo-inverse via SVD.
///
/// Singular values below `σ_max · max(rows, cols) · ε` are treated as zero,
/// so rank-deficient covariances (closed loops, zero-tolerance meters) are
/// handled without failing. Non-finite entries are rejected up front; the SVD
/// would otherwise iterate forever on them.
pub fn pseudo_inverse(matrix: DMatrix<f64>) -> FlowrecResult<DMatrix<f64>> {
    if let Some(bad) = matrix.iter().find(|v| !v.is_finite()) {
        return Err(FlowrecError::Input(format!(
            "covariance matrix has a non-finite entry {}",
            bad
        )));
    }
    let dim = matrix.nrows().max(matrix.ncols()).max(1) as f64;
    let svd = matrix
        .try_svd(true, true, f64::EPSILON, MAX_SVD_ITERATIONS)
        .ok_or_else(|| {
            FlowrecError::Optimization(format!(
                "SVD did not converge within {} iterations",
                MAX_SVD_ITERATIONS
            ))
        })?;
    let sigma_max = svd.singular_values.iter().cloned().fold(0.0_f64, f64::max);
    let eps = (sigma_max * dim * f64::EPSILON).max(f64::MIN_POSITIVE);
    svd.pseudo_inverse(eps)
        .map_err(|e| FlowrecError::Invariant(format!("pseudo-inverse failed: {}", e)))
}

/// `A · diag(d) · Aᵀ`
pub fn sandwich_diag(a: &DMatrix<f64>, diag: &[f64]) -> DMatrix<f64> {
    let d = DMatrix::from_diagonal(&DVector::from_column_slice(diag));
    a * d * a.transpose()
}
