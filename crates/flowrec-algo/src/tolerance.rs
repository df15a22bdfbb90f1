//! Measurement uncertainty before and after reconciliation.
//!
//! With `Σ = diag(tol²)` and the incidence matrix `A`, reconciled values are
//! `x* = B·x₀` where
//!
//! ```text
//! B  = I − Σ·Aᵀ·(A·Σ·Aᵀ)⁺·A
//! σ* = √diag(B·Σ·Bᵀ)
//! ```
//!
//! Relative errors are aggregated as `√n / Σ(1/ρᵢ)` with `ρᵢ = 100·σᵢ/x₀ᵢ`.
//! Flows with a zero measured value or zero uncertainty have no finite
//! relative error and are left out of the aggregate.

use crate::linalg::pseudo_inverse;
use crate::sparse::IncidenceMatrix;
use flowrec_core::{Flow, FlowrecError, FlowrecResult};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Uncertainty summary of a flow set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToleranceReport {
    /// Aggregate relative error of the raw measurements, percent
    pub relative_tolerance: f64,
    /// Aggregate relative error after reconciliation, percent
    pub relative_tolerance_reconciled: f64,
    /// `σ*` per flow
    pub sigma_reconciled: Vec<f64>,
    /// `100·tol/x₀` per flow (`None` when undefined)
    pub relative_tolerances: Vec<Option<f64>>,
    /// `100·σ*/x₀` per flow (`None` when undefined)
    pub relative_tolerances_reconciled: Vec<Option<f64>>,
}

fn relative(spread: &[f64], measured: &[f64]) -> Vec<Option<f64>> {
    spread
        .iter()
        .zip(measured)
        .map(|(&s, &x0)| {
            let rho = s * 100.0 / x0;
            (x0 != 0.0 && rho != 0.0 && rho.is_finite()).then_some(rho)
        })
        .collect()
}

fn aggregate(relative: &[Option<f64>]) -> f64 {
    let values: Vec<f64> = relative.iter().flatten().copied().collect();
    if values.is_empty() {
        return 0.0;
    }
    let inverse_sum: f64 = values.iter().map(|rho| 1.0 / rho).sum();
    (values.len() as f64).sqrt() / inverse_sum
}

/// Aggregate relative error of the measured values.
pub fn relative_measurement_error(flows: &[Flow]) -> f64 {
    let measured: Vec<f64> = flows.iter().map(|f| f.measured).collect();
    let tolerance: Vec<f64> = flows.iter().map(|f| f.tolerance).collect();
    aggregate(&relative(&tolerance, &measured))
}

/// Standard uncertainty of each reconciled value.
pub fn reconciled_sigma(flows: &[Flow]) -> FlowrecResult<Vec<f64>> {
    if flows.is_empty() {
        return Err(FlowrecError::Input("flow list is empty".to_string()));
    }
    for flow in flows {
        if !flow.measured.is_finite() || !flow.tolerance.is_finite() {
            return Err(FlowrecError::Input(format!(
                "{} has measured value {} and tolerance {}; both must be finite",
                flow.label(),
                flow.measured,
                flow.tolerance
            )));
        }
    }
    let incidence = IncidenceMatrix::from_flows(flows)?;
    let a = incidence.to_dense();
    let n = flows.len();

    let variances: Vec<f64> = flows.iter().map(|f| f.tolerance * f.tolerance).collect();
    if variances.iter().any(|v| !v.is_finite()) {
        return Err(FlowrecError::Input("a tolerance is too large to square".to_string()));
    }
    let sigma = DMatrix::from_diagonal(&DVector::from_vec(variances));

    let inner = pseudo_inverse(&a * &sigma * a.transpose())?;
    let b = DMatrix::<f64>::identity(n, n) - &sigma * a.transpose() * inner * &a;
    let propagated = &b * &sigma * b.transpose();

    Ok(propagated
        .diagonal()
        .iter()
        .map(|v| v.max(0.0).sqrt())
        .collect())
}

/// Aggregate relative error of the reconciled values.
pub fn relative_reconciled_error(flows: &[Flow]) -> FlowrecResult<f64> {
    let measured: Vec<f64> = flows.iter().map(|f| f.measured).collect();
    let sigma = reconciled_sigma(flows)?;
    Ok(aggregate(&relative(&sigma, &measured)))
}

pub fn analyze_tolerances(flows: &[Flow]) -> FlowrecResult<ToleranceReport> {
    let measured: Vec<f64> = flows.iter().map(|f| f.measured).collect();
    let tolerance: Vec<f64> = flows.iter().map(|f| f.tolerance).collect();
    let sigma_reconciled = reconciled_sigma(flows)?;

    let relative_tolerances = relative(&tolerance, &measured);
    let relative_tolerances_reconciled = relative(&sigma_reconciled, &measured);

    Ok(ToleranceReport {
        relative_tolerance: aggregate(&relative_tolerances),
        relative_tolerance_reconciled: aggregate(&relative_tolerances_reconciled),
        sigma_reconciled,
        relative_tolerances,
        relative_tolerances_reconciled,
    })
}
