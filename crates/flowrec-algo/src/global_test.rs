//! Global test for gross errors.
//!
//! Under the hypothesis that every meter only carries random noise, the node
//! residual vector `r = A·x₀` is zero-mean Gaussian with covariance
//! `V = A·Σ·Aᵀ`, so `rᵀV⁻¹r` follows a χ² distribution with one degree of
//! freedom per node. The statistic is reported normalized by the 95% quantile:
//!
//! ```text
//! GT = rᵀ V⁺ r / χ²₀.₉₅(n_nodes)
//!
//! GT < 1   disbalance explained by noise
//! GT ≥ 1   a gross error is likely present
//! ```
//!
//! Standard deviations are `tol/1.96` for measured flows. Unmeasured flows get
//! `100 · max(x₀)`, large enough that the residual is never blamed on them.

use crate::linalg::{pseudo_inverse, sandwich_diag};
use crate::problem::ReconciliationProblem;
use crate::sparse::IncidenceMatrix;
use flowrec_core::{EngineEvent, Flow, FlowrecError, FlowrecResult, Reporter};
use nalgebra::DVector;
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Confidence level of the acceptance test.
pub const CONFIDENCE: f64 = 0.95;

/// z-score turning a 95% half-width into a standard deviation.
const Z_95: f64 = 1.96;

/// Scale of the fallback deviation assigned to unmeasured flows.
const UNMEASURED_STD_FACTOR: f64 = 100.0;

/// Normalized global test statistic.
///
/// `measurability[i]` is nonzero for measured flows. All slices are indexed by
/// the incidence matrix columns.
pub fn global_test(
    measured: &[f64],
    incidence: &IncidenceMatrix,
    measurability: &[f64],
    tolerance: &[f64],
) -> FlowrecResult<f64> {
    let n = incidence.n_flows();
    if measured.len() != n || measurability.len() != n || tolerance.len() != n {
        return Err(FlowrecError::Input(format!(
            "global test inputs disagree on size: {} flows, {} measured, {} flags, {} tolerances",
            n,
            measured.len(),
            measurability.len(),
            tolerance.len()
        )));
    }

    let variances = flow_variances(measured, measurability, tolerance)?;

    let a = incidence.to_dense();
    let r = DVector::from_vec(incidence.residuals(measured));
    let v = sandwich_diag(&a, &variances);
    let v_pinv = pseudo_inverse(v)?;
    let statistic = r.dot(&(v_pinv * &r)) / chi_squared_quantile(incidence.n_nodes())?;
    if !statistic.is_finite() {
        return Err(FlowrecError::Input(format!(
            "global test statistic is not finite ({})",
            statistic
        )));
    }
    Ok(statistic)
}

/// Global test on a flow list.
pub fn global_test_for_flows(flows: &[Flow], reporter: &dyn Reporter) -> FlowrecResult<f64> {
    let problem = ReconciliationProblem::from_flows(flows)?;
    let value = problem_global_test(&problem)?;
    reporter.report(&EngineEvent::GlobalTestComputed {
        nodes: problem.incidence.n_nodes(),
        value,
    });
    Ok(value)
}

pub(crate) fn problem_global_test(problem: &ReconciliationProblem) -> FlowrecResult<f64> {
    global_test(
        &problem.measured,
        &problem.incidence,
        &problem.measure_indicator,
        &problem.tolerances,
    )
}

/// Per-flow variance used by the test.
///
/// Measured values, tolerances of measured flows and the resulting variances
/// must all be finite.
fn flow_variances(
    measured: &[f64],
    measurability: &[f64],
    tolerance: &[f64],
) -> FlowrecResult<Vec<f64>> {
    if let Some((i, x0)) = measured.iter().enumerate().find(|(_, x)| !x.is_finite()) {
        return Err(FlowrecError::Input(format!(
            "flow {} has a non-finite measured value {}",
            i, x0
        )));
    }

    let max_measured = measured.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let mut fallback = UNMEASURED_STD_FACTOR * max_measured;
    if !(fallback.is_finite() && fallback > 0.0) {
        fallback = 1.0;
    }

    measurability
        .iter()
        .zip(tolerance)
        .enumerate()
        .map(|(i, (&m, &tol))| {
            if m != 0.0 && !tol.is_finite() {
                return Err(FlowrecError::Input(format!(
                    "flow {} has a non-finite tolerance {}",
                    i, tol
                )));
            }
            let std = if m != 0.0 { tol / Z_95 } else { fallback };
            let variance = std * std;
            if !variance.is_finite() {
                return Err(FlowrecError::Input(format!(
                    "variance of flow {} overflows (deviation {})",
                    i, std
                )));
            }
            Ok(variance)
        })
        .collect()
}

/// `χ²` quantile at [`CONFIDENCE`] with one degree of freedom per node.
pub fn chi_squared_quantile(nodes: usize) -> FlowrecResult<f64> {
    let dist = ChiSquared::new(nodes as f64).map_err(|e| {
        FlowrecError::Input(format!("invalid χ² degrees of freedom {}: {}", nodes, e))
    })?;
    Ok(dist.inverse_cdf(CONFIDENCE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{seven_flow_network, seven_flow_network_with_gross_error};
    use flowrec_core::{NullReporter, RecordingReporter};

    #[test]
    fn test_chi_squared_quantile_three_nodes() {
        let q = chi_squared_quantile(3).unwrap();
        assert!((q - 7.814727903251178).abs() < 1e-6, "q = {}", q);
    }

    #[test]
    fn test_seven_flow_network_passes() {
        let gt = global_test_for_flows(&seven_flow_network(), &NullReporter).unwrap();
        assert!((gt - 0.1552).abs() < 1e-3, "gt = {}", gt);
        assert!(gt < 1.0);
    }

    #[test]
    fn test_tight_tolerance_fails() {
        let reporter = RecordingReporter::new();
        let gt = global_test_for_flows(&seven_flow_network_with_gross_error(), &reporter).unwrap();
        assert!((gt - 2.3631).abs() < 1e-3, "gt = {}", gt);
        assert_eq!(reporter.count("global_test_computed"), 1);
    }

    #[test]
    fn test_balanced_measurements_score_zero() {
        let flows = vec![
            Flow::new("in", 10.0).with_destination("A").with_tolerance(0.1),
            Flow::new("out", 10.0).with_source("A").with_tolerance(0.1),
        ];
        let gt = global_test_for_flows(&flows, &NullReporter).unwrap();
        assert!(gt.abs() < 1e-12);
    }

    #[test]
    fn test_unmeasured_flow_absorbs_disbalance() {
        let flows = vec![
            Flow::new("in", 10.0).with_destination("A").with_tolerance(0.1),
            Flow::new("out", 9.0).with_source("A").with_tolerance(0.1),
            Flow::new("vent", 0.0).with_source("A").unmeasured(),
        ];
        let gt = global_test_for_flows(&flows, &NullReporter).unwrap();
        assert!(gt < 1e-3, "gt = {}", gt);
    }

    #[test]
    fn test_nan_tolerance_is_input_error() {
        let flows = seven_flow_network();
        let inc = IncidenceMatrix::from_flows(&flows).unwrap();
        let measured: Vec<f64> = flows.iter().map(|f| f.measured).collect();
        let mut tolerance: Vec<f64> = flows.iter().map(|f| f.tolerance).collect();
        tolerance[0] = f64::NAN;

        let err = global_test(&measured, &inc, &[1.0; 7], &tolerance).unwrap_err();
        assert!(matches!(err, FlowrecError::Input(_)), "{:?}", err);
    }

    #[test]
    fn test_infinite_tolerance_is_input_error() {
        let mut flows = seven_flow_network();
        flows[2].tolerance = f64::INFINITY;
        let err = global_test_for_flows(&flows, &NullReporter).unwrap_err();
        assert!(matches!(err, FlowrecError::Input(_)), "{:?}", err);
    }

    #[test]
    fn test_non_finite_measured_is_input_error() {
        let mut flows = seven_flow_network();
        flows[4].measured = f64::NAN;
        let err = global_test_for_flows(&flows, &NullReporter).unwrap_err();
        assert!(matches!(err, FlowrecError::Input(_)), "{:?}", err);
    }

    #[test]
    fn test_unmeasured_variance_overflow_is_input_error() {
        let flows = vec![
            Flow::new("in", 1e154).with_destination("A").with_tolerance(1e151),
            Flow::new("out", 1e154).with_source("A").with_tolerance(1e151),
            Flow::new("vent", 0.0).with_source("A").unmeasured(),
        ];
        let err = global_test_for_flows(&flows, &NullReporter).unwrap_err();
        assert!(matches!(err, FlowrecError::Input(_)), "{:?}", err);
    }

    #[test]
    fn test_size_mismatch_is_input_error() {
        let flows = seven_flow_network();
        let inc = IncidenceMatrix::from_flows(&flows).unwrap();
        let err = global_test(&[1.0], &inc, &[1.0], &[0.1]).unwrap_err();
        assert!(matches!(err, FlowrecError::Input(_)));
    }
}
