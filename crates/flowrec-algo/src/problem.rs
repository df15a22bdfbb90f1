//! Weighted least-squares formulation of the reconciliation problem.
//!
//! ```text
//! minimize    ½ xᵀ H x + dᵀ x
//! subject to  A x = 0                  (conservation at every node)
//!             l ≤ x ≤ u                (per-flow box)
//!
//! H = diag(mᵢ · wᵢ)      mᵢ = 1 if measured else 0
//! d = -H · x₀            wᵢ = 1 / tolᵢ²
//! ```
//!
//! Up to a constant this is `Σ mᵢ wᵢ (xᵢ - x₀ᵢ)² / 2`, the weighted squared
//! deviation from the measurements.

use crate::sparse::IncidenceMatrix;
use flowrec_core::{ConstraintPolicy, Flow, FlowrecError, FlowrecResult};

/// Per-request QP data derived from a flow list. Immutable once built.
#[derive(Debug, Clone)]
pub struct ReconciliationProblem {
    pub measured: Vec<f64>,
    pub tolerances: Vec<f64>,
    /// 1.0 for measured flows, 0.0 otherwise
    pub measure_indicator: Vec<f64>,
    pub weights: Vec<f64>,
    /// Diagonal of H
    pub hessian_diag: Vec<f64>,
    /// d = -H · x₀
    pub linear: Vec<f64>,
    pub lower_metrological: Vec<f64>,
    pub upper_metrological: Vec<f64>,
    pub lower_technological: Vec<f64>,
    pub upper_technological: Vec<f64>,
    pub incidence: IncidenceMatrix,
    /// Conservation targets, one zero per node
    pub equality_rhs: Vec<f64>,
}

/// Weight of a single flow: `1/tol²` for measured flows, 1.0 when the flow is
/// unmeasured or the weight would be infinite.
pub fn flow_weight(flow: &Flow) -> FlowrecResult<f64> {
    if !flow.is_measured {
        return Ok(1.0);
    }
    let weight = 1.0 / flow.tolerance.powi(2);
    if weight.is_nan() {
        return Err(FlowrecError::Input(format!(
            "{} has tolerance {} which yields a NaN weight",
            flow.label(),
            flow.tolerance
        )));
    }
    if weight.is_infinite() {
        Ok(1.0)
    } else {
        Ok(weight)
    }
}

impl ReconciliationProblem {
    pub fn from_flows(flows: &[Flow]) -> FlowrecResult<Self> {
        if flows.is_empty() {
            return Err(FlowrecError::Input("flow list is empty".to_string()));
        }
        for flow in flows {
            flow.validate()?;
        }

        let incidence = IncidenceMatrix::from_flows(flows)?;
        let n = flows.len();

        let mut measured = Vec::with_capacity(n);
        let mut tolerances = Vec::with_capacity(n);
        let mut measure_indicator = Vec::with_capacity(n);
        let mut weights = Vec::with_capacity(n);
        let mut lower_metrological = Vec::with_capacity(n);
        let mut upper_metrological = Vec::with_capacity(n);
        let mut lower_technological = Vec::with_capacity(n);
        let mut upper_technological = Vec::with_capacity(n);

        for flow in flows {
            measured.push(flow.measured);
            tolerances.push(flow.tolerance);
            measure_indicator.push(if flow.is_measured { 1.0 } else { 0.0 });
            weights.push(flow_weight(flow)?);
            lower_metrological.push(flow.lower_metrological);
            upper_metrological.push(flow.upper_metrological);
            lower_technological.push(flow.lower_technological);
            upper_technological.push(flow.upper_technological);
        }

        let hessian_diag: Vec<f64> = measure_indicator
            .iter()
            .zip(&weights)
            .map(|(m, w)| m * w)
            .collect();
        let linear = hessian_diag
            .iter()
            .zip(&measured)
            .map(|(h, x0)| -h * x0)
            .collect();
        let equality_rhs = vec![0.0; incidence.n_nodes()];

        Ok(Self {
            measured,
            tolerances,
            measure_indicator,
            weights,
            hessian_diag,
            linear,
            lower_metrological,
            upper_metrological,
            lower_technological,
            upper_technological,
            incidence,
            equality_rhs,
        })
    }

    pub fn n_flows(&self) -> usize {
        self.measured.len()
    }

    pub fn is_measured(&self, idx: usize) -> bool {
        self.measure_indicator[idx] != 0.0
    }

    /// Bound vectors `(lower, upper)` selected per flow by the policy.
    ///
    /// Technological bounds apply when the policy asks for them or when the
    /// flow is unmeasured; otherwise the metrological interval is used.
    pub fn bounds(&self, policy: ConstraintPolicy) -> (Vec<f64>, Vec<f64>) {
        (0..self.n_flows())
            .map(|i| {
                if policy == ConstraintPolicy::Technological || !self.is_measured(i) {
                    (self.lower_technological[i], self.upper_technological[i])
                } else {
                    (self.lower_metrological[i], self.upper_metrological[i])
                }
            })
            .unzip()
    }

    /// Objective value `½ xᵀHx + dᵀx` at `x`.
    pub fn objective(&self, x: &[f64]) -> f64 {
        self.hessian_diag
            .iter()
            .zip(&self.linear)
            .zip(x)
            .map(|((h, d), xi)| 0.5 * h * xi * xi + d * xi)
            .sum()
    }
}
