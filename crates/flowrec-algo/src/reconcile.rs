//! Data reconciliation: the closest conserving flow vector.
//!
//! ```text
//! flows ──▶ ReconciliationProblem ──▶ QpBackend ──▶ ReconciledOutputs
//!              (H, d, bounds, A)        (x*)         (values, corrections,
//!                                                     disbalances, GT)
//! ```
//!
//! The reconciled disbalance `‖A·x*‖` should be numerically zero and is
//! reported next to the measured disbalance `‖A·x₀‖` as a correctness check.

use crate::global_test::problem_global_test;
use crate::problem::ReconciliationProblem;
use crate::qp::{ClarabelBackend, QpBackend, QpProblem};
use flowrec_core::{
    find_islands, ConstraintPolicy, EngineEvent, Flow, FlowId, FlowrecResult, GrossErrorType,
    NodeId, Reporter,
};
use serde::{Deserialize, Serialize};
use web_time::Instant;

/// Status string reported for a successful reconciliation.
pub const STATUS_SUCCESS: &str = "Success";

/// One reconciled flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledFlow {
    pub id: FlowId,
    pub name: String,
    pub source: Option<NodeId>,
    pub destination: Option<NodeId>,
    pub measured: f64,
    pub value: f64,
    /// `value - measured`
    pub correction: f64,
    pub tolerance: f64,
    /// Active lower bound for this flow
    #[serde(with = "flowrec_core::bound::lower")]
    pub lower_bound: f64,
    /// Active upper bound for this flow
    #[serde(with = "flowrec_core::bound::upper")]
    pub upper_bound: f64,
    pub is_measured: bool,
    pub is_excluded: bool,
    pub is_artificial: bool,
    /// `None` for ordinary flows
    pub classification: Option<GrossErrorType>,
}

/// Result of one reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledOutputs {
    pub flows: Vec<ReconciledFlow>,
    pub measured_disbalance: f64,
    pub reconciled_disbalance: f64,
    /// Global test of the measured data
    pub global_test: f64,
    pub calculation_time_ms: f64,
    pub iterations: u32,
    pub status: String,
}

impl ReconciledOutputs {
    pub fn flow(&self, id: FlowId) -> Option<&ReconciledFlow> {
        self.flows.iter().find(|f| f.id == id)
    }

    pub fn values(&self) -> Vec<f64> {
        self.flows.iter().map(|f| f.value).collect()
    }
}

/// Reconcile with the default Clarabel backend.
pub fn reconcile(
    flows: &[Flow],
    policy: ConstraintPolicy,
    reporter: &dyn Reporter,
) -> FlowrecResult<ReconciledOutputs> {
    reconcile_with(flows, policy, &ClarabelBackend::default(), reporter)
}

/// Reconcile with an explicit QP backend.
pub fn reconcile_with(
    flows: &[Flow],
    policy: ConstraintPolicy,
    backend: &dyn QpBackend,
    reporter: &dyn Reporter,
) -> FlowrecResult<ReconciledOutputs> {
    let start = Instant::now();
    let problem = ReconciliationProblem::from_flows(flows)?;

    reporter.report(&EngineEvent::TopologyBuilt {
        flows: flows.len(),
        nodes: problem.incidence.n_nodes(),
        islands: find_islands(flows).len(),
    });

    let (lower, upper) = problem.bounds(policy);
    let qp = QpProblem {
        hessian_diag: &problem.hessian_diag,
        linear: &problem.linear,
        equality: problem.incidence.view(),
        equality_rhs: &problem.equality_rhs,
        lower: &lower,
        upper: &upper,
    };
    let solution = backend.solve(&qp)?;

    let measured_disbalance = problem.incidence.disbalance(&problem.measured);
    let reconciled_disbalance = problem.incidence.disbalance(&solution.x);
    let global_test = problem_global_test(&problem)?;

    let reconciled = flows
        .iter()
        .zip(&solution.x)
        .zip(lower.iter().zip(&upper))
        .map(|((flow, &value), (&lower_bound, &upper_bound))| ReconciledFlow {
            id: flow.id,
            name: flow.name.clone(),
            source: flow.source.clone(),
            destination: flow.destination.clone(),
            measured: flow.measured,
            value,
            correction: value - flow.measured,
            tolerance: flow.tolerance,
            lower_bound,
            upper_bound,
            is_measured: flow.is_measured,
            is_excluded: flow.is_excluded,
            is_artificial: flow.is_artificial,
            classification: None,
        })
        .collect();

    let calculation_time_ms = start.elapsed().as_secs_f64() * 1000.0;
    reporter.report(&EngineEvent::ReconciliationSolved {
        backend: backend.name(),
        iterations: solution.iterations,
        measured_disbalance,
        reconciled_disbalance,
        elapsed_ms: calculation_time_ms,
    });

    Ok(ReconciledOutputs {
        flows: reconciled,
        measured_disbalance,
        reconciled_disbalance,
        global_test,
        calculation_time_ms,
        iterations: solution.iterations,
        status: STATUS_SUCCESS.to_string(),
    })
}
