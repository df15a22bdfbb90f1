//! # flowrec-algo: Reconciliation and Gross Error Detection
//!
//! Numerical engine for balancing measured flow networks.
//!
//! ## Reconciliation
//!
//! [`reconcile`] finds the flow vector closest to the measurements, weighted by
//! `1/tol²`, that conserves mass at every node and respects the active bounds:
//!
//! | Stage | Module | Output |
//! |-------|--------|--------|
//! | Topology | [`sparse`] | node × flow incidence matrix |
//! | Preparation | [`problem`] | weights, Hessian, linear term, bounds |
//! | Solve | [`qp`] | reconciled values (Clarabel interior point) |
//! | Check | [`global_test`] | normalized χ² statistic |
//!
//! ## Gross Error Detection
//!
//! [`ged`] searches for artificial flows (biased meters, leaks, unaccounted
//! flows) that explain a failing global test. See the [module
//! documentation](ged) for the search outline.
//!
//! ## Tolerance Analysis
//!
//! [`tolerance`] reports how much reconciliation narrows the uncertainty of
//! each flow.
//!
//! ## Example
//!
//! ```ignore
//! use flowrec_algo::{reconcile, ged::{detect_gross_errors, GedSettings}};
//! use flowrec_core::{ConstraintPolicy, TracingReporter};
//!
//! let outputs = reconcile(&flows, ConstraintPolicy::Technological, &TracingReporter)?;
//! println!("disbalance {:.4} → {:.2e}", outputs.measured_disbalance, outputs.reconciled_disbalance);
//!
//! if outputs.global_test >= 1.0 {
//!     let scenarios = detect_gross_errors(&flows, &GedSettings::default(), &TracingReporter)?;
//! }
//! ```

pub mod ged;
pub mod global_test;
pub mod linalg;
pub mod problem;
pub mod qp;
pub mod reconcile;
pub mod sparse;
pub mod test_utils;
pub mod tolerance;

pub use ged::{
    detect_and_reconcile, detect_and_reconcile_with, detect_gross_errors, GedSettings,
    Hypothesis, ReconciledScenario, Scenario,
};
pub use global_test::{chi_squared_quantile, global_test, global_test_for_flows};
pub use problem::{flow_weight, ReconciliationProblem};
pub use qp::{ClarabelBackend, QpBackend, QpBackendKind, QpSettings};
pub use reconcile::{reconcile, reconcile_with, ReconciledFlow, ReconciledOutputs};
pub use sparse::{IncidenceError, IncidenceMatrix};
pub use tolerance::{
    analyze_tolerances, reconciled_sigma, relative_measurement_error, relative_reconciled_error,
    ToleranceReport,
};
