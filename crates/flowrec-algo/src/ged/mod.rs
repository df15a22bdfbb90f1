//! Gross Error Detection (GED)
//!
//! Finds the smallest sets of artificial flows that make a failing network
//! pass the global test, and ranks them as candidate explanations.
//!
//! ## Search Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GROSS ERROR DETECTION                                                   │
//! │  ─────────────────────                                                   │
//! │                                                                          │
//! │  1. GT₀ = global test of the measured flows                              │
//! │       GT₀ < 1  →  no gross error, empty result                           │
//! │                                                                          │
//! │  2. Candidates for the current scenario                                  │
//! │       • measurement bias on a physical flow                             │
//! │       • leak from a node to the environment                             │
//! │       • unaccounted flow between two nodes                              │
//! │                                                                          │
//! │  3. GLR score  Δ = GT(scenario) − GT(scenario + candidate)               │
//! │       keep the `branching` best as children                              │
//! │                                                                          │
//! │  4. Deepen every child with GT ≥ 1 up to `max_tree_height`               │
//! │                                                                          │
//! │  5. Leaves with GT < 1 are scenarios, ranked by                          │
//! │       (hypothesis count ↑, GT ↑)                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use flowrec_algo::ged::{detect_gross_errors, GedSettings};
//! use flowrec_core::TracingReporter;
//!
//! let scenarios = detect_gross_errors(&flows, &GedSettings::default(), &TracingReporter)?;
//! if let Some(best) = scenarios.first() {
//!     for h in &best.hypotheses {
//!         println!("{} on {}", h.kind, h.flow.name);
//!     }
//! }
//! ```
//!
//! ## References
//!
//! - **Narasimhan & Jordache (2000)**: "Data Reconciliation and Gross Error
//!   Detection: An Intelligent Use of Process Data"
//!   - Global test and GLR formulation
//!
//! - **Kongsjahju & Rollins (2000)**: "Accurate identification of biased
//!   measurements under serial correlation"

mod aggregate;
mod candidates;
mod glr;
mod search;
mod settings;
mod tree;

pub use aggregate::{fold_artificial, reconcile_scenario, reconcile_scenarios, ReconciledScenario};
pub use candidates::{
    generate_candidates, measurement_candidate, unmodeled_candidate, Candidate, Hypothesis,
};
pub use glr::{candidate_global_test, score_candidates, select_best};
pub use search::{compare_scenarios, run_search, Scenario, THRESHOLD};
pub use settings::GedSettings;
pub use tree::{SearchTree, TreeNode, ROOT};

use crate::qp::{ClarabelBackend, QpBackend};
use flowrec_core::{ConstraintPolicy, Flow, FlowrecResult, Reporter};

/// Ranked gross error scenarios for `flows`.
pub fn detect_gross_errors(
    flows: &[Flow],
    settings: &GedSettings,
    reporter: &dyn Reporter,
) -> FlowrecResult<Vec<Scenario>> {
    run_search(flows, settings, reporter)
}

/// Detect gross errors and reconcile every scenario with the default backend.
pub fn detect_and_reconcile(
    flows: &[Flow],
    policy: ConstraintPolicy,
    settings: &GedSettings,
    reporter: &dyn Reporter,
) -> FlowrecResult<Vec<ReconciledScenario>> {
    detect_and_reconcile_with(flows, policy, settings, &ClarabelBackend::default(), reporter)
}

/// Detect gross errors and reconcile every scenario with `backend`.
pub fn detect_and_reconcile_with(
    flows: &[Flow],
    policy: ConstraintPolicy,
    settings: &GedSettings,
    backend: &dyn QpBackend,
    reporter: &dyn Reporter,
) -> FlowrecResult<Vec<ReconciledScenario>> {
    let scenarios = run_search(flows, settings, reporter)?;
    reconcile_scenarios(flows, &scenarios, policy, backend, reporter)
}
