//! Generalized likelihood ratio scoring of candidates.
//!
//! A candidate's score is how much it lowers the global test of the scenario
//! it extends:
//!
//! ```text
//! Δ = GT(flows ∪ chain) − GT(flows ∪ chain ∪ {candidate})
//! ```
//!
//! Candidates are scored independently, so the evaluation runs on the rayon
//! pool. The first failing candidate aborts the whole batch.

use super::candidates::{Candidate, Hypothesis};
use crate::global_test::problem_global_test;
use crate::problem::ReconciliationProblem;
use flowrec_core::{Flow, FlowrecResult};
use rayon::prelude::*;

/// Global test of `scenario` extended by one candidate flow.
pub fn candidate_global_test(scenario: &[Flow], candidate: &Candidate) -> FlowrecResult<f64> {
    let mut flows = Vec::with_capacity(scenario.len() + 1);
    flows.extend_from_slice(scenario);
    flows.push(candidate.flow.clone());
    let problem = ReconciliationProblem::from_flows(&flows)?;
    problem_global_test(&problem)
}

/// Score every candidate against `baseline` and return hypotheses in
/// candidate order.
pub fn score_candidates(
    scenario: &[Flow],
    baseline: f64,
    candidates: Vec<Candidate>,
) -> FlowrecResult<Vec<Hypothesis>> {
    candidates
        .into_par_iter()
        .map(|candidate| {
            let global_test = candidate_global_test(scenario, &candidate)?;
            Ok(Hypothesis {
                flow: candidate.flow,
                kind: candidate.kind,
                glr_delta: baseline - global_test,
                global_test,
            })
        })
        .collect()
}

/// Keep the `branching` hypotheses with the largest delta.
///
/// The sort is stable, so equal deltas keep candidate order.
pub fn select_best(mut scored: Vec<Hypothesis>, branching: usize) -> Vec<Hypothesis> {
    scored.sort_by(|a, b| b.glr_delta.total_cmp(&a.glr_delta));
    scored.truncate(branching);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ged::candidates::generate_candidates;
    use crate::global_test::global_test_for_flows;
    use crate::test_utils::seven_flow_network_with_gross_error;
    use flowrec_core::{ErrorTypeSet, NullReporter};

    #[test]
    fn test_biased_meter_scores_highest() {
        let flows = seven_flow_network_with_gross_error();
        let baseline = global_test_for_flows(&flows, &NullReporter).unwrap();
        assert!((baseline - 2.3631).abs() < 1e-3, "baseline = {}", baseline);

        let candidates = generate_candidates(&flows, &[], ErrorTypeSet::default());
        let scored = score_candidates(&flows, baseline, candidates).unwrap();
        assert_eq!(scored.len(), 7);

        let best = select_best(scored, 2);
        assert_eq!(best.len(), 2);
        assert_eq!(best[0].flow.name, "f3");
        assert_eq!(best[1].flow.name, "f4");
        assert!((best[0].global_test - 0.1082).abs() < 1e-3);
        assert!((best[0].glr_delta - 2.2549).abs() < 1e-3);
        assert!(best[0].glr_delta >= best[1].glr_delta);
    }

    #[test]
    fn test_select_best_is_stable_on_ties() {
        let flows = seven_flow_network_with_gross_error();
        let scored: Vec<Hypothesis> = flows
            .iter()
            .map(|f| Hypothesis {
                flow: f.clone(),
                kind: flowrec_core::GrossErrorType::Measurement,
                glr_delta: 1.0,
                global_test: 1.0,
            })
            .collect();
        let best = select_best(scored, 3);
        let names: Vec<&str> = best.iter().map(|h| h.flow.name.as_str()).collect();
        assert_eq!(names, vec!["f1", "f2", "f3"]);
    }

    #[test]
    fn test_one_failing_candidate_fails_the_batch() {
        let flows = seven_flow_network_with_gross_error();
        let baseline = global_test_for_flows(&flows, &NullReporter).unwrap();

        let mut candidates = generate_candidates(&flows, &[], ErrorTypeSet::default());
        candidates[4].flow.measured = f64::NAN;

        let err = score_candidates(&flows, baseline, candidates).unwrap_err();
        assert!(matches!(err, flowrec_core::FlowrecError::Input(_)), "{:?}", err);
    }
}
