//! Re-reconciliation and classification of detected scenarios.
//!
//! The physical flows plus a scenario's artificial flows are reconciled
//! together. Artificial results are then folded back:
//!
//! | Artificial flow | Result |
//! |-----------------|--------|
//! | id of a physical flow | added to that flow, classified `measurement` |
//! | no destination | appended, classified `leak` |
//! | otherwise | appended, classified `unaccounted` |

use super::search::Scenario;
use crate::qp::QpBackend;
use crate::reconcile::{reconcile_with, ReconciledFlow, ReconciledOutputs};
use flowrec_core::{ConstraintPolicy, EngineEvent, Flow, FlowrecResult, GrossErrorType, Reporter};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// A ranked scenario with its reconciled, classified flows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledScenario {
    /// 1-based position in the ranking
    pub rank: usize,
    pub hypotheses: usize,
    pub global_test: f64,
    pub outputs: ReconciledOutputs,
}

/// Fold the artificial tail of `outputs` into the first `n_physical` flows.
pub fn fold_artificial(mut outputs: ReconciledOutputs, n_physical: usize) -> ReconciledOutputs {
    let artificial = outputs.flows.split_off(n_physical.min(outputs.flows.len()));

    for extra in artificial {
        match outputs.flows.iter_mut().find(|f| f.id == extra.id) {
            Some(physical) => {
                physical.value += extra.value;
                physical.correction = physical.value - physical.measured;
                physical.classification = Some(GrossErrorType::Measurement);
            }
            None => {
                let kind = if extra.destination.is_none() {
                    GrossErrorType::Leak
                } else {
                    GrossErrorType::Unaccounted
                };
                outputs.flows.push(ReconciledFlow {
                    classification: Some(kind),
                    ..extra
                });
            }
        }
    }
    outputs
}

/// Reconcile `flows` together with one scenario's artificial flows.
pub fn reconcile_scenario(
    flows: &[Flow],
    scenario: &Scenario,
    policy: ConstraintPolicy,
    backend: &dyn QpBackend,
    reporter: &dyn Reporter,
) -> FlowrecResult<ReconciledOutputs> {
    let mut extended = flows.to_vec();
    extended.extend(scenario.flows().cloned());
    let outputs = reconcile_with(&extended, policy, backend, reporter)?;
    Ok(fold_artificial(outputs, flows.len()))
}

/// Reconcile every scenario, preserving ranking order.
pub fn reconcile_scenarios(
    flows: &[Flow],
    scenarios: &[Scenario],
    policy: ConstraintPolicy,
    backend: &dyn QpBackend,
    reporter: &dyn Reporter,
) -> FlowrecResult<Vec<ReconciledScenario>> {
    scenarios
        .par_iter()
        .enumerate()
        .map(|(i, scenario)| {
            let outputs = reconcile_scenario(flows, scenario, policy, backend, reporter)?;
            let rank = i + 1;
            reporter.report(&EngineEvent::ScenarioReconciled {
                rank,
                hypotheses: scenario.len(),
                global_test: scenario.global_test,
            });
            Ok(ReconciledScenario {
                rank,
                hypotheses: scenario.len(),
                global_test: scenario.global_test,
                outputs,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ged::candidates::{measurement_candidate, unmodeled_candidate, Candidate, Hypothesis};
    use crate::qp::ClarabelBackend;
    use crate::test_utils::seven_flow_network_with_gross_error;
    use flowrec_core::{NodeId, NullReporter};

    fn scenario_of(candidates: Vec<Candidate>) -> Scenario {
        Scenario {
            hypotheses: candidates
                .into_iter()
                .map(|c| Hypothesis {
                    flow: c.flow,
                    kind: c.kind,
                    glr_delta: 0.0,
                    global_test: 0.5,
                })
                .collect(),
            global_test: 0.5,
        }
    }

    #[test]
    fn test_measurement_error_is_folded() {
        let flows = seven_flow_network_with_gross_error();
        let scenario = scenario_of(vec![measurement_candidate(&flows[2])]);
        let out = reconcile_scenario(
            &flows,
            &scenario,
            ConstraintPolicy::Technological,
            &ClarabelBackend::default(),
            &NullReporter,
        )
        .unwrap();

        assert_eq!(out.flows.len(), flows.len());
        let f3 = &out.flows[2];
        assert_eq!(f3.classification, Some(GrossErrorType::Measurement));
        assert!((f3.correction - (f3.value - f3.measured)).abs() < 1e-9);
        assert_eq!(
            out.flows.iter().filter(|f| f.classification.is_some()).count(),
            1
        );

        // f3 absorbs the imbalance around A: f1 - f2 - f3 = 0
        let balance = out.flows[0].value - out.flows[1].value - f3.value;
        assert!(balance.abs() < 1e-5, "balance = {}", balance);
    }

    #[test]
    fn test_leak_and_unaccounted_are_appended() {
        let flows = seven_flow_network_with_gross_error();
        let a = NodeId::new("A");
        let b = NodeId::new("B");
        let scenario = scenario_of(vec![
            unmodeled_candidate(Some(&a), None, GrossErrorType::Leak),
            unmodeled_candidate(Some(&a), Some(&b), GrossErrorType::Unaccounted),
        ]);
        let out = reconcile_scenario(
            &flows,
            &scenario,
            ConstraintPolicy::Technological,
            &ClarabelBackend::default(),
            &NullReporter,
        )
        .unwrap();

        assert_eq!(out.flows.len(), flows.len() + 2);
        assert_eq!(out.flows[7].classification, Some(GrossErrorType::Leak));
        assert_eq!(
            out.flows[8].classification,
            Some(GrossErrorType::Unaccounted)
        );
        assert!(out.flows[..7].iter().all(|f| f.classification.is_none()));
    }
}
