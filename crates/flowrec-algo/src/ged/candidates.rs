//! Artificial-flow candidates for the gross error search.
//!
//! Candidates span every ordered pair `(s, d)`, `s ≠ d`, drawn from the
//! distinct sources × distinct destinations of the physical flows (the
//! environment, `None`, included on both sides):
//!
//! | Pair has a physical flow? | Destination | Candidate |
//! |---------------------------|-------------|-----------|
//! | yes | any | measurement bias on each non-excluded flow of the pair |
//! | no | `None` | leak out of `s` |
//! | no | `Some` | unaccounted flow `s → d` |

use flowrec_core::{ErrorTypeSet, Flow, GrossErrorType, NodeId};
use serde::{Deserialize, Serialize};

/// An artificial flow proposed as one gross error explanation.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub flow: Flow,
    pub kind: GrossErrorType,
}

/// A scored candidate stored in the search tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hypothesis {
    pub flow: Flow,
    pub kind: GrossErrorType,
    /// Reduction of the global test achieved by this hypothesis
    pub glr_delta: f64,
    /// Global test of the scenario including this hypothesis and its ancestors
    pub global_test: f64,
}

impl Hypothesis {
    /// True when `candidate` proposes the same explanation.
    fn duplicates(&self, candidate: &Candidate) -> bool {
        if self.kind != candidate.kind {
            return false;
        }
        match self.kind {
            GrossErrorType::Measurement => self.flow.id == candidate.flow.id,
            GrossErrorType::Leak | GrossErrorType::Unaccounted => self
                .flow
                .connects(candidate.flow.source.as_ref(), candidate.flow.destination.as_ref()),
        }
    }
}

/// Bias correction on an existing meter.
///
/// The artificial flow shares the physical flow's id and endpoints, is
/// unmeasured, and carries every bound shifted by the measured value so that
/// `physical + artificial` stays within the original bounds.
pub fn measurement_candidate(flow: &Flow) -> Candidate {
    let shift = flow.measured;
    Candidate {
        flow: Flow {
            id: flow.id,
            source: flow.source.clone(),
            destination: flow.destination.clone(),
            name: flow.name.clone(),
            measured: 0.0,
            tolerance: flow.tolerance,
            lower_metrological: flow.lower_metrological - shift,
            upper_metrological: flow.upper_metrological - shift,
            lower_technological: flow.lower_technological - shift,
            upper_technological: flow.upper_technological - shift,
            is_measured: false,
            is_excluded: false,
            is_artificial: true,
        },
        kind: GrossErrorType::Measurement,
    }
}

/// Unmodeled loss or gain between two endpoints, with a fresh id.
pub fn unmodeled_candidate(
    source: Option<&NodeId>,
    destination: Option<&NodeId>,
    kind: GrossErrorType,
) -> Candidate {
    let label = |node: Option<&NodeId>| node.map_or("∅".to_string(), |n| n.to_string());
    let mut flow = Flow::new(
        format!("{} {}→{}", kind, label(source), label(destination)),
        0.0,
    )
    .unmeasured()
    .artificial();
    flow.source = source.cloned();
    flow.destination = destination.cloned();

    Candidate { flow, kind }
}

fn distinct<'a>(endpoints: impl Iterator<Item = Option<&'a NodeId>>) -> Vec<Option<&'a NodeId>> {
    let mut out: Vec<Option<&NodeId>> = Vec::new();
    for endpoint in endpoints {
        if !out.contains(&endpoint) {
            out.push(endpoint);
        }
    }
    out
}

/// Every candidate allowed by `types` that is not already part of `chain`.
///
/// `flows` are the physical flows of the request; artificial flows in it are
/// ignored. Candidate order is deterministic: sources in first-seen order,
/// then destinations in first-seen order, then flow order.
pub fn generate_candidates(
    flows: &[Flow],
    chain: &[Hypothesis],
    types: ErrorTypeSet,
) -> Vec<Candidate> {
    let physical: Vec<&Flow> = flows.iter().filter(|f| !f.is_artificial).collect();
    let sources = distinct(physical.iter().map(|f| f.source.as_ref()));
    let destinations = distinct(physical.iter().map(|f| f.destination.as_ref()));

    let mut candidates = Vec::new();
    for &source in &sources {
        for &destination in &destinations {
            if source == destination {
                continue;
            }

            let on_pair: Vec<&&Flow> = physical
                .iter()
                .filter(|f| f.connects(source, destination))
                .collect();

            if !on_pair.is_empty() {
                if types.allows(GrossErrorType::Measurement) {
                    candidates.extend(
                        on_pair
                            .iter()
                            .filter(|f| !f.is_excluded)
                            .map(|f| measurement_candidate(f)),
                    );
                }
            } else if destination.is_none() {
                if types.allows(GrossErrorType::Leak) {
                    candidates.push(unmodeled_candidate(source, None, GrossErrorType::Leak));
                }
            } else if types.allows(GrossErrorType::Unaccounted) {
                candidates.push(unmodeled_candidate(
                    source,
                    destination,
                    GrossErrorType::Unaccounted,
                ));
            }
        }
    }

    candidates.retain(|c| !chain.iter().any(|h| h.duplicates(c)));
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::seven_flow_network;

    #[test]
    fn test_measurement_candidates_cover_every_flow() {
        let flows = seven_flow_network();
        let candidates = generate_candidates(&flows, &[], ErrorTypeSet::default());

        assert_eq!(candidates.len(), 7);
        for c in &candidates {
            assert_eq!(c.kind, GrossErrorType::Measurement);
            assert!(c.flow.is_artificial);
            assert!(!c.flow.is_measured);
            assert_eq!(c.flow.measured, 0.0);
            assert!(flows.iter().any(|f| f.id == c.flow.id));
        }
    }

    #[test]
    fn test_measurement_candidate_shifts_bounds() {
        let flow = Flow::new("f", 6.0)
            .with_source("A")
            .with_technological_bounds(0.0, 100.0)
            .with_metrological_bounds(5.0, 7.0);
        let c = measurement_candidate(&flow);
        assert_eq!(c.flow.lower_technological, -6.0);
        assert_eq!(c.flow.upper_technological, 94.0);
        assert_eq!(c.flow.lower_metrological, -1.0);
        assert_eq!(c.flow.upper_metrological, 1.0);
    }

    #[test]
    fn test_excluded_flows_are_never_candidates() {
        let mut flows = seven_flow_network();
        flows[2].is_excluded = true;
        let candidates = generate_candidates(&flows, &[], ErrorTypeSet::default());
        assert_eq!(candidates.len(), 6);
        assert!(candidates.iter().all(|c| c.flow.id != flows[2].id));
    }

    #[test]
    fn test_leak_and_unaccounted_candidates() {
        let flows = seven_flow_network();
        let types = ErrorTypeSet::from_slice(&[GrossErrorType::Leak, GrossErrorType::Unaccounted]);
        let candidates = generate_candidates(&flows, &[], types);

        // sources {∅, A, B, C} × destinations {A, ∅, B, C}, s ≠ d
        // 12 pairs, 6 of them carry physical flows (f6/f7 share C→∅)
        let leaks = candidates
            .iter()
            .filter(|c| c.kind == GrossErrorType::Leak)
            .count();
        let unaccounted = candidates
            .iter()
            .filter(|c| c.kind == GrossErrorType::Unaccounted)
            .count();
        assert_eq!(leaks, 0);
        assert_eq!(unaccounted, 6);

        for c in &candidates {
            assert!(c.flow.upper_technological.is_infinite());
            assert_eq!(c.flow.lower_technological, 0.0);
            assert_eq!(c.flow.tolerance, 0.0);
        }
    }

    #[test]
    fn test_chain_members_are_skipped() {
        let flows = seven_flow_network();
        let first = measurement_candidate(&flows[2]);
        let chain = vec![Hypothesis {
            flow: first.flow,
            kind: first.kind,
            glr_delta: 1.0,
            global_test: 1.5,
        }];
        let candidates = generate_candidates(&flows, &chain, ErrorTypeSet::default());
        assert_eq!(candidates.len(), 6);
        assert!(candidates.iter().all(|c| c.flow.id != flows[2].id));
    }
}
