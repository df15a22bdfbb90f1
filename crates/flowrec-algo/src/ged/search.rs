//! Level-by-level branching search.
//!
//! ```text
//! height 0   [root]                       GT₀ ≥ 1, expand
//!              │
//! height 1   [h₁] [h₂] [h₃] ...           top `branching` by Δ
//!              │    ✓    │
//! height 2   [..]      [..]               only GT ≥ 1 nodes are expanded
//! ```
//!
//! Each level is a barrier: every frontier node is expanded on the rayon pool
//! and the next level starts only after all of them have finished. Nodes whose
//! scenario already passes the global test are frozen as solutions.

use super::candidates::{generate_candidates, Hypothesis};
use super::glr::{score_candidates, select_best};
use super::settings::GedSettings;
use super::tree::{SearchTree, ROOT};
use crate::global_test::global_test_for_flows;
use flowrec_core::{EngineEvent, Flow, FlowrecError, FlowrecResult, Reporter};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use web_time::Instant;

/// Acceptance threshold of the normalized global test.
pub const THRESHOLD: f64 = 1.0;

/// One explanation of the observed disbalance: the hypotheses on a
/// root-to-leaf path whose combined scenario passes the global test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub hypotheses: Vec<Hypothesis>,
    pub global_test: f64,
}

impl Scenario {
    pub fn len(&self) -> usize {
        self.hypotheses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hypotheses.is_empty()
    }

    /// Artificial flows of this scenario, root first.
    pub fn flows(&self) -> impl Iterator<Item = &Flow> {
        self.hypotheses.iter().map(|h| &h.flow)
    }
}

/// Search state shared by the workers of one request.
struct Search<'a> {
    flows: &'a [Flow],
    settings: &'a GedSettings,
    reporter: &'a dyn Reporter,
    tree: SearchTree,
    baseline: f64,
}

impl Search<'_> {
    /// Expand one node and return how many of its new children pass the test.
    fn expand(&self, idx: usize, height: usize) -> FlowrecResult<usize> {
        let chain = self.tree.chain(idx)?;
        let baseline = chain.last().map_or(self.baseline, |h| h.global_test);

        let mut scenario = self.flows.to_vec();
        scenario.extend(chain.iter().map(|h| h.flow.clone()));

        let candidates = generate_candidates(self.flows, &chain, self.settings.error_type_set());
        let n_candidates = candidates.len();
        let scored = score_candidates(&scenario, baseline, candidates)?;
        let children = select_best(scored, self.settings.branching);

        self.reporter.report(&EngineEvent::CandidatesScored {
            height,
            candidates: n_candidates,
            kept: children.len(),
        });

        let solved = children
            .iter()
            .filter(|h| h.global_test < THRESHOLD)
            .count();
        self.tree.append_children(idx, children)?;
        Ok(solved)
    }

    fn frontier(&self, height: usize) -> FlowrecResult<Vec<usize>> {
        let mut live = Vec::new();
        for idx in self.tree.nodes_at_height(height) {
            if self.tree.hypothesis(idx)?.global_test >= THRESHOLD {
                live.push(idx);
            }
        }
        Ok(live)
    }

    fn run(&self) -> FlowrecResult<()> {
        let mut solved = self.expand(ROOT, 0)?;
        self.reporter.report(&EngineEvent::LevelExpanded {
            height: 0,
            expanded: 1,
            solved,
        });

        for height in 1..self.settings.max_tree_height {
            if solved >= self.settings.max_solutions {
                break;
            }
            let frontier = self.frontier(height)?;
            if frontier.is_empty() {
                break;
            }

            let counts = frontier
                .par_iter()
                .map(|&idx| self.expand(idx, height))
                .collect::<FlowrecResult<Vec<usize>>>()?;
            let level_solved: usize = counts.iter().sum();
            solved += level_solved;

            self.reporter.report(&EngineEvent::LevelExpanded {
                height,
                expanded: frontier.len(),
                solved: level_solved,
            });
        }
        Ok(())
    }

    /// Accepted leaves, ranked.
    fn scenarios(&self) -> FlowrecResult<Vec<Scenario>> {
        let mut ranked: Vec<(Vec<usize>, Scenario)> = Vec::new();
        for leaf in self.tree.leaves() {
            let hypotheses = self.tree.chain(leaf)?;
            let global_test = match hypotheses.last() {
                Some(h) => h.global_test,
                None => {
                    return Err(FlowrecError::Invariant(format!(
                        "leaf {} has an empty hypothesis chain",
                        leaf
                    )))
                }
            };
            if global_test < THRESHOLD {
                ranked.push((
                    self.tree.rank_path(leaf)?,
                    Scenario {
                        hypotheses,
                        global_test,
                    },
                ));
            }
        }

        ranked.sort_by(|(path_a, a), (path_b, b)| {
            compare_scenarios(a, b).then_with(|| path_a.cmp(path_b))
        });
        Ok(ranked.into_iter().map(|(_, s)| s).collect())
    }
}

/// Run the branching search and return ranked scenarios.
///
/// Scenarios are ordered by hypothesis count, then by ascending global test.
/// An empty list means the measured data already pass the test.
pub fn run_search(
    flows: &[Flow],
    settings: &GedSettings,
    reporter: &dyn Reporter,
) -> FlowrecResult<Vec<Scenario>> {
    settings.validate()?;
    if flows.is_empty() {
        return Err(FlowrecError::Input("flow list is empty".to_string()));
    }

    let start = Instant::now();
    let baseline = global_test_for_flows(flows, reporter)?;
    if baseline < THRESHOLD {
        reporter.report(&EngineEvent::SearchFinished {
            tree_nodes: 1,
            scenarios: 0,
            elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
        });
        return Ok(Vec::new());
    }

    let search = Search {
        flows,
        settings,
        reporter,
        tree: SearchTree::new(),
        baseline,
    };
    search.run()?;
    let scenarios = search.scenarios()?;

    reporter.report(&EngineEvent::SearchFinished {
        tree_nodes: search.tree.len(),
        scenarios: scenarios.len(),
        elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
    });
    Ok(scenarios)
}

/// Ranking order used by [`run_search`].
pub fn compare_scenarios(a: &Scenario, b: &Scenario) -> Ordering {
    a.len()
        .cmp(&b.len())
        .then_with(|| a.global_test.total_cmp(&b.global_test))
}
