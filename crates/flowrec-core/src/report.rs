//! Engine events and the injected reporter interface.
//!
//! Algorithms never touch process-wide logging state. Each entry point takes
//! a `&dyn Reporter` and emits [`EngineEvent`]s through it; the caller decides
//! whether they become `tracing` records, are collected for a test, or are
//! dropped.

use parking_lot::Mutex;

/// Events emitted by the reconciliation and detection engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Topology inferred from the flow list.
    TopologyBuilt {
        flows: usize,
        nodes: usize,
        islands: usize,
    },

    /// A QP reconciliation finished successfully.
    ReconciliationSolved {
        backend: &'static str,
        iterations: u32,
        measured_disbalance: f64,
        reconciled_disbalance: f64,
        elapsed_ms: f64,
    },

    /// A global test statistic was evaluated on the unmodified flow set.
    GlobalTestComputed { nodes: usize, value: f64 },

    /// Candidate hypotheses scored for one tree node.
    CandidatesScored {
        height: usize,
        candidates: usize,
        kept: usize,
    },

    /// One tree level finished expanding.
    LevelExpanded {
        height: usize,
        expanded: usize,
        solved: usize,
    },

    /// The branching search finished.
    SearchFinished {
        tree_nodes: usize,
        scenarios: usize,
        elapsed_ms: f64,
    },

    /// A detected scenario was re-reconciled and classified.
    ScenarioReconciled {
        rank: usize,
        hypotheses: usize,
        global_test: f64,
    },
}

impl EngineEvent {
    pub fn name(&self) -> &'static str {
        match self {
            EngineEvent::TopologyBuilt { .. } => "topology_built",
            EngineEvent::ReconciliationSolved { .. } => "reconciliation_solved",
            EngineEvent::GlobalTestComputed { .. } => "global_test_computed",
            EngineEvent::CandidatesScored { .. } => "candidates_scored",
            EngineEvent::LevelExpanded { .. } => "level_expanded",
            EngineEvent::SearchFinished { .. } => "search_finished",
            EngineEvent::ScenarioReconciled { .. } => "scenario_reconciled",
        }
    }
}

/// Observer for engine events. Shared across worker threads.
pub trait Reporter: Send + Sync {
    fn report(&self, event: &EngineEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&self, _event: &EngineEvent) {}
}

/// Forwards events to the `tracing` subscriber installed by the binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, event: &EngineEvent) {
        match *event {
            EngineEvent::TopologyBuilt {
                flows,
                nodes,
                islands,
            } => {
                if islands > 1 {
                    tracing::warn!(flows, nodes, islands, "flow network is not connected");
                } else {
                    tracing::debug!(flows, nodes, islands, "topology built");
                }
            }
            EngineEvent::ReconciliationSolved {
                backend,
                iterations,
                measured_disbalance,
                reconciled_disbalance,
                elapsed_ms,
            } => tracing::info!(
                backend,
                iterations,
                measured_disbalance,
                reconciled_disbalance,
                elapsed_ms,
                "reconciliation solved"
            ),
            EngineEvent::GlobalTestComputed { nodes, value } => {
                tracing::debug!(nodes, value, "global test computed")
            }
            EngineEvent::CandidatesScored {
                height,
                candidates,
                kept,
            } => tracing::debug!(height, candidates, kept, "candidates scored"),
            EngineEvent::LevelExpanded {
                height,
                expanded,
                solved,
            } => tracing::info!(height, expanded, solved, "search level expanded"),
            EngineEvent::SearchFinished {
                tree_nodes,
                scenarios,
                elapsed_ms,
            } => tracing::info!(tree_nodes, scenarios, elapsed_ms, "gross error search finished"),
            EngineEvent::ScenarioReconciled {
                rank,
                hypotheses,
                global_test,
            } => tracing::debug!(rank, hypotheses, global_test, "scenario reconciled"),
        }
    }
}

/// Keeps every event in memory. Useful for tests and for embedding callers
/// that want to inspect the search after the fact.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<EngineEvent>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.lock().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.events().iter().filter(|e| e.name() == name).count()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, event: &EngineEvent) {
        self.events.lock().push(event.clone());
    }
}
