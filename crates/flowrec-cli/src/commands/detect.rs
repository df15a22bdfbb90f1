use std::path::Path;

use anyhow::{Context, Result};
use flowrec_algo::ged::{detect_and_reconcile_with, detect_gross_errors};
use flowrec_algo::GedSettings;
use flowrec_cli::{io, FlowrecConfig};
use flowrec_core::{ConstraintPolicy, GrossErrorType, TracingReporter};
use tracing::info;

use crate::commands::util::backend;

/// Command-line values that take precedence over the request and config.
#[derive(Debug, Default)]
pub struct Overrides {
    pub branching: Option<usize>,
    pub max_height: Option<usize>,
    pub max_solutions: Option<usize>,
    pub error_types: Vec<GrossErrorType>,
    pub policy: Option<ConstraintPolicy>,
}

impl Overrides {
    fn apply(&self, mut settings: GedSettings) -> GedSettings {
        if let Some(branching) = self.branching {
            settings.branching = branching;
        }
        if let Some(height) = self.max_height {
            settings.max_tree_height = height;
        }
        if let Some(solutions) = self.max_solutions {
            settings.max_solutions = solutions;
        }
        if !self.error_types.is_empty() {
            settings.error_types = self.error_types.clone();
        }
        settings
    }
}

pub fn handle(
    config: &FlowrecConfig,
    input: &Path,
    overrides: Overrides,
    reconcile: bool,
    out: Option<&Path>,
) -> Result<()> {
    let request = io::read_request(input)?;
    let settings = overrides.apply(
        request
            .settings
            .clone()
            .unwrap_or_else(|| config.detection.to_settings()),
    );

    info!(
        "Searching {} flows for gross errors (branching {}, height {}, solutions {})",
        request.flows.len(),
        settings.branching,
        settings.max_tree_height,
        settings.max_solutions
    );

    if reconcile {
        let policy = overrides
            .policy
            .or(request.constraint_policy)
            .unwrap_or(config.reconcile.constraint_policy);
        let backend = backend(config);
        let results = detect_and_reconcile_with(
            &request.flows,
            policy,
            &settings,
            backend.as_ref(),
            &TracingReporter,
        )
        .context("gross error detection failed")?;
        info!("{} scenario(s) reconciled", results.len());
        io::write_json(&results, out)
    } else {
        let scenarios = detect_gross_errors(&request.flows, &settings, &TracingReporter)
            .context("gross error detection failed")?;
        info!("{} scenario(s) found", scenarios.len());
        io::write_json(&scenarios, out)
    }
}
