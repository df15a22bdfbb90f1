use std::path::Path;

use anyhow::{Context, Result};
use flowrec_algo::reconcile_with;
use flowrec_cli::{io, FlowrecConfig, PolicyArg};
use flowrec_core::TracingReporter;
use tracing::info;

use crate::commands::util::backend;

pub fn handle(
    config: &FlowrecConfig,
    input: &Path,
    policy: Option<PolicyArg>,
    out: Option<&Path>,
) -> Result<()> {
    let request = io::read_request(input)?;
    let policy = policy
        .map(Into::into)
        .or(request.constraint_policy)
        .unwrap_or(config.reconcile.constraint_policy);
    let backend = backend(config);

    info!(
        "Reconciling {} flows from {} ({:?} bounds)",
        request.flows.len(),
        input.display(),
        policy
    );
    let outputs = reconcile_with(&request.flows, policy, backend.as_ref(), &TracingReporter)
        .context("reconciliation failed")?;
    info!(
        "Disbalance {:.6} -> {:.3e}, global test {:.4}",
        outputs.measured_disbalance, outputs.reconciled_disbalance, outputs.global_test
    );

    io::write_json(&outputs, out)
}
