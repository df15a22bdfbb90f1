use std::path::Path;

use anyhow::{Context, Result};
use flowrec_algo::analyze_tolerances;
use flowrec_cli::io;
use tracing::info;

pub fn handle(input: &Path, out: Option<&Path>) -> Result<()> {
    let request = io::read_request(input)?;
    let report = analyze_tolerances(&request.flows).context("analyzing tolerances")?;
    info!(
        "Relative error {:.3}% -> {:.3}% after reconciliation",
        report.relative_tolerance, report.relative_tolerance_reconciled
    );
    io::write_json(&report, out)
}
