use std::path::Path;

use anyhow::{Context, Result};
use flowrec_algo::{ged::THRESHOLD, global_test_for_flows};
use flowrec_cli::io;
use flowrec_core::{node_order, TracingReporter};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GlobalTestOutput {
    global_test: f64,
    nodes: usize,
    threshold: f64,
    gross_error_suspected: bool,
}

pub fn handle(input: &Path) -> Result<()> {
    let request = io::read_request(input)?;
    let value = global_test_for_flows(&request.flows, &TracingReporter)
        .context("computing global test")?;

    io::write_json(
        &GlobalTestOutput {
            global_test: value,
            nodes: node_order(&request.flows).len(),
            threshold: THRESHOLD,
            gross_error_suspected: value >= THRESHOLD,
        },
        None,
    )
}
