use std::io::{self, Write};
use std::path::Path;

use anyhow::{bail, Result};
use flowrec_cli::io as request_io;
use flowrec_core::{find_islands, graph_stats, validate_flows};
use tabwriter::TabWriter;

pub fn handle(input: &Path) -> Result<()> {
    let request = request_io::read_request(input)?;
    let diagnostics = validate_flows(&request.flows);
    let stats = graph_stats(&request.flows);

    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "Flows\t{}", request.flows.len())?;
    writeln!(writer, "Nodes\t{}", stats.node_count)?;
    writeln!(
        writer,
        "Internal / boundary flows\t{} / {}",
        stats.internal_flows, stats.boundary_flows
    )?;
    writeln!(writer, "Islands\t{}", stats.connected_components)?;
    if stats.connected_components > 1 {
        for island in find_islands(&request.flows) {
            let nodes: Vec<&str> = island.nodes.iter().map(|n| n.as_str()).collect();
            writeln!(writer, "  island {}\t{}", island.island_id, nodes.join(", "))?;
        }
    }
    writer.flush()?;

    if diagnostics.issues.is_empty() {
        println!("No issues found.");
    } else {
        let mut writer = TabWriter::new(io::stdout());
        writeln!(writer, "\nSEVERITY\tCATEGORY\tFLOW\tMESSAGE")?;
        for issue in &diagnostics.issues {
            writeln!(
                writer,
                "{:?}\t{}\t{}\t{}",
                issue.severity,
                issue.category,
                issue.entity.as_deref().unwrap_or("-"),
                issue.message
            )?;
        }
        writer.flush()?;
        println!("{}", diagnostics.summary());
    }

    if diagnostics.has_errors() {
        bail!(
            "{} contains {} error(s)",
            input.display(),
            diagnostics.error_count()
        );
    }
    Ok(())
}
