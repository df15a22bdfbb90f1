use clap::Parser;
use flowrec_cli::{Cli, Commands, FlowrecConfig};
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

mod commands;

use crate::commands::util::configure_threads;

/// Resolve the configuration and size the worker pool.
fn prepare(cli: &Cli) -> anyhow::Result<FlowrecConfig> {
    let config = FlowrecConfig::resolve(cli.config.as_deref())?;
    let threads = cli.threads.as_deref().unwrap_or(&config.runtime.threads);
    configure_threads(threads);
    Ok(config)
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Reconcile { input, policy, out } => {
            commands::reconcile::handle(&prepare(cli)?, input, *policy, out.as_deref())
        }
        Commands::GlobalTest { input } => {
            prepare(cli)?;
            commands::global_test::handle(input)
        }
        Commands::Detect {
            input,
            branching,
            max_height,
            max_solutions,
            error_types,
            reconcile,
            policy,
            out,
        } => commands::detect::handle(
            &prepare(cli)?,
            input,
            commands::detect::Overrides {
                branching: *branching,
                max_height: *max_height,
                max_solutions: *max_solutions,
                error_types: error_types.iter().map(|&t| t.into()).collect(),
                policy: policy.map(Into::into),
            },
            *reconcile,
            out.as_deref(),
        ),
        Commands::Tolerance { input, out } => {
            prepare(cli)?;
            commands::tolerance::handle(input, out.as_deref())
        }
        Commands::Validate { input } => commands::validate::handle(input),
        Commands::Config { command } => commands::config::handle(cli.config.as_deref(), command),
    }
}

fn main() {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting default subscriber failed: {err}");
    }

    info!("flowrec {}", env!("CARGO_PKG_VERSION"));

    if let Err(err) = run(&cli) {
        error!("command failed: {:?}", err);
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
