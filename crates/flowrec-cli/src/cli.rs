use clap::{Parser, Subcommand, ValueEnum, ValueHint};
use flowrec_core::{ConstraintPolicy, GrossErrorType};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "flowrec",
    author,
    version,
    about = "Flow network data reconciliation and gross error detection",
    long_about = None
)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info", global = true)]
    pub log_level: tracing::Level,

    /// Configuration file (defaults to ~/.flowrec/config.toml when present)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Worker threads for parallel search ("auto" or a number)
    #[arg(long, global = true)]
    pub threads: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Reconcile measured flows against node balances
    Reconcile {
        /// Request file (JSON flow array or request object)
        #[arg(value_hint = ValueHint::FilePath)]
        input: PathBuf,
        /// Bound set applied to measured flows
        #[arg(long, value_enum)]
        policy: Option<PolicyArg>,
        /// Write the result here instead of stdout
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        out: Option<PathBuf>,
    },
    /// Compute the normalized global test statistic
    GlobalTest {
        #[arg(value_hint = ValueHint::FilePath)]
        input: PathBuf,
    },
    /// Search for gross errors and rank explanations
    Detect {
        #[arg(value_hint = ValueHint::FilePath)]
        input: PathBuf,
        /// Children kept per expanded node
        #[arg(long)]
        branching: Option<usize>,
        /// Maximum hypotheses per scenario
        #[arg(long)]
        max_height: Option<usize>,
        /// Stop deepening after this many accepted scenarios
        #[arg(long)]
        max_solutions: Option<usize>,
        /// Error kinds to consider (comma separated)
        #[arg(long, value_enum, value_delimiter = ',')]
        error_types: Vec<ErrorTypeArg>,
        /// Reconcile and classify every scenario
        #[arg(long)]
        reconcile: bool,
        /// Bound set used with --reconcile
        #[arg(long, value_enum)]
        policy: Option<PolicyArg>,
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        out: Option<PathBuf>,
    },
    /// Measurement uncertainty before and after reconciliation
    Tolerance {
        #[arg(value_hint = ValueHint::FilePath)]
        input: PathBuf,
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        out: Option<PathBuf>,
    },
    /// Check a request file for data problems
    Validate {
        #[arg(value_hint = ValueHint::FilePath)]
        input: PathBuf,
    },
    /// Configuration helpers
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write a default configuration file
    Init {
        /// Target path (defaults to ~/.flowrec/config.toml)
        #[arg(value_hint = ValueHint::FilePath)]
        path: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration
    Show,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolicyArg {
    Technological,
    Metrological,
}

impl From<PolicyArg> for ConstraintPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Technological => ConstraintPolicy::Technological,
            PolicyArg::Metrological => ConstraintPolicy::Metrological,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorTypeArg {
    Measurement,
    Leak,
    Unaccounted,
}

impl From<ErrorTypeArg> for GrossErrorType {
    fn from(arg: ErrorTypeArg) -> Self {
        match arg {
            ErrorTypeArg::Measurement => GrossErrorType::Measurement,
            ErrorTypeArg::Leak => GrossErrorType::Leak,
            ErrorTypeArg::Unaccounted => GrossErrorType::Unaccounted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_detect_flags_parse() {
        let cli = Cli::parse_from([
            "flowrec",
            "--threads",
            "2",
            "detect",
            "in.json",
            "--branching",
            "3",
            "--error-types",
            "leak,unaccounted",
            "--reconcile",
        ]);
        assert_eq!(cli.threads.as_deref(), Some("2"));
        match cli.command {
            Commands::Detect {
                branching,
                error_types,
                reconcile,
                ..
            } => {
                assert_eq!(branching, Some(3));
                assert_eq!(error_types, vec![ErrorTypeArg::Leak, ErrorTypeArg::Unaccounted]);
                assert!(reconcile);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
