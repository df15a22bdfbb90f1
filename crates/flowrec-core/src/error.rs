//! Unified error types for flow reconciliation
//!
//! [`FlowrecError`] separates the three failure classes callers must be able
//! to tell apart:
//!
//! - **Input**: the caller handed us data we cannot work with (empty flow
//!   list, a tolerance producing a NaN weight, a flow with no endpoints).
//! - **Optimization**: the QP backend failed to find a feasible optimum.
//! - **Invariant**: internal bookkeeping is broken (missing search-tree data).
//!
//! The remaining variants only appear at the CLI boundary.
//!
//! # Example
//!
//! ```ignore
//! use flowrec_core::{FlowrecError, FlowrecResult};
//!
//! fn run(path: &str) -> FlowrecResult<()> {
//!     let flows = load_flows(path)?;
//!     let outputs = reconcile(&flows, ConstraintPolicy::Metrological, &reporter)?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Unified error type for all reconciliation operations.
#[derive(Error, Debug)]
pub enum FlowrecError {
    /// Malformed or missing input data; the caller must fix it
    #[error("Input error: {0}")]
    Input(String),

    /// QP solver did not converge or the constraints are infeasible
    #[error("Optimization failure: {0}")]
    Optimization(String),

    /// Internal invariant violated; indicates a bug
    #[error("Invariant violation: {0}")]
    Invariant(String),

    /// I/O errors (file access)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using FlowrecError.
pub type FlowrecResult<T> = Result<T, FlowrecError>;

impl FlowrecError {
    /// Short machine-friendly label for the failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            FlowrecError::Input(_) => "input",
            FlowrecError::Optimization(_) => "optimization",
            FlowrecError::Invariant(_) => "invariant",
            FlowrecError::Io(_) => "io",
            FlowrecError::Parse(_) => "parse",
            FlowrecError::Config(_) => "config",
            FlowrecError::Other(_) => "other",
        }
    }
}

impl From<anyhow::Error> for FlowrecError {
    fn from(err: anyhow::Error) -> Self {
        FlowrecError::Other(err.to_string())
    }
}

impl From<String> for FlowrecError {
    fn from(s: String) -> Self {
        FlowrecError::Other(s)
    }
}

impl From<&str> for FlowrecError {
    fn from(s: &str) -> Self {
        FlowrecError::Other(s.to_string())
    }
}

// JSON parsing errors
impl From<serde_json::Error> for FlowrecError {
    fn from(err: serde_json::Error) -> Self {
        FlowrecError::Parse(err.to_string())
    }
}
