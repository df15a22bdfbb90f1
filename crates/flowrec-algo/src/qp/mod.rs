//! Convex QP backends for reconciliation.
//!
//! Reconciliation only needs a solver for
//!
//! ```text
//! minimize    ½ xᵀ diag(h) x + dᵀ x
//! subject to  E x = e
//!             l ≤ x ≤ u        (non-finite entries are dropped)
//! ```
//!
//! Any convex QP method that returns the minimizer is acceptable, so the
//! solver sits behind [`QpBackend`]. [`ClarabelBackend`] (interior point) is
//! the default implementation.

pub mod clarabel;

pub use self::clarabel::ClarabelBackend;

use flowrec_core::{FlowrecError, FlowrecResult};
use serde::{Deserialize, Serialize};
use sprs::CsMatView;
use std::time::Duration;

/// Borrowed view of one QP instance.
#[derive(Debug, Clone, Copy)]
pub struct QpProblem<'a> {
    pub hessian_diag: &'a [f64],
    pub linear: &'a [f64],
    /// Equality matrix `E` (rows = constraints, cols = variables)
    pub equality: CsMatView<'a, f64>,
    pub equality_rhs: &'a [f64],
    pub lower: &'a [f64],
    pub upper: &'a [f64],
}

impl QpProblem<'_> {
    pub fn n_vars(&self) -> usize {
        self.linear.len()
    }

    /// Reject inconsistent dimensions before handing data to a backend.
    pub fn check_dimensions(&self) -> FlowrecResult<()> {
        let n = self.n_vars();
        if self.hessian_diag.len() != n || self.lower.len() != n || self.upper.len() != n {
            return Err(FlowrecError::Invariant(format!(
                "QP vectors disagree on size: h={} d={} l={} u={}",
                self.hessian_diag.len(),
                n,
                self.lower.len(),
                self.upper.len()
            )));
        }
        if self.equality.cols() != n || self.equality.rows() != self.equality_rhs.len() {
            return Err(FlowrecError::Invariant(format!(
                "equality system is {}x{} with {} targets for {} variables",
                self.equality.rows(),
                self.equality.cols(),
                self.equality_rhs.len(),
                n
            )));
        }
        Ok(())
    }
}

/// Optimal point returned by a backend.
#[derive(Debug, Clone)]
pub struct QpSolution {
    pub x: Vec<f64>,
    pub iterations: u32,
    pub solve_time: Duration,
}

/// Solver tolerances shared by backends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QpSettings {
    pub tol_gap_abs: f64,
    pub tol_gap_rel: f64,
    pub tol_feas: f64,
    pub max_iter: u32,
}

impl Default for QpSettings {
    fn default() -> Self {
        Self {
            tol_gap_abs: 1e-8,
            tol_gap_rel: 1e-8,
            tol_feas: 1e-8,
            max_iter: 200,
        }
    }
}

/// Trait for convex QP solvers.
pub trait QpBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Return the minimizer or an `Optimization` error when the problem is
    /// infeasible or the solver fails to converge.
    fn solve(&self, problem: &QpProblem<'_>) -> FlowrecResult<QpSolution>;
}

/// Registry of available QP backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QpBackendKind {
    #[default]
    Clarabel,
}

impl QpBackendKind {
    pub fn build(self, settings: QpSettings) -> Box<dyn QpBackend> {
        match self {
            QpBackendKind::Clarabel => Box::new(ClarabelBackend::new(settings)),
        }
    }

    pub fn available() -> &'static [&'static str] {
        &["clarabel"]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QpBackendKind::Clarabel => "clarabel",
        }
    }
}

impl std::str::FromStr for QpBackendKind {
    type Err = FlowrecError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.to_ascii_lowercase().as_str() {
            "clarabel" | "default" => Ok(QpBackendKind::Clarabel),
            other => Err(FlowrecError::Config(format!(
                "unknown QP backend '{}'; supported values: {}",
                other,
                Self::available().join(", ")
            ))),
        }
    }
}
