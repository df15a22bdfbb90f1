//! # flowrec-core: Flow Network Data Model
//!
//! Provides the fundamental data structures shared by the reconciliation and
//! gross error detection engine.
//!
//! ## Design Philosophy
//!
//! A process network is described purely by its **flows**. Each flow is a
//! directed edge between an optional source node and an optional destination
//! node:
//!
//! ```text
//!   (none) ──f1──▶ A ──f3──▶ B ──f5──▶ C ──f6──▶ (none)
//!                  │         │         └──f7──▶ (none)
//!                  f2        f4
//!                  ▼         ▼
//!               (none)    (none)
//! ```
//!
//! Nodes are never supplied explicitly; they are inferred from the endpoint
//! ids that appear in the flow list. A flow with only one endpoint models a
//! system inflow or outflow.
//!
//! ## Quick Start
//!
//! ```rust
//! use flowrec_core::*;
//!
//! let feed = Flow::new("feed", 10.005)
//!     .with_destination("A")
//!     .with_tolerance(0.2);
//!
//! let product = Flow::new("product", 3.033)
//!     .with_source("A")
//!     .with_tolerance(0.121)
//!     .with_technological_bounds(0.0, 1000.0);
//!
//! assert!(feed.validate().is_ok());
//! assert_eq!(
//!     product.active_bounds(ConstraintPolicy::Technological),
//!     (0.0, 1000.0)
//! );
//! ```
//!
//! ## Modules
//!
//! - [`diagnostics`] - Non-fatal validation of flow lists
//! - [`error`] - Unified error taxonomy
//! - [`graph_utils`] - Topological analysis (connectivity, islands)
//! - [`report`] - Injected observer interface for engine events

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub mod diagnostics;
pub mod error;
pub mod graph_utils;
pub mod report;

pub use diagnostics::{validate_flows, DiagnosticIssue, Diagnostics, Severity};
pub use error::{FlowrecError, FlowrecResult};
pub use graph_utils::*;
pub use report::{EngineEvent, NullReporter, RecordingReporter, Reporter, TracingReporter};

/// Unique flow identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowId(Uuid);

impl FlowId {
    pub fn new(value: Uuid) -> Self {
        Self(value)
    }

    /// Fresh random id, used for synthetic leak/unaccounted flows.
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for FlowId {
    fn default() -> Self {
        Self::new_v4()
    }
}

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Node identifier as it appears in the flow data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of gross error a hypothesis may explain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrossErrorType {
    /// Biased meter on an existing flow
    Measurement,
    /// Unmodeled outflow leaving the network
    Leak,
    /// Unmodeled flow between two nodes with no physical connection
    Unaccounted,
}

impl GrossErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrossErrorType::Measurement => "measurement",
            GrossErrorType::Leak => "leak",
            GrossErrorType::Unaccounted => "unaccounted",
        }
    }
}

impl std::str::FromStr for GrossErrorType {
    type Err = FlowrecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "measurement" | "measure" => Ok(GrossErrorType::Measurement),
            "leak" => Ok(GrossErrorType::Leak),
            "unaccounted" => Ok(GrossErrorType::Unaccounted),
            other => Err(FlowrecError::Input(format!(
                "unknown gross error type '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for GrossErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of requested error types, checked at candidate generation.
///
/// An empty request means "measurement errors only".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorTypeSet {
    measurement: bool,
    leak: bool,
    unaccounted: bool,
}

impl ErrorTypeSet {
    pub fn from_slice(types: &[GrossErrorType]) -> Self {
        if types.is_empty() {
            return Self::default();
        }
        Self {
            measurement: types.contains(&GrossErrorType::Measurement),
            leak: types.contains(&GrossErrorType::Leak),
            unaccounted: types.contains(&GrossErrorType::Unaccounted),
        }
    }

    pub fn all() -> Self {
        Self {
            measurement: true,
            leak: true,
            unaccounted: true,
        }
    }

    pub fn allows(&self, kind: GrossErrorType) -> bool {
        match kind {
            GrossErrorType::Measurement => self.measurement,
            GrossErrorType::Leak => self.leak,
            GrossErrorType::Unaccounted => self.unaccounted,
        }
    }
}

impl Default for ErrorTypeSet {
    fn default() -> Self {
        Self {
            measurement: true,
            leak: false,
            unaccounted: false,
        }
    }
}

/// Which bound pair constrains a measured flow during reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstraintPolicy {
    /// Technological (operational) bounds for every flow
    Technological,
    /// Metrological bounds for measured flows, technological for the rest
    #[default]
    Metrological,
}

impl std::str::FromStr for ConstraintPolicy {
    type Err = FlowrecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "technological" | "technologic" => Ok(ConstraintPolicy::Technological),
            "metrological" | "metrologic" => Ok(ConstraintPolicy::Metrological),
            other => Err(FlowrecError::Input(format!(
                "unknown constraint policy '{}'",
                other
            ))),
        }
    }
}

/// A single measured (or unmeasured) flow in the network.
///
/// Bounds are stored as plain `f64`; an infinite bound means "unconstrained"
/// and is written to JSON as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flow {
    #[serde(default)]
    pub id: FlowId,
    #[serde(default)]
    pub source: Option<NodeId>,
    #[serde(default)]
    pub destination: Option<NodeId>,
    #[serde(default)]
    pub name: String,
    pub measured: f64,
    /// Half-width of the metrological confidence interval
    #[serde(default)]
    pub tolerance: f64,
    #[serde(default = "bound::zero", with = "bound::lower")]
    pub lower_metrological: f64,
    #[serde(default = "bound::infinite", with = "bound::upper")]
    pub upper_metrological: f64,
    #[serde(default = "bound::zero", with = "bound::lower")]
    pub lower_technological: f64,
    #[serde(default = "bound::infinite", with = "bound::upper")]
    pub upper_technological: f64,
    #[serde(default = "default_true")]
    pub is_measured: bool,
    #[serde(default)]
    pub is_excluded: bool,
    #[serde(default)]
    pub is_artificial: bool,
}

fn default_true() -> bool {
    true
}

impl Flow {
    /// Measured flow with no endpoints, zero tolerance and bounds `[0, +∞)`.
    pub fn new(name: impl Into<String>, measured: f64) -> Self {
        Self {
            id: FlowId::new_v4(),
            source: None,
            destination: None,
            name: name.into(),
            measured,
            tolerance: 0.0,
            lower_metrological: 0.0,
            upper_metrological: f64::INFINITY,
            lower_technological: 0.0,
            upper_technological: f64::INFINITY,
            is_measured: true,
            is_excluded: false,
            is_artificial: false,
        }
    }

    pub fn with_id(mut self, id: FlowId) -> Self {
        self.id = id;
        self
    }

    pub fn with_source(mut self, node: impl Into<NodeId>) -> Self {
        self.source = Some(node.into());
        self
    }

    pub fn with_destination(mut self, node: impl Into<NodeId>) -> Self {
        self.destination = Some(node.into());
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_metrological_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.lower_metrological = lower;
        self.upper_metrological = upper;
        self
    }

    pub fn with_technological_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.lower_technological = lower;
        self.upper_technological = upper;
        self
    }

    pub fn unmeasured(mut self) -> Self {
        self.is_measured = false;
        self
    }

    pub fn excluded(mut self) -> Self {
        self.is_excluded = true;
        self
    }

    pub fn artificial(mut self) -> Self {
        self.is_artificial = true;
        self
    }

    /// Human-readable label for logs and diagnostics.
    pub fn label(&self) -> String {
        if self.name.is_empty() {
            format!("Flow {}", self.id)
        } else {
            format!("Flow {}", self.name)
        }
    }

    /// The bound pair `(lower, upper)` that constrains this flow.
    ///
    /// Unmeasured flows have no metrological interval, so they always fall
    /// back to technological bounds.
    pub fn active_bounds(&self, policy: ConstraintPolicy) -> (f64, f64) {
        if policy == ConstraintPolicy::Technological || !self.is_measured {
            (self.lower_technological, self.upper_technological)
        } else {
            (self.lower_metrological, self.upper_metrological)
        }
    }

    /// True when both endpoints are set and equal to the given pair.
    pub fn connects(&self, source: Option<&NodeId>, destination: Option<&NodeId>) -> bool {
        self.source.as_ref() == source && self.destination.as_ref() == destination
    }

    /// Reject flows that cannot be placed into the topology.
    pub fn validate(&self) -> FlowrecResult<()> {
        if self.source.is_none() && self.destination.is_none() {
            return Err(FlowrecError::Input(format!(
                "{} has neither a source nor a destination",
                self.label()
            )));
        }
        Ok(())
    }
}

/// Serde helpers mapping non-finite bounds to JSON `null`.
///
/// Use `with = "flowrec_core::bound::upper"` (or `lower`) on bound fields.
pub mod bound {
    pub fn zero() -> f64 {
        0.0
    }

    pub fn infinite() -> f64 {
        f64::INFINITY
    }

    fn serialize_finite<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        if value.is_finite() {
            serializer.serialize_some(value)
        } else {
            serializer.serialize_none()
        }
    }

    pub mod lower {
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
            super::serialize_finite(value, serializer)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
            Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NEG_INFINITY))
        }
    }

    pub mod upper {
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
            super::serialize_finite(value, serializer)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
            Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
        }
    }
}
