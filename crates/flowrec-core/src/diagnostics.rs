//! Non-fatal validation of flow lists.
//!
//! Reconciliation itself fails fast on the first hard input error. Before
//! that point it is often more useful to see *every* suspicious record at
//! once, which is what [`validate_flows`] produces:
//!
//! - Severity levels (Warning, Error)
//! - Categories for grouping issues (topology, tolerance, bounds, identity)
//! - Entity reference naming the offending flow and its position in the list
//!
//! # Example
//!
//! ```
//! use flowrec_core::{validate_flows, Flow};
//!
//! let flows = vec![
//!     Flow::new("feed", 10.0).with_destination("A").with_tolerance(0.2),
//!     Flow::new("orphan", 1.0),
//! ];
//!
//! let diag = validate_flows(&flows);
//! assert_eq!(diag.error_count(), 1);
//! assert!(diag.has_errors());
//! ```

use crate::Flow;
use serde::Serialize;
use std::collections::HashSet;

/// Severity level for diagnostic issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Suspicious but the engine can proceed
    Warning,
    /// The engine would reject this input
    Error,
}

/// A single diagnostic issue
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticIssue {
    pub severity: Severity,
    /// Category for grouping (e.g., "topology", "tolerance", "bounds")
    pub category: String,
    pub message: String,
    /// Position of the flow in the input list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    /// Flow label (e.g., "Flow f3")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

impl DiagnosticIssue {
    pub fn new(
        severity: Severity,
        category: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category: category.into(),
            message: message.into(),
            index: None,
            entity: None,
        }
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }
}

impl std::fmt::Display for DiagnosticIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };

        write!(f, "[{}:{}] {}", severity, self.category, self.message)?;

        if let Some(entity) = &self.entity {
            write!(f, " ({})", entity)?;
        }
        if let Some(index) = self.index {
            write!(f, " at index {}", index)?;
        }

        Ok(())
    }
}

/// Collection of diagnostic issues
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<DiagnosticIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, issue: DiagnosticIssue) {
        self.issues.push(issue);
    }

    fn add_for_flow(
        &mut self,
        severity: Severity,
        category: &str,
        message: String,
        index: usize,
        flow: &Flow,
    ) {
        self.issues.push(
            DiagnosticIssue::new(severity, category, message)
                .with_index(index)
                .with_entity(flow.label()),
        );
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    /// Get issues filtered by category
    pub fn issues_by_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a DiagnosticIssue> {
        self.issues.iter().filter(move |i| i.category == category)
    }

    pub fn summary(&self) -> String {
        let plural = |n: usize| if n == 1 { "" } else { "s" };

        match (self.warning_count(), self.error_count()) {
            (0, 0) => "No issues".to_string(),
            (w, 0) => format!("{} warning{}", w, plural(w)),
            (0, e) => format!("{} error{}", e, plural(e)),
            (w, e) => format!("{} warning{}, {} error{}", w, plural(w), e, plural(e)),
        }
    }
}

impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Diagnostics: {}", self.summary())?;
        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }
        Ok(())
    }
}

/// Inspect a flow list and report every problem found.
pub fn validate_flows(flows: &[Flow]) -> Diagnostics {
    let mut diag = Diagnostics::new();

    if flows.is_empty() {
        diag.add(DiagnosticIssue::new(
            Severity::Error,
            "topology",
            "flow list is empty",
        ));
        return diag;
    }

    let mut seen = HashSet::with_capacity(flows.len());

    for (idx, flow) in flows.iter().enumerate() {
        if !seen.insert(flow.id) {
            diag.add_for_flow(
                Severity::Error,
                "identity",
                format!("duplicate flow id {}", flow.id),
                idx,
                flow,
            );
        }

        if flow.source.is_none() && flow.destination.is_none() {
            diag.add_for_flow(
                Severity::Error,
                "topology",
                "flow has neither a source nor a destination".to_string(),
                idx,
                flow,
            );
        }

        if flow.source.is_some() && flow.source == flow.destination {
            diag.add_for_flow(
                Severity::Warning,
                "topology",
                "flow is a self-loop and does not affect any balance".to_string(),
                idx,
                flow,
            );
        }

        if flow.measured.is_nan() {
            diag.add_for_flow(
                Severity::Error,
                "tolerance",
                "measured value is NaN".to_string(),
                idx,
                flow,
            );
        }

        if flow.tolerance.is_nan() || flow.tolerance < 0.0 {
            diag.add_for_flow(
                Severity::Error,
                "tolerance",
                format!("tolerance {} is not a non-negative number", flow.tolerance),
                idx,
                flow,
            );
        } else if flow.is_measured && flow.tolerance == 0.0 {
            diag.add_for_flow(
                Severity::Warning,
                "tolerance",
                "measured flow has zero tolerance; unit weight will be used".to_string(),
                idx,
                flow,
            );
        } else if !flow.is_measured && flow.tolerance > 0.0 {
            diag.add_for_flow(
                Severity::Warning,
                "tolerance",
                "unmeasured flow carries a tolerance that will be ignored".to_string(),
                idx,
                flow,
            );
        }

        if flow.lower_technological > flow.upper_technological {
            diag.add_for_flow(
                Severity::Warning,
                "bounds",
                format!(
                    "technological bounds are inverted ({} > {})",
                    flow.lower_technological, flow.upper_technological
                ),
                idx,
                flow,
            );
        }

        if flow.is_measured && flow.lower_metrological > flow.upper_metrological {
            diag.add_for_flow(
                Severity::Warning,
                "bounds",
                format!(
                    "metrological bounds are inverted ({} > {})",
                    flow.lower_metrological, flow.upper_metrological
                ),
                idx,
                flow,
            );
        }
    }

    diag
}
