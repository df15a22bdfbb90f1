//! Search limits for gross error detection.

use flowrec_core::{ErrorTypeSet, FlowrecError, FlowrecResult, GrossErrorType};
use serde::{Deserialize, Serialize};

/// Branching search configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GedSettings {
    /// Children kept per expanded node (top GLR deltas)
    pub branching: usize,
    /// Maximum number of simultaneous hypotheses in a scenario
    pub max_tree_height: usize,
    /// Stop deepening once this many accepted scenarios exist
    pub max_solutions: usize,
    /// Requested error kinds; empty means measurement errors only
    pub error_types: Vec<GrossErrorType>,
}

impl Default for GedSettings {
    fn default() -> Self {
        Self {
            branching: 5,
            max_tree_height: 5,
            max_solutions: 3,
            error_types: vec![GrossErrorType::Measurement],
        }
    }
}

impl GedSettings {
    pub fn with_branching(mut self, branching: usize) -> Self {
        self.branching = branching;
        self
    }

    pub fn with_max_tree_height(mut self, height: usize) -> Self {
        self.max_tree_height = height;
        self
    }

    pub fn with_max_solutions(mut self, solutions: usize) -> Self {
        self.max_solutions = solutions;
        self
    }

    pub fn with_error_types(mut self, types: Vec<GrossErrorType>) -> Self {
        self.error_types = types;
        self
    }

    pub fn error_type_set(&self) -> ErrorTypeSet {
        ErrorTypeSet::from_slice(&self.error_types)
    }

    pub fn validate(&self) -> FlowrecResult<()> {
        if self.branching == 0 {
            return Err(FlowrecError::Input("branching must be at least 1".into()));
        }
        if self.max_tree_height == 0 {
            return Err(FlowrecError::Input(
                "max tree height must be at least 1".into(),
            ));
        }
        if self.max_solutions == 0 {
            return Err(FlowrecError::Input(
                "max solutions must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
