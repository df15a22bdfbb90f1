//! TOML configuration for the `flowrec` binary.
//!
//! Stored in `~/.flowrec/config.toml` by default. Every section is optional;
//! missing keys fall back to their defaults, and command-line flags override
//! whatever the file says.

use anyhow::{Context, Result};
use flowrec_algo::{GedSettings, QpBackendKind, QpSettings};
use flowrec_core::{ConstraintPolicy, GrossErrorType};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowrecConfig {
    pub reconcile: ReconcileConfig,
    pub detection: DetectionConfig,
    pub runtime: RuntimeConfig,
}

/// Reconciliation settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    pub constraint_policy: ConstraintPolicy,
    pub backend: QpBackendKind,
    pub solver: QpSettings,
}

/// Gross error search limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub branching: usize,
    pub max_tree_height: usize,
    pub max_solutions: usize,
    pub error_types: Vec<GrossErrorType>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        let settings = GedSettings::default();
        Self {
            branching: settings.branching,
            max_tree_height: settings.max_tree_height,
            max_solutions: settings.max_solutions,
            error_types: settings.error_types,
        }
    }
}

impl DetectionConfig {
    pub fn to_settings(&self) -> GedSettings {
        GedSettings {
            branching: self.branching,
            max_tree_height: self.max_tree_height,
            max_solutions: self.max_solutions,
            error_types: self.error_types.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Worker threads ("auto" = one per core)
    pub threads: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            threads: "auto".to_string(),
        }
    }
}

impl FlowrecConfig {
    pub fn config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".flowrec"))
    }

    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("config.toml"))
    }

    /// Load `path` if given, else the default location if it exists, else
    /// built-in defaults.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => match Self::config_path() {
                Some(default) if default.exists() => Self::load_from(&default),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }
        let contents = toml::to_string_pretty(self).context("serializing config")?;
        std::fs::write(path, contents).with_context(|| format!("writing {}", path.display()))
    }
}
