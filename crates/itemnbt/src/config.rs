use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DataError, DataResult};

/// Behaviour switches for a [`DataManager`](crate::DataManager).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Keep built link descriptors for reuse.
    pub cache_descriptors: bool,
    /// Turn any per-field link failure into `DataError::PartialLink`.
    pub strict_fields: bool,
    /// Log a warning when a [`DataGuard`](crate::DataGuard) with uncommitted
    /// changes is dropped.
    pub warn_on_dirty_drop: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            cache_descriptors: true,
            strict_fields: false,
            warn_on_dirty_drop: true,
        }
    }
}

impl SyncConfig {
    /// Strict variant: every field must link.
    pub fn strict() -> Self {
        Self {
            strict_fields: true,
            ..Default::default()
        }
    }

    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> DataResult<Self> {
        toml::from_str(source).map_err(|e| DataError::Config(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> DataResult<Self> {
        let source = fs::read_to_string(path)
            .map_err(|e| DataError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }

    pub fn to_toml_string(&self) -> DataResult<String> {
        toml::to_string(self).map_err(|e| DataError::Config(e.to_string()))
    }
}
