//! JSON policy configuration, e.g. `{"mode": "B"}`.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::PolicyMode;

/// Policy configuration, loaded once per run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub mode: PolicyMode,
}

impl PolicyConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse policy config")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read policy config: {:?}", path))?;
        let config = Self::from_json(&json)
            .with_context(|| format!("Invalid policy config in {:?}", path))?;

        info!(path = ?path, mode = %config.mode, "Loaded policy config");
        Ok(config)
    }
}
