//! Graph snapshot persistence

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use plugman_graph::{DependencyGraph, Plugin};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Saved plugin graph, lifecycle states included
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// Snapshot format version
    pub version: String,

    /// When the snapshot was written
    pub generated_at: DateTime<Utc>,

    /// Tool version used
    pub tool_version: String,

    /// Registered plugins in name order
    pub plugins: Vec<Plugin>,
}

impl GraphSnapshot {
    pub fn from_graph(graph: &DependencyGraph) -> Self {
        Self {
            version: "1.0".to_string(),
            generated_at: Utc::now(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            plugins: graph.plugins().cloned().collect(),
        }
    }

    /// Rebuild the graph
    pub fn into_graph(self) -> Result<DependencyGraph> {
        if self.version != "1.0" {
            return Err(anyhow!("Unsupported snapshot version: {}", self.version));
        }
        Ok(DependencyGraph::from_plugins(self.plugins)?)
    }

    /// Load snapshot from disk
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(anyhow!("Snapshot does not exist: {:?}", path));
        }

        let content = std::fs::read_to_string(path)?;
        let snapshot: GraphSnapshot = serde_yaml::from_str(&content)?;
        Ok(snapshot)
    }

    /// Save snapshot to disk
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
