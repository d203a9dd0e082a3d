//! Filesystem locations

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where plugins, staged artifacts and the state snapshot live
///
/// Entries may use `~` and `$VAR`; they are expanded on access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Installed plugins, one directory per plugin
    pub plugins_directory: String,

    /// Uploaded artifacts awaiting installation
    pub staging_directory: String,

    /// Saved plugin graph
    pub snapshot_file: String,

    /// Extra directories scanned for `plugin.yaml` descriptors
    #[serde(default)]
    pub manifest_directories: Vec<String>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            plugins_directory: "./plugins".to_string(),
            staging_directory: "./.plugman/staging".to_string(),
            snapshot_file: "./plugman.lock.yaml".to_string(),
            manifest_directories: Vec::new(),
        }
    }
}

impl PathsConfig {
    pub fn plugins_directory(&self) -> Result<PathBuf> {
        expand(&self.plugins_directory)
    }

    pub fn staging_directory(&self) -> Result<PathBuf> {
        expand(&self.staging_directory)
    }

    pub fn snapshot_file(&self) -> Result<PathBuf> {
        expand(&self.snapshot_file)
    }

    /// Plugins directory followed by the extra manifest directories
    pub fn scan_directories(&self) -> Result<Vec<PathBuf>> {
        std::iter::once(&self.plugins_directory)
            .chain(&self.manifest_directories)
            .map(|dir| expand(dir))
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        for (label, value) in [
            ("plugins_directory", &self.plugins_directory),
            ("staging_directory", &self.staging_directory),
            ("snapshot_file", &self.snapshot_file),
        ] {
            if value.trim().is_empty() {
                return Err(anyhow!("paths.{} cannot be empty", label));
            }
        }

        if self.plugins_directory == self.staging_directory {
            return Err(anyhow!(
                "paths.staging_directory must differ from paths.plugins_directory"
            ));
        }

        Ok(())
    }
}

fn expand(value: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(value)
        .map_err(|e| anyhow!("Failed to expand path {}: {}", value, e))?;
    Ok(PathBuf::from(expanded.as_ref()))
}
