//! Lifecycle policy

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Host-level rules applied on top of plugin descriptors
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Plugins treated as system plugins regardless of their descriptor
    #[serde(default)]
    pub system_plugins: BTreeSet<String>,

    /// Plugins that may not be enabled
    #[serde(default)]
    pub enabling_blocked: BTreeSet<String>,

    /// Enabling plugin code that is not loaded yet needs a restart
    #[serde(default)]
    pub restart_on_enable: bool,
}

impl PolicyConfig {
    pub fn is_system(&self, plugin: &str) -> bool {
        self.system_plugins.contains(plugin)
    }

    pub fn enabling_allowed(&self, plugin: &str) -> bool {
        !self.enabling_blocked.contains(plugin)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(name) = self.system_plugins.intersection(&self.enabling_blocked).next() {
            return Err(anyhow!(
                "System plugin {} cannot be listed in policy.enabling_blocked",
                name
            ));
        }
        Ok(())
    }
}
