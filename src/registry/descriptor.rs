//! Plugin descriptor file format

use anyhow::{anyhow, Result};
use plugman_graph::{Dependency, Plugin};
use plugman_version::{Version, VersionConstraint};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Contents of a `plugin.yaml` descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    /// Unique plugin name
    pub name: String,

    /// Plugin version
    pub version: Version,

    /// Human readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Host platform depends on this plugin
    #[serde(default)]
    pub system: bool,

    /// Required plugins
    #[serde(default)]
    pub dependencies: Vec<DescriptorDependency>,
}

/// One entry of a descriptor's `dependencies` list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorDependency {
    pub plugin: String,

    /// Accepted versions, any version when omitted
    #[serde(default)]
    pub version: VersionConstraint,
}

impl PluginDescriptor {
    /// Parse and validate a descriptor from YAML
    pub fn from_yaml(content: &str) -> Result<Self> {
        let descriptor: PluginDescriptor = serde_yaml::from_str(content)?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Validate the descriptor
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;

        let mut seen = BTreeSet::new();
        for dependency in &self.dependencies {
            validate_name(&dependency.plugin)?;
            if dependency.plugin == self.name {
                return Err(anyhow!("Plugin {} depends on itself", self.name));
            }
            if !seen.insert(dependency.plugin.as_str()) {
                return Err(anyhow!(
                    "Plugin {} declares dependency {} twice",
                    self.name,
                    dependency.plugin
                ));
            }
        }

        Ok(())
    }

    /// Installed, disabled plugin described by this descriptor
    pub fn into_plugin(self) -> Plugin {
        let mut plugin = Plugin::new(self.name, self.version);
        plugin.description = self.description;
        plugin.is_system = self.system;
        plugin.dependencies = self
            .dependencies
            .into_iter()
            .map(|d| Dependency::new(d.plugin, d.version))
            .collect();
        plugin
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(anyhow!("Plugin name cannot be empty"));
    }
    let valid = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !valid || name.starts_with('.') {
        return Err(anyhow!("Invalid plugin name: {}", name));
    }
    Ok(())
}
