//! Plugin descriptors and lifecycle state

use chrono::{DateTime, Utc};
use plugman_version::{Version, VersionConstraint};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PluginState {
    /// Known descriptor without an installed artifact
    NotInstalled,

    /// Installed but not loaded
    InstalledDisabled,

    /// Installed and loaded
    Enabled,

    /// Will be removed on the next restart
    MarkedForUninstall,

    /// New code is staged and will be loaded on the next restart
    MarkedForUpdate,
}

impl fmt::Display for PluginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotInstalled => "not installed",
            Self::InstalledDisabled => "disabled",
            Self::Enabled => "enabled",
            Self::MarkedForUninstall => "marked for uninstall",
            Self::MarkedForUpdate => "marked for update",
        };
        f.write_str(label)
    }
}

/// A declared dependency on another plugin
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Dependency {
    /// Name of the required plugin
    pub plugin: String,

    /// Acceptable versions of the required plugin
    #[serde(default)]
    pub constraint: VersionConstraint,
}

impl Dependency {
    pub fn new(plugin: impl Into<String>, constraint: VersionConstraint) -> Self {
        Self {
            plugin: plugin.into(),
            constraint,
        }
    }
}

/// A plugin node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plugin {
    /// Plugin name, unique within a graph
    pub name: String,

    /// Installed (or staged) version
    pub version: Version,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Declared dependencies
    #[serde(default)]
    pub dependencies: Vec<Dependency>,

    /// Current lifecycle state
    pub state: PluginState,

    /// Host platform depends on this plugin
    #[serde(default)]
    pub is_system: bool,

    /// When the artifact was installed
    #[serde(default)]
    pub installed_at: Option<DateTime<Utc>>,
}

impl Plugin {
    /// Create an installed, disabled plugin with no dependencies
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            version,
            description: None,
            dependencies: Vec::new(),
            state: PluginState::InstalledDisabled,
            is_system: false,
            installed_at: None,
        }
    }

    pub fn with_dependency(mut self, plugin: impl Into<String>, constraint: VersionConstraint) -> Self {
        self.dependencies.push(Dependency::new(plugin, constraint));
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_state(mut self, state: PluginState) -> Self {
        self.state = state;
        self
    }

    pub fn system(mut self) -> Self {
        self.is_system = true;
        self
    }

    /// Installed and not scheduled for removal
    pub fn is_present(&self) -> bool {
        !matches!(
            self.state,
            PluginState::NotInstalled | PluginState::MarkedForUninstall
        )
    }

    /// Code is currently loaded by the host
    pub fn is_loaded(&self) -> bool {
        matches!(self.state, PluginState::Enabled | PluginState::MarkedForUpdate)
    }
}
