//! Lifecycle operations and requests

use plugman_graph::{Dependency, Plugin};
use plugman_version::Version;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of lifecycle transition, without payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Install,
    Enable,
    Disable,
    Uninstall,
    Update,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Install => "install",
            Self::Enable => "enable",
            Self::Disable => "disable",
            Self::Uninstall => "uninstall",
            Self::Update => "update",
        };
        f.write_str(label)
    }
}

/// A lifecycle transition requested for one plugin
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Register a plugin that is not installed yet
    Install { descriptor: Plugin },

    Enable,

    Disable,

    Uninstall,

    /// Replace the installed version
    ///
    /// `dependencies` carries the new descriptor's declarations when the
    /// update comes from an artifact; `None` keeps the current ones.
    Update {
        version: Version,
        dependencies: Option<Vec<Dependency>>,
    },
}

impl Operation {
    pub fn update(version: Version) -> Self {
        Self::Update {
            version,
            dependencies: None,
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Install { .. } => OperationKind::Install,
            Self::Enable => OperationKind::Enable,
            Self::Disable => OperationKind::Disable,
            Self::Uninstall => OperationKind::Uninstall,
            Self::Update { .. } => OperationKind::Update,
        }
    }

    /// Version requested by an update or install
    pub fn requested_version(&self) -> Option<Version> {
        match self {
            Self::Install { descriptor } => Some(descriptor.version),
            Self::Update { version, .. } => Some(*version),
            _ => None,
        }
    }
}

/// A lifecycle request against a single plugin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleRequest {
    /// Target plugin name
    pub plugin: String,

    /// Requested transition
    pub operation: Operation,

    /// The caller accepts the cascading changes to other plugins
    pub confirmed: bool,
}

impl LifecycleRequest {
    pub fn new(plugin: impl Into<String>, operation: Operation) -> Self {
        Self {
            plugin: plugin.into(),
            operation,
            confirmed: false,
        }
    }

    pub fn enable(plugin: impl Into<String>) -> Self {
        Self::new(plugin, Operation::Enable)
    }

    pub fn disable(plugin: impl Into<String>) -> Self {
        Self::new(plugin, Operation::Disable)
    }

    pub fn uninstall(plugin: impl Into<String>) -> Self {
        Self::new(plugin, Operation::Uninstall)
    }

    pub fn update(plugin: impl Into<String>, version: Version) -> Self {
        Self::new(plugin, Operation::update(version))
    }

    pub fn install(descriptor: Plugin) -> Self {
        Self::new(descriptor.name.clone(), Operation::Install { descriptor })
    }

    pub fn confirmed(mut self) -> Self {
        self.confirmed = true;
        self
    }

    pub fn kind(&self) -> OperationKind {
        self.operation.kind()
    }
}
