//! Outcome of a plugin lifecycle operation

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

pub mod impact;


pub use impact::{DependencyImpact, ImpactInvariantError, UnsatisfiedDependency};

/// Closed set of operation outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    Success,
    SuccessWithRestart,
    SuccessWithMissingDependencies,
    SystemPluginDisabling,
    SystemPluginUninstalling,
    SystemPluginUpdating,
    CorruptedPlugin,
    CannotUploadPlugin,
    CannotInstallPluginFile,
    CannotDowngradePlugin,
    DependenciesCyclesExists,
    PluginEnablingIsNotAllowed,
    DependenciesToEnable,
    UnsatisfiedDependencies,
    DependenciesToDisable,
    DependenciesToUninstall,
    UnsatisfiedDependenciesAfterUpdate,
    PluginNotExist,
}

impl OperationStatus {
    /// Every status, in declaration order
    pub const ALL: [OperationStatus; 18] = [
        Self::Success,
        Self::SuccessWithRestart,
        Self::SuccessWithMissingDependencies,
        Self::SystemPluginDisabling,
        Self::SystemPluginUninstalling,
        Self::SystemPluginUpdating,
        Self::CorruptedPlugin,
        Self::CannotUploadPlugin,
        Self::CannotInstallPluginFile,
        Self::CannotDowngradePlugin,
        Self::DependenciesCyclesExists,
        Self::PluginEnablingIsNotAllowed,
        Self::DependenciesToEnable,
        Self::UnsatisfiedDependencies,
        Self::DependenciesToDisable,
        Self::DependenciesToUninstall,
        Self::UnsatisfiedDependenciesAfterUpdate,
        Self::PluginNotExist,
    ];

    pub fn is_success(self) -> bool {
        matches!(
            self,
            Self::Success | Self::SuccessWithRestart | Self::SuccessWithMissingDependencies
        )
    }

    pub fn is_restart_necessary(self) -> bool {
        self == Self::SuccessWithRestart
    }

    /// Whether results with this status carry a dependency impact
    pub fn carries_impact(self) -> bool {
        matches!(
            self,
            Self::SuccessWithMissingDependencies
                | Self::DependenciesToEnable
                | Self::UnsatisfiedDependencies
                | Self::DependenciesToDisable
                | Self::DependenciesToUninstall
                | Self::UnsatisfiedDependenciesAfterUpdate
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::SuccessWithRestart => "SUCCESS_WITH_RESTART",
            Self::SuccessWithMissingDependencies => "SUCCESS_WITH_MISSING_DEPENDENCIES",
            Self::SystemPluginDisabling => "SYSTEM_PLUGIN_DISABLING",
            Self::SystemPluginUninstalling => "SYSTEM_PLUGIN_UNINSTALLING",
            Self::SystemPluginUpdating => "SYSTEM_PLUGIN_UPDATING",
            Self::CorruptedPlugin => "CORRUPTED_PLUGIN",
            Self::CannotUploadPlugin => "CANNOT_UPLOAD_PLUGIN",
            Self::CannotInstallPluginFile => "CANNOT_INSTALL_PLUGIN_FILE",
            Self::CannotDowngradePlugin => "CANNOT_DOWNGRADE_PLUGIN",
            Self::DependenciesCyclesExists => "DEPENDENCIES_CYCLES_EXISTS",
            Self::PluginEnablingIsNotAllowed => "PLUGIN_ENABLING_IS_NOT_ALLOWED",
            Self::DependenciesToEnable => "DEPENDENCIES_TO_ENABLE",
            Self::UnsatisfiedDependencies => "UNSATISFIED_DEPENDENCIES",
            Self::DependenciesToDisable => "DEPENDENCIES_TO_DISABLE",
            Self::DependenciesToUninstall => "DEPENDENCIES_TO_UNINSTALL",
            Self::UnsatisfiedDependenciesAfterUpdate => "UNSATISFIED_DEPENDENCIES_AFTER_UPDATE",
            Self::PluginNotExist => "PLUGIN_NOT_EXIST",
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a lifecycle operation together with its dependency findings
///
/// Each variant binds one status to the payload it requires, so a status
/// that carries no dependency information cannot be paired with one.
/// Results are immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "impact", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationResult {
    Success,
    SuccessWithRestart,
    SuccessWithMissingDependencies(DependencyImpact),
    SystemPluginDisabling,
    SystemPluginUninstalling,
    SystemPluginUpdating,
    CorruptedPlugin,
    CannotUploadPlugin,
    CannotInstallPluginFile,
    CannotDowngradePlugin,
    DependenciesCyclesExists,
    PluginEnablingIsNotAllowed,
    DependenciesToEnable(DependencyImpact),
    UnsatisfiedDependencies(DependencyImpact),
    DependenciesToDisable(DependencyImpact),
    DependenciesToUninstall(DependencyImpact),
    UnsatisfiedDependenciesAfterUpdate(DependencyImpact),
    PluginNotExist,
}

static SATISFIED: DependencyImpact = DependencyImpact::satisfied();

impl OperationResult {
    pub fn status(&self) -> OperationStatus {
        match self {
            Self::Success => OperationStatus::Success,
            Self::SuccessWithRestart => OperationStatus::SuccessWithRestart,
            Self::SuccessWithMissingDependencies(_) => OperationStatus::SuccessWithMissingDependencies,
            Self::SystemPluginDisabling => OperationStatus::SystemPluginDisabling,
            Self::SystemPluginUninstalling => OperationStatus::SystemPluginUninstalling,
            Self::SystemPluginUpdating => OperationStatus::SystemPluginUpdating,
            Self::CorruptedPlugin => OperationStatus::CorruptedPlugin,
            Self::CannotUploadPlugin => OperationStatus::CannotUploadPlugin,
            Self::CannotInstallPluginFile => OperationStatus::CannotInstallPluginFile,
            Self::CannotDowngradePlugin => OperationStatus::CannotDowngradePlugin,
            Self::DependenciesCyclesExists => OperationStatus::DependenciesCyclesExists,
            Self::PluginEnablingIsNotAllowed => OperationStatus::PluginEnablingIsNotAllowed,
            Self::DependenciesToEnable(_) => OperationStatus::DependenciesToEnable,
            Self::UnsatisfiedDependencies(_) => OperationStatus::UnsatisfiedDependencies,
            Self::DependenciesToDisable(_) => OperationStatus::DependenciesToDisable,
            Self::DependenciesToUninstall(_) => OperationStatus::DependenciesToUninstall,
            Self::UnsatisfiedDependenciesAfterUpdate(_) => {
                OperationStatus::UnsatisfiedDependenciesAfterUpdate
            }
            Self::PluginNotExist => OperationStatus::PluginNotExist,
        }
    }

    /// True for `SUCCESS`, `SUCCESS_WITH_RESTART` and
    /// `SUCCESS_WITH_MISSING_DEPENDENCIES`
    pub fn is_success(&self) -> bool {
        self.status().is_success()
    }

    /// True only for `SUCCESS_WITH_RESTART`
    pub fn is_restart_necessary(&self) -> bool {
        self.status().is_restart_necessary()
    }

    /// Dependency findings; a satisfied (empty) impact for statuses without one
    pub fn dependency_impact(&self) -> &DependencyImpact {
        match self {
            Self::SuccessWithMissingDependencies(impact)
            | Self::DependenciesToEnable(impact)
            | Self::UnsatisfiedDependencies(impact)
            | Self::DependenciesToDisable(impact)
            | Self::DependenciesToUninstall(impact)
            | Self::UnsatisfiedDependenciesAfterUpdate(impact) => impact,
            _ => &SATISFIED,
        }
    }

    /// Short human-readable summary
    pub fn describe(&self) -> String {
        let impact = self.dependency_impact();
        match self {
            Self::DependenciesToEnable(_) => {
                format!("{}: {}", self.status(), join(&impact.to_enable))
            }
            Self::DependenciesToDisable(_) => {
                format!("{}: {}", self.status(), join(&impact.to_disable))
            }
            Self::DependenciesToUninstall(_) => {
                format!("{}: {}", self.status(), join(&impact.to_uninstall))
            }
            Self::UnsatisfiedDependencies(_) | Self::UnsatisfiedDependenciesAfterUpdate(_) => {
                format!("{}: {}", self.status(), list(&impact.unsatisfied))
            }
            Self::SuccessWithMissingDependencies(_) => {
                format!("{}: {}", self.status(), list(&impact.missing))
            }
            _ => self.status().to_string(),
        }
    }
}

fn join(names: &BTreeSet<String>) -> String {
    names.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

fn list(entries: &BTreeSet<UnsatisfiedDependency>) -> String {
    entries
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl fmt::Display for OperationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl From<&OperationResult> for OperationStatus {
    fn from(result: &OperationResult) -> Self {
        result.status()
    }
}
