//! Lifecycle status classification
//!
//! Folds the resolver's findings and the request's preconditions into one
//! [`OperationResult`]. Several conditions can hold at once; the rules below
//! are evaluated in order and the first match wins.

use plugman_graph::Plugin;
use plugman_version::Version;
use tracing::debug;

use crate::operation::OperationKind;
use crate::result::{DependencyImpact, OperationResult};


/// Signals raised by artifact handling before resolution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArtifactSignals {
    /// Descriptor or archive failed structural validation
    pub corrupted: bool,

    /// Artifact could not be stored in the staging area
    pub upload_failed: bool,

    /// Staged artifact could not be moved into the plugins directory
    pub install_file_failed: bool,
}

/// Everything the classifier looks at
#[derive(Debug, Clone)]
pub struct ClassificationInput<'a> {
    pub operation: OperationKind,

    /// Target plugin, if present in the registry
    pub target: Option<&'a Plugin>,

    /// Version requested by an update or install
    pub requested_version: Option<Version>,

    pub signals: ArtifactSignals,

    /// Policy permits enabling the target
    pub enabling_allowed: bool,

    /// Caller accepted the cascading changes
    pub confirmed: bool,

    /// Applying the change needs a process restart
    pub restart_required: bool,

    pub impact: &'a DependencyImpact,
}

impl<'a> ClassificationInput<'a> {
    /// Input for `operation` with no signals raised and nothing confirmed
    pub fn new(
        operation: OperationKind,
        target: Option<&'a Plugin>,
        impact: &'a DependencyImpact,
    ) -> Self {
        Self {
            operation,
            target,
            requested_version: None,
            signals: ArtifactSignals::default(),
            enabling_allowed: true,
            confirmed: false,
            restart_required: false,
            impact,
        }
    }
}

type Rule = fn(&ClassificationInput<'_>) -> Option<OperationResult>;

/// Classification rules in priority order
const RULES: [(&str, Rule); 14] = [
    ("system plugin protection", system_plugin),
    ("corrupted plugin", corrupted_plugin),
    ("artifact storage failure", artifact_storage),
    ("downgrade", downgrade),
    ("dependency cycle", dependency_cycle),
    ("enabling policy", enabling_policy),
    ("missing plugin", missing_plugin),
    ("dependencies to enable", dependencies_to_enable),
    ("dependencies to disable", dependencies_to_disable),
    ("dependencies to uninstall", dependencies_to_uninstall),
    ("unsatisfied dependencies", unsatisfied_dependencies),
    ("missing dependencies tolerated", missing_dependencies_tolerated),
    ("restart required", restart_required),
    ("success", success),
];

/// Maps classification input onto exactly one operation result
#[derive(Debug, Clone, Copy, Default)]
pub struct LifecycleStatusClassifier;

impl LifecycleStatusClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify; pure function of `input`
    pub fn classify(&self, input: &ClassificationInput<'_>) -> OperationResult {
        RULES
            .iter()
            .find_map(|(name, rule)| {
                let result = rule(input)?;
                debug!(
                    "Classified {} as {} (rule: {})",
                    input.operation,
                    result.status(),
                    name
                );
                Some(result)
            })
            .unwrap_or(OperationResult::Success)
    }
}

fn target_is_system(input: &ClassificationInput<'_>) -> bool {
    input.target.map(|t| t.is_system).unwrap_or(false)
}

fn system_plugin(input: &ClassificationInput<'_>) -> Option<OperationResult> {
    let protected = !input.impact.protected.is_empty();
    match input.operation {
        OperationKind::Disable if target_is_system(input) || protected => {
            Some(OperationResult::SystemPluginDisabling)
        }
        OperationKind::Uninstall if target_is_system(input) || protected => {
            Some(OperationResult::SystemPluginUninstalling)
        }
        OperationKind::Update if target_is_system(input) => {
            Some(OperationResult::SystemPluginUpdating)
        }
        _ => None,
    }
}

fn corrupted_plugin(input: &ClassificationInput<'_>) -> Option<OperationResult> {
    input.signals.corrupted.then_some(OperationResult::CorruptedPlugin)
}

fn artifact_storage(input: &ClassificationInput<'_>) -> Option<OperationResult> {
    if input.signals.upload_failed {
        Some(OperationResult::CannotUploadPlugin)
    } else if input.signals.install_file_failed {
        Some(OperationResult::CannotInstallPluginFile)
    } else {
        None
    }
}

fn downgrade(input: &ClassificationInput<'_>) -> Option<OperationResult> {
    if input.operation != OperationKind::Update {
        return None;
    }
    match (input.target, input.requested_version) {
        (Some(target), Some(requested)) if requested < target.version => {
            Some(OperationResult::CannotDowngradePlugin)
        }
        _ => None,
    }
}

fn dependency_cycle(input: &ClassificationInput<'_>) -> Option<OperationResult> {
    input
        .impact
        .has_cycle()
        .then_some(OperationResult::DependenciesCyclesExists)
}

fn enabling_policy(input: &ClassificationInput<'_>) -> Option<OperationResult> {
    (input.operation == OperationKind::Enable && !input.enabling_allowed)
        .then_some(OperationResult::PluginEnablingIsNotAllowed)
}

fn missing_plugin(input: &ClassificationInput<'_>) -> Option<OperationResult> {
    (input.operation != OperationKind::Install && input.target.is_none())
        .then_some(OperationResult::PluginNotExist)
}

fn dependencies_to_enable(input: &ClassificationInput<'_>) -> Option<OperationResult> {
    (!input.confirmed && !input.impact.to_enable.is_empty())
        .then(|| OperationResult::DependenciesToEnable(input.impact.clone()))
}

fn dependencies_to_disable(input: &ClassificationInput<'_>) -> Option<OperationResult> {
    (!input.confirmed && !input.impact.to_disable.is_empty())
        .then(|| OperationResult::DependenciesToDisable(input.impact.clone()))
}

fn dependencies_to_uninstall(input: &ClassificationInput<'_>) -> Option<OperationResult> {
    (!input.confirmed && !input.impact.to_uninstall.is_empty())
        .then(|| OperationResult::DependenciesToUninstall(input.impact.clone()))
}

fn unsatisfied_dependencies(input: &ClassificationInput<'_>) -> Option<OperationResult> {
    if input.impact.unsatisfied.is_empty() {
        return None;
    }
    match input.operation {
        OperationKind::Update => Some(OperationResult::UnsatisfiedDependenciesAfterUpdate(
            input.impact.clone(),
        )),
        _ => Some(OperationResult::UnsatisfiedDependencies(
            input.impact.clone(),
        )),
    }
}

/// Plugins landing disabled may leave dependencies missing
fn missing_dependencies_tolerated(input: &ClassificationInput<'_>) -> Option<OperationResult> {
    (!input.impact.missing.is_empty())
        .then(|| OperationResult::SuccessWithMissingDependencies(input.impact.clone()))
}

fn restart_required(input: &ClassificationInput<'_>) -> Option<OperationResult> {
    input
        .restart_required
        .then_some(OperationResult::SuccessWithRestart)
}

fn success(_: &ClassificationInput<'_>) -> Option<OperationResult> {
    Some(OperationResult::Success)
}
