//! Dependency impact computed by the resolver

use plugman_version::{Version, VersionConstraint};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// A dependency constraint that cannot be met
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnsatisfiedDependency {
    /// Plugin declaring the constraint
    pub dependent: String,

    /// Plugin the constraint refers to
    pub dependency: String,

    /// The declared constraint
    pub constraint: VersionConstraint,

    /// Version that fails the constraint; `None` when the plugin is absent
    pub found: Option<Version>,
}

impl fmt::Display for UnsatisfiedDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} requires {} {}",
            self.dependent, self.dependency, self.constraint
        )?;
        match &self.found {
            Some(version) => write!(f, " (found {})", version),
            None => write!(f, " (missing)"),
        }
    }
}

/// Raised when an impact lists one plugin under two different state changes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("plugin '{plugin}' appears in both {first} and {second}")]
pub struct ImpactInvariantError {
    pub plugin: String,
    pub first: &'static str,
    pub second: &'static str,
}

/// State changes and blocking conditions implied by a lifecycle request
///
/// `to_enable`, `to_disable` and `to_uninstall` are disjoint. An impact with
/// a cycle has every other set empty.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DependencyImpact {
    /// Plugins that must be enabled alongside the target
    pub to_enable: BTreeSet<String>,

    /// Enabled plugins that must be disabled alongside the target
    pub to_disable: BTreeSet<String>,

    /// Installed plugins that must be uninstalled alongside the target
    pub to_uninstall: BTreeSet<String>,

    /// Constraints that cannot be met
    pub unsatisfied: BTreeSet<UnsatisfiedDependency>,

    /// Unmet constraints of a plugin that stays disabled; reported, not
    /// blocking
    pub missing: BTreeSet<UnsatisfiedDependency>,

    /// System plugins that would have to be disabled or uninstalled
    pub protected: BTreeSet<String>,

    /// Dependency cycle found in the graph
    pub cycle: Option<Vec<String>>,
}

impl DependencyImpact {
    /// An impact with nothing to do and nothing blocking
    pub const fn satisfied() -> Self {
        Self {
            to_enable: BTreeSet::new(),
            to_disable: BTreeSet::new(),
            to_uninstall: BTreeSet::new(),
            unsatisfied: BTreeSet::new(),
            missing: BTreeSet::new(),
            protected: BTreeSet::new(),
            cycle: None,
        }
    }

    /// An impact blocked by a dependency cycle
    pub fn cyclic(cycle: Vec<String>) -> Self {
        Self {
            cycle: Some(cycle),
            ..Self::satisfied()
        }
    }

    pub fn has_cycle(&self) -> bool {
        self.cycle.is_some()
    }

    /// Nothing to change and nothing blocking
    pub fn is_satisfied(&self) -> bool {
        self == &Self::satisfied()
    }

    /// Plugins named in `unsatisfied` as the declaring side
    pub fn unsatisfied_dependents(&self) -> BTreeSet<&str> {
        self.unsatisfied.iter().map(|u| u.dependent.as_str()).collect()
    }

    /// Plugins named in `unsatisfied` as the required side
    pub fn unsatisfied_dependencies(&self) -> BTreeSet<&str> {
        self.unsatisfied.iter().map(|u| u.dependency.as_str()).collect()
    }

    /// Plugins named in `missing` as the required side
    pub fn missing_dependencies(&self) -> BTreeSet<&str> {
        self.missing.iter().map(|u| u.dependency.as_str()).collect()
    }

    /// Check that no plugin appears in two of the state-change sets
    pub fn check_disjoint(&self) -> Result<(), ImpactInvariantError> {
        let sets = [
            ("to_enable", &self.to_enable),
            ("to_disable", &self.to_disable),
            ("to_uninstall", &self.to_uninstall),
        ];

        for (i, (first, left)) in sets.iter().enumerate() {
            for (second, right) in &sets[i + 1..] {
                if let Some(plugin) = left.intersection(right).next() {
                    return Err(ImpactInvariantError {
                        plugin: plugin.clone(),
                        first: *first,
                        second: *second,
                    });
                }
            }
        }

        Ok(())
    }
}
