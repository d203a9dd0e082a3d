//! Dependency resolution for lifecycle requests
//!
//! The resolver computes which other plugins have to change state for a
//! request to leave the graph consistent. It never mutates the graph.

use plugman_graph::{DependencyGraph, Plugin, PluginState};
use plugman_version::Version;
use std::borrow::Cow;
use std::collections::{BTreeSet, VecDeque};
use tracing::{debug, warn};

use crate::operation::{LifecycleRequest, Operation};
use crate::result::{DependencyImpact, ImpactInvariantError, UnsatisfiedDependency};

#[cfg(test)]
mod tests;

/// Computes the dependency impact of a lifecycle request
#[derive(Debug, Clone, Copy, Default)]
pub struct DependencyResolver;

impl DependencyResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve `request` against `graph`
    ///
    /// Cycle detection runs over the whole graph (as it would look after the
    /// request for installs and updates that change declared dependencies)
    /// before anything else; a cycle short-circuits with an otherwise empty
    /// impact. A target that is not present yields a satisfied impact and is
    /// left for the classifier to report.
    pub fn resolve(
        &self,
        request: &LifecycleRequest,
        graph: &DependencyGraph,
    ) -> Result<DependencyImpact, ImpactInvariantError> {
        let candidate = Self::candidate_graph(request, graph);

        if let Some(cycle) = candidate.detect_cycle() {
            warn!(
                "Dependency cycle blocks {} of {}: {}",
                request.kind(),
                request.plugin,
                cycle.join(" -> ")
            );
            return Ok(DependencyImpact::cyclic(cycle));
        }

        let target = candidate.get(&request.plugin).filter(|p| p.is_present());

        let impact = match (&request.operation, target) {
            (Operation::Install { descriptor }, _) => Self::resolve_install(&candidate, descriptor),
            (_, None) => {
                debug!("Plugin {} is not present, nothing to resolve", request.plugin);
                DependencyImpact::satisfied()
            }
            (Operation::Enable, Some(target)) => Self::resolve_enable(&candidate, target),
            (Operation::Disable, Some(target)) => Self::resolve_disable(&candidate, target),
            (Operation::Uninstall, Some(target)) => Self::resolve_uninstall(&candidate, target),
            (Operation::Update { version, .. }, Some(target)) => {
                let mut impact = Self::resolve_update(&candidate, target, version);
                if target.is_loaded() {
                    Self::collect_enable(&candidate, &target.name, &mut impact);
                } else {
                    // Stays disabled, so unmet declarations only get reported
                    impact.missing = Self::direct_unsatisfied(&candidate, target);
                }
                impact
            }
        };

        impact.check_disjoint()?;

        debug!(
            "Resolved {} of {}: enable={:?} disable={:?} uninstall={:?} unsatisfied={} protected={:?}",
            request.kind(),
            request.plugin,
            impact.to_enable,
            impact.to_disable,
            impact.to_uninstall,
            impact.unsatisfied.len(),
            impact.protected
        );

        Ok(impact)
    }

    /// The graph as it would look once the request's declarations apply
    fn candidate_graph<'g>(
        request: &LifecycleRequest,
        graph: &'g DependencyGraph,
    ) -> Cow<'g, DependencyGraph> {
        match &request.operation {
            Operation::Install { descriptor } => {
                let mut candidate = graph.clone();
                let staged = if candidate.contains(&descriptor.name) {
                    candidate.replace_plugin(descriptor.clone()).map(|_| ())
                } else {
                    candidate.add_plugin(descriptor.clone())
                };
                match staged {
                    Ok(()) => Cow::Owned(candidate),
                    Err(_) => Cow::Borrowed(graph),
                }
            }
            Operation::Update {
                version,
                dependencies: Some(dependencies),
            } => match graph.get(&request.plugin) {
                Some(current) => {
                    let mut replacement = current.clone();
                    replacement.version = *version;
                    replacement.dependencies = dependencies.clone();
                    let mut candidate = graph.clone();
                    match candidate.replace_plugin(replacement) {
                        Ok(_) => Cow::Owned(candidate),
                        Err(_) => Cow::Borrowed(graph),
                    }
                }
                None => Cow::Borrowed(graph),
            },
            _ => Cow::Borrowed(graph),
        }
    }

    fn resolve_install(graph: &DependencyGraph, descriptor: &Plugin) -> DependencyImpact {
        DependencyImpact {
            missing: Self::direct_unsatisfied(graph, descriptor),
            ..DependencyImpact::satisfied()
        }
    }

    /// Declared dependencies of `plugin` that no present plugin meets
    fn direct_unsatisfied(
        graph: &DependencyGraph,
        plugin: &Plugin,
    ) -> BTreeSet<UnsatisfiedDependency> {
        plugin
            .dependencies
            .iter()
            .filter_map(|dependency| {
                let found = graph.get(&dependency.plugin).filter(|p| p.is_present());
                let satisfied = found
                    .map(|p| dependency.constraint.satisfies(&p.version))
                    .unwrap_or(false);

                (!satisfied).then(|| UnsatisfiedDependency {
                    dependent: plugin.name.clone(),
                    dependency: dependency.plugin.clone(),
                    constraint: dependency.constraint,
                    found: found.map(|p| p.version),
                })
            })
            .collect()
    }

    fn resolve_enable(graph: &DependencyGraph, target: &Plugin) -> DependencyImpact {
        let mut impact = DependencyImpact::satisfied();
        if target.is_loaded() {
            return impact;
        }
        Self::collect_enable(graph, &target.name, &mut impact);
        impact
    }

    /// Collect the disabled dependencies of `root` to enable and the
    /// constraints that no installed plugin can meet
    ///
    /// A plugin whose version fails any constraint is blocked: it is neither
    /// enabled nor expanded. Blocking can cut off plugins reached earlier, so
    /// the walk repeats until no new plugin gets blocked.
    fn collect_enable(graph: &DependencyGraph, root: &str, impact: &mut DependencyImpact) {
        let mut blocked = BTreeSet::new();
        loop {
            let to_enable = Self::enable_closure(graph, root, &blocked, &mut impact.unsatisfied);
            let newly_blocked: Vec<String> = impact
                .unsatisfied
                .iter()
                .filter(|u| u.found.is_some() && !blocked.contains(&u.dependency))
                .map(|u| u.dependency.clone())
                .collect();

            if newly_blocked.is_empty() {
                impact.to_enable.extend(to_enable);
                return;
            }
            blocked.extend(newly_blocked);
        }
    }

    /// Disabled plugins reachable from `root` through dependencies, skipping
    /// `blocked` ones
    fn enable_closure(
        graph: &DependencyGraph,
        root: &str,
        blocked: &BTreeSet<String>,
        unsatisfied: &mut BTreeSet<UnsatisfiedDependency>,
    ) -> BTreeSet<String> {
        let mut to_enable = BTreeSet::new();
        let mut expanded = BTreeSet::from([root.to_string()]);
        let mut queue = VecDeque::from([root.to_string()]);

        while let Some(current) = queue.pop_front() {
            for edge in graph.dependencies_of(&current) {
                let required = graph.get(&edge.required).filter(|p| p.is_present());

                match required {
                    None => {
                        unsatisfied.insert(UnsatisfiedDependency {
                            dependent: edge.dependent.clone(),
                            dependency: edge.required.clone(),
                            constraint: edge.constraint,
                            found: None,
                        });
                    }
                    Some(plugin) if !edge.constraint.satisfies(&plugin.version) => {
                        unsatisfied.insert(UnsatisfiedDependency {
                            dependent: edge.dependent.clone(),
                            dependency: edge.required.clone(),
                            constraint: edge.constraint,
                            found: Some(plugin.version),
                        });
                    }
                    Some(plugin) if plugin.is_loaded() || blocked.contains(&plugin.name) => {}
                    Some(plugin) => {
                        to_enable.insert(plugin.name.clone());
                        if expanded.insert(plugin.name.clone()) {
                            queue.push_back(plugin.name.clone());
                        }
                    }
                }
            }
        }

        to_enable
    }

    fn resolve_disable(graph: &DependencyGraph, target: &Plugin) -> DependencyImpact {
        let mut impact = DependencyImpact::satisfied();
        Self::collect_dependents(
            graph,
            target,
            Plugin::is_loaded,
            |impact, plugin| {
                impact.to_disable.insert(plugin.name.clone());
            },
            &mut impact,
        );
        impact
    }

    fn resolve_uninstall(graph: &DependencyGraph, target: &Plugin) -> DependencyImpact {
        let mut impact = DependencyImpact::satisfied();
        Self::collect_dependents(
            graph,
            target,
            Plugin::is_present,
            |impact, plugin| {
                impact.to_uninstall.insert(plugin.name.clone());
            },
            &mut impact,
        );
        impact
    }

    /// Transitive closure over dependents matching `affected`
    ///
    /// System plugins are recorded as protected instead of being handed to
    /// `include`.
    fn collect_dependents(
        graph: &DependencyGraph,
        target: &Plugin,
        affected: fn(&Plugin) -> bool,
        include: impl Fn(&mut DependencyImpact, &Plugin),
        impact: &mut DependencyImpact,
    ) {
        let mut seen = BTreeSet::from([target.name.clone()]);
        let mut queue = VecDeque::from([target.name.clone()]);

        while let Some(current) = queue.pop_front() {
            for dependent in graph.dependents_of(&current) {
                if !affected(dependent) || !seen.insert(dependent.name.clone()) {
                    continue;
                }

                if dependent.is_system {
                    impact.protected.insert(dependent.name.clone());
                } else {
                    include(impact, dependent);
                }
                queue.push_back(dependent.name.clone());
            }
        }
    }

    fn resolve_update(
        graph: &DependencyGraph,
        target: &Plugin,
        version: &Version,
    ) -> DependencyImpact {
        let mut impact = DependencyImpact::satisfied();

        for edge in graph.incoming_edges(&target.name) {
            let Some(dependent) = graph.get(&edge.dependent) else {
                continue;
            };
            if matches!(dependent.state, PluginState::NotInstalled | PluginState::MarkedForUninstall) {
                continue;
            }
            if !edge.constraint.satisfies(version) {
                impact.unsatisfied.insert(UnsatisfiedDependency {
                    dependent: edge.dependent.clone(),
                    dependency: target.name.clone(),
                    constraint: edge.constraint,
                    found: Some(*version),
                });
            }
        }

        impact
    }
}
