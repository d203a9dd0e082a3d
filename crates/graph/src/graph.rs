//! Dependency graph over plugins
//!
//! Nodes are keyed by plugin name and every traversal visits names in
//! lexical order, so repeated queries on an unchanged graph return the same
//! sequences (including cycle paths).

use plugman_version::VersionConstraint;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use thiserror::Error;
use tracing::debug;

use crate::plugin::{Dependency, Plugin, PluginState};

/// Errors raised by graph mutations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("plugin '{0}' is already registered")]
    DuplicatePlugin(String),

    #[error("plugin '{0}' is not registered")]
    UnknownPlugin(String),

    #[error("dependency cycle: {}", .0.join(" -> "))]
    Cycle(Vec<String>),
}

/// A directed "depends on" edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DependencyEdge {
    /// Plugin declaring the dependency
    pub dependent: String,

    /// Plugin being depended on
    pub required: String,

    /// Versions of `required` acceptable to `dependent`
    pub constraint: VersionConstraint,
}

/// Plugins and the dependency edges between them
///
/// Edges may point at plugins that are not registered; such edges are
/// reported as unsatisfied by the resolver rather than rejected here.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: BTreeMap<String, Plugin>,
    /// dependent -> {(required, constraint)}
    edges: BTreeMap<String, BTreeSet<(String, VersionConstraint)>>,
    /// required -> {dependent}
    reverse_edges: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from a set of plugin descriptors
    pub fn from_plugins(plugins: impl IntoIterator<Item = Plugin>) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        for plugin in plugins {
            graph.add_plugin(plugin)?;
        }
        Ok(graph)
    }

    /// Register a plugin together with the edges of its declared dependencies
    pub fn add_plugin(&mut self, plugin: Plugin) -> Result<(), GraphError> {
        if self.nodes.contains_key(&plugin.name) {
            return Err(GraphError::DuplicatePlugin(plugin.name));
        }

        debug!("Adding plugin {} {}", plugin.name, plugin.version);
        for dependency in &plugin.dependencies {
            self.insert_edge(&plugin.name, dependency);
        }
        self.nodes.insert(plugin.name.clone(), plugin);
        Ok(())
    }

    /// Add a dependency edge; adding the same edge twice is a no-op
    pub fn add_edge(&mut self, edge: DependencyEdge) -> Result<(), GraphError> {
        let node = self
            .nodes
            .get_mut(&edge.dependent)
            .ok_or_else(|| GraphError::UnknownPlugin(edge.dependent.clone()))?;

        let dependency = Dependency::new(edge.required.clone(), edge.constraint);
        if !node.dependencies.contains(&dependency) {
            node.dependencies.push(dependency.clone());
        }
        self.insert_edge(&edge.dependent, &dependency);
        Ok(())
    }

    fn insert_edge(&mut self, dependent: &str, dependency: &Dependency) {
        self.edges
            .entry(dependent.to_string())
            .or_default()
            .insert((dependency.plugin.clone(), dependency.constraint));
        self.reverse_edges
            .entry(dependency.plugin.clone())
            .or_default()
            .insert(dependent.to_string());
    }

    fn remove_outgoing_edges(&mut self, dependent: &str) {
        let Some(outgoing) = self.edges.remove(dependent) else {
            return;
        };

        for (required, _) in outgoing {
            if let Some(dependents) = self.reverse_edges.get_mut(&required) {
                dependents.remove(dependent);
                if dependents.is_empty() {
                    self.reverse_edges.remove(&required);
                }
            }
        }
    }

    /// Replace a registered plugin, rebuilding its outgoing edges
    pub fn replace_plugin(&mut self, plugin: Plugin) -> Result<Plugin, GraphError> {
        if !self.nodes.contains_key(&plugin.name) {
            return Err(GraphError::UnknownPlugin(plugin.name));
        }

        self.remove_outgoing_edges(&plugin.name);
        for dependency in &plugin.dependencies {
            self.insert_edge(&plugin.name, dependency);
        }

        let name = plugin.name.clone();
        self.nodes
            .insert(name.clone(), plugin)
            .ok_or(GraphError::UnknownPlugin(name))
    }

    /// Remove a plugin and its outgoing edges
    ///
    /// Edges declared by other plugins towards the removed one are kept and
    /// show up as unresolved dependencies.
    pub fn remove_plugin(&mut self, name: &str) -> Result<Plugin, GraphError> {
        let plugin = self
            .nodes
            .remove(name)
            .ok_or_else(|| GraphError::UnknownPlugin(name.to_string()))?;
        self.remove_outgoing_edges(name);
        debug!("Removed plugin {}", name);
        Ok(plugin)
    }

    /// Set the lifecycle state of a registered plugin
    pub fn set_state(&mut self, name: &str, state: PluginState) -> Result<(), GraphError> {
        let node = self
            .nodes
            .get_mut(name)
            .ok_or_else(|| GraphError::UnknownPlugin(name.to_string()))?;
        debug!("Plugin {}: {} -> {}", name, node.state, state);
        node.state = state;
        Ok(())
    }

    /// Flag a registered plugin as a system plugin
    pub fn set_system(&mut self, name: &str, is_system: bool) -> Result<(), GraphError> {
        let node = self
            .nodes
            .get_mut(name)
            .ok_or_else(|| GraphError::UnknownPlugin(name.to_string()))?;
        node.is_system = is_system;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Plugin> {
        self.nodes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// All plugins in name order
    pub fn plugins(&self) -> impl Iterator<Item = &Plugin> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Edges leaving `name`, ordered by required plugin name
    pub fn dependencies_of(&self, name: &str) -> Vec<DependencyEdge> {
        self.edges
            .get(name)
            .map(|outgoing| {
                outgoing
                    .iter()
                    .map(|(required, constraint)| DependencyEdge {
                        dependent: name.to_string(),
                        required: required.clone(),
                        constraint: *constraint,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Registered plugins whose constraints reference `name`, in name order
    pub fn dependents_of(&self, name: &str) -> Vec<&Plugin> {
        self.reverse_edges
            .get(name)
            .map(|dependents| {
                dependents
                    .iter()
                    .filter_map(|dependent| self.nodes.get(dependent))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Edges entering `name`, ordered by dependent name
    pub fn incoming_edges(&self, name: &str) -> Vec<DependencyEdge> {
        self.dependents_of(name)
            .into_iter()
            .flat_map(|dependent| {
                self.dependencies_of(&dependent.name)
                    .into_iter()
                    .filter(move |edge| edge.required == name)
            })
            .collect()
    }

    /// Every registered plugin depending on `name` directly or indirectly
    pub fn transitive_dependents(&self, name: &str) -> BTreeSet<String> {
        let mut found = BTreeSet::new();
        let mut queue = VecDeque::from([name.to_string()]);

        while let Some(current) = queue.pop_front() {
            for dependent in self.dependents_of(&current) {
                if dependent.name != name && found.insert(dependent.name.clone()) {
                    queue.push_back(dependent.name.clone());
                }
            }
        }

        found
    }

    /// Find a dependency cycle anywhere in the graph
    ///
    /// Returns the path around the cycle with the first node repeated at the
    /// end, e.g. `[a, b, a]`. Only edges between registered plugins count.
    pub fn detect_cycle(&self) -> Option<Vec<String>> {
        let mut visited = HashSet::new();
        let mut on_stack = HashSet::new();
        let mut path = Vec::new();

        for name in self.nodes.keys() {
            if !visited.contains(name.as_str()) {
                if let Some(cycle) = self.dfs_cycle(name, &mut visited, &mut on_stack, &mut path) {
                    return Some(cycle);
                }
            }
        }

        None
    }

    fn dfs_cycle<'a>(
        &'a self,
        name: &'a str,
        visited: &mut HashSet<&'a str>,
        on_stack: &mut HashSet<&'a str>,
        path: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        visited.insert(name);
        on_stack.insert(name);
        path.push(name);

        if let Some(outgoing) = self.edges.get(name) {
            for (required, _) in outgoing {
                let required = required.as_str();
                if !self.nodes.contains_key(required) {
                    continue;
                }
                if on_stack.contains(required) {
                    let start = path.iter().position(|n| *n == required).unwrap_or(0);
                    let mut cycle: Vec<String> = path[start..].iter().map(|n| n.to_string()).collect();
                    cycle.push(required.to_string());
                    return Some(cycle);
                }
                if !visited.contains(required) {
                    if let Some(cycle) = self.dfs_cycle(required, visited, on_stack, path) {
                        return Some(cycle);
                    }
                }
            }
        }

        path.pop();
        on_stack.remove(name);
        None
    }

    /// Registered plugins ordered so that dependencies precede dependents
    pub fn topological_order(&self) -> Result<Vec<String>, GraphError> {
        if let Some(cycle) = self.detect_cycle() {
            return Err(GraphError::Cycle(cycle));
        }

        let mut remaining: BTreeMap<&str, usize> = self
            .nodes
            .keys()
            .map(|name| {
                let pending = self
                    .edges
                    .get(name)
                    .map(|outgoing| {
                        outgoing
                            .iter()
                            .filter(|(required, _)| self.nodes.contains_key(required))
                            .map(|(required, _)| required)
                            .collect::<BTreeSet<_>>()
                            .len()
                    })
                    .unwrap_or(0);
                (name.as_str(), pending)
            })
            .collect();

        let mut ready: BTreeSet<&str> = remaining
            .iter()
            .filter(|(_, pending)| **pending == 0)
            .map(|(name, _)| *name)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(name) = ready.pop_first() {
            order.push(name.to_string());
            if let Some(dependents) = self.reverse_edges.get(name) {
                for dependent in dependents {
                    if let Some(pending) = remaining.get_mut(dependent.as_str()) {
                        *pending -= 1;
                        if *pending == 0 {
                            ready.insert(dependent.as_str());
                        }
                    }
                }
            }
        }

        Ok(order)
    }
}
