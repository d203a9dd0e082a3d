//! Plugin model and dependency graph

pub mod graph;
pub mod plugin;


pub use graph::{DependencyEdge, DependencyGraph, GraphError};
pub use plugin::{Dependency, Plugin, PluginState};
pub use plugman_version::{Version, VersionConstraint};
