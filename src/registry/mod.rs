//! Plugin registry persistence
//!
//! Builds a dependency graph from `plugin.yaml` descriptors found on disk and
//! saves or restores the graph, lifecycle states included, as a YAML
//! snapshot.

use anyhow::Result;
use plugman_graph::DependencyGraph;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::PolicyConfig;

pub mod descriptor;
pub mod snapshot;

#[cfg(test)]
mod tests;

pub use descriptor::{DescriptorDependency, PluginDescriptor};
pub use snapshot::GraphSnapshot;

/// Descriptor file names recognised while scanning
const MANIFEST_NAMES: [&str; 2] = ["plugin.yaml", "plugin.yml"];

/// Discovers plugins from descriptor files
#[derive(Debug, Clone, Default)]
pub struct ManifestRegistry {
    directories: Vec<PathBuf>,
    policy: PolicyConfig,
}

impl ManifestRegistry {
    pub fn new(directories: Vec<PathBuf>, policy: PolicyConfig) -> Self {
        Self {
            directories,
            policy,
        }
    }

    /// Add a directory to scan
    pub fn add_directory(&mut self, dir: PathBuf) {
        self.directories.push(dir);
    }

    /// Scan all directories into a graph of disabled plugins
    ///
    /// Unreadable or invalid descriptors are skipped with a warning. When two
    /// descriptors share a name the first one found wins.
    pub async fn discover(&self) -> Result<DependencyGraph> {
        let mut graph = DependencyGraph::new();
        for dir in &self.directories {
            self.scan_directory(dir, &mut graph).await?;
        }
        info!("Discovered {} plugin(s)", graph.len());
        Ok(graph)
    }

    async fn scan_directory(&self, dir: &Path, graph: &mut DependencyGraph) -> Result<()> {
        if !dir.exists() {
            debug!("Skipping missing plugin directory {:?}", dir);
            return Ok(());
        }

        info!("Scanning plugin directory: {:?}", dir);

        let mut manifests: Vec<PathBuf> = WalkDir::new(dir)
            .into_iter()
            // Hidden entries hold retired plugin files
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                e.file_name()
                    .to_str()
                    .is_some_and(|name| MANIFEST_NAMES.contains(&name))
            })
            .map(|e| e.into_path())
            .collect();
        manifests.sort();

        for path in manifests {
            match Self::load_manifest(&path).await {
                Ok(descriptor) => {
                    let mut plugin = descriptor.into_plugin();
                    plugin.is_system |= self.policy.is_system(&plugin.name);
                    if graph.contains(&plugin.name) {
                        warn!(
                            "Ignoring duplicate plugin {} declared in {:?}",
                            plugin.name, path
                        );
                        continue;
                    }
                    debug!("Found plugin {} {} in {:?}", plugin.name, plugin.version, path);
                    graph.add_plugin(plugin)?;
                }
                Err(e) => {
                    warn!("Failed to load plugin manifest {:?}: {}", path, e);
                }
            }
        }

        Ok(())
    }

    async fn load_manifest(path: &Path) -> Result<PluginDescriptor> {
        let content = tokio::fs::read_to_string(path).await?;
        PluginDescriptor::from_yaml(&content)
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|name| name.starts_with('.'))
}

/// Load the plugin graph for a host
///
/// The snapshot is authoritative when it exists. Descriptors discovered on
/// disk that the snapshot does not know are added as disabled plugins.
pub async fn load_graph(
    snapshot_file: &Path,
    registry: &ManifestRegistry,
) -> Result<DependencyGraph> {
    let discovered = registry.discover().await?;

    if !snapshot_file.exists() {
        return Ok(discovered);
    }

    let mut graph = GraphSnapshot::from_file(snapshot_file)?.into_graph()?;
    for plugin in discovered.plugins() {
        if !graph.contains(&plugin.name) {
            info!("Registering newly discovered plugin {}", plugin.name);
            graph.add_plugin(plugin.clone())?;
        }
    }
    for name in &registry.policy.system_plugins {
        if graph.contains(name) {
            graph.set_system(name, true)?;
        }
    }

    Ok(graph)
}
