//! Plugman library
//!
//! Dependency resolution and lifecycle status classification for a plugin
//! host: enabling, disabling, installing, updating and uninstalling plugins
//! while keeping the dependency graph consistent.

pub mod classifier;
pub mod cli;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod manager;
pub mod operation;
pub mod registry;
pub mod resolver;
pub mod result;

pub use classifier::{ArtifactSignals, ClassificationInput, LifecycleStatusClassifier};
pub use collaborators::{
    ArtifactStorage, ArtifactValidator, FileSystemStorage, PluginArtifact, RestartPredicate,
    RetiredFiles, StagedArtifact,
};
pub use config::Config;
pub use error::{LifecycleError, LifecycleResult};
pub use manager::PluginManager;
pub use operation::{LifecycleRequest, Operation, OperationKind};
pub use plugman_graph::{Dependency, DependencyGraph, GraphError, Plugin, PluginState};
pub use plugman_version::{Version, VersionConstraint};
pub use registry::{GraphSnapshot, ManifestRegistry, PluginDescriptor};
pub use resolver::DependencyResolver;
pub use result::{DependencyImpact, OperationResult, OperationStatus, UnsatisfiedDependency};

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use collaborators::LoadedCodeRestart;

/// Application context wiring configuration, storage and the manager
pub struct Plugman {
    config: Config,
    manager: PluginManager,
    snapshot_file: PathBuf,
}

impl Plugman {
    /// Load the plugin graph described by `config`
    pub async fn load(config: Config) -> Result<Self> {
        let paths = &config.paths;
        let snapshot_file = paths.snapshot_file()?;
        let registry = ManifestRegistry::new(paths.scan_directories()?, config.policy.clone());
        let graph = registry::load_graph(&snapshot_file, &registry).await?;

        let storage = Arc::new(FileSystemStorage::new(
            paths.staging_directory()?,
            paths.plugins_directory()?,
        ));
        let manager = PluginManager::new(graph, storage)
            .with_restart_predicate(Arc::new(LoadedCodeRestart::new(
                config.policy.restart_on_enable,
            )))
            .with_policy(config.policy.clone())?;

        Ok(Self {
            config,
            manager,
            snapshot_file,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn manager(&self) -> &PluginManager {
        &self.manager
    }

    /// Write the current graph to the configured snapshot file
    pub async fn save(&self) -> Result<()> {
        let graph = self.manager.snapshot().await;
        GraphSnapshot::from_graph(&graph).save_to_file(&self.snapshot_file)?;
        info!("Saved plugin snapshot to {:?}", self.snapshot_file);
        Ok(())
    }
}
