//! Plugin lifecycle manager
//!
//! The manager serialises lifecycle operations behind one write lock, runs
//! resolution and classification against the locked graph and applies the
//! change only when the classification is a success. A change is computed on
//! a copy of the graph and swapped in at the end, so a failure part way leaves
//! the registry untouched.

use chrono::Utc;
use plugman_graph::{DependencyGraph, GraphError, Plugin, PluginState};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::classifier::{ArtifactSignals, ClassificationInput, LifecycleStatusClassifier};
use crate::collaborators::{
    ArtifactStorage, ArtifactValidator, DescriptorValidator, LoadedCodeRestart, PluginArtifact,
    RestartPredicate, RetiredFiles, StagedArtifact,
};
use crate::config::PolicyConfig;
use crate::error::{LifecycleError, LifecycleResult};
use crate::operation::{LifecycleRequest, Operation, OperationKind};
use crate::resolver::DependencyResolver;
use crate::result::{DependencyImpact, OperationResult};


/// Outcome of resolving and classifying one request
#[derive(Debug)]
struct Evaluation {
    result: OperationResult,
    impact: DependencyImpact,
    restart_required: bool,
}

/// Coordinates lifecycle operations over a plugin graph
pub struct PluginManager {
    graph: RwLock<DependencyGraph>,
    resolver: DependencyResolver,
    classifier: LifecycleStatusClassifier,
    storage: Arc<dyn ArtifactStorage>,
    validator: Arc<dyn ArtifactValidator>,
    restart: Arc<dyn RestartPredicate>,
    policy: PolicyConfig,
}

impl PluginManager {
    /// Manager over `graph` with descriptor validation and the default
    /// restart rule
    pub fn new(graph: DependencyGraph, storage: Arc<dyn ArtifactStorage>) -> Self {
        Self {
            graph: RwLock::new(graph),
            resolver: DependencyResolver::new(),
            classifier: LifecycleStatusClassifier::new(),
            storage,
            validator: Arc::new(DescriptorValidator::new()),
            restart: Arc::new(LoadedCodeRestart::default()),
            policy: PolicyConfig::default(),
        }
    }

    pub fn with_validator(mut self, validator: Arc<dyn ArtifactValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_restart_predicate(mut self, restart: Arc<dyn RestartPredicate>) -> Self {
        self.restart = restart;
        self
    }

    /// Apply a lifecycle policy; registered plugins named as system plugins
    /// are flagged immediately
    pub fn with_policy(mut self, policy: PolicyConfig) -> LifecycleResult<Self> {
        let graph = self.graph.get_mut();
        for name in &policy.system_plugins {
            if graph.contains(name) {
                graph.set_system(name, true)?;
            }
        }
        self.policy = policy;
        Ok(self)
    }

    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    /// Resolve, classify and, on success, apply a lifecycle request
    pub async fn execute(&self, request: LifecycleRequest) -> LifecycleResult<OperationResult> {
        info!(
            "Requested {} of {}{}",
            request.kind(),
            request.plugin,
            if request.confirmed { " (confirmed)" } else { "" }
        );

        let mut graph = self.graph.write().await;
        let request = self.normalize(&graph, request);
        let evaluation = self.evaluate(&graph, &request, ArtifactSignals::default())?;

        if evaluation.result.is_success() {
            self.apply(&mut graph, &request, &evaluation).await?;
        }

        info!("{} of {}: {}", request.kind(), request.plugin, evaluation.result);
        Ok(evaluation.result)
    }

    /// Resolve and classify without applying anything
    pub async fn dry_run(&self, request: LifecycleRequest) -> LifecycleResult<OperationResult> {
        let graph = self.graph.read().await;
        let request = self.normalize(&graph, request);
        let evaluation = self.evaluate(&graph, &request, ArtifactSignals::default())?;
        debug!(
            "Dry run of {} for {}: {}",
            request.kind(),
            request.plugin,
            evaluation.result
        );
        Ok(evaluation.result)
    }

    /// Install or update a plugin from an artifact
    ///
    /// The artifact is staged and validated first. A plugin that is already
    /// present is updated to the artifact's version, anything else is
    /// installed disabled. Rejected artifacts are discarded from staging.
    pub async fn install_plugin(
        &self,
        artifact: PluginArtifact,
        confirmed: bool,
    ) -> LifecycleResult<OperationResult> {
        info!("Installing plugin artifact {}", artifact.file_name);
        let mut graph = self.graph.write().await;

        let staged = match self.storage.upload(&artifact).await {
            Ok(staged) => staged,
            Err(e) => {
                warn!("Failed to upload plugin artifact {}: {}", artifact.file_name, e);
                return Ok(self.classify_rejected_artifact(ArtifactSignals {
                    upload_failed: true,
                    ..ArtifactSignals::default()
                }));
            }
        };

        let descriptor = match self.validator.validate(&artifact) {
            Ok(descriptor) => descriptor,
            Err(e) => {
                warn!("{}", e);
                self.discard(&staged).await;
                return Ok(self.classify_rejected_artifact(ArtifactSignals {
                    corrupted: true,
                    ..ArtifactSignals::default()
                }));
            }
        };

        let mut request = LifecycleRequest::install(descriptor.clone());
        request.confirmed = confirmed;
        let request = self.normalize(&graph, request);

        let evaluation = match self.evaluate(&graph, &request, ArtifactSignals::default()) {
            Ok(evaluation) => evaluation,
            Err(e) => {
                self.discard(&staged).await;
                return Err(e);
            }
        };
        if !evaluation.result.is_success() {
            self.discard(&staged).await;
            info!("{} of {}: {}", request.kind(), request.plugin, evaluation.result);
            return Ok(evaluation.result);
        }

        if let Err(e) = self.storage.install(&staged, &descriptor).await {
            warn!("Failed to install plugin file for {}: {}", descriptor.name, e);
            self.discard(&staged).await;
            let signals = ArtifactSignals {
                install_file_failed: true,
                ..ArtifactSignals::default()
            };
            return Ok(self.evaluate(&graph, &request, signals)?.result);
        }

        self.apply(&mut graph, &request, &evaluation).await?;
        info!("{} of {}: {}", request.kind(), request.plugin, evaluation.result);
        Ok(evaluation.result)
    }

    /// Finalise restart marks
    ///
    /// Plugins marked for uninstall are removed together with their files and
    /// plugins marked for update become enabled. Returns the affected names.
    pub async fn complete_restart(&self) -> LifecycleResult<Vec<String>> {
        let mut graph = self.graph.write().await;
        let mut next = graph.clone();
        let mut finalised = Vec::new();
        let mut removed = Vec::new();

        for plugin in graph.plugins() {
            match plugin.state {
                PluginState::MarkedForUninstall => {
                    removed.push(next.remove_plugin(&plugin.name)?);
                }
                PluginState::MarkedForUpdate => {
                    next.set_state(&plugin.name, PluginState::Enabled)?;
                }
                _ => continue,
            }
            finalised.push(plugin.name.clone());
        }

        let retired = self.retire_files(&removed).await?;
        *graph = next;
        self.purge_files(&retired).await;

        if !finalised.is_empty() {
            info!("Restart finalised plugins: {}", finalised.join(", "));
        }
        Ok(finalised)
    }

    /// Registered plugin by name
    pub async fn plugin(&self, name: &str) -> Option<Plugin> {
        self.graph.read().await.get(name).cloned()
    }

    /// All registered plugins in name order
    pub async fn list_plugins(&self) -> Vec<Plugin> {
        self.graph.read().await.plugins().cloned().collect()
    }

    /// Plugin names with dependencies before their dependents
    pub async fn dependency_order(&self) -> Result<Vec<String>, GraphError> {
        self.graph.read().await.topological_order()
    }

    /// Copy of the current graph
    pub async fn snapshot(&self) -> DependencyGraph {
        self.graph.read().await.clone()
    }

    /// Turn an install of a present plugin into an update and apply the
    /// system plugin policy to install descriptors
    fn normalize(&self, graph: &DependencyGraph, request: LifecycleRequest) -> LifecycleRequest {
        let LifecycleRequest {
            plugin,
            operation,
            confirmed,
        } = request;

        let operation = match operation {
            Operation::Install { mut descriptor } => {
                descriptor.is_system |= self.policy.is_system(&descriptor.name);
                if graph.get(&descriptor.name).is_some_and(Plugin::is_present) {
                    debug!(
                        "Plugin {} is present, installing {} as an update",
                        descriptor.name, descriptor.version
                    );
                    Operation::Update {
                        version: descriptor.version,
                        dependencies: Some(descriptor.dependencies),
                    }
                } else {
                    Operation::Install { descriptor }
                }
            }
            other => other,
        };

        LifecycleRequest {
            plugin,
            operation,
            confirmed,
        }
    }

    fn evaluate(
        &self,
        graph: &DependencyGraph,
        request: &LifecycleRequest,
        signals: ArtifactSignals,
    ) -> LifecycleResult<Evaluation> {
        let impact = self.resolver.resolve(request, graph)?;
        let target = graph.get(&request.plugin).filter(|p| p.is_present());

        let changed = Self::changed_plugins(graph, request, &impact);
        let restart_required = self.restart.restart_required(request.kind(), &changed);

        let mut input = ClassificationInput::new(request.kind(), target, &impact);
        input.requested_version = request.operation.requested_version();
        input.signals = signals;
        input.enabling_allowed = self.policy.enabling_allowed(&request.plugin);
        input.confirmed = request.confirmed;
        input.restart_required = restart_required;
        let result = self.classifier.classify(&input);

        Ok(Evaluation {
            result,
            impact,
            restart_required,
        })
    }

    /// Plugins whose state the request would touch, as they are now
    fn changed_plugins<'g>(
        graph: &'g DependencyGraph,
        request: &LifecycleRequest,
        impact: &DependencyImpact,
    ) -> Vec<&'g Plugin> {
        let mut names: BTreeSet<&str> = BTreeSet::from([request.plugin.as_str()]);
        if request.confirmed {
            names.extend(impact.to_enable.iter().map(String::as_str));
            names.extend(impact.to_disable.iter().map(String::as_str));
            names.extend(impact.to_uninstall.iter().map(String::as_str));
        }
        names
            .into_iter()
            .filter_map(|name| graph.get(name))
            .filter(|plugin| plugin.is_present())
            .collect()
    }

    fn classify_rejected_artifact(&self, signals: ArtifactSignals) -> OperationResult {
        let impact = DependencyImpact::satisfied();
        let mut input = ClassificationInput::new(OperationKind::Install, None, &impact);
        input.signals = signals;
        self.classifier.classify(&input)
    }

    async fn discard(&self, staged: &StagedArtifact) {
        if let Err(e) = self.storage.discard(staged).await {
            warn!("Failed to discard staged artifact {:?}: {}", staged.path, e);
        }
    }

    /// Move the files of `removed` aside, putting everything back if any
    /// plugin fails
    async fn retire_files(&self, removed: &[Plugin]) -> LifecycleResult<Vec<RetiredFiles>> {
        let mut retired = Vec::with_capacity(removed.len());
        for plugin in removed {
            match self.storage.retire(plugin).await {
                Ok(files) => retired.push(files),
                Err(e) => {
                    warn!("Failed to remove plugin files of {}: {}", plugin.name, e);
                    for files in retired.iter().rev() {
                        if let Err(e) = self.storage.restore(files).await {
                            warn!("Failed to restore plugin files of {}: {}", files.plugin, e);
                        }
                    }
                    return Err(LifecycleError::Storage(e));
                }
            }
        }
        Ok(retired)
    }

    /// Delete retired files once the graph change is committed
    async fn purge_files(&self, retired: &[RetiredFiles]) {
        for files in retired {
            if let Err(e) = self.storage.purge(files).await {
                warn!("Failed to purge retired files of {}: {}", files.plugin, e);
            }
        }
    }

    /// Apply a successfully classified request, cascade included
    async fn apply(
        &self,
        graph: &mut DependencyGraph,
        request: &LifecycleRequest,
        evaluation: &Evaluation,
    ) -> LifecycleResult<()> {
        let impact = &evaluation.impact;
        let target = request.plugin.as_str();
        let mut next = graph.clone();
        let mut removed = Vec::new();

        match &request.operation {
            Operation::Enable => {
                Self::enable_all(&mut next, impact.to_enable.iter().map(String::as_str))?;
                Self::enable_all(&mut next, [target])?;
            }
            Operation::Disable => {
                let names = impact.to_disable.iter().map(String::as_str);
                for name in names.chain([target]) {
                    if next.get(name).is_some_and(Plugin::is_loaded) {
                        next.set_state(name, PluginState::InstalledDisabled)?;
                    }
                }
            }
            Operation::Uninstall => {
                let names = impact.to_uninstall.iter().map(String::as_str);
                for name in names.chain([target]) {
                    let loaded = next.get(name).is_some_and(Plugin::is_loaded);
                    if evaluation.restart_required && loaded {
                        next.set_state(name, PluginState::MarkedForUninstall)?;
                    } else if next.contains(name) {
                        removed.push(next.remove_plugin(name)?);
                    }
                }
            }
            Operation::Update {
                version,
                dependencies,
            } => {
                let mut plugin = next
                    .get(target)
                    .cloned()
                    .ok_or_else(|| GraphError::UnknownPlugin(target.to_string()))?;
                plugin.version = *version;
                if let Some(dependencies) = dependencies {
                    plugin.dependencies = dependencies.clone();
                }
                plugin.installed_at = Some(Utc::now());
                if evaluation.restart_required && plugin.is_loaded() {
                    plugin.state = PluginState::MarkedForUpdate;
                }
                next.replace_plugin(plugin)?;
                Self::enable_all(&mut next, impact.to_enable.iter().map(String::as_str))?;
            }
            Operation::Install { descriptor } => {
                let mut plugin = descriptor.clone();
                plugin.state = PluginState::InstalledDisabled;
                plugin.installed_at = Some(Utc::now());
                if next.contains(&plugin.name) {
                    next.replace_plugin(plugin)?;
                } else {
                    next.add_plugin(plugin)?;
                }
            }
        }

        let retired = self.retire_files(&removed).await?;
        *graph = next;
        self.purge_files(&retired).await;

        debug!(
            "Applied {} of {} with {} dependent change(s)",
            request.kind(),
            target,
            impact.to_enable.len() + impact.to_disable.len() + impact.to_uninstall.len()
        );
        Ok(())
    }

    fn enable_all<'a>(
        graph: &mut DependencyGraph,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), GraphError> {
        for name in names {
            if graph.get(name).is_some_and(|p| !p.is_loaded()) {
                graph.set_state(name, PluginState::Enabled)?;
            }
        }
        Ok(())
    }
}
