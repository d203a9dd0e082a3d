//! Collaborators consulted by the plugin manager
//!
//! Artifact storage, artifact validation and the restart decision live
//! behind traits so the manager can run against the filesystem in production
//! and against in-memory doubles in tests.

use anyhow::Result;
use async_trait::async_trait;
use plugman_graph::Plugin;
use std::path::PathBuf;

use crate::operation::OperationKind;

pub mod restart;
pub mod storage;
pub mod validator;


pub use restart::LoadedCodeRestart;
pub use storage::FileSystemStorage;
pub use validator::DescriptorValidator;

/// A plugin artifact as handed in by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginArtifact {
    /// Original file name, used for staging only
    pub file_name: String,

    /// Raw artifact bytes
    pub content: Vec<u8>,
}

impl PluginArtifact {
    pub fn new(file_name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
        }
    }

    /// Read an artifact from disk
    pub async fn from_path(path: &std::path::Path) -> Result<Self> {
        let content = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "plugin.yaml".to_string());
        Ok(Self { file_name, content })
    }
}

/// An artifact stored in the staging area
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedArtifact {
    /// Location of the staged copy
    pub path: PathBuf,

    /// SHA-256 of the artifact content, hex encoded
    pub checksum: String,
}

/// Installed files of a plugin moved aside while its removal is pending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetiredFiles {
    /// Plugin the files belong to
    pub plugin: String,

    /// Holding location; `None` when the plugin had no files
    pub path: Option<PathBuf>,
}

/// Stores artifacts and moves them into place
///
/// Removal happens in two steps: `retire` moves installed files aside and can
/// be undone with `restore`; `purge` deletes them for good.
#[async_trait]
pub trait ArtifactStorage: Send + Sync {
    /// Copy the artifact into staging
    async fn upload(&self, artifact: &PluginArtifact) -> Result<StagedArtifact>;

    /// Move a staged artifact into the plugins directory
    async fn install(&self, staged: &StagedArtifact, plugin: &Plugin) -> Result<PathBuf>;

    /// Drop a staged artifact that will not be installed
    async fn discard(&self, staged: &StagedArtifact) -> Result<()>;

    /// Move the installed files of a plugin out of the plugins directory
    async fn retire(&self, plugin: &Plugin) -> Result<RetiredFiles>;

    /// Put retired files back where they were
    async fn restore(&self, retired: &RetiredFiles) -> Result<()>;

    /// Delete retired files
    async fn purge(&self, retired: &RetiredFiles) -> Result<()>;
}

/// Rejection raised by an [`ArtifactValidator`]
#[derive(Debug, thiserror::Error)]
#[error("corrupted plugin artifact '{file_name}': {reason}")]
pub struct CorruptedArtifact {
    pub file_name: String,
    pub reason: String,
}

/// Checks an artifact and extracts its plugin descriptor
pub trait ArtifactValidator: Send + Sync {
    fn validate(&self, artifact: &PluginArtifact) -> Result<Plugin, CorruptedArtifact>;
}

/// Decides whether applying a change needs a process restart
pub trait RestartPredicate: Send + Sync {
    /// `changed` lists every plugin whose state the operation would touch,
    /// as it looks before the change
    fn restart_required(&self, operation: OperationKind, changed: &[&Plugin]) -> bool;
}
