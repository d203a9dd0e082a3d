//! Filesystem artifact storage

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use plugman_graph::Plugin;
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{ArtifactStorage, PluginArtifact, RetiredFiles, StagedArtifact};

/// Installed descriptor file name inside a plugin directory
pub const INSTALLED_DESCRIPTOR: &str = "plugin.yaml";

/// Stages artifacts under one directory and installs them as
/// `<plugins>/<name>/plugin.yaml`
#[derive(Debug, Clone)]
pub struct FileSystemStorage {
    staging_dir: PathBuf,
    plugins_dir: PathBuf,
}

impl FileSystemStorage {
    pub fn new(staging_dir: impl Into<PathBuf>, plugins_dir: impl Into<PathBuf>) -> Self {
        Self {
            staging_dir: staging_dir.into(),
            plugins_dir: plugins_dir.into(),
        }
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    pub fn plugins_dir(&self) -> &Path {
        &self.plugins_dir
    }

    /// Directory holding the installed files of `name`
    pub fn plugin_dir(&self, name: &str) -> PathBuf {
        self.plugins_dir.join(name)
    }

    /// Holding directory for retired files of `name`
    ///
    /// Hidden so that manifest scans skip it.
    pub fn retired_dir(&self, name: &str) -> PathBuf {
        self.plugins_dir.join(format!(".retired-{}", name))
    }

    /// Calculate SHA-256 of artifact content
    pub fn checksum(content: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content);
        hex::encode(hasher.finalize())
    }
}

#[async_trait]
impl ArtifactStorage for FileSystemStorage {
    async fn upload(&self, artifact: &PluginArtifact) -> Result<StagedArtifact> {
        // Only the final component, so a crafted name cannot escape staging
        let file_name = Path::new(&artifact.file_name)
            .file_name()
            .ok_or_else(|| anyhow!("Invalid artifact file name: {}", artifact.file_name))?;

        tokio::fs::create_dir_all(&self.staging_dir).await?;

        let checksum = Self::checksum(&artifact.content);
        let path = self.staging_dir.join(format!(
            "{}-{}",
            &checksum[..12],
            file_name.to_string_lossy()
        ));
        tokio::fs::write(&path, &artifact.content).await?;

        debug!("Staged artifact {} at {:?}", artifact.file_name, path);
        Ok(StagedArtifact { path, checksum })
    }

    async fn install(&self, staged: &StagedArtifact, plugin: &Plugin) -> Result<PathBuf> {
        let target_dir = self.plugin_dir(&plugin.name);
        tokio::fs::create_dir_all(&target_dir).await?;
        let target = target_dir.join(INSTALLED_DESCRIPTOR);

        if tokio::fs::rename(&staged.path, &target).await.is_err() {
            // Staging may live on another filesystem
            tokio::fs::copy(&staged.path, &target).await?;
            tokio::fs::remove_file(&staged.path).await?;
        }

        info!("Installed plugin file {:?} ({})", target, plugin.name);
        Ok(target)
    }

    async fn discard(&self, staged: &StagedArtifact) -> Result<()> {
        match tokio::fs::remove_file(&staged.path).await {
            Ok(()) => {
                debug!("Discarded staged artifact {:?}", staged.path);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn retire(&self, plugin: &Plugin) -> Result<RetiredFiles> {
        let dir = self.plugin_dir(&plugin.name);
        let holding = self.retired_dir(&plugin.name);
        // Left over from an earlier purge that failed
        remove_dir_if_exists(&holding).await?;

        match tokio::fs::rename(&dir, &holding).await {
            Ok(()) => {
                debug!("Retired plugin files {:?} to {:?}", dir, holding);
                Ok(RetiredFiles {
                    plugin: plugin.name.clone(),
                    path: Some(holding),
                })
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(RetiredFiles {
                plugin: plugin.name.clone(),
                path: None,
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn restore(&self, retired: &RetiredFiles) -> Result<()> {
        let Some(holding) = &retired.path else {
            return Ok(());
        };
        let dir = self.plugin_dir(&retired.plugin);
        tokio::fs::rename(holding, &dir).await?;
        info!("Restored plugin files {:?}", dir);
        Ok(())
    }

    async fn purge(&self, retired: &RetiredFiles) -> Result<()> {
        let Some(holding) = &retired.path else {
            return Ok(());
        };
        remove_dir_if_exists(holding).await?;
        info!("Removed plugin files of {}", retired.plugin);
        Ok(())
    }
}

async fn remove_dir_if_exists(dir: &Path) -> Result<()> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
