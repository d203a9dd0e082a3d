//! Default artifact validation

use plugman_graph::Plugin;
use tracing::debug;

use super::{ArtifactValidator, CorruptedArtifact, PluginArtifact};
use crate::registry::PluginDescriptor;

/// Accepts artifacts that are a valid YAML plugin descriptor
#[derive(Debug, Clone, Copy, Default)]
pub struct DescriptorValidator;

impl DescriptorValidator {
    pub fn new() -> Self {
        Self
    }
}

impl ArtifactValidator for DescriptorValidator {
    fn validate(&self, artifact: &PluginArtifact) -> Result<Plugin, CorruptedArtifact> {
        let corrupted = |reason: String| CorruptedArtifact {
            file_name: artifact.file_name.clone(),
            reason,
        };

        let content = std::str::from_utf8(&artifact.content)
            .map_err(|e| corrupted(format!("not UTF-8: {}", e)))?;
        let descriptor =
            PluginDescriptor::from_yaml(content).map_err(|e| corrupted(e.to_string()))?;

        debug!(
            "Validated artifact {}: {} {}",
            artifact.file_name, descriptor.name, descriptor.version
        );
        Ok(descriptor.into_plugin())
    }
}
