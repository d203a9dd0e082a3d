//! Install command implementation

use crate::cli::utils;
use crate::collaborators::{ArtifactValidator, DescriptorValidator, PluginArtifact};
use crate::{LifecycleRequest, OperationKind, OperationResult};
use anyhow::Result;
use clap::{ArgMatches, Command};
use std::path::PathBuf;
use tracing::info;

pub fn command() -> Command {
    Command::new("install")
        .about("Install a plugin from a descriptor artifact, updating it if present")
        .arg(
            clap::Arg::new("artifact")
                .help("Plugin artifact (plugin.yaml descriptor)")
                .value_name("FILE")
                .required(true),
        )
        .arg(utils::config_arg())
        .args(utils::lifecycle_args())
}

pub async fn run(matches: &ArgMatches) -> Result<()> {
    let app = utils::create_app(matches).await?;
    let path = PathBuf::from(utils::required(matches, "artifact")?);
    let artifact = PluginArtifact::from_path(&path).await?;
    let confirmed = matches.get_flag("confirm");
    let dry_run = matches.get_flag("dry-run");

    info!("Installing plugin from {:?}", path);

    // Dry runs validate in place; nothing is staged
    let (plugin, result) = match DescriptorValidator::new().validate(&artifact) {
        Ok(descriptor) if dry_run => {
            let mut request = LifecycleRequest::install(descriptor);
            request.confirmed = confirmed;
            let plugin = request.plugin.clone();
            (plugin, app.manager().dry_run(request).await?)
        }
        Ok(descriptor) => {
            let result = app.manager().install_plugin(artifact, confirmed).await?;
            (descriptor.name, result)
        }
        Err(e) => {
            info!("{}", e);
            if dry_run {
                (artifact.file_name.clone(), OperationResult::CorruptedPlugin)
            } else {
                let result = app.manager().install_plugin(artifact.clone(), confirmed).await?;
                (artifact.file_name, result)
            }
        }
    };

    utils::finish(&app, matches, OperationKind::Install, &plugin, &result, dry_run).await
}
