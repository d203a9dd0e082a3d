//! Update command implementation

use crate::cli::utils;
use crate::{LifecycleRequest, Version};
use anyhow::{anyhow, Result};
use clap::{ArgMatches, Command};

pub fn command() -> Command {
    Command::new("update")
        .about("Move an installed plugin to a newer version")
        .arg(
            clap::Arg::new("plugin")
                .help("Plugin name")
                .value_name("PLUGIN")
                .required(true),
        )
        .arg(
            clap::Arg::new("version")
                .help("New plugin version")
                .value_name("VERSION")
                .required(true),
        )
        .arg(utils::config_arg())
        .args(utils::lifecycle_args())
}

pub async fn run(matches: &ArgMatches) -> Result<()> {
    utils::run_lifecycle(matches, |matches| {
        let plugin = utils::required(matches, "plugin")?;
        let version = utils::required(matches, "version")?;
        let version = Version::parse(version)
            .map_err(|e| anyhow!("Invalid version for {}: {}", plugin, e))?;
        Ok(LifecycleRequest::update(plugin, version))
    })
    .await
}
