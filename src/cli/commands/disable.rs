//! Disable command implementation

use crate::cli::utils;
use crate::LifecycleRequest;
use anyhow::Result;
use clap::{ArgMatches, Command};

pub fn command() -> Command {
    Command::new("disable")
        .about("Disable a plugin and, with --confirm, its enabled dependents")
        .arg(
            clap::Arg::new("plugin")
                .help("Plugin name")
                .value_name("PLUGIN")
                .required(true),
        )
        .arg(utils::config_arg())
        .args(utils::lifecycle_args())
}

pub async fn run(matches: &ArgMatches) -> Result<()> {
    utils::run_lifecycle(matches, |matches| {
        Ok(LifecycleRequest::disable(utils::required(matches, "plugin")?))
    })
    .await
}
