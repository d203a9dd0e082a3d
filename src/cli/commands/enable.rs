//! Enable command implementation

use crate::cli::utils;
use crate::LifecycleRequest;
use anyhow::Result;
use clap::{ArgMatches, Command};

pub fn command() -> Command {
    Command::new("enable")
        .about("Enable a plugin and, with --confirm, its disabled dependencies")
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
        Ok(LifecycleRequest::enable(utils::required(matches, "plugin")?))
    })
    .await
}
