//! Restart command implementation

use crate::cli::utils;
use anyhow::Result;
use clap::{ArgMatches, Command};
use tracing::info;

pub fn command() -> Command {
    Command::new("restart")
        .about("Finalise plugins marked for uninstall or update after a host restart")
        .arg(utils::config_arg())
}

pub async fn run(matches: &ArgMatches) -> Result<()> {
    let app = utils::create_app(matches).await?;
    let finalised = app.manager().complete_restart().await?;

    if finalised.is_empty() {
        println!("No pending restart changes.");
        return Ok(());
    }

    info!("Finalised {} plugin(s)", finalised.len());
    // Files of uninstalled plugins are gone; the snapshot has to follow
    app.save().await?;
    println!("Finalised: {}", finalised.join(", "));
    Ok(())
}
