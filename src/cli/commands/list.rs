//! List command implementation

use crate::cli::utils;
use anyhow::Result;
use clap::{ArgMatches, Command};

pub fn command() -> Command {
    Command::new("list")
        .about("List registered plugins")
        .arg(utils::config_arg())
        .arg(
            clap::Arg::new("order")
                .long("order")
                .help("List in dependency order instead of by name")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(utils::json_arg())
}

pub async fn run(matches: &ArgMatches) -> Result<()> {
    let app = utils::create_app(matches).await?;
    let manager = app.manager();

    let mut plugins = manager.list_plugins().await;
    if matches.get_flag("order") {
        let order = manager.dependency_order().await?;
        plugins.sort_by_key(|p| order.iter().position(|name| *name == p.name));
    }

    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&plugins)?);
        return Ok(());
    }

    if plugins.is_empty() {
        println!("No plugins registered.");
        return Ok(());
    }

    println!("{:<24} {:<10} {:<22} DEPENDENCIES", "NAME", "VERSION", "STATE");
    for plugin in &plugins {
        let name = if plugin.is_system {
            format!("{} (system)", plugin.name)
        } else {
            plugin.name.clone()
        };
        let dependencies: Vec<String> = plugin
            .dependencies
            .iter()
            .map(|d| format!("{} {}", d.plugin, d.constraint))
            .collect();
        println!(
            "{:<24} {:<10} {:<22} {}",
            name,
            plugin.version.to_string(),
            plugin.state.to_string(),
            dependencies.join(", ")
        );
    }

    Ok(())
}
