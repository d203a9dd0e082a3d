//! Info command implementation

use crate::cli::utils;
use anyhow::{anyhow, Result};
use clap::{ArgMatches, Command};

pub fn command() -> Command {
    Command::new("info")
        .about("Show tool information, or details of one plugin")
        .arg(
            clap::Arg::new("plugin")
                .help("Plugin name")
                .value_name("PLUGIN"),
        )
        .arg(utils::config_arg())
        .arg(utils::json_arg())
}

pub async fn run(matches: &ArgMatches) -> Result<()> {
    let Some(name) = matches.get_one::<String>("plugin") else {
        println!("Plugman - Plugin dependency and lifecycle manager");
        println!("Version: {}", env!("CARGO_PKG_VERSION"));
        println!("Repository: {}", env!("CARGO_PKG_REPOSITORY"));
        return Ok(());
    };

    let app = utils::create_app(matches).await?;
    let graph = app.manager().snapshot().await;
    let plugin = graph
        .get(name)
        .ok_or_else(|| anyhow!("Plugin {} is not registered", name))?;

    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(plugin)?);
        return Ok(());
    }

    println!("Plugin: {}", plugin.name);
    if let Some(description) = &plugin.description {
        println!("  Description: {}", description);
    }
    println!("  Version: {}", plugin.version);
    println!("  State: {}", plugin.state);
    println!("  System: {}", if plugin.is_system { "yes" } else { "no" });
    if let Some(installed_at) = plugin.installed_at {
        println!("  Installed: {}", installed_at.format("%Y-%m-%d %H:%M:%S UTC"));
    }

    if !plugin.dependencies.is_empty() {
        println!("  Dependencies:");
        for edge in graph.dependencies_of(name) {
            let status = match graph.get(&edge.required).filter(|p| p.is_present()) {
                Some(required) if edge.constraint.satisfies(&required.version) => {
                    format!("{} ({})", required.version, required.state)
                }
                Some(required) => format!("{} does not satisfy", required.version),
                None => "missing".to_string(),
            };
            println!("    - {} {}: {}", edge.required, edge.constraint, status);
        }
    }

    let dependents = graph.transitive_dependents(name);
    if !dependents.is_empty() {
        let dependents: Vec<&str> = dependents.iter().map(String::as_str).collect();
        println!("  Required by (transitively): {}", dependents.join(", "));
    }

    Ok(())
}
