//! CLI command implementations

use anyhow::Result;
use clap::{ArgMatches, Command};

pub mod commands;

/// Main CLI application
pub struct CliApp;

impl CliApp {
    /// Create the CLI application
    pub fn app() -> Command {
        Command::new("plugman")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Resolve plugin dependencies and manage plugin lifecycles")
            .subcommand_negates_reqs(true)
            .subcommand(commands::init::command())
            .subcommand(commands::list::command())
            .subcommand(commands::info::command())
            .subcommand(commands::check::command())
            .subcommand(commands::enable::command())
            .subcommand(commands::disable::command())
            .subcommand(commands::uninstall::command())
            .subcommand(commands::update::command())
            .subcommand(commands::install::command())
            .subcommand(commands::restart::command())
    }

    /// Run the CLI application
    pub async fn run(matches: &ArgMatches) -> Result<()> {
        match matches.subcommand() {
            Some(("init", sub_matches)) => commands::init::run(sub_matches).await,
            Some(("list", sub_matches)) => commands::list::run(sub_matches).await,
            Some(("info", sub_matches)) => commands::info::run(sub_matches).await,
            Some(("check", sub_matches)) => commands::check::run(sub_matches).await,
            Some(("enable", sub_matches)) => commands::enable::run(sub_matches).await,
            Some(("disable", sub_matches)) => commands::disable::run(sub_matches).await,
            Some(("uninstall", sub_matches)) => commands::uninstall::run(sub_matches).await,
            Some(("update", sub_matches)) => commands::update::run(sub_matches).await,
            Some(("install", sub_matches)) => commands::install::run(sub_matches).await,
            Some(("restart", sub_matches)) => commands::restart::run(sub_matches).await,
            _ => {
                // No subcommand provided, show help
                let _ = Self::app().print_help();
                Ok(())
            }
        }
    }
}

/// Common CLI utilities
pub mod utils {
    use anyhow::{anyhow, Result};
    use clap::{Arg, ArgAction, ArgMatches};
    use serde::Serialize;
    use std::path::PathBuf;

    use crate::{LifecycleRequest, OperationKind, OperationResult, Plugman};

    /// `--config FILE`
    pub fn config_arg() -> Arg {
        Arg::new("config")
            .short('c')
            .long("config")
            .help("Configuration file path")
            .value_name("FILE")
    }

    /// `--json`
    pub fn json_arg() -> Arg {
        Arg::new("json")
            .long("json")
            .help("Print machine readable JSON")
            .action(ArgAction::SetTrue)
    }

    /// Flags shared by every state changing command
    pub fn lifecycle_args() -> [Arg; 4] {
        [
            Arg::new("confirm")
                .short('y')
                .long("confirm")
                .help("Accept changes cascading to other plugins")
                .action(ArgAction::SetTrue),
            Arg::new("write")
                .short('w')
                .long("write")
                .help("Save the plugin snapshot after a successful change (always done for install and uninstall)")
                .action(ArgAction::SetTrue),
            Arg::new("dry-run")
                .long("dry-run")
                .help("Report the outcome without changing anything")
                .action(ArgAction::SetTrue),
            json_arg(),
        ]
    }

    /// Get configuration file path from arguments or use default
    pub fn get_config_path(matches: &ArgMatches) -> Result<PathBuf> {
        if let Some(config_path) = matches.get_one::<String>("config") {
            Ok(PathBuf::from(config_path))
        } else {
            // Look for default config files
            let default_paths = [
                PathBuf::from("plugman.yaml"),
                PathBuf::from("plugman.yml"),
                PathBuf::from(".plugman.yaml"),
                PathBuf::from(".plugman.yml"),
            ];

            for path in &default_paths {
                if path.exists() {
                    return Ok(path.clone());
                }
            }

            Err(anyhow!("No configuration file found. Use --config to specify a file or create one with 'plugman init'"))
        }
    }

    /// Load configuration from file
    pub fn load_config(matches: &ArgMatches) -> Result<crate::Config> {
        let config_path = get_config_path(matches)?;
        crate::Config::from_file(&config_path)
    }

    /// Create Plugman instance
    pub async fn create_app(matches: &ArgMatches) -> Result<Plugman> {
        let config = load_config(matches)?;
        Plugman::load(config).await
    }

    /// Machine readable outcome of one command
    #[derive(Debug, Serialize)]
    pub struct ResultReport<'a> {
        pub operation: OperationKind,
        pub plugin: &'a str,
        pub dry_run: bool,
        pub success: bool,
        pub restart_required: bool,
        #[serde(flatten)]
        pub result: &'a OperationResult,
    }

    /// Print an operation result as text or JSON
    pub fn print_result(
        operation: OperationKind,
        plugin: &str,
        result: &OperationResult,
        dry_run: bool,
        json: bool,
    ) -> Result<()> {
        if json {
            let report = ResultReport {
                operation,
                plugin,
                dry_run,
                success: result.is_success(),
                restart_required: result.is_restart_necessary(),
                result,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        let prefix = if dry_run { "[dry run] " } else { "" };
        println!("{}{} {}: {}", prefix, operation, plugin, result.describe());
        if result.is_restart_necessary() {
            println!("Restart the host to finish, then run 'plugman restart'.");
        }
        Ok(())
    }

    /// Run a lifecycle request built from the shared flags
    pub async fn run_lifecycle(
        matches: &ArgMatches,
        build: impl FnOnce(&ArgMatches) -> Result<LifecycleRequest>,
    ) -> Result<()> {
        let app = create_app(matches).await?;
        let mut request = build(matches)?;
        request.confirmed = matches.get_flag("confirm");
        let dry_run = matches.get_flag("dry-run");

        let operation = request.kind();
        let plugin = request.plugin.clone();
        let result = if dry_run {
            app.manager().dry_run(request).await?
        } else {
            app.manager().execute(request).await?
        };

        finish(&app, matches, operation, &plugin, &result, dry_run).await
    }

    /// Install and uninstall move plugin files, so their snapshot is saved
    /// with or without `--write`
    fn changes_files(operation: OperationKind) -> bool {
        matches!(operation, OperationKind::Install | OperationKind::Uninstall)
    }

    /// Print the result, save the snapshot when needed and map failures to
    /// an error exit
    pub async fn finish(
        app: &Plugman,
        matches: &ArgMatches,
        operation: OperationKind,
        plugin: &str,
        result: &OperationResult,
        dry_run: bool,
    ) -> Result<()> {
        print_result(operation, plugin, result, dry_run, matches.get_flag("json"))?;

        if !result.is_success() {
            return Err(anyhow!("{} of {} was not applied: {}", operation, plugin, result.status()));
        }
        if !dry_run && (matches.get_flag("write") || changes_files(operation)) {
            app.save().await?;
        }
        Ok(())
    }

    /// Required positional argument
    pub fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a String> {
        matches
            .get_one::<String>(name)
            .ok_or_else(|| anyhow!("Missing required argument: {}", name))
    }
}
