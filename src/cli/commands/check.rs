//! Check command implementation

use crate::cli::utils;
use crate::{DependencyGraph, UnsatisfiedDependency};
use anyhow::{anyhow, Result};
use clap::{ArgMatches, Command};
use serde::Serialize;
use tracing::info;

pub fn command() -> Command {
    Command::new("check")
        .about("Report dependency cycles and unmet constraints of installed plugins")
        .arg(utils::config_arg())
        .arg(utils::json_arg())
}

/// Consistency report of a plugin graph
#[derive(Debug, Default, Serialize)]
pub struct CheckReport {
    /// First cycle found, start node repeated at the end
    pub cycle: Option<Vec<String>>,

    /// Constraints of installed plugins that nothing installed meets
    pub unsatisfied: Vec<UnsatisfiedDependency>,

    /// Enabled plugins depending on a plugin that is not enabled
    pub disabled_dependencies: Vec<(String, String)>,

    /// Plugin names, dependencies first; empty when there is a cycle
    pub order: Vec<String>,
}

impl CheckReport {
    pub fn for_graph(graph: &DependencyGraph) -> Self {
        let mut report = CheckReport {
            cycle: graph.detect_cycle(),
            order: graph.topological_order().unwrap_or_default(),
            ..CheckReport::default()
        };

        for plugin in graph.plugins().filter(|p| p.is_present()) {
            for edge in graph.dependencies_of(&plugin.name) {
                match graph.get(&edge.required).filter(|p| p.is_present()) {
                    Some(required) if edge.constraint.satisfies(&required.version) => {
                        if plugin.is_loaded() && !required.is_loaded() {
                            report
                                .disabled_dependencies
                                .push((plugin.name.clone(), required.name.clone()));
                        }
                    }
                    required => report.unsatisfied.push(UnsatisfiedDependency {
                        dependent: edge.dependent,
                        dependency: edge.required,
                        constraint: edge.constraint,
                        found: required.map(|p| p.version),
                    }),
                }
            }
        }

        report
    }

    pub fn is_clean(&self) -> bool {
        self.cycle.is_none() && self.unsatisfied.is_empty() && self.disabled_dependencies.is_empty()
    }
}

pub async fn run(matches: &ArgMatches) -> Result<()> {
    let app = utils::create_app(matches).await?;
    let graph = app.manager().snapshot().await;
    info!("Checking {} plugin(s)", graph.len());

    let report = CheckReport::for_graph(&graph);

    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        if let Some(cycle) = &report.cycle {
            println!("Dependency cycle: {}", cycle.join(" -> "));
        }
        for unsatisfied in &report.unsatisfied {
            println!("Unsatisfied: {}", unsatisfied);
        }
        for (dependent, dependency) in &report.disabled_dependencies {
            println!("Enabled {} depends on disabled {}", dependent, dependency);
        }
        if report.is_clean() {
            println!("All {} plugin(s) are consistent.", graph.len());
            println!("Load order: {}", report.order.join(", "));
        }
    }

    if report.is_clean() {
        Ok(())
    } else {
        Err(anyhow!("Plugin graph has consistency problems"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Plugin, PluginState, Version, VersionConstraint};

    #[test]
    fn test_report_flags_problems() {
        let graph = DependencyGraph::from_plugins(vec![
            Plugin::new("base", Version::new(1, 0, 0)),
            Plugin::new("app", Version::new(1, 0, 0))
                .with_dependency("base", VersionConstraint::Any)
                .with_state(PluginState::Enabled),
            Plugin::new("report", Version::new(1, 0, 0))
                .with_dependency("base", VersionConstraint::parse(">=2.0.0").unwrap())
                .with_dependency("ghost", VersionConstraint::Any),
        ])
        .unwrap();

        let report = CheckReport::for_graph(&graph);
        assert!(!report.is_clean());
        assert!(report.cycle.is_none());
        assert_eq!(
            report.disabled_dependencies,
            vec![("app".to_string(), "base".to_string())]
        );
        assert_eq!(report.unsatisfied.len(), 2);
        assert_eq!(report.order.first().map(String::as_str), Some("base"));
    }

    #[test]
    fn test_report_on_cycle() {
        let graph = DependencyGraph::from_plugins(vec![
            Plugin::new("a", Version::new(1, 0, 0)).with_dependency("b", VersionConstraint::Any),
            Plugin::new("b", Version::new(1, 0, 0)).with_dependency("a", VersionConstraint::Any),
        ])
        .unwrap();

        let report = CheckReport::for_graph(&graph);
        assert_eq!(
            report.cycle,
            Some(vec!["a".to_string(), "b".to_string(), "a".to_string()])
        );
        assert!(report.order.is_empty());
    }
}
