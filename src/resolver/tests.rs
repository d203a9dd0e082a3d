//! Resolver tests

use super::*;
use plugman_graph::Dependency;
use plugman_version::VersionConstraint;

fn v(s: &str) -> Version {
    Version::parse(s).unwrap()
}

fn c(s: &str) -> VersionConstraint {
    VersionConstraint::parse(s).unwrap()
}

fn names(set: &BTreeSet<String>) -> Vec<&str> {
    set.iter().map(String::as_str).collect()
}

/// base <- mid <- top, plus `side` depending on base
fn chain_graph(state: PluginState) -> DependencyGraph {
    DependencyGraph::from_plugins(vec![
        Plugin::new("base", v("1.0.0")).with_state(state),
        Plugin::new("mid", v("1.1.0"))
            .with_dependency("base", c(">=1.0.0"))
            .with_state(state),
        Plugin::new("top", v("2.0.0"))
            .with_dependency("mid", c("[1.0.0,1.9.0]"))
            .with_state(state),
        Plugin::new("side", v("0.1.0"))
            .with_dependency("base", c("*"))
            .with_state(state),
    ])
    .unwrap()
}

fn resolve(request: LifecycleRequest, graph: &DependencyGraph) -> DependencyImpact {
    DependencyResolver::new().resolve(&request, graph).unwrap()
}

#[test]
fn test_enable_collects_disabled_dependencies_transitively() {
    let graph = chain_graph(PluginState::InstalledDisabled);
    let impact = resolve(LifecycleRequest::enable("top"), &graph);

    assert_eq!(names(&impact.to_enable), vec!["base", "mid"]);
    assert!(impact.unsatisfied.is_empty());
    assert!(impact.to_disable.is_empty());
}

#[test]
fn test_enable_skips_enabled_dependencies() {
    let mut graph = chain_graph(PluginState::InstalledDisabled);
    graph.set_state("base", PluginState::Enabled).unwrap();
    graph.set_state("mid", PluginState::Enabled).unwrap();

    let impact = resolve(LifecycleRequest::enable("top"), &graph);
    assert!(impact.is_satisfied());
}

#[test]
fn test_enable_of_enabled_plugin_is_a_no_op() {
    let graph = chain_graph(PluginState::Enabled);
    assert!(resolve(LifecycleRequest::enable("top"), &graph).is_satisfied());
}

#[test]
fn test_enable_reports_missing_dependency() {
    let graph = DependencyGraph::from_plugins(vec![
        Plugin::new("a", v("1.0.0"))
            .with_dependency("ghost", c(">=1.0.0"))
            .with_dependency("b", c("*")),
        Plugin::new("b", v("1.0.0")),
    ])
    .unwrap();

    let impact = resolve(LifecycleRequest::enable("a"), &graph);
    assert_eq!(names(&impact.to_enable), vec!["b"]);
    let unsatisfied: Vec<_> = impact.unsatisfied.iter().collect();
    assert_eq!(unsatisfied.len(), 1);
    assert_eq!(unsatisfied[0].dependency, "ghost");
    assert_eq!(unsatisfied[0].found, None);
}

#[test]
fn test_enable_reports_version_mismatch_without_enabling() {
    let graph = DependencyGraph::from_plugins(vec![
        Plugin::new("a", v("1.0.0")).with_dependency("b", c(">=2.0.0")),
        Plugin::new("b", v("1.5.0")),
    ])
    .unwrap();

    let impact = resolve(LifecycleRequest::enable("a"), &graph);
    assert!(impact.to_enable.is_empty());
    assert_eq!(impact.unsatisfied_dependencies(), BTreeSet::from(["b"]));
    assert_eq!(impact.unsatisfied.iter().next().unwrap().found, Some(v("1.5.0")));
}

#[test]
fn test_plugins_marked_for_uninstall_count_as_missing() {
    let graph = DependencyGraph::from_plugins(vec![
        Plugin::new("a", v("1.0.0")).with_dependency("b", c("*")),
        Plugin::new("b", v("1.0.0")).with_state(PluginState::MarkedForUninstall),
    ])
    .unwrap();

    let impact = resolve(LifecycleRequest::enable("a"), &graph);
    assert!(impact.to_enable.is_empty());
    assert_eq!(impact.unsatisfied_dependencies(), BTreeSet::from(["b"]));
}

#[test]
fn test_disable_collects_enabled_dependents_transitively() {
    let graph = chain_graph(PluginState::Enabled);
    let impact = resolve(LifecycleRequest::disable("base"), &graph);

    assert_eq!(names(&impact.to_disable), vec!["mid", "side", "top"]);
    assert!(impact.to_uninstall.is_empty());
    assert!(impact.protected.is_empty());
}

#[test]
fn test_disable_ignores_disabled_dependents() {
    let mut graph = chain_graph(PluginState::Enabled);
    graph.set_state("side", PluginState::InstalledDisabled).unwrap();

    let impact = resolve(LifecycleRequest::disable("base"), &graph);
    assert_eq!(names(&impact.to_disable), vec!["mid", "top"]);
}

#[test]
fn test_uninstall_collects_all_installed_dependents() {
    let mut graph = chain_graph(PluginState::Enabled);
    graph.set_state("top", PluginState::InstalledDisabled).unwrap();

    let impact = resolve(LifecycleRequest::uninstall("base"), &graph);
    assert_eq!(names(&impact.to_uninstall), vec!["mid", "side", "top"]);
    assert!(impact.to_disable.is_empty());
}

#[test]
fn test_uninstall_protects_system_dependents() {
    let mut graph = chain_graph(PluginState::Enabled);
    graph
        .replace_plugin(
            Plugin::new("side", v("0.1.0"))
                .with_dependency("base", c("*"))
                .with_state(PluginState::Enabled)
                .system(),
        )
        .unwrap();

    let impact = resolve(LifecycleRequest::uninstall("base"), &graph);
    assert_eq!(names(&impact.protected), vec!["side"]);
    assert!(!impact.to_uninstall.contains("side"));
    assert_eq!(names(&impact.to_uninstall), vec!["mid", "top"]);
}

#[test]
fn test_update_flags_dependents_rejecting_new_version() {
    let graph = chain_graph(PluginState::Enabled);
    let impact = resolve(LifecycleRequest::update("mid", v("2.0.0")), &graph);

    assert_eq!(impact.unsatisfied_dependents(), BTreeSet::from(["top"]));
    let entry = impact.unsatisfied.iter().next().unwrap();
    assert_eq!(entry.dependency, "mid");
    assert_eq!(entry.found, Some(v("2.0.0")));
}

#[test]
fn test_update_within_constraints_is_satisfied() {
    let graph = chain_graph(PluginState::Enabled);
    let impact = resolve(LifecycleRequest::update("mid", v("1.5.0")), &graph);
    assert!(impact.is_satisfied());
}

#[test]
fn test_update_with_new_dependencies_checks_them() {
    let graph = chain_graph(PluginState::Enabled);
    let request = LifecycleRequest::new(
        "side",
        Operation::Update {
            version: v("0.2.0"),
            dependencies: Some(vec![Dependency::new("ghost", c(">=1.0.0"))]),
        },
    );

    let impact = resolve(request, &graph);
    assert_eq!(impact.unsatisfied_dependencies(), BTreeSet::from(["ghost"]));
}

#[test]
fn test_install_reports_missing_dependencies() {
    let graph = chain_graph(PluginState::Enabled);
    let descriptor = Plugin::new("extra", v("1.0.0"))
        .with_dependency("base", c(">=1.0.0"))
        .with_dependency("ghost", c("*"))
        .with_dependency("mid", c("=9.9.9"));

    let impact = resolve(LifecycleRequest::install(descriptor), &graph);
    assert!(impact.unsatisfied.is_empty());
    assert_eq!(impact.missing_dependencies(), BTreeSet::from(["ghost", "mid"]));
}

#[test]
fn test_update_of_disabled_plugin_reports_missing_dependencies() {
    let graph = chain_graph(PluginState::InstalledDisabled);
    let request = LifecycleRequest::new(
        "side",
        Operation::Update {
            version: v("0.2.0"),
            dependencies: Some(vec![
                Dependency::new("base", c(">=1.0.0")),
                Dependency::new("ghost", c(">=1.0.0")),
            ]),
        },
    );

    let impact = resolve(request, &graph);
    assert!(impact.unsatisfied.is_empty());
    assert!(impact.to_enable.is_empty());
    assert_eq!(impact.missing_dependencies(), BTreeSet::from(["ghost"]));
}

#[test]
fn test_blocked_dependency_is_not_expanded() {
    // root -> {a, b}, a -> d, b -> a =9.9.9
    let graph = DependencyGraph::from_plugins(vec![
        Plugin::new("root", v("1.0.0"))
            .with_dependency("a", c("*"))
            .with_dependency("b", c("*")),
        Plugin::new("a", v("1.0.0")).with_dependency("d", c("*")),
        Plugin::new("b", v("1.0.0")).with_dependency("a", c("=9.9.9")),
        Plugin::new("d", v("1.0.0")),
    ])
    .unwrap();

    let impact = resolve(LifecycleRequest::enable("root"), &graph);
    assert_eq!(names(&impact.to_enable), vec!["b"]);
    assert_eq!(impact.unsatisfied_dependencies(), BTreeSet::from(["a"]));
}

#[test]
fn test_cycle_short_circuits_every_operation() {
    let mut graph = chain_graph(PluginState::Enabled);
    graph
        .add_edge(plugman_graph::DependencyEdge {
            dependent: "base".to_string(),
            required: "top".to_string(),
            constraint: VersionConstraint::Any,
        })
        .unwrap();

    for request in [
        LifecycleRequest::enable("top"),
        LifecycleRequest::disable("base"),
        LifecycleRequest::uninstall("side"),
        LifecycleRequest::update("mid", v("1.2.0")),
    ] {
        let impact = resolve(request, &graph);
        assert!(impact.has_cycle());
        assert!(impact.to_enable.is_empty());
        assert!(impact.to_disable.is_empty());
        assert!(impact.to_uninstall.is_empty());
        assert!(impact.unsatisfied.is_empty());
    }
}

#[test]
fn test_install_that_closes_a_cycle_is_detected() {
    let graph = DependencyGraph::from_plugins(vec![
        Plugin::new("a", v("1.0.0")).with_dependency("new", c("*"))
    ])
    .unwrap();
    let descriptor = Plugin::new("new", v("1.0.0")).with_dependency("a", c("*"));

    let impact = resolve(LifecycleRequest::install(descriptor), &graph);
    assert_eq!(impact.cycle, Some(vec!["a".to_string(), "new".to_string(), "a".to_string()]));
}

#[test]
fn test_missing_target_resolves_to_empty_impact() {
    let graph = chain_graph(PluginState::Enabled);
    assert!(resolve(LifecycleRequest::disable("ghost"), &graph).is_satisfied());
}

#[test]
fn test_resolution_is_idempotent() {
    let graph = chain_graph(PluginState::InstalledDisabled);
    let first = resolve(LifecycleRequest::enable("top"), &graph);
    let second = resolve(LifecycleRequest::enable("top"), &graph);
    assert_eq!(first, second);
}
