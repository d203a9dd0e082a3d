//! Registry tests

use super::*;
use plugman_graph::{Plugin, PluginState};
use plugman_version::{Version, VersionConstraint};
use std::collections::BTreeSet;
use tempfile::TempDir;

fn write_manifest(root: &Path, dir: &str, file: &str, content: &str) {
    let dir = root.join(dir);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(file), content).unwrap();
}

#[tokio::test]
async fn test_discover_builds_graph_from_manifests() {
    let temp = TempDir::new().unwrap();
    write_manifest(temp.path(), "base", "plugin.yaml", "name: base\nversion: 1.0.0\n");
    write_manifest(
        temp.path(),
        "nested/app",
        "plugin.yml",
        "name: app\nversion: 2.1.0\ndependencies:\n  - plugin: base\n    version: \"[1.0.0,2.0.0]\"\n",
    );
    write_manifest(temp.path(), "docs", "README.md", "not a manifest");
    write_manifest(temp.path(), ".retired-old", "plugin.yaml", "name: old\nversion: 1.0.0\n");

    let registry = ManifestRegistry::new(vec![temp.path().to_path_buf()], PolicyConfig::default());
    let graph = registry.discover().await.unwrap();

    assert_eq!(graph.len(), 2);
    assert!(!graph.contains("old"));
    let app = graph.get("app").unwrap();
    assert_eq!(app.version, Version::new(2, 1, 0));
    assert_eq!(app.state, PluginState::InstalledDisabled);
    assert_eq!(
        app.dependencies[0].constraint,
        VersionConstraint::parse("[1.0.0,2.0.0]").unwrap()
    );
    assert_eq!(graph.topological_order().unwrap(), vec!["base", "app"]);
}

#[tokio::test]
async fn test_discover_skips_invalid_and_duplicate_manifests() {
    let temp = TempDir::new().unwrap();
    write_manifest(temp.path(), "a", "plugin.yaml", "name: base\nversion: 1.0.0\n");
    write_manifest(temp.path(), "b", "plugin.yaml", "name: base\nversion: 9.0.0\n");
    write_manifest(temp.path(), "c", "plugin.yaml", "name: [broken\n");

    let registry = ManifestRegistry::new(vec![temp.path().to_path_buf()], PolicyConfig::default());
    let graph = registry.discover().await.unwrap();

    assert_eq!(graph.len(), 1);
    assert_eq!(graph.get("base").unwrap().version, Version::new(1, 0, 0));
}

#[tokio::test]
async fn test_discover_applies_system_policy_and_ignores_missing_dirs() {
    let temp = TempDir::new().unwrap();
    write_manifest(temp.path(), "kernel", "plugin.yaml", "name: kernel\nversion: 1.0.0\n");

    let policy = PolicyConfig {
        system_plugins: BTreeSet::from(["kernel".to_string()]),
        ..PolicyConfig::default()
    };
    let mut registry = ManifestRegistry::new(vec![temp.path().to_path_buf()], policy);
    registry.add_directory(temp.path().join("does-not-exist"));

    let graph = registry.discover().await.unwrap();
    assert!(graph.get("kernel").unwrap().is_system);
}

#[test]
fn test_snapshot_round_trip_keeps_states() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("state").join("plugman.lock.yaml");
    let graph = DependencyGraph::from_plugins(vec![
        Plugin::new("base", Version::new(1, 0, 0)).with_state(PluginState::Enabled),
        Plugin::new("app", Version::new(1, 2, 0))
            .with_dependency("base", VersionConstraint::parse(">=1.0.0").unwrap())
            .with_state(PluginState::MarkedForUpdate),
    ])
    .unwrap();

    GraphSnapshot::from_graph(&graph).save_to_file(&path).unwrap();
    let restored = GraphSnapshot::from_file(&path).unwrap().into_graph().unwrap();

    assert_eq!(
        restored.plugins().cloned().collect::<Vec<_>>(),
        graph.plugins().cloned().collect::<Vec<_>>()
    );
    assert_eq!(restored.dependents_of("base").len(), 1);
}

#[test]
fn test_snapshot_version_is_checked() {
    let mut snapshot = GraphSnapshot::from_graph(&DependencyGraph::new());
    snapshot.version = "0.1".to_string();
    assert!(snapshot.into_graph().is_err());
    assert!(GraphSnapshot::from_file(Path::new("/definitely/missing.yaml")).is_err());
}

#[tokio::test]
async fn test_load_graph_merges_snapshot_and_discovery() {
    let temp = TempDir::new().unwrap();
    let plugins = temp.path().join("plugins");
    write_manifest(&plugins, "base", "plugin.yaml", "name: base\nversion: 1.0.0\n");
    write_manifest(&plugins, "extra", "plugin.yaml", "name: extra\nversion: 0.1.0\n");

    let snapshot_file = temp.path().join("plugman.lock.yaml");
    let saved = DependencyGraph::from_plugins(vec![
        Plugin::new("base", Version::new(1, 0, 0)).with_state(PluginState::Enabled),
    ])
    .unwrap();
    GraphSnapshot::from_graph(&saved).save_to_file(&snapshot_file).unwrap();

    let registry = ManifestRegistry::new(vec![plugins], PolicyConfig::default());
    let graph = load_graph(&snapshot_file, &registry).await.unwrap();

    assert_eq!(graph.get("base").unwrap().state, PluginState::Enabled);
    assert_eq!(graph.get("extra").unwrap().state, PluginState::InstalledDisabled);
}

#[test]
fn test_descriptor_validation() {
    let ok = PluginDescriptor::from_yaml(
        "name: app\nversion: 1.0.0\ndescription: Example\nsystem: true\ndependencies:\n  - plugin: base\n",
    )
    .unwrap();
    assert!(ok.system);
    assert_eq!(ok.dependencies[0].version, VersionConstraint::Any);

    let plugin = ok.into_plugin();
    assert!(plugin.is_system);
    assert_eq!(plugin.description.as_deref(), Some("Example"));
    assert_eq!(plugin.dependencies[0].plugin, "base");

    for broken in [
        "name: app\nversion: 1.0.0\ndependencies:\n  - plugin: base\n  - plugin: base\n",
        "name: app\nversion: 1.0.0\ndependencies:\n  - plugin: app\n",
        "name: 'app/../x'\nversion: 1.0.0\n",
        "name: app\n",
    ] {
        assert!(PluginDescriptor::from_yaml(broken).is_err(), "{}", broken);
    }
}
