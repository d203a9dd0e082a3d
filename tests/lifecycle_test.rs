use plugman::{
    Config, LifecycleRequest, OperationResult, OperationStatus, PluginArtifact, PluginState,
    Plugman, Version,
};
use std::path::Path;
use tempfile::TempDir;

fn write_descriptor(plugins: &Path, name: &str, content: &str) {
    let dir = plugins.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("plugin.yaml"), content).unwrap();
}

fn config_for(root: &Path) -> Config {
    let mut config = Config::default();
    let path = |name: &str| root.join(name).to_string_lossy().into_owned();
    config.paths.plugins_directory = path("plugins");
    config.paths.staging_directory = path("staging");
    config.paths.snapshot_file = path("state/plugman.lock.yaml");
    config
}

fn setup() -> (TempDir, Config) {
    let temp = TempDir::new().unwrap();
    let plugins = temp.path().join("plugins");
    write_descriptor(&plugins, "base", "name: base\nversion: 1.0.0\n");
    write_descriptor(
        &plugins,
        "app",
        "name: app\nversion: 2.0.0\ndependencies:\n  - plugin: base\n    version: \">=1.0.0\"\n",
    );
    let config = config_for(temp.path());
    (temp, config)
}

#[tokio::test]
async fn test_enable_persists_across_reload() {
    let (_temp, config) = setup();

    let app = Plugman::load(config.clone()).await.unwrap();
    assert_eq!(app.manager().list_plugins().await.len(), 2);

    let result = app.manager().execute(LifecycleRequest::enable("app")).await.unwrap();
    assert_eq!(result.status(), OperationStatus::DependenciesToEnable);

    let result = app
        .manager()
        .execute(LifecycleRequest::enable("app").confirmed())
        .await
        .unwrap();
    assert_eq!(result, OperationResult::Success);
    app.save().await.unwrap();

    let reloaded = Plugman::load(config).await.unwrap();
    for name in ["base", "app"] {
        let plugin = reloaded.manager().plugin(name).await.unwrap();
        assert_eq!(plugin.state, PluginState::Enabled, "{}", name);
    }
    assert_eq!(
        reloaded.manager().dependency_order().await.unwrap(),
        vec!["base".to_string(), "app".to_string()]
    );
}

#[tokio::test]
async fn test_install_from_artifact_lands_in_plugins_directory() {
    let (temp, config) = setup();
    let app = Plugman::load(config.clone()).await.unwrap();

    let artifact_path = temp.path().join("billing.yaml");
    std::fs::write(
        &artifact_path,
        "name: billing\nversion: 0.3.0\ndependencies:\n  - plugin: app\n    version: \"[2.0.0,3.0.0]\"\n",
    )
    .unwrap();
    let artifact = PluginArtifact::from_path(&artifact_path).await.unwrap();

    let result = app.manager().install_plugin(artifact, false).await.unwrap();
    assert_eq!(result, OperationResult::Success);
    assert!(temp.path().join("plugins/billing/plugin.yaml").exists());

    // Without a saved snapshot the plugin is rediscovered from disk
    let reloaded = Plugman::load(config).await.unwrap();
    let billing = reloaded.manager().plugin("billing").await.unwrap();
    assert_eq!(billing.version, Version::new(0, 3, 0));
    assert_eq!(billing.state, PluginState::InstalledDisabled);
}

#[tokio::test]
async fn test_uninstall_after_restart_removes_files() {
    let (temp, config) = setup();
    let app = Plugman::load(config.clone()).await.unwrap();
    app.manager()
        .execute(LifecycleRequest::enable("app").confirmed())
        .await
        .unwrap();

    let result = app
        .manager()
        .execute(LifecycleRequest::uninstall("base"))
        .await
        .unwrap();
    assert_eq!(result.status(), OperationStatus::DependenciesToUninstall);
    assert_eq!(
        result.dependency_impact().to_uninstall.iter().collect::<Vec<_>>(),
        vec!["app"]
    );

    let result = app
        .manager()
        .execute(LifecycleRequest::uninstall("base").confirmed())
        .await
        .unwrap();
    assert_eq!(result, OperationResult::SuccessWithRestart);
    assert!(temp.path().join("plugins/base").exists());

    app.manager().complete_restart().await.unwrap();
    app.save().await.unwrap();
    assert!(!temp.path().join("plugins/base").exists());
    assert!(!temp.path().join("plugins/app").exists());

    let reloaded = Plugman::load(config).await.unwrap();
    assert!(reloaded.manager().list_plugins().await.is_empty());
}

#[tokio::test]
async fn test_system_policy_from_config() {
    let (_temp, mut config) = setup();
    config.policy.system_plugins.insert("base".to_string());

    let app = Plugman::load(config).await.unwrap();
    assert!(app.manager().plugin("base").await.unwrap().is_system);

    let result = app
        .manager()
        .execute(LifecycleRequest::uninstall("base").confirmed())
        .await
        .unwrap();
    assert_eq!(result, OperationResult::SystemPluginUninstalling);
    assert!(app.manager().plugin("base").await.is_some());
}
