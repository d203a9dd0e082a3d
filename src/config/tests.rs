//! Configuration tests

use super::*;
use tempfile::NamedTempFile;

#[test]
fn test_config_serialization() {
    let config = Config::default();
    let yaml = serde_yaml::to_string(&config).unwrap();
    let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(config, parsed);
}

#[test]
fn test_config_from_file() {
    let mut config = Config::default();
    config.policy.system_plugins.insert("kernel".to_string());
    config.policy.enabling_blocked.insert("legacy".to_string());
    config
        .paths
        .manifest_directories
        .push("./vendor/plugins".to_string());

    let temp_file = NamedTempFile::new().unwrap();
    config.save_to_file(temp_file.path()).unwrap();

    let loaded = Config::from_file(temp_file.path()).unwrap();
    assert_eq!(config, loaded);
    assert!(loaded.policy.is_system("kernel"));
    assert!(!loaded.policy.enabling_allowed("legacy"));
    assert!(loaded.policy.enabling_allowed("kernel"));
}

#[test]
fn test_minimal_config_uses_defaults() {
    let config: Config = serde_yaml::from_str("version: \"1.0\"\n").unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.paths, PathsConfig::default());
    assert!(!config.policy.restart_on_enable);
}

#[test]
fn test_config_validation() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    config.version = "2.0".to_string();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.paths.staging_directory = config.paths.plugins_directory.clone();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.paths.snapshot_file = "  ".to_string();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.policy.system_plugins.insert("kernel".to_string());
    config.policy.enabling_blocked.insert("kernel".to_string());
    assert!(config.validate().is_err());
}

#[test]
fn test_path_expansion() {
    std::env::set_var("PLUGMAN_TEST_ROOT", "/srv/plugman");
    let paths = PathsConfig {
        plugins_directory: "$PLUGMAN_TEST_ROOT/plugins".to_string(),
        manifest_directories: vec!["${PLUGMAN_TEST_ROOT}/extra".to_string()],
        ..PathsConfig::default()
    };

    assert_eq!(
        paths.plugins_directory().unwrap(),
        std::path::PathBuf::from("/srv/plugman/plugins")
    );
    assert_eq!(
        paths.scan_directories().unwrap(),
        vec![
            std::path::PathBuf::from("/srv/plugman/plugins"),
            std::path::PathBuf::from("/srv/plugman/extra"),
        ]
    );
}

#[test]
fn test_unknown_variable_is_an_error() {
    let paths = PathsConfig {
        snapshot_file: "$PLUGMAN_SURELY_UNSET_VARIABLE/lock.yaml".to_string(),
        ..PathsConfig::default()
    };
    assert!(paths.snapshot_file().is_err());
}
