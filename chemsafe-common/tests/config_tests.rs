//! Configuration resolution tests
//!
//! Uses serial_test to prevent ENV variable race conditions: tests that
//! touch CHEMSAFE_ROOT_FOLDER or CHEMSAFE_CONFIG run sequentially.

use chemsafe_common::config::{
    default_root_folder, RootFolderInitializer, RootFolderResolver, TomlConfig, CONFIG_FILE_ENV,
    ROOT_FOLDER_ENV,
};
use chemsafe_common::Error;
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
#[serial]
fn test_resolver_with_no_overrides_uses_default() {
    env::remove_var(ROOT_FOLDER_ENV);

    let resolver = RootFolderResolver::new(None, &TomlConfig::default());
    assert_eq!(resolver.resolve(), default_root_folder());
}

#[test]
#[serial]
fn test_resolver_env_var_beats_toml() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/chemsafe-test-env-folder");

    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/chemsafe-test-toml-folder")),
        ..Default::default()
    };
    let resolver = RootFolderResolver::new(None, &toml);
    assert_eq!(resolver.resolve(), PathBuf::from("/tmp/chemsafe-test-env-folder"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_resolver_cli_arg_beats_env() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/chemsafe-test-env-folder");

    let resolver = RootFolderResolver::new(
        Some(PathBuf::from("/tmp/chemsafe-test-cli-folder")),
        &TomlConfig::default(),
    );
    assert_eq!(resolver.resolve(), PathBuf::from("/tmp/chemsafe-test-cli-folder"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_resolver_toml_used_without_env() {
    env::remove_var(ROOT_FOLDER_ENV);

    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/chemsafe-test-toml-folder")),
        ..Default::default()
    };
    let resolver = RootFolderResolver::new(None, &toml);
    assert_eq!(resolver.resolve(), PathBuf::from("/tmp/chemsafe-test-toml-folder"));
}

#[test]
#[serial]
fn test_load_config_from_env_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[logging]\nlevel = \"warn\"\n").unwrap();
    env::set_var(CONFIG_FILE_ENV, &path);

    let config = TomlConfig::load_or_default(None).unwrap();
    assert_eq!(config.logging.level, "warn");

    env::remove_var(CONFIG_FILE_ENV);
}

#[test]
#[serial]
fn test_explicit_missing_config_is_an_error() {
    env::remove_var(CONFIG_FILE_ENV);
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");

    assert!(TomlConfig::load_or_default(Some(&missing)).is_err());
}

#[test]
fn test_malformed_config_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "root_folder = [").unwrap();

    let err = TomlConfig::load(&path).unwrap_err();
    assert!(matches!(&err, Error::Config { path: p, .. } if p == &path));
    assert!(err.to_string().contains("parse failed"));
}

#[test]
fn test_initializer_creates_directory() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("nested").join("root");

    let initializer = RootFolderInitializer::new(root.clone());
    initializer.ensure_directory_exists().unwrap();

    assert!(root.is_dir());
    assert_eq!(initializer.database_path(), root.join("chemsafe.db"));
}
