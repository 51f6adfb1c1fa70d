//! Tests for configuration loading and graceful degradation
//!
//! Covers:
//! - Missing config files fall back to defaults
//! - Root folder priority order (CLI > env > TOML > compiled default)
//! - Explicit config paths must exist and parse, and are reported as the source
//! - Archive path resolution
//!
//! Tests that manipulate SONICSHARE_ROOT_FOLDER or SONICSHARE_ROOT are marked
//! with #[serial] so they never run in parallel.

use serial_test::serial;
use sonicshare_common::config::{
    archive_path, load_toml_config, CompiledDefaults, RootFolderResolver, TomlConfig,
    ENV_ROOT, ENV_ROOT_FOLDER,
};
use sonicshare_common::Error;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

fn clear_root_env() {
    env::remove_var(ENV_ROOT_FOLDER);
    env::remove_var(ENV_ROOT);
}

#[test]
fn test_compiled_defaults_for_current_platform() {
    let defaults = CompiledDefaults::for_current_platform();

    assert!(!defaults.root_folder.as_os_str().is_empty());
    assert!(defaults.root_folder.to_string_lossy().contains("sonicshare"));
}

#[test]
#[serial]
fn test_resolver_with_no_overrides_uses_default() {
    clear_root_env();

    let root_folder = RootFolderResolver::new().resolve();

    let defaults = CompiledDefaults::for_current_platform();
    assert_eq!(root_folder, defaults.root_folder);
}

#[test]
#[serial]
fn test_resolver_env_var_root_folder() {
    clear_root_env();
    env::set_var(ENV_ROOT_FOLDER, "/tmp/sonicshare-test-env-folder");

    let root_folder = RootFolderResolver::new().resolve();
    assert_eq!(root_folder, PathBuf::from("/tmp/sonicshare-test-env-folder"));

    clear_root_env();
}

#[test]
#[serial]
fn test_resolver_env_var_root() {
    clear_root_env();
    env::set_var(ENV_ROOT, "/tmp/sonicshare-test-env-root");

    let root_folder = RootFolderResolver::new().resolve();
    assert_eq!(root_folder, PathBuf::from("/tmp/sonicshare-test-env-root"));

    clear_root_env();
}

#[test]
#[serial]
fn test_resolver_root_folder_var_takes_precedence() {
    clear_root_env();
    env::set_var(ENV_ROOT_FOLDER, "/tmp/sonicshare-priority-1");
    env::set_var(ENV_ROOT, "/tmp/sonicshare-priority-2");

    let root_folder = RootFolderResolver::new().resolve();
    assert_eq!(root_folder, PathBuf::from("/tmp/sonicshare-priority-1"));

    clear_root_env();
}

#[test]
#[serial]
fn test_resolver_env_beats_toml_cli_beats_env() {
    clear_root_env();
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/from-toml")),
        ..TomlConfig::default()
    };

    // TOML only
    let root = RootFolderResolver::new().with_toml(&config).resolve();
    assert_eq!(root, PathBuf::from("/tmp/from-toml"));

    // Env beats TOML
    env::set_var(ENV_ROOT, "/tmp/from-env");
    let root = RootFolderResolver::new().with_toml(&config).resolve();
    assert_eq!(root, PathBuf::from("/tmp/from-env"));

    // CLI beats env
    let root = RootFolderResolver::new()
        .with_cli_arg(Some(PathBuf::from("/tmp/from-cli")))
        .with_toml(&config)
        .resolve();
    assert_eq!(root, PathBuf::from("/tmp/from-cli"));

    clear_root_env();
}

#[test]
fn test_explicit_missing_config_is_error() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("nope.toml");

    let result = load_toml_config(Some(&missing));
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_explicit_invalid_config_is_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bad.toml");
    std::fs::write(&path, "root_folder = [not toml").unwrap();

    let result = load_toml_config(Some(&path));
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_explicit_config_loads_sections() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
        root_folder = "/srv/sonicshare"

        [archive]
        path = "archive/uploads.csv"
        clean_columns = ["filename", "tags", "license"]

        [logging]
        level = "debug"

        [classifier]
        token_env = "SONIC_HF_TOKEN"
        "#,
    )
    .unwrap();

    let loaded = load_toml_config(Some(&path)).unwrap();
    assert_eq!(loaded.source, Some(path.clone()));

    let config = loaded.config;
    assert_eq!(config.root_folder, Some(PathBuf::from("/srv/sonicshare")));
    assert_eq!(config.archive.clean_columns, vec!["filename", "tags", "license"]);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.classifier.token_env, "SONIC_HF_TOKEN");
    assert_eq!(config.classifier.endpoint, "https://api-inference.huggingface.co/models");

    let archive = archive_path(PathBuf::from("/srv/sonicshare").as_path(), &config.archive);
    assert_eq!(archive, PathBuf::from("/srv/sonicshare/archive/uploads.csv"));
}

#[test]
fn test_empty_config_file_is_all_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "").unwrap();

    let loaded = load_toml_config(Some(&path)).unwrap();
    assert_eq!(loaded.config, TomlConfig::default());
    assert_eq!(loaded.source, Some(path));
}
