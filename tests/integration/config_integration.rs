//! Integration tests for Configuration System

use crate::integration::test_utils::with_isolated_env;
use normcache::config::global_config_path;
use normcache::{ConfigLoader, FetchPolicy, NormcacheConfig};
use std::path::Path;
use tempfile::TempDir;

fn write_file(path: &Path, contents: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

#[test]
fn test_defaults_without_any_source() {
    let test_dir = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();

    let config = with_isolated_env(&test_dir, &[], || {
        ConfigLoader::load(workspace.path()).unwrap()
    });

    assert_eq!(config.cache.default_fetch_policy, FetchPolicy::CacheFirst);
    assert!(!config.cache.write_to_cache_asynchronously);
    assert!(config.cache.default_refetch_policy.is_none());
    assert_eq!(config.logging.level, "info");
    assert!(config.validate().is_ok());
}

#[test]
fn test_workspace_file_overrides_defaults() {
    let test_dir = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();
    write_file(
        &workspace.path().join("config").join("config.toml"),
        r#"
[cache]
default_fetch_policy = "network_first"
default_refetch_policy = "cache_only"
"#,
    );

    let config = with_isolated_env(&test_dir, &[], || {
        ConfigLoader::load(workspace.path()).unwrap()
    });

    assert_eq!(config.cache.default_fetch_policy, FetchPolicy::NetworkFirst);
    assert_eq!(
        config.cache.default_refetch_policy,
        Some(FetchPolicy::CacheOnly)
    );
    // Keys the file does not mention keep their defaults.
    assert!(!config.cache.store_partial_responses);
}

#[test]
fn test_environment_file_layers_over_base_file() {
    let test_dir = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();
    let config_dir = workspace.path().join("config");
    write_file(
        &config_dir.join("config.toml"),
        "[cache]\ndefault_fetch_policy = \"network_first\"\nstore_partial_responses = true\n",
    );
    write_file(
        &config_dir.join("staging.toml"),
        "[cache]\ndefault_fetch_policy = \"cache_only\"\n",
    );

    let config = with_isolated_env(&test_dir, &[("NORMCACHE_ENV", "staging")], || {
        ConfigLoader::load(workspace.path()).unwrap()
    });

    assert_eq!(config.cache.default_fetch_policy, FetchPolicy::CacheOnly);
    assert!(config.cache.store_partial_responses);
}

#[test]
fn test_environment_variables_win() {
    let test_dir = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();
    write_file(
        &workspace.path().join("config").join("config.toml"),
        "[cache]\ndefault_fetch_policy = \"network_first\"\n",
    );

    let config = with_isolated_env(
        &test_dir,
        &[
            ("NORMCACHE__CACHE__DEFAULT_FETCH_POLICY", "network_only"),
            ("NORMCACHE__CACHE__WRITE_TO_CACHE_ASYNCHRONOUSLY", "true"),
        ],
        || ConfigLoader::load(workspace.path()).unwrap(),
    );

    assert_eq!(config.cache.default_fetch_policy, FetchPolicy::NetworkOnly);
    assert!(config.cache.write_to_cache_asynchronously);
}

#[cfg(target_os = "linux")]
#[test]
fn test_global_file_below_workspace_file() {
    let test_dir = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();
    write_file(
        &workspace.path().join("config").join("config.toml"),
        "[cache]\ndefault_fetch_policy = \"cache_only\"\n",
    );

    let config = with_isolated_env(&test_dir, &[], || {
        let global = global_config_path().unwrap();
        assert!(global.starts_with(test_dir.path()));
        write_file(
            &global,
            "[cache]\ndefault_fetch_policy = \"network_only\"\nstore_partial_responses = true\n",
        );
        ConfigLoader::load(workspace.path()).unwrap()
    });

    assert_eq!(config.cache.default_fetch_policy, FetchPolicy::CacheOnly);
    assert!(config.cache.store_partial_responses);
}

#[test]
fn test_unknown_policy_rejected() {
    let test_dir = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();
    write_file(
        &workspace.path().join("config").join("config.toml"),
        "[cache]\ndefault_fetch_policy = \"cache_sometimes\"\n",
    );

    let result = with_isolated_env(&test_dir, &[], || ConfigLoader::load(workspace.path()));
    assert!(result.is_err());
}

#[test]
fn test_load_validated_reports_problems() {
    let test_dir = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();
    write_file(
        &workspace.path().join("config").join("config.toml"),
        "[logging]\nlevel = \"loud\"\n",
    );

    let result = with_isolated_env(&test_dir, &[], || {
        NormcacheConfig::load_validated(workspace.path())
    });
    let message = result.unwrap_err().to_string();
    assert!(message.contains("Invalid log level: loud"));
}
