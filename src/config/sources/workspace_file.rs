//! Per-project cache settings checked in next to the code that builds the client.
//!
//! `config/config.toml` holds settings shared by every deployment of the project;
//! `config/{NORMCACHE_ENV}.toml` (default `development`) overrides them for one
//! environment, e.g. turning on background writes only in `production`.

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File, FileFormat};
use std::path::{Path, PathBuf};

const DEFAULT_ENVIRONMENT: &str = "development";

/// Workspace files that exist, lowest precedence first
pub fn workspace_files(workspace_root: &Path) -> Vec<PathBuf> {
    let config_dir = workspace_root.join("config");
    let environment =
        std::env::var("NORMCACHE_ENV").unwrap_or_else(|_| DEFAULT_ENVIRONMENT.to_string());
    [
        config_dir.join("config.toml"),
        config_dir.join(format!("{}.toml", environment)),
    ]
    .into_iter()
    .filter(|path| path.is_file())
    .collect()
}

/// Layer the workspace's cache settings over `builder`
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(workspace_files(workspace_root)
        .into_iter()
        .fold(builder, |builder, path| {
            builder.add_source(File::from(path).format(FileFormat::Toml))
        }))
}
