//! Configuration loading and environment variable interpolation

use crate::error::{Error, Result};
use regex::Regex;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::Config;

pub const CONFIG_FILENAME: &str = "kayd.toml";

/// Overrides `api.base_url` when set
const API_URL_ENV: &str = "KAYD_API_URL";

/// Load configuration from kayd.toml
pub fn load_config() -> Result<Config> {
    let config_path = find_config_file()?;
    load_config_from_path(&config_path)
}

/// Load kayd.toml if one exists, otherwise fall back to defaults
pub fn load_config_or_default() -> Result<Config> {
    match load_config() {
        Ok(config) => Ok(config),
        Err(Error::ConfigNotFound) => {
            tracing::debug!("No {} found, using defaults", CONFIG_FILENAME);
            Ok(apply_env_overrides(Config::default()))
        }
        Err(e) => Err(e),
    }
}

/// Load configuration from a specific path
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|_| Error::ConfigNotFound)?;
    let content = interpolate_env_vars(&content);
    let config: Config = toml::from_str(&content)?;
    Ok(apply_env_overrides(config))
}

fn apply_env_overrides(mut config: Config) -> Config {
    if let Ok(url) = env::var(API_URL_ENV) {
        if !url.is_empty() {
            config.api.base_url = url;
        }
    }
    config
}

/// Find the configuration file, searching upward from current directory
fn find_config_file() -> Result<PathBuf> {
    let mut current = env::current_dir().map_err(|e| Error::Config(e.to_string()))?;

    loop {
        let config_path = current.join(CONFIG_FILENAME);
        if config_path.exists() {
            return Ok(config_path);
        }

        if !current.pop() {
            return Err(Error::ConfigNotFound);
        }
    }
}

/// Default location of the persisted session file
pub fn default_storage_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("app", "kayd", "kayd")
        .ok_or_else(|| Error::Config("Cannot resolve platform directories".to_string()))?;
    Ok(dirs.data_dir().join("session.json"))
}

/// Interpolate environment variables in the format ${VAR_NAME} or ${VAR_NAME:-default}
fn interpolate_env_vars(content: &str) -> String {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}")
        .expect("interpolation pattern is valid");

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");

        env::var(var_name).unwrap_or_else(|_| default.to_string())
    })
    .to_string()
}

/// Generate a default configuration file content
pub fn default_config_content() -> &'static str {
    r#"# Kayd Configuration

[api]
base_url = "${KAYD_API_URL:-http://localhost:3000/api}"
timeout_secs = 30

[storage]
# Where the session token is kept between runs.
# Defaults to the platform data directory.
# path = "./kayd-session.json"
"#
}
