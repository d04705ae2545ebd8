use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use shared::domain::{default_predefined_styles, PredefinedStyle};
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_CONFIG_FILE: &str = "imaginet.toml";
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Base url of the style-transfer service; the route is appended to it.
    pub endpoint: String,
    pub timeout: Option<Duration>,
    pub styles: Vec<PredefinedStyle>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: None,
            styles: default_predefined_styles(),
        }
    }
}

/// Values given on the command line. They win over file and environment.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub config_path: Option<PathBuf>,
    pub endpoint: Option<String>,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read config file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("config file '{}' lists a style with an empty name or url", path.display())]
    InvalidStyle { path: PathBuf },
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    endpoint: Option<String>,
    timeout_seconds: Option<u64>,
    styles: Option<Vec<PredefinedStyle>>,
}

pub fn load_settings(overrides: &SettingsOverrides) -> Result<Settings, SettingsError> {
    load_settings_with_env(overrides, |name| std::env::var(name).ok())
}

/// Defaults, then the config file, then environment, then `overrides`.
pub fn load_settings_with_env(
    overrides: &SettingsOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Settings, SettingsError> {
    let mut settings = Settings::default();

    let explicit_path = overrides
        .config_path
        .clone()
        .or_else(|| non_empty(env("IMAGINET_CONFIG")).map(PathBuf::from));
    match explicit_path {
        Some(path) => apply_file(&mut settings, &path)?,
        None => {
            let path = Path::new(DEFAULT_CONFIG_FILE);
            if path.exists() {
                apply_file(&mut settings, path)?;
            }
        }
    }

    if let Some(v) = non_empty(env("IMAGINET_ENDPOINT")) {
        settings.endpoint = v;
    }
    if let Some(v) = non_empty(env("APP__ENDPOINT")) {
        settings.endpoint = v;
    }
    if let Some(v) = non_empty(env("APP__TIMEOUT_SECONDS")) {
        match v.parse::<u64>() {
            Ok(secs) => settings.timeout = timeout_from_secs(secs),
            Err(err) => warn!(value = %v, "ignoring APP__TIMEOUT_SECONDS: {err}"),
        }
    }

    if let Some(endpoint) = overrides.endpoint.clone() {
        settings.endpoint = endpoint;
    }

    Ok(settings)
}

fn apply_file(settings: &mut Settings, path: &Path) -> Result<(), SettingsError> {
    let raw = fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let file_cfg: FileSettings = toml::from_str(&raw).map_err(|source| SettingsError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(v) = file_cfg.endpoint {
        settings.endpoint = v;
    }
    if let Some(secs) = file_cfg.timeout_seconds {
        settings.timeout = timeout_from_secs(secs);
    }
    if let Some(styles) = file_cfg.styles {
        if styles
            .iter()
            .any(|s| s.name.trim().is_empty() || s.url.trim().is_empty())
        {
            return Err(SettingsError::InvalidStyle {
                path: path.to_path_buf(),
            });
        }
        settings.styles = styles;
    }
    Ok(())
}

// Zero means "no timeout".
fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
