//! Client settings loaded from `YANDEX_*` variables.
//!
//! Values come from an optional env file and the process environment; the
//! process environment wins when both define a key.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use tracing::debug;

use crate::error::{DiskError, Result};

pub const ENV_PREFIX: &str = "YANDEX_";
pub const DEFAULT_ENV_FILE: &str = "yandexSettings.env";

pub const DEFAULT_BASE_URL: &str = "https://cloud-api.yandex.net/v1/disk";
pub const DEFAULT_RESOURCES_ENDPOINT: &str = "/resources";
pub const DEFAULT_UPLOAD_ENDPOINT: &str = "/resources/upload";
pub const DEFAULT_DOWNLOAD_ENDPOINT: &str = "/resources/download";

/// Credentials and endpoint paths for the Disk API.
#[derive(Clone)]
pub struct Settings {
    pub access_token: String,
    pub base_url: String,
    pub resources_endpoint: String,
    pub upload_endpoint: String,
    pub download_endpoint: String,
}

impl Settings {
    /// Build settings with the public API endpoints and the given token.
    pub fn with_token(access_token: impl Into<String>) -> Self {
        Settings {
            access_token: access_token.into(),
            base_url: DEFAULT_BASE_URL.into(),
            resources_endpoint: DEFAULT_RESOURCES_ENDPOINT.into(),
            upload_endpoint: DEFAULT_UPLOAD_ENDPOINT.into(),
            download_endpoint: DEFAULT_DOWNLOAD_ENDPOINT.into(),
        }
    }

    /// Load settings from `env_file` (if it exists) overlaid with the
    /// process environment.
    pub fn load(env_file: &Path) -> Result<Self> {
        Self::load_with(env_file, std::env::vars())
    }

    fn load_with<I>(env_file: &Path, overrides: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut vars = read_env_file(env_file)?;
        vars.extend(overrides.into_iter().map(|(k, v)| (k.to_ascii_uppercase(), v)));
        Self::from_vars(&vars)
    }

    /// Build settings from an already collected variable map. Keys are
    /// expected upper-cased, including the `YANDEX_` prefix.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self> {
        let get = |field: &str| {
            vars.get(&format!("{}{}", ENV_PREFIX, field))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let access_token = get("ACCESS_TOKEN").ok_or_else(|| {
            DiskError::Config(format!("{}ACCESS_TOKEN is not set", ENV_PREFIX))
        })?;

        let mut settings = Settings::with_token(access_token);
        if let Some(v) = get("BASE_URL") {
            settings.base_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = get("RESOURCES_ENDPOINT") {
            settings.resources_endpoint = v;
        }
        if let Some(v) = get("UPLOAD_ENDPOINT") {
            settings.upload_endpoint = v;
        }
        if let Some(v) = get("DOWNLOAD_ENDPOINT") {
            settings.download_endpoint = v;
        }
        Ok(settings)
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("access_token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("resources_endpoint", &self.resources_endpoint)
            .field("upload_endpoint", &self.upload_endpoint)
            .field("download_endpoint", &self.download_endpoint)
            .finish()
    }
}

/// Read `KEY=VALUE` pairs from an env file. Keys are upper-cased so
/// lookups are case-insensitive; a missing file reads as empty.
fn read_env_file(env_file: &Path) -> Result<HashMap<String, String>> {
    let config_err = |e: dotenvy::Error| DiskError::Config(format!("cannot read {}: {}", env_file.display(), e));

    let iter = match dotenvy::from_path_iter(env_file) {
        Ok(iter) => iter,
        Err(e) if e.not_found() => return Ok(HashMap::new()),
        Err(e) => return Err(config_err(e)),
    };

    let mut vars = HashMap::new();
    for item in iter {
        let (key, value) = item.map_err(config_err)?;
        vars.insert(key.to_ascii_uppercase(), value);
    }
    debug!(path = %env_file.display(), keys = vars.len(), "loaded env file");
    Ok(vars)
}
