//! Fetch settings layered from three sources: built-in defaults, an optional TOML file, and
//! command-line flags. The file is `--settings PATH` when given, otherwise the first of
//! `./web2ebook.toml` and `$XDG_CONFIG_HOME/web2ebook/config.toml` that exists.

use crate::fetch::{HttpFetcher, HttpFetcherBuilder};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const LOCAL_SETTINGS_FILE: &str = "web2ebook.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Cannot read settings {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// One settings layer. `None` means "not set here"; see [Settings::overridden_by].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub user_agent: Option<String>,
    pub timeout_secs: Option<u64>,
    pub request_delay_secs: Option<u64>,
}

impl Settings {
    /// Keys set in `overlay` win; the rest keep this layer's values.
    pub fn overridden_by(self, overlay: Settings) -> Settings {
        Settings {
            user_agent: overlay.user_agent.or(self.user_agent),
            timeout_secs: overlay.timeout_secs.or(self.timeout_secs),
            request_delay_secs: overlay.request_delay_secs.or(self.request_delay_secs),
        }
    }

    /// Fetcher builder with every key that is set applied; unset keys keep the fetcher defaults.
    pub fn fetcher_builder(&self) -> HttpFetcherBuilder {
        let mut builder = HttpFetcher::builder();
        if let Some(ref ua) = self.user_agent {
            builder = builder.user_agent(ua.clone());
        }
        if let Some(secs) = self.timeout_secs {
            builder = builder.timeout_secs(secs);
        }
        if let Some(secs) = self.request_delay_secs {
            builder = builder.delay_secs(secs);
        }
        builder
    }
}

fn read_settings(path: &Path) -> Result<Settings, SettingsError> {
    let s = std::fs::read_to_string(path).map_err(|e| SettingsError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    toml::from_str(&s).map_err(|e| SettingsError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// An explicit path must exist. Without one, a missing file yields empty settings.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings, SettingsError> {
    if let Some(path) = explicit {
        return read_settings(path);
    }
    let mut candidates = vec![PathBuf::from(LOCAL_SETTINGS_FILE)];
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("web2ebook").join("config.toml"));
    }
    match candidates.iter().find(|p| p.is_file()) {
        Some(path) => read_settings(path),
        None => Ok(Settings::default()),
    }
}
