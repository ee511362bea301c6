//! Project configuration: the JSON file naming the book and its ordered list of URLs.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Config field '{field}' must not be empty.")]
    EmptyField { field: &'static str },

    #[error("Invalid URL in config: {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("URL listed more than once in config: {url}")]
    DuplicateUrl { url: String },

    #[error("Refusing to overwrite existing file {path}. Pass --force to replace it.")]
    AlreadyExists { path: PathBuf },

    #[error("Cannot write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Book metadata and the URLs that become its chapters, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub title: String,
    pub author: String,
    pub version: String,
    pub homepage: String,
    /// Project directory. Relative paths resolve against the current directory.
    pub output_dir: PathBuf,
    pub urls: Vec<String>,
}

impl Config {
    /// Placeholder values written by `--new`.
    pub fn template() -> Self {
        Self {
            title: "__fill the title__".to_string(),
            author: "__fill the author__".to_string(),
            version: "v1.0".to_string(),
            homepage: "__fill url to home page__".to_string(),
            output_dir: PathBuf::from("__fill output dir__"),
            urls: Vec::new(),
        }
    }

    /// Check the invariants generation relies on. Returns the parsed URLs in order.
    pub fn validate(&self) -> Result<Vec<Url>, ConfigError> {
        // Blank author or version lines would end the index's document header early.
        for (field, value) in [
            ("title", &self.title),
            ("author", &self.author),
            ("version", &self.version),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyField { field });
            }
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyField {
                field: "output_dir",
            });
        }
        let mut seen = HashSet::new();
        let mut urls = Vec::with_capacity(self.urls.len());
        for raw in &self.urls {
            let url = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidUrl {
                url: raw.clone(),
                reason: e.to_string(),
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ConfigError::InvalidUrl {
                    url: raw.clone(),
                    reason: format!("unsupported scheme '{}'", url.scheme()),
                });
            }
            if url.host_str().is_none() {
                return Err(ConfigError::InvalidUrl {
                    url: raw.clone(),
                    reason: "URL has no host".to_string(),
                });
            }
            let key = url.as_str().trim_end_matches('/').to_string();
            if !seen.insert(key) {
                return Err(ConfigError::DuplicateUrl { url: raw.clone() });
            }
            urls.push(url);
        }
        Ok(urls)
    }
}

/// Read, parse, and validate a project config.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let s = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let config: Config = serde_json::from_str(&s).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    config.validate()?;
    Ok(config)
}

/// Write a template config to `path`. An existing file is only replaced when `overwrite` is set.
pub fn generate_template(path: &Path, overwrite: bool) -> Result<(), ConfigError> {
    if path.exists() && !overwrite {
        return Err(ConfigError::AlreadyExists {
            path: path.to_path_buf(),
        });
    }
    let write_err = |e: std::io::Error| ConfigError::Write {
        path: path.to_path_buf(),
        source: e,
    };
    let mut json = serde_json::to_string_pretty(&Config::template())
        .map_err(|e| write_err(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
    json.push('\n');
    std::fs::write(path, json).map_err(write_err)
}
