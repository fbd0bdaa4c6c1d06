use crate::types::FetchConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Application configuration, read from a JSON file.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    /// Feed URLs polled every cycle.
    pub rss: Vec<String>,
    /// Minutes between cycles.
    pub request_period: u64,
    pub server_port: u16,
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
    #[serde(default)]
    pub fetch: FetchConfig,
}

impl AppConfig {
    /// Load and validate `path`. `DATABASE_URL`, when set, replaces the
    /// file's `database_url`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = Self::from_json(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if let Ok(database_url) = std::env::var("DATABASE_URL") {
            config.database_url = database_url;
        }

        config.validate()?;
        info!(
            "Config loaded: {} feeds, every {} min, port {}, database {}",
            config.rss.len(),
            config.request_period,
            config.server_port,
            mask_password(&config.database_url)
        );
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rss.is_empty() {
            return Err(ConfigError::Invalid("RSS feed list should not be empty".to_string()));
        }

        for feed in &self.rss {
            let valid = Url::parse(feed)
                .map(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some())
                .unwrap_or(false);
            if !valid {
                return Err(ConfigError::Invalid(format!("not an http(s) feed URL: {}", feed)));
            }
        }

        if self.request_period == 0 {
            return Err(ConfigError::Invalid(
                "request_period should be greater than 0".to_string(),
            ));
        }

        if self.server_port == 0 {
            return Err(ConfigError::Invalid("server_port should not be 0".to_string()));
        }

        if self.fetch.timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "fetch.timeout_seconds should be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn cycle_interval(&self) -> Duration {
        Duration::from_secs(self.request_period.saturating_mul(60))
    }
}

/// Hide the password of a connection URL for logging.
pub fn mask_password(database_url: &str) -> String {
    match Url::parse(database_url) {
        Ok(mut url) if url.password().is_some() => {
            let _ = url.set_password(Some("***"));
            url.to_string()
        }
        _ => database_url.to_string(),
    }
}
