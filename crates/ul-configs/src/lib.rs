//! # ul-configs
//!
//! Layered settings for the userlist binary: built-in defaults, an optional
//! `userlist.toml`, a `.env` file and `USERLIST__*` environment variables, in
//! increasing order of precedence.

mod tracing_init;

use std::time::Duration;

use config::{Config, Environment, File, Map};
use serde::Deserialize;
use thiserror::Error;

pub use tracing_init::init_tracing;

const ENV_PREFIX: &str = "USERLIST";
const FILE_STEM: &str = "userlist";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub list: ListConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    #[serde(default)]
    pub nationality: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListConfig {
    pub batch_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl AppConfig {
    /// Loads `.env` (if present), then the file and environment layers.
    pub fn load() -> Result<Self, ConfigError> {
        // Best-effort .env load; ignore if missing
        let _ = dotenvy::dotenv();
        Self::load_from(None, None)
    }

    /// Same layering as [`AppConfig::load`], with the file contents and the
    /// environment supplied by the caller instead of read from disk/process.
    pub fn load_from(
        toml: Option<&str>,
        env: Option<Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("api.base_url", "https://randomuser.me")?
            .set_default("api.timeout_secs", 30)?
            .set_default("list.batch_size", 20)?
            .set_default("log.level", "info")?
            .set_default("log.json", false)?;

        builder = match toml {
            Some(contents) => builder.add_source(File::from_str(contents, config::FileFormat::Toml)),
            None => builder.add_source(File::with_name(FILE_STEM).required(false)),
        };

        let environment = Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true);
        builder = match env {
            Some(vars) => builder.add_source(environment.source(Some(vars))),
            None => builder.add_source(environment),
        };

        let mut cfg: AppConfig = builder.build()?.try_deserialize()?;
        cfg.normalize();
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    fn normalize(&mut self) {
        if self
            .api
            .nationality
            .as_deref()
            .is_some_and(|nat| nat.trim().is_empty())
        {
            self.api.nationality = None;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.api.base_url.starts_with("http://") || self.api.base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "api.base_url must be an http(s) URL, got {:?}",
                self.api.base_url
            )));
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Invalid("api.timeout_secs must be positive".into()));
        }
        if self.list.batch_size == 0 {
            return Err(ConfigError::Invalid("list.batch_size must be positive".into()));
        }
        Ok(())
    }
}
