use anyhow::{Context, Result};
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use url::Url;

use crate::error::ConfigError;

// ── Top-level config ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    /// HTTP base of the messaging service (default: <http://localhost:3000>)
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Push channel endpoint; derived from `server_url` when unset
    #[serde(default)]
    pub channel_url: Option<String>,

    /// Postgres connection string used by `nuke`
    #[serde(default)]
    pub database_url: Option<String>,

    /// How long to wait for the initial tag / message snapshots
    #[serde(default = "default_snapshot_timeout_secs")]
    pub snapshot_timeout_secs: u64,
}

fn default_server_url() -> String {
    "http://localhost:3000".into()
}

fn default_snapshot_timeout_secs() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        let home =
            UserDirs::new().map_or_else(|| PathBuf::from("."), |u| u.home_dir().to_path_buf());
        Self {
            config_path: home.join(".trigger-desk").join("config.toml"),
            server_url: default_server_url(),
            channel_url: None,
            database_url: None,
            snapshot_timeout_secs: default_snapshot_timeout_secs(),
        }
    }
}

impl Config {
    pub fn load_or_init() -> Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .context("Could not find home directory")?;
        let mut config = Self::load_or_init_at(home.join(".trigger-desk").join("config.toml"))?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Read `config_path`, or write a default config there if it is missing.
    pub fn load_or_init_at(config_path: PathBuf) -> Result<Self> {
        if let Some(dir) = config_path.parent()
            && !dir.exists()
        {
            fs::create_dir_all(dir).context("Failed to create config directory")?;
        }

        if config_path.exists() {
            let contents =
                fs::read_to_string(&config_path).context("Failed to read config file")?;
            let mut config: Config =
                toml::from_str(&contents).context("Failed to parse config file")?;
            config.config_path = config_path;
            Ok(config)
        } else {
            let config = Self {
                config_path,
                ..Self::default()
            };
            config.save()?;
            Ok(config)
        }
    }

    /// Apply environment variable overrides to config
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("TRIGGER_DESK_SERVER_URL")
            && !url.is_empty()
        {
            self.server_url = url;
        }

        if let Ok(url) = std::env::var("TRIGGER_DESK_CHANNEL_URL")
            && !url.is_empty()
        {
            self.channel_url = Some(url);
        }

        // Database: TRIGGER_DESK_DATABASE_URL or DATABASE_URL
        if let Ok(url) =
            std::env::var("TRIGGER_DESK_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL"))
            && !url.is_empty()
        {
            self.database_url = Some(url);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server_url()?;
        self.channel_url()?;
        if self.snapshot_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "snapshot_timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn server_url(&self) -> Result<Url, ConfigError> {
        parse_url("server_url", &self.server_url)
    }

    /// The push channel shares the HTTP origin unless configured separately.
    pub fn channel_url(&self) -> Result<Url, ConfigError> {
        match &self.channel_url {
            Some(url) => parse_url("channel_url", url),
            None => self.server_url(),
        }
    }

    pub fn database_url(&self) -> Result<&str, ConfigError> {
        self.database_url.as_deref().ok_or_else(|| {
            ConfigError::Validation(
                "database_url is not set (config.toml, TRIGGER_DESK_DATABASE_URL or DATABASE_URL)"
                    .into(),
            )
        })
    }

    pub fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&self.config_path, toml_str).context("Failed to write config file")?;
        Ok(())
    }
}

fn parse_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::Validation(format!("{field} {raw:?}: {e}")))
}
