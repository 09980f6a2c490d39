/// Application configuration management
/// Stores settings in ~/.config/nodewatch/config.toml
///
/// Precedence, lowest first: built-in defaults, config file, environment
/// (including a `.env` file loaded at startup), command-line flags.

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::constants::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySettings {
    pub prometheus_url: String,
    pub host: String,
    pub port: u16,
    pub job: String,
    /// Reject `/api/system` without an `instance` parameter
    pub require_instance: bool,
    #[serde(with = "duration_str")]
    pub query_timeout: Duration,
    pub cors: bool,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            prometheus_url: DEFAULT_PROMETHEUS_URL.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            job: DEFAULT_JOB.to_string(),
            require_instance: true,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            cors: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSettings {
    pub api_url: String,
    #[serde(with = "duration_str")]
    pub poll_interval: Duration,
    /// Samples kept per metric
    pub history: usize,
    /// Poll unscoped metrics instead of selecting an instance
    pub global: bool,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            history: DEFAULT_HISTORY,
            global: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub gateway: GatewaySettings,
    pub dashboard: DashboardSettings,
}

impl AppConfig {
    /// Default config file path
    pub fn config_path() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine the user config directory"))?;
        Ok(dir.join("nodewatch").join("config.toml"))
    }

    /// Load from `path`, or from the default location when `None`.
    ///
    /// A missing default file yields defaults; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (Self::config_path()?, false),
        };

        if !path.exists() {
            if explicit {
                bail!("Config file not found at {}", path.display());
            }
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Overlay environment variables read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let gw = &mut self.gateway;
        if let Some(v) = lookup(ENV_PROMETHEUS_URL) {
            gw.prometheus_url = v;
        }
        if let Some(v) = lookup(ENV_HOST) {
            gw.host = v;
        }
        if let Some(v) = lookup(ENV_PORT) {
            gw.port = v
                .parse()
                .with_context(|| format!("{} is not a valid port: {}", ENV_PORT, v))?;
        }
        if let Some(v) = lookup(ENV_JOB) {
            gw.job = v;
        }
        if let Some(v) = lookup(ENV_REQUIRE_INSTANCE) {
            gw.require_instance = parse_bool(ENV_REQUIRE_INSTANCE, &v)?;
        }
        if let Some(v) = lookup(ENV_QUERY_TIMEOUT) {
            gw.query_timeout = parse_duration(ENV_QUERY_TIMEOUT, &v)?;
        }

        let dash = &mut self.dashboard;
        if let Some(v) = lookup(ENV_API_URL) {
            dash.api_url = v;
        }
        if let Some(v) = lookup(ENV_POLL_INTERVAL) {
            dash.poll_interval = parse_duration(ENV_POLL_INTERVAL, &v)?;
        }
        if let Some(v) = lookup(ENV_HISTORY) {
            dash.history = v
                .parse()
                .with_context(|| format!("{} is not a valid number: {}", ENV_HISTORY, v))?;
        }

        Ok(())
    }

    /// Returns a list of problems; empty means valid
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !is_http_url(&self.gateway.prometheus_url) {
            errors.push(format!(
                "gateway.prometheus_url must be an http(s) URL: {}",
                self.gateway.prometheus_url
            ));
        }
        if self.gateway.job.trim().is_empty() {
            errors.push("gateway.job must not be empty".to_string());
        }
        if self.gateway.query_timeout.is_zero() {
            errors.push("gateway.query_timeout must be greater than zero".to_string());
        }
        if !is_http_url(&self.dashboard.api_url) {
            errors.push(format!(
                "dashboard.api_url must be an http(s) URL: {}",
                self.dashboard.api_url
            ));
        }
        if self.dashboard.poll_interval.is_zero() {
            errors.push("dashboard.poll_interval must be greater than zero".to_string());
        }
        if self.dashboard.history == 0 {
            errors.push("dashboard.history must be at least 1".to_string());
        }

        errors
    }

    /// Fail with every validation problem at once
    pub fn ensure_valid(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(anyhow!("Invalid configuration:\n  - {}", errors.join("\n  - ")))
        }
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => bail!("{} must be a boolean: {}", key, value),
    }
}

pub fn parse_duration(key: &str, value: &str) -> Result<Duration> {
    humantime::parse_duration(value.trim())
        .with_context(|| format!("{} is not a valid duration: {}", key, value))
}

/// Durations as humantime strings ("5s", "1m 30s") in the config file
mod duration_str {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*value).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(D::Error::custom)
    }
}
