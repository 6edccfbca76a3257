use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Generated ad-block rule file consumed by dnsmasq.
    #[serde(default = "default_rule_file_path")]
    pub rule_file_path: String,

    /// Main dnsmasq configuration regenerated on every apply.
    #[serde(default = "default_dnsmasq_config_path")]
    pub dnsmasq_config_path: String,

    /// Static base configuration always included first.
    #[serde(default = "default_static_config_path")]
    pub static_config_path: String,

    /// Persisted settings store (URLs, overrides, toggles, fingerprints).
    #[serde(default = "default_settings_path")]
    pub settings_path: String,

    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Command used to restart dnsmasq after a config write.
    #[serde(default = "default_reload_command")]
    pub reload_command: String,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    #[serde(default = "default_fetch_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_concurrent_downloads")]
    pub concurrent_downloads: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Defaults
fn default_rule_file_path() -> String {
    "/etc/dnsmasq.d/adblock.conf".to_string()
}
fn default_dnsmasq_config_path() -> String {
    "/etc/dnsmasq.conf".to_string()
}
fn default_static_config_path() -> String {
    "/etc/dnsmasq_static.conf".to_string()
}
fn default_settings_path() -> String {
    "/var/lib/adblockd/settings.json".to_string()
}
fn default_api_port() -> u16 {
    8080
}
fn default_reload_command() -> String {
    "systemctl restart dnsmasq".to_string()
}
fn default_fetch_timeout_secs() -> u64 {
    10
}
fn default_concurrent_downloads() -> usize {
    4
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rule_file_path: default_rule_file_path(),
            dnsmasq_config_path: default_dnsmasq_config_path(),
            static_config_path: default_static_config_path(),
            settings_path: default_settings_path(),
            api_port: default_api_port(),
            reload_command: default_reload_command(),
            fetch: FetchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout_secs(),
            concurrent_downloads: default_concurrent_downloads(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .context("Failed to read config file")?;
        let config: Config = toml::from_str(&contents).context("Failed to parse config TOML")?;
        Ok(config)
    }
}
