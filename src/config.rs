use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use chrono::NaiveTime;
use serde::{Deserialize, Deserializer};
use tracing::trace;

use crate::util;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub controller: ControllerConfig,

    /// Channels are polled in the order they are listed
    pub channels: Vec<ChannelConfig>,

    /// Poll cadence in seconds
    #[serde(default = "default_interval")]
    pub interval: u64,

    /// Samples kept per channel (360 = one hour at the default cadence)
    #[serde(default = "default_window")]
    pub window: usize,

    #[serde(default)]
    pub reports: ReportConfig,

    pub notifier: Option<NotifierConfig>,

    pub api: Option<ApiSettings>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ControllerConfig {
    pub host: String,
    #[serde(default = "default_modbus_port")]
    pub port: u16,
    #[serde(default = "default_unit_id")]
    pub unit_id: u8,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    #[serde(default)]
    pub reconnect: ReconnectPolicy,
}

impl ControllerConfig {
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

/// What happens to the controller session between poll cycles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconnectPolicy {
    /// Open a fresh session every cycle and close it afterwards
    #[default]
    CloseAfterCycle,

    /// Keep the session open, only dropping it after a transport failure
    Persistent,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelConfig {
    pub name: String,
    pub display: Option<String>,
    #[serde(default = "default_unit")]
    pub unit: String,

    /// Offset of the first of the two holding registers
    pub address: u16,

    /// Overrides the controller's unit identifier for this channel
    pub unit_id: Option<u8>,

    pub alert: Option<AlertConfig>,
}

impl ChannelConfig {
    pub fn display_name(&self) -> &str {
        self.display.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlertConfig {
    /// Alarm when the rolling average falls below this value
    pub trip: f64,

    /// Clear when the rolling average rises to or above this value
    pub reset: f64,

    #[serde(default = "default_true")]
    pub notify_recovery: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Daily report times, UTC
    #[serde(default, deserialize_with = "deserialize_times")]
    pub times: Vec<NaiveTime>,

    #[serde(default = "default_report_title")]
    pub title: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            times: Vec::new(),
            title: default_report_title(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifierConfig {
    Discord(Discord),
    Webhook(Webhook),
    Telegram(Telegram),
    Log,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Webhook {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Discord {
    pub url: String,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Telegram {
    /// Bot token, may be supplied through `MONITOR_TELEGRAM_TOKEN` instead
    pub token: Option<String>,
    pub chat_id: String,
    #[serde(default = "default_telegram_api")]
    pub api_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettings {
    #[serde(default = "default_api_bind")]
    pub bind: SocketAddr,
    pub token: Option<String>,
    #[serde(default = "default_true")]
    pub enable_cors: bool,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            bind: default_api_bind(),
            token: None,
            enable_cors: true,
        }
    }
}

fn default_interval() -> u64 {
    10
}

fn default_window() -> usize {
    360
}

fn default_modbus_port() -> u16 {
    502
}

fn default_unit_id() -> u8 {
    1
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_request_timeout() -> u64 {
    3
}

fn default_unit() -> String {
    "°C".to_string()
}

fn default_true() -> bool {
    true
}

fn default_report_title() -> String {
    "Heating report".to_string()
}

fn default_telegram_api() -> String {
    "https://api.telegram.org".to_string()
}

fn default_api_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn deserialize_times<'de, D>(deserializer: D) -> Result<Vec<NaiveTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<String>::deserialize(deserializer)?;
    raw.iter()
        .map(|time| parse_time(time).map_err(serde::de::Error::custom))
        .collect()
}

/// Parse a wall-clock time given as `HH:MM` or `HH:MM:SS`
pub fn parse_time(time: &str) -> anyhow::Result<NaiveTime> {
    NaiveTime::parse_from_str(time, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
        .with_context(|| format!("invalid report time '{time}' (expected HH:MM)"))
}

impl Config {
    /// Reject configurations the poll loop cannot honour
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.interval == 0 {
            bail!("poll interval must be at least one second");
        }

        if self.window == 0 {
            bail!("window capacity must be at least one sample");
        }

        if self.controller.connect_timeout == 0 || self.controller.request_timeout == 0 {
            bail!("controller timeouts must be at least one second");
        }

        if self.channels.is_empty() {
            bail!("at least one channel must be configured");
        }

        let mut names = HashSet::new();
        for channel in &self.channels {
            if !names.insert(channel.name.as_str()) {
                bail!("duplicate channel name '{}'", channel.name);
            }

            if let Some(alert) = &channel.alert
                && alert.reset <= alert.trip
            {
                bail!(
                    "channel '{}': reset threshold ({}) must be greater than trip threshold ({})",
                    channel.name,
                    alert.reset,
                    alert.trip
                );
            }
        }

        Ok(())
    }

    /// Fill in secrets and overrides taken from the environment
    pub fn apply_env_overrides(&mut self) {
        if let Some(NotifierConfig::Telegram(telegram)) = &mut self.notifier
            && let Some(token) = util::get_telegram_token()
        {
            telegram.token = Some(token);
        }

        if let Some(token) = util::get_api_token() {
            self.api.get_or_insert_with(ApiSettings::default).token = Some(token);
        }

        if let Some(bind) = util::get_api_addr() {
            self.api.get_or_insert_with(ApiSettings::default).bind = bind;
        }
    }
}

/// Default config location used when no file is given on the command line
pub fn default_config_path() -> Option<PathBuf> {
    let path = dirs::config_dir()?.join("heating-monitor/config.toml");
    path.exists().then_some(path)
}

pub fn read_config_file(path: &Path) -> anyhow::Result<Config> {
    let file_content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let config: Config = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&file_content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?,
        _ => serde_json::from_str(&file_content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?,
    };

    trace!("loaded config: {config:?}");
    Ok(config)
}

/// Load, override from the environment and validate
pub fn load(path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => default_config_path()
            .context("no config file given and none found in the default location")?,
    };

    let mut config = read_config_file(&path)?;
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}
