use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::error::RealtimeError;

/// Prefix for environment overrides, e.g. `MEETING_REALTIME__REALTIME__ORIGIN`
const ENV_PREFIX: &str = "MEETING_REALTIME";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub realtime: RealtimeConfig,
    #[serde(default)]
    pub audio: AudioConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "meeting-realtime".to_string(),
        }
    }
}

/// Connection manager settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RealtimeConfig {
    /// Origin of the meeting web app; the socket endpoint is derived from it
    pub origin: String,

    /// Automatic reconnects allowed before giving up
    pub max_reconnect_attempts: u32,

    /// First reconnect delay, doubled on every further attempt
    pub reconnect_base_delay_ms: u64,

    pub heartbeat_interval_ms: u64,

    /// Cap on messages held while disconnected (oldest evicted first).
    /// Unbounded when unset.
    pub outbound_queue_limit: Option<usize>,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:8000".to_string(),
            max_reconnect_attempts: 5,
            reconnect_base_delay_ms: 1000,
            heartbeat_interval_ms: 30_000,
            outbound_queue_limit: None,
        }
    }
}

impl RealtimeConfig {
    pub fn origin_url(&self) -> crate::error::Result<Url> {
        Url::parse(&self.origin)
            .map_err(|e| RealtimeError::InvalidOrigin(format!("{}: {}", self.origin, e)))
    }

    pub fn reconnect_base_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_base_delay_ms)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }
}

/// Audio streaming settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Duration of each audio frame sent over the socket
    pub frame_duration_ms: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            frame_duration_ms: 100,
        }
    }
}

impl Config {
    /// Load from `path` (any format the `config` crate understands, extension
    /// optional) with environment overrides on top. A missing file falls back
    /// to defaults.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .with_context(|| format!("Failed to read config {}", path))?;

        let cfg: Config = settings
            .try_deserialize()
            .context("Invalid configuration")?;

        cfg.validate()?;

        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        self.realtime.origin_url()?;

        anyhow::ensure!(
            self.realtime.heartbeat_interval_ms > 0,
            "realtime.heartbeat_interval_ms must be positive"
        );
        anyhow::ensure!(
            self.audio.frame_duration_ms > 0,
            "audio.frame_duration_ms must be positive"
        );

        Ok(())
    }
}
