//! Configuration types for zone-reconcile.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::lock::{ZoneLock, ZoneMutex, ZoneRwLock};
use crate::retry::RetryPolicy;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Zone store configuration.
    #[serde(default)]
    pub store: StoreConfig,

    /// Conflict retry configuration.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Telemetry configuration.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl Config {
    /// Load from an optional TOML file, overridden by `ZONE_RECONCILE__*`
    /// environment variables (e.g. `ZONE_RECONCILE__STORE__PATH`).
    pub fn load(path: &Path) -> Result<Self> {
        ::config::Config::builder()
            .add_source(::config::File::from(path).required(false))
            .add_source(
                ::config::Environment::with_prefix("ZONE_RECONCILE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| Error::Config(e.to_string()))
    }
}

/// File-backed zone store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding one `<zone>.json` file per zone.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// Caller-side lock around updates.
    #[serde(default)]
    pub lock: LockMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            lock: LockMode::default(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("zones")
}

/// Which caller-side lock to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LockMode {
    /// No caller lock; rely on the store's conflict detection.
    None,
    /// Exclusive lock for reads and writes.
    Exclusive,
    /// Exclusive for writes, shared for reads and verification.
    #[default]
    ReadWrite,
}

impl LockMode {
    /// Build a fresh in-process lock for this mode.
    pub fn build(self) -> Option<ZoneLock> {
        match self {
            LockMode::None => None,
            LockMode::Exclusive => Some(ZoneLock::exclusive(ZoneMutex::new())),
            LockMode::ReadWrite => Some(ZoneLock::read_write(ZoneRwLock::new())),
        }
    }
}

/// Conflict retry configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum attempts per operation; unset retries until cancelled.
    #[serde(default)]
    pub max_attempts: Option<NonZeroU32>,

    /// Pause between attempts in milliseconds.
    #[serde(default)]
    pub delay_ms: u64,
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        RetryPolicy {
            max_attempts: config.max_attempts,
            delay: Duration::from_millis(config.delay_ms),
        }
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level filter (e.g., "info", "debug", "zone_reconcile=debug,warn").
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Prometheus metrics exporter address.
    #[serde(default)]
    pub prometheus_addr: Option<SocketAddr>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            prometheus_addr: None,
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}
