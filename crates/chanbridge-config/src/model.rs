// SPDX-FileCopyrightText: 2026 Chanbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the chanbridge connector.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level connector configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. Every section is optional and defaults to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectorConfig {
    /// Replica identity within a sharded deployment.
    #[serde(default)]
    pub replica: ReplicaConfig,

    /// Telegram backend credentials.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Durable channel store settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Read cache in front of the durable store.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Reconciliation loop timing.
    #[serde(default)]
    pub reconcile: ReconcileConfig,

    /// Backoff policy for restarting a failed reconciliation loop.
    #[serde(default)]
    pub backoff: BackoffConfig,

    /// Event-bus writer endpoint.
    #[serde(default)]
    pub writer: WriterConfig,

    /// Control-plane HTTP listener.
    #[serde(default)]
    pub api: ApiConfig,

    /// Prometheus metrics export.
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Log output settings.
    #[serde(default)]
    pub log: LogConfig,
}

/// Replica identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReplicaConfig {
    /// StatefulSet-style replica name. The index is the trailing `-<n>` suffix.
    #[serde(default = "default_replica_name")]
    pub name: String,

    /// Total number of replicas sharing the channel set.
    #[serde(default = "default_replica_count")]
    pub count: u32,
}

impl Default for ReplicaConfig {
    fn default() -> Self {
        Self {
            name: default_replica_name(),
            count: default_replica_count(),
        }
    }
}

fn default_replica_name() -> String {
    "chanbridge-0".to_string()
}

fn default_replica_count() -> u32 {
    1
}

/// Telegram backend configuration.
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Bot API tokens, one per replica, indexed by replica index.
    #[serde(default)]
    pub bot_tokens: Vec<String>,
}

impl TelegramConfig {
    /// Returns the token assigned to the given replica index, if configured.
    pub fn token_for(&self, index: u32) -> Option<&str> {
        self.bot_tokens
            .get(index as usize)
            .map(String::as_str)
            .filter(|t| !t.trim().is_empty())
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_tokens", &format!("[{} redacted]", self.bot_tokens.len()))
            .finish()
    }
}

/// Durable store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("chanbridge").join("channels.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("channels.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Bounded, time-expiring read cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Maximum number of cached channel records.
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,

    /// Seconds a cached record stays fresh.
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

fn default_cache_capacity() -> usize {
    1_000
}

fn default_cache_ttl_secs() -> u64 {
    60
}

/// Reconciliation loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReconcileConfig {
    /// Seconds between scheduled reconciliation passes.
    #[serde(default = "default_reconcile_interval_secs")]
    pub interval_secs: u64,

    /// Deadline for a single join or leave call against the backend.
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
}

impl ReconcileConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_reconcile_interval_secs(),
            call_timeout_secs: default_call_timeout_secs(),
        }
    }
}

fn default_reconcile_interval_secs() -> u64 {
    60
}

fn default_call_timeout_secs() -> u64 {
    30
}

/// Exponential backoff configuration for the reconciliation supervisor.
///
/// Defaults follow the common 500ms / x1.5 / 60s cap / ±50% jitter policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BackoffConfig {
    /// First retry delay in milliseconds.
    #[serde(default = "default_initial_interval_ms")]
    pub initial_interval_ms: u64,

    /// Growth factor applied after each failed attempt.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Upper bound on the un-jittered delay, in seconds.
    #[serde(default = "default_max_interval_secs")]
    pub max_interval_secs: u64,

    /// Jitter as a fraction of the delay (0.0 disables jitter).
    #[serde(default = "default_randomization_factor")]
    pub randomization_factor: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_interval_ms: default_initial_interval_ms(),
            multiplier: default_multiplier(),
            max_interval_secs: default_max_interval_secs(),
            randomization_factor: default_randomization_factor(),
        }
    }
}

fn default_initial_interval_ms() -> u64 {
    500
}

fn default_multiplier() -> f64 {
    1.5
}

fn default_max_interval_secs() -> u64 {
    60
}

fn default_randomization_factor() -> f64 {
    0.5
}

/// Event-bus writer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WriterConfig {
    /// HTTP endpoint that accepts outbound events.
    #[serde(default = "default_writer_uri")]
    pub uri: String,

    /// Deadline for a single event write.
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,

    /// Identity attached to written events. Defaults to the backend account.
    #[serde(default)]
    pub user_id: Option<String>,
}

impl WriterConfig {
    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_secs)
    }
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            uri: default_writer_uri(),
            send_timeout_secs: default_send_timeout_secs(),
            user_id: None,
        }
    }
}

fn default_writer_uri() -> String {
    "http://127.0.0.1:8080/v1/events".to_string()
}

fn default_send_timeout_secs() -> u64 {
    10
}

/// Control-plane HTTP listener configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Host address to bind.
    #[serde(default = "default_api_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_api_port")]
    pub port: u16,

    /// Bearer token required on `/v1/*`. `None` leaves the query API open.
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
            bearer_token: None,
        }
    }
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    50051
}

/// Prometheus metrics configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Install the Prometheus recorder and serve `/metrics`.
    #[serde(default)]
    pub enabled: bool,
}

/// Log output configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
