// SPDX-FileCopyrightText: 2026 Chanbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./chanbridge.toml` > `~/.config/chanbridge/chanbridge.toml`
//! > `/etc/chanbridge/chanbridge.toml` with environment variable overrides via
//! the `CHANBRIDGE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ConnectorConfig;

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/chanbridge/chanbridge.toml";

/// Configuration file in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "chanbridge.toml";

/// Sections recognised by the environment provider, in mapping order.
const ENV_SECTIONS: &[&str] = &[
    "replica",
    "telegram",
    "storage",
    "cache",
    "reconcile",
    "backoff",
    "writer",
    "api",
    "metrics",
    "log",
];

/// Returns the user's XDG config file path, if a config dir exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("chanbridge").join(LOCAL_CONFIG_FILE))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/chanbridge/chanbridge.toml`
/// 3. `~/.config/chanbridge/chanbridge.toml`
/// 4. `./chanbridge.toml`
/// 5. `CHANBRIDGE_*` environment variables
pub fn load_config() -> Result<ConnectorConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from an explicit file, still honouring env overrides.
pub fn load_config_from_path(path: &Path) -> Result<ConnectorConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ConnectorConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<ConnectorConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ConnectorConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Build the Figment used for hierarchy loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    let mut figment = Figment::new()
        .merge(Serialized::defaults(ConnectorConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH));
    if let Some(user) = user_config_path() {
        figment = figment.merge(Toml::file(user));
    }
    figment
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Maps `CHANBRIDGE_<SECTION>_<KEY>` to `<section>.<key>`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `CHANBRIDGE_TELEGRAM_BOT_TOKENS` maps to `telegram.bot_tokens`.
fn env_provider() -> Env {
    Env::prefixed("CHANBRIDGE_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key
}
