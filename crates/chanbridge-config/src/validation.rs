// SPDX-FileCopyrightText: 2026 Chanbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints serde cannot express: replica identity and its
//! bot token, positive durations and capacities, backoff bounds, and endpoint
//! syntax.

use crate::diagnostic::ConfigError;
use crate::model::ConnectorConfig;
use crate::replica::ReplicaIdentity;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &ConnectorConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    match ReplicaIdentity::resolve(&config.replica) {
        Ok(identity) => {
            if let Err(e) = identity.bot_token(&config.telegram) {
                errors.push(ConfigError::validation(e.to_string()));
            }
        }
        Err(e) => errors.push(ConfigError::validation(e.to_string())),
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }

    if config.cache.capacity == 0 {
        errors.push(ConfigError::validation("cache.capacity must be at least 1"));
    }
    if config.cache.ttl_secs == 0 {
        errors.push(ConfigError::validation("cache.ttl_secs must be at least 1"));
    }

    if config.reconcile.interval_secs == 0 {
        errors.push(ConfigError::validation(
            "reconcile.interval_secs must be at least 1",
        ));
    }
    if config.reconcile.call_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "reconcile.call_timeout_secs must be at least 1",
        ));
    }

    let backoff = &config.backoff;
    if backoff.initial_interval_ms == 0 {
        errors.push(ConfigError::validation(
            "backoff.initial_interval_ms must be at least 1",
        ));
    }
    if !backoff.multiplier.is_finite() || backoff.multiplier < 1.0 {
        errors.push(ConfigError::validation(format!(
            "backoff.multiplier must be >= 1.0, got {}",
            backoff.multiplier
        )));
    }
    if !(0.0..=1.0).contains(&backoff.randomization_factor) {
        errors.push(ConfigError::validation(format!(
            "backoff.randomization_factor must be within [0, 1], got {}",
            backoff.randomization_factor
        )));
    }
    if backoff.max_interval_secs.saturating_mul(1000) < backoff.initial_interval_ms {
        errors.push(ConfigError::validation(
            "backoff.max_interval_secs must not be below backoff.initial_interval_ms",
        ));
    }

    let uri = config.writer.uri.trim();
    if !(uri.starts_with("http://") || uri.starts_with("https://")) {
        errors.push(ConfigError::validation(format!(
            "writer.uri `{uri}` must be an http:// or https:// URL"
        )));
    }
    if config.writer.send_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "writer.send_timeout_secs must be at least 1",
        ));
    }

    let host = config.api.host.trim();
    let host_ok = !host.is_empty()
        && (host.parse::<std::net::IpAddr>().is_ok()
            || host
                .chars()
                .all(|c| c.is_alphanumeric() || c == '.' || c == '-'));
    if !host_ok {
        errors.push(ConfigError::validation(format!(
            "api.host `{host}` is not a valid IP address or hostname"
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
