// SPDX-FileCopyrightText: 2026 Chanbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the chanbridge connector.
//!
//! TOML configuration with strict key checking (`deny_unknown_fields`), XDG
//! file hierarchy lookup, `CHANBRIDGE_*` environment overrides, replica
//! identity resolution, and miette diagnostics with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use chanbridge_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("replica: {}", config.replica.name);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod replica;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::ConnectorConfig;
pub use replica::ReplicaIdentity;

/// Load configuration from the XDG hierarchy and validate it.
pub fn load_and_validate() -> Result<ConnectorConfig, Vec<ConfigError>> {
    finish(loader::load_config(), collect_toml_sources)
}

/// Load configuration from an explicit file (plus env overrides) and validate it.
pub fn load_and_validate_path(path: &Path) -> Result<ConnectorConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_path(path), || {
        std::fs::read_to_string(path)
            .map(|content| vec![(path.display().to_string(), content)])
            .unwrap_or_default()
    })
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<ConnectorConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

fn finish(
    loaded: Result<ConnectorConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<ConnectorConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources())),
    }
}

/// Collect TOML source file contents for error span resolution.
fn collect_toml_sources() -> Vec<(String, String)> {
    let mut candidates = vec![std::path::PathBuf::from(loader::LOCAL_CONFIG_FILE)];
    candidates.extend(loader::user_config_path());
    candidates.push(std::path::PathBuf::from(loader::SYSTEM_CONFIG_PATH));

    candidates
        .into_iter()
        .filter_map(|path| {
            let content = std::fs::read_to_string(&path).ok()?;
            let shown = std::fs::canonicalize(&path).unwrap_or(path);
            Some((shown.display().to_string(), content))
        })
        .collect()
}
