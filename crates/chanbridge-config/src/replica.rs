// SPDX-FileCopyrightText: 2026 Chanbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Replica identity resolution.
//!
//! A deployment runs `count` replicas named like StatefulSet pods
//! (`chanbridge-0`, `chanbridge-1`, ...). Each replica owns the channels whose
//! id falls into its shard.

use chanbridge_core::ChanbridgeError;

use crate::model::{ReplicaConfig, TelegramConfig};

/// Index and count of this replica within the deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplicaIdentity {
    pub index: u32,
    pub count: u32,
}

impl ReplicaIdentity {
    /// Parses the replica index from the trailing `-<n>` suffix of the name.
    ///
    /// Fails when the name has no suffix, the suffix is not an unsigned
    /// integer, or the index does not fit within `count`.
    pub fn resolve(config: &ReplicaConfig) -> Result<Self, ChanbridgeError> {
        let (_, suffix) = config.name.rsplit_once('-').ok_or_else(|| {
            ChanbridgeError::Config(format!(
                "unable to parse the replica name: {}",
                config.name
            ))
        })?;

        let index: u32 = suffix.parse().map_err(|e| {
            ChanbridgeError::Config(format!(
                "invalid replica index `{suffix}` in {}: {e}",
                config.name
            ))
        })?;

        if config.count == 0 {
            return Err(ChanbridgeError::Config(
                "replica.count must be at least 1".into(),
            ));
        }
        if index >= config.count {
            return Err(ChanbridgeError::Config(format!(
                "replica index {index} is out of range for replica.count = {}",
                config.count
            )));
        }

        Ok(Self {
            index,
            count: config.count,
        })
    }

    /// Returns the bot token assigned to this replica.
    pub fn bot_token<'a>(&self, telegram: &'a TelegramConfig) -> Result<&'a str, ChanbridgeError> {
        telegram.token_for(self.index).ok_or_else(|| {
            ChanbridgeError::Config(format!(
                "not enough telegram bot tokens for replica {} ({} configured), \
                 decrease the replica count or fix the config",
                self.index,
                telegram.bot_tokens.len()
            ))
        })
    }
}

impl std::fmt::Display for ReplicaIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.index, self.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replica(name: &str, count: u32) -> ReplicaConfig {
        ReplicaConfig {
            name: name.to_string(),
            count,
        }
    }

    #[test]
    fn parses_statefulset_suffix() {
        let id = ReplicaIdentity::resolve(&replica("source-telegram-2", 3)).unwrap();
        assert_eq!(id, ReplicaIdentity { index: 2, count: 3 });
        assert_eq!(id.to_string(), "2/3");
    }

    #[test]
    fn rejects_name_without_suffix() {
        let err = ReplicaIdentity::resolve(&replica("chanbridge", 1)).unwrap_err();
        assert!(err.to_string().contains("unable to parse the replica name"));
    }

    #[test]
    fn rejects_non_numeric_suffix() {
        assert!(ReplicaIdentity::resolve(&replica("chanbridge-abc", 1)).is_err());
    }

    #[test]
    fn rejects_empty_suffix() {
        let err = ReplicaIdentity::resolve(&replica("chanbridge-", 1)).unwrap_err();
        assert!(err.to_string().contains("invalid replica index"));
    }

    #[test]
    fn rejects_index_outside_count() {
        let err = ReplicaIdentity::resolve(&replica("chanbridge-3", 3)).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn rejects_zero_count() {
        assert!(ReplicaIdentity::resolve(&replica("chanbridge-0", 0)).is_err());
    }

    #[test]
    fn bot_token_requires_entry_per_replica() {
        let id = ReplicaIdentity { index: 1, count: 2 };
        let telegram = TelegramConfig {
            bot_tokens: vec!["1:a".into()],
        };
        let err = id.bot_token(&telegram).unwrap_err();
        assert!(err.to_string().contains("not enough telegram bot tokens"));

        let telegram = TelegramConfig {
            bot_tokens: vec!["1:a".into(), "2:b".into()],
        };
        assert_eq!(id.bot_token(&telegram).unwrap(), "2:b");
    }
}
