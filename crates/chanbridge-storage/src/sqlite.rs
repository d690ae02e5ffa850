// SPDX-FileCopyrightText: 2026 Chanbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`ChannelStore`] trait.

use async_trait::async_trait;
use tracing::debug;

use chanbridge_config::model::StorageConfig;
use chanbridge_core::{
    AdapterType, Channel, ChannelStore, ChanbridgeError, HealthStatus, PluginAdapter,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// Durable channel store backed by a single SQLite file.
pub struct SqliteChannelStore {
    db: Database,
}

impl SqliteChannelStore {
    /// Opens the database at the configured path and applies migrations.
    pub async fn open(config: &StorageConfig) -> Result<Self, ChanbridgeError> {
        let db = Database::open(&config.database_path, config.wal_mode).await?;
        Ok(Self { db })
    }

    /// Opens a private in-memory store.
    pub async fn open_in_memory() -> Result<Self, ChanbridgeError> {
        Ok(Self {
            db: Database::open_in_memory().await?,
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteChannelStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, ChanbridgeError> {
        if self.db.is_closed() {
            return Ok(HealthStatus::Unhealthy("store closed".into()));
        }
        self.db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ChanbridgeError> {
        self.db.close().await
    }
}

#[async_trait]
impl ChannelStore for SqliteChannelStore {
    async fn get(&self, id: i64) -> Result<Option<Channel>, ChanbridgeError> {
        queries::get_channel(&self.db, id).await
    }

    async fn put(&self, channel: &Channel) -> Result<(), ChanbridgeError> {
        queries::upsert_channel(&self.db, channel).await
    }

    async fn delete(&self, id: i64) -> Result<(), ChanbridgeError> {
        queries::delete_channel(&self.db, id).await
    }

    async fn list(&self) -> Result<Vec<Channel>, ChanbridgeError> {
        queries::list_channels(&self.db).await
    }

    async fn close(&self) -> Result<(), ChanbridgeError> {
        self.db.close().await?;
        debug!("sqlite channel store closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[tokio::test]
    async fn sqlite_store_implements_plugin_adapter() {
        let store = SqliteChannelStore::open_in_memory().await.unwrap();
        assert_eq!(store.name(), "sqlite");
        assert_eq!(store.adapter_type(), AdapterType::Storage);
        assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn put_get_delete_round_trip() {
        let store = SqliteChannelStore::open_in_memory().await.unwrap();
        let mut channel = Channel::new(-1001, "news").with_name("https://t.me/news");
        channel.joined_at = Some(ts(1_700_000_000));
        channel.last_seen = Some(ts(1_700_000_100));

        store.put(&channel).await.unwrap();
        assert_eq!(store.get(-1001).await.unwrap(), Some(channel));

        store.delete(-1001).await.unwrap();
        assert_eq!(store.get(-1001).await.unwrap(), None);
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let store = SqliteChannelStore::open_in_memory().await.unwrap();
        assert_eq!(store.get(7).await.unwrap(), None);
    }

    #[tokio::test]
    async fn deleting_absent_id_is_not_an_error() {
        let store = SqliteChannelStore::open_in_memory().await.unwrap();
        store.delete(404).await.unwrap();
    }

    #[tokio::test]
    async fn list_is_ordered_by_id() {
        let store = SqliteChannelStore::open_in_memory().await.unwrap();
        for id in [30, -5, 12] {
            store.put(&Channel::new(id, "g")).await.unwrap();
        }
        let ids: Vec<i64> = store.list().await.unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![-5, 12, 30]);
    }

    #[tokio::test]
    async fn records_persist_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("channels.db");
        let config = make_config(path.to_str().unwrap());

        let store = SqliteChannelStore::open(&config).await.unwrap();
        store.put(&Channel::new(42, "persisted")).await.unwrap();
        store.close().await.unwrap();

        let reopened = SqliteChannelStore::open(&config).await.unwrap();
        let channel = reopened.get(42).await.unwrap().unwrap();
        assert_eq!(channel.group_id, "persisted");
    }

    #[tokio::test]
    async fn operations_after_close_fail_with_closed() {
        let store = SqliteChannelStore::open_in_memory().await.unwrap();
        store.close().await.unwrap();
        let err = store.list().await.unwrap_err();
        assert!(err.is_closed(), "unexpected error: {err}");
        assert!(matches!(
            store.health_check().await.unwrap(),
            HealthStatus::Unhealthy(_)
        ));
    }
}
