// SPDX-FileCopyrightText: 2026 Chanbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel storage for the chanbridge connector.
//!
//! The durable store is SQLite with embedded migrations, driven through
//! `tokio-rusqlite`'s single background thread. The process never talks to
//! it directly: every caller goes through the fixed decorator pipeline
//!
//! ```text
//! LoggingStore(CachedStore(SqliteChannelStore))
//! ```
//!
//! built by [`layered`]. Each layer implements [`ChannelStore`], so the
//! pipeline is opaque to its callers.

pub mod cached;
pub mod database;
pub mod logging;
pub mod migrations;
pub mod queries;
pub mod sqlite;

use std::sync::Arc;

use chanbridge_config::model::{CacheConfig, StorageConfig};
use chanbridge_core::{ChannelStore, ChanbridgeError, HealthStatus, PluginAdapter};
use tracing::{debug, warn};

pub use cached::CachedStore;
pub use database::Database;
pub use logging::LoggingStore;
pub use sqlite::SqliteChannelStore;

/// The decorated store type produced by [`layered`].
pub type LayeredStore<S> = LoggingStore<CachedStore<S>>;

/// Wraps a durable store in the cache and logging decorators.
pub fn layered<S: ChannelStore>(inner: S, cache: &CacheConfig) -> LayeredStore<S> {
    LoggingStore::new(CachedStore::from_config(inner, cache))
}

/// Opens the SQLite store, checks that it answers queries, and returns it
/// fully layered.
pub async fn open_layered(
    storage: &StorageConfig,
    cache: &CacheConfig,
) -> Result<Arc<LayeredStore<SqliteChannelStore>>, ChanbridgeError> {
    let sqlite = SqliteChannelStore::open(storage).await?;
    match sqlite.health_check().await? {
        HealthStatus::Healthy => debug!(path = %storage.database_path, "sqlite store healthy"),
        HealthStatus::Unhealthy(reason) => {
            return Err(ChanbridgeError::storage(format!(
                "sqlite store at {} is unhealthy: {reason}",
                storage.database_path
            )));
        }
    }
    Ok(Arc::new(layered(sqlite, cache)))
}

/// Closes the wrapped store exactly once.
///
/// Call [`StoreGuard::close`] on the normal exit path. If the guard is dropped
/// instead (early return, error exit) the close runs on a spawned task when a
/// runtime is still available.
pub struct StoreGuard {
    store: Option<Arc<dyn ChannelStore>>,
}

impl StoreGuard {
    pub fn new(store: Arc<dyn ChannelStore>) -> Self {
        Self { store: Some(store) }
    }

    /// Closes the store and consumes the guard.
    pub async fn close(mut self) -> Result<(), ChanbridgeError> {
        match self.store.take() {
            Some(store) => store.close().await,
            None => Ok(()),
        }
    }
}

impl Drop for StoreGuard {
    fn drop(&mut self) {
        let Some(store) = self.store.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = store.close().await {
                        warn!(error = %e, "closing channel store on drop failed");
                    }
                });
                debug!("channel store close scheduled from guard drop");
            }
            Err(_) => warn!("channel store dropped without close and no runtime is available"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chanbridge_core::Channel;
    use chanbridge_test_utils::MemoryStore;

    #[tokio::test]
    async fn layered_pipeline_reads_through_once() {
        let inner = Arc::new(MemoryStore::new());
        inner.insert(Channel::new(1, "g"));
        let store = layered(Arc::clone(&inner), &CacheConfig::default());

        store.get(1).await.unwrap();
        store.get(1).await.unwrap();
        assert_eq!(inner.get_calls(), 1);
        assert!(store.inner().is_cached(1));
    }

    #[tokio::test]
    async fn open_layered_uses_sqlite_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageConfig {
            database_path: dir.path().join("c.db").to_string_lossy().into_owned(),
            wal_mode: true,
        };
        let store = open_layered(&storage, &CacheConfig::default()).await.unwrap();
        store.put(&Channel::new(-7, "g")).await.unwrap();
        assert_eq!(store.list().await.unwrap().len(), 1);
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn guard_close_closes_once() {
        let inner = Arc::new(MemoryStore::new());
        let guard = StoreGuard::new(inner.clone());
        guard.close().await.unwrap();
        assert!(inner.is_closed());
        assert_eq!(inner.close_calls(), 1);
    }

    #[tokio::test]
    async fn dropped_guard_closes_in_background() {
        let inner = Arc::new(MemoryStore::new());
        drop(StoreGuard::new(inner.clone()));
        for _ in 0..10 {
            if inner.is_closed() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(inner.is_closed());
    }
}
