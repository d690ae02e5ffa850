// SPDX-FileCopyrightText: 2026 Chanbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Logging decorator for [`ChannelStore`].
//!
//! Records the operation, its key, the outcome, and the elapsed time. Values
//! and errors pass through untouched.

use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, warn};

use chanbridge_core::{Channel, ChannelStore, ChanbridgeError};

/// Wraps a store and logs every call.
pub struct LoggingStore<S> {
    inner: S,
}

impl<S: ChannelStore> LoggingStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

fn log_failure(op: &'static str, id: Option<i64>, start: Instant, err: &ChanbridgeError) {
    warn!(op, id, elapsed_ms = elapsed_ms(start), error = %err, "channel store call failed");
}

#[async_trait]
impl<S: ChannelStore> ChannelStore for LoggingStore<S> {
    async fn get(&self, id: i64) -> Result<Option<Channel>, ChanbridgeError> {
        let start = Instant::now();
        let result = self.inner.get(id).await;
        match &result {
            Ok(found) => debug!(
                op = "get",
                id,
                found = found.is_some(),
                elapsed_ms = elapsed_ms(start),
                "channel store get"
            ),
            Err(e) => log_failure("get", Some(id), start, e),
        }
        result
    }

    async fn put(&self, channel: &Channel) -> Result<(), ChanbridgeError> {
        let start = Instant::now();
        let result = self.inner.put(channel).await;
        match &result {
            Ok(()) => debug!(
                op = "put",
                id = channel.id,
                group_id = %channel.group_id,
                elapsed_ms = elapsed_ms(start),
                "channel store put"
            ),
            Err(e) => log_failure("put", Some(channel.id), start, e),
        }
        result
    }

    async fn delete(&self, id: i64) -> Result<(), ChanbridgeError> {
        let start = Instant::now();
        let result = self.inner.delete(id).await;
        match &result {
            Ok(()) => debug!(op = "delete", id, elapsed_ms = elapsed_ms(start), "channel store delete"),
            Err(e) => log_failure("delete", Some(id), start, e),
        }
        result
    }

    async fn list(&self) -> Result<Vec<Channel>, ChanbridgeError> {
        let start = Instant::now();
        let result = self.inner.list().await;
        match &result {
            Ok(channels) => debug!(
                op = "list",
                count = channels.len(),
                elapsed_ms = elapsed_ms(start),
                "channel store list"
            ),
            Err(e) => log_failure("list", None, start, e),
        }
        result
    }

    async fn close(&self) -> Result<(), ChanbridgeError> {
        let start = Instant::now();
        let result = self.inner.close().await;
        match &result {
            Ok(()) => debug!(op = "close", elapsed_ms = elapsed_ms(start), "channel store close"),
            Err(e) => log_failure("close", None, start, e),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chanbridge_test_utils::MemoryStore;
    use std::sync::Arc;
    use tracing_test::traced_test;

    #[tokio::test]
    #[traced_test]
    async fn logs_successful_calls() {
        let inner = Arc::new(MemoryStore::new());
        inner.insert(Channel::new(11, "g"));
        let store = LoggingStore::new(Arc::clone(&inner));

        let found = store.get(11).await.unwrap();
        assert_eq!(found, Some(Channel::new(11, "g")));
        store.list().await.unwrap();

        assert!(logs_contain("channel store get"));
        assert!(logs_contain("channel store list"));
    }

    #[tokio::test]
    #[traced_test]
    async fn passes_errors_through_and_warns() {
        let inner = Arc::new(MemoryStore::new());
        inner.fail_next(1);
        let store = LoggingStore::new(Arc::clone(&inner));

        let err = store.delete(3).await.unwrap_err();
        assert!(matches!(err, ChanbridgeError::Storage { .. }));
        assert!(logs_contain("channel store call failed"));
        assert_eq!(inner.delete_calls(), 1);
    }
}
