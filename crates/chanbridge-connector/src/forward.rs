// SPDX-FileCopyrightText: 2026 Chanbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message forwarding pipeline.
//!
//! A single listener drains the backend's update stream. Updates for
//! channels outside the registry are dropped. The rest are converted and
//! handed to the event writer under a deadline. A failed or timed-out send
//! drops the update (at-most-once) so the stream keeps moving.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use chanbridge_core::{ChanbridgeError, ChatBackend, EventWriter, UpdateEvent};

use crate::event::to_outbound_event;
use crate::metrics::{self, DropReason};
use crate::registry::Registry;

/// What happened to a single update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Forwarded,
    Dropped(DropReason),
}

/// Running totals for one listener lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForwardStats {
    pub forwarded: u64,
    pub dropped: u64,
}

impl ForwardStats {
    fn record(&mut self, disposition: Disposition) {
        match disposition {
            Disposition::Forwarded => self.forwarded += 1,
            Disposition::Dropped(_) => self.dropped += 1,
        }
    }
}

/// Listener that forwards updates from joined channels to the event bus.
pub struct Forwarder {
    backend: Arc<dyn ChatBackend>,
    registry: Arc<Registry>,
    writer: Arc<dyn EventWriter>,
    send_timeout: Duration,
}

impl Forwarder {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        registry: Arc<Registry>,
        writer: Arc<dyn EventWriter>,
        send_timeout: Duration,
    ) -> Self {
        Self {
            backend,
            registry,
            writer,
            send_timeout,
        }
    }

    /// Consumes updates until cancelled or the stream ends.
    ///
    /// Returns the totals on cancellation. A closed stream is reported as
    /// [`ChanbridgeError::Closed`] since no further updates can arrive.
    /// Other stream errors are logged and the listener keeps reading.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<ForwardStats, ChanbridgeError> {
        let mut stats = ForwardStats::default();
        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => {
                    info!(forwarded = stats.forwarded, dropped = stats.dropped, "forwarder stopped");
                    return Ok(stats);
                }
                next = self.backend.next_update() => next,
            };

            match next {
                Ok(update) => {
                    let disposition = self.handle(update).await;
                    stats.record(disposition);
                }
                Err(e) if e.is_closed() => {
                    warn!(forwarded = stats.forwarded, dropped = stats.dropped, "update stream closed");
                    return Err(e);
                }
                Err(e) => warn!(error = %e, "failed to receive update"),
            }
        }
    }

    /// Forwards one update if its channel is joined.
    pub async fn handle(&self, update: UpdateEvent) -> Disposition {
        let Some(channel) = self.registry.get(update.channel_id) else {
            debug!(
                channel_id = update.channel_id,
                message_id = update.message_id,
                "dropping update from unjoined channel"
            );
            metrics::record_dropped(DropReason::Unjoined);
            return Disposition::Dropped(DropReason::Unjoined);
        };

        let event = to_outbound_event(&update, &channel);
        let event_id = event.id.clone();
        let reason = match tokio::time::timeout(self.send_timeout, self.writer.send(event)).await {
            Ok(Ok(())) => {
                debug!(event_id = %event_id, group_id = %channel.group_id, "forwarded update");
                metrics::record_forwarded();
                return Disposition::Forwarded;
            }
            Ok(Err(e)) => {
                warn!(event_id = %event_id, error = %e, "event send failed, dropping update");
                DropReason::SendFailed
            }
            Err(_) => {
                warn!(
                    event_id = %event_id,
                    timeout_ms = self.send_timeout.as_millis() as u64,
                    "event send timed out, dropping update"
                );
                DropReason::Timeout
            }
        };
        metrics::record_dropped(reason);
        Disposition::Dropped(reason)
    }
}
