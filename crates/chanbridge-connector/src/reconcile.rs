// SPDX-FileCopyrightText: 2026 Chanbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reconciliation of desired channel membership against the registry.
//!
//! One pass reads the desired set from the store, keeps the channels this
//! replica's shard owns, diffs them against the registry with [`plan`], and
//! issues only the joins and leaves in that diff. Single-channel failures are
//! logged and retried on the next pass. Only a failure to read the desired
//! set aborts a pass; [`Reconciler::run_supervised`] restarts the loop after
//! such failures with exponential backoff.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use chanbridge_config::model::ReconcileConfig;
use chanbridge_core::{Channel, ChannelStore, ChanbridgeError, ChatBackend};
use chanbridge_resilience::{BackoffPolicy, retry_notify};

use crate::metrics;
use crate::registry::Registry;
use crate::shard::Shard;

/// The actions one pass must take to converge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    /// Desired channels not yet joined, sorted by id.
    pub to_join: Vec<Channel>,
    /// Joined channel ids no longer desired, sorted.
    pub to_leave: Vec<i64>,
    /// Joined channels whose stored record changed (routing key or name).
    /// Applied to the registry without a backend call.
    pub to_refresh: Vec<Channel>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.to_join.is_empty() && self.to_leave.is_empty() && self.to_refresh.is_empty()
    }
}

/// Computes the diff between the desired channels and the joined ones.
pub fn plan(desired: &[Channel], joined: &HashMap<i64, Channel>) -> Plan {
    let mut to_join = Vec::new();
    let mut to_refresh = Vec::new();
    let mut wanted = HashSet::with_capacity(desired.len());

    for channel in desired {
        if !wanted.insert(channel.id) {
            continue;
        }
        match joined.get(&channel.id) {
            None => to_join.push(channel.clone()),
            Some(current)
                if current.group_id != channel.group_id || current.name != channel.name =>
            {
                to_refresh.push(Channel {
                    joined_at: current.joined_at,
                    ..channel.clone()
                });
            }
            Some(_) => {}
        }
    }

    let mut to_leave: Vec<i64> = joined
        .keys()
        .copied()
        .filter(|id| !wanted.contains(id))
        .collect();

    to_join.sort_by_key(|c| c.id);
    to_refresh.sort_by_key(|c| c.id);
    to_leave.sort_unstable();

    Plan {
        to_join,
        to_leave,
        to_refresh,
    }
}

/// Outcome of a single reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Number of desired channels owned by this shard.
    pub desired: usize,
    pub joined: Vec<i64>,
    pub left: Vec<i64>,
    pub refreshed: Vec<i64>,
    /// Channels whose join or leave failed and will be retried.
    pub failed: Vec<i64>,
}

impl PassReport {
    pub fn made_changes(&self) -> bool {
        !(self.joined.is_empty() && self.left.is_empty() && self.refreshed.is_empty())
    }
}

/// Wakes the reconciliation loop ahead of its next scheduled tick.
#[derive(Debug, Clone, Default)]
pub struct ReconcileTrigger {
    notify: Arc<Notify>,
}

impl ReconcileTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests an early pass. Requests made while a pass runs coalesce into one.
    pub fn fire(&self) {
        self.notify.notify_one();
    }

    pub async fn fired(&self) {
        self.notify.notified().await;
    }
}

/// Drives the registry towards the store's desired membership.
pub struct Reconciler {
    store: Arc<dyn ChannelStore>,
    backend: Arc<dyn ChatBackend>,
    registry: Arc<Registry>,
    shard: Shard,
    interval: Duration,
    call_timeout: Duration,
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn ChannelStore>,
        backend: Arc<dyn ChatBackend>,
        registry: Arc<Registry>,
        shard: Shard,
        config: &ReconcileConfig,
    ) -> Self {
        Self {
            store,
            backend,
            registry,
            shard,
            interval: config.interval(),
            call_timeout: config.call_timeout(),
        }
    }

    pub fn shard(&self) -> Shard {
        self.shard
    }

    /// Reads the desired channels owned by this shard, sorted by id.
    pub async fn desired(&self) -> Result<Vec<Channel>, ChanbridgeError> {
        let mut desired: Vec<Channel> = self
            .store
            .list()
            .await?
            .into_iter()
            .filter(|c| self.shard.owns(c.id))
            .collect();
        desired.sort_by_key(|c| c.id);
        Ok(desired)
    }

    /// Runs one reconciliation pass.
    ///
    /// Fails only when the desired set cannot be read.
    pub async fn reconcile_once(&self) -> Result<PassReport, ChanbridgeError> {
        let desired = self.desired().await?;
        let plan = plan(&desired, &self.registry.snapshot());
        let mut report = PassReport {
            desired: desired.len(),
            ..PassReport::default()
        };

        for channel in plan.to_refresh {
            debug!(channel_id = channel.id, group_id = %channel.group_id, "refreshing joined channel record");
            report.refreshed.push(channel.id);
            self.registry.add(channel);
        }

        for channel in plan.to_join {
            match self.join(&channel).await {
                Ok(()) => report.joined.push(channel.id),
                Err(e) => {
                    warn!(channel_id = channel.id, error = %e, "join failed, will retry next pass");
                    report.failed.push(channel.id);
                }
            }
        }

        for channel_id in plan.to_leave {
            match self.leave(channel_id).await {
                Ok(()) => report.left.push(channel_id),
                Err(e) => {
                    warn!(channel_id, error = %e, "leave failed, will retry next pass");
                    report.failed.push(channel_id);
                }
            }
        }

        metrics::set_joined(self.registry.len());
        if report.made_changes() || !report.failed.is_empty() {
            info!(
                shard = %self.shard,
                desired = report.desired,
                joined = ?report.joined,
                left = ?report.left,
                refreshed = report.refreshed.len(),
                failed = ?report.failed,
                "reconciliation pass complete"
            );
        } else {
            debug!(shard = %self.shard, desired = report.desired, "reconciliation pass found no drift");
        }
        Ok(report)
    }

    async fn join(&self, channel: &Channel) -> Result<(), ChanbridgeError> {
        let result = bounded(self.call_timeout, self.backend.join(channel)).await;
        metrics::record_join(result.is_ok());
        result?;

        let now = Utc::now();
        let joined = Channel {
            joined_at: Some(now),
            last_seen: Some(now),
            ..channel.clone()
        };
        self.registry.add(joined.clone());
        info!(channel_id = channel.id, group_id = %channel.group_id, "joined channel");
        self.persist_join(joined).await;
        Ok(())
    }

    /// Records the join timestamps in the store. Best-effort: the registry is
    /// already updated and a failure here does not undo the join.
    ///
    /// Only the timestamps are written onto the record read back from the
    /// store, so edits made while the join was in flight survive. Such edits
    /// are also applied to the registry entry.
    async fn persist_join(&self, joined: Channel) {
        // Skip records deleted while the join was in flight so they are not resurrected.
        let current = match self.store.get(joined.id).await {
            Ok(Some(current)) => current,
            Ok(None) => {
                debug!(channel_id = joined.id, "channel removed from store during join");
                return;
            }
            Err(e) => {
                warn!(channel_id = joined.id, error = %e, "failed to read channel after join");
                return;
            }
        };

        let stamped = Channel {
            joined_at: joined.joined_at,
            last_seen: joined.last_seen,
            ..current
        };
        if stamped.group_id != joined.group_id || stamped.name != joined.name {
            debug!(channel_id = stamped.id, group_id = %stamped.group_id, "channel record changed during join");
            self.registry.add(stamped.clone());
        }
        if let Err(e) = self.store.put(&stamped).await {
            warn!(channel_id = stamped.id, error = %e, "failed to persist join timestamp");
        }
    }

    async fn leave(&self, channel_id: i64) -> Result<(), ChanbridgeError> {
        let result = bounded(self.call_timeout, self.backend.leave(channel_id)).await;
        metrics::record_leave(result.is_ok());
        result?;
        self.registry.remove(channel_id);
        info!(channel_id, "left channel");
        Ok(())
    }

    /// Runs passes on every interval tick or trigger until cancelled.
    ///
    /// The first pass runs immediately. Returns `Ok(())` on cancellation and
    /// the error of the first pass that could not read the desired set.
    pub async fn run(
        &self,
        cancel: &CancellationToken,
        trigger: &ReconcileTrigger,
    ) -> Result<(), ChanbridgeError> {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                _ = ticker.tick() => {}
                _ = trigger.fired() => debug!("early reconciliation requested"),
            }
            self.reconcile_once().await?;
        }
    }

    /// Runs [`Reconciler::run`] forever, restarting it with backoff after
    /// fatal pass errors. Returns once `cancel` fires.
    pub async fn run_supervised<P: BackoffPolicy>(
        &self,
        policy: &mut P,
        cancel: &CancellationToken,
        trigger: &ReconcileTrigger,
    ) {
        retry_notify(
            policy,
            move || self.run(cancel, trigger),
            |err, delay| {
                metrics::record_restart();
                warn!(
                    error = %err,
                    delay_ms = delay.as_millis() as u64,
                    "reconciliation loop failed, restarting after backoff"
                );
            },
            cancel,
        )
        .await;
        info!("reconciliation loop stopped");
    }
}

async fn bounded<F>(deadline: Duration, call: F) -> Result<(), ChanbridgeError>
where
    F: std::future::Future<Output = Result<(), ChanbridgeError>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(ChanbridgeError::Timeout { duration: deadline }),
    }
}
