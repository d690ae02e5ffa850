// SPDX-FileCopyrightText: 2026 Chanbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric names and recording helpers.
//!
//! Recording goes through the `metrics` facade and is a no-op until an
//! exporter installs a recorder.

use metrics::{describe_counter, describe_gauge};

pub const UPDATES_FORWARDED: &str = "chanbridge_updates_forwarded_total";
pub const UPDATES_DROPPED: &str = "chanbridge_updates_dropped_total";
pub const JOINS: &str = "chanbridge_joins_total";
pub const LEAVES: &str = "chanbridge_leaves_total";
pub const RECONCILE_RESTARTS: &str = "chanbridge_reconcile_restarts_total";
pub const JOINED_CHANNELS: &str = "chanbridge_joined_channels";

/// Why an update was not forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The channel is not in the registry.
    Unjoined,
    /// The writer returned an error.
    SendFailed,
    /// The writer did not finish within the send timeout.
    Timeout,
}

impl DropReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unjoined => "unjoined",
            Self::SendFailed => "send_failed",
            Self::Timeout => "timeout",
        }
    }
}

/// Registers descriptions for every connector metric.
pub fn describe() {
    describe_counter!(UPDATES_FORWARDED, "Updates written to the event bus");
    describe_counter!(UPDATES_DROPPED, "Updates dropped before or during forwarding");
    describe_counter!(JOINS, "Channel join attempts by outcome");
    describe_counter!(LEAVES, "Channel leave attempts by outcome");
    describe_counter!(RECONCILE_RESTARTS, "Reconciliation loop restarts after a fatal pass error");
    describe_gauge!(JOINED_CHANNELS, "Channels currently in the joined registry");
}

pub fn record_forwarded() {
    metrics::counter!(UPDATES_FORWARDED).increment(1);
}

pub fn record_dropped(reason: DropReason) {
    metrics::counter!(UPDATES_DROPPED, "reason" => reason.as_str()).increment(1);
}

pub fn record_join(ok: bool) {
    metrics::counter!(JOINS, "outcome" => outcome(ok)).increment(1);
}

pub fn record_leave(ok: bool) {
    metrics::counter!(LEAVES, "outcome" => outcome(ok)).increment(1);
}

pub fn record_restart() {
    metrics::counter!(RECONCILE_RESTARTS).increment(1);
}

pub fn set_joined(count: usize) {
    metrics::gauge!(JOINED_CHANNELS).set(count as f64);
}

fn outcome(ok: bool) -> &'static str {
    if ok { "ok" } else { "error" }
}
