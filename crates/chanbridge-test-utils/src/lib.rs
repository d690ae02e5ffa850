// SPDX-FileCopyrightText: 2026 Chanbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for chanbridge.
//!
//! Provides deterministic in-process doubles for the three collaborator
//! traits plus a harness that bundles them:
//!
//! - [`MemoryStore`]: `ChannelStore` over a map, with call counters and
//!   failure injection.
//! - [`MockBackend`]: `ChatBackend` with injectable updates, flaky joins, and
//!   join/leave logs.
//! - [`RecordingWriter`]: `EventWriter` that captures events.
//! - [`ConnectorHarness`]: all three, pre-wired.

pub mod harness;
pub mod memory_store;
pub mod mock_backend;
pub mod recording_writer;

pub use harness::{ConnectorHarness, update};
pub use memory_store::MemoryStore;
pub use mock_backend::MockBackend;
pub use recording_writer::RecordingWriter;
