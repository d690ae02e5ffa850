// SPDX-FileCopyrightText: 2026 Chanbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The chanbridge channel subscription and forwarding pipeline.
//!
//! - [`Registry`]: which channels this replica has joined.
//! - [`Reconciler`]: converges the registry with the store's desired set,
//!   scoped to this replica's [`Shard`].
//! - [`Forwarder`]: turns backend updates from joined channels into bus events.
//!
//! The reconciler is the registry's only writer. The forwarder and the
//! control plane only read it.

pub mod event;
pub mod forward;
pub mod metrics;
pub mod reconcile;
pub mod registry;
pub mod shard;
pub mod shutdown;

pub use event::to_outbound_event;
pub use forward::{Disposition, ForwardStats, Forwarder};
pub use reconcile::{PassReport, Plan, ReconcileTrigger, Reconciler, plan};
pub use registry::Registry;
pub use shard::Shard;
