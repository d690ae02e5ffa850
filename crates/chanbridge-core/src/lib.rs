// SPDX-FileCopyrightText: 2026 Chanbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the chanbridge connector.
//!
//! Defines the error type, the domain types (channels, updates, outbound
//! events), and the collaborator traits every other crate in the workspace
//! implements or consumes.

pub mod error;
pub mod traits;
pub mod types;

pub use error::ChanbridgeError;
pub use types::{AdapterType, Channel, ChatUser, HealthStatus, OutboundEvent, UpdateEvent};

pub use traits::{ChannelStore, ChatBackend, EventWriter, PluginAdapter};
