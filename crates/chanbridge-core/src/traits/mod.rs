// SPDX-FileCopyrightText: 2026 Chanbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! All traits use `#[async_trait]` so they can be held as trait objects.

pub mod adapter;
pub mod backend;
pub mod store;
pub mod writer;

pub use adapter::PluginAdapter;
pub use backend::ChatBackend;
pub use store::ChannelStore;
pub use writer::EventWriter;
