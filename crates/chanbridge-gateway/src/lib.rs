// SPDX-FileCopyrightText: 2026 Chanbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only HTTP control plane.
//!
//! Exposes liveness, Prometheus metrics, the joined-channel registry, single
//! channel lookups through the cached store, and a replica status summary.
//! Nothing here mutates connector state.

pub mod auth;
pub mod handlers;
pub mod openapi;
pub mod prometheus;
pub mod server;

pub use auth::AuthConfig;
pub use server::{ControlPlaneState, HealthState, ServerConfig, router, serve, start_server};
