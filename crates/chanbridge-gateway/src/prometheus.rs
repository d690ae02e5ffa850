// SPDX-FileCopyrightText: 2026 Chanbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prometheus recorder installation.
//!
//! Metrics are recorded through the `metrics` facade by the connector and
//! rendered in Prometheus text format by the `/metrics` route.

use std::sync::Arc;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use chanbridge_core::ChanbridgeError;

/// Installs the Prometheus recorder globally and registers metric descriptions.
///
/// Only one recorder can be installed per process; a second call fails.
pub fn install_recorder() -> Result<PrometheusHandle, ChanbridgeError> {
    let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
        ChanbridgeError::Internal(format!("failed to install Prometheus recorder: {e}"))
    })?;

    chanbridge_connector::metrics::describe();

    tracing::info!("prometheus metrics recorder installed");
    Ok(handle)
}

/// Wraps a handle as the render function the control plane serves.
pub fn render_fn(handle: PrometheusHandle) -> Arc<dyn Fn() -> String + Send + Sync> {
    Arc::new(move || handle.render())
}
