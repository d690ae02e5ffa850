// SPDX-FileCopyrightText: 2026 Chanbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Control-plane HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state.

use std::sync::Arc;

use axum::{Router, middleware as axum_middleware, routing::get};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use chanbridge_connector::{Registry, Shard};
use chanbridge_core::{ChanbridgeError, ChannelStore};

use crate::auth::{AuthConfig, auth_middleware};
use crate::{handlers, openapi};

/// State for the unauthenticated health and metrics routes.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
    /// Optional Prometheus metrics render function.
    pub prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct ControlPlaneState {
    /// Joined channels. Read only.
    pub registry: Arc<Registry>,
    /// The cached store facade.
    pub store: Arc<dyn ChannelStore>,
    pub shard: Shard,
    /// Replica name as configured.
    pub replica: String,
    pub auth: AuthConfig,
    pub health: HealthState,
}

/// Listener configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Builds the control-plane router.
///
/// - GET /health, /metrics, /openapi.json (public)
/// - GET /v1/channels, /v1/channels/{id}, /v1/status (bearer auth when configured)
pub fn router(state: ControlPlaneState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .route("/metrics", get(handlers::get_metrics))
        .route("/openapi.json", get(openapi::get_openapi))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route("/v1/channels", get(handlers::list_channels))
        .route("/v1/channels/{id}", get(handlers::get_channel))
        .route("/v1/status", get(handlers::get_status))
        .route_layer(axum_middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serves the control plane on an already-bound listener until `cancel` fires.
pub async fn serve(
    listener: TcpListener,
    state: ControlPlaneState,
    cancel: CancellationToken,
) -> Result<(), ChanbridgeError> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| ChanbridgeError::Internal(format!("control plane server error: {e}")))
}

/// Binds `config.host:config.port` and serves until `cancel` fires.
pub async fn start_server(
    config: &ServerConfig,
    state: ControlPlaneState,
    cancel: CancellationToken,
) -> Result<(), ChanbridgeError> {
    let addr = config.addr();
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        ChanbridgeError::Config(format!("failed to bind control plane to {addr}: {e}"))
    })?;

    tracing::info!(%addr, "control plane listening");
    serve(listener, state, cancel).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use chanbridge_test_utils::MemoryStore;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn state() -> ControlPlaneState {
        ControlPlaneState {
            registry: Arc::new(Registry::new()),
            store: Arc::new(MemoryStore::new()),
            shard: Shard::single(),
            replica: "chanbridge-0".into(),
            auth: AuthConfig::default(),
            health: HealthState {
                start_time: std::time::Instant::now(),
                prometheus_render: None,
            },
        }
    }

    #[test]
    fn server_config_formats_addr() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 50051,
        };
        assert_eq!(config.addr(), "127.0.0.1:50051");
    }

    #[tokio::test]
    async fn serves_over_tcp_and_stops_on_cancel() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let cancel = CancellationToken::new();
        let server = tokio::spawn(serve(listener, state(), cancel.clone()));

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200"), "{response}");
        assert!(response.contains("\"status\":\"ok\""));

        cancel.cancel();
        let result = tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn bind_failure_is_reported() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = ServerConfig {
            host: "127.0.0.1".into(),
            port: taken.local_addr().unwrap().port(),
        };
        let err = start_server(&config, state(), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to bind"));
    }
}
