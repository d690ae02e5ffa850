// SPDX-FileCopyrightText: 2026 Chanbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the control plane.
//!
//! Handles GET /health, GET /metrics, GET /v1/channels,
//! GET /v1/channels/{id}, and GET /v1/status.

use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use chanbridge_core::Channel;

use crate::server::ControlPlaneState;

/// Response body for GET /health.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Always `ok` while the process serves requests.
    pub status: String,
    /// Binary version.
    pub version: String,
    /// Seconds since the control plane started.
    pub uptime_secs: u64,
}

/// A channel record as exposed over HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ChannelView {
    pub id: i64,
    pub group_id: String,
    pub name: String,
    /// RFC 3339 timestamp of the last confirmed join.
    pub joined_at: Option<String>,
    /// RFC 3339 timestamp of the last refresh.
    pub last_seen: Option<String>,
}

impl From<Channel> for ChannelView {
    fn from(channel: Channel) -> Self {
        Self {
            id: channel.id,
            group_id: channel.group_id,
            name: channel.name,
            joined_at: channel.joined_at.map(|t| t.to_rfc3339()),
            last_seen: channel.last_seen.map(|t| t.to_rfc3339()),
        }
    }
}

/// Response body for GET /v1/channels.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChannelListResponse {
    /// Joined channels, sorted by id.
    pub channels: Vec<ChannelView>,
}

/// Response body for GET /v1/channels/{id}.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChannelDetailResponse {
    pub channel: ChannelView,
    /// Whether this replica has currently joined the channel.
    pub joined: bool,
}

/// Response body for GET /v1/status.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub replica: String,
    pub replica_index: u32,
    pub replica_count: u32,
    /// Channels currently joined by this replica.
    pub joined: usize,
    /// Channels in the store that this replica's shard owns.
    pub desired: usize,
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

fn error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// GET /health
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Process is alive", body = HealthResponse))
)]
pub async fn get_health(State(state): State<ControlPlaneState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
    })
}

/// GET /metrics
///
/// Prometheus text exposition. 404 when the recorder is not installed.
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "health",
    responses(
        (status = 200, description = "Prometheus text format", body = String, content_type = "text/plain"),
        (status = 404, description = "Metrics are disabled", body = ErrorResponse)
    )
)]
pub async fn get_metrics(State(state): State<ControlPlaneState>) -> Response {
    match &state.health.prometheus_render {
        Some(render) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            render(),
        )
            .into_response(),
        None => error(StatusCode::NOT_FOUND, "metrics are disabled"),
    }
}

/// GET /v1/channels
///
/// Snapshot of the joined-channel registry.
#[utoipa::path(
    get,
    path = "/v1/channels",
    tag = "channels",
    responses(
        (status = 200, description = "Joined channels sorted by id", body = ChannelListResponse),
        (status = 401, description = "Missing or invalid bearer token")
    ),
    security(("bearer" = []))
)]
pub async fn list_channels(State(state): State<ControlPlaneState>) -> Json<ChannelListResponse> {
    Json(ChannelListResponse {
        channels: state
            .registry
            .channels()
            .into_iter()
            .map(ChannelView::from)
            .collect(),
    })
}

/// GET /v1/channels/{id}
///
/// Reads the record through the cached store. A channel that was removed from
/// the store but is still joined is served from the registry.
#[utoipa::path(
    get,
    path = "/v1/channels/{id}",
    tag = "channels",
    params(("id" = i64, Path, description = "Chat-backend channel id")),
    responses(
        (status = 200, description = "Channel record", body = ChannelDetailResponse),
        (status = 404, description = "Unknown channel", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse),
        (status = 401, description = "Missing or invalid bearer token")
    ),
    security(("bearer" = []))
)]
pub async fn get_channel(
    State(state): State<ControlPlaneState>,
    Path(id): Path<i64>,
) -> Response {
    let stored = match state.store.get(id).await {
        Ok(stored) => stored,
        Err(e) => {
            tracing::warn!(channel_id = id, error = %e, "control plane channel lookup failed");
            return error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    };

    let joined = state.registry.get(id);
    let is_joined = joined.is_some();
    match stored.or(joined) {
        Some(channel) => Json(ChannelDetailResponse {
            channel: channel.into(),
            joined: is_joined,
        })
        .into_response(),
        None => error(StatusCode::NOT_FOUND, format!("channel {id} not found")),
    }
}

/// GET /v1/status
#[utoipa::path(
    get,
    path = "/v1/status",
    tag = "status",
    responses(
        (status = 200, description = "Replica status", body = StatusResponse),
        (status = 500, description = "Store failure", body = ErrorResponse),
        (status = 401, description = "Missing or invalid bearer token")
    ),
    security(("bearer" = []))
)]
pub async fn get_status(State(state): State<ControlPlaneState>) -> Response {
    let desired = match state.store.list().await {
        Ok(channels) => channels.iter().filter(|c| state.shard.owns(c.id)).count(),
        Err(e) => {
            tracing::warn!(error = %e, "control plane status lookup failed");
            return error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    };

    Json(StatusResponse {
        replica: state.replica.clone(),
        replica_index: state.shard.index(),
        replica_count: state.shard.count(),
        joined: state.registry.len(),
        desired,
    })
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use chanbridge_connector::{Registry, Shard};
    use chanbridge_test_utils::MemoryStore;
    use tower::ServiceExt;

    use crate::auth::AuthConfig;
    use crate::server::{HealthState, router};

    struct Fixture {
        store: Arc<MemoryStore>,
        registry: Arc<Registry>,
        state: ControlPlaneState,
    }

    fn fixture(shard: Shard) -> Fixture {
        let store = Arc::new(MemoryStore::with_channels([
            Channel::new(-1003, "news").with_name("https://t.me/news"),
            Channel::new(-1002, "sports"),
            Channel::new(-1001, "news"),
            Channel::new(40, "misc"),
        ]));
        let registry = Arc::new(Registry::new());
        let state = ControlPlaneState {
            registry: registry.clone(),
            store: store.clone(),
            shard,
            replica: "chanbridge-0".into(),
            auth: AuthConfig::default(),
            health: HealthState {
                start_time: std::time::Instant::now(),
                prometheus_render: None,
            },
        };
        Fixture {
            store,
            registry,
            state,
        }
    }

    async fn get(state: ControlPlaneState, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn health_reports_version() {
        let f = fixture(Shard::single());
        let (status, body) = get(f.state, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn channels_lists_registry_sorted() {
        let f = fixture(Shard::single());
        f.registry.add(Channel::new(-1001, "news"));
        f.registry.add(Channel::new(-1003, "news"));

        let (status, body) = get(f.state, "/v1/channels").await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<i64> = body["channels"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![-1003, -1001]);
    }

    #[tokio::test]
    async fn channel_detail_carries_joined_flag() {
        let f = fixture(Shard::single());
        f.registry.add(Channel::new(-1003, "news"));

        let (status, body) = get(f.state.clone(), "/v1/channels/-1003").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["channel"]["name"], "https://t.me/news");
        assert_eq!(body["joined"], true);

        let (status, body) = get(f.state, "/v1/channels/-1002").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["channel"]["group_id"], "sports");
        assert_eq!(body["joined"], false);
    }

    #[tokio::test]
    async fn unknown_channel_is_404() {
        let f = fixture(Shard::single());
        let (status, body) = get(f.state, "/v1/channels/12345").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("12345"));
    }

    #[tokio::test]
    async fn joined_channel_missing_from_store_is_served_from_registry() {
        let f = fixture(Shard::single());
        f.registry.add(Channel::new(77, "late"));
        let (status, body) = get(f.state, "/v1/channels/77").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["joined"], true);
    }

    #[tokio::test]
    async fn non_numeric_channel_id_is_rejected() {
        let f = fixture(Shard::single());
        let (status, _) = get(f.state, "/v1/channels/abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn store_failure_is_500() {
        let f = fixture(Shard::single());
        f.store.set_unreachable(true);
        let (status, _) = get(f.state.clone(), "/v1/channels/-1003").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let (status, _) = get(f.state, "/v1/status").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn status_counts_only_owned_channels() {
        // -1002 and 40 are even, so shard 0/2 owns them.
        let f = fixture(Shard::new(0, 2).unwrap());
        f.registry.add(Channel::new(40, "misc"));

        let (status, body) = get(f.state, "/v1/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["replica"], "chanbridge-0");
        assert_eq!(body["replica_index"], 0);
        assert_eq!(body["replica_count"], 2);
        assert_eq!(body["joined"], 1);
        assert_eq!(body["desired"], 2);
    }

    #[tokio::test]
    async fn metrics_disabled_is_404() {
        let f = fixture(Shard::single());
        let (status, _) = get(f.state, "/metrics").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn metrics_renders_exposition_text() {
        let mut f = fixture(Shard::single());
        f.state.health.prometheus_render =
            Some(Arc::new(|| "chanbridge_joined_channels 2\n".to_string()));

        let response = router(f.state)
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"chanbridge_joined_channels 2\n");
    }

    #[tokio::test]
    async fn query_routes_require_token_when_configured() {
        let mut f = fixture(Shard::single());
        f.state.auth = AuthConfig {
            bearer_token: Some("s3cret".into()),
        };

        let (status, _) = get(f.state.clone(), "/v1/status").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = get(f.state.clone(), "/health").await;
        assert_eq!(status, StatusCode::OK);

        let response = router(f.state)
            .oneshot(
                Request::builder()
                    .uri("/v1/status")
                    .header(header::AUTHORIZATION, "Bearer s3cret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn handlers_never_write_the_store() {
        let f = fixture(Shard::single());
        for uri in ["/v1/channels", "/v1/channels/-1003", "/v1/status", "/health"] {
            get(f.state.clone(), uri).await;
        }
        assert_eq!(f.store.put_calls(), 0);
        assert_eq!(f.store.delete_calls(), 0);
    }
}
