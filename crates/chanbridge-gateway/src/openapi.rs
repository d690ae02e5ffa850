// SPDX-FileCopyrightText: 2026 Chanbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAPI self-description of the control plane, served at `/openapi.json`.

use axum::Json;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "chanbridge control plane",
        description = "Read-only view of the channels a chanbridge replica has joined."
    ),
    paths(
        handlers::get_health,
        handlers::get_metrics,
        handlers::list_channels,
        handlers::get_channel,
        handlers::get_status,
    ),
    components(schemas(
        handlers::HealthResponse,
        handlers::ChannelView,
        handlers::ChannelListResponse,
        handlers::ChannelDetailResponse,
        handlers::StatusResponse,
        handlers::ErrorResponse,
    )),
    modifiers(&BearerScheme),
    tags(
        (name = "health", description = "Liveness and metrics"),
        (name = "channels", description = "Joined channels and channel records"),
        (name = "status", description = "Replica summary")
    )
)]
pub struct ApiDoc;

struct BearerScheme;

impl Modify for BearerScheme {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

/// GET /openapi.json
pub async fn get_openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
