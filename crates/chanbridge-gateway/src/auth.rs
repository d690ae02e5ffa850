// SPDX-FileCopyrightText: 2026 Chanbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bearer-token middleware for the `/v1` query routes.

use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::Response,
};

/// Authentication configuration for the control plane.
#[derive(Clone, Default)]
pub struct AuthConfig {
    /// Expected bearer token. `None` leaves the query routes open.
    pub bearer_token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

/// Rejects requests whose `Authorization: Bearer` header does not match.
pub async fn auth_middleware(
    State(auth): State<AuthConfig>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(ref expected) = auth.bearer_token else {
        return Ok(next.run(request).await);
    };

    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match presented {
        Some(token) if token == expected => Ok(next.run(request).await),
        Some(_) => {
            tracing::debug!("control plane request rejected: bearer token mismatch");
            Err(StatusCode::UNAUTHORIZED)
        }
        None => Err(StatusCode::UNAUTHORIZED),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::Request as HttpRequest, middleware, routing::get};
    use tower::ServiceExt;

    fn app(token: Option<&str>) -> Router {
        let auth = AuthConfig {
            bearer_token: token.map(str::to_string),
        };
        Router::new()
            .route("/v1/ping", get(|| async { "pong" }))
            .route_layer(middleware::from_fn_with_state(auth, auth_middleware))
    }

    async fn status(app: Router, authorization: Option<&str>) -> StatusCode {
        let mut request = HttpRequest::builder().uri("/v1/ping");
        if let Some(value) = authorization {
            request = request.header(header::AUTHORIZATION, value);
        }
        app.oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn open_when_no_token_configured() {
        assert_eq!(status(app(None), None).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn accepts_matching_bearer_token() {
        assert_eq!(
            status(app(Some("s3cret")), Some("Bearer s3cret")).await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn rejects_missing_or_wrong_token() {
        assert_eq!(
            status(app(Some("s3cret")), None).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status(app(Some("s3cret")), Some("Bearer nope")).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status(app(Some("s3cret")), Some("Basic s3cret")).await,
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn debug_redacts_token() {
        let auth = AuthConfig {
            bearer_token: Some("s3cret".into()),
        };
        let debug = format!("{auth:?}");
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("[redacted]"));
    }
}
