// SPDX-FileCopyrightText: 2026 Chanbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP event-bus writer.
//!
//! Posts each [`OutboundEvent`] as a JSON document to a single ingestion
//! endpoint. The routing key and the writer identity travel as headers so
//! the bus can route without parsing the body. Delivery is a single attempt:
//! retry and durability belong to the bus.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::debug;

use chanbridge_config::model::WriterConfig;
use chanbridge_core::{ChanbridgeError, EventWriter, OutboundEvent};

/// Header carrying the event's routing key.
pub const GROUP_ID_HEADER: &str = "x-chanbridge-group-id";

/// Header carrying the identity the connector writes as.
pub const USER_ID_HEADER: &str = "x-chanbridge-user-id";

/// Longest response body echoed into an error message.
const MAX_ERROR_BODY: usize = 512;

/// Writes events to an HTTP ingestion endpoint.
#[derive(Debug, Clone)]
pub struct HttpEventWriter {
    client: reqwest::Client,
    uri: String,
    user_id: String,
}

impl HttpEventWriter {
    /// Builds a writer for `uri` identified as `user_id`.
    pub fn new(uri: &str, user_id: &str, timeout: Duration) -> Result<Self, ChanbridgeError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_ID_HEADER,
            HeaderValue::from_str(user_id).map_err(|e| {
                ChanbridgeError::Config(format!("invalid writer user id header value: {e}"))
            })?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ChanbridgeError::Writer {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            uri: uri.to_string(),
            user_id: user_id.to_string(),
        })
    }

    /// Builds a writer from config. `writer.user_id` wins over `default_user_id`.
    pub fn from_config(
        config: &WriterConfig,
        default_user_id: &str,
    ) -> Result<Self, ChanbridgeError> {
        let user_id = config.user_id.as_deref().unwrap_or(default_user_id);
        Self::new(&config.uri, user_id, config.send_timeout())
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

#[async_trait]
impl EventWriter for HttpEventWriter {
    async fn send(&self, event: OutboundEvent) -> Result<(), ChanbridgeError> {
        let response = self
            .client
            .post(&self.uri)
            .header(GROUP_ID_HEADER, event.group_id.as_str())
            .json(&event)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ChanbridgeError::Writer {
                        message: format!("event {} timed out", event.id),
                        source: Some(Box::new(e)),
                    }
                } else {
                    ChanbridgeError::Writer {
                        message: format!("HTTP request failed: {e}"),
                        source: Some(Box::new(e)),
                    }
                }
            })?;

        let status = response.status();
        if status.is_success() {
            debug!(event_id = %event.id, status = %status, "event accepted by bus");
            return Ok(());
        }

        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        Err(ChanbridgeError::writer(format!(
            "bus rejected event {} with {status}: {body}",
            event.id
        )))
    }

    async fn close(&self) -> Result<(), ChanbridgeError> {
        debug!(uri = %self.uri, "event writer closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn event() -> OutboundEvent {
        OutboundEvent {
            id: "-100-7".into(),
            source: "https://t.me/news".into(),
            spec_version: "1.0".into(),
            event_type: "chanbridge.telegram.message.v1".into(),
            group_id: "news".into(),
            subject: Some("tg://user?id=5".into()),
            time: chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            text: "hello".into(),
        }
    }

    fn writer(server: &MockServer) -> HttpEventWriter {
        HttpEventWriter::new(
            &format!("{}/v1/events", server.uri()),
            "tg://user?id=777",
            Duration::from_secs(2),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn posts_event_with_routing_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/events"))
            .and(header(GROUP_ID_HEADER, "news"))
            .and(header(USER_ID_HEADER, "tg://user?id=777"))
            .and(body_partial_json(serde_json::json!({
                "id": "-100-7",
                "type": "chanbridge.telegram.message.v1",
                "group_id": "news",
                "text": "hello",
            })))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        writer(&server).send(event()).await.unwrap();
    }

    #[tokio::test]
    async fn rejected_event_is_a_writer_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad group"))
            .expect(1)
            .mount(&server)
            .await;

        let err = writer(&server).send(event()).await.unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, ChanbridgeError::Writer { .. }));
        assert!(msg.contains("400"), "{msg}");
    }

    #[tokio::test]
    async fn slow_bus_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let writer = HttpEventWriter::new(
            &format!("{}/v1/events", server.uri()),
            "u",
            Duration::from_millis(100),
        )
        .unwrap();
        let err = writer.send(event()).await.unwrap_err();
        assert!(err.to_string().contains("timed out"), "{err}");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_writer_error() {
        let writer =
            HttpEventWriter::new("http://127.0.0.1:9/v1/events", "u", Duration::from_secs(1))
                .unwrap();
        assert!(matches!(
            writer.send(event()).await,
            Err(ChanbridgeError::Writer { .. })
        ));
    }

    #[test]
    fn config_user_id_overrides_default() {
        let mut config = WriterConfig::default();
        let writer = HttpEventWriter::from_config(&config, "tg://user?id=1").unwrap();
        assert_eq!(writer.user_id(), "tg://user?id=1");

        config.user_id = Some("ingest-bot".into());
        let writer = HttpEventWriter::from_config(&config, "tg://user?id=1").unwrap();
        assert_eq!(writer.user_id(), "ingest-bot");
    }

    #[test]
    fn invalid_user_id_header_is_a_config_error() {
        assert!(matches!(
            HttpEventWriter::new("http://localhost", "bad\nvalue", Duration::from_secs(1)),
            Err(ChanbridgeError::Config(_))
        ));
    }
}
