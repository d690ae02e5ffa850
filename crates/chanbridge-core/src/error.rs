// SPDX-FileCopyrightText: 2026 Chanbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the chanbridge connector.

use thiserror::Error;

/// The primary error type used across all chanbridge collaborator traits.
#[derive(Debug, Error)]
pub enum ChanbridgeError {
    /// Configuration errors (invalid TOML, bad replica identity, missing credentials).
    #[error("configuration error: {0}")]
    Config(String),

    /// Durable store errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Chat backend errors (join/leave failure, rate limiting, session loss).
    #[error("backend error: {message}")]
    Backend {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Event-bus writer errors (rejected event, unreachable endpoint).
    #[error("writer error: {message}")]
    Writer {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A record the caller required does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Operation exceeded its deadline.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// A stream or channel was closed by its producer.
    #[error("{what} closed")]
    Closed { what: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ChanbridgeError {
    /// Wraps any error as a storage error.
    pub fn storage(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Storage {
            source: source.into(),
        }
    }

    /// Builds a backend error without an underlying source.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
            source: None,
        }
    }

    /// Builds a writer error without an underlying source.
    pub fn writer(message: impl Into<String>) -> Self {
        Self::Writer {
            message: message.into(),
            source: None,
        }
    }

    /// Returns `true` when the error signals the end of a stream.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_carry_context() {
        let err = ChanbridgeError::backend("flood wait");
        assert_eq!(err.to_string(), "backend error: flood wait");

        let err = ChanbridgeError::NotFound {
            kind: "channel",
            id: "-100123".into(),
        };
        assert_eq!(err.to_string(), "channel not found: -100123");

        let err = ChanbridgeError::Timeout {
            duration: std::time::Duration::from_secs(3),
        };
        assert!(err.to_string().contains("3s"));
    }

    #[test]
    fn storage_helper_boxes_source() {
        let err = ChanbridgeError::storage(std::io::Error::other("disk gone"));
        assert!(matches!(err, ChanbridgeError::Storage { .. }));
        assert!(err.to_string().contains("disk gone"));
    }

    #[test]
    fn only_closed_variant_reports_closed() {
        let closed = ChanbridgeError::Closed {
            what: "update stream".into(),
        };
        assert!(closed.is_closed());
        assert_eq!(closed.to_string(), "update stream closed");
        assert!(!ChanbridgeError::writer("503").is_closed());
        assert!(!ChanbridgeError::Internal("closed".into()).is_closed());
    }
}
