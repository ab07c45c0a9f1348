//! Error type shared by the client and server roles of an endpoint.
//!
//! # Design
//! Every variant except `Config` carries the endpoint's `StrictConfig` so a
//! failure can be traced back to one endpoint even when many share a process.
//! The message renders it as `METHOD base+path`.

use std::sync::Arc;

use crate::config::StrictConfig;

/// Longest response body excerpt kept in `UnexpectedStatus`.
pub const MAX_BODY_EXCERPT: usize = 512;

/// Errors produced by `Caller::call` and by the `RouteHandler` pipeline.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    /// The endpoint configuration is unusable.
    #[error("invalid endpoint config: {0}")]
    Config(String),

    /// A payload could not be encoded as JSON.
    #[error("{endpoint}: failed to serialize payload: {source}")]
    Serialization {
        endpoint: Arc<StrictConfig>,
        source: serde_json::Error,
    },

    /// The sender failed before producing a response.
    #[error("{endpoint}: transport failed: {source}")]
    Transport {
        endpoint: Arc<StrictConfig>,
        source: anyhow::Error,
    },

    /// The response status is outside the endpoint's expected set.
    #[error("{endpoint}: unexpected status {status}: {body}")]
    UnexpectedStatus {
        endpoint: Arc<StrictConfig>,
        status: u16,
        body: String,
    },

    /// A request or response body is not valid JSON for the declared type.
    #[error("{endpoint}: failed to deserialize body: {source}")]
    Deserialization {
        endpoint: Arc<StrictConfig>,
        source: serde_json::Error,
    },

    /// The incoming request body could not be read to completion.
    #[error("{endpoint}: failed to read request body: {source}")]
    Body {
        endpoint: Arc<StrictConfig>,
        source: axum::Error,
    },

    /// A response was committed by someone other than the endpoint.
    #[error("{endpoint}: protocol violation: {reason}")]
    ProtocolViolation {
        endpoint: Arc<StrictConfig>,
        reason: &'static str,
    },

    /// The user-supplied handler returned an error.
    #[error("{endpoint}: handler failed: {source}")]
    Handler {
        endpoint: Arc<StrictConfig>,
        source: anyhow::Error,
    },
}

impl EndpointError {
    /// The endpoint that failed, if the error happened after construction.
    pub fn endpoint(&self) -> Option<&StrictConfig> {
        match self {
            EndpointError::Config(_) => None,
            EndpointError::Serialization { endpoint, .. }
            | EndpointError::Transport { endpoint, .. }
            | EndpointError::UnexpectedStatus { endpoint, .. }
            | EndpointError::Deserialization { endpoint, .. }
            | EndpointError::Body { endpoint, .. }
            | EndpointError::ProtocolViolation { endpoint, .. }
            | EndpointError::Handler { endpoint, .. } => Some(endpoint),
        }
    }
}

/// Truncate `body` to at most `MAX_BODY_EXCERPT` bytes on a char boundary.
pub(crate) fn excerpt(body: &str) -> String {
    if body.len() <= MAX_BODY_EXCERPT {
        return body.to_string();
    }
    let mut end = MAX_BODY_EXCERPT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
