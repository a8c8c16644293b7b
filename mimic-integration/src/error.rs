use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use thiserror::Error;

/// Failure delivering a message over a transport seam.
///
/// Transport failures are reported and logged by callers; they never terminate a processing
/// loop.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Error)]
pub enum TransportError {
    #[error("transport delivery failed: {0}")]
    Delivery(String),

    #[error("no active transport session")]
    SessionInactive,
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for TransportError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        Self::Delivery("channel receiver dropped".to_string())
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Error)]
pub enum BusError {
    #[error("bus publish to {destination} failed: {reason}")]
    Publish {
        destination: SmolStr,
        reason: String,
    },

    #[error("bus listen on {0} timed out")]
    Timeout(SmolStr),

    #[error("bus destination {0} closed")]
    Closed(SmolStr),
}

#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Error)]
pub enum HttpError {
    #[error("http request failed: {0}")]
    Request(String),

    #[error("http response status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("authentication failed: {0}")]
    Auth(String),
}

#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Error)]
pub enum LlmError {
    #[error("llm provider unavailable")]
    Unavailable,

    #[error("llm completion failed: {0}")]
    Completion(String),
}
