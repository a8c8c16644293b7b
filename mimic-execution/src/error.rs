use mimic_integration::error::TransportError;
use mimic_message::key::RequestKey;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize, Error)]
pub enum ExecutionError {
    #[error("stub registered with no response generators")]
    EmptyResponseSequence,

    #[error("a request with key {0} is already awaiting a response")]
    DuplicateKey(RequestKey),

    #[error("no transport session is bound")]
    NoSession,

    #[error("response for request {0} did not arrive within the deadline")]
    Timeout(RequestKey),

    #[error("transport: {0}")]
    Transport(#[from] TransportError),
}
