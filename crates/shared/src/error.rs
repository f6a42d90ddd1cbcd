use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InvalidConfig,
    Network,
    Timeout,
    Status,
    Decode,
    Rejected,
    Panicked,
}

/// Why a transport call did not produce a payload.
///
/// Carried unchanged to the error hook of a controller; never raised past it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    #[error("invalid request configuration: {0}")]
    InvalidConfig(String),
    #[error("network failure: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("server responded with status {status}")]
    Status { status: u16, body: Value },
    #[error("failed to decode response payload: {0}")]
    Decode(String),
    #[error("request rejected: {0}")]
    Rejected(Value),
    /// The transport or a success hook panicked while settling the request.
    #[error("request handler panicked: {0}")]
    Panicked(String),
}

impl TransportError {
    pub fn rejected(value: impl Into<Value>) -> Self {
        Self::Rejected(value.into())
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            TransportError::InvalidConfig(_) => FailureKind::InvalidConfig,
            TransportError::Network(_) => FailureKind::Network,
            TransportError::Timeout => FailureKind::Timeout,
            TransportError::Status { .. } => FailureKind::Status,
            TransportError::Decode(_) => FailureKind::Decode,
            TransportError::Rejected(_) => FailureKind::Rejected,
            TransportError::Panicked(_) => FailureKind::Panicked,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Payload attached to the failure, if the transport produced one.
    pub fn body(&self) -> Option<&Value> {
        match self {
            TransportError::Status { body, .. } => Some(body),
            TransportError::Rejected(value) => Some(value),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value.to_string())
    }
}

/// Serializable summary of a [`TransportError`] for presentation layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureReport {
    pub kind: FailureKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub message: String,
}

impl From<&TransportError> for FailureReport {
    fn from(value: &TransportError) -> Self {
        Self {
            kind: value.kind(),
            status: value.status(),
            message: value.to_string(),
        }
    }
}
