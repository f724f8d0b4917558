//! Error types shared by the transport and the coordinator

use thiserror::Error;

/// A raw stream message that could not be turned into a `LocationEvent`
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Payload is not JSON, or a field has the wrong type
    #[error("malformed location payload: {0}")]
    Malformed(String),

    /// A required field is absent or null
    #[error("location payload missing field: {0}")]
    MissingField(&'static str),
}

impl From<serde_json::Error> for DecodeError {
    fn from(e: serde_json::Error) -> Self {
        DecodeError::Malformed(e.to_string())
    }
}

/// The stream connection failed or was closed by the remote side
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transport error: {message}")]
pub struct TransportError {
    /// Human-readable cause
    pub message: String,
    /// HTTP status when the server rejected the stream
    pub status: Option<u16>,
    /// Expected failure, e.g. an intentional cancel racing with a close
    pub benign: bool,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            benign: false,
        }
    }

    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self {
            message: format!("server returned {}: {}", status, message.into()),
            status: Some(status),
            benign: false,
        }
    }

    pub fn benign(mut self) -> Self {
        self.benign = true;
        self
    }
}

/// A stream could not be opened
#[derive(Debug, Error)]
pub enum OpenError {
    #[error("invalid viewport: {0}")]
    InvalidViewport(String),

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("invalid stream URL: {0}")]
    InvalidUrl(String),

    /// The transport needs an async runtime to drive the connection
    #[error("no async runtime available: {0}")]
    Runtime(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_carries_status() {
        let err = TransportError::server(400, "bad type");
        assert_eq!(err.status, Some(400));
        assert!(!err.benign);
        assert_eq!(err.to_string(), "transport error: server returned 400: bad type");
    }

    #[test]
    fn test_benign_flag() {
        let err = TransportError::new("connection reset").benign();
        assert!(err.benign);
        assert_eq!(err.status, None);
    }
}
