//! Error types for the location stream client

use thiserror::Error;

/// Result type alias for client setup operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur while setting up the client
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP client could not be built
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Invalid base URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
