//! Coordinator error types

use locfinder_core::OpenError;
use thiserror::Error;

/// Errors reported by the subscription coordinator
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// `start()` was called while a subscription is live
    #[error("coordinator already started")]
    AlreadyStarted,

    /// A viewport change arrived before `start()`
    #[error("coordinator not started")]
    NotStarted,

    /// The replacement stream could not be opened
    #[error("failed to open location stream: {0}")]
    Open(#[from] OpenError),
}
