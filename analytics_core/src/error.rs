/*!
 * Error types for SDK setup.
 *
 * Only construction and lifecycle problems surface as `Error`. Delivery
 * failures never do: they are reported through the dispatcher's error
 * callback and the batch is dropped.
 */
use thiserror::Error;

/// Errors returned while building a client or a dispatcher.
#[derive(Debug, Error)]
pub enum Error {
    /// A required input is missing or out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// `init()` was called more than once in this process.
    #[error("analytics SDK is already initialized")]
    AlreadyInitialized,

    /// A worker thread could not be started.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
