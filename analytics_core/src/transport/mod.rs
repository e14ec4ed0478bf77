/**
 * Transport layer: how a batch leaves the process.
 *
 * - `Transport`: the delivery capability the dispatcher consumes
 * - `Outcome`: status code plus optional error, returned for every post
 * - `http`: ureq-based implementation talking to the import endpoint
 *
 * A transport never returns `Err`: network faults are folded into the
 * outcome so the dispatcher handles them exactly like a rejected batch.
 */
use std::sync::Arc;

use crate::protocol::constants::{NO_RESPONSE_STATUS, SUCCESS_STATUS};
use crate::protocol::credential::Credential;

pub mod http;

pub use http::HttpTransport;

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/**
 * Result of one delivery attempt.
 *
 * `error` is only populated when `status` is not the success status.
 * A status of `0` means no HTTP response was received at all.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub status: u16,
    pub error: Option<String>,
}

impl Outcome {
    pub fn success() -> Self {
        Self {
            status: SUCCESS_STATUS,
            error: None,
        }
    }

    pub fn failure(status: u16, error: impl Into<String>) -> Self {
        Self {
            status,
            error: Some(error.into()),
        }
    }

    /// The request never produced a response (DNS, connect, timeout, ...).
    pub fn no_response(error: impl Into<String>) -> Self {
        Self::failure(NO_RESPONSE_STATUS, error)
    }

    /// Only the exact success status counts; other 2xx codes do not.
    pub fn is_success(&self) -> bool {
        self.status == SUCCESS_STATUS
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/**
 * Delivers one ordered batch for one credential.
 *
 * Called from the dispatcher's thread with no lock held. Implementations
 * may block on I/O; the dispatcher never has more than one call in flight.
 */
pub trait Transport<E>: Send + Sync {
    fn post(&self, credential: &Credential, batch: &[E]) -> Outcome;
}

impl<E, T> Transport<E> for Arc<T>
where
    T: Transport<E> + ?Sized,
{
    fn post(&self, credential: &Credential, batch: &[E]) -> Outcome {
        (**self).post(credential, batch)
    }
}
