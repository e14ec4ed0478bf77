/*!
 * HTTP transport for the batch import endpoint.
 *
 * Uses `ureq`, a blocking HTTP client with no async runtime. Each
 * dispatcher already runs on its own thread, so blocking I/O is fine.
 *
 * - **One attempt per batch**: no retries, the dispatcher drops the batch
 *   after reporting the failure.
 * - **No `Err`**: connection errors become an `Outcome` with status 0.
 */

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::trace;
use ureq::Agent;

use super::{Outcome, Transport};
use crate::protocol::constants::DEFAULT_ENDPOINT;
use crate::protocol::credential::Credential;
use crate::protocol::types::BatchPayload;

/// Error body returned by the API on rejected batches: `{"error": "..."}`.
#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/**
 * Thin wrapper around `ureq::Agent` posting JSON batches to one endpoint.
 *
 * Cloning is cheap: clones share the agent's connection pool.
 */
#[derive(Clone)]
pub struct HttpTransport {
    agent: Agent,
    endpoint: String,
}

impl HttpTransport {
    /**
     * Creates a transport for `endpoint`.
     *
     * Timeouts:
     * - 10 s connect
     * - 30 s total per request
     *
     * HTTP error statuses are returned as responses rather than errors so
     * the status and body can be reported through the outcome.
     */
    pub fn new(endpoint: impl Into<String>) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_connect(Some(Duration::from_secs(10)))
            .timeout_global(Some(Duration::from_secs(30)))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

impl<E> Transport<E> for HttpTransport
where
    E: Serialize,
{
    fn post(&self, credential: &Credential, batch: &[E]) -> Outcome {
        trace!(endpoint = %self.endpoint, size = batch.len(), "posting batch");

        let result = self
            .agent
            .post(self.endpoint.as_str())
            .header("Authorization", credential.basic_auth())
            .send_json(BatchPayload::new(batch));

        match result {
            Ok(response) => {
                let status = response.status().as_u16();
                if (200..300).contains(&status) {
                    return Outcome {
                        status,
                        error: None,
                    };
                }

                let body = response
                    .into_body()
                    .read_to_string()
                    .unwrap_or_else(|_| "<unreadable body>".into());
                Outcome::failure(status, error_message(&body))
            }
            Err(err) => Outcome::no_response(err.to_string()),
        }
    }
}

/// Prefers the API's `error` field, falling back to the raw body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_json_field() {
        assert_eq!(error_message(r#"{"error":"invalid write key"}"#), "invalid write key");
    }

    #[test]
    fn test_error_message_falls_back_to_body() {
        assert_eq!(error_message("Bad Gateway\n"), "Bad Gateway");
    }

    #[test]
    fn test_default_endpoint() {
        assert_eq!(HttpTransport::default().endpoint(), DEFAULT_ENDPOINT);
    }
}
