/**
 * Write key handling.
 *
 * The ingestion API identifies the destination project by its write key.
 * The key is sent as the username of HTTP Basic auth with an empty
 * password, so the header value is `Basic base64("<write_key>:")`.
 *
 * The key is validated once, when the client or dispatcher is built, and
 * never changes afterwards.
 */
use std::fmt;

use base64::Engine as _;

use crate::error::{Error, Result};

/**
 * Immutable, validated write key.
 *
 * `Debug` is redacted so the key does not leak into logs.
 */
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    write_key: String,
}

impl Credential {
    /**
     * Validates and wraps a write key.
     *
     * # Returns
     * `Err(Error::InvalidConfiguration)` when the key is empty or only
     * whitespace.
     */
    pub fn new(write_key: impl Into<String>) -> Result<Self> {
        let write_key = write_key.into();
        if write_key.trim().is_empty() {
            return Err(Error::invalid("write key must not be empty"));
        }
        Ok(Self { write_key })
    }

    /// `Authorization` header value for this key.
    pub fn basic_auth(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:", self.write_key));
        format!("Basic {encoded}")
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let visible: String = self.write_key.chars().take(4).collect();
        f.debug_struct("Credential")
            .field("write_key", &format_args!("{visible}***"))
            .finish()
    }
}
