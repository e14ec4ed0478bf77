/**
 * Wire types for the batch import API.
 *
 * The outermost envelope is `BatchPayload`, which wraps an ordered slice of
 * events together with the library context. The backend receives:
 * `{ batch: [...], context: { library: { name, version } } }`.
 *
 * The dispatcher itself never looks inside an event; only the HTTP
 * transport needs these to be `Serialize`.
 */
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::constants::{LIBRARY_NAME, LIBRARY_VERSION};

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/**
 * A single analytics record, e.g. a `track` or `identify` call.
 *
 * Validation and field normalization happen upstream, before the event is
 * enqueued. Here it is just a `type` tag plus arbitrary JSON fields that are
 * flattened into the record on the wire:
 *
 * ```json
 * { "type": "track", "event": "Signed Up", "userId": "42" }
 * ```
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    kind: String,

    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl Event {
    /// Creates an event of the given type (`"track"`, `"identify"`, ...).
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            fields: Map::new(),
        }
    }

    /// Sets a top-level field, replacing any previous value under `key`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Identifies the SDK that produced a batch.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Library {
    pub name: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Context {
    pub library: Library,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            library: Library {
                name: LIBRARY_NAME,
                version: LIBRARY_VERSION,
            },
        }
    }
}

/**
 * Request body for one dispatch. Borrows the batch so the dispatcher's
 * buffer is serialized in place, in insertion order.
 */
#[derive(Debug, Serialize)]
pub struct BatchPayload<'a, E> {
    pub batch: &'a [E],
    pub context: Context,
}

impl<'a, E> BatchPayload<'a, E> {
    pub fn new(batch: &'a [E]) -> Self {
        Self {
            batch,
            context: Context::default(),
        }
    }
}
