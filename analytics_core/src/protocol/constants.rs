/**
 * SDK-wide constants.
 *
 * Library identity is baked into every batch envelope; the rest are the
 * defaults behind `Options::default()`.
 */
use std::time::Duration;

/// Library name reported in the `context.library` block of every batch.
pub const LIBRARY_NAME: &str = "analytics-rust";

/// Derived at compile time from the `analytics_core` package version.
pub const LIBRARY_VERSION: &str = env!("CARGO_PKG_VERSION");

/// The only status a transport outcome may carry to count as delivered.
pub const SUCCESS_STATUS: u16 = 200;

/// Status reported when no HTTP response was received at all.
pub const NO_RESPONSE_STATUS: u16 = 0;

pub const DEFAULT_ENDPOINT: &str = "https://api.segment.io/v1/import";

/// Maximum number of events accumulated into one batch.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Capacity of the shared event queue. Events are dropped beyond this.
pub const DEFAULT_MAX_QUEUE_SIZE: usize = 10_000;

pub const DEFAULT_WORKERS: usize = 1;

/// How long an idle worker parks before polling the queue again.
pub const DEFAULT_IDLE_INTERVAL: Duration = Duration::from_millis(50);

/// Maximum time `flush()` blocks waiting for the queue to settle.
pub const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);
