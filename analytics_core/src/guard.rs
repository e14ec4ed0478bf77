/**
 * RAII guard returned by `analytics_core::init()`.
 *
 * ```ignore
 * fn main() {
 *     let _guard = analytics_core::init("WRITE_KEY", Default::default()).unwrap();
 *
 *     // ... application logic, events are tracked here ...
 *
 * }   // <-- _guard is dropped here: flush, then shut the workers down
 * ```
 *
 * Dropping the guard first waits (up to the flush timeout) for queued
 * events to be sent, then sets the exit signal so every worker performs
 * its terminal drain and stops. Events tracked afterwards are dropped.
 */
use tracing::warn;

use crate::client;

pub struct Guard {
    /// Zero-sized; only `init()` can create a guard.
    _private: (),
}

impl Guard {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

impl Drop for Guard {
    fn drop(&mut self) {
        if let Some(client) = client::get_client() {
            if !client.flush() {
                warn!("flush timed out, remaining events go out in the final batch");
            }
            client.shutdown();
        }
    }
}
