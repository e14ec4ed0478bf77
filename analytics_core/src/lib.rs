/*!
 * Analytics Core: batching event delivery.
 *
 * Producers push events onto a bounded queue; one or more dispatcher
 * threads drain it into batches of at most `batch_size` events and post
 * each batch to the import endpoint with the project's write key.
 * Delivery is at most once: a failed batch is reported through
 * `Options::on_error` and dropped, never retried.
 *
 * # Module structure
 *
 * - `protocol/`: what we send: `Event`, batch envelope, write key
 * - `transport/`: how it leaves the process: `Transport` trait, HTTP
 * - `dispatch/`: queue, dispatcher loop, worker threads
 * - `client`: controller owning the queue and workers; global instance
 * - `guard`: RAII flush-and-shutdown on drop
 */

mod client;
mod dispatch;
mod error;
mod guard;
mod protocol;
mod transport;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use client::{Client, Options, SharedTransport};
pub use dispatch::{
    ChannelQueue, Dispatcher, DispatcherConfig, ErrorCallback, ExitSignal, Queue, RunOutcome,
    Worker,
};
pub use error::{Error, Result};
pub use guard::Guard;
pub use protocol::constants::{
    LIBRARY_NAME, LIBRARY_VERSION, NO_RESPONSE_STATUS, SUCCESS_STATUS,
};
pub use protocol::credential::Credential;
pub use protocol::types::{BatchPayload, Event};
pub use transport::{HttpTransport, Outcome, Transport};

// ---------------------------------------------------------------------------
// Process-wide API
// ---------------------------------------------------------------------------

/**
 * Starts the global client with the given write key and options.
 *
 * Returns a `Guard` that flushes and shuts the client down when dropped;
 * keep it alive for the duration of the application.
 *
 * Returns `Err` if the write key or options are invalid, or if `init`
 * was already called.
 */
pub fn init(write_key: &str, options: Options) -> Result<Guard> {
    client::init_global(write_key, options)?;
    Ok(Guard::new())
}

/**
 * Queues an event on the global client.
 *
 * Returns `false` if the SDK is not initialized, already shut down, or
 * the queue is full.
 */
pub fn track(event: Event) -> bool {
    match client::get_client() {
        Some(client) => client.enqueue(event),
        None => false,
    }
}

/**
 * Waits for queued events to be delivered, up to the flush timeout.
 *
 * Normally you don't need this; the `Guard` flushes on drop.
 */
pub fn flush() -> bool {
    match client::get_client() {
        Some(client) => client.flush(),
        None => true,
    }
}
