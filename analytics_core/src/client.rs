/**
 * The analytics client, the controller that owns the event queue and the
 * dispatcher threads draining it.
 *
 * Lifecycle:
 * 1. `Client::new(write_key, options)` validates the write key, creates
 *    the bounded queue and spawns `options.workers` dispatcher threads.
 * 2. `enqueue()` pushes events without blocking and wakes one worker.
 * 3. `flush()` waits until every queued event has left the process.
 * 4. `shutdown()` (or dropping the client) sets the exit signal; every
 *    worker drains what is left, sends it and stops.
 *
 * For the process-wide convenience API, one `Client` is stored in a
 * `OnceLock` by `crate::init()`.
 */
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::dispatch::{
    ChannelQueue, Dispatcher, DispatcherConfig, ErrorCallback, ExitSignal, Worker,
};
use crate::error::{Error, Result};
use crate::protocol::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_ENDPOINT, DEFAULT_FLUSH_TIMEOUT, DEFAULT_IDLE_INTERVAL,
    DEFAULT_MAX_QUEUE_SIZE, DEFAULT_WORKERS,
};
use crate::protocol::credential::Credential;
use crate::protocol::types::Event;
use crate::transport::{HttpTransport, Transport};

// ---------------------------------------------------------------------------
// Global singleton
// ---------------------------------------------------------------------------

/**
 * Process-wide client used by the free functions in the crate root.
 * `init()` can only succeed once.
 */
static GLOBAL_CLIENT: OnceLock<Client> = OnceLock::new();

pub fn get_client() -> Option<&'static Client> {
    GLOBAL_CLIENT.get()
}

/**
 * Builds a client and installs it as the global one.
 *
 * # Returns
 * `Err(Error::AlreadyInitialized)` on a second call, or any error from
 * `Client::new`.
 */
pub fn init_global(write_key: &str, options: Options) -> Result<&'static Client> {
    /*
     * Early guard: avoid spawning threads if already initialized.
     */
    if GLOBAL_CLIENT.get().is_some() {
        return Err(Error::AlreadyInitialized);
    }

    let client = Client::new(write_key, options)?;

    /*
     * Lost a race with another `init`: the extra client shuts its own
     * workers down when dropped here.
     */
    GLOBAL_CLIENT
        .set(client)
        .map_err(|_| Error::AlreadyInitialized)?;

    GLOBAL_CLIENT.get().ok_or(Error::AlreadyInitialized)
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/**
 * Configuration for a `Client`.
 *
 * # Example
 * ```ignore
 * use std::sync::Arc;
 *
 * let client = analytics_core::Client::new("WRITE_KEY", analytics_core::Options {
 *     batch_size: 50,
 *     on_error: Some(Arc::new(|status: u16, error: Option<&str>| {
 *         eprintln!("delivery failed: {status} {error:?}");
 *     })),
 *     ..Default::default()
 * })?;
 * ```
 */
#[derive(Clone)]
pub struct Options {
    /// Maximum events per request. Must be at least 1.
    pub batch_size: usize,

    /// Queue capacity. When full, `enqueue` drops new events.
    pub max_queue_size: usize,

    /// Number of dispatcher threads sharing the queue.
    pub workers: usize,

    /// Import endpoint used by the default HTTP transport.
    pub endpoint: String,

    /// How long an idle worker sleeps before checking the queue again.
    pub idle_interval: Duration,

    /// Upper bound on how long `flush()` blocks.
    pub flush_timeout: Duration,

    /// Invoked with `(status, error)` for every batch that failed delivery.
    pub on_error: Option<ErrorCallback>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
            workers: DEFAULT_WORKERS,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            idle_interval: DEFAULT_IDLE_INTERVAL,
            flush_timeout: DEFAULT_FLUSH_TIMEOUT,
            on_error: None,
        }
    }
}

impl Options {
    fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::invalid("batch_size must be at least 1"));
        }
        if self.max_queue_size == 0 {
            return Err(Error::invalid("max_queue_size must be at least 1"));
        }
        if self.workers == 0 {
            return Err(Error::invalid("workers must be at least 1"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Transport shared by all of a client's dispatchers.
pub type SharedTransport = Arc<dyn Transport<Event>>;

type ClientWorker = Worker<Event, ChannelQueue<Event>, SharedTransport>;

/// How often `flush()` re-checks the queue and the workers' batches.
const FLUSH_POLL_INTERVAL: Duration = Duration::from_millis(10);

pub struct Client {
    queue: Arc<ChannelQueue<Event>>,
    exit: ExitSignal,

    /*
     * Producers hold the read side across the exit check and the push;
     * `shutdown` takes the write side to set the signal. An accepted event
     * is therefore always in the queue before any worker sees the signal.
     */
    intake: RwLock<()>,

    workers: Vec<ClientWorker>,
    wake_cursor: AtomicUsize,
    flush_timeout: Duration,
}

impl Client {
    /// Creates a client posting to `options.endpoint` over HTTP.
    pub fn new(write_key: &str, options: Options) -> Result<Self> {
        let transport: SharedTransport = Arc::new(HttpTransport::new(options.endpoint.clone()));
        Self::with_transport(write_key, options, transport)
    }

    /**
     * Creates a client delivering through a caller-supplied transport.
     *
     * All dispatchers are built before any thread starts, so a bad option
     * never leaves half a client running.
     */
    pub fn with_transport(
        write_key: &str,
        options: Options,
        transport: SharedTransport,
    ) -> Result<Self> {
        let credential = Credential::new(write_key)?;
        options.validate()?;

        let queue: Arc<ChannelQueue<Event>> =
            Arc::new(ChannelQueue::bounded(options.max_queue_size));
        let exit = ExitSignal::new();

        let config = DispatcherConfig {
            batch_size: options.batch_size,
            on_error: options.on_error.clone(),
        };

        let dispatchers = (0..options.workers)
            .map(|_| {
                Dispatcher::new(
                    Arc::clone(&queue),
                    credential.clone(),
                    Arc::clone(&transport),
                    config.clone(),
                )
            })
            .collect::<Result<Vec<_>>>()?;

        let mut workers = Vec::with_capacity(dispatchers.len());
        for (index, dispatcher) in dispatchers.into_iter().enumerate() {
            let spawned = Worker::spawn(
                format!("analytics-worker-{index}"),
                dispatcher,
                exit.clone(),
                options.idle_interval,
            );

            match spawned {
                Ok(worker) => workers.push(worker),
                Err(err) => {
                    exit.set();
                    for worker in &workers {
                        worker.wake();
                        worker.join();
                    }
                    return Err(err);
                }
            }
        }

        info!(
            workers = workers.len(),
            batch_size = options.batch_size,
            max_queue_size = options.max_queue_size,
            "analytics client started"
        );

        Ok(Self {
            queue,
            exit,
            intake: RwLock::new(()),
            workers,
            wake_cursor: AtomicUsize::new(0),
            flush_timeout: options.flush_timeout,
        })
    }

    /**
     * Queues an event for delivery without blocking.
     *
     * # Returns
     * `false` when the event was dropped because the queue is full or the
     * client has shut down.
     */
    pub fn enqueue(&self, event: Event) -> bool {
        {
            let _open = self.intake.read().unwrap_or_else(PoisonError::into_inner);

            if self.exit.is_set() {
                warn!(kind = event.kind(), "client has shut down, dropping event");
                return false;
            }

            if let Err(event) = self.queue.try_push(event) {
                warn!(kind = event.kind(), "event queue is full, dropping event");
                return false;
            }
        }

        self.next_worker().wake();
        true
    }

    /// Number of events waiting in the queue, not counting in-memory batches.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Whether any dispatcher currently holds an unsent batch.
    pub fn is_requesting(&self) -> bool {
        self.workers.iter().any(Worker::is_requesting)
    }

    /**
     * Blocks until the queue is empty and no dispatcher holds a batch, or
     * until the flush timeout elapses.
     *
     * # Returns
     * `true` if everything settled in time.
     */
    pub fn flush(&self) -> bool {
        let deadline = Instant::now() + self.flush_timeout;
        self.wake_workers();

        loop {
            if self.queue.is_empty() && !self.is_requesting() {
                return true;
            }
            if Instant::now() >= deadline {
                warn!(queued = self.queued(), "flush timed out");
                return false;
            }
            thread::sleep(FLUSH_POLL_INTERVAL);
        }
    }

    /**
     * Stops all workers after their terminal drain. Idempotent.
     *
     * Events enqueued before this call are sent in the workers' final
     * batches; later `enqueue` calls are rejected.
     */
    pub fn shutdown(&self) {
        {
            let _closed = self.intake.write().unwrap_or_else(PoisonError::into_inner);
            self.exit.set();
        }
        self.wake_workers();

        for worker in &self.workers {
            if !worker.join() {
                warn!(worker = worker.name(), "worker thread panicked");
            }
        }
        debug!("analytics client shut down");
    }

    /// Round-robin pick; `workers` is never empty.
    fn next_worker(&self) -> &ClientWorker {
        let index = self.wake_cursor.fetch_add(1, Ordering::Relaxed) % self.workers.len();
        &self.workers[index]
    }

    fn wake_workers(&self) {
        for worker in &self.workers {
            worker.wake();
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Outcome;

    struct Accepting;

    impl Transport<Event> for Accepting {
        fn post(&self, _credential: &Credential, _batch: &[Event]) -> Outcome {
            Outcome::success()
        }
    }

    fn client(options: Options) -> Result<Client> {
        Client::with_transport("wk", options, Arc::new(Accepting))
    }

    #[test]
    fn test_default_options() {
        let options = Options::default();
        assert_eq!(options.batch_size, 100);
        assert_eq!(options.max_queue_size, 10_000);
        assert_eq!(options.workers, 1);
        assert_eq!(options.endpoint, DEFAULT_ENDPOINT);
        assert!(options.on_error.is_none());
    }

    #[test]
    fn test_invalid_options_rejected() {
        for options in [
            Options { batch_size: 0, ..Default::default() },
            Options { max_queue_size: 0, ..Default::default() },
            Options { workers: 0, ..Default::default() },
        ] {
            assert!(matches!(client(options), Err(Error::InvalidConfiguration(_))));
        }
    }

    #[test]
    fn test_empty_write_key_rejected() {
        let result = Client::with_transport("", Options::default(), Arc::new(Accepting));
        assert!(matches!(result, Err(Error::InvalidConfiguration(_))));
    }

    #[test]
    fn test_enqueue_after_shutdown_is_rejected() {
        let client = client(Options::default()).unwrap();
        client.shutdown();
        assert!(!client.enqueue(Event::new("track")));
        assert_eq!(client.queued(), 0);
    }

    #[test]
    fn test_enqueue_wakes_workers_in_turn() {
        let client = client(Options { workers: 3, ..Default::default() }).unwrap();

        let picked: Vec<&str> = (0..4).map(|_| client.next_worker().name()).collect();
        assert_eq!(
            picked,
            vec![
                "analytics-worker-0",
                "analytics-worker-1",
                "analytics-worker-2",
                "analytics-worker-0",
            ]
        );
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let client = client(Options { workers: 2, ..Default::default() }).unwrap();
        client.shutdown();
        client.shutdown();
    }
}
