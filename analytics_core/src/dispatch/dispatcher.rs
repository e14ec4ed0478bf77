/**
 * The batching dispatcher: drains a shared queue into bounded batches and
 * hands each batch to a transport.
 *
 * ```text
 *  ┌──────────────┐   push    ┌─────────┐  pop   ┌────────────┐  post   ┌───────────┐
 *  │  Producers   │ ────────► │  Queue  │ ─────► │ Dispatcher │ ──────► │ Transport │
 *  │ (any thread) │           └─────────┘        │  (batch)   │         └───────────┘
 *  └──────────────┘                              └────────────┘
 * ```
 *
 * One dispatcher runs on one thread. Its loop alternates between
 * *accumulate* (pop up to `batch_size` events into the batch) and
 * *dispatch* (post the batch, report a failure, clear the batch).
 *
 * Shutdown is cooperative: an `ExitSignal` is checked at the top of every
 * iteration. Once it is set the dispatcher drains the whole queue, ignoring
 * the cap, sends that last batch and terminates for good.
 *
 * The batch lock is held only while the batch is filled, copied, cleared or
 * inspected. It is never held across `Transport::post` or the error
 * callback.
 */
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use super::queue::Queue;
use crate::error::{Error, Result};
use crate::protocol::constants::DEFAULT_BATCH_SIZE;
use crate::protocol::credential::Credential;
use crate::transport::Transport;

/**
 * Called with `(status, error)` for every batch whose outcome is not the
 * success status. Runs synchronously on the dispatcher's thread, before
 * the failed batch is discarded.
 */
pub type ErrorCallback = Arc<dyn Fn(u16, Option<&str>) + Send + Sync>;

// ---------------------------------------------------------------------------
// ExitSignal
// ---------------------------------------------------------------------------

/**
 * Cooperative shutdown token.
 *
 * Two states only: not set (keep running) and set (drain, send, stop).
 * Clones share the same flag, so a controller keeps one clone and hands
 * the others to its dispatchers' `run()` calls.
 */
#[derive(Clone, Default)]
pub struct ExitSignal {
    flag: Arc<AtomicBool>,
}

impl ExitSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a graceful stop. There is no way to unset it.
    pub fn set(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Options recognized by `Dispatcher::new`.
#[derive(Clone)]
pub struct DispatcherConfig {
    /// Maximum events per batch during normal operation. Must be positive.
    pub batch_size: usize,

    /// Failure hook. `None` means failures are only logged.
    pub on_error: Option<ErrorCallback>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            on_error: None,
        }
    }
}

/// Why `run()` returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /**
     * The queue was empty while no exit was requested. No terminal drain
     * happened; the caller is expected to call `run()` again later.
     */
    Idle,

    /// The terminal drain-and-send completed. Further `run()` calls are no-ops.
    Terminated,
}

/// How far one accumulate step may fill the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fill {
    /// Stop at `batch_size`.
    Bounded,
    /// Take everything currently in the queue.
    Drain,
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

pub struct Dispatcher<E, Q, T> {
    queue: Arc<Q>,
    credential: Credential,
    transport: T,
    batch_size: usize,
    on_error: Option<ErrorCallback>,

    /// The in-memory batch. Only this dispatcher's thread fills or clears it.
    batch: Mutex<Vec<E>>,

    terminated: AtomicBool,
}

impl<E, Q, T> Dispatcher<E, Q, T>
where
    E: Clone,
    Q: Queue<E>,
    T: Transport<E>,
{
    /**
     * Creates a dispatcher with an empty batch.
     *
     * # Returns
     * `Err(Error::InvalidConfiguration)` when `batch_size` is zero.
     */
    pub fn new(
        queue: Arc<Q>,
        credential: Credential,
        transport: T,
        config: DispatcherConfig,
    ) -> Result<Self> {
        if config.batch_size == 0 {
            return Err(Error::invalid("batch_size must be at least 1"));
        }

        Ok(Self {
            queue,
            credential,
            transport,
            batch_size: config.batch_size,
            on_error: config.on_error,
            batch: Mutex::new(Vec::with_capacity(config.batch_size)),
            terminated: AtomicBool::new(false),
        })
    }

    /**
     * Runs the accumulate/dispatch loop on the calling thread.
     *
     * - While `exit` is not set: returns `Idle` as soon as the queue is
     *   found empty, otherwise fills one bounded batch and dispatches it.
     * - Once `exit` is seen set: drains the whole queue into one batch,
     *   dispatches it (even when empty) and returns `Terminated`.
     *
     * Returning `Idle` skips the terminal drain. Callers that want to keep
     * consuming must call `run()` again; a later call that observes `exit`
     * performs the drain.
     */
    pub fn run(&self, exit: &ExitSignal) -> RunOutcome {
        if self.is_terminated() {
            return RunOutcome::Terminated;
        }

        while !exit.is_set() {
            if self.queue.is_empty() {
                return RunOutcome::Idle;
            }

            self.accumulate(Fill::Bounded);
            self.dispatch();
        }

        self.accumulate(Fill::Drain);
        info!(size = self.batch().len(), "exit requested, sending final batch");
        self.dispatch();

        self.terminated.store(true, Ordering::Release);
        RunOutcome::Terminated
    }

    /**
     * Whether the in-memory batch currently holds any events.
     *
     * A point-in-time snapshot; says nothing about the queue.
     */
    pub fn is_requesting(&self) -> bool {
        !self.batch().is_empty()
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    fn accumulate(&self, fill: Fill) {
        let mut batch = self.batch();

        while fill == Fill::Drain || batch.len() < self.batch_size {
            if self.queue.is_empty() {
                break;
            }
            match self.queue.pop() {
                Some(event) => batch.push(event),
                None => break,
            }
        }
    }

    /**
     * Posts the current batch, reports a failed outcome, then clears the
     * batch whatever happened. Empty batches are posted too.
     */
    fn dispatch(&self) {
        let events = self.batch().clone();
        let size = events.len();

        let outcome = self.transport.post(&self.credential, &events);

        if outcome.is_success() {
            debug!(size, status = outcome.status, "batch delivered");
        } else {
            warn!(
                size,
                status = outcome.status,
                error = outcome.error.as_deref().unwrap_or_default(),
                "batch delivery failed, dropping"
            );
            if let Some(on_error) = &self.on_error {
                on_error(outcome.status, outcome.error.as_deref());
            }
        }

        self.batch().clear();
    }

    fn batch(&self) -> MutexGuard<'_, Vec<E>> {
        self.batch.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
