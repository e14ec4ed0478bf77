/**
 * Background thread hosting one dispatcher.
 *
 * `Dispatcher::run` returns `Idle` whenever it finds the queue empty, so
 * the worker keeps calling it, parking in between. A push to the queue or
 * a shutdown request unparks the thread early; otherwise it wakes after
 * `idle_interval` and polls again.
 *
 * Once the exit signal is set the next `run()` performs the terminal
 * drain-and-send, returns `Terminated`, and the thread ends.
 */
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle, Thread};
use std::time::Duration;

use tracing::{debug, error};

use super::dispatcher::{Dispatcher, ExitSignal, RunOutcome};
use super::queue::Queue;
use crate::error::Result;
use crate::transport::Transport;

/**
 * Handle to a running dispatcher thread.
 *
 * All methods take `&self` so a controller can share its workers between
 * producers (`wake`), flushers (`is_requesting`) and shutdown (`join`).
 */
pub struct Worker<E, Q, T> {
    dispatcher: Arc<Dispatcher<E, Q, T>>,
    thread: Thread,

    /// Taken by the first `join()`.
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl<E, Q, T> Worker<E, Q, T>
where
    E: Clone + Send + 'static,
    Q: Queue<E> + 'static,
    T: Transport<E> + 'static,
{
    /**
     * Moves `dispatcher` onto a new named thread and starts its loop.
     *
     * # Returns
     * `Err(Error::Spawn)` if the OS refused to create the thread.
     */
    pub fn spawn(
        name: String,
        dispatcher: Dispatcher<E, Q, T>,
        exit: ExitSignal,
        idle_interval: Duration,
    ) -> Result<Self> {
        let dispatcher = Arc::new(dispatcher);
        let hosted = Arc::clone(&dispatcher);

        let handle = thread::Builder::new().name(name).spawn(move || {
            /*
             * A panic inside the transport or the error callback is outside
             * the delivery contract. It ends this dispatcher; log it rather
             * than dying silently.
             */
            let result = catch_unwind(AssertUnwindSafe(|| {
                Self::run_loop(&hosted, &exit, idle_interval);
            }));

            if result.is_err() {
                error!("dispatcher thread panicked, its pending events are lost");
            }
        })?;

        Ok(Self {
            dispatcher,
            thread: handle.thread().clone(),
            handle: Mutex::new(Some(handle)),
        })
    }

    fn run_loop(dispatcher: &Dispatcher<E, Q, T>, exit: &ExitSignal, idle_interval: Duration) {
        while dispatcher.run(exit) == RunOutcome::Idle {
            thread::park_timeout(idle_interval);
        }
        debug!("dispatcher terminated");
    }

    pub fn is_requesting(&self) -> bool {
        self.dispatcher.is_requesting()
    }

    pub fn name(&self) -> &str {
        self.thread.name().unwrap_or("<unnamed>")
    }

    /// Cuts the current idle park short.
    pub fn wake(&self) {
        self.thread.unpark();
    }

    /**
     * Waits for the thread to finish. Later calls return immediately.
     *
     * # Returns
     * `false` if the thread panicked outside the caught loop.
     */
    pub fn join(&self) -> bool {
        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match handle {
            Some(handle) => handle.join().is_ok(),
            None => true,
        }
    }
}
