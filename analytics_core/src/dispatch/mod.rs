/*!
 * Dispatch layer: moving events from the shared queue to the transport.
 *
 * - `queue`: the consumer-side `Queue` trait and the bounded `ChannelQueue`
 * - `dispatcher`: batching loop, `ExitSignal`, error callback
 * - `worker`: the named thread that hosts one dispatcher
 */

pub mod dispatcher;
pub mod queue;
pub mod worker;

pub use dispatcher::{Dispatcher, DispatcherConfig, ErrorCallback, ExitSignal, RunOutcome};
pub use queue::{ChannelQueue, Queue};
pub use worker::Worker;
