/*!
 * Behaviour of a single `Dispatcher` (and several sharing one queue),
 * driven directly with a crossbeam channel as the queue and a scripted
 * transport that records every batch it receives.
 */
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::thread;

use analytics_core::{
    Credential, Dispatcher, DispatcherConfig, ErrorCallback, ExitSignal, Outcome, RunOutcome,
    Transport,
};
use crossbeam_channel::{unbounded, Receiver, Sender};

/// Answers from a script (then success) and records every batch.
struct Scripted {
    script: Mutex<VecDeque<Outcome>>,
    sent: Mutex<Vec<Vec<String>>>,
}

impl Scripted {
    fn new(script: Vec<Outcome>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            sent: Mutex::new(Vec::new()),
        })
    }

    fn sent(&self) -> Vec<Vec<String>> {
        self.sent.lock().unwrap().clone()
    }
}

impl Transport<String> for Scripted {
    fn post(&self, _credential: &Credential, batch: &[String]) -> Outcome {
        self.sent.lock().unwrap().push(batch.to_vec());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(Outcome::success)
    }
}

/// Collects every `(status, error)` the dispatcher reports.
fn recording_callback() -> (ErrorCallback, Arc<Mutex<Vec<(u16, Option<String>)>>>) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let sink = calls.clone();
    let callback: ErrorCallback = Arc::new(move |status: u16, error: Option<&str>| {
        sink.lock()
            .unwrap()
            .push((status, error.map(str::to_string)));
    });
    (callback, calls)
}

type TestDispatcher = Dispatcher<String, Receiver<String>, Arc<Scripted>>;

fn dispatcher(
    batch_size: usize,
    transport: Arc<Scripted>,
    on_error: Option<ErrorCallback>,
) -> (Sender<String>, TestDispatcher) {
    let (tx, rx) = unbounded();
    let dispatcher = Dispatcher::new(
        Arc::new(rx),
        Credential::new("write-key").unwrap(),
        transport,
        DispatcherConfig {
            batch_size,
            on_error,
        },
    )
    .unwrap();
    (tx, dispatcher)
}

fn enqueue(tx: &Sender<String>, events: &[&str]) {
    for event in events {
        tx.send(event.to_string()).unwrap();
    }
}

fn batch(events: &[&str]) -> Vec<String> {
    events.iter().map(|e| e.to_string()).collect()
}

/**
 * Cap 2, queue [A, B, C], no exit: two posts, then `run` returns on the
 * empty queue without a terminal drain.
 */
#[test]
fn test_normal_drain_splits_at_cap() {
    let transport = Scripted::new(vec![]);
    let (tx, dispatcher) = dispatcher(2, transport.clone(), None);
    enqueue(&tx, &["A", "B", "C"]);

    let outcome = dispatcher.run(&ExitSignal::new());

    assert_eq!(outcome, RunOutcome::Idle);
    assert_eq!(transport.sent(), vec![batch(&["A", "B"]), batch(&["C"])]);
    assert!(!dispatcher.is_terminated());
    assert!(!dispatcher.is_requesting());
}

/**
 * A 500 is reported once through the callback, the batch is dropped and
 * the event is never posted again.
 */
#[test]
fn test_failure_reported_once_without_retry() {
    let transport = Scripted::new(vec![Outcome::failure(500, "timeout")]);
    let (callback, calls) = recording_callback();
    let (tx, dispatcher) = dispatcher(10, transport.clone(), Some(callback));
    enqueue(&tx, &["X"]);

    assert_eq!(dispatcher.run(&ExitSignal::new()), RunOutcome::Idle);

    assert_eq!(*calls.lock().unwrap(), vec![(500, Some("timeout".to_string()))]);
    assert!(!dispatcher.is_requesting());

    assert_eq!(dispatcher.run(&ExitSignal::new()), RunOutcome::Idle);
    assert_eq!(transport.sent(), vec![batch(&["X"])]);
}

/**
 * Exit already set on entry: the bounded loop is skipped, everything is
 * drained into one batch, posted, and the dispatcher terminates.
 */
#[test]
fn test_exit_before_run_drains_once() {
    let transport = Scripted::new(vec![]);
    let (tx, dispatcher) = dispatcher(10, transport.clone(), None);
    enqueue(&tx, &["P"]);

    let exit = ExitSignal::new();
    exit.set();

    assert_eq!(dispatcher.run(&exit), RunOutcome::Terminated);
    assert_eq!(transport.sent(), vec![batch(&["P"])]);
    assert!(dispatcher.is_terminated());
}

/**
 * The terminal drain is not bound by the cap.
 */
#[test]
fn test_terminal_drain_ignores_cap() {
    let transport = Scripted::new(vec![]);
    let (tx, dispatcher) = dispatcher(2, transport.clone(), None);
    enqueue(&tx, &["a", "b", "c", "d", "e"]);

    let exit = ExitSignal::new();
    exit.set();
    dispatcher.run(&exit);

    assert_eq!(transport.sent(), vec![batch(&["a", "b", "c", "d", "e"])]);
}

/**
 * An idle return followed by an exit request: the next `run` posts the
 * (empty) final batch and terminates.
 */
#[test]
fn test_idle_then_exit_sends_final_batch() {
    let transport = Scripted::new(vec![]);
    let (_tx, dispatcher) = dispatcher(5, transport.clone(), None);
    let exit = ExitSignal::new();

    assert_eq!(dispatcher.run(&exit), RunOutcome::Idle);
    assert!(transport.sent().is_empty());

    exit.set();
    assert_eq!(dispatcher.run(&exit), RunOutcome::Terminated);
    assert_eq!(transport.sent(), vec![Vec::<String>::new()]);
}

/**
 * Every event is posted exactly once, in enqueue order, in batches no
 * larger than the cap.
 */
#[test]
fn test_events_delivered_in_order_within_cap() {
    for (count, cap) in [(1usize, 1usize), (7, 3), (10, 5), (23, 4), (100, 100)] {
        let transport = Scripted::new(vec![]);
        let (tx, dispatcher) = dispatcher(cap, transport.clone(), None);
        let events: Vec<String> = (0..count).map(|n| format!("e{n}")).collect();
        for event in &events {
            tx.send(event.clone()).unwrap();
        }

        assert_eq!(dispatcher.run(&ExitSignal::new()), RunOutcome::Idle);

        let sent = transport.sent();
        assert!(sent.iter().all(|b| !b.is_empty() && b.len() <= cap));
        assert_eq!(sent.len(), count.div_ceil(cap));
        assert_eq!(sent.concat(), events);
    }
}

/**
 * The callback fires only for the failed posts, with their own status.
 */
#[test]
fn test_callback_only_for_failures() {
    let transport = Scripted::new(vec![
        Outcome::success(),
        Outcome::failure(500, "internal"),
        Outcome::success(),
        Outcome::failure(429, "rate limited"),
        Outcome::failure(201, "unexpected"),
    ]);
    let (callback, calls) = recording_callback();
    let (tx, dispatcher) = dispatcher(1, transport.clone(), Some(callback));
    enqueue(&tx, &["1", "2", "3", "4", "5"]);

    dispatcher.run(&ExitSignal::new());

    assert_eq!(transport.sent().len(), 5);
    assert_eq!(
        *calls.lock().unwrap(),
        vec![
            (500, Some("internal".to_string())),
            (429, Some("rate limited".to_string())),
            (201, Some("unexpected".to_string())),
        ]
    );
}

#[test]
fn test_is_requesting_is_stable_between_steps() {
    let transport = Scripted::new(vec![]);
    let (tx, dispatcher) = dispatcher(3, transport, None);

    assert!(!dispatcher.is_requesting());
    assert!(!dispatcher.is_requesting());

    enqueue(&tx, &["a"]);
    assert!(!dispatcher.is_requesting());

    dispatcher.run(&ExitSignal::new());
    assert!(!dispatcher.is_requesting());
    assert!(!dispatcher.is_requesting());
}

/**
 * Two dispatchers racing on one queue: no event is lost or duplicated.
 */
#[test]
fn test_shared_queue_delivers_each_event_once() {
    let (tx, rx) = unbounded();
    let queue = Arc::new(rx);
    let transport = Scripted::new(vec![]);

    let dispatchers: Vec<Arc<TestDispatcher>> = (0..2)
        .map(|_| {
            Arc::new(
                Dispatcher::new(
                    Arc::clone(&queue),
                    Credential::new("write-key").unwrap(),
                    transport.clone(),
                    DispatcherConfig {
                        batch_size: 7,
                        on_error: None,
                    },
                )
                .unwrap(),
            )
        })
        .collect();

    let events: Vec<String> = (0..500).map(|n| format!("{n:04}")).collect();
    for event in &events {
        tx.send(event.clone()).unwrap();
    }

    let exit = ExitSignal::new();
    let handles: Vec<_> = dispatchers
        .iter()
        .map(|d| {
            let d = Arc::clone(d);
            let exit = exit.clone();
            thread::spawn(move || d.run(&exit))
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), RunOutcome::Idle);
    }

    let sent = transport.sent();
    assert!(sent.iter().all(|b| b.len() <= 7));

    let mut delivered = sent.concat();
    delivered.sort();
    assert_eq!(delivered, events);
}
