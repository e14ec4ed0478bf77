/*!
 * The process-wide `init` / `track` / `flush` API and its `Guard`.
 *
 * The global client lives in a `OnceLock`, so the whole lifecycle is one
 * test in its own binary. The endpoint is a closed localhost port: every
 * post fails fast with status 0 and is reported through `on_error`.
 */
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use analytics_core::{Error, Event, Options, NO_RESPONSE_STATUS};

fn closed_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    format!("http://127.0.0.1:{port}/v1/import")
}

#[test]
fn test_global_lifecycle() {
    /* nothing installed yet */
    assert!(!analytics_core::track(Event::new("track")));
    assert!(analytics_core::flush());

    let rejected = analytics_core::init("", Options::default());
    assert!(matches!(rejected, Err(Error::InvalidConfiguration(_))));

    let statuses = Arc::new(Mutex::new(Vec::new()));
    let sink = statuses.clone();
    let options = Options {
        endpoint: closed_endpoint(),
        flush_timeout: Duration::from_secs(10),
        on_error: Some(Arc::new(move |status: u16, _error: Option<&str>| {
            sink.lock().unwrap().push(status);
        })),
        ..Default::default()
    };

    let guard = analytics_core::init("write-key", options).unwrap();
    assert!(matches!(
        analytics_core::init("write-key", Options::default()),
        Err(Error::AlreadyInitialized)
    ));

    for n in 0..3 {
        assert!(analytics_core::track(Event::new("track").with("n", n)));
    }

    drop(guard);

    /* flushed before shutdown: every batch was attempted and reported */
    let statuses = statuses.lock().unwrap().clone();
    assert!(!statuses.is_empty());
    assert!(statuses.iter().all(|&status| status == NO_RESPONSE_STATUS));

    /* shut down: new events are refused, nothing is pending */
    assert!(!analytics_core::track(Event::new("track")));
    assert!(analytics_core::flush());
}
