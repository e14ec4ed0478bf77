/**
 * Minimal harness for the analytics SDK.
 *
 * Set `ANALYTICS_WRITE_KEY` to a real write key, then run:
 *
 *   cargo run -p analytics_demo
 *   cargo run -p analytics_demo -- --burst        # enqueue 1 000 events
 *   RUST_LOG=analytics_core=debug cargo run -p analytics_demo
 */
use std::sync::Arc;

use analytics_core::{Event, Options};
use serde_json::json;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const PLACEHOLDER_KEY: &str = "PASTE_YOUR_WRITE_KEY_HERE";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let burst = std::env::args().any(|a| a == "--burst");
    let write_key =
        std::env::var("ANALYTICS_WRITE_KEY").unwrap_or_else(|_| PLACEHOLDER_KEY.to_string());

    let options = Options {
        batch_size: 50,
        on_error: Some(Arc::new(|status: u16, error: Option<&str>| {
            error!(status, error = error.unwrap_or_default(), "batch dropped");
        })),
        ..Default::default()
    };

    let _guard = match analytics_core::init(&write_key, options) {
        Ok(guard) => guard,
        Err(err) => {
            error!(%err, "could not start analytics");
            return;
        }
    };

    analytics_core::track(
        Event::new("identify")
            .with("userId", "demo-user")
            .with("traits", json!({ "plan": "free" })),
    );

    let count = if burst { 1_000 } else { 3 };
    for n in 0..count {
        analytics_core::track(
            Event::new("track")
                .with("userId", "demo-user")
                .with("event", "Demo Event")
                .with("sequence", n),
        );
    }
    info!(count, "events tracked");

    if !analytics_core::flush() {
        info!("flush timed out, the guard will send the rest on exit");
    }

    info!("done, remaining events are sent when _guard drops");
}
