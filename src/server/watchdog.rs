// Holler — Idle watchdog
//
// Bounds the lifetime of a broker that a caller spawned on demand and then
// stopped using. Nothing here blocks on the store beyond its short critical
// section; the watchdog only observes and, eventually, signals.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::store::RequestStore;

/// How often the watchdog looks at the store.
pub const WATCHDOG_INTERVAL: Duration = Duration::from_secs(30);

/// Poll the store on a fixed tick. Once nothing has been pending for longer
/// than `idle_timeout`, fire the shutdown channel and exit the loop.
pub async fn run(store: Arc<RequestStore>, idle_timeout: Duration, shutdown: mpsc::Sender<()>) {
    watch(store, idle_timeout, WATCHDOG_INTERVAL, shutdown).await;
}

async fn watch(
    store: Arc<RequestStore>,
    idle_timeout: Duration,
    tick: Duration,
    shutdown: mpsc::Sender<()>,
) {
    let mut last_active = Instant::now();
    loop {
        tokio::time::sleep(tick).await;
        if store.has_pending() {
            last_active = Instant::now();
        } else if last_active.elapsed() > idle_timeout {
            tracing::info!(idle_secs = idle_timeout.as_secs(), "idle timeout, stopping broker");
            let _ = shutdown.send(()).await;
            return;
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
