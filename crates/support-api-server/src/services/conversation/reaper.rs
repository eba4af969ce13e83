use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::store::SessionStore;

/// Recurring task that evicts idle sessions from the store.
///
/// Owned and spawned by `main`; the sweep interval and the idle timeout are
/// independent, so a session can survive up to `timeout + interval` before
/// eviction.
pub struct SessionReaper {
    store: Arc<SessionStore>,
    sweep_interval: Duration,
    idle_timeout_seconds: i64,
}

impl SessionReaper {
    pub fn new(store: Arc<SessionStore>, sweep_interval: Duration, idle_timeout_seconds: i64) -> Self {
        Self {
            store,
            sweep_interval,
            idle_timeout_seconds,
        }
    }

    pub async fn run(self) {
        info!(
            "Session reaper running: interval={:?}, idle_timeout={}s",
            self.sweep_interval, self.idle_timeout_seconds
        );
        let mut ticker = tokio::time::interval(self.sweep_interval);
        // The first tick fires immediately; an empty sweep at startup is harmless.
        loop {
            ticker.tick().await;
            let removed = self.store.sweep(Utc::now(), self.idle_timeout_seconds);
            if removed > 0 {
                info!("Reaper evicted {} idle session(s)", removed);
            } else {
                debug!("Reaper sweep found no idle sessions");
            }
        }
    }
}
