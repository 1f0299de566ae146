//! Per-panel fixed-window request throttle.
//!
//! N requests per one-second window, keyed by panel id. When a window's
//! quota is exhausted, `acquire` blocks until the window resets instead of
//! failing: a little latency is cheaper than tripping the upstream panel's
//! own throttling. Shared mutable state guarded by a mutex; not safe
//! across multiple process instances.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const WINDOW: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    used: u32,
}

pub struct PanelThrottle {
    quota: u32,
    windows: Mutex<HashMap<String, Window>>,
}

impl PanelThrottle {
    /// `quota` requests per panel per one-second window (must be > 0).
    pub fn new(quota: u32) -> Self {
        Self {
            quota: quota.max(1),
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Claim one request slot for `panel_id`, sleeping through window
    /// resets until one is available.
    pub async fn acquire(&self, panel_id: &str) {
        loop {
            let wait = {
                let mut windows = self.windows.lock().expect("throttle lock poisoned");
                let now = Instant::now();
                let window = windows.entry(panel_id.to_string()).or_insert(Window {
                    started: now,
                    used: 0,
                });

                if now.duration_since(window.started) >= WINDOW {
                    window.started = now;
                    window.used = 0;
                }

                if window.used < self.quota {
                    window.used += 1;
                    None
                } else {
                    Some(WINDOW - now.duration_since(window.started))
                }
            };

            match wait {
                None => return,
                Some(d) => tokio::time::sleep(d).await,
            }
        }
    }
}
