//! Request pacing shared by every clone of a client.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tokio::time::sleep;

/// Enforces a minimum interval between consecutive requests to one service.
///
/// Clones share the same clock, so concurrent ticket fetches through cloned
/// clients are still spaced out by `cooldown`.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    cooldown: Duration,
    last_call: Arc<Mutex<Option<Instant>>>,
}

impl RateLimiter {
    /// A zero `cooldown` disables pacing.
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_call: Arc::new(Mutex::new(None)),
        }
    }

    /// Waits until the cooldown since the previous request has elapsed.
    pub async fn wait_turn(&self) {
        if self.cooldown.is_zero() {
            return;
        }
        let mut guard = self.last_call.lock().await;
        if let Some(last) = *guard {
            let elapsed = last.elapsed();
            if elapsed < self.cooldown {
                sleep(self.cooldown - elapsed).await;
            }
        }
        *guard = Some(Instant::now());
    }
}
