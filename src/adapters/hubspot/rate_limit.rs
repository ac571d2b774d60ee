//! Request spacing
//!
//! A single-slot limiter: each dispatch waits until `min_interval` has passed
//! since the previous dispatch. This approximates "N requests per period"
//! without a sliding window. State is per client; concurrent clients do not
//! coordinate.

use std::time::Duration;
use tokio::time::Instant;

/// Enforces a minimum interval between request dispatches
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_dispatch: Option<Instant>,
}

impl RateLimiter {
    /// Create a limiter with the given floor between dispatches
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_dispatch: None,
        }
    }

    /// Minimum spacing enforced by this limiter
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait for the floor to elapse, then record a dispatch
    ///
    /// Returns how long the caller was held back.
    pub async fn acquire(&mut self) -> Duration {
        let mut waited = Duration::ZERO;

        if let Some(last) = self.last_dispatch {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                waited = self.min_interval - elapsed;
                tracing::debug!(
                    sleep_ms = waited.as_secs_f64() * 1000.0,
                    "Rate limiting: waiting before next request"
                );
                tokio::time::sleep(waited).await;
            }
        }

        self.last_dispatch = Some(Instant::now());
        waited
    }
}
