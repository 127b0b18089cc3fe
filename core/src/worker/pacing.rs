//! Fixed inter-round pacing

use std::time::Duration;

/// Delay between a worker's rounds
pub const DEFAULT_ROUND_DELAY: Duration = Duration::from_millis(100);

/// Delay used above [`HIGH_CONCURRENCY_THRESHOLD`] workers
pub const HIGH_CONCURRENCY_ROUND_DELAY: Duration = Duration::from_millis(500);

/// Worker count above which the longer delay applies
pub const HIGH_CONCURRENCY_THRESHOLD: usize = 10;

/// Sleeps a fixed delay after each round
///
/// Not a rate limiter: there is no token bucket and no catch-up, each worker
/// simply pauses between rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundPacer {
    delay: Duration,
}

impl RoundPacer {
    /// Create a pacer with an explicit delay
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Pacer that never sleeps
    pub fn unpaced() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Pick the delay for a pool size, honoring an explicit override
    ///
    /// # Examples
    /// ```
    /// use proxy_bench_core::worker::RoundPacer;
    /// use std::time::Duration;
    ///
    /// assert_eq!(RoundPacer::for_concurrency(4, None).delay(), Duration::from_millis(100));
    /// assert_eq!(RoundPacer::for_concurrency(32, None).delay(), Duration::from_millis(500));
    /// assert_eq!(RoundPacer::for_concurrency(32, Some(0)).delay(), Duration::ZERO);
    /// ```
    pub fn for_concurrency(concurrency: usize, override_ms: Option<u64>) -> Self {
        match override_ms {
            Some(ms) => Self::new(Duration::from_millis(ms)),
            None if concurrency > HIGH_CONCURRENCY_THRESHOLD => {
                Self::new(HIGH_CONCURRENCY_ROUND_DELAY)
            }
            None => Self::new(DEFAULT_ROUND_DELAY),
        }
    }

    /// Configured delay
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Whether the pacer sleeps at all
    pub fn is_enabled(&self) -> bool {
        !self.delay.is_zero()
    }

    /// Sleep for the configured delay
    pub async fn wait(&self) {
        if self.is_enabled() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

impl Default for RoundPacer {
    fn default() -> Self {
        Self::new(DEFAULT_ROUND_DELAY)
    }
}
