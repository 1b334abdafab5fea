//! Pacing between annotation calls
//!
//! The builder awaits [`Pacer::pace`] before every table. No pacer delays the
//! first call.

use async_trait::async_trait;
use nlsql_core::{PacingConfig, PacingStrategy};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[async_trait]
pub trait Pacer: Send + Sync {
    /// Wait until the next call may start
    async fn pace(&self);
}

/// Build the pacer described by the configuration
pub fn from_config(config: &PacingConfig) -> Arc<dyn Pacer> {
    match config.strategy {
        PacingStrategy::None => Arc::new(NoPacing),
        PacingStrategy::FixedInterval => Arc::new(FixedIntervalPacer::new(config.interval())),
        PacingStrategy::TokenBucket => Arc::new(TokenBucketPacer::new(config.capacity, config.interval())),
    }
}

/// Never waits
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPacing;

#[async_trait]
impl Pacer for NoPacing {
    async fn pace(&self) {}
}

/// Starts consecutive calls at least `interval` apart
#[derive(Debug)]
pub struct FixedIntervalPacer {
    interval: Duration,
    next_start: Mutex<Option<Instant>>,
}

impl FixedIntervalPacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_start: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

#[async_trait]
impl Pacer for FixedIntervalPacer {
    async fn pace(&self) {
        let mut next_start = self.next_start.lock().await;
        if let Some(at) = *next_start {
            tokio::time::sleep_until(at).await;
        }
        *next_start = Some(Instant::now() + self.interval);
    }
}

/// Token bucket: bursts of up to `capacity` calls, one token back per
/// `refill_interval`
#[derive(Debug)]
pub struct TokenBucketPacer {
    capacity: u32,
    refill_interval: Duration,
    bucket: Mutex<Bucket>,
}

#[derive(Debug)]
struct Bucket {
    tokens: u32,
    last_refill: Instant,
}

impl TokenBucketPacer {
    /// A zero capacity is treated as one
    pub fn new(capacity: u32, refill_interval: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            refill_interval,
            bucket: Mutex::new(Bucket {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    fn refill(&self, bucket: &mut Bucket, now: Instant) {
        let missing = self.capacity - bucket.tokens;
        if missing == 0 {
            bucket.last_refill = now;
            return;
        }

        let interval = self.refill_interval.as_nanos().max(1);
        let elapsed = now.saturating_duration_since(bucket.last_refill).as_nanos();
        let ticks = (elapsed / interval).min(u128::from(missing)) as u32;

        bucket.tokens += ticks;
        if bucket.tokens == self.capacity {
            bucket.last_refill = now;
        } else {
            bucket.last_refill += self.refill_interval * ticks;
        }
    }
}

#[async_trait]
impl Pacer for TokenBucketPacer {
    async fn pace(&self) {
        let mut bucket = self.bucket.lock().await;
        self.refill(&mut bucket, Instant::now());

        if bucket.tokens == 0 {
            let ready_at = bucket.last_refill + self.refill_interval;
            tokio::time::sleep_until(ready_at).await;
            // The token that arrived is spent on this call
            bucket.last_refill = ready_at;
            return;
        }

        bucket.tokens -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn elapsed_for<P: Pacer>(pacer: &P, calls: usize) -> Vec<Duration> {
        let start = Instant::now();
        let mut marks = Vec::new();
        for _ in 0..calls {
            pacer.pace().await;
            marks.push(start.elapsed());
        }
        marks
    }

    #[tokio::test(start_paused = true)]
    async fn no_pacing_never_waits() {
        let marks = elapsed_for(&NoPacing, 3).await;
        assert!(marks.iter().all(|d| *d == Duration::ZERO));
    }

    #[tokio::test(start_paused = true)]
    async fn fixed_interval_spaces_calls() {
        let pacer = FixedIntervalPacer::new(Duration::from_secs(5));
        let marks = elapsed_for(&pacer, 3).await;
        assert_eq!(
            marks,
            vec![Duration::ZERO, Duration::from_secs(5), Duration::from_secs(10)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn fixed_interval_does_not_wait_after_slow_work() {
        let pacer = FixedIntervalPacer::new(Duration::from_secs(5));
        pacer.pace().await;
        tokio::time::sleep(Duration::from_secs(7)).await;

        let before = Instant::now();
        pacer.pace().await;
        assert_eq!(before.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn token_bucket_allows_burst_then_waits() {
        let pacer = TokenBucketPacer::new(2, Duration::from_secs(10));
        let marks = elapsed_for(&pacer, 4).await;
        assert_eq!(
            marks,
            vec![
                Duration::ZERO,
                Duration::ZERO,
                Duration::from_secs(10),
                Duration::from_secs(20),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn token_bucket_refills_while_idle() {
        let pacer = TokenBucketPacer::new(2, Duration::from_secs(10));
        elapsed_for(&pacer, 2).await;
        tokio::time::sleep(Duration::from_secs(25)).await;

        let marks = elapsed_for(&pacer, 3).await;
        assert_eq!(
            marks,
            vec![Duration::ZERO, Duration::ZERO, Duration::from_secs(10)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn from_config_picks_strategy() {
        let config = PacingConfig {
            strategy: PacingStrategy::FixedInterval,
            interval_ms: 1000,
            capacity: 1,
        };
        let pacer = from_config(&config);
        let start = Instant::now();
        pacer.pace().await;
        pacer.pace().await;
        assert_eq!(start.elapsed(), Duration::from_secs(1));

        let none = from_config(&PacingConfig {
            strategy: PacingStrategy::None,
            ..config
        });
        let start = Instant::now();
        none.pace().await;
        none.pace().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
