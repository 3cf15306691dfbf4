//! Process-wide token-bucket throttle.
//!
//! Every inbound request calls [`RateLimiter::wait`] before any other
//! processing, bounding overall throughput to the configured rate. The
//! bucket holds a burst capacity of one token: the first caller proceeds
//! immediately, each subsequent caller is granted a token one refill
//! interval after the previous grant, in reservation order.
//!
//! This is the only cross-request mutable state in the process. The bucket
//! itself is a mutex-guarded instant; the waiting happens outside the lock
//! on the tokio timer, so holding N waiters costs N sleeping tasks and
//! nothing else.

use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

/// Refill interval used when the configured rate is too small to represent.
/// A year between tokens is indistinguishable from never.
const MAX_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// The throttle wait was interrupted by shutdown before a token was granted.
#[derive(Debug, thiserror::Error)]
#[error("throttle wait interrupted by shutdown")]
pub struct Cancelled;

/// Token bucket with burst capacity 1, refilling at the configured rate.
pub struct RateLimiter {
    interval: Duration,
    state: Mutex<BucketState>,
}

#[derive(Debug)]
struct BucketState {
    /// Instant at which the next token becomes free to reserve.
    next_free: Instant,
}

impl RateLimiter {
    /// Create a limiter granting `rps` tokens per second.
    ///
    /// The caller validates `rps > 0` (see `run::execute`); any positive
    /// rate, arbitrarily small or large, is accepted here.
    #[must_use]
    pub fn new(rps: f64) -> Self {
        let interval = Duration::try_from_secs_f64(1.0 / rps).unwrap_or(MAX_INTERVAL);
        Self {
            interval,
            state: Mutex::new(BucketState {
                next_free: Instant::now(),
            }),
        }
    }

    /// Block until a token is granted, or until `cancel` signals shutdown.
    ///
    /// Tokens are handed out in reservation order. A cancelled (or dropped)
    /// wait returns its unused reservation when it is still the newest one,
    /// so abandoned requests do not permanently burn throughput.
    pub async fn wait(&self, cancel: &mut watch::Receiver<bool>) -> Result<(), Cancelled> {
        let permit = self.reserve();
        let grant_at = permit.grant_at;
        if grant_at <= Instant::now() {
            permit.commit();
            return Ok(());
        }
        tokio::select! {
            () = tokio::time::sleep_until(grant_at) => {
                permit.commit();
                Ok(())
            }
            // Fires on shutdown signal or on the sender going away.
            _ = cancel.changed() => Err(Cancelled),
        }
    }

    fn reserve(&self) -> Permit<'_> {
        let now = Instant::now();
        let mut state = self.state.lock().expect("throttle state poisoned");
        let grant_at = state.next_free.max(now);
        state.next_free = grant_at + self.interval;
        Permit {
            limiter: self,
            grant_at,
            committed: false,
        }
    }
}

/// A reserved slot in the grant schedule, rolled back on drop unless
/// committed. Dropping uncommitted covers both explicit cancellation and
/// the handler future being dropped on client disconnect.
struct Permit<'a> {
    limiter: &'a RateLimiter,
    grant_at: Instant,
    committed: bool,
}

impl Permit<'_> {
    fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        let mut state = self
            .limiter
            .state
            .lock()
            .expect("throttle state poisoned");
        // Roll back only while ours is still the newest reservation; later
        // waiters were already scheduled after us and keep their slots.
        if state.next_free == self.grant_at + self.limiter.interval {
            state.next_free = self.grant_at;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_token_is_immediate() {
        let limiter = RateLimiter::new(0.1);
        let (_tx, mut rx) = watch::channel(false);

        let start = Instant::now();
        limiter.wait(&mut rx).await.unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn paces_waits_at_configured_rate() {
        let limiter = RateLimiter::new(10.0);
        let (_tx, mut rx) = watch::channel(false);

        let start = Instant::now();
        for _ in 0..4 {
            limiter.wait(&mut rx).await.unwrap();
        }
        // Four back-to-back waits at 10 req/s: (4 - 1) / 10 seconds.
        assert!(start.elapsed() >= Duration::from_millis(300));
        assert!(start.elapsed() < Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn tolerates_very_high_rates() {
        let limiter = RateLimiter::new(1e9);
        let (_tx, mut rx) = watch::channel(false);

        let start = Instant::now();
        for _ in 0..100 {
            limiter.wait(&mut rx).await.unwrap();
        }
        assert!(start.elapsed() < Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn tolerates_unrepresentably_low_rates() {
        // 1/rps overflows Duration; the limiter clamps instead of panicking.
        let limiter = RateLimiter::new(1e-300);
        let (_tx, mut rx) = watch::channel(false);
        limiter.wait(&mut rx).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_a_pending_wait() {
        let limiter = Arc::new(RateLimiter::new(1.0));
        let (tx, rx) = watch::channel(false);

        {
            let mut rx = rx.clone();
            limiter.wait(&mut rx).await.unwrap();
        }

        let waiter = {
            let limiter = Arc::clone(&limiter);
            let mut rx = rx.clone();
            tokio::spawn(async move { limiter.wait(&mut rx).await })
        };
        // Let the waiter reserve its slot and start sleeping.
        tokio::task::yield_now().await;
        tx.send(true).unwrap();

        assert!(waiter.await.unwrap().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_wait_returns_its_reservation() {
        let limiter = Arc::new(RateLimiter::new(1.0));
        let (tx, rx) = watch::channel(false);

        {
            let mut rx = rx.clone();
            limiter.wait(&mut rx).await.unwrap();
        }
        let start = Instant::now();

        let waiter = {
            let limiter = Arc::clone(&limiter);
            let mut rx = rx.clone();
            tokio::spawn(async move { limiter.wait(&mut rx).await })
        };
        tokio::task::yield_now().await;
        tx.send(true).unwrap();
        assert!(waiter.await.unwrap().is_err());

        // The cancelled slot was returned: the next wait is granted one
        // interval after the first, not two.
        let mut rx = tx.subscribe();
        limiter.wait(&mut rx).await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(1));
    }
}
