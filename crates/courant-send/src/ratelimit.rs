//! Outbound send pacing.
//!
//! Email providers cap accepted messages per second. Each dispatcher run
//! paces its own attempts with a [`RateLimiter`], independent of other
//! concurrently running batches for the same or other campaigns - the cap
//! is per dispatcher instance, matching the per-worker provider budget.
//!
//! The limiter is a fixed one-second window: up to `per_second` permits are
//! granted instantly, then callers sleep until the window rolls over. Waits
//! go through `tokio::time`, never a blocked thread, so tests can drive the
//! limiter with a paused clock.

use tokio::sync::Mutex;
use tokio::time::{sleep_until, Duration, Instant};

/// Fixed-window rate limiter granting `per_second` permits per second.
#[derive(Debug)]
pub struct RateLimiter {
    per_second: u32,
    state: Mutex<WindowState>,
}

#[derive(Debug)]
struct WindowState {
    window_start: Instant,
    granted: u32,
}

impl RateLimiter {
    /// Creates a limiter with the given per-second cap.
    ///
    /// A cap of zero is clamped to one; the config layer rejects zero
    /// before it gets here.
    #[must_use]
    pub fn new(per_second: u32) -> Self {
        Self {
            per_second: per_second.max(1),
            state: Mutex::new(WindowState {
                window_start: Instant::now(),
                granted: 0,
            }),
        }
    }

    /// Returns the configured per-second cap.
    #[must_use]
    pub const fn per_second(&self) -> u32 {
        self.per_second
    }

    /// Acquires one permit, sleeping until the next window if the current
    /// one is exhausted.
    pub async fn acquire(&self) {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        let window_len = Duration::from_secs(1);

        if now.duration_since(state.window_start) >= window_len {
            state.window_start = now;
            state.granted = 0;
        }

        if state.granted < self.per_second {
            state.granted += 1;
            return;
        }

        let next_window = state.window_start + window_len;
        sleep_until(next_window).await;
        state.window_start = next_window;
        state.granted = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn permits_within_cap_are_instant() {
        let limiter = RateLimiter::new(3);
        let start = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert_eq!(Instant::now(), start);
    }

    #[tokio::test(start_paused = true)]
    async fn exceeding_cap_waits_for_next_window() {
        let limiter = RateLimiter::new(2);
        let start = Instant::now();

        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;

        assert!(Instant::now() - start >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn ten_sends_at_two_per_second_take_four_seconds() {
        let limiter = RateLimiter::new(2);
        let start = Instant::now();
        for _ in 0..10 {
            limiter.acquire().await;
        }
        let elapsed = Instant::now() - start;
        assert!(elapsed >= Duration::from_secs(4));
        assert!(elapsed < Duration::from_secs(5));
    }

    #[test]
    fn zero_cap_is_clamped() {
        let limiter = RateLimiter::new(0);
        assert_eq!(limiter.per_second(), 1);
    }
}
