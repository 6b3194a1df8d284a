//! Token-bucket rate limiter for provider request quotas.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

/// Token-bucket rate limiter.
///
/// Tokens refill continuously at `max_tokens / window` per millisecond, capped
/// at `max_tokens`. Each permitted request consumes one token; callers that
/// find the bucket empty wait until a full token has accumulated.
///
/// The bucket state sits behind an async mutex that is held across the wait,
/// so refill and decrement form one logical step per caller and concurrent
/// acquirers are served in arrival order.
#[derive(Debug)]
pub struct RateLimiter {
    max_tokens: f64,
    refill_rate_per_ms: f64,
    state: Mutex<BucketState>,
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl RateLimiter {
    /// Create a limiter permitting `max_requests` per `window`.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        let max_tokens = f64::from(max_requests.max(1));
        Self {
            max_tokens,
            refill_rate_per_ms: max_tokens / window.as_millis().max(1) as f64,
            state: Mutex::new(BucketState {
                tokens: max_tokens,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Acquire one token, waiting for refill if the bucket is empty.
    pub async fn acquire(&self) {
        let mut state = self.state.lock().await;
        self.refill(&mut state);

        if state.tokens < 1.0 {
            let wait_ms = (1.0 - state.tokens) / self.refill_rate_per_ms;
            sleep(Duration::from_secs_f64(wait_ms / 1000.0)).await;
            self.refill(&mut state);
        }

        // Clamped so float rounding in the refill can never push the
        // balance below zero.
        state.tokens = (state.tokens - 1.0).max(0.0);
    }

    /// Current token balance after refill; always within `0..=max_tokens`.
    pub async fn available_tokens(&self) -> f64 {
        let mut state = self.state.lock().await;
        self.refill(&mut state);
        state.tokens
    }

    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed_ms = now.duration_since(state.last_refill).as_secs_f64() * 1000.0;
        state.tokens = (state.tokens + elapsed_ms * self.refill_rate_per_ms).min(self.max_tokens);
        state.last_refill = now;
    }
}
