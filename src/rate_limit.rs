//! Token-bucket rate limiting for outbound REST weight.
//!
//! The venue budgets REST traffic by request weight (1200 per minute by
//! default). [`RateLimiter`] keeps a local bucket so callers wait before
//! sending instead of being rejected.

use std::time::Duration;

use async_lock::Mutex;
use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::SdkError;

/// Pre-send hook the HTTP transport awaits before every request.
#[async_trait]
pub trait Throttle: Send + Sync {
    /// Wait until `weight` may be spent.
    async fn throttle(&self, weight: u32) -> Result<(), SdkError>;
}

/// Bucket size and refill rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitConfig {
    pub capacity: u32,
    pub refill_per_sec: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: 1200,
            refill_per_sec: 20.0,
        }
    }
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket: starts full, refills continuously, never exceeds capacity.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    bucket: Mutex<Bucket>,
}

impl RateLimitConfig {
    /// Reject configs the bucket could never satisfy: zero capacity, or a
    /// refill rate that is not a positive finite number.
    pub fn validate(&self) -> Result<(), SdkError> {
        if self.capacity == 0 {
            return Err(SdkError::validation("rate limit capacity must be > 0"));
        }
        if !self.refill_per_sec.is_finite() || self.refill_per_sec <= 0.0 {
            return Err(SdkError::validation(format!(
                "rate limit refill_per_sec must be positive and finite, got {}",
                self.refill_per_sec
            )));
        }
        Ok(())
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::with_valid_config(RateLimitConfig::default())
    }
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Result<Self, SdkError> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: RateLimitConfig) -> Self {
        Self {
            config,
            bucket: Mutex::new(Bucket {
                tokens: config.capacity as f64,
                last_refill: Instant::now(),
            }),
        }
    }

    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// Spend `weight` tokens, sleeping for the shortfall when the bucket is
    /// short. A weight above capacity can never be satisfied and fails
    /// immediately.
    pub async fn acquire(&self, weight: u32) -> Result<(), SdkError> {
        self.check_weight(weight)?;
        loop {
            let wait = {
                let mut bucket = self.bucket.lock().await;
                self.refill(&mut bucket);
                let needed = weight as f64;
                if bucket.tokens >= needed {
                    bucket.tokens -= needed;
                    return Ok(());
                }
                Duration::from_secs_f64((needed - bucket.tokens) / self.config.refill_per_sec)
            };
            tracing::debug!(
                weight,
                wait_ms = wait.as_millis() as u64,
                "Rate limit reached, waiting"
            );
            tokio::time::sleep(wait).await;
        }
    }

    /// Spend `weight` tokens if available right now.
    pub async fn try_acquire(&self, weight: u32) -> bool {
        if weight > self.config.capacity {
            return false;
        }
        let mut bucket = self.bucket.lock().await;
        self.refill(&mut bucket);
        if bucket.tokens >= weight as f64 {
            bucket.tokens -= weight as f64;
            true
        } else {
            false
        }
    }

    /// Tokens currently in the bucket.
    pub async fn available(&self) -> f64 {
        let mut bucket = self.bucket.lock().await;
        self.refill(&mut bucket);
        bucket.tokens
    }

    fn check_weight(&self, weight: u32) -> Result<(), SdkError> {
        if weight > self.config.capacity {
            return Err(SdkError::validation(format!(
                "request weight {} exceeds rate limit capacity {}",
                weight, self.config.capacity
            )));
        }
        Ok(())
    }

    fn refill(&self, bucket: &mut Bucket) {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(bucket.last_refill);
        bucket.tokens = (bucket.tokens + elapsed.as_secs_f64() * self.config.refill_per_sec)
            .min(self.config.capacity as f64);
        bucket.last_refill = now;
    }
}

#[async_trait]
impl Throttle for RateLimiter {
    async fn throttle(&self, weight: u32) -> Result<(), SdkError> {
        self.acquire(weight).await
    }
}

// ─── Request weights ─────────────────────────────────────────────────────────

/// Weight of an `/info` request by its `type`.
pub fn info_weight(request_type: &str) -> u32 {
    match request_type {
        "l2Book" | "allMids" | "clearinghouseState" | "orderStatus"
        | "spotClearinghouseState" | "exchangeStatus" => 2,
        "userRole" => 60,
        _ => 20,
    }
}

/// Weight of an `/exchange` request carrying `batch_len` orders or cancels.
pub fn exchange_weight(batch_len: usize) -> u32 {
    1 + (batch_len / 40) as u32
}
