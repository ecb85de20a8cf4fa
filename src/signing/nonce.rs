//! Per-signer strictly increasing nonces.

use std::sync::atomic::{AtomicU64, Ordering};

/// Millisecond-timestamp nonces, strictly increasing per instance.
///
/// Two generators signing with the same key can still collide; nonce state is
/// neither shared across instances nor persisted.
#[derive(Debug, Default)]
pub struct NonceGenerator {
    last: AtomicU64,
}

impl NonceGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `now_ms` if it is ahead of the last issued nonce, otherwise `last + 1`.
    pub fn next(&self) -> u64 {
        self.next_at(chrono::Utc::now().timestamp_millis().max(0) as u64)
    }

    /// The last nonce handed out, or 0.
    pub fn last(&self) -> u64 {
        self.last.load(Ordering::Acquire)
    }

    pub(crate) fn next_at(&self, now_ms: u64) -> u64 {
        let mut current = self.last.load(Ordering::Acquire);
        loop {
            let candidate = if now_ms > current { now_ms } else { current + 1 };
            match self.last.compare_exchange_weak(
                current,
                candidate,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return candidate,
                Err(actual) => current = actual,
            }
        }
    }
}
