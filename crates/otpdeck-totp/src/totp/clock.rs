//! Current-time source for code generation.

use std::sync::atomic::{AtomicU64, Ordering};

/// Supplies the wall-clock time used to pick the TOTP step.
pub trait TimeProvider: Send + Sync {
    fn now_unix_seconds(&self) -> u64;
}

/// System wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimeProvider for SystemClock {
    fn now_unix_seconds(&self) -> u64 {
        // Pre-epoch clocks clamp to zero.
        u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default()
    }
}

/// Clock pinned to a settable instant.
#[derive(Debug, Default)]
pub struct FixedClock {
    now: AtomicU64,
}

impl FixedClock {
    pub fn new(unix_seconds: u64) -> Self {
        Self {
            now: AtomicU64::new(unix_seconds),
        }
    }

    pub fn set(&self, unix_seconds: u64) {
        self.now.store(unix_seconds, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: u64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl TimeProvider for FixedClock {
    fn now_unix_seconds(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}
