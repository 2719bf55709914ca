use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::{
    config::PoolConfig,
    video::{BufferRequest, Frame, OutputSink},
};

/// Pipeline-wide stop signal shared between the controller and the filter
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Waits between acquisition attempts: doubles from `initial` up to `max`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub initial: Duration,
    pub max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(5),
            max: Duration::from_millis(20),
        }
    }
}

impl From<&PoolConfig> for RetryPolicy {
    fn from(config: &PoolConfig) -> Self {
        Self {
            initial: config.retry_initial(),
            max: config.retry_max(),
        }
    }
}

impl RetryPolicy {
    /// Wait before attempt `attempt + 1`
    pub fn delay(&self, attempt: u32) -> Duration {
        self.initial
            .checked_mul(1 << attempt.min(16))
            .map_or(self.max, |d| d.min(self.max))
    }
}

/// Acquire a buffer of the negotiated geometry, waiting while the sink is exhausted
///
/// Returns `None` once `cancel` is observed; cancellation is checked after
/// every failed attempt, before and after each wait. `retries` counts the
/// waits.
pub fn acquire_with_retry(
    sink: &dyn OutputSink,
    cancel: &CancelToken,
    policy: &RetryPolicy,
    retries: &mut u64,
) -> Option<Frame> {
    let mut attempt = 0u32;
    loop {
        if let Some(frame) = sink.acquire(BufferRequest::negotiated()) {
            if attempt > 0 {
                debug!("Acquired output buffer after {} retries", attempt);
            }
            return Some(frame);
        }
        if cancel.is_cancelled() {
            return None;
        }
        thread::sleep(policy.delay(attempt));
        *retries += 1;
        attempt = attempt.saturating_add(1);
        if cancel.is_cancelled() {
            return None;
        }
    }
}
