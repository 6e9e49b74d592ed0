//! Wall clock and sleeping, behind a trait so rate-limit waits can be observed

use std::time::Duration;

use async_trait::async_trait;

/// Source of "now" (epoch seconds) and of suspension for the worker
#[async_trait]
pub trait Clock: Send + Sync {
    /// Seconds since the Unix epoch
    fn now(&self) -> f64;

    /// Suspend the caller for `duration`
    async fn sleep(&self, duration: Duration);
}

/// Real time via chrono and tokio timers
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> f64 {
        chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Convert a possibly negative span of seconds into a `Duration`
pub fn seconds(span: f64) -> Duration {
    Duration::try_from_secs_f64(span.max(0.0)).unwrap_or(Duration::ZERO)
}
