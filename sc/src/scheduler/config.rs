//! Scheduler configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// How long the worker sleeps when the queue is empty, in milliseconds
    #[serde(rename = "idle-sleep-ms", default = "default_idle_sleep_ms")]
    pub idle_sleep_ms: f64,
}

fn default_idle_sleep_ms() -> f64 {
    1000.0 / 60.0
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            idle_sleep_ms: default_idle_sleep_ms(),
        }
    }
}

impl SchedulerConfig {
    /// Get the idle poll interval as a Duration
    ///
    /// Zero, negative and non-finite values fall back to the default so the
    /// idle loop never spins.
    pub fn idle_sleep(&self) -> Duration {
        match Duration::try_from_secs_f64(self.idle_sleep_ms / 1000.0) {
            Ok(duration) if !duration.is_zero() => duration,
            _ => Duration::from_secs_f64(default_idle_sleep_ms() / 1000.0),
        }
    }
}
