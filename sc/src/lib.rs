//! Scrappit - rate-limited Reddit JSON fetcher
//!
//! Scrappit fetches public Reddit JSON endpoints through a client that reads
//! the server's rate-limit headers, waits out exhausted windows, and rotates
//! its User-Agent when throttled. Requests are queued by priority and executed
//! serially by a background worker; callers poll for results.
//!
//! # Modules
//!
//! - [`client`] - Rate-limited HTTP client and its transport/clock seams
//! - [`domain`] - Operations, tasks and default priorities
//! - [`scheduler`] - Priority queue and background worker
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod client;
pub mod config;
pub mod domain;
pub mod scheduler;

// Re-export commonly used types
pub use client::{ClientError, RateLimitedClient};
pub use config::{ClientConfig, Config};
pub use domain::{
    CommentsSort, Cursor, Operation, OperationKind, Params, PriorityTable, PriorityWeights, SubredditSort, Task,
    TaskHandle, TaskId, TimeWindow, UserSection, UserSort,
};
pub use scheduler::{Scheduler, SchedulerConfig, SchedulerError, SchedulerState, TaskError, TaskResult};
