//! Background task scheduler
//!
//! Orders submitted operations by priority and runs them one at a time on a
//! dedicated worker thread, delivering each outcome as a [`TaskResult`].

mod config;
mod core;
mod error;
mod queue;

pub use config::SchedulerConfig;
pub use core::Scheduler;
pub use error::{SchedulerError, TaskError};
pub use queue::{SchedulerState, TaskQueue, TaskResult};
