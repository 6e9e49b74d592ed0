//! Scheduler implementation
//!
//! Submitters push tasks onto a shared priority queue from any thread; one
//! dedicated worker thread pops them in `(priority, id)` order, runs each
//! through the [`RateLimitedClient`] it owns, and sends every outcome to the
//! result channel. Running requests one at a time keeps a single identity from
//! bursting past the server's rate limit.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use futures::FutureExt;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::config::SchedulerConfig;
use super::error::{SchedulerError, TaskError};
use super::queue::{SchedulerState, TaskQueue, TaskResult};
use crate::client::RateLimitedClient;
use crate::config::Config;
use crate::domain::{
    CommentsSort, Cursor, Operation, Params, PriorityTable, SubredditSort, Task, TaskHandle, TimeWindow, UserSection,
    UserSort,
};

/// Who holds the client right now
enum WorkerSlot {
    /// Not running; the client is parked here
    Ready(Box<RateLimitedClient>),

    /// The worker thread owns the client and hands it back on exit
    Running(JoinHandle<RateLimitedClient>),

    /// A `join` call holds the handle and is waiting outside the lock
    Joining,

    /// The worker thread died without returning the client
    Lost,
}

/// State the worker shares with the scheduler
struct WorkerContext {
    queue: Arc<TaskQueue>,
    results: mpsc::UnboundedSender<TaskResult>,
    running: Arc<AtomicBool>,
    busy: Arc<AtomicBool>,
    idle_sleep: Duration,
}

/// Priority-ordered background fetcher
pub struct Scheduler {
    config: SchedulerConfig,
    priorities: PriorityTable,
    queue: Arc<TaskQueue>,
    results_tx: mpsc::UnboundedSender<TaskResult>,
    results_rx: Mutex<mpsc::UnboundedReceiver<TaskResult>>,
    running: Arc<AtomicBool>,
    busy: Arc<AtomicBool>,
    started: AtomicBool,
    worker: Mutex<WorkerSlot>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Scheduler {
    /// Create a scheduler with a client built from configuration
    pub fn from_config(config: &Config) -> Result<Self, SchedulerError> {
        debug!("Scheduler::from_config: called");
        let client = RateLimitedClient::from_config(&config.client)?;
        Ok(Self::new(
            client,
            config.scheduler.clone(),
            PriorityTable::new(&config.priorities),
        ))
    }

    /// Create a scheduler around an existing client. The worker is not started.
    pub fn new(client: RateLimitedClient, config: SchedulerConfig, priorities: PriorityTable) -> Self {
        debug!(?config, "Scheduler::new: called");
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        Self {
            config,
            priorities,
            queue: Arc::new(TaskQueue::new()),
            results_tx,
            results_rx: Mutex::new(results_rx),
            running: Arc::new(AtomicBool::new(false)),
            busy: Arc::new(AtomicBool::new(false)),
            started: AtomicBool::new(false),
            worker: Mutex::new(WorkerSlot::Ready(Box::new(client))),
        }
    }

    /// Spawn the worker thread
    ///
    /// A worker that has exited after [`stop`](Self::stop) but was never
    /// joined is reaped first, so a stopped scheduler can be started again
    /// against the same queue.
    pub fn start(&self) -> Result<(), SchedulerError> {
        debug!("Scheduler::start: called");
        let mut slot = lock(&self.worker);

        let client = match std::mem::replace(&mut *slot, WorkerSlot::Lost) {
            WorkerSlot::Ready(client) => client,
            WorkerSlot::Running(handle) if handle.is_finished() => {
                debug!("Scheduler::start: reaping finished worker");
                Box::new(handle.join().map_err(|_| SchedulerError::WorkerPanicked)?)
            }
            WorkerSlot::Running(handle) => {
                debug!("Scheduler::start: worker still running");
                *slot = WorkerSlot::Running(handle);
                return Err(SchedulerError::AlreadyRunning);
            }
            WorkerSlot::Joining => {
                debug!("Scheduler::start: worker is being joined");
                *slot = WorkerSlot::Joining;
                return Err(SchedulerError::AlreadyRunning);
            }
            WorkerSlot::Lost => return Err(SchedulerError::ClientUnavailable),
        };

        let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
            Ok(runtime) => runtime,
            Err(e) => {
                *slot = WorkerSlot::Ready(client);
                return Err(SchedulerError::Runtime(e));
            }
        };

        let ctx = WorkerContext {
            queue: self.queue.clone(),
            results: self.results_tx.clone(),
            running: self.running.clone(),
            busy: self.busy.clone(),
            idle_sleep: self.config.idle_sleep(),
        };

        self.running.store(true, Ordering::SeqCst);
        let spawned = thread::Builder::new()
            .name("scrappit-worker".to_string())
            .spawn(move || runtime.block_on(run_worker(*client, ctx)));

        match spawned {
            Ok(handle) => {
                *slot = WorkerSlot::Running(handle);
                self.started.store(true, Ordering::SeqCst);
                info!("Scheduler started");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Scheduler::start: failed to spawn worker thread");
                self.running.store(false, Ordering::SeqCst);
                Err(SchedulerError::Runtime(e))
            }
        }
    }

    /// Stop dequeuing. A task already executing still completes; queued tasks stay queued.
    pub fn stop(&self) {
        debug!("Scheduler::stop: called");
        self.running.store(false, Ordering::SeqCst);
    }

    /// Wait for the worker thread to exit and take the client back
    ///
    /// Blocks until the in-flight task finishes, which can include a
    /// rate-limit wait. The worker lock is not held while waiting, so
    /// `state()` and `start()` stay responsive. Does nothing if no worker is
    /// running or another caller is already joining it.
    pub fn join(&self) -> Result<(), SchedulerError> {
        debug!("Scheduler::join: called");
        let handle = {
            let mut slot = lock(&self.worker);
            match std::mem::replace(&mut *slot, WorkerSlot::Joining) {
                WorkerSlot::Running(handle) => handle,
                other => {
                    *slot = other;
                    return Ok(());
                }
            }
        };

        let joined = handle.join();
        let mut slot = lock(&self.worker);
        match joined {
            Ok(client) => {
                *slot = WorkerSlot::Ready(Box::new(client));
                info!("Scheduler worker joined");
                Ok(())
            }
            Err(_) => {
                *slot = WorkerSlot::Lost;
                error!("Scheduler::join: worker thread panicked");
                Err(SchedulerError::WorkerPanicked)
            }
        }
    }

    /// Current worker lifecycle state
    pub fn state(&self) -> SchedulerState {
        if !self.started.load(Ordering::SeqCst) {
            return SchedulerState::NotStarted;
        }

        let alive = match &*lock(&self.worker) {
            WorkerSlot::Running(handle) => !handle.is_finished(),
            WorkerSlot::Joining => true,
            WorkerSlot::Ready(_) | WorkerSlot::Lost => false,
        };
        if !alive {
            SchedulerState::Stopped
        } else if self.busy.load(Ordering::SeqCst) {
            SchedulerState::Running
        } else if !self.running.load(Ordering::SeqCst) {
            SchedulerState::Stopped
        } else if self.queue.is_empty() {
            SchedulerState::Idle
        } else {
            SchedulerState::Running
        }
    }

    /// Number of tasks waiting to be dequeued
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Next available result, in arrival order; never blocks
    pub fn poll_result(&self) -> Option<TaskResult> {
        lock(&self.results_rx).try_recv().ok()
    }

    /// Enqueue an operation; `None` uses the default priority for it
    pub fn submit(&self, operation: Operation, priority: Option<f64>) -> TaskHandle {
        let priority = priority.unwrap_or_else(|| self.priorities.resolve(&operation));
        let kind = operation.kind();
        let handle = self.queue.push(operation, priority);
        debug!(id = %handle.id, %kind, priority, "Scheduler::submit: queued");
        handle
    }

    pub fn get(&self, endpoint: impl Into<String>, params: Params, priority: Option<f64>) -> TaskHandle {
        self.submit(
            Operation::Get {
                endpoint: endpoint.into(),
                params,
            },
            priority,
        )
    }

    pub fn listing(
        &self,
        endpoint: impl Into<String>,
        cursor: Option<Cursor>,
        params: Params,
        priority: Option<f64>,
    ) -> TaskHandle {
        self.submit(
            Operation::Listing {
                endpoint: endpoint.into(),
                cursor,
                params,
            },
            priority,
        )
    }

    pub fn subreddit_about(&self, subreddit: impl Into<String>, priority: Option<f64>) -> TaskHandle {
        self.submit(
            Operation::SubredditAbout {
                subreddit: subreddit.into(),
            },
            priority,
        )
    }

    pub fn subreddit(
        &self,
        subreddit: impl Into<String>,
        sort: SubredditSort,
        t: TimeWindow,
        cursor: Option<Cursor>,
        priority: Option<f64>,
    ) -> TaskHandle {
        self.submit(
            Operation::Subreddit {
                subreddit: subreddit.into(),
                sort,
                t,
                cursor,
            },
            priority,
        )
    }

    pub fn user_about(&self, username: impl Into<String>, priority: Option<f64>) -> TaskHandle {
        self.submit(
            Operation::UserAbout {
                username: username.into(),
            },
            priority,
        )
    }

    pub fn user(
        &self,
        username: impl Into<String>,
        section: UserSection,
        sort: UserSort,
        t: TimeWindow,
        cursor: Option<Cursor>,
        priority: Option<f64>,
    ) -> TaskHandle {
        self.submit(
            Operation::User {
                username: username.into(),
                section,
                sort,
                t,
                cursor,
            },
            priority,
        )
    }

    pub fn comments(
        &self,
        article: impl Into<String>,
        sort: CommentsSort,
        comment: Option<String>,
        priority: Option<f64>,
    ) -> TaskHandle {
        self.submit(
            Operation::Comments {
                article: article.into(),
                sort,
                comment,
            },
            priority,
        )
    }

    pub fn more_children(
        &self,
        link_id: impl Into<String>,
        children: Vec<String>,
        sort: CommentsSort,
        priority: Option<f64>,
    ) -> TaskHandle {
        self.submit(
            Operation::MoreChildren {
                link_id: link_id.into(),
                children,
                sort,
            },
            priority,
        )
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        // Let a live worker exit after its current task; it is not joined here
        self.running.store(false, Ordering::SeqCst);
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run one task, capturing client errors and panics
async fn execute_task(client: &mut RateLimitedClient, task: &Task) -> Result<Value, TaskError> {
    match AssertUnwindSafe(client.execute(&task.operation)).catch_unwind().await {
        Ok(outcome) => outcome.map_err(TaskError::from),
        Err(payload) => Err(TaskError::Panicked(panic_message(payload))),
    }
}

/// Worker loop: dequeue, execute, report, until stopped
async fn run_worker(mut client: RateLimitedClient, ctx: WorkerContext) -> RateLimitedClient {
    info!("Worker started");
    while ctx.running.load(Ordering::SeqCst) {
        let Some(task) = ctx.queue.pop() else {
            tokio::time::sleep(ctx.idle_sleep).await;
            continue;
        };

        ctx.busy.store(true, Ordering::SeqCst);
        debug!(id = %task.id, kind = %task.operation.kind(), priority = task.priority, "run_worker: executing");
        let value = execute_task(&mut client, &task).await;
        match &value {
            Ok(_) => debug!(id = %task.id, "run_worker: task succeeded"),
            Err(e) => warn!(id = %task.id, error = %e, "run_worker: task failed"),
        }

        if ctx.results.send(TaskResult { task, value }).is_err() {
            warn!("run_worker: result receiver dropped");
        }
        ctx.busy.store(false, Ordering::SeqCst);
    }
    info!("Worker stopped");
    client
}
