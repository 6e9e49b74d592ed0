//! Queue types for the scheduler

use std::collections::BinaryHeap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tracing::debug;

use super::TaskError;
use crate::domain::{Operation, Task, TaskHandle, TaskId};

/// Outcome of one executed task
#[derive(Debug)]
pub struct TaskResult {
    pub task: Task,
    pub value: Result<Value, TaskError>,
}

impl TaskResult {
    pub fn id(&self) -> TaskId {
        self.task.id
    }

    pub fn is_ok(&self) -> bool {
        self.value.is_ok()
    }
}

/// Worker lifecycle as seen from callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// `start` has not been called
    NotStarted,

    /// Worker alive, queue drained, polling at the idle interval
    Idle,

    /// Worker alive and executing or about to dequeue
    Running,

    /// Worker loop has exited
    Stopped,
}

impl std::fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not-started"),
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

struct QueueInner {
    heap: BinaryHeap<Task>,
    next_id: u64,
}

/// Unbounded priority queue shared between submitters and the worker
pub struct TaskQueue {
    inner: Mutex<QueueInner>,
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskQueue {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                heap: BinaryHeap::new(),
                next_id: 0,
            }),
        }
    }

    // Nothing panics while the lock is held, so a poisoned heap is still consistent
    fn lock(&self) -> MutexGuard<'_, QueueInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Assign the next id and enqueue
    pub fn push(&self, operation: Operation, priority: f64) -> TaskHandle {
        let mut inner = self.lock();
        let id = TaskId(inner.next_id);
        inner.next_id += 1;
        let task = Task::new(id, priority, operation);
        let handle = task.handle();
        inner.heap.push(task);
        debug!(%id, priority, depth = inner.heap.len(), "TaskQueue::push: queued");
        handle
    }

    /// Remove the lowest `(priority, id)` task
    pub fn pop(&self) -> Option<Task> {
        self.lock().heap.pop()
    }

    pub fn len(&self) -> usize {
        self.lock().heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn op() -> Operation {
        Operation::subreddit("rust")
    }

    #[test]
    fn test_ids_are_monotonic() {
        let queue = TaskQueue::new();
        let a = queue.push(op(), 5.0);
        let b = queue.push(op(), 0.0);
        let c = queue.push(op(), 5.0);
        assert_eq!((a.id, b.id, c.id), (TaskId(0), TaskId(1), TaskId(2)));
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn test_equal_priority_is_fifo() {
        let queue = TaskQueue::new();
        for _ in 0..3 {
            queue.push(op(), 1.0);
        }
        let order: Vec<u64> = std::iter::from_fn(|| queue.pop()).map(|t| t.id.0).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_lower_priority_first() {
        let queue = TaskQueue::new();
        let a = queue.push(op(), 1.0);
        let b = queue.push(op(), 1.0);
        let c = queue.push(op(), 0.0);
        let order: Vec<TaskId> = std::iter::from_fn(|| queue.pop()).map(|t| t.id).collect();
        assert_eq!(order, vec![c.id, a.id, b.id]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_concurrent_submitters_get_unique_ids() {
        let queue = std::sync::Arc::new(TaskQueue::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let queue = queue.clone();
                std::thread::spawn(move || (0..50).map(|_| queue.push(op(), 0.0).id).collect::<Vec<_>>())
            })
            .collect();

        let mut ids: Vec<TaskId> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 200);
    }

    proptest! {
        #[test]
        fn prop_pop_order_is_sorted_by_priority_then_id(priorities in prop::collection::vec(0u8..5, 1..40)) {
            let queue = TaskQueue::new();
            for p in &priorities {
                queue.push(op(), f64::from(*p));
            }

            let popped: Vec<(f64, u64)> = std::iter::from_fn(|| queue.pop())
                .map(|t| (t.priority, t.id.0))
                .collect();

            prop_assert_eq!(popped.len(), priorities.len());
            for pair in popped.windows(2) {
                let (p0, id0) = pair[0];
                let (p1, id1) = pair[1];
                prop_assert!(p0 < p1 || (p0 == p1 && id0 < id1));
            }
        }
    }
}
