//! Tasks and the handles returned on submission

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::Operation;

/// Monotonic submission id; breaks ties between equal priorities
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(pub u64);

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A queued operation. Lower `priority` runs first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub priority: f64,
    pub operation: Operation,
}

impl Task {
    pub fn new(id: TaskId, priority: f64, operation: Operation) -> Self {
        // -0.0 + 0.0 is 0.0, so both zeros share a FIFO tier under total_cmp
        let priority = priority + 0.0;
        Self { id, priority, operation }
    }

    /// Handle correlating this task with its eventual result
    pub fn handle(&self) -> TaskHandle {
        TaskHandle {
            id: self.id,
            priority: self.priority,
        }
    }
}

impl Eq for Task {}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Ord for Task {
    /// Max-heap order: the task that should run next compares greatest.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for Task {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Returned from every submission
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaskHandle {
    pub id: TaskId,
    pub priority: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BinaryHeap;

    fn task(id: u64, priority: f64) -> Task {
        Task::new(TaskId(id), priority, Operation::subreddit("rust"))
    }

    #[test]
    fn test_lower_priority_value_runs_first() {
        assert!(task(5, 0.0) > task(1, 1.0));
        assert!(task(1, 0.5) > task(0, 2.0));
    }

    #[test]
    fn test_equal_priority_fifo() {
        assert!(task(1, 1.0) > task(2, 1.0));
    }

    #[test]
    fn test_heap_pops_by_priority_then_id() {
        let mut heap: BinaryHeap<Task> = [task(0, 1.0), task(1, 1.0), task(2, 0.0)].into_iter().collect();
        let order: Vec<u64> = std::iter::from_fn(|| heap.pop()).map(|t| t.id.0).collect();
        assert_eq!(order, vec![2, 0, 1]);
    }

    #[test]
    fn test_signed_zero_priorities_keep_fifo() {
        let mut heap: BinaryHeap<Task> = [task(0, 0.0), task(1, -0.0)].into_iter().collect();
        let order: Vec<u64> = std::iter::from_fn(|| heap.pop()).map(|t| t.id.0).collect();
        assert_eq!(order, vec![0, 1]);
        assert!(task(1, -0.0).priority.is_sign_positive());
    }

    #[test]
    fn test_handle_carries_id_and_priority() {
        let handle = task(7, 1.5).handle();
        assert_eq!(handle.id, TaskId(7));
        assert_eq!(handle.priority, 1.5);
        assert_eq!(handle.id.to_string(), "#7");
    }
}
