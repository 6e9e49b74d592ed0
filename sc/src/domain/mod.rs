//! Domain types: operations, tasks and their default priorities

mod operation;
mod priority;
mod task;

pub use operation::{
    CommentsSort, Cursor, Operation, OperationKind, Params, SubredditSort, TimeWindow, UserSection, UserSort,
};
pub use priority::{PriorityTable, PriorityWeights};
pub use task::{Task, TaskHandle, TaskId};
