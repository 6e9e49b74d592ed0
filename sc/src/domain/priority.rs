//! Default task priorities
//!
//! A task submitted without an explicit priority gets one computed from the
//! weight of its operation kind plus the weights of its sort, section and time
//! window modifiers, averaged over the components that apply. Lower values
//! are dequeued first.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{CommentsSort, Operation, OperationKind, SubredditSort, TimeWindow, UserSection, UserSort};

/// Configurable priority weights. Missing entries fall back to the built-in table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityWeights {
    pub operations: HashMap<OperationKind, f64>,

    #[serde(rename = "subreddit-sorts")]
    pub subreddit_sorts: HashMap<SubredditSort, f64>,

    #[serde(rename = "user-sections")]
    pub user_sections: HashMap<UserSection, f64>,

    #[serde(rename = "user-sorts")]
    pub user_sorts: HashMap<UserSort, f64>,

    #[serde(rename = "comments-sorts")]
    pub comments_sorts: HashMap<CommentsSort, f64>,

    #[serde(rename = "time-windows")]
    pub time_windows: HashMap<TimeWindow, f64>,
}

fn operation_weight(kind: OperationKind) -> f64 {
    match kind {
        OperationKind::SubredditAbout | OperationKind::UserAbout => 0.0,
        OperationKind::Comments => 1.0,
        OperationKind::Subreddit | OperationKind::User | OperationKind::MoreChildren => 2.0,
        OperationKind::Get | OperationKind::Listing => 3.0,
    }
}

fn subreddit_sort_weight(sort: SubredditSort) -> f64 {
    match sort {
        SubredditSort::Hot | SubredditSort::New => 0.0,
        SubredditSort::Rising => 1.0,
        SubredditSort::Top => 2.0,
        SubredditSort::Controversial => 3.0,
    }
}

fn user_section_weight(section: UserSection) -> f64 {
    match section {
        UserSection::Overview | UserSection::Submitted => 0.0,
        UserSection::Comments => 1.0,
        UserSection::Gilded => 2.0,
        UserSection::Upvoted | UserSection::Downvoted | UserSection::Hidden | UserSection::Saved => 3.0,
    }
}

fn user_sort_weight(sort: UserSort) -> f64 {
    match sort {
        UserSort::New => 0.0,
        UserSort::Hot => 1.0,
        UserSort::Top => 2.0,
        UserSort::Controversial => 3.0,
    }
}

fn comments_sort_weight(sort: CommentsSort) -> f64 {
    match sort {
        CommentsSort::Confidence | CommentsSort::Top => 0.0,
        CommentsSort::New | CommentsSort::Old => 1.0,
        CommentsSort::Controversial | CommentsSort::Qa => 2.0,
    }
}

fn time_window_weight(t: TimeWindow) -> f64 {
    match t {
        TimeWindow::Hour => 0.0,
        TimeWindow::Day => 1.0,
        TimeWindow::Week => 2.0,
        TimeWindow::Month => 3.0,
        TimeWindow::Year => 4.0,
        TimeWindow::All => 5.0,
    }
}

/// Lookup table resolved once from [`PriorityWeights`] over the built-in defaults
#[derive(Debug, Clone)]
pub struct PriorityTable {
    operations: HashMap<OperationKind, f64>,
    subreddit_sorts: HashMap<SubredditSort, f64>,
    user_sections: HashMap<UserSection, f64>,
    user_sorts: HashMap<UserSort, f64>,
    comments_sorts: HashMap<CommentsSort, f64>,
    time_windows: HashMap<TimeWindow, f64>,
}

fn merged<K: Copy + Eq + std::hash::Hash>(
    all: &[K],
    builtin: fn(K) -> f64,
    overrides: &HashMap<K, f64>,
) -> HashMap<K, f64> {
    all.iter()
        .map(|k| (*k, overrides.get(k).copied().unwrap_or_else(|| builtin(*k))))
        .collect()
}

impl Default for PriorityTable {
    fn default() -> Self {
        Self::new(&PriorityWeights::default())
    }
}

impl PriorityTable {
    /// Build the table, applying `weights` on top of the built-in values
    pub fn new(weights: &PriorityWeights) -> Self {
        debug!(?weights, "PriorityTable::new: called");
        Self {
            operations: merged(OperationKind::ALL, operation_weight, &weights.operations),
            subreddit_sorts: merged(SubredditSort::ALL, subreddit_sort_weight, &weights.subreddit_sorts),
            user_sections: merged(UserSection::ALL, user_section_weight, &weights.user_sections),
            user_sorts: merged(UserSort::ALL, user_sort_weight, &weights.user_sorts),
            comments_sorts: merged(CommentsSort::ALL, comments_sort_weight, &weights.comments_sorts),
            time_windows: merged(TimeWindow::ALL, time_window_weight, &weights.time_windows),
        }
    }

    fn lookup<K: Eq + std::hash::Hash>(map: &HashMap<K, f64>, key: &K) -> f64 {
        map.get(key).copied().unwrap_or_default()
    }

    /// Default priority for an operation
    pub fn resolve(&self, operation: &Operation) -> f64 {
        let base = Self::lookup(&self.operations, &operation.kind());

        let (sum, components) = match operation {
            Operation::Get { .. }
            | Operation::Listing { .. }
            | Operation::SubredditAbout { .. }
            | Operation::UserAbout { .. } => (base, 1.0),
            Operation::Subreddit { sort, t, .. } => {
                let sum = base + Self::lookup(&self.subreddit_sorts, sort);
                if sort.is_time_ranked() {
                    (sum + Self::lookup(&self.time_windows, t), 3.0)
                } else {
                    (sum, 2.0)
                }
            }
            Operation::User { section, sort, t, .. } => {
                let sum = base + Self::lookup(&self.user_sections, section) + Self::lookup(&self.user_sorts, sort);
                if sort.is_time_ranked() {
                    (sum + Self::lookup(&self.time_windows, t), 4.0)
                } else {
                    (sum, 3.0)
                }
            }
            Operation::Comments { sort, .. } | Operation::MoreChildren { sort, .. } => {
                (base + Self::lookup(&self.comments_sorts, sort), 2.0)
            }
        };

        let priority = sum / components;
        debug!(kind = %operation.kind(), priority, "PriorityTable::resolve: resolved");
        priority
    }
}
