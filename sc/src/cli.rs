//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::domain::{CommentsSort, Cursor, Operation, Params, SubredditSort, TimeWindow, UserSection, UserSort};

/// Scrappit - rate-limited Reddit JSON fetcher
#[derive(Parser)]
#[command(
    name = "sc",
    about = "Fetch Reddit JSON through a rate-limited, prioritized scheduler",
    version,
    after_help = after_help()
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Seconds to wait for the result before giving up
    #[arg(short = 'w', long = "wait-secs", global = true, default_value_t = 120)]
    pub wait_secs: u64,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands, one per operation
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch an arbitrary endpoint, e.g. /r/rust/hot
    Get {
        /// Endpoint path without the .json suffix
        endpoint: String,

        /// Extra query parameter (repeatable)
        #[arg(short = 'p', long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
        params: Vec<(String, String)>,

        /// Explicit priority (lower runs first)
        #[arg(long, allow_negative_numbers = true)]
        priority: Option<f64>,
    },

    /// Fetch a subreddit listing
    Subreddit {
        /// Subreddit name without the r/ prefix
        name: String,

        /// Listing order (hot, new, top, controversial, rising)
        #[arg(short, long, default_value_t)]
        sort: SubredditSort,

        /// Time window for top/controversial (hour, day, week, month, year, all)
        #[arg(short = 't', long = "time", default_value_t)]
        t: TimeWindow,

        /// Return items before this fullname
        #[arg(long, conflicts_with = "after")]
        before: Option<String>,

        /// Return items after this fullname
        #[arg(long)]
        after: Option<String>,

        /// Explicit priority (lower runs first)
        #[arg(long, allow_negative_numbers = true)]
        priority: Option<f64>,
    },

    /// Fetch a subreddit's about page
    SubredditAbout {
        /// Subreddit name without the r/ prefix
        name: String,

        /// Explicit priority (lower runs first)
        #[arg(long, allow_negative_numbers = true)]
        priority: Option<f64>,
    },

    /// Fetch a user's listing
    User {
        /// Username without the u/ prefix
        name: String,

        /// Section of the profile (overview, submitted, comments, upvoted, downvoted, hidden, saved, gilded)
        #[arg(long = "where", default_value_t)]
        section: UserSection,

        /// Listing order (hot, new, top, controversial)
        #[arg(short, long, default_value_t)]
        sort: UserSort,

        /// Time window for top/controversial (hour, day, week, month, year, all)
        #[arg(short = 't', long = "time", default_value_t = TimeWindow::All)]
        t: TimeWindow,

        /// Return items before this fullname
        #[arg(long, conflicts_with = "after")]
        before: Option<String>,

        /// Return items after this fullname
        #[arg(long)]
        after: Option<String>,

        /// Explicit priority (lower runs first)
        #[arg(long, allow_negative_numbers = true)]
        priority: Option<f64>,
    },

    /// Fetch a user's about page
    UserAbout {
        /// Username without the u/ prefix
        name: String,

        /// Explicit priority (lower runs first)
        #[arg(long, allow_negative_numbers = true)]
        priority: Option<f64>,
    },

    /// Fetch a submission and its comment tree
    Comments {
        /// Article id (base36, without the t3_ prefix)
        article: String,

        /// Comment order (confidence, top, new, controversial, old, qa)
        #[arg(short, long, default_value_t)]
        sort: CommentsSort,

        /// Focus the tree on this comment id
        #[arg(long)]
        comment: Option<String>,

        /// Explicit priority (lower runs first)
        #[arg(long, allow_negative_numbers = true)]
        priority: Option<f64>,
    },

    /// Expand collapsed comments of a submission
    MoreChildren {
        /// Fullname of the submission, e.g. t3_abc123
        link_id: String,

        /// Comment ids to expand
        #[arg(required = true)]
        children: Vec<String>,

        /// Comment order (confidence, top, new, controversial, old, qa)
        #[arg(short, long, default_value_t)]
        sort: CommentsSort,

        /// Explicit priority (lower runs first)
        #[arg(long, allow_negative_numbers = true)]
        priority: Option<f64>,
    },
}

impl Command {
    /// Convert into the operation to submit and its explicit priority, if any
    pub fn into_request(self) -> (Operation, Option<f64>) {
        debug!(command = ?self, "Command::into_request: called");
        match self {
            Command::Get {
                endpoint,
                params,
                priority,
            } => (
                Operation::Get {
                    endpoint,
                    params: params.into_iter().collect::<Params>(),
                },
                priority,
            ),
            Command::Subreddit {
                name,
                sort,
                t,
                before,
                after,
                priority,
            } => (
                Operation::Subreddit {
                    subreddit: name,
                    sort,
                    t,
                    cursor: Cursor::from_pair(before, after),
                },
                priority,
            ),
            Command::SubredditAbout { name, priority } => (Operation::SubredditAbout { subreddit: name }, priority),
            Command::User {
                name,
                section,
                sort,
                t,
                before,
                after,
                priority,
            } => (
                Operation::User {
                    username: name,
                    section,
                    sort,
                    t,
                    cursor: Cursor::from_pair(before, after),
                },
                priority,
            ),
            Command::UserAbout { name, priority } => (Operation::UserAbout { username: name }, priority),
            Command::Comments {
                article,
                sort,
                comment,
                priority,
            } => (Operation::Comments { article, sort, comment }, priority),
            Command::MoreChildren {
                link_id,
                children,
                sort,
                priority,
            } => (
                Operation::MoreChildren {
                    link_id,
                    children,
                    sort,
                },
                priority,
            ),
        }
    }
}

/// Parse a `key=value` query parameter
fn parse_param(s: &str) -> Result<(String, String), String> {
    debug!(%s, "parse_param: called");
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("scrappit")
        .join("logs")
        .join("scrappit.log");
    debug!(?path, "get_log_path: returning path");
    path
}

fn after_help() -> String {
    format!("Logs are written to: {}", get_log_path().display())
}
