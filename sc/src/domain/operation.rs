//! Operations the scheduler can run against the Reddit JSON API

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Query parameters sent alongside an endpoint
pub type Params = BTreeMap<String, String>;

/// Declares a closed set of wire values with `Display`/`FromStr` in both directions
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $( $(#[$vmeta:meta])* $variant:ident => $wire:literal ),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order
            pub const ALL: &'static [$name] = &[$( $name::$variant ),+];

            /// The value sent over the wire
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $wire ),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $( $wire => Ok(Self::$variant), )+
                    _ => Err(format!("Unknown {}: {}", stringify!($name), s)),
                }
            }
        }
    };
}

wire_enum! {
    /// Ordering of a subreddit listing
    #[derive(Default)]
    SubredditSort {
        #[default]
        Hot => "hot",
        New => "new",
        Top => "top",
        Controversial => "controversial",
        Rising => "rising",
    }
}

wire_enum! {
    /// Time window for `top` and `controversial` rankings
    #[derive(Default)]
    TimeWindow {
        Hour => "hour",
        #[default]
        Day => "day",
        Week => "week",
        Month => "month",
        Year => "year",
        All => "all",
    }
}

wire_enum! {
    /// Which of a user's listings to fetch
    #[derive(Default)]
    UserSection {
        #[default]
        Overview => "overview",
        Submitted => "submitted",
        Comments => "comments",
        Upvoted => "upvoted",
        Downvoted => "downvoted",
        Hidden => "hidden",
        Saved => "saved",
        Gilded => "gilded",
    }
}

wire_enum! {
    /// Ordering of a user listing
    #[derive(Default)]
    UserSort {
        Hot => "hot",
        #[default]
        New => "new",
        Top => "top",
        Controversial => "controversial",
    }
}

wire_enum! {
    /// Ordering of a comment tree
    #[derive(Default)]
    CommentsSort {
        #[default]
        Confidence => "confidence",
        Top => "top",
        New => "new",
        Controversial => "controversial",
        Old => "old",
        Qa => "qa",
    }
}

impl SubredditSort {
    /// Rankings that take a `t` time window
    pub fn is_time_ranked(&self) -> bool {
        matches!(self, Self::Top | Self::Controversial)
    }
}

impl UserSort {
    /// Rankings that take a `t` time window
    pub fn is_time_ranked(&self) -> bool {
        matches!(self, Self::Top | Self::Controversial)
    }
}

wire_enum! {
    /// Operation discriminant, used for priority lookup and logging
    OperationKind {
        Get => "get",
        Listing => "listing",
        SubredditAbout => "subreddit_about",
        Subreddit => "subreddit",
        UserAbout => "user_about",
        User => "user",
        Comments => "comments",
        MoreChildren => "more_children",
    }
}

/// Pagination cursor; a listing request carries at most one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cursor {
    Before(String),
    After(String),
}

impl Cursor {
    /// Build a cursor from optional `before`/`after` values; `before` wins when both are set
    pub fn from_pair(before: Option<String>, after: Option<String>) -> Option<Self> {
        match (before, after) {
            (Some(before), _) if !before.is_empty() => Some(Self::Before(before)),
            (_, Some(after)) if !after.is_empty() => Some(Self::After(after)),
            _ => None,
        }
    }

    /// Query parameter name and value
    pub fn as_param(&self) -> (&'static str, &str) {
        match self {
            Self::Before(id) => ("before", id),
            Self::After(id) => ("after", id),
        }
    }
}

/// A single fetch the worker knows how to execute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Any endpoint, with caller-supplied params
    Get {
        endpoint: String,
        #[serde(default)]
        params: Params,
    },

    /// Any listing endpoint, paginated
    Listing {
        endpoint: String,
        #[serde(default)]
        cursor: Option<Cursor>,
        #[serde(default)]
        params: Params,
    },

    /// `/r/{subreddit}/about`
    SubredditAbout { subreddit: String },

    /// `/r/{subreddit}/{sort}`
    Subreddit {
        subreddit: String,
        #[serde(default)]
        sort: SubredditSort,
        #[serde(default)]
        t: TimeWindow,
        #[serde(default)]
        cursor: Option<Cursor>,
    },

    /// `/user/{username}/about`
    UserAbout { username: String },

    /// `/user/{username}/{section}`
    User {
        username: String,
        #[serde(default)]
        section: UserSection,
        #[serde(default)]
        sort: UserSort,
        #[serde(default = "default_user_window")]
        t: TimeWindow,
        #[serde(default)]
        cursor: Option<Cursor>,
    },

    /// `/comments/{article}`, optionally focused on one comment
    Comments {
        article: String,
        #[serde(default)]
        sort: CommentsSort,
        #[serde(default)]
        comment: Option<String>,
    },

    /// `/api/morechildren`, expanding collapsed comments
    MoreChildren {
        link_id: String,
        children: Vec<String>,
        #[serde(default)]
        sort: CommentsSort,
    },
}

fn default_user_window() -> TimeWindow {
    TimeWindow::All
}

impl Operation {
    /// The discriminant of this operation
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Get { .. } => OperationKind::Get,
            Self::Listing { .. } => OperationKind::Listing,
            Self::SubredditAbout { .. } => OperationKind::SubredditAbout,
            Self::Subreddit { .. } => OperationKind::Subreddit,
            Self::UserAbout { .. } => OperationKind::UserAbout,
            Self::User { .. } => OperationKind::User,
            Self::Comments { .. } => OperationKind::Comments,
            Self::MoreChildren { .. } => OperationKind::MoreChildren,
        }
    }

    /// User listing with the usual defaults (overview, new, all time)
    pub fn user(username: impl Into<String>) -> Self {
        Self::User {
            username: username.into(),
            section: UserSection::default(),
            sort: UserSort::default(),
            t: default_user_window(),
            cursor: None,
        }
    }

    /// Subreddit listing with the usual defaults (hot, day)
    pub fn subreddit(subreddit: impl Into<String>) -> Self {
        Self::Subreddit {
            subreddit: subreddit.into(),
            sort: SubredditSort::default(),
            t: TimeWindow::default(),
            cursor: None,
        }
    }
}
