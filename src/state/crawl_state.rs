//! Lifecycle states of one domain crawl
//!
//! A crawl starts `Idle`, moves to `Running` once its checkpoint has been
//! loaded and the root enqueued, and ends in one of the terminal states.

use std::fmt;

/// Represents the current state of a domain crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlState {
    /// Created but not started
    Idle,

    /// Draining the frontier batch by batch
    Running,

    // ===== Terminal States =====
    /// The frontier emptied
    Completed,

    /// The fetch backend became unusable, or the crawl task died
    Failed,

    /// Cancelled from outside; the last completed batch was checkpointed
    Interrupted,
}

impl CrawlState {
    /// Returns true if this represents a crawl that ran to the end
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Checks whether moving from `self` to `next` is allowed
    pub fn can_transition_to(&self, next: CrawlState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Idle, Self::Failed)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Failed)
                | (Self::Running, Self::Interrupted)
        )
    }

    /// Converts the state to its ledger string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Interrupted => "interrupted",
        }
    }

    /// Parses a state from its ledger string representation
    ///
    /// Returns None if the string doesn't match any known state.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "idle" => Some(Self::Idle),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "interrupted" => Some(Self::Interrupted),
            _ => None,
        }
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
