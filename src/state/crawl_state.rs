//! Lifecycle states of one crawl run

use std::fmt;

/// Represents where a crawl run is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CrawlState {
    /// No run active yet
    #[default]
    Idle,

    /// Frontier is being processed
    Running,

    /// Frontier exhausted or stop requested
    Done,
}

impl CrawlState {
    /// Returns true if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns true if moving from `self` to `to` is a legal transition
    ///
    /// The only legal moves are Idle -> Running and Running -> Done.
    pub fn can_transition_to(&self, to: CrawlState) -> bool {
        matches!(
            (self, to),
            (Self::Idle, Self::Running) | (Self::Running, Self::Done)
        )
    }

    /// Returns a lowercase label for logging
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
