//! Airport code state definitions for tracking crawl progress
//!
//! A code that has never been seen has no state at all (it is absent from
//! the frontier's bookkeeping); every tracked code is in one of these states.

use std::fmt;

/// Represents the current state of an airport code in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeState {
    // ===== Active States =====
    /// Code is waiting in the frontier
    Queued,

    /// Code has been handed to a worker
    InFlight,

    // ===== Terminal States =====
    /// Airport page was fetched, parsed and merged
    Done,

    /// Worker failed unexpectedly or gave up; no data was merged
    Abandoned,
}

impl CodeState {
    /// Returns true if the code will not be processed again
    ///
    /// Terminal codes make up the visited set.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Abandoned)
    }

    /// Returns true if the code still has work pending
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Queued | Self::InFlight)
    }

    /// Checks whether moving from this state to `next` is allowed
    pub fn can_transition_to(&self, next: CodeState) -> bool {
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (Self::Queued, Self::InFlight) | (Self::InFlight, Self::Done | Self::Abandoned)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::InFlight => "in_flight",
            Self::Done => "done",
            Self::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for CodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
