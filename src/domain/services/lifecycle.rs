use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Derived lifecycle phase of a live session. Only the cancellation flag is
/// stored; everything else follows from the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Scheduled,
    Ongoing,
    Completed,
    Cancelled,
}

impl Phase {
    /// Once `end` has passed the session is `Completed` whether or not it was
    /// cancelled; the stored flag still records the cancellation.
    pub fn resolve(now: DateTime<Utc>, start: DateTime<Utc>, end: DateTime<Utc>, is_cancelled: bool) -> Self {
        if now >= end {
            Phase::Completed
        } else if is_cancelled {
            Phase::Cancelled
        } else if now < start {
            Phase::Scheduled
        } else {
            Phase::Ongoing
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Scheduled => "scheduled",
            Phase::Ongoing => "ongoing",
            Phase::Completed => "completed",
            Phase::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
