//! Recurring schedules built from a session window and weekly meetings.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::range::TimeRange;

/// A named schedule: an overall session plus the meetings held inside it.
///
/// Two schedules clash only when their sessions overlap and at least one
/// pair of meetings overlaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// Human readable name (e.g. a course code).
    pub name: String,

    /// Window during which the meetings take place.
    pub session: TimeRange,

    /// Individual meetings.
    #[serde(default)]
    pub meetings: Vec<TimeRange>,
}

impl Schedule {
    /// Create a schedule with no meetings.
    pub fn new(name: impl Into<String>, session: TimeRange) -> Self {
        Self {
            name: name.into(),
            session,
            meetings: Vec::new(),
        }
    }

    /// Add a meeting.
    pub fn with_meeting(mut self, meeting: TimeRange) -> Self {
        self.meetings.push(meeting);
        self
    }

    /// Check whether this schedule clashes with `other`.
    pub fn conflicts_with(&self, other: &Schedule) -> bool {
        if !self.session.conflicts_with(&other.session) {
            return false;
        }

        self.meetings
            .iter()
            .any(|mine| other.meetings.iter().any(|theirs| mine.conflicts_with(theirs)))
    }

    /// Every clashing `(self, other)` meeting pair, by index.
    ///
    /// Empty when the sessions do not overlap.
    pub fn conflicting_meetings(&self, other: &Schedule) -> Vec<(usize, usize)> {
        if !self.session.conflicts_with(&other.session) {
            return Vec::new();
        }

        let mut pairs = Vec::new();
        for (i, mine) in self.meetings.iter().enumerate() {
            for (j, theirs) in other.meetings.iter().enumerate() {
                if mine.conflicts_with(theirs) {
                    pairs.push((i, j));
                }
            }
        }
        pairs
    }

    /// Sum of all meeting lengths.
    pub fn total_meeting_time(&self) -> Duration {
        self.meetings
            .iter()
            .fold(Duration::zero(), |acc, m| acc + m.duration())
    }
}
