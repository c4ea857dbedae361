//! Day-scoped time ranges.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::interval::Interval;

/// An interval tagged with the day it recurs on (e.g. "Mon").
///
/// Ranges on different days never conflict. An empty `day` is a day label
/// like any other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Day label.
    #[serde(default)]
    pub day: String,

    /// The time span.
    #[serde(flatten)]
    pub interval: Interval,
}

impl TimeRange {
    /// Create a range on the given day.
    pub fn new(day: impl Into<String>, interval: Interval) -> Self {
        Self {
            day: day.into(),
            interval,
        }
    }

    /// Create a range without a day label.
    pub fn undated(interval: Interval) -> Self {
        Self::new("", interval)
    }

    /// Check whether this range conflicts with `other`.
    pub fn conflicts_with(&self, other: &TimeRange) -> bool {
        self.day == other.day && self.interval.conflicts_with(&other.interval)
    }

    /// Length of the range.
    pub fn duration(&self) -> Duration {
        self.interval.duration()
    }
}

impl From<Interval> for TimeRange {
    fn from(interval: Interval) -> Self {
        Self::undated(interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(day: &str, start: i64, end: i64) -> TimeRange {
        TimeRange::new(day, Interval::from_millis(start, end).unwrap())
    }

    #[test]
    fn test_same_day_overlap() {
        assert!(range("Mon", 10, 20).conflicts_with(&range("Mon", 15, 25)));
    }

    #[test]
    fn test_different_days_never_conflict() {
        assert!(!range("Mon", 10, 20).conflicts_with(&range("Wed", 15, 25)));
    }

    #[test]
    fn test_undated_ranges_compare_intervals() {
        let a: TimeRange = Interval::from_millis(10, 20).unwrap().into();
        let b = range("", 15, 25);
        assert!(a.conflicts_with(&b));
        assert_eq!(a.duration(), Duration::milliseconds(10));
    }

    #[test]
    fn test_deserialize_defaults_day() {
        let r: TimeRange = serde_json::from_str(
            r#"{"start": "2024-01-01T10:00:00Z", "end": "2024-01-01T11:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(r.day, "");
        assert_eq!(r.duration(), Duration::hours(1));
    }
}
