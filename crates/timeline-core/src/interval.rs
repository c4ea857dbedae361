//! Half-open time intervals and overlap detection.
//!
//! An [`Interval`] covers `[start, end)`. Construction always validates
//! `start < end`, so every value in circulation is well formed.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TimelineError};

/// An immutable half-open time interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawInterval")]
pub struct Interval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

/// Unvalidated wire shape of an interval.
#[derive(Debug, Deserialize)]
struct RawInterval {
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

impl TryFrom<RawInterval> for Interval {
    type Error = TimelineError;

    fn try_from(raw: RawInterval) -> Result<Self> {
        let start = raw
            .start
            .ok_or_else(|| TimelineError::invalid("interval is missing `start`"))?;
        let end = raw
            .end
            .ok_or_else(|| TimelineError::invalid("interval is missing `end`"))?;
        Interval::new(start, end)
    }
}

impl Interval {
    /// Create an interval, rejecting empty or inverted ranges.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start >= end {
            return Err(TimelineError::invalid(format!(
                "interval start {} must be before end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Create an interval from Unix epoch milliseconds.
    pub fn from_millis(start_ms: i64, end_ms: i64) -> Result<Self> {
        Self::new(millis_to_utc(start_ms)?, millis_to_utc(end_ms)?)
    }

    /// Create an interval starting at `start` and lasting `length`.
    pub fn starting_at(start: DateTime<Utc>, length: Duration) -> Result<Self> {
        let end = start
            .checked_add_signed(length)
            .ok_or_else(|| TimelineError::invalid("interval end is out of range"))?;
        Self::new(start, end)
    }

    /// Parse an interval from a JSON document such as
    /// `{"start": "2024-01-01T10:00:00Z", "end": "2024-01-01T11:00:00Z"}`.
    ///
    /// Missing or non-timestamp fields are reported as
    /// [`TimelineError::InvalidArgument`]; text that is not JSON at all is a
    /// [`TimelineError::SerializationError`].
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let raw: RawInterval = serde_json::from_value(value)
            .map_err(|e| TimelineError::invalid(format!("malformed interval: {}", e)))?;
        Interval::try_from(raw)
    }

    /// Inclusive start instant.
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Exclusive end instant.
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Length of the interval.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Length of the interval in milliseconds.
    pub fn duration_ms(&self) -> i64 {
        self.duration().num_milliseconds()
    }

    /// Check whether `instant` falls inside `[start, end)`.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// Check whether this interval conflicts with `other`.
    ///
    /// Intervals that share their start instant are reported as NOT
    /// conflicting, identical intervals included. Touching endpoints never
    /// conflict.
    pub fn conflicts_with(&self, other: &Interval) -> bool {
        (self.start < other.start && self.end > other.start)
            || (self.start > other.start && self.start < other.end)
    }
}

/// Check whether two intervals conflict. See [`Interval::conflicts_with`].
pub fn conflicts_with(a: &Interval, b: &Interval) -> bool {
    a.conflicts_with(b)
}

/// Length of an interval. See [`Interval::duration`].
pub fn duration(a: &Interval) -> Duration {
    a.duration()
}

fn millis_to_utc(ms: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| TimelineError::invalid(format!("timestamp {}ms is out of range", ms)))
}
