//! # Timeline Core
//!
//! Core primitives and types for Timeline.
//!
//! This crate provides the value types:
//! - [`Interval`] - Half-open time span with overlap detection
//! - [`TimeRange`] - Interval scoped to a day label
//! - [`Schedule`] - Session window plus recurring meetings
//! - [`TimelineError`] - Error types

pub mod error;
pub mod interval;
pub mod range;
pub mod schedule;

// Re-exports for convenience
pub use error::{Result, TimelineError};
pub use interval::{conflicts_with, duration, Interval};
pub use range::TimeRange;
pub use schedule::Schedule;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Result, TimelineError};
    pub use crate::interval::Interval;
    pub use crate::range::TimeRange;
    pub use crate::schedule::Schedule;
}
