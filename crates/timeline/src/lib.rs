//! # Timeline
//!
//! Interval conflict detection and in-process topic notification.
//!
//! - [`Interval`], [`TimeRange`] and [`Schedule`] answer "do these overlap?"
//! - [`TopicRegistry`] delivers payloads to listeners by topic name
//!
//! Create one [`TopicRegistry`] at your composition root and share it
//! (usually behind an `Arc`) with whatever needs to publish or subscribe.

pub mod telemetry;

pub use timeline_core::{
    conflicts_with, duration, Interval, Result, Schedule, TimeRange, TimelineError,
};
pub use timeline_notify::{
    ChannelSubscription, ListenerFailure, NotifierConfig, PublishReport, SubscriptionHandle,
    TopicRegistry,
};

/// Prelude module for common imports.
pub mod prelude {
    pub use crate::telemetry::init_tracing;
    pub use chrono::{DateTime, Duration, Utc};
    pub use serde_json::{json, Value};
    pub use timeline_core::prelude::*;
    pub use timeline_notify::{NotifierConfig, PublishReport, SubscriptionHandle, TopicRegistry};
}
