//! # Timeline Notify
//!
//! In-process topic registry with tombstoned subscriptions.

pub mod config;
pub mod registry;
pub mod report;
pub mod subscription;

pub use config::NotifierConfig;
pub use registry::TopicRegistry;
pub use report::{ListenerFailure, PublishReport};
pub use subscription::{ChannelSubscription, Listener, SubscriptionHandle};
