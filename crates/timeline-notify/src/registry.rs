//! Topic registry: subscribe, unsubscribe and publish.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::config::NotifierConfig;
use crate::report::{ListenerFailure, PublishReport};
use crate::subscription::{ChannelSubscription, Listener, Registration, SubscriptionHandle};

/// In-process publish/subscribe registry.
///
/// Each topic holds its registrations in subscription order. Unsubscribing
/// tombstones a slot instead of removing it, so slots never move and a
/// publish that is already iterating sees the removal immediately.
///
/// `publish` runs listeners synchronously on the calling thread after
/// releasing the registry lock. Listeners may subscribe, unsubscribe or
/// publish from inside a callback. They should not block for long: there
/// is no timeout and no way to cancel a publish in flight.
pub struct TopicRegistry {
    /// Identity stamped on every handle this registry issues.
    id: Uuid,

    /// Topic name -> registrations, in subscription order.
    topics: RwLock<HashMap<String, Vec<Arc<Registration>>>>,

    config: NotifierConfig,
}

impl TopicRegistry {
    /// Create a registry with the default configuration.
    pub fn new() -> Self {
        Self::with_config(NotifierConfig::default())
    }

    /// Create a registry with an explicit configuration.
    pub fn with_config(config: NotifierConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            topics: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Unique ID of this registry.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The active configuration.
    pub fn config(&self) -> &NotifierConfig {
        &self.config
    }

    /// Register `listener` for every future publish to `topic`.
    pub fn subscribe<F>(&self, topic: impl Into<String>, listener: F) -> SubscriptionHandle
    where
        F: Fn(&Value) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let topic = topic.into();
        let mut topics = self.topics.write();
        let slots = topics.entry(topic.clone()).or_default();

        let registration = Arc::new(Registration::new(slots.len(), Arc::new(listener)));
        slots.push(registration.clone());

        tracing::debug!(
            topic = %topic,
            slot = registration.slot,
            subscription = %registration.id,
            "subscribed"
        );

        SubscriptionHandle::new(self.id, topic, registration)
    }

    /// Subscribe with a channel instead of a callback.
    ///
    /// Once the receiver is dropped, each publish to the topic reports a
    /// failure for this slot until it is unsubscribed. Unsubscribing drops
    /// the sender, so `recv` returns `None` after the queue drains.
    pub fn subscribe_channel(&self, topic: impl Into<String>) -> ChannelSubscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = self.subscribe(topic, move |payload: &Value| {
            sender
                .send(payload.clone())
                .map_err(|_| anyhow::anyhow!("channel receiver dropped"))
        });

        ChannelSubscription { handle, receiver }
    }

    /// Invalidate the listener behind `handle`.
    ///
    /// Handles issued by another registry, and handles already
    /// invalidated, are ignored.
    pub fn unsubscribe(&self, handle: &SubscriptionHandle) {
        if handle.registry_id() != self.id {
            tracing::debug!(
                topic = %handle.topic(),
                subscription = %handle.id(),
                registry = %self.id,
                "ignoring unsubscribe for a handle from another registry"
            );
            return;
        }
        handle.remove();
    }

    /// Invoke every valid listener of `topic` in subscription order.
    ///
    /// A missing payload is delivered as an empty JSON object. Failures are
    /// collected in the returned report and never stop later listeners.
    pub fn publish(&self, topic: &str, payload: Option<Value>) -> PublishReport {
        let mut report = PublishReport::new(topic);

        let Some(registrations) = self.topics.read().get(topic).cloned() else {
            tracing::debug!(topic = %topic, "publish to topic without subscribers");
            return report;
        };

        let payload = payload.unwrap_or_else(|| Value::Object(Map::new()));

        for registration in registrations {
            let Some(listener) = registration.listener() else {
                report.skipped += 1;
                continue;
            };

            match self.invoke(&registration, &*listener, &payload) {
                Ok(()) => report.delivered += 1,
                Err(failure) => {
                    if self.config.log_failures {
                        tracing::warn!(
                            topic = %topic,
                            slot = failure.slot,
                            subscription = %failure.subscription,
                            panicked = failure.panicked,
                            "listener failed: {}",
                            failure.message
                        );
                    }
                    report.failures.push(failure);
                }
            }
        }

        tracing::debug!(
            topic = %topic,
            delivered = report.delivered,
            skipped = report.skipped,
            failed = report.failures.len(),
            "published"
        );

        report
    }

    fn invoke(
        &self,
        registration: &Registration,
        listener: &Listener,
        payload: &Value,
    ) -> std::result::Result<(), ListenerFailure> {
        let call = || listener(payload);

        let outcome = if self.config.isolate_panics {
            match catch_unwind(AssertUnwindSafe(call)) {
                Ok(result) => result.map_err(|e| (format!("{:#}", e), false)),
                Err(panic) => Err((panic_message(panic.as_ref()), true)),
            }
        } else {
            call().map_err(|e| (format!("{:#}", e), false))
        };

        outcome.map_err(|(message, panicked)| ListenerFailure {
            subscription: registration.id,
            slot: registration.slot,
            message,
            panicked,
        })
    }

    /// Number of listeners on `topic` that would still be invoked.
    pub fn listener_count(&self, topic: &str) -> usize {
        self.topics
            .read()
            .get(topic)
            .map_or(0, |slots| slots.iter().filter(|r| r.is_active()).count())
    }

    /// Number of slots on `topic`, tombstones included.
    pub fn slot_count(&self, topic: &str) -> usize {
        self.topics.read().get(topic).map_or(0, Vec::len)
    }

    /// All topics that have ever been subscribed to.
    pub fn topics(&self) -> Vec<String> {
        let mut names: Vec<String> = self.topics.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for TopicRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TopicRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let topics = self.topics.read();
        f.debug_struct("TopicRegistry")
            .field("id", &self.id)
            .field("topics", &topics.len())
            .field("config", &self.config)
            .finish()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("listener panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("listener panicked: {}", s)
    } else {
        "listener panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    fn recorder(
        registry: &TopicRegistry,
        topic: &str,
        label: &'static str,
        log: &Arc<Mutex<Vec<&'static str>>>,
    ) -> SubscriptionHandle {
        let log = log.clone();
        registry.subscribe(topic, move |_| {
            log.lock().push(label);
            Ok(())
        })
    }

    #[test]
    fn test_publish_in_subscription_order() {
        let registry = TopicRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        for label in ["a", "b", "c", "d"] {
            recorder(&registry, "booking", label, &log);
        }

        let report = registry.publish("booking", None);

        assert_eq!(*log.lock(), vec!["a", "b", "c", "d"]);
        assert_eq!(report.delivered, 4);
        assert!(report.is_clean());
    }

    #[test]
    fn test_unsubscribe_one_of_many() {
        let registry = TopicRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let _a = recorder(&registry, "booking", "a", &log);
        let b = recorder(&registry, "booking", "b", &log);
        let _c = recorder(&registry, "booking", "c", &log);

        registry.unsubscribe(&b);
        let report = registry.publish("booking", None);

        assert_eq!(*log.lock(), vec!["a", "c"]);
        assert_eq!(report.delivered, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(registry.listener_count("booking"), 2);
        assert_eq!(registry.slot_count("booking"), 3);
    }

    #[test]
    fn test_publish_without_subscribers() {
        let registry = TopicRegistry::new();

        let report = registry.publish("nobody", Some(json!({"x": 1})));

        assert_eq!(report.invoked(), 0);
        assert!(report.is_clean());
        assert!(registry.topics().is_empty());
    }

    #[test]
    fn test_double_unsubscribe() {
        let registry = TopicRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let a = recorder(&registry, "booking", "a", &log);

        registry.unsubscribe(&a);
        registry.unsubscribe(&a);
        a.remove();

        assert!(!a.is_active());
        assert_eq!(registry.publish("booking", None).invoked(), 0);
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_unsubscribe_ignores_foreign_handle() {
        let bookings = TopicRegistry::new();
        let parking = TopicRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let a = recorder(&bookings, "booking", "a", &log);
        parking.unsubscribe(&a);

        assert!(a.is_active());
        assert_eq!(a.registry_id(), bookings.id());
        assert_eq!(bookings.publish("booking", None).delivered, 1);
        assert_eq!(*log.lock(), vec!["a"]);

        bookings.unsubscribe(&a);
        assert!(!a.is_active());
    }

    #[test]
    fn test_slots_are_stable() {
        let registry = TopicRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let a = recorder(&registry, "booking", "a", &log);
        registry.unsubscribe(&a);
        let b = recorder(&registry, "booking", "b", &log);

        assert_eq!(a.slot(), 0);
        assert_eq!(b.slot(), 1);
        assert_eq!(b.topic(), "booking");
    }

    #[test]
    fn test_default_payload_is_empty_object() {
        let registry = TopicRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        registry.subscribe("booking", move |payload| {
            sink.lock().push(payload.clone());
            Ok(())
        });

        registry.publish("booking", None);
        registry.publish("booking", Some(json!({"spot": 7})));

        assert_eq!(*seen.lock(), vec![json!({}), json!({"spot": 7})]);
    }

    #[test]
    fn test_failing_listener_does_not_stop_others() {
        let registry = TopicRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        recorder(&registry, "booking", "a", &log);
        let failing = registry.subscribe("booking", |_| anyhow::bail!("quota exceeded"));
        recorder(&registry, "booking", "c", &log);

        let report = registry.publish("booking", None);

        assert_eq!(*log.lock(), vec!["a", "c"]);
        assert_eq!(report.delivered, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].subscription, failing.id());
        assert_eq!(report.failures[0].slot, 1);
        assert_eq!(report.failures[0].message, "quota exceeded");
        assert!(!report.failures[0].panicked);
        assert!(report.into_result().is_err());
    }

    #[test]
    fn test_panicking_listener_is_isolated() {
        let registry = TopicRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        registry.subscribe("booking", |_| panic!("bad listener"));
        recorder(&registry, "booking", "b", &log);

        let report = registry.publish("booking", None);

        assert_eq!(*log.lock(), vec!["b"]);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].panicked);
        assert!(report.failures[0].message.contains("bad listener"));
    }

    #[test]
    #[should_panic(expected = "bad listener")]
    fn test_panics_propagate_when_not_isolated() {
        let registry =
            TopicRegistry::with_config(NotifierConfig::default().with_isolate_panics(false));

        registry.subscribe("booking", |_| panic!("bad listener"));
        registry.publish("booking", None);
    }

    #[test]
    fn test_unsubscribe_during_publish() {
        let registry = Arc::new(TopicRegistry::new());
        let log = Arc::new(Mutex::new(Vec::new()));
        let later: Arc<Mutex<Option<SubscriptionHandle>>> = Arc::new(Mutex::new(None));

        let target = later.clone();
        let first_log = log.clone();
        registry.subscribe("booking", move |_| {
            first_log.lock().push("a");
            if let Some(handle) = target.lock().as_ref() {
                handle.remove();
            }
            Ok(())
        });
        let b = recorder(&registry, "booking", "b", &log);
        *later.lock() = Some(b);

        let report = registry.publish("booking", None);

        assert_eq!(*log.lock(), vec!["a"]);
        assert_eq!(report.delivered, 1);
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn test_reentrant_subscribe_and_publish() {
        let registry = Arc::new(TopicRegistry::new());
        let log = Arc::new(Mutex::new(Vec::new()));

        let inner = registry.clone();
        let inner_log = log.clone();
        registry.subscribe("outer", move |_| {
            let nested_log = inner_log.clone();
            inner.subscribe("outer", move |_| {
                nested_log.lock().push("late");
                Ok(())
            });
            inner.publish("inner", None);
            Ok(())
        });
        recorder(&registry, "inner", "inner", &log);

        registry.publish("outer", None);

        // The listener added mid-publish only sees later publishes.
        assert_eq!(*log.lock(), vec!["inner"]);
        assert_eq!(registry.slot_count("outer"), 2);
        assert_eq!(registry.topics(), vec!["inner".to_string(), "outer".to_string()]);
    }

    #[tokio::test]
    async fn test_channel_subscription() {
        let registry = TopicRegistry::new();
        let mut sub = registry.subscribe_channel("parking");

        registry.publish("parking", Some(json!({"spot": 12})));
        registry.publish("parking", None);

        assert_eq!(sub.recv().await, Some(json!({"spot": 12})));
        assert_eq!(sub.recv().await, Some(json!({})));
        assert_eq!(sub.try_recv(), None);
    }

    #[tokio::test]
    async fn test_dropped_channel_reports_failure() {
        let registry = TopicRegistry::new();
        let sub = registry.subscribe_channel("parking");
        let handle = sub.handle.clone();
        drop(sub.receiver);

        let report = registry.publish("parking", None);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].subscription, handle.id());

        handle.remove();
        assert!(registry.publish("parking", None).is_clean());
    }

    #[tokio::test]
    async fn test_channel_ends_after_unsubscribe() {
        let registry = TopicRegistry::new();
        let mut sub = registry.subscribe_channel("parking");

        registry.publish("parking", Some(json!({"spot": 3})));
        registry.unsubscribe(&sub.handle);

        let drained = tokio::time::timeout(std::time::Duration::from_millis(300), async {
            let mut seen = Vec::new();
            while let Some(payload) = sub.recv().await {
                seen.push(payload);
            }
            seen
        })
        .await
        .expect("receiver should close once unsubscribed");

        assert_eq!(drained, vec![json!({"spot": 3})]);
    }

    #[test]
    fn test_closed_channel_is_unsubscribed() {
        let registry = TopicRegistry::new();
        let sub = registry.subscribe_channel("parking");
        let handle = sub.handle.clone();

        sub.close();

        assert!(!handle.is_active());
        assert_eq!(registry.listener_count("parking"), 0);
    }

    #[test]
    fn test_registry_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TopicRegistry>();
        assert_send_sync::<SubscriptionHandle>();
    }
}
