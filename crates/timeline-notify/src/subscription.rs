//! Registrations and the handles that invalidate them.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Callback invoked with each published payload.
pub type Listener = dyn Fn(&Value) -> anyhow::Result<()> + Send + Sync;

/// One listener occupying one slot of a topic.
///
/// Unsubscribing clears `active` and drops the listener, but the slot
/// itself stays in place.
pub(crate) struct Registration {
    pub(crate) id: Uuid,
    pub(crate) slot: usize,
    listener: Mutex<Option<Arc<Listener>>>,
    active: AtomicBool,
}

impl Registration {
    pub(crate) fn new(slot: usize, listener: Arc<Listener>) -> Self {
        Self {
            id: Uuid::new_v4(),
            slot,
            listener: Mutex::new(Some(listener)),
            active: AtomicBool::new(true),
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// The listener, unless the slot has been tombstoned.
    ///
    /// A call already in flight keeps its own reference alive.
    pub(crate) fn listener(&self) -> Option<Arc<Listener>> {
        if !self.is_active() {
            return None;
        }
        self.listener.lock().clone()
    }

    /// Returns true if this call performed the transition.
    pub(crate) fn deactivate(&self) -> bool {
        let transitioned = self.active.swap(false, Ordering::AcqRel);
        let released = self.listener.lock().take();
        drop(released);
        transitioned
    }
}

/// Opaque token identifying one registration.
///
/// Dropping the handle leaves the listener subscribed; call
/// [`SubscriptionHandle::remove`] or
/// [`TopicRegistry::unsubscribe`](crate::TopicRegistry::unsubscribe).
#[derive(Clone)]
pub struct SubscriptionHandle {
    registry: Uuid,
    topic: String,
    registration: Arc<Registration>,
}

impl SubscriptionHandle {
    pub(crate) fn new(registry: Uuid, topic: String, registration: Arc<Registration>) -> Self {
        Self {
            registry,
            topic,
            registration,
        }
    }

    /// ID of the registry that issued this handle.
    pub fn registry_id(&self) -> Uuid {
        self.registry
    }

    /// Unique ID of the registration.
    pub fn id(&self) -> Uuid {
        self.registration.id
    }

    /// Topic the listener is registered on.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Position of the listener within its topic.
    pub fn slot(&self) -> usize {
        self.registration.slot
    }

    /// Whether the listener will still be invoked.
    pub fn is_active(&self) -> bool {
        self.registration.is_active()
    }

    /// Invalidate the listener. Safe to call any number of times.
    pub fn remove(&self) {
        if self.registration.deactivate() {
            tracing::debug!(
                topic = %self.topic,
                slot = self.registration.slot,
                subscription = %self.registration.id,
                "unsubscribed"
            );
        }
    }
}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("id", &self.id())
            .field("registry", &self.registry)
            .field("topic", &self.topic)
            .field("slot", &self.slot())
            .field("active", &self.is_active())
            .finish()
    }
}

impl PartialEq for SubscriptionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for SubscriptionHandle {}

/// A subscription that forwards payloads into a channel.
pub struct ChannelSubscription {
    /// Handle for unsubscribing.
    pub handle: SubscriptionHandle,

    /// Receiver for payloads.
    pub receiver: mpsc::UnboundedReceiver<Value>,
}

impl ChannelSubscription {
    /// Wait for the next payload.
    pub async fn recv(&mut self) -> Option<Value> {
        self.receiver.recv().await
    }

    /// Take a payload if one is already queued.
    pub fn try_recv(&mut self) -> Option<Value> {
        self.receiver.try_recv().ok()
    }

    /// Unsubscribe. Payloads already queued can still be drained.
    pub fn close(self) {
        self.handle.remove();
    }
}
