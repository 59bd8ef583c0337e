//! Change notification bus
//!
//! One bus per context (tab). Backends deliver native notifications for
//! writes made by *other* contexts; a writer raises a synthetic notification
//! for its own context with [`ChangeBus::notify`], since native ones never
//! reach the writer. Delivery is fire-and-forget: no sequencing, no
//! acknowledgement, and a listener that was not subscribed at write time
//! simply reads the latest value when it next mounts.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use tracing::debug;

use crate::models::RoomId;
use crate::storage::{RecordKey, RecordKind};

/// Where a notification came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Raised by the storage for a write in another context
    Native,
    /// Raised by the writer for its own context
    Synthetic,
}

/// A keyed record changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub key: String,
    pub origin: Origin,
}

impl Notification {
    pub fn native(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            origin: Origin::Native,
        }
    }

    pub fn synthetic(room: &RoomId, kind: RecordKind) -> Self {
        Self {
            key: RecordKey::new(room, kind).storage_key(),
            origin: Origin::Synthetic,
        }
    }

    /// The room record this key names, if any
    pub fn record(&self) -> Option<RecordKey> {
        RecordKey::parse(&self.key)
    }

    /// Does this notification concern `kind` of `room`?
    pub fn is_for(&self, room: &RoomId, kind: RecordKind) -> bool {
        self.key == RecordKey::new(room, kind).storage_key()
    }
}

type Listener = Arc<dyn Fn(&Notification) + Send + Sync>;

#[derive(Default)]
struct BusInner {
    next_id: u64,
    listeners: Vec<(u64, Listener)>,
}

/// Per-context listener registry
#[derive(Clone, Default)]
pub struct ChangeBus {
    inner: Arc<Mutex<BusInner>>,
}

impl ChangeBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for every notification reaching this context
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.next_id += 1;
        let id = inner.next_id;
        inner.listeners.push((id, Arc::new(listener)));
        Subscription {
            bus: Arc::downgrade(&self.inner),
            id,
        }
    }

    /// Raise a synthetic notification for this context after a local write
    pub fn notify(&self, kind: RecordKind, room: &RoomId) {
        self.deliver(&Notification::synthetic(room, kind));
    }

    /// Hand a notification to every live listener.
    ///
    /// The listener list is snapshotted first, so listeners may subscribe,
    /// unsubscribe or write to the store while being called.
    pub fn deliver(&self, notification: &Notification) {
        let listeners: Vec<Listener> = {
            let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            inner.listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
        };
        debug!(
            key = %notification.key,
            origin = ?notification.origin,
            listeners = listeners.len(),
            "Delivering change notification"
        );
        for listener in listeners {
            listener(notification);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .len()
    }

    /// A handle that does not keep the bus alive
    pub fn downgrade(&self) -> WeakBus {
        WeakBus {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl std::fmt::Debug for ChangeBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Non-owning reference to a context's bus, held by shared storage
#[derive(Clone)]
pub struct WeakBus {
    inner: Weak<Mutex<BusInner>>,
}

impl WeakBus {
    pub fn upgrade(&self) -> Option<ChangeBus> {
        self.inner.upgrade().map(|inner| ChangeBus { inner })
    }
}

/// Keeps a listener registered; dropping it unsubscribes
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    bus: Weak<Mutex<BusInner>>,
    id: u64,
}

impl Subscription {
    /// Unsubscribe now
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.bus.upgrade() {
            let mut inner = inner.lock().unwrap_or_else(PoisonError::into_inner);
            inner.listeners.retain(|(id, _)| *id != self.id);
        }
    }
}
