//! In-memory local storage
//!
//! A [`MemoryProfile`] plays the part of one browser profile: every context
//! opened on it sees the same items, and a write from one context fires a
//! native notification on every other context's bus.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::bus::{ChangeBus, Notification, WeakBus};
use crate::error::{Error, Result};
use crate::storage::StorageBackend;

#[derive(Default)]
struct ProfileInner {
    items: HashMap<String, String>,
    /// Total bytes of keys plus values allowed, if limited
    quota: Option<usize>,
    unavailable: bool,
    next_context: u64,
    contexts: Vec<(u64, WeakBus)>,
}

impl ProfileInner {
    fn used_bytes_without(&self, key: &str) -> usize {
        self.items
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }

    /// Buses of every live context except `writer`
    fn peers(&mut self, writer: u64) -> Vec<ChangeBus> {
        self.contexts.retain(|(_, bus)| bus.upgrade().is_some());
        self.contexts
            .iter()
            .filter(|(id, _)| *id != writer)
            .filter_map(|(_, bus)| bus.upgrade())
            .collect()
    }
}

/// Shared storage for a set of simulated tabs
#[derive(Clone, Default)]
pub struct MemoryProfile {
    inner: Arc<Mutex<ProfileInner>>,
}

impl MemoryProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit stored bytes; writes beyond it fail with `QuotaExceeded`
    pub fn with_quota(quota: usize) -> Self {
        let profile = Self::new();
        profile.lock().quota = Some(quota);
        profile
    }

    /// Make every operation fail, as when storage is disabled
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// Open a context (tab) whose bus receives writes made by other contexts
    pub fn open_context(&self, bus: &ChangeBus) -> MemoryBackend {
        let mut inner = self.lock();
        inner.next_context += 1;
        let context = inner.next_context;
        inner.contexts.push((context, bus.downgrade()));
        MemoryBackend {
            profile: self.clone(),
            context,
        }
    }

    /// A context with no bus, for contexts that only write
    pub fn detached(&self) -> MemoryBackend {
        let mut inner = self.lock();
        inner.next_context += 1;
        MemoryBackend {
            profile: self.clone(),
            context: inner.next_context,
        }
    }

    /// Write a raw value without any notification, as corrupting tools do
    pub fn inject_raw(&self, key: &str, value: &str) {
        self.lock().items.insert(key.to_string(), value.to_string());
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.lock().items.get(key).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, ProfileInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One context's handle on a [`MemoryProfile`]
#[derive(Clone)]
pub struct MemoryBackend {
    profile: MemoryProfile,
    context: u64,
}

impl MemoryBackend {
    fn write(&self, key: &str, value: Option<&str>) -> Result<()> {
        let peers = {
            let mut inner = self.profile.lock();
            if inner.unavailable {
                return Err(Error::StorageUnavailable("local storage disabled".into()));
            }
            match value {
                Some(value) => {
                    if let Some(quota) = inner.quota {
                        let needed = inner.used_bytes_without(key) + key.len() + value.len();
                        if needed > quota {
                            return Err(Error::QuotaExceeded { needed, quota });
                        }
                    }
                    inner.items.insert(key.to_string(), value.to_string());
                }
                None => {
                    inner.items.remove(key);
                }
            }
            inner.peers(self.context)
        };

        debug!(key, context = self.context, peers = peers.len(), "Memory storage write");
        let notification = Notification::native(key);
        for bus in peers {
            bus.deliver(&notification);
        }
        Ok(())
    }
}

impl StorageBackend for MemoryBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let inner = self.profile.lock();
        if inner.unavailable {
            return Err(Error::StorageUnavailable("local storage disabled".into()));
        }
        Ok(inner.items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.write(key, Some(value))
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.write(key, None)
    }
}
