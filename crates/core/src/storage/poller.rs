//! Turns the SQLite change log into native notifications

use tracing::warn;

use crate::bus::{ChangeBus, Notification};
use crate::storage::SqliteBackend;

/// Delivers other contexts' writes to the local bus
pub struct StoragePoller {
    backend: SqliteBackend,
    bus: ChangeBus,
    revision: i64,
}

impl StoragePoller {
    /// Start watching from the current end of the change log.
    ///
    /// Older writes are not replayed; observers read the latest values on
    /// mount instead.
    pub fn new(backend: SqliteBackend, bus: ChangeBus) -> Self {
        let revision = backend.latest_revision().unwrap_or_else(|e| {
            warn!(error = %e, "Could not read change log revision");
            0
        });
        Self {
            backend,
            bus,
            revision,
        }
    }

    /// Deliver pending changes. Returns how many were delivered.
    ///
    /// Several writes to one key collapse into a single notification.
    pub fn poll(&mut self) -> usize {
        let changes = match self.backend.changes_since(self.revision) {
            Ok(changes) => changes,
            Err(e) => {
                warn!(error = %e, "Polling local storage failed");
                return 0;
            }
        };
        let Some(last) = changes.last() else {
            return 0;
        };
        self.revision = last.revision;

        let mut keys: Vec<&str> = Vec::new();
        for change in &changes {
            if !keys.contains(&change.key.as_str()) {
                keys.push(&change.key);
            }
        }
        for key in &keys {
            self.bus.deliver(&Notification::native(*key));
        }
        keys.len()
    }

    pub fn revision(&self) -> i64 {
        self.revision
    }
}
