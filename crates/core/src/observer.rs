//! Live views of room records
//!
//! An observer mounts by reading the current record, then re-reads it on
//! every notification for that record. Dropping it unmounts.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::bus::{ChangeBus, Subscription};
use crate::models::{GameSession, RoomId, Roster};
use crate::storage::RecordKind;

struct ObservedState<T> {
    value: T,
    /// Bumped on every refresh
    version: u64,
}

/// Locally cached copy of one record, kept fresh by notifications
pub struct RecordObserver<T> {
    state: Arc<Mutex<ObservedState<T>>>,
    _subscription: Subscription,
}

impl<T: Clone + Send + 'static> RecordObserver<T> {
    /// Read the record now and subscribe for changes to `kind` of `room`
    pub fn mount<F>(bus: &ChangeBus, room: RoomId, kind: RecordKind, load: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let state = Arc::new(Mutex::new(ObservedState {
            value: load(),
            version: 0,
        }));
        let shared = Arc::clone(&state);
        let subscription = bus.subscribe(move |notification| {
            if !notification.is_for(&room, kind) {
                return;
            }
            let value = load();
            let mut state = lock(&shared);
            state.value = value;
            state.version += 1;
        });
        Self {
            state,
            _subscription: subscription,
        }
    }

    /// Snapshot of the cached record
    pub fn get(&self) -> T {
        lock(&self.state).value.clone()
    }

    /// Number of refreshes since mount
    pub fn version(&self) -> u64 {
        lock(&self.state).version
    }
}

fn lock<T>(state: &Mutex<T>) -> MutexGuard<'_, T> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Live roster of a room
pub type RosterObserver = RecordObserver<Roster>;

/// Live game session of a room, `None` until the host starts
pub type SessionObserver = RecordObserver<Option<GameSession>>;
