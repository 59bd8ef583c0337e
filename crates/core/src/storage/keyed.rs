//! Room-keyed JSON records over a storage backend
//!
//! Storage failures never escape this layer: reads degrade to "absent" and
//! writes are dropped with a warning.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::models::{GameSession, RoomId, Roster};
use crate::storage::{RecordKey, RecordKind, StorageBackend};

/// Typed, room-scoped view of local storage
#[derive(Clone)]
pub struct KeyedStore<B> {
    backend: B,
}

impl<B: StorageBackend> KeyedStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Read and decode a record; missing, unreadable or malformed ⇒ `None`
    pub fn get<T: DeserializeOwned>(&self, room: &RoomId, kind: RecordKind) -> Option<T> {
        let key = RecordKey::new(room, kind).storage_key();
        let raw = match self.backend.get_item(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(%key, error = %e, "Storage read failed, treating record as absent");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(%key, error = %e, "Malformed record, treating as absent");
                None
            }
        }
    }

    /// Encode and store a record, replacing what was there.
    ///
    /// Returns false when the write was dropped.
    pub fn put<T: Serialize>(&self, room: &RoomId, kind: RecordKind, value: &T) -> bool {
        let key = RecordKey::new(room, kind).storage_key();
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(%key, error = %e, "Could not encode record, write dropped");
                return false;
            }
        };
        match self.backend.set_item(&key, &raw) {
            Ok(()) => {
                debug!(%key, bytes = raw.len(), "Record written");
                true
            }
            Err(e) => {
                warn!(%key, error = %e, "Storage write failed, write dropped");
                false
            }
        }
    }

    /// Current roster, empty when absent
    pub fn roster(&self, room: &RoomId) -> Roster {
        self.get(room, RecordKind::Roster).unwrap_or_default()
    }

    pub fn put_roster(&self, room: &RoomId, roster: &Roster) -> bool {
        self.put(room, RecordKind::Roster, roster)
    }

    /// Current session; one with tiles off the board reads as absent
    pub fn session(&self, room: &RoomId) -> Option<GameSession> {
        let session: GameSession = self.get(room, RecordKind::GameSession)?;
        if !session.is_well_formed() {
            warn!(%room, "Session has tiles off the board, treating as absent");
            return None;
        }
        Some(session)
    }

    pub fn put_session(&self, room: &RoomId, session: &GameSession) -> bool {
        self.put(room, RecordKind::GameSession, session)
    }
}
