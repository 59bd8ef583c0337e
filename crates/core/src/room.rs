//! Room roster management
//!
//! Every mutation is a read-modify-write of the whole roster record followed
//! by a synthetic notification for the writer's own context. There is no
//! atomicity across contexts: two tabs writing at once can lose an update.

use tracing::{debug, info};

use crate::bus::ChangeBus;
use crate::error::{Error, Result};
use crate::models::{ClientId, Identity, Participant, RoomId, Roster};
use crate::observer::RosterObserver;
use crate::permissions::PermissionMatrix;
use crate::storage::{KeyedStore, RecordKind, StorageBackend};

/// Default number of players a room admits
pub const DEFAULT_CAPACITY: usize = 4;

/// Result of a kick request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KickOutcome {
    Kicked,
    /// Target was not in the roster
    NotFound,
    /// Actor is not host; nothing was written
    Unauthorized,
    /// The host cannot be kicked
    TargetIsHost,
}

/// Join/leave/kick lifecycle of room rosters
#[derive(Clone)]
pub struct RoomManager<B> {
    store: KeyedStore<B>,
    bus: ChangeBus,
}

impl<B: StorageBackend> RoomManager<B> {
    pub fn new(store: KeyedStore<B>, bus: ChangeBus) -> Self {
        Self { store, bus }
    }

    /// Current roster; empty when the room has never existed
    pub fn roster(&self, room: &RoomId) -> Roster {
        self.store.roster(room)
    }

    /// Soft entry gate. Racy: two tabs can both pass before either joins.
    pub fn check_capacity(&self, room: &RoomId, capacity: usize) -> Result<()> {
        let current = self.roster(room).len();
        if current >= capacity {
            debug!(%room, current, capacity, "Room is full");
            return Err(Error::RoomFull { capacity });
        }
        Ok(())
    }

    /// Add a participant unless its client id or name is already present.
    /// Always persists and notifies.
    pub fn join(&self, room: &RoomId, identity: Identity, is_host: bool) -> Roster {
        let mut roster = self.roster(room);
        let name = identity.name.clone();
        if roster.admit(Participant::new(identity, is_host)) {
            info!(%room, %name, is_host, "Participant joined");
        } else {
            debug!(%room, %name, "Participant already present");
        }
        self.publish(room, &roster);
        roster
    }

    /// Remove a participant; a missing entry is a no-op that still publishes
    pub fn leave(&self, room: &RoomId, client_id: &ClientId) -> Roster {
        let mut roster = self.roster(room);
        if let Some(p) = roster.remove(client_id) {
            info!(%room, name = %p.name, "Participant left");
        }
        self.publish(room, &roster);
        roster
    }

    /// Remove `target` on behalf of `actor`. Non-hosts are silently ignored.
    pub fn kick(&self, room: &RoomId, actor: &Participant, target: &ClientId) -> KickOutcome {
        if !actor.is_host {
            debug!(%room, actor = %actor.name, "Ignoring kick from non-host");
            return KickOutcome::Unauthorized;
        }
        let mut roster = self.roster(room);
        let Some(entry) = roster.find(target) else {
            return KickOutcome::NotFound;
        };
        if !PermissionMatrix::can_kick(actor, entry) {
            return KickOutcome::TargetIsHost;
        }
        if let Some(p) = roster.remove(target) {
            info!(%room, name = %p.name, "Participant kicked");
        }
        self.publish(room, &roster);
        KickOutcome::Kicked
    }

    /// Live roster for `room`
    pub fn observe(&self, room: &RoomId) -> RosterObserver
    where
        B: Clone + Send + Sync + 'static,
    {
        let store = self.store.clone();
        let key = room.clone();
        RosterObserver::mount(&self.bus, room.clone(), RecordKind::Roster, move || {
            store.roster(&key)
        })
    }

    fn publish(&self, room: &RoomId, roster: &Roster) {
        crate::invariants::assert_roster_invariants(roster);
        self.store.put_roster(room, roster);
        self.bus.notify(RecordKind::Roster, room);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryBackend, MemoryProfile};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn manager() -> (RoomManager<MemoryBackend>, ChangeBus) {
        let bus = ChangeBus::new();
        let backend = MemoryProfile::new().open_context(&bus);
        (RoomManager::new(KeyedStore::new(backend), bus.clone()), bus)
    }

    fn room() -> RoomId {
        RoomId::parse("abc123").unwrap()
    }

    fn identity(id: &str, name: &str) -> Identity {
        Identity::new(ClientId::new(id), name)
    }

    #[test]
    fn test_join_is_idempotent() {
        let (rooms, _) = manager();
        rooms.join(&room(), identity("a", "Ana"), true);
        rooms.join(&room(), identity("a", "Ana"), true);
        let roster = rooms.join(&room(), identity("a", "Renamed"), false);

        assert_eq!(roster.len(), 1);
        assert!(roster.participants()[0].is_host);
    }

    #[test]
    fn test_join_rejects_duplicate_name() {
        let (rooms, _) = manager();
        rooms.join(&room(), identity("a", "Ana"), true);
        let roster = rooms.join(&room(), identity("b", "Ana"), false);
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn test_join_notifies_own_context() {
        let (rooms, bus) = manager();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let _sub = bus.subscribe(move |n| {
            if n.is_for(&room(), RecordKind::Roster) {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        rooms.join(&room(), identity("a", "Ana"), true);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_leave_removes_and_tolerates_absent() {
        let (rooms, _) = manager();
        rooms.join(&room(), identity("a", "Ana"), true);
        rooms.join(&room(), identity("b", "Ben"), false);

        let roster = rooms.leave(&room(), &ClientId::new("b"));
        assert_eq!(roster.len(), 1);
        let roster = rooms.leave(&room(), &ClientId::new("zzz"));
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn test_kick_by_non_host_is_ignored() {
        let (rooms, _) = manager();
        rooms.join(&room(), identity("a", "Ana"), true);
        let roster = rooms.join(&room(), identity("b", "Ben"), false);
        let ben = roster.find(&ClientId::new("b")).unwrap().clone();
        rooms.join(&room(), identity("c", "Cy"), false);

        let before = rooms.roster(&room());
        let outcome = rooms.kick(&room(), &ben, &ClientId::new("c"));

        assert_eq!(outcome, KickOutcome::Unauthorized);
        assert_eq!(rooms.roster(&room()), before);
    }

    #[test]
    fn test_host_kicks_guest() {
        let (rooms, _) = manager();
        let roster = rooms.join(&room(), identity("a", "Ana"), true);
        let host = roster.find(&ClientId::new("a")).unwrap().clone();
        rooms.join(&room(), identity("b", "Ben"), false);

        assert_eq!(
            rooms.kick(&room(), &host, &ClientId::new("b")),
            KickOutcome::Kicked
        );
        assert_eq!(
            rooms.kick(&room(), &host, &ClientId::new("b")),
            KickOutcome::NotFound
        );
        assert_eq!(
            rooms.kick(&room(), &host, &ClientId::new("a")),
            KickOutcome::TargetIsHost
        );
        assert_eq!(rooms.roster(&room()).len(), 1);
    }

    #[test]
    fn test_capacity_gate() {
        let (rooms, _) = manager();
        for i in 0..DEFAULT_CAPACITY {
            let id = format!("c{i}");
            assert!(rooms.check_capacity(&room(), DEFAULT_CAPACITY).is_ok());
            rooms.join(&room(), identity(&id, &id), i == 0);
        }
        assert!(matches!(
            rooms.check_capacity(&room(), DEFAULT_CAPACITY),
            Err(Error::RoomFull { capacity: 4 })
        ));
        // join itself does not enforce capacity
        assert_eq!(rooms.join(&room(), identity("late", "Late"), false).len(), 5);
    }

    #[test]
    fn test_observer_follows_mutations() {
        let (rooms, _) = manager();
        let observer = rooms.observe(&room());
        assert!(observer.get().is_empty());

        rooms.join(&room(), identity("a", "Ana"), true);
        rooms.join(&room(), identity("b", "Ben"), false);
        assert_eq!(observer.get().len(), 2);

        rooms.leave(&room(), &ClientId::new("a"));
        assert_eq!(observer.get().len(), 1);
    }
}
