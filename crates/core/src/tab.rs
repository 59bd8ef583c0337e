//! One browsing context and the room it is showing
//!
//! A [`Tab`] owns its client id and notification bus. Entering a room joins
//! the roster and mounts live views of both room records; dropping the
//! resulting [`RoomSession`] unmounts them and leaves the roster.

use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::board::BoardView;
use crate::bus::ChangeBus;
use crate::dice::{Dice, RngDice};
use crate::entry::{EntryRequest, InviteLink, RoomBanner};
use crate::error::{Error, Result};
use crate::game::{GameManager, RollOutcome, StartOutcome};
use crate::models::{ClientId, GameSession, GameStatus, Identity, Participant, RoomId, Roster};
use crate::observer::{RosterObserver, SessionObserver};
use crate::permissions::{PermissionMatrix, RoomAction};
use crate::room::{KickOutcome, RoomManager};
use crate::storage::{KeyedStore, StorageBackend};

/// A context bound to shared storage
pub struct Tab<B, D = RngDice<StdRng>> {
    client_id: ClientId,
    bus: ChangeBus,
    rooms: RoomManager<B>,
    games: GameManager<B, D>,
}

impl<B: StorageBackend + Clone> Tab<B> {
    /// `backend` must deliver native notifications for other contexts'
    /// writes to `bus`
    pub fn new(client_id: ClientId, backend: B, bus: ChangeBus) -> Self {
        Self::with_dice(client_id, backend, bus, RngDice::from_entropy())
    }
}

impl<B: StorageBackend + Clone, D: Dice> Tab<B, D> {
    pub fn with_dice(client_id: ClientId, backend: B, bus: ChangeBus, dice: D) -> Self {
        let store = KeyedStore::new(backend);
        Self {
            client_id,
            rooms: RoomManager::new(store.clone(), bus.clone()),
            games: GameManager::with_dice(store, bus.clone(), dice),
            bus,
        }
    }

    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    pub fn bus(&self) -> &ChangeBus {
        &self.bus
    }

    pub fn rooms(&self) -> &RoomManager<B> {
        &self.rooms
    }

    pub fn games(&self) -> &GameManager<B, D> {
        &self.games
    }

    /// Join the requested room and start observing it.
    ///
    /// Guests are turned away with [`Error::RoomFull`] once the roster has
    /// `capacity` entries, unless this tab is already listed.
    pub fn enter(&self, request: &EntryRequest, capacity: usize) -> Result<RoomSession<'_, B, D>>
    where
        B: Send + Sync + 'static,
    {
        let entry = request.resolve()?;
        let room = entry.room_id;

        if request.is_join() && !self.rooms.roster(&room).contains(&self.client_id) {
            self.rooms.check_capacity(&room, capacity)?;
        }

        let identity = Identity::new(self.client_id.clone(), entry.name);
        let me = Participant::new(identity.clone(), entry.is_host);
        self.rooms.join(&room, identity, entry.is_host);
        info!(%room, name = %me.name, is_host = me.is_host, "Entered room");

        Ok(RoomSession {
            roster: self.rooms.observe(&room),
            session: self.games.observe(&room),
            tab: self,
            room,
            me,
            banner: entry.banner,
            left: false,
        })
    }
}

/// A mounted room page
pub struct RoomSession<'t, B: StorageBackend, D: Dice = RngDice<StdRng>> {
    tab: &'t Tab<B, D>,
    room: RoomId,
    /// As asserted on entry
    me: Participant,
    banner: RoomBanner,
    roster: RosterObserver,
    session: SessionObserver,
    left: bool,
}

impl<B: StorageBackend, D: Dice> RoomSession<'_, B, D> {
    pub fn room_id(&self) -> &RoomId {
        &self.room
    }

    pub fn me(&self) -> &Participant {
        &self.me
    }

    pub fn banner(&self) -> &RoomBanner {
        &self.banner
    }

    pub fn roster(&self) -> Roster {
        self.roster.get()
    }

    pub fn session(&self) -> Option<GameSession> {
        self.session.get()
    }

    pub fn status(&self) -> GameStatus {
        GameStatus::of(self.session().as_ref())
    }

    pub fn board(&self) -> BoardView {
        BoardView::build(self.roster().len(), self.session().as_ref())
    }

    /// Changes whenever either observed record is refreshed
    pub fn revision(&self) -> u64 {
        self.roster.version() + self.session.version()
    }

    /// Whether this tab's controls for `action` are live
    pub fn can(&self, action: RoomAction) -> bool {
        PermissionMatrix::can_perform(self.me.is_host, action)
    }

    /// Place the current roster on a fresh board
    pub fn start(&self) -> Result<StartOutcome> {
        self.tab.games.start(&self.room, &self.me, &self.roster())
    }

    /// Roll for whoever's turn it is
    pub fn roll(&self) -> Result<RollOutcome> {
        self.tab.games.roll(&self.room)
    }

    /// Roll only if it is this tab's turn
    pub fn roll_own(&self) -> Result<RollOutcome> {
        let session = self.session().ok_or(Error::GameNotReady)?;
        let seat = session
            .players
            .iter()
            .position(|p| p.client_id == self.me.client_id)
            .ok_or_else(|| Error::InvalidOperation("not seated in this game".into()))?;
        self.tab.games.roll_as(&self.room, seat)
    }

    /// Kick a participant named by display name or client id
    pub fn kick(&self, target: &str) -> KickOutcome {
        let roster = self.roster();
        let Some(entry) = roster
            .find_by_name(target)
            .or_else(|| roster.find(&ClientId::new(target)))
        else {
            return KickOutcome::NotFound;
        };
        self.tab.rooms.kick(&self.room, &self.me, &entry.client_id)
    }

    pub fn invite_link(&self, origin: &str) -> InviteLink {
        InviteLink::new(origin, self.room.clone())
    }

    /// Leave the roster now and unmount
    pub fn leave(mut self) -> Roster {
        self.left = true;
        self.tab.rooms.leave(&self.room, &self.me.client_id)
    }
}

impl<B: StorageBackend, D: Dice> Drop for RoomSession<'_, B, D> {
    fn drop(&mut self) {
        if self.left {
            return;
        }
        debug!(room = %self.room, name = %self.me.name, "Unmounting room, leaving roster");
        self.tab.rooms.leave(&self.room, &self.me.client_id);
    }
}
