//! Game session management
//!
//! Per room: `NotStarted -> InProgress -> Won`. The session record is the
//! single source of truth, including whose turn it is, so every observer of
//! a room derives the same turn and the same terminal state.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::bus::ChangeBus;
use crate::dice::{Dice, RngDice};
use crate::error::{Error, Result};
use crate::models::{
    advance, GameSession, GameStatus, Participant, PlayerPosition, RoomId, Roster, DIE_FACES,
    TILE_COUNT,
};
use crate::observer::SessionObserver;
use crate::permissions::{PermissionMatrix, RoomAction};
use crate::storage::{KeyedStore, RecordKind, StorageBackend};

/// Most players that can get distinct start tiles besides the hidden one
pub const MAX_PLAYERS: usize = TILE_COUNT as usize - 1;

/// Upper bound on tile draws while placing players
pub const MAX_PLACEMENT_DRAWS: usize = 10_000;

/// Result of a start request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Started(GameSession),
    /// A session already existed and was kept as is
    AlreadyStarted(GameSession),
    /// Actor is not host; nothing was written
    Unauthorized,
}

/// What one roll did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollOutcome {
    pub dice: u8,
    pub from: u8,
    /// Index of the player who rolled
    pub player_index: usize,
    /// The player after moving
    pub player: PlayerPosition,
    pub won_by: Option<PlayerPosition>,
}

impl RollOutcome {
    pub fn to(&self) -> u8 {
        self.player.pos
    }

    pub fn is_win(&self) -> bool {
        self.won_by.is_some()
    }
}

/// Draw the hidden tile, then distinct start tiles for `roster` in order
pub fn place_players<D: Dice + ?Sized>(
    dice: &mut D,
    roster: &[Participant],
    started_at: i64,
) -> Result<GameSession> {
    if roster.len() > MAX_PLAYERS {
        return Err(Error::TooManyPlayers {
            requested: roster.len(),
            tiles: TILE_COUNT,
        });
    }
    let hidden_tile = dice.tile();
    if !(1..=TILE_COUNT).contains(&hidden_tile) {
        return Err(Error::InvalidOperation(format!(
            "hidden tile {hidden_tile} is off the board"
        )));
    }

    let mut positions = Vec::with_capacity(roster.len());
    let mut draws = 0;
    while positions.len() < roster.len() {
        if draws >= MAX_PLACEMENT_DRAWS {
            return Err(Error::PlacementExhausted { draws });
        }
        draws += 1;
        let tile = dice.tile();
        if (1..=TILE_COUNT).contains(&tile) && tile != hidden_tile && !positions.contains(&tile)
        {
            positions.push(tile);
        }
    }
    debug!(hidden_tile, draws, players = roster.len(), "Placed players");
    Ok(GameSession::seat(hidden_tile, roster, &positions, started_at))
}

/// Game start, dice resolution and win detection for rooms
pub struct GameManager<B, D = RngDice<StdRng>> {
    store: KeyedStore<B>,
    bus: ChangeBus,
    dice: Mutex<D>,
}

impl<B: StorageBackend> GameManager<B> {
    /// Manager with entropy-seeded dice
    pub fn new(store: KeyedStore<B>, bus: ChangeBus) -> Self {
        Self::with_dice(store, bus, RngDice::from_entropy())
    }
}

impl<B: StorageBackend, D: Dice> GameManager<B, D> {
    pub fn with_dice(store: KeyedStore<B>, bus: ChangeBus, dice: D) -> Self {
        Self {
            store,
            bus,
            dice: Mutex::new(dice),
        }
    }

    pub fn session(&self, room: &RoomId) -> Option<GameSession> {
        self.store.session(room)
    }

    pub fn status(&self, room: &RoomId) -> GameStatus {
        GameStatus::of(self.session(room).as_ref())
    }

    /// Create the room's session from a roster snapshot.
    ///
    /// Only a host may start, and only once: an existing session is never
    /// overwritten.
    pub fn start(
        &self,
        room: &RoomId,
        actor: &Participant,
        roster: &Roster,
    ) -> Result<StartOutcome> {
        if !PermissionMatrix::can_perform(actor.is_host, RoomAction::StartGame) {
            debug!(%room, actor = %actor.name, "Ignoring start from non-host");
            return Ok(StartOutcome::Unauthorized);
        }
        if let Some(existing) = self.session(room) {
            debug!(%room, "Session already exists, keeping it");
            return Ok(StartOutcome::AlreadyStarted(existing));
        }

        let started_at = Utc::now().timestamp_millis();
        let session = place_players(&mut *self.dice(), roster.participants(), started_at)?;
        crate::invariants::assert_fresh_session_invariants(&session);

        info!(%room, players = session.players.len(), "Game started");
        self.publish(room, &session);
        Ok(StartOutcome::Started(session))
    }

    /// Roll for whoever's turn the session records
    pub fn roll(&self, room: &RoomId) -> Result<RollOutcome> {
        let session = self.playable(room)?;
        let index = session.turn_index().ok_or(Error::NoPlayers)?;
        self.resolve(room, session, index)
    }

    /// Roll for `acting_index`, rejecting it when it is not that player's turn
    pub fn roll_as(&self, room: &RoomId, acting_index: usize) -> Result<RollOutcome> {
        let session = self.playable(room)?;
        let index = session.turn_index().ok_or(Error::NoPlayers)?;
        if index != acting_index {
            return Err(Error::NotYourTurn {
                expected: index,
                actual: acting_index,
            });
        }
        self.resolve(room, session, index)
    }

    /// Live session for `room`
    pub fn observe(&self, room: &RoomId) -> SessionObserver
    where
        B: Clone + Send + Sync + 'static,
    {
        let store = self.store.clone();
        let key = room.clone();
        SessionObserver::mount(&self.bus, room.clone(), RecordKind::GameSession, move || {
            store.session(&key)
        })
    }

    fn playable(&self, room: &RoomId) -> Result<GameSession> {
        let session = self.session(room).ok_or(Error::GameNotReady)?;
        if let GameStatus::Won { name, .. } = session.status() {
            return Err(Error::GameOver { winner: name });
        }
        Ok(session)
    }

    fn resolve(
        &self,
        room: &RoomId,
        mut session: GameSession,
        index: usize,
    ) -> Result<RollOutcome> {
        let dice = self.dice().roll();
        if !(1..=DIE_FACES).contains(&dice) {
            return Err(Error::InvalidOperation(format!("die showed {dice}")));
        }
        let hidden_tile = session.hidden_tile;
        let player = session.players.get_mut(index).ok_or(Error::NoPlayers)?;
        let from = player.pos;
        player.pos = advance(from, dice);
        let player = player.clone();

        let won_by = if player.pos == hidden_tile {
            session.winner = Some(player.client_id.clone());
            info!(%room, winner = %player.name, tile = hidden_tile, "Hidden tile found");
            Some(player.clone())
        } else {
            session.turn_count += 1;
            None
        };
        debug!(%room, player = %player.name, dice, from, to = player.pos, "Rolled");

        self.publish(room, &session);
        Ok(RollOutcome {
            dice,
            from,
            player_index: index,
            player,
            won_by,
        })
    }

    fn publish(&self, room: &RoomId, session: &GameSession) {
        crate::invariants::assert_session_invariants(session);
        self.store.put_session(room, session);
        self.bus.notify(RecordKind::GameSession, room);
    }

    fn dice(&self) -> MutexGuard<'_, D> {
        self.dice.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
