//! Game session model - the persisted board snapshot of one room

use serde::{Deserialize, Serialize};

use super::{ClientId, Participant};

/// Tiles on the circular track, numbered 1..=16
pub const TILE_COUNT: u8 = 16;

/// Faces on the die, numbered 1..=6
pub const DIE_FACES: u8 = 6;

/// One player's token on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerPosition {
    pub client_id: ClientId,
    pub name: String,
    pub pos: u8,
}

/// Board state for one room's game
///
/// Player order is fixed at creation and is the turn order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSession {
    #[serde(alias = "diamond")]
    pub hidden_tile: u8,
    pub players: Vec<PlayerPosition>,
    /// Epoch milliseconds
    pub started_at: i64,
    /// Non-winning rolls so far; the turn pointer is derived from it
    #[serde(default)]
    pub turn_count: u64,
    #[serde(default)]
    pub winner: Option<ClientId>,
}

impl GameSession {
    /// Index into `players` of whoever rolls next
    pub fn turn_index(&self) -> Option<usize> {
        if self.players.is_empty() {
            return None;
        }
        let n = self.players.len() as u64;
        Some((self.turn_count % n) as usize)
    }

    pub fn current_player(&self) -> Option<&PlayerPosition> {
        self.turn_index().and_then(|i| self.players.get(i))
    }

    pub fn winner_player(&self) -> Option<&PlayerPosition> {
        let winner = self.winner.as_ref()?;
        self.players.iter().find(|p| &p.client_id == winner)
    }

    pub fn is_won(&self) -> bool {
        self.winner.is_some()
    }

    pub fn status(&self) -> GameStatus {
        let Some(winner) = &self.winner else {
            return GameStatus::InProgress;
        };
        let name = self
            .winner_player()
            .map_or_else(|| winner.to_string(), |p| p.name.clone());
        GameStatus::Won {
            winner: winner.clone(),
            name,
        }
    }

    /// Every tile is on the board and a recorded winner stands on the
    /// hidden tile
    pub fn is_well_formed(&self) -> bool {
        let on_board = |tile: u8| (1..=TILE_COUNT).contains(&tile);
        on_board(self.hidden_tile)
            && self.players.iter().all(|p| on_board(p.pos))
            && self.winner.as_ref().map_or(true, |winner| {
                self.players
                    .iter()
                    .any(|p| &p.client_id == winner && p.pos == self.hidden_tile)
            })
    }

    /// Players standing on a tile, in turn order
    pub fn occupants(&self, tile: u8) -> impl Iterator<Item = &PlayerPosition> {
        self.players.iter().filter(move |p| p.pos == tile)
    }

    /// Seat the roster in order at the given start positions
    pub(crate) fn seat(
        hidden_tile: u8,
        roster: &[Participant],
        positions: &[u8],
        started_at: i64,
    ) -> Self {
        let players = roster
            .iter()
            .zip(positions)
            .map(|(p, &pos)| PlayerPosition {
                client_id: p.client_id.clone(),
                name: p.name.clone(),
                pos,
            })
            .collect();
        Self {
            hidden_tile,
            players,
            started_at,
            turn_count: 0,
            winner: None,
        }
    }
}

/// Lifecycle of a room's game
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameStatus {
    NotStarted,
    InProgress,
    /// Terminal
    Won { winner: ClientId, name: String },
}

impl GameStatus {
    pub fn of(session: Option<&GameSession>) -> Self {
        session.map_or(GameStatus::NotStarted, GameSession::status)
    }

    pub fn is_started(&self) -> bool {
        !matches!(self, GameStatus::NotStarted)
    }
}

/// Move a token `dice` steps along the ring of tiles.
///
/// Landing exactly on the last tile stays there; going past wraps to 1.
pub fn advance(pos: u8, dice: u8) -> u8 {
    let tiles = u16::from(TILE_COUNT);
    let next = (u16::from(pos) + u16::from(dice) + tiles - 1) % tiles + 1;
    // next is in 1..=TILE_COUNT
    next as u8
}
