//! Render-ready view of a room's board

use crate::models::{GameSession, GameStatus, TILE_COUNT};

/// One square of the board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileView {
    pub number: u8,
    /// Names of the players standing here, in turn order
    pub occupants: Vec<String>,
    /// Only ever true once the game is won
    pub is_hidden: bool,
}

/// Everything the game surface shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardView {
    pub tiles: Vec<TileView>,
    pub started: bool,
    /// Players in the room roster, not the session
    pub player_count: usize,
    pub turn_name: Option<String>,
    pub winner: Option<String>,
}

impl BoardView {
    pub fn build(roster_len: usize, session: Option<&GameSession>) -> Self {
        let status = GameStatus::of(session);
        let winner = match &status {
            GameStatus::Won { name, .. } => Some(name.clone()),
            _ => None,
        };
        let revealed = session.filter(|_| winner.is_some()).map(|s| s.hidden_tile);

        let tiles = (1..=TILE_COUNT)
            .map(|number| TileView {
                number,
                occupants: session
                    .map(|s| s.occupants(number).map(|p| p.name.clone()).collect())
                    .unwrap_or_default(),
                is_hidden: revealed == Some(number),
            })
            .collect();

        let turn_name = match &status {
            GameStatus::InProgress => session
                .and_then(GameSession::current_player)
                .map(|p| p.name.clone()),
            _ => None,
        };

        Self {
            tiles,
            started: status.is_started(),
            player_count: roster_len,
            turn_name,
            winner,
        }
    }

    pub fn tile(&self, number: u8) -> Option<&TileView> {
        self.tiles.iter().find(|t| t.number == number)
    }
}
