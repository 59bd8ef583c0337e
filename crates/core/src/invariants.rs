//! Developer guardrails and invariants
//!
//! Debug assertions for detecting impossible states during development.
//! These checks are compiled out in release builds.

use crate::models::{GameSession, Roster, TILE_COUNT};

/// Client ids in a roster are unique
pub fn assert_roster_invariants(roster: &Roster) {
    for (i, p) in roster.iter().enumerate() {
        debug_assert!(
            !roster.iter().skip(i + 1).any(|q| q.client_id == p.client_id),
            "Roster lists client {} more than once",
            p.client_id
        );
    }
}

/// Every tile in a session is on the board
pub fn assert_session_invariants(session: &GameSession) {
    debug_assert!(
        (1..=TILE_COUNT).contains(&session.hidden_tile),
        "Hidden tile {} is off the board",
        session.hidden_tile
    );

    for p in &session.players {
        debug_assert!(
            (1..=TILE_COUNT).contains(&p.pos),
            "Player {} stands on tile {} which is off the board",
            p.name,
            p.pos
        );
    }

    if let Some(winner) = &session.winner {
        debug_assert!(
            session
                .players
                .iter()
                .any(|p| &p.client_id == winner && p.pos == session.hidden_tile),
            "Winner {} is not standing on the hidden tile",
            winner
        );
    }
}

/// A freshly placed session: distinct start tiles, none on the hidden tile
pub fn assert_fresh_session_invariants(session: &GameSession) {
    assert_session_invariants(session);

    debug_assert!(
        session.players.iter().all(|p| p.pos != session.hidden_tile),
        "A player starts on the hidden tile {}",
        session.hidden_tile
    );

    for (i, p) in session.players.iter().enumerate() {
        debug_assert!(
            !session.players.iter().skip(i + 1).any(|q| q.pos == p.pos),
            "Two players start on tile {}",
            p.pos
        );
    }

    debug_assert!(
        session.turn_count == 0 && session.winner.is_none(),
        "Fresh session already has moves"
    );
}
