//! Store key derivation for room-scoped records

use std::fmt;

use crate::models::RoomId;

const ROOM_PREFIX: &str = "room_";
const ROSTER_SUFFIX: &str = "_participants";
const GAME_SUFFIX: &str = "_game";

/// The two logical records kept per room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Roster,
    GameSession,
}

impl RecordKind {
    fn suffix(self) -> &'static str {
        match self {
            RecordKind::Roster => ROSTER_SUFFIX,
            RecordKind::GameSession => GAME_SUFFIX,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Roster => write!(f, "roster"),
            RecordKind::GameSession => write!(f, "game"),
        }
    }
}

/// A record kind bound to a room
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    pub room: RoomId,
    pub kind: RecordKind,
}

impl RecordKey {
    pub fn new(room: &RoomId, kind: RecordKind) -> Self {
        Self {
            room: room.clone(),
            kind,
        }
    }

    /// The raw storage key, e.g. `room_abc123_participants`
    pub fn storage_key(&self) -> String {
        format!("{}{}{}", ROOM_PREFIX, self.room, self.kind.suffix())
    }

    /// Recognise a raw storage key. Unrelated keys yield `None`.
    pub fn parse(key: &str) -> Option<Self> {
        let rest = key.strip_prefix(ROOM_PREFIX)?;
        let (room, kind) = if let Some(room) = rest.strip_suffix(ROSTER_SUFFIX) {
            (room, RecordKind::Roster)
        } else if let Some(room) = rest.strip_suffix(GAME_SUFFIX) {
            (room, RecordKind::GameSession)
        } else {
            return None;
        };
        let room = RoomId::parse(room).ok()?;
        Some(Self { room, kind })
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.storage_key())
    }
}
