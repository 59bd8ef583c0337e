//! Error types for Tilehunt Core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Storage quota exceeded: {needed} bytes needed, {quota} allowed")]
    QuotaExceeded { needed: usize, quota: usize },

    #[error("No room id available")]
    MissingRoom,

    #[error("Invalid room link: {0}")]
    InvalidLink(String),

    #[error("Room is full ({capacity} players)")]
    RoomFull { capacity: usize },

    #[error("Game not started yet (waiting for host)")]
    GameNotReady,

    #[error("Game is over: {winner} found the hidden tile")]
    GameOver { winner: String },

    #[error("Game session has no players")]
    NoPlayers,

    #[error("Not your turn: it is player {expected}'s turn, not {actual}")]
    NotYourTurn { expected: usize, actual: usize },

    #[error("Cannot place {requested} players on {tiles} tiles")]
    TooManyPlayers { requested: usize, tiles: u8 },

    #[error("Gave up placing players after {draws} draws")]
    PlacementExhausted { draws: usize },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
