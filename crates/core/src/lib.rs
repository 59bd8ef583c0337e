//! Tilehunt Core Library
//!
//! Room rosters and turn-based game sessions replicated between tabs that
//! share one local store. Storage is the only shared state; change
//! notifications tell each tab when to re-read it.

pub mod board;
pub mod bus;
pub mod config;
pub mod dice;
pub mod entry;
pub mod error;
pub mod game;
pub mod invariants;
pub mod models;
pub mod observer;
pub mod permissions;
pub mod room;
pub mod storage;
pub mod tab;

pub use board::{BoardView, TileView};
pub use bus::{ChangeBus, Notification, Origin, Subscription};
pub use config::Config;
pub use dice::{Dice, RngDice, ScriptedDice};
pub use entry::{
    CreateRoomRequest, DirectLink, EntryRequest, InviteLink, JoinRoomRequest, ResolvedEntry,
    RoomBanner,
};
pub use error::{Error, Result};
pub use game::{place_players, GameManager, RollOutcome, StartOutcome, MAX_PLAYERS};
pub use models::*;
pub use observer::{RecordObserver, RosterObserver, SessionObserver};
pub use permissions::*;
pub use room::{KickOutcome, RoomManager, DEFAULT_CAPACITY};
pub use storage::{
    KeyedStore, MemoryBackend, MemoryProfile, RecordKey, RecordKind, SqliteBackend,
    StorageBackend, StoragePoller,
};
pub use tab::{RoomSession, Tab};
