//! Local storage layer for Tilehunt

mod keyed;
mod keys;
mod memory;
mod migrations;
mod poller;
mod sqlite;
mod traits;

pub use keyed::KeyedStore;
pub use keys::{RecordKey, RecordKind};
pub use memory::{MemoryBackend, MemoryProfile};
pub use poller::StoragePoller;
pub use sqlite::{SqliteBackend, StorageChange};
pub use traits::StorageBackend;
