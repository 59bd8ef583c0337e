//! Storage backend trait
//!
//! The backend stands for per-origin local storage: a flat string-to-string
//! map shared by every context (tab) of one profile. Implementations may be
//! in-memory, SQLite, or a future server-authoritative channel; the room and
//! game managers only ever see this trait.

use crate::error::Result;

/// Raw key/value operations over shared local storage
pub trait StorageBackend {
    /// Read the raw value for a key
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Store a raw value, fully replacing any previous one
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a key
    fn remove_item(&self, key: &str) -> Result<()>;
}

impl<T: StorageBackend + ?Sized> StorageBackend for &T {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        (**self).remove_item(key)
    }
}
