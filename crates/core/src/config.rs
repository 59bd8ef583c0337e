//! Runtime configuration, read from TOML
//!
//! ```toml
//! [room]
//! capacity = 4
//!
//! [storage]
//! path = "/tmp/tilehunt.db"
//!
//! [app]
//! origin = "tilehunt://local"
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::room::DEFAULT_CAPACITY;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "TILEHUNT_CONFIG";

/// Store file name inside the data directory
pub const DATABASE_FILE: &str = "tilehunt.db";

pub const DEFAULT_ORIGIN: &str = "tilehunt://local";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub room: RoomConfig,
    pub storage: StorageConfig,
    pub app: AppConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Soft limit checked before a guest joins
    pub capacity: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Shared store file; the data directory when unset
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Prefix of invite links
    pub origin: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
        }
    }
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load a config file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load from `TILEHUNT_CONFIG`, else `<config dir>/config.toml`
    pub fn load_default() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(Path::new(&path)),
            None => Self::load(&project_dirs()?.config_dir().join("config.toml")),
        }
    }

    /// Where the shared store lives
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.storage.path {
            Some(path) => Ok(path.clone()),
            None => Ok(default_data_dir()?.join(DATABASE_FILE)),
        }
    }
}

pub fn default_data_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().to_path_buf())
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "onyx", "tilehunt").ok_or_else(|| {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine data directory",
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.room.capacity, 4);
        assert_eq!(config.app.origin, "tilehunt://local");
        assert!(config.storage.path.is_none());
    }

    #[test]
    fn test_partial_file() {
        let config = Config::from_toml("[room]\ncapacity = 6\n").unwrap();
        assert_eq!(config.room.capacity, 6);
        assert_eq!(config.app, AppConfig::default());
    }

    #[test]
    fn test_load_missing_and_present() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        assert_eq!(Config::load(&path).unwrap(), Config::default());

        std::fs::write(
            &path,
            "[storage]\npath = \"/srv/rooms.db\"\n[app]\norigin = \"https://play.example\"\n",
        )
        .unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.database_path().unwrap(), PathBuf::from("/srv/rooms.db"));
        assert_eq!(config.app.origin, "https://play.example");
    }

    #[test]
    fn test_bad_toml() {
        assert!(matches!(
            Config::from_toml("[room]\ncapacity = \"four\""),
            Err(Error::Config(_))
        ));
    }
}
