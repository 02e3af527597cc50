//! Application configuration
//!
//! A TOML file selects the storage backend and points the sync engine
//! at the remote API. The backend choice happens here, once, at
//! startup.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::{DeckStore, NullBackend, SqliteBackend, StorageBackend};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Which persistence backend the local store uses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// Durable SQLite database.
    #[default]
    Sqlite,
    /// No persistence; empty defaults, in-memory only.
    Ephemeral,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StorageConfig {
    pub kind: StorageKind,
    /// Database path; defaults to `<data dir>/mnema/mnema.db`.
    pub path: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            kind: StorageKind::Sqlite,
            path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ApiConfig {
    pub url: String,
    /// Bearer token identifying the user; absent means signed out.
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:3000".to_string(),
            token: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ServerConfig {
    pub bind: String,
    /// Server-side database path; defaults next to the local store.
    pub database: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            database: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub api: ApiConfig,
    pub server: ServerConfig,
}

impl Config {
    /// Default config file location (`~/.config/mnema/config.toml` on
    /// Linux).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mnema").join("config.toml"))
    }

    fn default_db_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mnema")
            .join("mnema.db")
    }

    /// Load from `path`, falling back to defaults when the file does not
    /// exist. `MNEMA_TOKEN` and `MNEMA_API_URL` override the file.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(Path::to_path_buf).or_else(Self::default_path);
        let mut config = match path {
            Some(path) if path.exists() => {
                let raw = std::fs::read_to_string(&path)?;
                toml::from_str(&raw)?
            }
            _ => Self::default(),
        };

        if let Ok(token) = std::env::var("MNEMA_TOKEN") {
            config.api.token = Some(token);
        }
        if let Ok(url) = std::env::var("MNEMA_API_URL") {
            config.api.url = url;
        }
        Ok(config)
    }

    /// Construct the backend this config selects.
    pub fn open_backend(&self) -> crate::store::Result<Box<dyn StorageBackend>> {
        match self.storage.kind {
            StorageKind::Sqlite => {
                let path = self
                    .storage
                    .path
                    .clone()
                    .unwrap_or_else(Self::default_db_path);
                Ok(Box::new(SqliteBackend::open(&path)?))
            }
            StorageKind::Ephemeral => {
                log::warn!("ephemeral storage selected; data will not persist");
                Ok(Box::new(NullBackend))
            }
        }
    }

    /// Open the local store with the configured backend.
    pub fn open_store(&self) -> crate::store::Result<DeckStore> {
        DeckStore::open(self.open_backend()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let config = Config::load(Some(Path::new("/nonexistent/mnema.toml"))).unwrap();
        assert_eq!(config.storage.kind, StorageKind::Sqlite);
        assert_eq!(config.api.url, "http://localhost:3000");
    }

    #[test]
    fn toml_round_trip() {
        let raw = r#"
            [storage]
            kind = "ephemeral"

            [api]
            url = "https://sync.example.com"
            timeout-secs = 10

            [server]
            bind = "0.0.0.0:8080"
        "#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.storage.kind, StorageKind::Ephemeral);
        assert_eq!(config.api.url, "https://sync.example.com");
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.server.bind, "0.0.0.0:8080");
    }
}
