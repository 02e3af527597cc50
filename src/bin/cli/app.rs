//! Shared CLI context: config, local store and sync plumbing

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;

use mnema::config::Config;
use mnema::store::DeckStore;
use mnema::sync::{ApiClient, SyncService};

pub struct App {
    pub config: Config,
    pub store: Arc<Mutex<DeckStore>>,
}

impl App {
    pub fn new(config_path: Option<&Path>) -> anyhow::Result<Self> {
        let config = Config::load(config_path).context("failed to load config")?;
        let store = config.open_store().context("failed to open local store")?;
        Ok(Self {
            config,
            store: Arc::new(Mutex::new(store)),
        })
    }

    /// Authenticated API client, or an error when no token is configured.
    pub fn api_client(&self) -> anyhow::Result<ApiClient> {
        let token = self
            .config
            .api
            .token
            .as_deref()
            .context("not signed in: set api.token in the config or MNEMA_TOKEN")?;
        Ok(ApiClient::new(
            &self.config.api.url,
            token,
            Some(Duration::from_secs(self.config.api.timeout_secs)),
        )?)
    }

    pub fn sync_service(&self) -> anyhow::Result<SyncService> {
        Ok(SyncService::new(self.store.clone(), self.api_client()?))
    }
}
