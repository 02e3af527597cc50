//! Standalone remote-API server

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use mnema::config::Config;
use mnema::server::{self, AppState, ServerStore, TokenTableVerifier};

#[derive(Parser)]
#[command(name = "mnema-server", about = "Remote deck/streak/user API server", version)]
struct Args {
    /// Use a specific config file (default: ~/.config/mnema/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to bind (overrides the config)
    #[arg(long)]
    bind: Option<String>,

    /// Token table file with `token = "user-id"` lines
    #[arg(long)]
    tokens: Option<PathBuf>,
}

fn load_tokens(path: &PathBuf) -> anyhow::Result<TokenTableVerifier> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read token file {path:?}"))?;
    let table: HashMap<String, String> =
        toml::from_str(&raw).context("token file must map tokens to user ids")?;
    Ok(TokenTableVerifier::new(table))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref()).context("failed to load config")?;

    let db_path = config
        .server
        .database
        .clone()
        .unwrap_or_else(|| PathBuf::from("mnema-server.db"));
    let store = ServerStore::open(&db_path)?;

    let verifier = match &args.tokens {
        Some(path) => load_tokens(path)?,
        None => {
            log::warn!("no token file given; every request will be rejected with 401");
            TokenTableVerifier::default()
        }
    };

    let bind = args.bind.unwrap_or(config.server.bind);
    let state = AppState::new(store, Arc::new(verifier));
    server::serve(state, &bind).await?;
    Ok(())
}
