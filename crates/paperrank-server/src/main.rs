//! paperrank server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) layered under
//! `PAPERRANK_*` environment variables, opens the SQLite store, and serves the
//! JSON API under `/api`.
//!
//! `jwt_secret` has no default and must come from the file or from
//! `PAPERRANK_JWT_SECRET`.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use chrono::Duration;
use clap::Parser;
use paperrank_api::{ApiState, TokenIssuer};
use paperrank_server::{ServerConfig, app};
use paperrank_store_sqlite::{SqliteStore, expand_tilde};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "paperrank API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let server_cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;
  anyhow::ensure!(!server_cfg.jwt_secret.is_empty(), "jwt_secret must not be empty");

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let ttl = Duration::try_minutes(server_cfg.token_ttl_minutes)
    .filter(|ttl| *ttl > Duration::zero())
    .context("token_ttl_minutes must be a positive number of minutes")?;
  let tokens = TokenIssuer::new(&server_cfg.jwt_secret, ttl);
  let state = ApiState::new(Arc::new(store), tokens);

  let app = app(state, &server_cfg.cors_origin)
    .with_context(|| format!("invalid cors_origin {:?}", server_cfg.cors_origin))?;
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!(store = %store_path.display(), "Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
