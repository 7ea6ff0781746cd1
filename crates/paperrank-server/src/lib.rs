//! HTTP server assembly for paperrank.
//!
//! Loads [`ServerConfig`], wraps the [`paperrank_api`] router under `/api`,
//! and adds request tracing and CORS.

use std::path::{Path, PathBuf};

use axum::{
  Router,
  http::{HeaderValue, Method, header},
};
use paperrank_api::ApiState;
use paperrank_core::store::PaperStore;
use serde::Deserialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` layered
/// under `PAPERRANK_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:              String,
  pub port:              u16,
  pub store_path:        PathBuf,
  /// HMAC secret for access tokens. Required; there is no default.
  pub jwt_secret:        String,
  pub token_ttl_minutes: i64,
  /// Browser origin allowed to call the API. Empty disables CORS.
  pub cors_origin:       String,
}

impl ServerConfig {
  /// Read `path` (optional) and the environment into a config, filling in
  /// defaults for everything except `jwt_secret`.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .set_default("host", "127.0.0.1")?
      .set_default("port", 8000)?
      .set_default("store_path", "~/.local/share/paperrank/paperrank.db")?
      .set_default("token_ttl_minutes", 30)?
      .set_default("cors_origin", "http://localhost:3000")?
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("PAPERRANK").try_parsing(true))
      .build()?
      .try_deserialize()
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application: the API under `/api`, CORS for
/// `cors_origin` when set, and per-request tracing.
pub fn app<S>(state: ApiState<S>, cors_origin: &str) -> Result<Router, header::InvalidHeaderValue>
where
  S: PaperStore + 'static,
{
  let mut app = Router::new().nest("/api", paperrank_api::api_router(state));

  if !cors_origin.is_empty() {
    let cors = CorsLayer::new()
      .allow_origin(HeaderValue::from_str(cors_origin)?)
      .allow_methods([Method::GET, Method::POST])
      .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);
    app = app.layer(cors);
  }

  Ok(app.layer(TraceLayer::new_for_http()))
}
