//! JSON REST API for paperrank.
//!
//! Exposes an axum [`Router`] backed by any [`paperrank_core::store::PaperStore`].
//! Every route except registration and token issuance requires an
//! `Authorization: Bearer <token>` header. TLS, CORS, and request tracing are
//! the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", paperrank_api::api_router(state))
//! ```

pub mod auth;
pub mod error;
pub mod papers;
pub mod ratings;
pub mod users;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use paperrank_core::store::PaperStore;

pub use auth::{CurrentUser, TokenIssuer};
pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct ApiState<S> {
  pub store:  Arc<S>,
  pub tokens: Arc<TokenIssuer>,
}

impl<S> ApiState<S> {
  pub fn new(store: Arc<S>, tokens: TokenIssuer) -> Self {
    Self { store, tokens: Arc::new(tokens) }
  }
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      tokens: Arc::clone(&self.tokens),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: PaperStore + 'static,
{
  Router::new()
    // Users
    .route("/users/register", post(users::register::<S>))
    .route("/users/token", post(users::token::<S>))
    .route("/users/me", get(users::me))
    .route("/users/me/ratings", get(users::my_ratings::<S>))
    .route("/users/me/recommendations", get(users::recommendations::<S>))
    // Papers
    .route("/papers", get(papers::list::<S>).post(papers::create::<S>))
    .route("/papers/dates", get(papers::dates::<S>))
    .route("/papers/ranked", get(papers::ranked::<S>))
    .route("/papers/by-date/{date}", get(papers::by_date::<S>))
    .route("/papers/{id}", get(papers::get_one::<S>))
    // Ratings
    .route("/papers/{id}/rate", post(ratings::rate::<S>))
    .with_state(state)
}

#[cfg(test)]
mod tests;
