//! Handlers for `/users` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/users/register` | Body: `{"email","password"}`; 409 if taken |
//! | `POST` | `/users/token` | Form: `username`, `password`; 401 on mismatch |
//! | `GET`  | `/users/me` | The authenticated user |
//! | `GET`  | `/users/me/ratings` | The authenticated user's ratings |
//! | `GET`  | `/users/me/recommendations` | Optional `?limit=<n>` (default 10) |

use axum::{
  Form, Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use paperrank_core::{
  engine,
  rank::RankedPaper,
  rating::Rating,
  store::PaperStore,
  user::User,
};
use serde::Deserialize;

use crate::{
  ApiState,
  auth::{CurrentUser, TokenResponse, hash_password, verify_password},
  error::ApiError,
};

pub const DEFAULT_RECOMMENDATIONS: usize = 10;

/// Emails compare case-insensitively and ignore surrounding whitespace.
pub fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }

// ─── Register ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub email:    String,
  pub password: String,
}

/// `POST /users/register`
pub async fn register<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: PaperStore,
{
  let email = normalize_email(&body.email);
  if !email.contains('@') {
    return Err(ApiError::BadRequest("a valid email is required".into()));
  }
  if body.password.is_empty() {
    return Err(ApiError::BadRequest("password must not be empty".into()));
  }

  let existing = state
    .store
    .get_user_by_email(&email)
    .await
    .map_err(ApiError::store)?;
  if existing.is_some() {
    return Err(ApiError::Conflict("Email already registered".into()));
  }

  let hash = hash_password(&body.password).map_err(|e| ApiError::Internal(e.to_string()))?;
  let user = state
    .store
    .add_user(email, hash)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(user_id = %user.user_id, "registered user");
  Ok((StatusCode::CREATED, Json(user)))
}

// ─── Token ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginForm {
  /// The account email.
  pub username: String,
  pub password: String,
}

/// `POST /users/token`, form-encoded `username` and `password`.
pub async fn token<S>(
  State(state): State<ApiState<S>>,
  Form(form): Form<LoginForm>,
) -> Result<Json<TokenResponse>, ApiError>
where
  S: PaperStore,
{
  let email = normalize_email(&form.username);
  if email.is_empty() || form.password.is_empty() {
    return Err(ApiError::BadRequest("username and password are required".into()));
  }

  let rejected = || ApiError::Unauthorized("Incorrect email or password".into());
  let user = state
    .store
    .get_user_by_email(&email)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(rejected)?;
  if !verify_password(&form.password, &user.password_hash) {
    return Err(rejected());
  }

  let token = state
    .tokens
    .issue(user.user_id)
    .map_err(|e| ApiError::Internal(e.to_string()))?;
  Ok(Json(TokenResponse::bearer(token)))
}

// ─── Me ───────────────────────────────────────────────────────────────────────

/// `GET /users/me`
pub async fn me(CurrentUser(user): CurrentUser) -> Json<User> { Json(user) }

/// `GET /users/me/ratings`
pub async fn my_ratings<S>(
  State(state): State<ApiState<S>>,
  CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Rating>>, ApiError>
where
  S: PaperStore,
{
  let ratings = state
    .store
    .ratings_for_user(user.user_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(ratings))
}

// ─── Recommendations ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RecommendParams {
  pub limit: Option<usize>,
}

/// `GET /users/me/recommendations[?limit=<n>]`
pub async fn recommendations<S>(
  State(state): State<ApiState<S>>,
  CurrentUser(user): CurrentUser,
  Query(params): Query<RecommendParams>,
) -> Result<Json<Vec<RankedPaper>>, ApiError>
where
  S: PaperStore,
{
  let limit = params.limit.unwrap_or(DEFAULT_RECOMMENDATIONS);
  let ranked = engine::recommend(state.store.as_ref(), user.user_id, limit)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(ranked))
}
