//! Password hashing, bearer-token issuance, and the authenticated-user
//! extractor.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use paperrank_core::{store::PaperStore, user::User};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

// ─── Passwords ───────────────────────────────────────────────────────────────

/// Hash `password` into an argon2id PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)?
      .to_string(),
  )
}

/// Check `password` against a stored PHC string. A malformed hash never
/// verifies.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
  PasswordHash::new(password_hash)
    .and_then(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed))
    .is_ok()
}

// ─── Tokens ──────────────────────────────────────────────────────────────────

/// Claims carried by an access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
  /// The user id.
  pub sub: String,
  pub iat: i64,
  pub exp: i64,
}

/// Issues and validates HS256 access tokens.
pub struct TokenIssuer {
  encoding: EncodingKey,
  decoding: DecodingKey,
  ttl:      Duration,
}

impl TokenIssuer {
  pub fn new(secret: &str, ttl: Duration) -> Self {
    Self {
      encoding: EncodingKey::from_secret(secret.as_bytes()),
      decoding: DecodingKey::from_secret(secret.as_bytes()),
      ttl,
    }
  }

  /// Sign a token for `user_id` that expires after the configured lifetime.
  pub fn issue(&self, user_id: Uuid) -> jsonwebtoken::errors::Result<String> {
    let now = Utc::now();
    let claims = Claims {
      sub: user_id.to_string(),
      iat: now.timestamp(),
      exp: (now + self.ttl).timestamp(),
    };
    jsonwebtoken::encode(&Header::default(), &claims, &self.encoding)
  }

  /// Validate signature and expiry, returning the user id.
  pub fn verify(&self, token: &str) -> Result<Uuid, ApiError> {
    let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &Validation::default())
      .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
          ApiError::Unauthorized("token expired".into())
        }
        _ => ApiError::Unauthorized("invalid token".into()),
      })?;
    Uuid::parse_str(&data.claims.sub)
      .map_err(|_| ApiError::Unauthorized("invalid token subject".into()))
  }
}

/// Response body of `POST /users/token`.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
  pub access_token: String,
  pub token_type:   String,
}

impl TokenResponse {
  pub fn bearer(access_token: String) -> Self {
    Self { access_token, token_type: "bearer".into() }
  }
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// The credentials of an `Authorization: Bearer <token>` header. The scheme
/// name is case-insensitive.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
  let (scheme, token) = value.trim_start().split_once(' ')?;
  if !scheme.eq_ignore_ascii_case("bearer") {
    return None;
  }
  Some(token.trim()).filter(|t| !t.is_empty())
}

/// The user named by a valid `Authorization: Bearer` token.
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<ApiState<S>> for CurrentUser
where
  S: PaperStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer_token(&parts.headers)
      .ok_or_else(|| ApiError::Unauthorized("missing bearer token".into()))?;
    let user_id = state.tokens.verify(token)?;

    let user = state
      .store
      .get_user(user_id)
      .await
      .map_err(ApiError::store)?
      .ok_or_else(|| ApiError::Unauthorized("unknown user".into()))?;
    Ok(CurrentUser(user))
  }
}
