//! Handler for `POST /papers/{id}/rate`.
//!
//! Body: `{"rating_value": <0..=5>}`. Rating the same paper again replaces the
//! earlier value. Every accepted rating triggers a full rescore so cached
//! paper scores always reflect the current ratings.

use axum::{
  Json,
  extract::{Path, State},
};
use paperrank_core::{
  engine,
  rating::{Rating, RatingValue},
  store::PaperStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiState, auth::CurrentUser, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct RateBody {
  pub rating_value: i64,
}

/// `POST /papers/{id}/rate`
pub async fn rate<S>(
  State(state): State<ApiState<S>>,
  CurrentUser(user): CurrentUser,
  Path(paper_id): Path<Uuid>,
  Json(body): Json<RateBody>,
) -> Result<Json<Rating>, ApiError>
where
  S: PaperStore,
{
  let value = RatingValue::new(body.rating_value)?;

  state
    .store
    .get_paper(paper_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("paper {paper_id} not found")))?;

  let rating = state
    .store
    .upsert_rating(user.user_id, paper_id, value)
    .await
    .map_err(ApiError::store)?;
  let scored = engine::refresh_scores(state.store.as_ref())
    .await
    .map_err(ApiError::store)?;
  tracing::debug!(%paper_id, value = value.get(), scored, "rating recorded");

  Ok(Json(rating))
}
