//! Handlers for `/papers` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/papers` | Optional `?skip=<n>&limit=<n>`; newest first |
//! | `POST` | `/papers` | Body: a new paper; 409 on duplicate `arxiv_id` |
//! | `GET`  | `/papers/dates` | `{"dates":[{"date","count"}]}`, newest first |
//! | `GET`  | `/papers/ranked` | Optional `?days_back=<n>&limit=<n>` |
//! | `GET`  | `/papers/by-date/{date}` | `YYYY-MM-DD`; highest score first |
//! | `GET`  | `/papers/{id}` | 404 if not found |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{Duration, Utc};
use paperrank_core::{
  engine,
  paper::{DateCount, NewPaper, Paper, parse_day},
  rank::RankedPaper,
  store::{PaperOrder, PaperQuery, PaperStore},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ApiState, auth::CurrentUser, error::ApiError};

pub const DEFAULT_PAGE_SIZE: usize = 100;
pub const DEFAULT_DAYS_BACK: u32 = 1;

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub skip:  Option<usize>,
  pub limit: Option<usize>,
}

/// `GET /papers[?skip=<n>&limit=<n>]`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  _user: CurrentUser,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Paper>>, ApiError>
where
  S: PaperStore,
{
  let query = PaperQuery {
    order: PaperOrder::Newest,
    limit: Some(params.limit.unwrap_or(DEFAULT_PAGE_SIZE)),
    offset: params.skip,
    ..PaperQuery::default()
  };
  let papers = state
    .store
    .list_papers(&query)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(papers))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /papers`, body: `{"arxiv_id","title","abstract","authors","categories","published_at"}`
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  _user: CurrentUser,
  Json(body): Json<NewPaper>,
) -> Result<impl IntoResponse, ApiError>
where
  S: PaperStore,
{
  if body.arxiv_id.trim().is_empty() {
    return Err(ApiError::BadRequest("arxiv_id must not be empty".into()));
  }
  body.validate()?;

  let existing = state
    .store
    .get_paper_by_arxiv_id(&body.arxiv_id)
    .await
    .map_err(ApiError::store)?;
  if existing.is_some() {
    return Err(ApiError::Conflict(format!("paper {} already exists", body.arxiv_id)));
  }

  let paper = state
    .store
    .add_paper(body)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(paper)))
}

// ─── Dates ────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct DatesResponse {
  pub dates: Vec<DateCount>,
}

/// `GET /papers/dates`
pub async fn dates<S>(
  State(state): State<ApiState<S>>,
  _user: CurrentUser,
) -> Result<Json<DatesResponse>, ApiError>
where
  S: PaperStore,
{
  let dates = state.store.paper_dates().await.map_err(ApiError::store)?;
  Ok(Json(DatesResponse { dates }))
}

// ─── Ranked ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RankedParams {
  pub days_back: Option<u32>,
  pub limit:     Option<usize>,
}

/// `GET /papers/ranked[?days_back=<n>&limit=<n>]`
pub async fn ranked<S>(
  State(state): State<ApiState<S>>,
  _user: CurrentUser,
  Query(params): Query<RankedParams>,
) -> Result<Json<Vec<RankedPaper>>, ApiError>
where
  S: PaperStore,
{
  let days = params.days_back.unwrap_or(DEFAULT_DAYS_BACK);
  let mut ranked = engine::rank_recent(
    state.store.as_ref(),
    Duration::days(i64::from(days)),
    Utc::now(),
  )
  .await
  .map_err(ApiError::store)?;
  if let Some(limit) = params.limit {
    ranked.truncate(limit);
  }
  Ok(Json(ranked))
}

// ─── By date ──────────────────────────────────────────────────────────────────

/// `GET /papers/by-date/{date}`
pub async fn by_date<S>(
  State(state): State<ApiState<S>>,
  _user: CurrentUser,
  Path(date): Path<String>,
) -> Result<Json<Vec<Paper>>, ApiError>
where
  S: PaperStore,
{
  let day = parse_day(&date)
    .map_err(|_| ApiError::BadRequest(format!("invalid date {date:?}, expected YYYY-MM-DD")))?;
  let query = PaperQuery {
    published_on: Some(day),
    order: PaperOrder::Score,
    ..PaperQuery::default()
  };
  let papers = state
    .store
    .list_papers(&query)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(papers))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /papers/{id}`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  _user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Paper>, ApiError>
where
  S: PaperStore,
{
  let paper = state
    .store
    .get_paper(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("paper {id} not found")))?;
  Ok(Json(paper))
}
