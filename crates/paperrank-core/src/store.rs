//! The `PaperStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `paperrank-store-sqlite`). Higher layers (`paperrank-api`,
//! `paperrank-cli`) depend on this abstraction, not on any concrete backend.

use std::{collections::HashMap, future::Future};

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
  paper::{DateCount, NewPaper, Paper},
  rating::{CategoryRating, Rating, RatingAggregate, RatingValue},
  user::User,
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Ordering for [`PaperStore::list_papers`]. Every ordering breaks ties by
/// insertion order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PaperOrder {
  /// Oldest insertion first.
  #[default]
  Inserted,
  /// Most recently published first, then highest score.
  Newest,
  /// Highest cached score first.
  Score,
}

/// Parameters for [`PaperStore::list_papers`].
#[derive(Debug, Clone, Default)]
pub struct PaperQuery {
  /// Restrict to papers published on this UTC day.
  pub published_on:    Option<NaiveDate>,
  /// Restrict to papers published at or after this instant.
  pub published_after: Option<DateTime<Utc>>,
  pub order:           PaperOrder,
  pub limit:           Option<usize>,
  pub offset:          Option<usize>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a paperrank storage backend.
///
/// Papers are never deleted. The only mutation of a paper is its cached
/// score, written by [`PaperStore::replace_scores`].
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait PaperStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Create a user. Fails if the email is already registered.
  fn add_user(
    &self,
    email: String,
    password_hash: String,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn get_user_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  // ── Papers ────────────────────────────────────────────────────────────

  /// Persist a single paper with a zero score. Fails if `arxiv_id` exists
  /// or [`NewPaper::validate`] rejects the input.
  fn add_paper(
    &self,
    input: NewPaper,
  ) -> impl Future<Output = Result<Paper, Self::Error>> + Send + '_;

  /// Persist a batch of papers, skipping any whose `arxiv_id` is already
  /// stored. Returns the number actually inserted. Nothing is written if any
  /// input fails [`NewPaper::validate`].
  fn add_papers(
    &self,
    inputs: Vec<NewPaper>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  fn get_paper(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Paper>, Self::Error>> + Send + '_;

  fn get_paper_by_arxiv_id<'a>(
    &'a self,
    arxiv_id: &'a str,
  ) -> impl Future<Output = Result<Option<Paper>, Self::Error>> + Send + 'a;

  fn list_papers<'a>(
    &'a self,
    query: &'a PaperQuery,
  ) -> impl Future<Output = Result<Vec<Paper>, Self::Error>> + Send + 'a;

  /// Distinct publication days with their paper counts, newest first.
  fn paper_dates(
    &self,
  ) -> impl Future<Output = Result<Vec<DateCount>, Self::Error>> + Send + '_;

  /// Overwrite every cached score: papers in `scores` get their entry, all
  /// others are reset to zero.
  fn replace_scores<'a>(
    &'a self,
    scores: &'a HashMap<Uuid, f64>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Recompute every cached score from the current ratings and return the
  /// number of rated papers.
  ///
  /// The default reads [`PaperStore::rating_aggregates`] and then writes
  /// [`PaperStore::replace_scores`]. A rating landing between the two is
  /// missed until the next refresh. Backends that can read and write in
  /// one transaction should override this.
  fn refresh_scores(&self) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_ {
    async move {
      let scores = crate::score::paper_scores(&self.rating_aggregates().await?);
      self.replace_scores(&scores).await?;
      Ok(scores.len())
    }
  }

  // ── Ratings ───────────────────────────────────────────────────────────

  /// Insert or update the rating for `(user_id, paper_id)`.
  ///
  /// An existing rating keeps its id and `created_at`; only the value
  /// changes.
  fn upsert_rating(
    &self,
    user_id: Uuid,
    paper_id: Uuid,
    value: RatingValue,
  ) -> impl Future<Output = Result<Rating, Self::Error>> + Send + '_;

  fn ratings_for_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Rating>, Self::Error>> + Send + '_;

  /// Average and count per rated paper, in one aggregate pass.
  fn rating_aggregates(
    &self,
  ) -> impl Future<Output = Result<Vec<RatingAggregate>, Self::Error>> + Send + '_;

  /// The user's ratings joined with each rated paper's categories.
  fn category_ratings(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<CategoryRating>, Self::Error>> + Send + '_;
}
