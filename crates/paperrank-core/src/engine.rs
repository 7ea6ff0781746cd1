//! Store-backed scoring, ranking, and recommendation.
//!
//! Each function issues a few read queries against a [`PaperStore`] and hands
//! the results to the pure functions in [`crate::score`] and [`crate::rank`].

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::{
  rank::{self, RankedPaper},
  score,
  store::{PaperOrder, PaperQuery, PaperStore},
};

/// Recompute every paper's cached score from the current ratings.
///
/// Returns the number of papers that have at least one rating. See
/// [`PaperStore::refresh_scores`] for the atomicity the backend provides.
pub async fn refresh_scores<S: PaperStore>(store: &S) -> Result<usize, S::Error> {
  store.refresh_scores().await
}

/// Rank the papers published within `window` of `now` by decayed score.
///
/// A window reaching past the representable range covers every paper.
pub async fn rank_recent<S: PaperStore>(
  store: &S,
  window: Duration,
  now: DateTime<Utc>,
) -> Result<Vec<RankedPaper>, S::Error> {
  let query = PaperQuery {
    published_after: now.checked_sub_signed(window),
    order: PaperOrder::Inserted,
    ..PaperQuery::default()
  };
  let papers = store.list_papers(&query).await?;
  let scores = score::paper_scores(&store.rating_aggregates().await?);
  Ok(rank::rank_papers(papers, &scores, now))
}

/// Personalised recommendations for `user_id`, at most `limit` of them.
///
/// Users without ratings get the plain score ranking.
pub async fn recommend<S: PaperStore>(
  store: &S,
  user_id: Uuid,
  limit: usize,
) -> Result<Vec<RankedPaper>, S::Error> {
  let affinity = rank::category_affinity(&store.category_ratings(user_id).await?);

  if affinity.is_empty() {
    let query = PaperQuery {
      order: PaperOrder::Score,
      limit: Some(limit),
      ..PaperQuery::default()
    };
    let papers = store.list_papers(&query).await?;
    return Ok(rank::by_score(papers, limit));
  }

  let papers = store.list_papers(&PaperQuery::default()).await?;
  Ok(rank::personalize(papers, &affinity, limit))
}
