//! Per-paper scoring and the recency factor.
//!
//! A paper's score shrinks its average rating toward zero when it has few
//! ratings: `avg * (1 - 1/(count + 1))`. A single 5-star rating scores 2.5,
//! two score 3.33, and the score approaches the plain average as the count
//! grows. Unrated papers contribute nothing.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::rating::RatingAggregate;

/// Hours over which [`time_decay`] halves a score.
pub const DECAY_HOURS: f64 = 24.0;

/// Shrinkage-adjusted average; zero when `count` is zero.
pub fn shrinkage_score(average: f64, count: u64) -> f64 {
  if count == 0 {
    return 0.0;
  }
  average * (1.0 - 1.0 / (count as f64 + 1.0))
}

/// Score every rated paper. Papers without ratings are absent from the map.
pub fn paper_scores(aggregates: &[RatingAggregate]) -> HashMap<Uuid, f64> {
  aggregates
    .iter()
    .filter(|a| a.count > 0)
    .map(|a| (a.paper_id, shrinkage_score(a.average, a.count)))
    .collect()
}

/// Fractional hours between `published_at` and `now`.
pub fn hours_old(published_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
  (now - published_at).num_milliseconds() as f64 / 3_600_000.0
}

/// `1 / (1 + hours/24)`: 1 at age zero, 0.5 after a day, tending to 0.
///
/// Negative ages (papers dated in the future) are treated as zero.
pub fn time_decay(hours_old: f64) -> f64 {
  1.0 / (1.0 + hours_old.max(0.0) / DECAY_HOURS)
}
