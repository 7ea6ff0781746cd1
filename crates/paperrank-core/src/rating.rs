//! Ratings and the aggregates the scoring engine consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── RatingValue ─────────────────────────────────────────────────────────────

/// A star rating, validated to lie in `0..=5`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "i64", into = "u8")]
pub struct RatingValue(u8);

impl RatingValue {
  pub const MIN: u8 = 0;
  pub const MAX: u8 = 5;

  pub fn new(value: i64) -> Result<Self> {
    if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
      Ok(Self(value as u8))
    } else {
      Err(Error::RatingOutOfRange(value))
    }
  }

  pub fn get(self) -> u8 { self.0 }
}

impl TryFrom<i64> for RatingValue {
  type Error = Error;

  fn try_from(value: i64) -> Result<Self> { Self::new(value) }
}

impl From<RatingValue> for u8 {
  fn from(value: RatingValue) -> Self { value.0 }
}

// ─── Rating ──────────────────────────────────────────────────────────────────

/// One user's rating of one paper. At most one exists per (user, paper) pair;
/// re-rating replaces `value` and keeps `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
  pub rating_id:  Uuid,
  pub user_id:    Uuid,
  pub paper_id:   Uuid,
  #[serde(rename = "rating")]
  pub value:      RatingValue,
  pub created_at: DateTime<Utc>,
}

// ─── Aggregates ──────────────────────────────────────────────────────────────

/// Average and count of all ratings on one paper.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingAggregate {
  pub paper_id: Uuid,
  pub average:  f64,
  pub count:    u64,
}

/// A user's rating joined with the rated paper's serialized categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRating {
  pub value:      RatingValue,
  pub categories: String,
}
