//! Error types for `paperrank-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("rating must be an integer between 0 and 5, got {0}")]
  RatingOutOfRange(i64),

  #[error("invalid date {0:?}, expected YYYY-MM-DD")]
  InvalidDate(String),

  #[error("published_at {0} is outside the years 0000 to 9999")]
  PublishedOutOfRange(chrono::DateTime<chrono::Utc>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
