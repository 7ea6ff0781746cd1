//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microsecond
//! precision, `Z` suffix) so that string comparison matches time order and
//! the first ten characters are the UTC day. UUIDs are stored as hyphenated
//! lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use paperrank_core::{
  paper::Paper,
  rating::{CategoryRating, Rating, RatingAggregate, RatingValue},
  user::User,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawPaper::from_row`].
pub const PAPER_COLUMNS: &str =
  "paper_id, arxiv_id, title, abstract, authors, categories, published_at, score";

/// Raw values read directly from a `papers` row.
pub struct RawPaper {
  pub paper_id:     String,
  pub arxiv_id:     String,
  pub title:        String,
  pub summary:      String,
  pub authors:      String,
  pub categories:   String,
  pub published_at: String,
  pub score:        f64,
}

impl RawPaper {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      paper_id:     row.get(0)?,
      arxiv_id:     row.get(1)?,
      title:        row.get(2)?,
      summary:      row.get(3)?,
      authors:      row.get(4)?,
      categories:   row.get(5)?,
      published_at: row.get(6)?,
      score:        row.get(7)?,
    })
  }

  pub fn into_paper(self) -> Result<Paper> {
    Ok(Paper {
      paper_id:     decode_uuid(&self.paper_id)?,
      arxiv_id:     self.arxiv_id,
      title:        self.title,
      summary:      self.summary,
      authors:      self.authors,
      categories:   self.categories,
      published_at: decode_dt(&self.published_at)?,
      score:        self.score,
    })
  }
}

/// Column list matching [`RawUser::from_row`].
pub const USER_COLUMNS: &str = "user_id, email, password_hash, created_at";

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:       String,
  pub email:         String,
  pub password_hash: String,
  pub created_at:    String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(0)?,
      email:         row.get(1)?,
      password_hash: row.get(2)?,
      created_at:    row.get(3)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:       decode_uuid(&self.user_id)?,
      email:         self.email,
      password_hash: self.password_hash,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Column list matching [`RawRating::from_row`].
pub const RATING_COLUMNS: &str = "rating_id, user_id, paper_id, rating, created_at";

/// Raw values read directly from a `ratings` row.
pub struct RawRating {
  pub rating_id:  String,
  pub user_id:    String,
  pub paper_id:   String,
  pub rating:     i64,
  pub created_at: String,
}

impl RawRating {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      rating_id:  row.get(0)?,
      user_id:    row.get(1)?,
      paper_id:   row.get(2)?,
      rating:     row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn into_rating(self) -> Result<Rating> {
    Ok(Rating {
      rating_id:  decode_uuid(&self.rating_id)?,
      user_id:    decode_uuid(&self.user_id)?,
      paper_id:   decode_uuid(&self.paper_id)?,
      value:      RatingValue::new(self.rating)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// One row of the per-paper `GROUP BY` aggregate.
pub struct RawAggregate {
  pub paper_id: String,
  pub average:  f64,
  pub count:    i64,
}

impl RawAggregate {
  pub fn into_aggregate(self) -> Result<RatingAggregate> {
    Ok(RatingAggregate {
      paper_id: decode_uuid(&self.paper_id)?,
      average:  self.average,
      count:    self.count.max(0) as u64,
    })
  }
}

/// A rating value joined with the rated paper's categories.
pub struct RawCategoryRating {
  pub rating:     i64,
  pub categories: String,
}

impl RawCategoryRating {
  pub fn into_category_rating(self) -> Result<CategoryRating> {
    Ok(CategoryRating {
      value:      RatingValue::new(self.rating)?,
      categories: self.categories,
    })
  }
}
