//! Paper types: the ingested arXiv metadata plus its cached score.
//!
//! Authors and categories are kept in their serialized string form, exactly as
//! they arrive from ingestion. Use [`Paper::author_names`] and
//! [`split_categories`] to read them as lists.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Calendar-day format used in URLs, CLI flags, and the date listing.
pub const DAY_FORMAT: &str = "%Y-%m-%d";

// ─── Paper ───────────────────────────────────────────────────────────────────

/// A stored paper. Never deleted; only `score` changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
  pub paper_id:     Uuid,
  /// External identifier, e.g. `2401.12345v1`. Unique across the store.
  pub arxiv_id:     String,
  pub title:        String,
  #[serde(rename = "abstract")]
  pub summary:      String,
  /// Comma-separated author names.
  pub authors:      String,
  /// Whitespace-separated category tags, e.g. `cs.AI cs.LG`.
  pub categories:   String,
  pub published_at: DateTime<Utc>,
  /// Cached shrinkage score; see [`crate::score`].
  pub score:        f64,
}

impl Paper {
  /// Author names, trimmed, in feed order.
  pub fn author_names(&self) -> impl Iterator<Item = &str> {
    self.authors.split(',').map(str::trim).filter(|a| !a.is_empty())
  }

  /// The distinct category tags of this paper.
  pub fn category_tags(&self) -> BTreeSet<&str> {
    split_categories(&self.categories)
  }

  /// The UTC calendar day this paper was published on.
  pub fn published_on(&self) -> NaiveDate { self.published_at.date_naive() }
}

/// Split a serialized category list into its distinct tags.
pub fn split_categories(categories: &str) -> BTreeSet<&str> {
  categories.split_whitespace().collect()
}

// ─── NewPaper ────────────────────────────────────────────────────────────────

/// Input to [`crate::store::PaperStore::add_paper`]. The store assigns the id
/// and starts the score at zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPaper {
  pub arxiv_id:     String,
  pub title:        String,
  #[serde(rename = "abstract")]
  pub summary:      String,
  pub authors:      String,
  pub categories:   String,
  pub published_at: DateTime<Utc>,
}

impl NewPaper {
  /// Reject publication instants that have no four-digit-year RFC 3339 form.
  /// Stores key their day buckets on that form.
  pub fn validate(&self) -> Result<()> {
    if !(0..=9999).contains(&self.published_at.year()) {
      return Err(Error::PublishedOutOfRange(self.published_at));
    }
    Ok(())
  }
}

// ─── Date buckets ────────────────────────────────────────────────────────────

/// Number of papers published on one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateCount {
  pub date:  NaiveDate,
  pub count: u64,
}

/// Parse a `YYYY-MM-DD` day.
pub fn parse_day(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DAY_FORMAT)
    .map_err(|_| Error::InvalidDate(s.to_owned()))
}
