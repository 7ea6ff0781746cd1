//! arXiv ingestion codec for paperrank.
//!
//! Converts arXiv export-API Atom feeds into [`paperrank_core`] paper inputs
//! and builds the per-category, per-day search queries the fetcher issues.
//! Pure synchronous; no HTTP or database dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use paperrank_arxiv::parse_feed;
//!
//! let feed = std::fs::read_to_string("feed.xml").unwrap();
//! for paper in parse_feed(&feed).unwrap() {
//!   println!("{} {}", paper.arxiv_id, paper.title);
//! }
//! ```

pub mod error;
mod parse;
mod query;

pub use error::{Error, Result};
pub use parse::clean_text;
pub use query::{
  ARXIV_API_URL, DEFAULT_CATEGORIES, DEFAULT_MAX_RESULTS, query_params,
  search_query,
};

use paperrank_core::paper::NewPaper;

/// Parse an Atom feed into paper inputs, in feed order.
///
/// Entries without an `<id>` or a valid `<published>` timestamp are skipped
/// with a warning; a feed that is not well-formed XML is an error.
pub fn parse_feed(xml: &str) -> Result<Vec<NewPaper>> { parse::parse_feed(xml) }
