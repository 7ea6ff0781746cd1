//! Async HTTP client for the arXiv export API.

use std::{collections::HashSet, time::Duration};

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use paperrank_arxiv::{parse_feed, query_params};
use paperrank_core::paper::NewPaper;
use reqwest::Client;
use tracing::{debug, info, warn};

/// Connection settings for the arXiv export API.
#[derive(Debug, Clone)]
pub struct ArxivConfig {
  pub base_url:    String,
  pub max_results: u32,
  /// Pause between consecutive requests.
  pub delay:       Duration,
}

/// Async HTTP client for arXiv Atom queries.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ArxivClient {
  client: Client,
  config: ArxivConfig,
}

impl ArxivClient {
  pub fn new(config: ArxivConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  /// Papers submitted to `category` on `day`.
  pub async fn fetch_category(&self, category: &str, day: NaiveDate) -> Result<Vec<NewPaper>> {
    let resp = self
      .client
      .get(&self.config.base_url)
      .query(&query_params(category, day, self.config.max_results))
      .send()
      .await
      .with_context(|| format!("querying {category} for {day} failed"))?;

    if !resp.status().is_success() {
      return Err(anyhow!("query for {category} on {day} → {}", resp.status()));
    }
    let body = resp.text().await.context("reading arXiv response")?;
    parse_feed(&body).with_context(|| format!("parsing feed for {category} on {day}"))
  }

  /// Fetch every category for every day, in order. A failing category is
  /// logged and skipped; papers cross-listed in several categories or days
  /// appear once.
  pub async fn fetch_days(
    &self,
    categories: &[String],
    days: impl IntoIterator<Item = NaiveDate>,
  ) -> Vec<NewPaper> {
    let mut seen = HashSet::new();
    let mut papers = Vec::new();
    let mut first = true;

    for day in days {
      let before = papers.len();
      for category in categories {
        if !first && !self.config.delay.is_zero() {
          tokio::time::sleep(self.config.delay).await;
        }
        first = false;

        match self.fetch_category(category, day).await {
          Ok(batch) => {
            debug!(%category, %day, fetched = batch.len(), "category fetched");
            merge_unique(&mut seen, &mut papers, batch);
          }
          Err(e) => warn!(%category, %day, error = format!("{e:#}"), "skipping category"),
        }
      }
      info!(%day, found = papers.len() - before, "day fetched");
    }

    papers
  }
}

/// Append the papers of `batch` whose `arxiv_id` has not been seen yet.
pub fn merge_unique(seen: &mut HashSet<String>, out: &mut Vec<NewPaper>, batch: Vec<NewPaper>) {
  out.extend(batch.into_iter().filter(|p| seen.insert(p.arxiv_id.clone())));
}
