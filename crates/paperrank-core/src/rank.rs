//! Ranking and personalised recommendation over already-loaded papers.
//!
//! Everything here is pure; [`crate::engine`] loads the inputs from a store.
//! All orderings are stable, so equal scores keep the input order.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  paper::{Paper, split_categories},
  rating::{CategoryRating, RatingValue},
  score::{hours_old, time_decay},
};

/// A paper together with the score it was ordered by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPaper {
  #[serde(flatten)]
  pub paper:         Paper,
  pub ranking_score: f64,
}

fn sort_descending(ranked: &mut [RankedPaper]) {
  ranked.sort_by(|a, b| b.ranking_score.total_cmp(&a.ranking_score));
}

// ─── Recency ranking ─────────────────────────────────────────────────────────

/// Order `papers` by `score * time_decay(age)`, highest first.
///
/// `scores` comes from [`crate::score::paper_scores`]; papers missing from it
/// rank with zero.
pub fn rank_papers(
  papers: Vec<Paper>,
  scores: &HashMap<Uuid, f64>,
  now: DateTime<Utc>,
) -> Vec<RankedPaper> {
  let mut ranked: Vec<RankedPaper> = papers
    .into_iter()
    .map(|paper| {
      let base  = scores.get(&paper.paper_id).copied().unwrap_or(0.0);
      let decay = time_decay(hours_old(paper.published_at, now));
      RankedPaper { ranking_score: base * decay, paper }
    })
    .collect();
  sort_descending(&mut ranked);
  ranked
}

// ─── Category affinity ───────────────────────────────────────────────────────

/// Average rating per category tag. A rating on a paper with several
/// categories counts once toward each of them.
pub fn category_affinity(ratings: &[CategoryRating]) -> HashMap<String, f64> {
  let mut totals: HashMap<&str, (u64, u64)> = HashMap::new();
  for rating in ratings {
    for tag in split_categories(&rating.categories) {
      let (sum, count) = totals.entry(tag).or_default();
      *sum += u64::from(rating.value.get());
      *count += 1;
    }
  }
  totals
    .into_iter()
    .map(|(tag, (sum, count))| (tag.to_owned(), sum as f64 / count as f64))
    .collect()
}

/// Multiplier applied to a paper's score for a user with `affinity`.
///
/// Each distinct shared category multiplies by `1 + affinity/5`.
pub fn category_boost(paper: &Paper, affinity: &HashMap<String, f64>) -> f64 {
  paper
    .category_tags()
    .into_iter()
    .filter_map(|tag| affinity.get(tag))
    .map(|a| 1.0 + a / f64::from(RatingValue::MAX))
    .product()
}

// ─── Recommendation ──────────────────────────────────────────────────────────

/// Boost each paper's cached score by the user's category affinity, order
/// highest first, and keep the top `limit`.
pub fn personalize(
  papers: Vec<Paper>,
  affinity: &HashMap<String, f64>,
  limit: usize,
) -> Vec<RankedPaper> {
  let mut ranked: Vec<RankedPaper> = papers
    .into_iter()
    .map(|paper| RankedPaper {
      ranking_score: paper.score * category_boost(&paper, affinity),
      paper,
    })
    .collect();
  sort_descending(&mut ranked);
  ranked.truncate(limit);
  ranked
}

/// Plain cached-score ranking; the fallback for users with no ratings.
pub fn by_score(papers: Vec<Paper>, limit: usize) -> Vec<RankedPaper> {
  personalize(papers, &HashMap::new(), limit)
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone};

  use super::*;

  fn now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap() }

  fn paper(categories: &str, score: f64, hours: i64) -> Paper {
    Paper {
      paper_id:     Uuid::new_v4(),
      arxiv_id:     format!("2401.{:05}", hours),
      title:        format!("{categories} paper"),
      summary:      String::new(),
      authors:      "Author".into(),
      categories:   categories.into(),
      published_at: now() - Duration::hours(hours),
      score,
    }
  }

  fn rated(value: i64, categories: &str) -> CategoryRating {
    CategoryRating {
      value:      RatingValue::new(value).unwrap(),
      categories: categories.into(),
    }
  }

  fn ids(ranked: &[RankedPaper]) -> Vec<Uuid> {
    ranked.iter().map(|r| r.paper.paper_id).collect()
  }

  // ── rank_papers ───────────────────────────────────────────────────────────

  #[test]
  fn newer_paper_wins_at_equal_score() {
    let old   = paper("cs.AI", 0.0, 24);
    let fresh = paper("cs.AI", 0.0, 0);
    let scores = HashMap::from([(old.paper_id, 3.0), (fresh.paper_id, 3.0)]);

    let ranked = rank_papers(vec![old.clone(), fresh.clone()], &scores, now());
    assert_eq!(ids(&ranked), [fresh.paper_id, old.paper_id]);
    assert!((ranked[0].ranking_score - 3.0).abs() < 1e-9);
    assert!((ranked[1].ranking_score - 1.5).abs() < 1e-9);
  }

  #[test]
  fn unscored_papers_rank_zero_and_keep_input_order() {
    let a = paper("cs.AI", 0.0, 1);
    let b = paper("cs.AI", 0.0, 2);
    let c = paper("cs.AI", 0.0, 3);
    let scores = HashMap::from([(c.paper_id, 1.0)]);

    let ranked = rank_papers(vec![a.clone(), b.clone(), c.clone()], &scores, now());
    assert_eq!(ids(&ranked), [c.paper_id, a.paper_id, b.paper_id]);
    assert_eq!(ranked[1].ranking_score, 0.0);
  }

  // ── category_affinity ─────────────────────────────────────────────────────

  #[test]
  fn affinity_averages_per_category() {
    let affinity = category_affinity(&[
      rated(5, "cs.AI"),
      rated(3, "cs.AI cs.LG"),
      rated(1, "cs.LG"),
    ]);
    assert_eq!(affinity.len(), 2);
    assert_eq!(affinity["cs.AI"], 4.0);
    assert_eq!(affinity["cs.LG"], 2.0);
  }

  #[test]
  fn affinity_of_no_ratings_is_empty() {
    assert!(category_affinity(&[]).is_empty());
  }

  // ── personalize ───────────────────────────────────────────────────────────

  #[test]
  fn boost_compounds_across_shared_categories() {
    let affinity = HashMap::from([("cs.AI".to_owned(), 5.0), ("cs.LG".to_owned(), 2.5)]);
    let p = paper("cs.AI cs.LG stat.ML", 1.0, 0);
    assert!((category_boost(&p, &affinity) - 2.0 * 1.5).abs() < 1e-9);
    assert_eq!(category_boost(&paper("math.ST", 1.0, 0), &affinity), 1.0);
  }

  #[test]
  fn preferred_category_overtakes_higher_raw_score() {
    let affinity = HashMap::from([("cs.AI".to_owned(), 5.0)]);
    let lg = paper("cs.LG", 3.0, 0);
    let ai = paper("cs.AI", 2.0, 0);

    let ranked = personalize(vec![lg.clone(), ai.clone()], &affinity, 10);
    assert_eq!(ids(&ranked), [ai.paper_id, lg.paper_id]);
    assert_eq!(ranked[0].ranking_score, 4.0);
  }

  #[test]
  fn personalize_truncates_to_limit() {
    let papers: Vec<_> = (0..5).map(|i| paper("cs.AI", i as f64, i)).collect();
    let ranked = personalize(papers, &HashMap::new(), 3);
    assert_eq!(ranked.len(), 3);
    assert_eq!(ranked[0].ranking_score, 4.0);
  }

  #[test]
  fn by_score_is_plain_descending_score() {
    let a = paper("cs.AI", 1.0, 0);
    let b = paper("cs.LG", 2.0, 0);
    let c = paper("cs.CL", 1.0, 0);
    let ranked = by_score(vec![a.clone(), b.clone(), c.clone()], 10);
    assert_eq!(ids(&ranked), [b.paper_id, a.paper_id, c.paper_id]);
  }

  #[test]
  fn ranked_paper_flattens_on_the_wire() {
    let ranked = RankedPaper { paper: paper("cs.AI", 1.0, 0), ranking_score: 0.5 };
    let json = serde_json::to_value(&ranked).unwrap();
    assert_eq!(json["categories"], "cs.AI");
    assert_eq!(json["ranking_score"], 0.5);
  }
}
