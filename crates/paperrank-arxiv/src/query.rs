//! Search-query construction for the arXiv export API.

use chrono::NaiveDate;

/// The arXiv export API endpoint.
pub const ARXIV_API_URL: &str = "http://export.arxiv.org/api/query";

/// Page size requested per category per day.
pub const DEFAULT_MAX_RESULTS: u32 = 100;

/// Every computer-science and statistics category.
pub const DEFAULT_CATEGORIES: &[&str] = &[
  "cs.AI", "cs.AR", "cs.CC", "cs.CE", "cs.CG", "cs.CL", "cs.CR", "cs.CV",
  "cs.CY", "cs.DB", "cs.DC", "cs.DL", "cs.DM", "cs.DS", "cs.ET", "cs.FL",
  "cs.GL", "cs.GR", "cs.GT", "cs.HC", "cs.IR", "cs.IT", "cs.LG", "cs.LO",
  "cs.MA", "cs.MM", "cs.MS", "cs.NA", "cs.NE", "cs.NI", "cs.OH", "cs.OS",
  "cs.PF", "cs.PL", "cs.RO", "cs.SC", "cs.SD", "cs.SE", "cs.SI", "cs.SY",
  "stat.AP", "stat.CO", "stat.ML", "stat.ME", "stat.OT", "stat.TH",
];

const SUBMITTED_FORMAT: &str = "%Y%m%d";

/// `cat:<category> AND submittedDate:[<day>0000 TO <next day>0000]`.
pub fn search_query(category: &str, day: NaiveDate) -> String {
  let next = day.succ_opt().unwrap_or(day);
  format!(
    "cat:{category} AND submittedDate:[{}0000 TO {}0000]",
    day.format(SUBMITTED_FORMAT),
    next.format(SUBMITTED_FORMAT),
  )
}

/// Full query-string parameters for one category on one day, newest
/// submissions first.
pub fn query_params(
  category: &str,
  day: NaiveDate,
  max_results: u32,
) -> Vec<(&'static str, String)> {
  vec![
    ("search_query", search_query(category, day)),
    ("start", "0".into()),
    ("max_results", max_results.to_string()),
    ("sortBy", "submittedDate".into()),
    ("sortOrder", "descending".into()),
  ]
}

#[cfg(test)]
mod tests {
  use super::*;

  fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  #[test]
  fn query_spans_one_day() {
    assert_eq!(
      search_query("cs.AI", day(2024, 1, 15)),
      "cat:cs.AI AND submittedDate:[202401150000 TO 202401160000]"
    );
  }

  #[test]
  fn query_rolls_over_month_and_year() {
    assert_eq!(
      search_query("stat.ML", day(2023, 12, 31)),
      "cat:stat.ML AND submittedDate:[202312310000 TO 202401010000]"
    );
  }

  #[test]
  fn params_carry_paging_and_sort() {
    let params = query_params("cs.LG", day(2024, 1, 15), 50);
    assert!(params.contains(&("max_results", "50".to_string())));
    assert!(params.contains(&("sortBy", "submittedDate".to_string())));
    assert_eq!(params[0].0, "search_query");
  }

  #[test]
  fn default_categories_are_cs_and_stat() {
    assert_eq!(DEFAULT_CATEGORIES.len(), 46);
    assert!(
      DEFAULT_CATEGORIES
        .iter()
        .all(|c| c.starts_with("cs.") || c.starts_with("stat."))
    );
  }
}
