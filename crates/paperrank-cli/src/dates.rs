//! Day selection for `paperrank fetch`.

use anyhow::{Result, bail};
use chrono::NaiveDate;

/// Ranges spanning more days than this ask for confirmation.
pub const CONFIRM_SPAN_DAYS: i64 = 7;

/// An inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayRange {
  pub start: NaiveDate,
  pub end:   NaiveDate,
}

impl DayRange {
  /// Resolve `--date`, `--start-date`, and `--end-date` into a range.
  ///
  /// A single date gives a one-day range, a start/end pair must be given
  /// together with `end >= start`, and no options at all means `today`.
  pub fn resolve(
    date:  Option<NaiveDate>,
    start: Option<NaiveDate>,
    end:   Option<NaiveDate>,
    today: NaiveDate,
  ) -> Result<Self> {
    match (date, start, end) {
      (None, None, None) => Ok(Self { start: today, end: today }),
      (Some(day), None, None) => Ok(Self { start: day, end: day }),
      (None, Some(start), Some(end)) => {
        if end < start {
          bail!("--end-date {end} is before --start-date {start}");
        }
        Ok(Self { start, end })
      }
      (None, Some(_), None) | (None, None, Some(_)) => {
        bail!("--start-date and --end-date must be given together")
      }
      (Some(_), _, _) => bail!("--date cannot be combined with --start-date or --end-date"),
    }
  }

  /// Days between start and end; zero for a single day.
  pub fn span_days(&self) -> i64 { (self.end - self.start).num_days() }

  pub fn needs_confirmation(&self) -> bool { self.span_days() > CONFIRM_SPAN_DAYS }

  /// Every day in the range, oldest first.
  pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
    let end = self.end;
    self.start.iter_days().take_while(move |d| *d <= end)
  }
}
