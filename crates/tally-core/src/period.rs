//! Reporting periods. All boundaries are computed in UTC.

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumIter,
  EnumString,
)]
#[serde(rename_all = "lowercase", try_from = "String")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Period {
  /// Sunday through Saturday containing `now`.
  Week,
  /// The calendar month containing `now`.
  #[default]
  Month,
}

impl TryFrom<String> for Period {
  type Error = strum::ParseError;

  fn try_from(s: String) -> Result<Self, Self::Error> { s.trim().parse() }
}

impl Period {
  /// Inclusive `[start, end]` bounds of the period containing `now`; `end` is
  /// the last millisecond of the period.
  pub fn bounds(self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let today = now.date_naive();
    let (first, next) = match self {
      Self::Week => {
        let back = i64::from(today.weekday().num_days_from_sunday());
        let first = today - TimeDelta::days(back);
        (first, first + TimeDelta::days(7))
      }
      Self::Month => {
        let first = today - TimeDelta::days(i64::from(today.day0()));
        (first, first + Months::new(1))
      }
    };
    (start_of(first), start_of(next) - TimeDelta::milliseconds(1))
  }
}

fn start_of(day: NaiveDate) -> DateTime<Utc> { day.and_time(NaiveTime::MIN).and_utc() }

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  #[test]
  fn month_bounds_cover_whole_month() {
    let now = Utc.with_ymd_and_hms(2024, 2, 14, 10, 30, 0).unwrap();
    let (start, end) = Period::Month.bounds(now);
    assert_eq!(start, Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
    assert_eq!(
      end,
      Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap() - TimeDelta::milliseconds(1)
    );
  }

  #[test]
  fn week_starts_on_sunday() {
    // 2024-05-15 is a Wednesday.
    let now = Utc.with_ymd_and_hms(2024, 5, 15, 8, 0, 0).unwrap();
    let (start, end) = Period::Week.bounds(now);
    assert_eq!(start, Utc.with_ymd_and_hms(2024, 5, 12, 0, 0, 0).unwrap());
    assert_eq!(
      end,
      Utc.with_ymd_and_hms(2024, 5, 19, 0, 0, 0).unwrap() - TimeDelta::milliseconds(1)
    );
  }

  #[test]
  fn period_defaults_to_month_and_parses() {
    assert_eq!(Period::default(), Period::Month);
    assert_eq!("Week".parse::<Period>().unwrap(), Period::Week);
  }
}
