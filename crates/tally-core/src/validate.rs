//! Argument checks shared by the dispatcher and the HTTP handlers.
//!
//! Every check runs before anything is written, so a rejected command leaves
//! the store untouched.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{Error, Result};

/// Largest amount accepted for a single transaction, goal or budget.
pub const MAX_AMOUNT: i64 = 1_000_000;

/// Amounts are kept to whole cents.
pub const MAX_SCALE: u32 = 2;

fn check_scale(field: &str, amount: Decimal) -> Result<Decimal> {
  if amount.normalize().scale() > MAX_SCALE {
    return Err(Error::InvalidAmount(format!(
      "{field} must not have more than {MAX_SCALE} decimal places"
    )));
  }
  Ok(amount)
}

/// Amounts must be strictly positive, whole cents and at most [`MAX_AMOUNT`].
pub fn validate_amount(field: &str, amount: Decimal) -> Result<Decimal> {
  if amount <= Decimal::ZERO {
    return Err(Error::InvalidAmount(format!("{field} must be greater than zero")));
  }
  if amount > Decimal::from(MAX_AMOUNT) {
    return Err(Error::InvalidAmount(format!(
      "{field} must not exceed {MAX_AMOUNT}"
    )));
  }
  check_scale(field, amount)
}

/// Budgets may be zero but never negative.
pub fn validate_budget(field: &str, amount: Decimal) -> Result<Decimal> {
  if amount < Decimal::ZERO {
    return Err(Error::InvalidAmount(format!("{field} must not be negative")));
  }
  if amount > Decimal::from(MAX_AMOUNT) {
    return Err(Error::InvalidAmount(format!(
      "{field} must not exceed {MAX_AMOUNT}"
    )));
  }
  check_scale(field, amount)
}

/// Trim and reject empty text.
pub fn require_text(field: &str, value: &str) -> Result<String> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return Err(Error::InvalidArguments(format!("{field} must not be empty")));
  }
  Ok(trimmed.to_owned())
}

/// Accept an RFC 3339 timestamp or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_date(field: &str, value: &str) -> Result<DateTime<Utc>> {
  let value = value.trim();
  if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
    return Ok(ts.with_timezone(&Utc));
  }
  parse_day(field, value).map(|d| d.and_time(NaiveTime::MIN).and_utc())
}

/// Like [`parse_date`], but a bare day means the last millisecond of that day
/// so it can serve as an inclusive upper bound.
pub fn parse_end_date(field: &str, value: &str) -> Result<DateTime<Utc>> {
  let value = value.trim();
  if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
    return Ok(ts.with_timezone(&Utc));
  }
  let day = parse_day(field, value)?;
  Ok(day.and_time(NaiveTime::MIN).and_utc() + TimeDelta::days(1) - TimeDelta::milliseconds(1))
}

/// Accept a bare `YYYY-MM-DD`, or the date part of an RFC 3339 timestamp.
pub fn parse_day(field: &str, value: &str) -> Result<NaiveDate> {
  let value = value.trim();
  if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
    return Ok(ts.date_naive());
  }
  NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
    Error::InvalidArguments(format!("{field} is not a valid date: {value:?}"))
  })
}

pub fn validate_deadline(deadline: NaiveDate, today: NaiveDate) -> Result<NaiveDate> {
  if deadline < today {
    return Err(Error::InvalidArguments(format!(
      "deadline {deadline} is in the past"
    )));
  }
  Ok(deadline)
}

/// Parse a record id. An id that is not a UUID cannot name any record, so it
/// is reported as missing rather than malformed.
pub fn parse_id(kind: &str, value: &str) -> Result<Uuid> {
  Uuid::parse_str(value.trim()).map_err(|_| Error::NotFound(format!("{kind} {value}")))
}

/// Trim, drop empties and duplicates, keep first-seen order.
pub fn normalize_tags(tags: impl IntoIterator<Item = String>) -> Vec<String> {
  let mut out: Vec<String> = Vec::new();
  for tag in tags {
    let tag = tag.trim();
    if !tag.is_empty() && !out.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
      out.push(tag.to_owned());
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn amount_bounds() {
    assert!(matches!(
      validate_amount("amount", Decimal::from(-5)),
      Err(Error::InvalidAmount(_))
    ));
    assert!(matches!(
      validate_amount("amount", Decimal::ZERO),
      Err(Error::InvalidAmount(_))
    ));
    assert!(matches!(
      validate_amount("amount", Decimal::from(MAX_AMOUNT + 1)),
      Err(Error::InvalidAmount(_))
    ));
    assert_eq!(
      validate_amount("amount", Decimal::new(1999, 2)).unwrap(),
      Decimal::new(1999, 2)
    );
  }

  #[test]
  fn budget_allows_zero() {
    assert!(validate_budget("budget", Decimal::ZERO).is_ok());
    assert!(validate_budget("budget", Decimal::from(-1)).is_err());
  }

  #[test]
  fn sub_cent_amounts_rejected() {
    let tiny = Decimal::new(1, 26);
    assert!(matches!(validate_budget("budget", tiny), Err(Error::InvalidAmount(_))));
    assert!(matches!(
      validate_amount("amount", Decimal::new(1, 27)),
      Err(Error::InvalidAmount(_))
    ));
    assert!(matches!(
      validate_amount("amount", Decimal::new(4999, 3)),
      Err(Error::InvalidAmount(_))
    ));
    assert!(validate_amount("amount", Decimal::new(45_000, 4)).is_ok());
  }

  #[test]
  fn dates_accept_both_forms() {
    let day = parse_date("date", "2024-03-05").unwrap();
    assert_eq!(day, Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap());

    let ts = parse_date("date", "2024-03-05T10:00:00+02:00").unwrap();
    assert_eq!(ts, Utc.with_ymd_and_hms(2024, 3, 5, 8, 0, 0).unwrap());

    let end = parse_end_date("endDate", "2024-03-05").unwrap();
    assert_eq!(
      end,
      Utc.with_ymd_and_hms(2024, 3, 6, 0, 0, 0).unwrap() - TimeDelta::milliseconds(1)
    );

    assert!(matches!(
      parse_date("date", "next tuesday"),
      Err(Error::InvalidArguments(_))
    ));
  }

  #[test]
  fn past_deadline_rejected() {
    let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    assert!(validate_deadline(NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(), today).is_err());
    assert!(validate_deadline(today, today).is_ok());
  }

  #[test]
  fn malformed_id_is_not_found() {
    assert!(matches!(parse_id("goal", "abc"), Err(Error::NotFound(_))));
    let id = Uuid::new_v4();
    assert_eq!(parse_id("goal", &id.to_string()).unwrap(), id);
  }

  #[test]
  fn tags_are_normalized() {
    let tags = normalize_tags(vec![
      " food ".to_owned(),
      "".to_owned(),
      "Food".to_owned(),
      "weekly".to_owned(),
    ]);
    assert_eq!(tags, vec!["food", "weekly"]);
  }
}
