//! Recurring-expense forecast over a fixed horizon.

use std::collections::BTreeMap;

use chrono::{NaiveDate, TimeDelta};
use rust_decimal::Decimal;
use serde::Serialize;
use strum::IntoEnumIterator;
use uuid::Uuid;

use crate::{recurring::RecurringExpense, transaction::Bucket};

pub const FORECAST_HORIZON_DAYS: i64 = 30;

/// One projected payment of a recurring expense.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
  pub recurring_id: Uuid,
  pub name:         String,
  pub amount:       Decimal,
  pub bucket:       Bucket,
  pub category:     String,
  pub due_date:     NaiveDate,
  pub is_automatic: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
  /// Per-bucket totals; every bucket is present.
  pub totals:      BTreeMap<Bucket, Decimal>,
  /// Ordered by due date.
  pub upcoming:    Vec<Occurrence>,
  pub period_days: i64,
}

/// Project every payment due in `[today, today + 30 days]`.
///
/// An expense whose `next_due_date` lies in the past is rolled forward by its
/// frequency until it reaches `today`; expenses recurring within the horizon
/// contribute once per occurrence.
pub fn forecast(expenses: &[RecurringExpense], today: NaiveDate) -> Forecast {
  let horizon = today + TimeDelta::days(FORECAST_HORIZON_DAYS);
  let mut totals: BTreeMap<Bucket, Decimal> =
    Bucket::iter().map(|b| (b, Decimal::ZERO)).collect();
  let mut upcoming = Vec::new();

  for expense in expenses {
    let mut due = Some(expense.next_due_date);
    while let Some(date) = due {
      if date > horizon {
        break;
      }
      if date >= today {
        *totals.entry(expense.bucket).or_default() += expense.amount;
        upcoming.push(Occurrence {
          recurring_id: expense.recurring_id,
          name:         expense.name.clone(),
          amount:       expense.amount,
          bucket:       expense.bucket,
          category:     expense.category_name.clone(),
          due_date:     date,
          is_automatic: expense.is_automatic,
        });
      }
      due = expense.frequency.advance(date);
    }
  }

  upcoming.sort_by_key(|o| o.due_date);
  Forecast {
    totals,
    upcoming,
    period_days: FORECAST_HORIZON_DAYS,
  }
}
