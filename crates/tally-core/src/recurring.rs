//! Recurring expenses: scheduled outflows used for forecasting.

use chrono::{Months, NaiveDate, TimeDelta};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::transaction::Bucket;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Frequency {
  Daily,
  Weekly,
  Monthly,
  Yearly,
}

impl TryFrom<String> for Frequency {
  type Error = strum::ParseError;

  fn try_from(s: String) -> Result<Self, Self::Error> { s.trim().parse() }
}

impl Frequency {
  /// The due date following `date`, or `None` past the end of the calendar.
  pub fn advance(self, date: NaiveDate) -> Option<NaiveDate> {
    match self {
      Self::Daily => date.checked_add_signed(TimeDelta::days(1)),
      Self::Weekly => date.checked_add_signed(TimeDelta::weeks(1)),
      Self::Monthly => date.checked_add_months(Months::new(1)),
      Self::Yearly => date.checked_add_months(Months::new(12)),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringExpense {
  pub recurring_id:  Uuid,
  pub name:          String,
  pub amount:        Decimal,
  pub frequency:     Frequency,
  pub next_due_date: NaiveDate,
  pub bucket:        Bucket,
  pub category_id:   Uuid,
  pub category_name: String,
  pub is_automatic:  bool,
}

/// Input for [`FinanceStore::add_recurring_expense`](crate::store::FinanceStore::add_recurring_expense).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecurringExpense {
  pub name:          String,
  pub amount:        Decimal,
  pub frequency:     Frequency,
  pub next_due_date: NaiveDate,
  pub bucket:        Bucket,
  /// Category name; upserted.
  pub category:      String,
  #[serde(default)]
  pub is_automatic:  bool,
}
