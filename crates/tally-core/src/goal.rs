//! Savings goals.
//!
//! `current_amount` is a stored column and the single source of truth for
//! progress. Contributions are applied through [`GoalPatch::add_amount`],
//! which the store applies atomically.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::transaction::AiAnalysis;

/// Days per month used when spreading a goal's remainder over its deadline.
const DAYS_PER_MONTH: i64 = 30;

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
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum GoalStatus {
  #[default]
  InProgress,
  Completed,
  Failed,
}

impl TryFrom<String> for GoalStatus {
  type Error = strum::ParseError;

  fn try_from(s: String) -> Result<Self, Self::Error> {
    s.trim().replace([' ', '-'], "_").parse()
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
  pub goal_id:        Uuid,
  pub name:           String,
  pub target_amount:  Decimal,
  pub current_amount: Decimal,
  pub deadline:       Option<NaiveDate>,
  pub status:         GoalStatus,
  pub category_id:    Option<Uuid>,
  pub category_name:  Option<String>,
  pub ai_suggestions: Option<AiAnalysis>,
  pub created_at:     DateTime<Utc>,
}

impl Goal {
  /// Amount still missing; never negative.
  pub fn remaining(&self) -> Decimal {
    (self.target_amount - self.current_amount).max(Decimal::ZERO)
  }

  /// How much must be saved per month to hit the deadline.
  ///
  /// `None` when the goal has no deadline. A deadline that is today or
  /// already past counts as one month away.
  pub fn monthly_required(&self, today: NaiveDate) -> Option<Decimal> {
    let deadline = self.deadline?;
    let days = (deadline - today).num_days();
    let months = ((days + DAYS_PER_MONTH - 1) / DAYS_PER_MONTH).max(1);
    Some(self.remaining() / Decimal::from(months))
  }
}

/// Input for [`FinanceStore::create_goal`](crate::store::FinanceStore::create_goal).
/// New goals always start `IN_PROGRESS` with nothing saved.
#[derive(Debug, Clone)]
pub struct NewGoal {
  pub name:           String,
  pub target_amount:  Decimal,
  pub deadline:       Option<NaiveDate>,
  /// Category name; upserted when present.
  pub category:       Option<String>,
  pub ai_suggestions: Option<AiAnalysis>,
}

/// Partial update for a goal. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct GoalPatch {
  pub name:          Option<String>,
  pub target_amount: Option<Decimal>,
  pub status:        Option<GoalStatus>,
  pub deadline:      Option<NaiveDate>,
  /// Added to the stored `current_amount` inside the same database
  /// transaction that reads it.
  pub add_amount:    Option<Decimal>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn goal(target: i64, current: i64, deadline: Option<NaiveDate>) -> Goal {
    Goal {
      goal_id:        Uuid::new_v4(),
      name:           "Trip".into(),
      target_amount:  Decimal::from(target),
      current_amount: Decimal::from(current),
      deadline,
      status:         GoalStatus::InProgress,
      category_id:    None,
      category_name:  None,
      ai_suggestions: None,
      created_at:     Utc::now(),
    }
  }

  #[test]
  fn monthly_required_spreads_remainder_over_months() {
    let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let deadline = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(); // 90 days
    let g = goal(1000, 100, Some(deadline));
    assert_eq!(g.monthly_required(today), Some(Decimal::from(300)));
  }

  #[test]
  fn monthly_required_without_deadline_is_none() {
    let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    assert_eq!(goal(1000, 0, None).monthly_required(today), None);
  }

  #[test]
  fn past_deadline_requires_everything_now() {
    let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let deadline = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let g = goal(500, 200, Some(deadline));
    assert_eq!(g.monthly_required(today), Some(Decimal::from(300)));
  }

  #[test]
  fn status_accepts_spaced_lowercase() {
    let s: GoalStatus = serde_json::from_str("\"in progress\"").unwrap();
    assert_eq!(s, GoalStatus::InProgress);
    assert_eq!(serde_json::to_string(&GoalStatus::Completed).unwrap(), "\"COMPLETED\"");
  }
}
