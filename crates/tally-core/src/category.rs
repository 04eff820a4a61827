//! Categories, the natural-key grouping every transaction belongs to.
//!
//! Category names are unique (case-insensitively). Anything that references a
//! category by name upserts it, except for budget updates which require the
//! category to exist.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

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
  EnumString,
)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum CategoryType {
  #[default]
  Expense,
  Saving,
  Investment,
}

impl TryFrom<String> for CategoryType {
  type Error = strum::ParseError;

  fn try_from(s: String) -> Result<Self, Self::Error> { s.trim().parse() }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
  pub category_id: Uuid,
  pub name:        String,
  /// Optional monthly spending ceiling.
  pub budget:      Option<Decimal>,
  #[serde(rename = "type")]
  pub kind:        CategoryType,
  pub created_at:  DateTime<Utc>,
}

/// Input for [`FinanceStore::upsert_category`](crate::store::FinanceStore::upsert_category).
#[derive(Debug, Clone, Default)]
pub struct NewCategory {
  pub name:   String,
  pub budget: Option<Decimal>,
  pub kind:   CategoryType,
}

impl NewCategory {
  pub fn named(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      ..Self::default()
    }
  }
}
