//! Flat key/value user configuration.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::store::FinanceStore;

/// Key under which the user's monthly income is stored.
pub const MONTHLY_INCOME_KEY: &str = "monthly_income";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserConfig {
  pub key:        String,
  pub value:      String,
  pub updated_at: DateTime<Utc>,
}

/// Parse a stored monthly income. Non-numeric or non-positive values are
/// treated as unset.
pub fn parse_income(value: &str) -> Option<Decimal> {
  Decimal::from_str(value.trim())
    .ok()
    .filter(|d| *d > Decimal::ZERO)
}

/// The configured monthly income, or `default` when unset or unusable.
pub async fn monthly_income<S: FinanceStore>(
  store: &S,
  default: Decimal,
) -> Result<Decimal, S::Error> {
  let stored = store.get_config(MONTHLY_INCOME_KEY.to_owned()).await?;
  Ok(
    stored
      .and_then(|c| parse_income(&c.value))
      .unwrap_or(default),
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_income_rejects_garbage_and_non_positive() {
    assert_eq!(parse_income(" 4200.50 "), Some(Decimal::new(420050, 2)));
    assert_eq!(parse_income("abc"), None);
    assert_eq!(parse_income("0"), None);
    assert_eq!(parse_income("-10"), None);
  }
}
