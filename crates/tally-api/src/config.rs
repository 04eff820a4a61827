//! Handlers for `/config` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/config` | Every stored key |
//! | `POST` | `/config` | Body: `{"key":"monthly_income","value":"4200"}` |
//! | `GET`  | `/config/:key` | `{"value":...}`; empty string when unset |

use axum::{
  Json,
  extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tally_core::{
  Error,
  settings::{MONTHLY_INCOME_KEY, UserConfig, parse_income},
  store::FinanceStore,
  validate::{MAX_AMOUNT, require_text, validate_amount},
};

use crate::{AppState, error::ApiError};

/// `GET /config`
pub async fn list<S>(State(state): State<AppState<S>>) -> Result<Json<Vec<UserConfig>>, ApiError>
where
  S: FinanceStore,
{
  let entries = state.store.list_config().await.map_err(ApiError::store)?;
  Ok(Json(entries))
}

#[derive(Debug, Serialize)]
pub struct ValueBody {
  pub value: String,
}

/// `GET /config/:key`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(key): Path<String>,
) -> Result<Json<ValueBody>, ApiError>
where
  S: FinanceStore,
{
  let value = state
    .store
    .get_config(key)
    .await
    .map_err(ApiError::store)?
    .map(|c| c.value)
    .unwrap_or_default();
  Ok(Json(ValueBody { value }))
}

#[derive(Debug, Deserialize)]
pub struct SetBody {
  pub key:   String,
  pub value: String,
}

/// `POST /config`: upsert one key. The monthly income must be a positive
/// amount.
pub async fn set<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<SetBody>,
) -> Result<Json<UserConfig>, ApiError>
where
  S: FinanceStore,
{
  let key = require_text("key", &body.key)?;
  let mut value = body.value.trim().to_owned();
  if key == MONTHLY_INCOME_KEY {
    let income = parse_income(&value).ok_or_else(|| {
      Error::InvalidAmount(format!(
        "{MONTHLY_INCOME_KEY} must be a number between 0 and {MAX_AMOUNT}"
      ))
    })?;
    value = validate_amount(MONTHLY_INCOME_KEY, income)?.to_string();
  }

  let entry = state
    .store
    .set_config(key, value)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(entry))
}
