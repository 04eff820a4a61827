//! Maintenance endpoints.

use axum::{extract::State, http::StatusCode};
use tally_core::store::FinanceStore;
use tracing::warn;

use crate::{AppState, error::ApiError};

/// `POST /admin/reset`: delete every row in every table. 204 on success.
pub async fn reset<S>(State(state): State<AppState<S>>) -> Result<StatusCode, ApiError>
where
  S: FinanceStore,
{
  state.store.reset().await.map_err(ApiError::store)?;
  warn!("all data was reset");
  Ok(StatusCode::NO_CONTENT)
}
