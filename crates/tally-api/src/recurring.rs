//! Handlers for `/recurring` endpoints.

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use tally_core::{
  recurring::{NewRecurringExpense, RecurringExpense},
  store::FinanceStore,
  validate::{require_text, validate_amount},
};

use crate::{AppState, error::ApiError};

/// `GET /recurring`: soonest due first.
pub async fn list<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<RecurringExpense>>, ApiError>
where
  S: FinanceStore,
{
  let expenses = state
    .store
    .list_recurring_expenses()
    .await
    .map_err(ApiError::store)?;
  Ok(Json(expenses))
}

/// `POST /recurring`: body: [`NewRecurringExpense`]; returns 201.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<NewRecurringExpense>,
) -> Result<impl IntoResponse, ApiError>
where
  S: FinanceStore,
{
  let input = NewRecurringExpense {
    name: require_text("name", &body.name)?,
    amount: validate_amount("amount", body.amount)?,
    category: require_text("category", &body.category)?,
    ..body
  };
  let expense = state
    .store
    .add_recurring_expense(input)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(expense)))
}
