//! Handlers for `/categories` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/categories` | |
//! | `POST` | `/categories` | Body: `{"name":"Groceries","budget":400,"type":"EXPENSE"}`; idempotent |
//! | `PUT`  | `/categories/:name/budget` | Body: `{"budget":400}` or `{"budget":null}`; 404 if missing |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tally_core::{
  Error,
  category::{Category, CategoryType, NewCategory},
  store::FinanceStore,
  validate::{require_text, validate_budget},
};

use crate::{AppState, error::ApiError};

/// `GET /categories`
pub async fn list<S>(State(state): State<AppState<S>>) -> Result<Json<Vec<Category>>, ApiError>
where
  S: FinanceStore,
{
  let categories = state
    .store
    .list_categories()
    .await
    .map_err(ApiError::store)?;
  Ok(Json(categories))
}

#[derive(Debug, Deserialize)]
pub struct NewCategoryBody {
  pub name:   String,
  pub budget: Option<Decimal>,
  #[serde(rename = "type", default)]
  pub kind:   CategoryType,
}

/// `POST /categories`: returns 201 with the existing or newly created row.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<NewCategoryBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: FinanceStore,
{
  let input = NewCategory {
    name:   require_text("name", &body.name)?,
    budget: body.budget.map(|b| validate_budget("budget", b)).transpose()?,
    kind:   body.kind,
  };
  let category = state
    .store
    .upsert_category(input)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(category)))
}

#[derive(Debug, Deserialize)]
pub struct BudgetBody {
  pub budget: Option<Decimal>,
}

/// `PUT /categories/:name/budget`
pub async fn set_budget<S>(
  State(state): State<AppState<S>>,
  Path(name): Path<String>,
  Json(body): Json<BudgetBody>,
) -> Result<Json<Category>, ApiError>
where
  S: FinanceStore,
{
  let name = require_text("category", &name)?;
  let budget = body.budget.map(|b| validate_budget("budget", b)).transpose()?;
  let category = state
    .store
    .set_category_budget(name.clone(), budget)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| Error::NotFound(format!("category {name}")))?;
  Ok(Json(category))
}
