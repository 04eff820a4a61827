//! Handlers for `/goals` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/goals` | Optional `?status=IN_PROGRESS\|COMPLETED\|FAILED` |
//! | `POST`   | `/goals` | Body: [`NewGoalBody`]; returns 201 |
//! | `GET`    | `/goals/:id` | 404 if not found |
//! | `PATCH`  | `/goals/:id` | Body: [`GoalPatchBody`]; `addAmount` is atomic |
//! | `DELETE` | `/goals/:id` | 204, or 404 |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use tally_core::{
  Error,
  goal::{Goal, GoalPatch, GoalStatus, NewGoal},
  store::FinanceStore,
  validate::{parse_day, parse_id, require_text, validate_amount, validate_deadline},
};

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub status: Option<GoalStatus>,
}

/// `GET /goals[?status=<status>]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Goal>>, ApiError>
where
  S: FinanceStore,
{
  let goals = state
    .store
    .list_goals(params.status)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(goals))
}

/// `GET /goals/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
) -> Result<Json<Goal>, ApiError>
where
  S: FinanceStore,
{
  let id = parse_id("goal", &id)?;
  let goal = state
    .store
    .get_goal(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| Error::NotFound(format!("goal {id}")))?;
  Ok(Json(goal))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGoalBody {
  pub name:          String,
  pub target_amount: Decimal,
  pub deadline:      Option<String>,
  pub category:      Option<String>,
}

/// `POST /goals`: returns 201 + the stored [`Goal`].
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<NewGoalBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: FinanceStore,
{
  let today = Utc::now().date_naive();
  let input = NewGoal {
    name:           require_text("name", &body.name)?,
    target_amount:  validate_amount("targetAmount", body.target_amount)?,
    deadline:       body
      .deadline
      .as_deref()
      .map(|d| parse_day("deadline", d).and_then(|d| validate_deadline(d, today)))
      .transpose()?,
    category:       body
      .category
      .as_deref()
      .map(|c| require_text("category", c))
      .transpose()?,
    ai_suggestions: None,
  };

  let goal = state
    .store
    .create_goal(input)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(goal)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalPatchBody {
  pub name:          Option<String>,
  pub target_amount: Option<Decimal>,
  pub status:        Option<GoalStatus>,
  pub deadline:      Option<String>,
  pub add_amount:    Option<Decimal>,
}

/// `PATCH /goals/:id`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
  Json(body): Json<GoalPatchBody>,
) -> Result<Json<Goal>, ApiError>
where
  S: FinanceStore,
{
  let id = parse_id("goal", &id)?;
  let patch = GoalPatch {
    name:          body.name.as_deref().map(|n| require_text("name", n)).transpose()?,
    target_amount: body
      .target_amount
      .map(|a| validate_amount("targetAmount", a))
      .transpose()?,
    status:        body.status,
    deadline:      body
      .deadline
      .as_deref()
      .map(|d| parse_day("deadline", d))
      .transpose()?,
    add_amount:    body
      .add_amount
      .map(|a| validate_amount("addAmount", a))
      .transpose()?,
  };

  let goal = state
    .store
    .update_goal(id, patch)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| Error::NotFound(format!("goal {id}")))?;
  Ok(Json(goal))
}

/// `DELETE /goals/:id`: 204 on success.
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: FinanceStore,
{
  let id = parse_id("goal", &id)?;
  if !state.store.delete_goal(id).await.map_err(ApiError::store)? {
    return Err(Error::NotFound(format!("goal {id}")).into());
  }
  Ok(StatusCode::NO_CONTENT)
}
