//! Read-only reports. Nothing here is persisted; every call recomputes.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/buckets/summary` | Optional `?period=week\|month` (default month) |
//! | `GET`  | `/forecast` | Recurring payments due in the next 30 days |
//! | `GET`  | `/budget/impact` | This month's expenses, limits, coaching and goal needs |
//! | `GET`  | `/insights` | One-sentence summary from the language model |

use axum::{
  Json,
  extract::{Query, State},
};
use chrono::Utc;
use serde::Deserialize;
use tally_core::{
  budget::{BudgetReport, build_report},
  coaching::{BudgetImpact, analyze_impact},
  forecast::{Forecast, forecast as project},
  period::Period,
  settings::monthly_income,
  store::FinanceStore,
  transaction::{TransactionQuery, TransactionType},
};
use tally_voice::insights::{Insight, monthly_insight};

use crate::{AppState, error::ApiError};

#[derive(Debug, Default, Deserialize)]
pub struct PeriodParams {
  #[serde(default)]
  pub period: Period,
}

/// `GET /buckets/summary[?period=week|month]`
pub async fn summary<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<PeriodParams>,
) -> Result<Json<BudgetReport>, ApiError>
where
  S: FinanceStore,
{
  let (start, end) = params.period.bounds(Utc::now());
  let query = TransactionQuery::between(start, end);
  let (income, txs) = tokio::join!(
    monthly_income(state.store.as_ref(), state.default_income),
    state.store.list_transactions(&query),
  );
  let income = income.map_err(ApiError::store)?;
  let txs = txs.map_err(ApiError::store)?;
  Ok(Json(build_report(income, params.period, &txs)))
}

/// `GET /forecast`
pub async fn forecast<S>(State(state): State<AppState<S>>) -> Result<Json<Forecast>, ApiError>
where
  S: FinanceStore,
{
  let expenses = state
    .store
    .list_recurring_expenses()
    .await
    .map_err(ApiError::store)?;
  Ok(Json(project(&expenses, Utc::now().date_naive())))
}

/// `GET /budget/impact`
pub async fn impact<S>(State(state): State<AppState<S>>) -> Result<Json<BudgetImpact>, ApiError>
where
  S: FinanceStore,
{
  let now = Utc::now();
  let (start, end) = Period::Month.bounds(now);
  let query = TransactionQuery {
    kind: Some(TransactionType::Expense),
    ..TransactionQuery::between(start, end)
  };
  let store = state.store.as_ref();
  let (income, txs, categories, goals) = tokio::join!(
    monthly_income(store, state.default_income),
    store.list_transactions(&query),
    store.list_categories(),
    store.list_goals(None),
  );

  Ok(Json(analyze_impact(
    income.map_err(ApiError::store)?,
    &txs.map_err(ApiError::store)?,
    &categories.map_err(ApiError::store)?,
    &goals.map_err(ApiError::store)?,
    now.date_naive(),
  )))
}

/// `GET /insights`
pub async fn insights<S>(State(state): State<AppState<S>>) -> Result<Json<Insight>, ApiError>
where
  S: FinanceStore,
{
  let insight = monthly_insight(state.store.as_ref(), state.voice.llm(), Utc::now()).await?;
  Ok(Json(insight))
}
