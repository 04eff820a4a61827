//! Handlers for `/transactions` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/transactions` | Optional `startDate`, `endDate`, `category`, `bucket`, `type`, `limit` |
//! | `POST`   | `/transactions` | Body: [`NewTransactionBody`]; returns 201 |
//! | `GET`    | `/transactions/:id` | 404 if not found |
//! | `PATCH`  | `/transactions/:id` | Body: [`TransactionPatchBody`] |
//! | `DELETE` | `/transactions/:id` | 204, or 404 |
//! | `POST`   | `/transactions/spontaneous` | Body: [`SpontaneousBody`]; WANT expense plus impact |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_core::{
  Error,
  budget::{CategorySpend, allowed, category_breakdown, format_usd},
  period::Period,
  settings::monthly_income,
  store::FinanceStore,
  transaction::{
    Bucket, NewTransaction, Transaction, TransactionPatch, TransactionQuery, TransactionType,
  },
  validate::{
    normalize_tags, parse_date, parse_end_date, parse_id, require_text, validate_amount,
  },
};

use crate::{AppState, error::ApiError};

/// Tag attached to every spontaneous purchase.
pub const SPONTANEOUS_TAG: &str = "spontaneous";

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
  pub start_date: Option<String>,
  pub end_date:   Option<String>,
  pub category:   Option<String>,
  pub bucket:     Option<Bucket>,
  #[serde(rename = "type")]
  pub kind:       Option<TransactionType>,
  pub limit:      Option<usize>,
}

/// `GET /transactions[?startDate=...][&endDate=...][&category=...][&bucket=...][&type=...][&limit=...]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Transaction>>, ApiError>
where
  S: FinanceStore,
{
  let query = TransactionQuery {
    start:    params
      .start_date
      .as_deref()
      .map(|d| parse_date("startDate", d))
      .transpose()?,
    end:      params
      .end_date
      .as_deref()
      .map(|d| parse_end_date("endDate", d))
      .transpose()?,
    category: params.category.filter(|c| !c.trim().is_empty()),
    bucket:   params.bucket,
    kind:     params.kind,
    limit:    params.limit,
  };

  let txs = state
    .store
    .list_transactions(&query)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(txs))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /transactions/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
) -> Result<Json<Transaction>, ApiError>
where
  S: FinanceStore,
{
  let id = parse_id("transaction", &id)?;
  let tx = state
    .store
    .get_transaction(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| Error::NotFound(format!("transaction {id}")))?;
  Ok(Json(tx))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /transactions`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransactionBody {
  pub amount:      Decimal,
  pub description: String,
  #[serde(rename = "type")]
  pub kind:        TransactionType,
  pub bucket:      Bucket,
  pub category:    String,
  pub date:        Option<String>,
  #[serde(default)]
  pub tags:        Vec<String>,
}

impl NewTransactionBody {
  fn validate(self) -> Result<NewTransaction, Error> {
    Ok(NewTransaction {
      amount:      validate_amount("amount", self.amount)?,
      description: require_text("description", &self.description)?,
      kind:        self.kind,
      bucket:      self.bucket,
      date:        self.date.as_deref().map(|d| parse_date("date", d)).transpose()?,
      category:    require_text("category", &self.category)?,
      tags:        normalize_tags(self.tags),
      ai_analysis: None,
    })
  }
}

/// `POST /transactions`: returns 201 + the stored [`Transaction`].
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<NewTransactionBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: FinanceStore,
{
  let input = body.validate()?;
  let tx = state
    .store
    .add_transaction(input)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(tx)))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `PATCH /transactions/:id`. Absent fields are kept.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPatchBody {
  pub amount:      Option<Decimal>,
  pub description: Option<String>,
  #[serde(rename = "type")]
  pub kind:        Option<TransactionType>,
  pub bucket:      Option<Bucket>,
  pub category:    Option<String>,
  pub date:        Option<String>,
  pub tags:        Option<Vec<String>>,
}

impl TransactionPatchBody {
  fn validate(self) -> Result<TransactionPatch, Error> {
    Ok(TransactionPatch {
      amount:      self.amount.map(|a| validate_amount("amount", a)).transpose()?,
      description: self
        .description
        .as_deref()
        .map(|d| require_text("description", d))
        .transpose()?,
      kind:        self.kind,
      bucket:      self.bucket,
      date:        self.date.as_deref().map(|d| parse_date("date", d)).transpose()?,
      category:    self
        .category
        .as_deref()
        .map(|c| require_text("category", c))
        .transpose()?,
      tags:        self.tags.map(normalize_tags),
    })
  }
}

/// `PATCH /transactions/:id`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
  Json(body): Json<TransactionPatchBody>,
) -> Result<Json<Transaction>, ApiError>
where
  S: FinanceStore,
{
  let id = parse_id("transaction", &id)?;
  let patch = body.validate()?;
  let tx = state
    .store
    .update_transaction(id, patch)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| Error::NotFound(format!("transaction {id}")))?;
  Ok(Json(tx))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /transactions/:id`: 204 on success.
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: FinanceStore,
{
  let id = parse_id("transaction", &id)?;
  if !state
    .store
    .delete_transaction(id)
    .await
    .map_err(ApiError::store)?
  {
    return Err(Error::NotFound(format!("transaction {id}")).into());
  }
  Ok(StatusCode::NO_CONTENT)
}

// ─── Spontaneous spending ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SpontaneousBody {
  pub amount:      Decimal,
  pub description: String,
  pub category:    String,
}

/// Effect of a purchase on this month's wants budget.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WantsImpact {
  pub total_want_spent:      Decimal,
  pub want_budget:           Decimal,
  pub remaining_want_budget: Decimal,
  pub category_breakdown:    Vec<CategorySpend>,
  pub message:               String,
}

#[derive(Debug, Serialize)]
pub struct SpontaneousResponse {
  pub transaction: Transaction,
  pub impact:      WantsImpact,
}

/// `POST /transactions/spontaneous`: record an unplanned WANT expense and
/// report what it does to the month's wants budget.
pub async fn spontaneous<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<SpontaneousBody>,
) -> Result<Json<SpontaneousResponse>, ApiError>
where
  S: FinanceStore,
{
  let input = NewTransaction {
    amount:      validate_amount("amount", body.amount)?,
    description: require_text("description", &body.description)?,
    kind:        TransactionType::Expense,
    bucket:      Bucket::Want,
    date:        None,
    category:    require_text("category", &body.category)?,
    tags:        vec![SPONTANEOUS_TAG.to_owned()],
    ai_analysis: None,
  };
  let transaction = state
    .store
    .add_transaction(input)
    .await
    .map_err(ApiError::store)?;

  let (start, end) = Period::Month.bounds(Utc::now());
  let query = TransactionQuery {
    bucket: Some(Bucket::Want),
    ..TransactionQuery::between(start, end)
  };
  let wants = state
    .store
    .list_transactions(&query)
    .await
    .map_err(ApiError::store)?;
  let income = monthly_income(state.store.as_ref(), state.default_income)
    .await
    .map_err(ApiError::store)?;

  let want_budget = allowed(income, Bucket::Want);
  let total_want_spent: Decimal = wants.iter().map(|t| t.amount).sum();
  let remaining = want_budget - total_want_spent;
  let message = if remaining < Decimal::ZERO {
    format!(
      "This purchase puts you {} over your wants budget!",
      format_usd(remaining.abs())
    )
  } else {
    format!(
      "You have {} left in your wants budget this month.",
      format_usd(remaining)
    )
  };

  Ok(Json(SpontaneousResponse {
    transaction,
    impact: WantsImpact {
      total_want_spent,
      want_budget,
      remaining_want_budget: remaining,
      category_breakdown: category_breakdown(&wants),
      message,
    },
  }))
}
