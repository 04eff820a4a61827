//! Transactions and the enumerations that classify them.
//!
//! A transaction always belongs to exactly one category and one of the three
//! budget buckets. Deletion is physical; there is no tombstone.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

/// Maximum number of rows a single listing returns when no explicit limit is
/// given by a command.
pub const PAGE_SIZE: usize = 20;

// ─── Enumerations ────────────────────────────────────────────────────────────

/// Whether money came in or went out.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumIter,
  EnumString,
)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum TransactionType {
  Income,
  Expense,
}

/// The 50/30/20 bucket a transaction counts against.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumIter,
  EnumString,
)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Bucket {
  Need,
  Want,
  Saving,
}

impl TryFrom<String> for TransactionType {
  type Error = strum::ParseError;

  fn try_from(s: String) -> Result<Self, Self::Error> { s.trim().parse() }
}

impl TryFrom<String> for Bucket {
  type Error = strum::ParseError;

  fn try_from(s: String) -> Result<Self, Self::Error> { s.trim().parse() }
}

// ─── Annotation ──────────────────────────────────────────────────────────────

/// Structured commentary attached by the language model.
///
/// `Option<AiAnalysis>::None` means "never analysed"; an all-default value
/// means "analysed, nothing to say".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiAnalysis {
  pub sentiment:   String,
  pub confidence:  f64,
  #[serde(default)]
  pub suggestions: Vec<String>,
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// A persisted transaction, joined with its category name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
  pub transaction_id: Uuid,
  pub amount:         Decimal,
  pub description:    String,
  #[serde(rename = "type")]
  pub kind:           TransactionType,
  pub bucket:         Bucket,
  pub date:           DateTime<Utc>,
  pub category_id:    Uuid,
  pub category_name:  String,
  pub tags:           Vec<String>,
  pub ai_analysis:    Option<AiAnalysis>,
  pub created_at:     DateTime<Utc>,
}

/// Input for [`FinanceStore::add_transaction`](crate::store::FinanceStore::add_transaction).
///
/// The category is referenced by name; the store upserts it in the same
/// database transaction as the insert.
#[derive(Debug, Clone)]
pub struct NewTransaction {
  pub amount:      Decimal,
  pub description: String,
  pub kind:        TransactionType,
  pub bucket:      Bucket,
  /// Defaults to the time of insertion.
  pub date:        Option<DateTime<Utc>>,
  pub category:    String,
  pub tags:        Vec<String>,
  pub ai_analysis: Option<AiAnalysis>,
}

/// Partial update for a transaction. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct TransactionPatch {
  pub amount:      Option<Decimal>,
  pub description: Option<String>,
  pub kind:        Option<TransactionType>,
  pub bucket:      Option<Bucket>,
  pub date:        Option<DateTime<Utc>>,
  /// Category name; upserted like on insert.
  pub category:    Option<String>,
  pub tags:        Option<Vec<String>>,
}

impl TransactionPatch {
  pub fn is_empty(&self) -> bool {
    self.amount.is_none()
      && self.description.is_none()
      && self.kind.is_none()
      && self.bucket.is_none()
      && self.date.is_none()
      && self.category.is_none()
      && self.tags.is_none()
  }
}

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`FinanceStore::list_transactions`](crate::store::FinanceStore::list_transactions).
///
/// Every field is an additional constraint; unset fields constrain nothing.
/// Results are always ordered by `date` descending.
#[derive(Debug, Clone, Default)]
pub struct TransactionQuery {
  /// Inclusive lower bound on `date`.
  pub start:    Option<DateTime<Utc>>,
  /// Inclusive upper bound on `date`.
  pub end:      Option<DateTime<Utc>>,
  /// Category name, compared case-insensitively.
  pub category: Option<String>,
  pub bucket:   Option<Bucket>,
  pub kind:     Option<TransactionType>,
  pub limit:    Option<usize>,
}

impl TransactionQuery {
  /// All transactions with `date` in `[start, end]`.
  pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
    Self {
      start: Some(start),
      end: Some(end),
      ..Self::default()
    }
  }
}
