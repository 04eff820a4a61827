//! The `FinanceStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `tally-store-sqlite`).
//! Higher layers (`tally-voice`, `tally-api`) depend on this abstraction, not
//! on any concrete backend. The handle is constructed once by the process
//! entry point and passed down explicitly.

use std::future::Future;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
  category::{Category, NewCategory},
  goal::{Goal, GoalPatch, GoalStatus, NewGoal},
  recurring::{NewRecurringExpense, RecurringExpense},
  settings::UserConfig,
  transaction::{NewTransaction, Transaction, TransactionPatch, TransactionQuery},
  voice::{VoiceCommand, VoiceCommandUpdate},
};

/// Abstraction over a Tally storage backend.
///
/// Lookups that miss return `Ok(None)` / `Ok(false)`; turning a miss into a
/// `NotFound` error is the caller's decision.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait FinanceStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Categories ────────────────────────────────────────────────────────

  fn list_categories(
    &self,
  ) -> impl Future<Output = Result<Vec<Category>, Self::Error>> + Send + '_;

  /// Look up a category by name (case-insensitive).
  fn get_category(
    &self,
    name: String,
  ) -> impl Future<Output = Result<Option<Category>, Self::Error>> + Send + '_;

  /// Return the category with this name, creating it from `input` if it does
  /// not exist. An existing category is returned unchanged.
  fn upsert_category(
    &self,
    input: NewCategory,
  ) -> impl Future<Output = Result<Category, Self::Error>> + Send + '_;

  /// Set (or clear) the budget of an existing category. Never creates one.
  fn set_category_budget(
    &self,
    name: String,
    budget: Option<Decimal>,
  ) -> impl Future<Output = Result<Option<Category>, Self::Error>> + Send + '_;

  // ── Transactions ──────────────────────────────────────────────────────

  /// Upsert the referenced category and insert the transaction, atomically.
  fn add_transaction(
    &self,
    input: NewTransaction,
  ) -> impl Future<Output = Result<Transaction, Self::Error>> + Send + '_;

  fn get_transaction(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Transaction>, Self::Error>> + Send + '_;

  fn list_transactions<'a>(
    &'a self,
    query: &'a TransactionQuery,
  ) -> impl Future<Output = Result<Vec<Transaction>, Self::Error>> + Send + 'a;

  fn update_transaction(
    &self,
    id: Uuid,
    patch: TransactionPatch,
  ) -> impl Future<Output = Result<Option<Transaction>, Self::Error>> + Send + '_;

  /// Physically delete a transaction. Returns `false` if it did not exist.
  fn delete_transaction(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Goals ─────────────────────────────────────────────────────────────

  fn create_goal(
    &self,
    input: NewGoal,
  ) -> impl Future<Output = Result<Goal, Self::Error>> + Send + '_;

  fn get_goal(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Goal>, Self::Error>> + Send + '_;

  /// Newest first, optionally filtered by status.
  fn list_goals(
    &self,
    status: Option<GoalStatus>,
  ) -> impl Future<Output = Result<Vec<Goal>, Self::Error>> + Send + '_;

  /// Apply `patch`. `add_amount` is applied as one atomic read-modify-write.
  fn update_goal(
    &self,
    id: Uuid,
    patch: GoalPatch,
  ) -> impl Future<Output = Result<Option<Goal>, Self::Error>> + Send + '_;

  fn delete_goal(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Recurring expenses ────────────────────────────────────────────────

  fn add_recurring_expense(
    &self,
    input: NewRecurringExpense,
  ) -> impl Future<Output = Result<RecurringExpense, Self::Error>> + Send + '_;

  fn list_recurring_expenses(
    &self,
  ) -> impl Future<Output = Result<Vec<RecurringExpense>, Self::Error>> + Send + '_;

  // ── Voice audit ───────────────────────────────────────────────────────

  /// Insert an audit row with intent `PROCESSING` and `success = false`.
  fn begin_voice_command(
    &self,
    raw_text: String,
  ) -> impl Future<Output = Result<VoiceCommand, Self::Error>> + Send + '_;

  /// Complete an audit row. Returns `false` if the row does not exist.
  fn finish_voice_command(
    &self,
    id: Uuid,
    update: VoiceCommandUpdate,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Most recent first.
  fn list_voice_commands(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<VoiceCommand>, Self::Error>> + Send + '_;

  // ── User configuration ────────────────────────────────────────────────

  fn get_config(
    &self,
    key: String,
  ) -> impl Future<Output = Result<Option<UserConfig>, Self::Error>> + Send + '_;

  fn set_config(
    &self,
    key: String,
    value: String,
  ) -> impl Future<Output = Result<UserConfig, Self::Error>> + Send + '_;

  fn list_config(
    &self,
  ) -> impl Future<Output = Result<Vec<UserConfig>, Self::Error>> + Send + '_;

  // ── Maintenance ───────────────────────────────────────────────────────

  /// Delete every row in every table.
  fn reset(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
