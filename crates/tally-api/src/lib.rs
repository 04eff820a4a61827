//! JSON REST API for Tally.
//!
//! Exposes an axum [`Router`] backed by any [`tally_core::store::FinanceStore`]
//! plus the voice command pipeline. Auth, TLS, and transport concerns are the
//! caller's responsibility.

pub mod admin;
pub mod categories;
pub mod config;
pub mod error;
pub mod goals;
pub mod recurring;
pub mod reports;
pub mod transactions;
pub mod voice;

use std::sync::Arc;

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, post, put},
};
use rust_decimal::Decimal;
use tally_core::store::FinanceStore;
use tally_voice::VoiceService;

pub use error::ApiError;

/// Largest accepted request body; audio uploads dominate.
pub const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:          Arc<S>,
  pub voice:          VoiceService<S>,
  /// Monthly income used while none is configured.
  pub default_income: Decimal,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:          Arc::clone(&self.store),
      voice:          self.voice.clone(),
      default_income: self.default_income,
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: FinanceStore + 'static,
{
  Router::new()
    // Transactions
    .route(
      "/transactions",
      get(transactions::list::<S>).post(transactions::create::<S>),
    )
    .route("/transactions/spontaneous", post(transactions::spontaneous::<S>))
    .route(
      "/transactions/{id}",
      get(transactions::get_one::<S>)
        .patch(transactions::update::<S>)
        .delete(transactions::delete::<S>),
    )
    // Goals
    .route("/goals", get(goals::list::<S>).post(goals::create::<S>))
    .route(
      "/goals/{id}",
      get(goals::get_one::<S>)
        .patch(goals::update::<S>)
        .delete(goals::delete::<S>),
    )
    // Categories
    .route(
      "/categories",
      get(categories::list::<S>).post(categories::create::<S>),
    )
    .route("/categories/{name}/budget", put(categories::set_budget::<S>))
    // Recurring expenses
    .route("/recurring", get(recurring::list::<S>).post(recurring::create::<S>))
    // Configuration
    .route("/config", get(config::list::<S>).post(config::set::<S>))
    .route("/config/{key}", get(config::get_one::<S>))
    // Reports
    .route("/buckets/summary", get(reports::summary::<S>))
    .route("/forecast", get(reports::forecast::<S>))
    .route("/budget/impact", get(reports::impact::<S>))
    .route("/insights", get(reports::insights::<S>))
    // Voice
    .route("/voice", post(voice::command::<S>))
    .route("/voice/history", get(voice::history::<S>))
    // Maintenance
    .route("/admin/reset", post(admin::reset::<S>))
    .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
    .with_state(state)
}
