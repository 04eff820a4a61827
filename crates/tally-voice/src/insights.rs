//! Free-text monthly spending insight from the completion endpoint.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tally_core::{
  Error, Result,
  budget::format_usd,
  period::Period,
  store::FinanceStore,
  transaction::{Transaction, TransactionQuery},
};

use crate::resolver::LlmClient;

/// How many of this month's transactions are summarised in the prompt.
pub const INSIGHT_SAMPLE: usize = 50;

const SYSTEM: &str = "You are a financial assistant.";

#[derive(Debug, Clone, Serialize)]
pub struct Insight {
  pub insight: String,
}

/// The prompt sent for a set of transactions, newest first.
pub fn insight_prompt(transactions: &[Transaction]) -> String {
  let lines: Vec<String> = transactions
    .iter()
    .map(|t| format!("- {} for {} ({})", format_usd(t.amount), t.description, t.bucket))
    .collect();
  format!(
    "Here are the user's recent transactions for this month:\n{}\n\nSummarize the user's \
     spending habits in one sentence. Suggest one way they could save more next month. If \
     possible, predict if they are on track with their 50/30/20 budget.",
    lines.join("\n")
  )
}

/// Summarise month-to-date spending in one model call.
pub async fn monthly_insight<S: FinanceStore>(
  store: &S,
  llm: &LlmClient,
  now: DateTime<Utc>,
) -> Result<Insight> {
  let (start, _) = Period::Month.bounds(now);
  let query = TransactionQuery {
    limit: Some(INSIGHT_SAMPLE),
    ..TransactionQuery::between(start, now)
  };
  let transactions = store.list_transactions(&query).await.map_err(Error::store)?;
  let insight = llm.complete(SYSTEM, &insight_prompt(&transactions)).await?;
  Ok(Insight { insight })
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use rust_decimal::Decimal;
  use tally_core::transaction::{Bucket, TransactionType};
  use uuid::Uuid;

  use super::*;

  #[test]
  fn prompt_lists_each_transaction() {
    let tx = Transaction {
      transaction_id: Uuid::new_v4(),
      amount:         Decimal::new(450, 2),
      description:    "Coffee".into(),
      kind:           TransactionType::Expense,
      bucket:         Bucket::Want,
      date:           Utc::now(),
      category_id:    Uuid::new_v4(),
      category_name:  "Dining".into(),
      tags:           vec![],
      ai_analysis:    None,
      created_at:     Utc::now(),
    };
    let prompt = insight_prompt(&[tx]);
    assert!(prompt.contains("- $4.50 for Coffee (WANT)"));
    assert!(prompt.contains("50/30/20"));
  }
}
