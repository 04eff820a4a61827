//! The 50/30/20 budget model.
//!
//! Pure functions over a monthly income and a slice of transactions that the
//! caller has already restricted to a period. Nothing here is persisted; every
//! report is recomputed on request.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use strum::IntoEnumIterator;

use crate::{
  period::Period,
  transaction::{Bucket, Transaction, TransactionType},
};

impl Bucket {
  /// Share of monthly income allotted to this bucket.
  pub fn share(self) -> Decimal {
    match self {
      Self::Need => Decimal::new(5, 1),
      Self::Want => Decimal::new(3, 1),
      Self::Saving => Decimal::new(2, 1),
    }
  }
}

/// Spending above this fraction of the allowance raises a near-limit alert.
pub fn near_limit_ratio() -> Decimal { Decimal::new(9, 1) }

/// Render a dollar amount with two decimals, e.g. `$50.00` or `-$3.10`.
pub fn format_usd(amount: Decimal) -> String {
  let rounded = amount.round_dp(2);
  if rounded.is_sign_negative() && !rounded.is_zero() {
    format!("-${:.2}", rounded.abs())
  } else {
    format!("${:.2}", rounded.abs())
  }
}

// ─── Bucket summary ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketSummary {
  pub bucket:    Bucket,
  pub allowed:   Decimal,
  pub spent:     Decimal,
  pub remaining: Decimal,
}

/// Allowance for `bucket` given `income`.
pub fn allowed(income: Decimal, bucket: Bucket) -> Decimal { income * bucket.share() }

/// Sum of transaction amounts per bucket. All three buckets are present.
pub fn spent_by_bucket<'a>(
  transactions: impl IntoIterator<Item = &'a Transaction>,
) -> BTreeMap<Bucket, Decimal> {
  let mut totals: BTreeMap<Bucket, Decimal> =
    Bucket::iter().map(|b| (b, Decimal::ZERO)).collect();
  for tx in transactions {
    *totals.entry(tx.bucket).or_default() += tx.amount;
  }
  totals
}

/// One summary per bucket, in `NEED, WANT, SAVING` order, zero-filled.
pub fn summarize_buckets(income: Decimal, transactions: &[Transaction]) -> Vec<BucketSummary> {
  let spent = spent_by_bucket(transactions);
  Bucket::iter()
    .map(|bucket| {
      let allowed = allowed(income, bucket);
      let spent = spent.get(&bucket).copied().unwrap_or_default();
      BucketSummary {
        bucket,
        allowed,
        spent,
        remaining: allowed - spent,
      }
    })
    .collect()
}

// ─── Alerts ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AlertKind {
  OverBudget { by: Decimal },
  NearLimit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetAlert {
  pub bucket:  Bucket,
  #[serde(flatten)]
  pub kind:    AlertKind,
  pub message: String,
}

/// Over-budget takes precedence; the two alerts are mutually exclusive.
pub fn alert_for(summary: &BucketSummary) -> Option<BudgetAlert> {
  let BucketSummary { bucket, allowed, spent, .. } = *summary;
  if spent > allowed {
    let by = spent - allowed;
    Some(BudgetAlert {
      bucket,
      kind: AlertKind::OverBudget { by },
      message: format!("Your {bucket} spending is over budget by {}!", format_usd(by)),
    })
  } else if spent > allowed * near_limit_ratio() {
    Some(BudgetAlert {
      bucket,
      kind: AlertKind::NearLimit,
      message: format!("You are close to your {bucket} budget."),
    })
  } else {
    None
  }
}

// ─── Category breakdown ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySpend {
  pub category: String,
  pub total:    Decimal,
  /// Bucket of the first transaction seen for the category.
  pub bucket:   Bucket,
}

/// Per-category totals in the order categories first appear.
pub fn category_breakdown<'a>(
  transactions: impl IntoIterator<Item = &'a Transaction>,
) -> Vec<CategorySpend> {
  let mut out: Vec<CategorySpend> = Vec::new();
  for tx in transactions {
    match out.iter_mut().find(|c| c.category == tx.category_name) {
      Some(entry) => entry.total += tx.amount,
      None => out.push(CategorySpend {
        category: tx.category_name.clone(),
        total:    tx.amount,
        bucket:   tx.bucket,
      }),
    }
  }
  out
}

/// The `n` largest categories by total, descending.
pub fn top_categories(mut breakdown: Vec<CategorySpend>, n: usize) -> Vec<CategorySpend> {
  breakdown.sort_by(|a, b| b.total.cmp(&a.total));
  breakdown.truncate(n);
  breakdown
}

// ─── Cash flow ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlow {
  pub income:   Decimal,
  pub expenses: Decimal,
  pub net:      Decimal,
}

pub fn cash_flow(transactions: &[Transaction]) -> CashFlow {
  let (income, expenses) =
    transactions
      .iter()
      .fold((Decimal::ZERO, Decimal::ZERO), |(i, e), tx| match tx.kind {
        TransactionType::Income => (i + tx.amount, e),
        TransactionType::Expense => (i, e + tx.amount),
      });
  CashFlow { income, expenses, net: income - expenses }
}

// ─── Full report ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetReport {
  pub period:             Period,
  pub income:             Decimal,
  pub total_spent:        Decimal,
  pub total_saved:        Decimal,
  pub summary:            Vec<BucketSummary>,
  pub category_breakdown: Vec<CategorySpend>,
  pub alerts:             Vec<BudgetAlert>,
  pub suggestions:        Vec<String>,
}

impl BudgetReport {
  pub fn bucket(&self, bucket: Bucket) -> Option<&BucketSummary> {
    self.summary.iter().find(|s| s.bucket == bucket)
  }
}

pub fn build_report(income: Decimal, period: Period, transactions: &[Transaction]) -> BudgetReport {
  let summary = summarize_buckets(income, transactions);
  let alerts: Vec<BudgetAlert> = summary.iter().filter_map(alert_for).collect();
  let suggestions = alerts
    .iter()
    .filter(|a| matches!(a.kind, AlertKind::OverBudget { .. }))
    .map(|a| {
      format!(
        "Try to reduce your {} spending next week.",
        a.bucket.as_ref().to_lowercase()
      )
    })
    .collect();

  BudgetReport {
    period,
    income,
    total_spent: summary.iter().map(|s| s.spent).sum(),
    total_saved: summary
      .iter()
      .find(|s| s.bucket == Bucket::Saving)
      .map(|s| s.spent)
      .unwrap_or_default(),
    category_breakdown: category_breakdown(transactions),
    summary,
    alerts,
    suggestions,
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use uuid::Uuid;

  use super::*;

  fn tx(amount: i64, bucket: Bucket, category: &str) -> Transaction {
    Transaction {
      transaction_id: Uuid::new_v4(),
      amount:         Decimal::from(amount),
      description:    "test".into(),
      kind:           TransactionType::Expense,
      bucket,
      date:           Utc::now(),
      category_id:    Uuid::new_v4(),
      category_name:  category.into(),
      tags:           vec![],
      ai_analysis:    None,
      created_at:     Utc::now(),
    }
  }

  #[test]
  fn allowances_sum_to_income_exactly() {
    for cents in [1_i64, 99, 300_000, 123_457, 999_999_99] {
      let income = Decimal::new(cents, 2);
      let total: Decimal = Bucket::iter().map(|b| allowed(income, b)).sum();
      assert_eq!(total, income, "income {income}");
    }
  }

  #[test]
  fn single_need_expense_scenario() {
    let income = Decimal::from(3000);
    let txs = vec![tx(150, Bucket::Need, "Groceries")];
    let report = build_report(income, Period::Month, &txs);

    let need = report.bucket(Bucket::Need).unwrap();
    assert_eq!(need.allowed, Decimal::from(1500));
    assert_eq!(need.spent, Decimal::from(150));
    assert_eq!(need.remaining, Decimal::from(1350));
    assert!(report.alerts.is_empty());
  }

  #[test]
  fn want_overspend_scenario() {
    let income = Decimal::from(3000);
    let txs = vec![tx(600, Bucket::Want, "Dining"), tx(350, Bucket::Want, "Games")];
    let report = build_report(income, Period::Month, &txs);

    let want = report.bucket(Bucket::Want).unwrap();
    assert_eq!(want.allowed, Decimal::from(900));
    assert_eq!(want.remaining, Decimal::from(-50));
    assert_eq!(report.alerts.len(), 1);
    let alert = &report.alerts[0];
    assert_eq!(alert.kind, AlertKind::OverBudget { by: Decimal::from(50) });
    assert!(alert.message.contains("over budget by $50.00"), "{}", alert.message);
    assert_eq!(report.suggestions.len(), 1);
  }

  #[test]
  fn empty_buckets_are_reported_as_zero() {
    let report = build_report(Decimal::from(1000), Period::Week, &[]);
    assert_eq!(report.summary.len(), 3);
    assert!(report.summary.iter().all(|s| s.spent.is_zero()));
    assert_eq!(report.total_spent, Decimal::ZERO);
  }

  #[test]
  fn near_limit_fires_only_above_ninety_percent() {
    let at = BucketSummary {
      bucket:    Bucket::Saving,
      allowed:   Decimal::from(100),
      spent:     Decimal::from(90),
      remaining: Decimal::from(10),
    };
    assert!(alert_for(&at).is_none());

    let above = BucketSummary { spent: Decimal::new(9001, 2), ..at.clone() };
    assert_eq!(alert_for(&above).unwrap().kind, AlertKind::NearLimit);

    let exact = BucketSummary { spent: Decimal::from(100), ..at };
    assert_eq!(alert_for(&exact).unwrap().kind, AlertKind::NearLimit);
  }

  #[test]
  fn breakdown_keeps_first_seen_order_and_top_sorts() {
    let txs = vec![
      tx(10, Bucket::Need, "Rent"),
      tx(50, Bucket::Want, "Fun"),
      tx(30, Bucket::Need, "Rent"),
      tx(5, Bucket::Want, "Coffee"),
    ];
    let breakdown = category_breakdown(&txs);
    let names: Vec<&str> = breakdown.iter().map(|c| c.category.as_str()).collect();
    assert_eq!(names, vec!["Rent", "Fun", "Coffee"]);
    assert_eq!(breakdown[0].total, Decimal::from(40));

    let top = top_categories(breakdown, 2);
    let names: Vec<&str> = top.iter().map(|c| c.category.as_str()).collect();
    assert_eq!(names, vec!["Fun", "Rent"]);
  }

  #[test]
  fn cash_flow_separates_income_and_expenses() {
    let mut salary = tx(2000, Bucket::Saving, "Salary");
    salary.kind = TransactionType::Income;
    let flow = cash_flow(&[salary, tx(300, Bucket::Need, "Rent")]);
    assert_eq!(flow.income, Decimal::from(2000));
    assert_eq!(flow.expenses, Decimal::from(300));
    assert_eq!(flow.net, Decimal::from(1700));
  }

  #[test]
  fn format_usd_pads_and_signs() {
    assert_eq!(format_usd(Decimal::from(50)), "$50.00");
    assert_eq!(format_usd(Decimal::new(-310, 2)), "-$3.10");
  }
}
