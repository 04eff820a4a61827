//! Budget-impact analysis and coaching text.
//!
//! Works on expense transactions only: income rows never count as spending
//! here, unlike the raw bucket summary in [`crate::budget`].

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use strum::IntoEnumIterator;
use uuid::Uuid;

use crate::{
  budget::{BucketSummary, CategorySpend, allowed, category_breakdown, format_usd},
  category::Category,
  goal::{Goal, GoalStatus},
  transaction::{Bucket, Transaction, TransactionType},
};

/// Percentage above which a bucket is "close to the limit".
const WARNING_PERCENT: i64 = 80;

/// Ceiling for any reported percentage of a limit.
const MAX_PERCENT: Decimal = Decimal::ONE_THOUSAND;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  Success,
  Warning,
  Danger,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachingMessage {
  pub main_message: String,
  pub details:      Vec<String>,
  pub suggestions:  Vec<String>,
  pub severity:     Severity,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
  pub goal_id:          Uuid,
  pub name:             String,
  pub target_amount:    Decimal,
  pub current_amount:   Decimal,
  pub deadline:         Option<NaiveDate>,
  pub monthly_required: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetImpact {
  pub income:            Decimal,
  pub bucket_spending:   BTreeMap<Bucket, Decimal>,
  pub category_spending: Vec<CategorySpend>,
  pub budget_limits:     BTreeMap<Bucket, Decimal>,
  /// Only buckets whose spending exceeds the limit.
  pub overspending:      BTreeMap<Bucket, Decimal>,
  pub coaching:          CoachingMessage,
  pub goals:             Vec<GoalProgress>,
}

fn percent_used(spent: Decimal, limit: Decimal) -> Decimal {
  if limit.is_zero() {
    return if spent.is_zero() { Decimal::ZERO } else { MAX_PERCENT };
  }
  spent
    .checked_div(limit)
    .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
    .map_or(MAX_PERCENT, |pct| pct.min(MAX_PERCENT))
}

fn over_budget_categories(categories: &[Category], spending: &[CategorySpend]) -> Vec<String> {
  spending
    .iter()
    .filter_map(|spend| {
      let budget = categories
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(&spend.category))?
        .budget
        .filter(|b| !b.is_zero())?;
      (spend.total > budget).then(|| {
        format!(
          "{} ({:.1}% over budget)",
          spend.category,
          percent_used(spend.total, budget) - Decimal::ONE_HUNDRED
        )
      })
    })
    .collect()
}

/// Analyse this period's expenses against the 50/30/20 limits.
pub fn analyze_impact(
  income: Decimal,
  transactions: &[Transaction],
  categories: &[Category],
  goals: &[Goal],
  today: NaiveDate,
) -> BudgetImpact {
  let expenses: Vec<&Transaction> = transactions
    .iter()
    .filter(|t| t.kind == TransactionType::Expense)
    .collect();

  let mut bucket_spending: BTreeMap<Bucket, Decimal> =
    Bucket::iter().map(|b| (b, Decimal::ZERO)).collect();
  for tx in &expenses {
    *bucket_spending.entry(tx.bucket).or_default() += tx.amount;
  }

  let budget_limits: BTreeMap<Bucket, Decimal> =
    Bucket::iter().map(|b| (b, allowed(income, b))).collect();

  let overspending = Bucket::iter()
    .filter_map(|b| {
      let over = bucket_spending[&b] - budget_limits[&b];
      (over > Decimal::ZERO).then_some((b, over))
    })
    .collect();

  let category_spending = category_breakdown(expenses.iter().copied());

  let progress: Vec<GoalProgress> = goals
    .iter()
    .map(|g| GoalProgress {
      goal_id:          g.goal_id,
      name:             g.name.clone(),
      target_amount:    g.target_amount,
      current_amount:   g.current_amount,
      deadline:         g.deadline,
      monthly_required: g.monthly_required(today),
    })
    .collect();

  let summaries: Vec<BucketSummary> = Bucket::iter()
    .map(|b| BucketSummary {
      bucket:    b,
      allowed:   budget_limits[&b],
      spent:     bucket_spending[&b],
      remaining: budget_limits[&b] - bucket_spending[&b],
    })
    .collect();

  let active: Vec<GoalProgress> = goals
    .iter()
    .zip(&progress)
    .filter(|(g, _)| g.status == GoalStatus::InProgress)
    .map(|(_, p)| p.clone())
    .collect();

  let coaching = coach(&summaries, categories, &category_spending, &active);

  BudgetImpact {
    income,
    bucket_spending,
    category_spending,
    budget_limits,
    overspending,
    coaching,
    goals: progress,
  }
}

/// Produce coaching text from per-bucket spending.
pub fn coach(
  summaries: &[BucketSummary],
  categories: &[Category],
  spending: &[CategorySpend],
  goals: &[GoalProgress],
) -> CoachingMessage {
  let pct = |bucket: Bucket| {
    summaries
      .iter()
      .find(|s| s.bucket == bucket)
      .map(|s| percent_used(s.spent, s.allowed))
      .unwrap_or_default()
  };
  let needs = pct(Bucket::Need);
  let wants = pct(Bucket::Want);
  let savings = pct(Bucket::Saving);
  let warning = Decimal::from(WARNING_PERCENT);

  let mut details = Vec::new();
  let mut suggestions = Vec::new();
  let mut severity = Severity::Success;

  if needs > Decimal::ONE_HUNDRED {
    severity = Severity::Danger;
    details.push(format!(
      "You've exceeded your needs budget by {:.1}%",
      needs - Decimal::ONE_HUNDRED
    ));
    let over = over_budget_categories(categories, spending);
    if !over.is_empty() {
      details.push(format!("Over budget in: {}", over.join(", ")));
    }
    suggestions.push(
      "Review your essential expenses to find areas where you can reduce spending".to_owned(),
    );
    suggestions
      .push("Look for ways to reduce utility bills or find more affordable housing".to_owned());
  } else if needs > warning {
    severity = Severity::Warning;
    details.push(format!("You're close to your needs budget limit ({needs:.1}% used)"));
    suggestions.push("Start planning for next month's essential expenses".to_owned());
  }

  if wants > Decimal::ONE_HUNDRED {
    severity = if severity == Severity::Success { Severity::Warning } else { Severity::Danger };
    details.push(format!(
      "You've exceeded your wants budget by {:.1}%",
      wants - Decimal::ONE_HUNDRED
    ));
    suggestions
      .push("Try a cooling-off period before making non-essential purchases".to_owned());
    suggestions.push("Look for free or lower-cost alternatives for entertainment".to_owned());
  } else if wants > warning {
    severity = severity.max(Severity::Warning);
    details.push(format!("You're close to your wants budget limit ({wants:.1}% used)"));
    suggestions.push("Plan your discretionary spending for the rest of the month".to_owned());
  }

  if savings < warning {
    severity = severity.max(Severity::Warning);
    details.push(format!("You're behind on your savings target ({savings:.1}% of target)"));

    let savings_limit = summaries
      .iter()
      .find(|s| s.bucket == Bucket::Saving)
      .map(|s| s.allowed)
      .unwrap_or_default();
    if !goals.is_empty() {
      let per_goal = savings_limit / Decimal::from(goals.len());
      let at_risk: Vec<&str> = goals
        .iter()
        .filter(|g| g.monthly_required.is_some_and(|m| m > per_goal))
        .map(|g| g.name.as_str())
        .collect();
      if !at_risk.is_empty() {
        details.push(format!(
          "Your savings rate may affect these goals: {}",
          at_risk.join(", ")
        ));
      }
    }
    suggestions.push("Set up automatic transfers to your savings account".to_owned());
    suggestions
      .push("Look for ways to increase your income or reduce expenses to boost savings".to_owned());
  }

  let main_message = match severity {
    Severity::Danger => "Your spending needs immediate attention!",
    Severity::Warning => "Your budget needs some adjustments.",
    Severity::Success => "You're on track with your budget!",
  }
  .to_owned();

  if severity == Severity::Success {
    let mut good = Vec::new();
    if needs < warning {
      good.push("managing essential expenses well");
    }
    if wants < warning {
      good.push("keeping discretionary spending under control");
    }
    if savings >= Decimal::ONE_HUNDRED {
      good.push("exceeding your savings target");
    }
    if !good.is_empty() {
      details.push(format!("Great job {}!", good.join(" and ")));
    }
  }

  CoachingMessage { main_message, details, suggestions, severity }
}

const GENERAL_TIPS: &[&str] = &[
  "Pay yourself first: move your savings share out on payday, before spending anything.",
  "Wait 24 hours before any non-essential purchase over $50.",
  "Review your subscriptions once a month and cancel the ones you did not use.",
  "Cook at home a few more nights a week; dining out is the easiest want to trim.",
  "Keep three to six months of needs in an emergency fund before investing aggressively.",
  "Round up every purchase and send the difference to savings.",
];

/// A tip targeted at the worst bucket, or a general tip rotating by day.
pub fn financial_tip(summaries: &[BucketSummary], today: NaiveDate) -> String {
  let worst = summaries
    .iter()
    .filter(|s| s.spent > s.allowed)
    .max_by_key(|s| s.spent - s.allowed);

  match worst.map(|s| (s.bucket, s.spent - s.allowed)) {
    Some((Bucket::Need, over)) => format!(
      "Your needs are {} over budget. Audit recurring bills and check whether any \
       'needs' are really wants.",
      format_usd(over)
    ),
    Some((Bucket::Want, over)) => format!(
      "Your wants are {} over budget. Pause discretionary purchases until next month.",
      format_usd(over)
    ),
    Some((Bucket::Saving, over)) => format!(
      "You've saved {} more than planned this period. Consider putting it toward a goal.",
      format_usd(over)
    ),
    None => {
      let idx = today.ordinal0() as usize % GENERAL_TIPS.len();
      GENERAL_TIPS[idx].to_owned()
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;

  fn summary(bucket: Bucket, allowed: i64, spent: i64) -> BucketSummary {
    BucketSummary {
      bucket,
      allowed:   Decimal::from(allowed),
      spent:     Decimal::from(spent),
      remaining: Decimal::from(allowed - spent),
    }
  }

  #[test]
  fn on_track_budget_is_success() {
    let s = vec![
      summary(Bucket::Need, 1500, 700),
      summary(Bucket::Want, 900, 300),
      summary(Bucket::Saving, 600, 650),
    ];
    let msg = coach(&s, &[], &[], &[]);
    assert_eq!(msg.severity, Severity::Success);
    assert!(msg.details.iter().any(|d| d.starts_with("Great job")));
  }

  #[test]
  fn needs_overspend_is_danger_and_names_categories() {
    let s = vec![
      summary(Bucket::Need, 1000, 1200),
      summary(Bucket::Want, 600, 0),
      summary(Bucket::Saving, 400, 400),
    ];
    let categories = vec![Category {
      category_id: Uuid::new_v4(),
      name:        "Rent".into(),
      budget:      Some(Decimal::from(1000)),
      kind:        crate::category::CategoryType::Expense,
      created_at:  Utc::now(),
    }];
    let spending = vec![CategorySpend {
      category: "Rent".into(),
      total:    Decimal::from(1200),
      bucket:   Bucket::Need,
    }];
    let msg = coach(&s, &categories, &spending, &[]);
    assert_eq!(msg.severity, Severity::Danger);
    assert!(msg.details.iter().any(|d| d.contains("Rent (20.0% over budget)")), "{:?}", msg.details);
  }

  #[test]
  fn low_savings_flags_goals_at_risk() {
    let s = vec![
      summary(Bucket::Need, 1500, 100),
      summary(Bucket::Want, 900, 100),
      summary(Bucket::Saving, 600, 0),
    ];
    let goals = vec![GoalProgress {
      goal_id:          Uuid::new_v4(),
      name:             "House".into(),
      target_amount:    Decimal::from(50_000),
      current_amount:   Decimal::ZERO,
      deadline:         None,
      monthly_required: Some(Decimal::from(2000)),
    }];
    let msg = coach(&s, &[], &[], &goals);
    assert_eq!(msg.severity, Severity::Warning);
    assert!(msg.details.iter().any(|d| d.contains("House")));
  }

  #[test]
  fn tip_targets_worst_overspent_bucket() {
    let s = vec![
      summary(Bucket::Need, 1500, 1600),
      summary(Bucket::Want, 900, 1400),
      summary(Bucket::Saving, 600, 0),
    ];
    let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let tip = financial_tip(&s, today);
    assert!(tip.contains("wants are $500.00 over"), "{tip}");
  }

  #[test]
  fn tip_without_overspend_is_general() {
    let s = vec![summary(Bucket::Need, 1500, 10)];
    let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    assert_eq!(financial_tip(&s, today), GENERAL_TIPS[0]);
  }

  #[test]
  fn percentages_of_tiny_limits_are_capped() {
    assert_eq!(percent_used(Decimal::from(2000), Decimal::new(1, 26)), MAX_PERCENT);
    assert_eq!(percent_used(Decimal::from(50), Decimal::from(200)), Decimal::from(25));
  }

  #[test]
  fn impact_survives_tiny_budget_and_income() {
    let today = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
    let rent = Transaction {
      transaction_id: Uuid::new_v4(),
      amount:         Decimal::from(2000),
      description:    "rent".into(),
      kind:           TransactionType::Expense,
      bucket:         Bucket::Need,
      date:           Utc::now(),
      category_id:    Uuid::new_v4(),
      category_name:  "Rent".into(),
      tags:           vec![],
      ai_analysis:    None,
      created_at:     Utc::now(),
    };
    let categories = vec![Category {
      category_id: rent.category_id,
      name:        "Rent".into(),
      budget:      Some(Decimal::new(1, 26)),
      kind:        crate::category::CategoryType::Expense,
      created_at:  Utc::now(),
    }];

    let impact = analyze_impact(Decimal::new(1, 27), &[rent], &categories, &[], today);
    assert_eq!(impact.coaching.severity, Severity::Danger);
    assert!(impact.overspending.contains_key(&Bucket::Need));
    assert!(impact.coaching.details.iter().any(|d| d.contains("Rent")));
  }

  #[test]
  fn impact_ignores_income_rows() {
    let today = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
    let mk = |amount: i64, kind: TransactionType, bucket: Bucket| Transaction {
      transaction_id: Uuid::new_v4(),
      amount:         Decimal::from(amount),
      description:    "x".into(),
      kind,
      bucket,
      date:           Utc::now(),
      category_id:    Uuid::new_v4(),
      category_name:  "Misc".into(),
      tags:           vec![],
      ai_analysis:    None,
      created_at:     Utc::now(),
    };
    let txs = vec![
      mk(5000, TransactionType::Income, Bucket::Saving),
      mk(1000, TransactionType::Expense, Bucket::Want),
    ];
    let impact = analyze_impact(Decimal::from(3000), &txs, &[], &[], today);
    assert_eq!(impact.bucket_spending[&Bucket::Saving], Decimal::ZERO);
    assert_eq!(impact.overspending.get(&Bucket::Want), Some(&Decimal::from(100)));
    assert!(!impact.overspending.contains_key(&Bucket::Need));
  }
}
