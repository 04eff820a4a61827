//! Command Dispatcher: validate a [`Command`] and run it against the store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Value, json};
use tally_core::{
  Error, Result,
  budget::{build_report, cash_flow, category_breakdown, format_usd, summarize_buckets, top_categories},
  coaching::financial_tip,
  goal::{GoalPatch, NewGoal},
  period::Period,
  settings::{MONTHLY_INCOME_KEY, monthly_income},
  store::FinanceStore,
  transaction::{
    NewTransaction, PAGE_SIZE, Transaction, TransactionPatch, TransactionQuery, TransactionType,
  },
  validate::{
    normalize_tags, parse_date, parse_day, parse_end_date, parse_id, require_text,
    validate_amount, validate_budget, validate_deadline,
  },
};

use crate::command::{
  AddTransactionArgs, Command, CreateGoalArgs, GoalIdArgs, LimitArgs, ListGoalsArgs,
  ListTransactionsArgs, PeriodArgs, SetCategoryBudgetArgs, SetMonthlyIncomeArgs,
  TopCategoriesArgs, TransactionIdArgs, UpdateGoalArgs, UpdateTransactionArgs,
};

const DEFAULT_RECENT: u32 = 5;
const DEFAULT_TOP: u32 = 3;

/// What a command produced: a confirmation for the user and the affected
/// record(s).
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
  pub message: String,
  pub result:  Value,
}

impl Outcome {
  fn new(message: impl Into<String>, result: impl Serialize) -> Result<Self> {
    Ok(Self {
      message: message.into(),
      result:  serde_json::to_value(result)?,
    })
  }
}

pub struct Dispatcher<S> {
  store:          Arc<S>,
  default_income: Decimal,
}

impl<S> Clone for Dispatcher<S> {
  fn clone(&self) -> Self {
    Self {
      store:          Arc::clone(&self.store),
      default_income: self.default_income,
    }
  }
}

fn period_label(period: Period) -> &'static str {
  match period {
    Period::Week => "this week",
    Period::Month => "this month",
  }
}

fn clamp_limit(limit: Option<u32>, default: u32) -> usize {
  limit.unwrap_or(default).clamp(1, PAGE_SIZE as u32) as usize
}

impl<S: FinanceStore> Dispatcher<S> {
  pub fn new(store: Arc<S>, default_income: Decimal) -> Self { Self { store, default_income } }

  /// Run one command. Arguments are fully validated before the first write.
  pub async fn dispatch(&self, command: Command, now: DateTime<Utc>) -> Result<Outcome> {
    match command {
      Command::AddTransaction(args) => self.add_transaction(args).await,
      Command::UpdateTransaction(args) => self.update_transaction(args).await,
      Command::DeleteTransaction(args) => self.delete_transaction(args).await,
      Command::ListTransactions(args) => self.list_transactions(args).await,
      Command::CreateGoal(args) => self.create_goal(args, now).await,
      Command::UpdateGoal(args) => self.update_goal(args).await,
      Command::DeleteGoal(args) => self.delete_goal(args).await,
      Command::ListGoals(args) => self.list_goals(args).await,
      Command::SetCategoryBudget(args) => self.set_category_budget(args).await,
      Command::SetMonthlyIncome(args) => self.set_monthly_income(args).await,
      Command::GetBudgetStatus(args) => self.budget_status(args, now).await,
      Command::GetFinancialTip => self.financial_tip(now).await,
      Command::ShowRecentActivity(args) => self.recent_activity(args).await,
      Command::ShowTopSpendingCategories(args) => self.top_categories(args, now).await,
      Command::ShowIncomeVsExpenses(args) => self.income_vs_expenses(args, now).await,
    }
  }

  async fn income(&self) -> Result<Decimal> {
    monthly_income(self.store.as_ref(), self.default_income)
      .await
      .map_err(Error::store)
  }

  async fn transactions_in(
    &self,
    period: Period,
    now: DateTime<Utc>,
    kind: Option<TransactionType>,
  ) -> Result<Vec<Transaction>> {
    let (start, end) = period.bounds(now);
    let query = TransactionQuery { kind, ..TransactionQuery::between(start, end) };
    self.store.list_transactions(&query).await.map_err(Error::store)
  }

  // ── Transactions ──────────────────────────────────────────────────────────

  async fn add_transaction(&self, args: AddTransactionArgs) -> Result<Outcome> {
    let amount = validate_amount("amount", args.amount)?;
    let description = require_text("description", &args.description)?;
    let category = require_text("category", &args.category)?;
    let date = args.date.as_deref().map(|d| parse_date("date", d)).transpose()?;

    let tx = self
      .store
      .add_transaction(NewTransaction {
        amount,
        description,
        kind: args.kind,
        bucket: args.bucket,
        date,
        category,
        tags: normalize_tags(args.tags),
        ai_analysis: args.ai_analysis,
      })
      .await
      .map_err(Error::store)?;

    let verb = match tx.kind {
      TransactionType::Expense => "expense",
      TransactionType::Income => "income",
    };
    let message = format!(
      "Added {verb} of {} for {} in {} ({})",
      format_usd(tx.amount),
      tx.description,
      tx.category_name,
      tx.bucket.as_ref().to_lowercase(),
    );
    Outcome::new(message, tx)
  }

  async fn update_transaction(&self, args: UpdateTransactionArgs) -> Result<Outcome> {
    let id = parse_id("transaction", &args.transaction_id)?;
    let patch = TransactionPatch {
      amount: args.amount.map(|a| validate_amount("amount", a)).transpose()?,
      description: args
        .description
        .as_deref()
        .map(|d| require_text("description", d))
        .transpose()?,
      kind: args.kind,
      bucket: args.bucket,
      date: None,
      category: args
        .category
        .as_deref()
        .map(|c| require_text("category", c))
        .transpose()?,
      tags: None,
    };

    let tx = self
      .store
      .update_transaction(id, patch)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::NotFound(format!("transaction {id}")))?;

    Outcome::new(format!("Updated transaction: {}", tx.description), tx)
  }

  async fn delete_transaction(&self, args: TransactionIdArgs) -> Result<Outcome> {
    let id = parse_id("transaction", &args.transaction_id)?;
    if !self.store.delete_transaction(id).await.map_err(Error::store)? {
      return Err(Error::NotFound(format!("transaction {id}")));
    }
    Outcome::new("Transaction deleted.", json!({ "transactionId": id }))
  }

  async fn list_transactions(&self, args: ListTransactionsArgs) -> Result<Outcome> {
    let query = TransactionQuery {
      start:    args.start_date.as_deref().map(|d| parse_date("startDate", d)).transpose()?,
      end:      args.end_date.as_deref().map(|d| parse_end_date("endDate", d)).transpose()?,
      category: args.category.map(|c| c.trim().to_owned()).filter(|c| !c.is_empty()),
      bucket:   args.bucket,
      kind:     args.kind,
      limit:    Some(PAGE_SIZE),
    };
    let txs = self.store.list_transactions(&query).await.map_err(Error::store)?;
    let message = match txs.len() {
      0 => "No transactions found.".to_owned(),
      1 => "Found 1 transaction.".to_owned(),
      n => format!("Found {n} transactions."),
    };
    Outcome::new(message, txs)
  }

  // ── Goals ─────────────────────────────────────────────────────────────────

  async fn create_goal(&self, args: CreateGoalArgs, now: DateTime<Utc>) -> Result<Outcome> {
    let name = require_text("name", &args.name)?;
    let target_amount = validate_amount("targetAmount", args.target_amount)?;
    let deadline = args
      .deadline
      .as_deref()
      .map(|d| parse_day("deadline", d).and_then(|d| validate_deadline(d, now.date_naive())))
      .transpose()?;
    let category = args
      .category
      .as_deref()
      .map(|c| require_text("category", c))
      .transpose()?;

    let goal = self
      .store
      .create_goal(NewGoal { name, target_amount, deadline, category, ai_suggestions: None })
      .await
      .map_err(Error::store)?;

    let mut message = format!(
      "Created goal \"{}\" with a target of {}",
      goal.name,
      format_usd(goal.target_amount)
    );
    if let Some(deadline) = goal.deadline {
      message.push_str(&format!(" by {deadline}"));
    }
    Outcome::new(message, goal)
  }

  async fn update_goal(&self, args: UpdateGoalArgs) -> Result<Outcome> {
    let id = parse_id("goal", &args.goal_id)?;
    let patch = GoalPatch {
      name:          args.name.as_deref().map(|n| require_text("name", n)).transpose()?,
      target_amount: args
        .target_amount
        .map(|a| validate_amount("targetAmount", a))
        .transpose()?,
      status:        args.status,
      deadline:      None,
      add_amount:    args.add_amount.map(|a| validate_amount("addAmount", a)).transpose()?,
    };
    let added = patch.add_amount;

    let goal = self
      .store
      .update_goal(id, patch)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::NotFound(format!("goal {id}")))?;

    let message = match added {
      Some(add) => format!(
        "Added {} to \"{}\". Progress: {} of {}.",
        format_usd(add),
        goal.name,
        format_usd(goal.current_amount),
        format_usd(goal.target_amount)
      ),
      None => format!("Updated goal \"{}\".", goal.name),
    };
    Outcome::new(message, goal)
  }

  async fn delete_goal(&self, args: GoalIdArgs) -> Result<Outcome> {
    let id = parse_id("goal", &args.goal_id)?;
    if !self.store.delete_goal(id).await.map_err(Error::store)? {
      return Err(Error::NotFound(format!("goal {id}")));
    }
    Outcome::new("Goal deleted.", json!({ "goalId": id }))
  }

  async fn list_goals(&self, args: ListGoalsArgs) -> Result<Outcome> {
    let goals = self.store.list_goals(args.status).await.map_err(Error::store)?;
    let message = match goals.len() {
      0 => "You have no goals yet.".to_owned(),
      1 => "You have 1 goal.".to_owned(),
      n => format!("You have {n} goals."),
    };
    Outcome::new(message, goals)
  }

  // ── Budget settings ───────────────────────────────────────────────────────

  async fn set_category_budget(&self, args: SetCategoryBudgetArgs) -> Result<Outcome> {
    let name = require_text("category", &args.category)?;
    let budget = validate_budget("budget", args.budget)?;

    let category = self
      .store
      .set_category_budget(name.clone(), Some(budget))
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::NotFound(format!("category {name}")))?;

    Outcome::new(
      format!("Set the {} budget to {}.", category.name, format_usd(budget)),
      category,
    )
  }

  async fn set_monthly_income(&self, args: SetMonthlyIncomeArgs) -> Result<Outcome> {
    let amount = validate_amount("amount", args.amount)?;
    let config = self
      .store
      .set_config(MONTHLY_INCOME_KEY.to_owned(), amount.to_string())
      .await
      .map_err(Error::store)?;
    Outcome::new(format!("Monthly income set to {}.", format_usd(amount)), config)
  }

  // ── Reports ───────────────────────────────────────────────────────────────

  async fn budget_status(&self, args: PeriodArgs, now: DateTime<Utc>) -> Result<Outcome> {
    let period = args.period.unwrap_or_default();
    let income = self.income().await?;
    let txs = self.transactions_in(period, now, None).await?;
    let report = build_report(income, period, &txs);

    let mut message = format!(
      "You have spent {} {} against an income of {}.",
      format_usd(report.total_spent),
      period_label(period),
      format_usd(income)
    );
    for alert in &report.alerts {
      message.push(' ');
      message.push_str(&alert.message);
    }
    Outcome::new(message, report)
  }

  async fn financial_tip(&self, now: DateTime<Utc>) -> Result<Outcome> {
    let income = self.income().await?;
    let txs = self.transactions_in(Period::Month, now, None).await?;
    let tip = financial_tip(&summarize_buckets(income, &txs), now.date_naive());
    Outcome::new(tip.clone(), json!({ "tip": tip }))
  }

  async fn recent_activity(&self, args: LimitArgs) -> Result<Outcome> {
    let limit = clamp_limit(args.limit, DEFAULT_RECENT);
    let query = TransactionQuery { limit: Some(limit), ..Default::default() };
    let txs = self.store.list_transactions(&query).await.map_err(Error::store)?;

    let message = if txs.is_empty() {
      "You have no transactions yet.".to_owned()
    } else {
      let lines: Vec<String> = txs
        .iter()
        .map(|t| format!("{} {}", format_usd(t.amount), t.description))
        .collect();
      format!("Your last {}: {}.", txs.len(), lines.join("; "))
    };
    Outcome::new(message, txs)
  }

  async fn top_categories(&self, args: TopCategoriesArgs, now: DateTime<Utc>) -> Result<Outcome> {
    let period = args.period.unwrap_or_default();
    let limit = clamp_limit(args.limit, DEFAULT_TOP);
    let expenses = self
      .transactions_in(period, now, Some(TransactionType::Expense))
      .await?;
    let top = top_categories(category_breakdown(&expenses), limit);

    let message = if top.is_empty() {
      format!("No spending recorded {}.", period_label(period))
    } else {
      let parts: Vec<String> = top
        .iter()
        .map(|c| format!("{} ({})", c.category, format_usd(c.total)))
        .collect();
      format!("Top spending {}: {}.", period_label(period), parts.join(", "))
    };
    Outcome::new(message, top)
  }

  async fn income_vs_expenses(&self, args: PeriodArgs, now: DateTime<Utc>) -> Result<Outcome> {
    let period = args.period.unwrap_or_default();
    let txs = self.transactions_in(period, now, None).await?;
    let flow = cash_flow(&txs);
    let message = format!(
      "Income {} vs expenses {} {}, net {}.",
      format_usd(flow.income),
      format_usd(flow.expenses),
      period_label(period),
      format_usd(flow.net)
    );
    Outcome::new(message, flow)
  }
}
