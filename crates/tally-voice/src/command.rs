//! Typed arguments for every [`Operation`].
//!
//! The model's JSON arguments are decoded once, here, into a [`Command`].
//! Field names are camelCase on the wire. Amounts decode into [`Decimal`]
//! from either JSON numbers or numeric strings; range checks happen later in
//! the dispatcher so they can be reported as `InvalidAmount`.

use rust_decimal::Decimal;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use tally_core::{
  Error, Result,
  goal::GoalStatus,
  period::Period,
  transaction::{AiAnalysis, Bucket, TransactionType},
};

use crate::registry::Operation;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTransactionArgs {
  pub amount:      Decimal,
  #[serde(rename = "type")]
  pub kind:        TransactionType,
  pub description: String,
  pub category:    String,
  pub bucket:      Bucket,
  #[serde(default)]
  pub tags:        Vec<String>,
  pub date:        Option<String>,
  /// Filled in from the model's free-text commentary, never from arguments.
  #[serde(skip)]
  pub ai_analysis: Option<AiAnalysis>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransactionArgs {
  pub transaction_id: String,
  pub amount:         Option<Decimal>,
  #[serde(rename = "type")]
  pub kind:           Option<TransactionType>,
  pub description:    Option<String>,
  pub category:       Option<String>,
  pub bucket:         Option<Bucket>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionIdArgs {
  pub transaction_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTransactionsArgs {
  pub start_date: Option<String>,
  pub end_date:   Option<String>,
  pub category:   Option<String>,
  pub bucket:     Option<Bucket>,
  #[serde(rename = "type")]
  pub kind:       Option<TransactionType>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGoalArgs {
  pub name:          String,
  pub target_amount: Decimal,
  pub deadline:      Option<String>,
  pub category:      Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGoalArgs {
  pub goal_id:       String,
  pub name:          Option<String>,
  pub target_amount: Option<Decimal>,
  pub status:        Option<GoalStatus>,
  pub add_amount:    Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalIdArgs {
  pub goal_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListGoalsArgs {
  pub status: Option<GoalStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetCategoryBudgetArgs {
  pub category: String,
  pub budget:   Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetMonthlyIncomeArgs {
  pub amount: Decimal,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PeriodArgs {
  pub period: Option<Period>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LimitArgs {
  pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopCategoriesArgs {
  pub limit:  Option<u32>,
  pub period: Option<Period>,
}

/// One decoded, not yet validated, command.
#[derive(Debug, Clone)]
pub enum Command {
  AddTransaction(AddTransactionArgs),
  UpdateTransaction(UpdateTransactionArgs),
  DeleteTransaction(TransactionIdArgs),
  ListTransactions(ListTransactionsArgs),
  CreateGoal(CreateGoalArgs),
  UpdateGoal(UpdateGoalArgs),
  DeleteGoal(GoalIdArgs),
  ListGoals(ListGoalsArgs),
  SetCategoryBudget(SetCategoryBudgetArgs),
  SetMonthlyIncome(SetMonthlyIncomeArgs),
  GetBudgetStatus(PeriodArgs),
  GetFinancialTip,
  ShowRecentActivity(LimitArgs),
  ShowTopSpendingCategories(TopCategoriesArgs),
  ShowIncomeVsExpenses(PeriodArgs),
}

fn decode<T: DeserializeOwned>(op: Operation, args: Value) -> Result<T> {
  serde_json::from_value(args).map_err(|e| Error::InvalidArguments(format!("{op}: {e}")))
}

impl Command {
  /// Decode `args` for `op`. A JSON `null` is treated as an empty object.
  pub fn parse(op: Operation, args: Value) -> Result<Self> {
    let args = if args.is_null() { Value::Object(Default::default()) } else { args };
    Ok(match op {
      Operation::AddTransaction => Self::AddTransaction(decode(op, args)?),
      Operation::UpdateTransaction => Self::UpdateTransaction(decode(op, args)?),
      Operation::DeleteTransaction => Self::DeleteTransaction(decode(op, args)?),
      Operation::ListTransactions => Self::ListTransactions(decode(op, args)?),
      Operation::CreateGoal => Self::CreateGoal(decode(op, args)?),
      Operation::UpdateGoal => Self::UpdateGoal(decode(op, args)?),
      Operation::DeleteGoal => Self::DeleteGoal(decode(op, args)?),
      Operation::ListGoals => Self::ListGoals(decode(op, args)?),
      Operation::SetCategoryBudget => Self::SetCategoryBudget(decode(op, args)?),
      Operation::SetMonthlyIncome => Self::SetMonthlyIncome(decode(op, args)?),
      Operation::GetBudgetStatus => Self::GetBudgetStatus(decode(op, args)?),
      Operation::GetFinancialTip => Self::GetFinancialTip,
      Operation::ShowRecentActivity => Self::ShowRecentActivity(decode(op, args)?),
      Operation::ShowTopSpendingCategories => {
        Self::ShowTopSpendingCategories(decode(op, args)?)
      }
      Operation::ShowIncomeVsExpenses => Self::ShowIncomeVsExpenses(decode(op, args)?),
    })
  }

  pub fn operation(&self) -> Operation {
    match self {
      Self::AddTransaction(_) => Operation::AddTransaction,
      Self::UpdateTransaction(_) => Operation::UpdateTransaction,
      Self::DeleteTransaction(_) => Operation::DeleteTransaction,
      Self::ListTransactions(_) => Operation::ListTransactions,
      Self::CreateGoal(_) => Operation::CreateGoal,
      Self::UpdateGoal(_) => Operation::UpdateGoal,
      Self::DeleteGoal(_) => Operation::DeleteGoal,
      Self::ListGoals(_) => Operation::ListGoals,
      Self::SetCategoryBudget(_) => Operation::SetCategoryBudget,
      Self::SetMonthlyIncome(_) => Operation::SetMonthlyIncome,
      Self::GetBudgetStatus(_) => Operation::GetBudgetStatus,
      Self::GetFinancialTip => Operation::GetFinancialTip,
      Self::ShowRecentActivity(_) => Operation::ShowRecentActivity,
      Self::ShowTopSpendingCategories(_) => Operation::ShowTopSpendingCategories,
      Self::ShowIncomeVsExpenses(_) => Operation::ShowIncomeVsExpenses,
    }
  }

  /// Attach model commentary to commands that store it.
  pub fn annotate(&mut self, analysis: AiAnalysis) {
    if let Self::AddTransaction(args) = self {
      args.ai_analysis = Some(analysis);
    }
  }
}
