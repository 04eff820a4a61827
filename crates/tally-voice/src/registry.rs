//! The fixed catalog of operations the language model may select.
//!
//! Each [`Operation`] has exactly one schema here and exactly one handler in
//! [`crate::dispatch`]; both are exhaustive matches, so adding a variant fails
//! to compile until both sides exist.

use serde::Serialize;
use serde_json::{Map, Value, json};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};
use tally_core::{
  Error, Result,
  goal::GoalStatus,
  period::Period,
  transaction::{Bucket, TransactionType},
};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  AsRefStr,
  Display,
  EnumIter,
  EnumString,
  IntoStaticStr,
)]
#[strum(serialize_all = "camelCase")]
pub enum Operation {
  AddTransaction,
  UpdateTransaction,
  DeleteTransaction,
  ListTransactions,
  CreateGoal,
  UpdateGoal,
  DeleteGoal,
  ListGoals,
  SetCategoryBudget,
  SetMonthlyIncome,
  GetBudgetStatus,
  GetFinancialTip,
  ShowRecentActivity,
  ShowTopSpendingCategories,
  ShowIncomeVsExpenses,
}

/// `{name, description, parameters}` as handed to the completion endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct OperationSpec {
  pub name:        &'static str,
  pub description: &'static str,
  pub parameters:  Value,
}

// ─── Schema helpers ──────────────────────────────────────────────────────────

fn string(description: &str) -> Value { json!({ "type": "string", "description": description }) }

fn number(description: &str) -> Value { json!({ "type": "number", "description": description }) }

fn integer(description: &str) -> Value {
  json!({ "type": "integer", "minimum": 1, "description": description })
}

fn date(description: &str) -> Value {
  json!({ "type": "string", "format": "date", "description": description })
}

fn one_of<T: IntoEnumIterator + AsRef<str>>(description: &str) -> Value {
  let values: Vec<String> = T::iter().map(|v| v.as_ref().to_owned()).collect();
  json!({ "type": "string", "enum": values, "description": description })
}

fn object(properties: &[(&str, Value)], required: &[&str]) -> Value {
  let properties: Map<String, Value> = properties
    .iter()
    .map(|(name, schema)| ((*name).to_owned(), schema.clone()))
    .collect();
  json!({ "type": "object", "properties": properties, "required": required })
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

impl Operation {
  /// Look up an operation by the name the model used.
  pub fn from_name(name: &str) -> Result<Self> {
    name
      .trim()
      .parse()
      .map_err(|_| Error::UnknownOperation(name.to_owned()))
  }

  /// Whether the operation writes to the store.
  pub fn is_mutation(self) -> bool {
    match self {
      Self::AddTransaction
      | Self::UpdateTransaction
      | Self::DeleteTransaction
      | Self::CreateGoal
      | Self::UpdateGoal
      | Self::DeleteGoal
      | Self::SetCategoryBudget
      | Self::SetMonthlyIncome => true,
      Self::ListTransactions
      | Self::ListGoals
      | Self::GetBudgetStatus
      | Self::GetFinancialTip
      | Self::ShowRecentActivity
      | Self::ShowTopSpendingCategories
      | Self::ShowIncomeVsExpenses => false,
    }
  }

  pub fn spec(self) -> OperationSpec {
    let (description, parameters) = match self {
      Self::AddTransaction => (
        "Record a new income or expense transaction",
        object(
          &[
            ("amount", number("Amount of money, always positive")),
            ("type", one_of::<TransactionType>("Whether money came in or went out")),
            ("description", string("What the transaction was for")),
            ("category", string("Category name, e.g. groceries, rent, salary")),
            ("bucket", one_of::<Bucket>("50/30/20 bucket: needs, wants or savings")),
            (
              "tags",
              json!({ "type": "array", "items": { "type": "string" }, "description": "Free-form tags" }),
            ),
            ("date", date("When it happened (YYYY-MM-DD); defaults to now")),
          ],
          &["amount", "type", "description", "category", "bucket"],
        ),
      ),
      Self::UpdateTransaction => (
        "Change fields of an existing transaction",
        object(
          &[
            ("transactionId", string("Id of the transaction to change")),
            ("amount", number("New amount")),
            ("type", one_of::<TransactionType>("New type")),
            ("description", string("New description")),
            ("category", string("New category name")),
            ("bucket", one_of::<Bucket>("New bucket")),
          ],
          &["transactionId"],
        ),
      ),
      Self::DeleteTransaction => (
        "Delete a transaction",
        object(&[("transactionId", string("Id of the transaction to delete"))], &[
          "transactionId",
        ]),
      ),
      Self::ListTransactions => (
        "List recent transactions, optionally filtered",
        object(
          &[
            ("startDate", date("Earliest date to include")),
            ("endDate", date("Latest date to include")),
            ("category", string("Only this category")),
            ("bucket", one_of::<Bucket>("Only this bucket")),
            ("type", one_of::<TransactionType>("Only income or only expenses")),
          ],
          &[],
        ),
      ),
      Self::CreateGoal => (
        "Create a savings goal",
        object(
          &[
            ("name", string("Name of the goal")),
            ("targetAmount", number("Amount to save")),
            ("deadline", date("Target date (YYYY-MM-DD)")),
            ("category", string("Category the goal belongs to")),
          ],
          &["name", "targetAmount"],
        ),
      ),
      Self::UpdateGoal => (
        "Update a goal or add money to it",
        object(
          &[
            ("goalId", string("Id of the goal")),
            ("name", string("New name")),
            ("targetAmount", number("New target amount")),
            ("status", one_of::<GoalStatus>("New status")),
            ("addAmount", number("Amount to add to the saved total")),
          ],
          &["goalId"],
        ),
      ),
      Self::DeleteGoal => (
        "Delete a goal",
        object(&[("goalId", string("Id of the goal to delete"))], &["goalId"]),
      ),
      Self::ListGoals => (
        "List savings goals",
        object(&[("status", one_of::<GoalStatus>("Only goals with this status"))], &[]),
      ),
      Self::SetCategoryBudget => (
        "Set the monthly budget of an existing category",
        object(
          &[
            ("category", string("Category name")),
            ("budget", number("Monthly budget, zero or more")),
          ],
          &["category", "budget"],
        ),
      ),
      Self::SetMonthlyIncome => (
        "Set the monthly income used for the 50/30/20 budget",
        object(&[("amount", number("Monthly income after tax"))], &["amount"]),
      ),
      Self::GetBudgetStatus => (
        "Show spending against the 50/30/20 budget",
        object(&[("period", one_of::<Period>("Week or month; defaults to month"))], &[]),
      ),
      Self::GetFinancialTip => ("Give a personalised money-saving tip", object(&[], &[])),
      Self::ShowRecentActivity => (
        "Show the most recent transactions",
        object(&[("limit", integer("How many to show; defaults to 5"))], &[]),
      ),
      Self::ShowTopSpendingCategories => (
        "Show the categories with the most spending",
        object(
          &[
            ("limit", integer("How many categories; defaults to 3")),
            ("period", one_of::<Period>("Week or month; defaults to month")),
          ],
          &[],
        ),
      ),
      Self::ShowIncomeVsExpenses => (
        "Compare income with expenses",
        object(&[("period", one_of::<Period>("Week or month; defaults to month"))], &[]),
      ),
    };

    OperationSpec {
      name: self.into(),
      description,
      parameters,
    }
  }
}

/// Every operation, in declaration order.
pub fn catalog() -> Vec<OperationSpec> { Operation::iter().map(Operation::spec).collect() }

/// The catalog in the `tools` shape of the chat-completions API.
pub fn tools() -> Value {
  Value::Array(
    catalog()
      .into_iter()
      .map(|spec| json!({ "type": "function", "function": spec }))
      .collect(),
  )
}

#[cfg(test)]
mod tests {
  use std::collections::HashSet;

  use super::*;

  #[test]
  fn every_operation_has_one_uniquely_named_entry() {
    let catalog = catalog();
    assert_eq!(catalog.len(), Operation::iter().count());

    let names: HashSet<&str> = catalog.iter().map(|s| s.name).collect();
    assert_eq!(names.len(), catalog.len());

    for op in Operation::iter() {
      assert_eq!(op.spec().name, op.as_ref());
      assert_eq!(Operation::from_name(op.as_ref()).unwrap(), op);
    }
  }

  #[test]
  fn unknown_names_are_rejected() {
    assert!(matches!(
      Operation::from_name("transferFunds"),
      Err(Error::UnknownOperation(name)) if name == "transferFunds"
    ));
  }

  #[test]
  fn required_parameters_are_declared_properties() {
    for spec in catalog() {
      let props = spec.parameters["properties"].as_object().unwrap();
      for req in spec.parameters["required"].as_array().unwrap() {
        assert!(props.contains_key(req.as_str().unwrap()), "{}: {req}", spec.name);
      }
    }
  }

  #[test]
  fn add_transaction_schema_lists_enum_values() {
    let spec = Operation::AddTransaction.spec();
    assert_eq!(
      spec.parameters["properties"]["bucket"]["enum"],
      json!(["NEED", "WANT", "SAVING"])
    );
    assert_eq!(
      spec.parameters["required"],
      json!(["amount", "type", "description", "category", "bucket"])
    );
  }

  #[test]
  fn tools_wrap_each_spec_as_a_function() {
    let tools = tools();
    let tools = tools.as_array().unwrap();
    assert_eq!(tools.len(), 15);
    assert_eq!(tools[0]["type"], "function");
    assert_eq!(tools[0]["function"]["name"], "addTransaction");
  }
}
