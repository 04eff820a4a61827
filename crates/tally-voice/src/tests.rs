//! Pipeline tests against an in-memory store and a local stand-in for the
//! completion endpoint.

use std::sync::{
  Arc,
  atomic::{AtomicUsize, Ordering},
};

use axum::{Json, Router, http::StatusCode, routing::post};
use bytes::Bytes;
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use strum::IntoEnumIterator;
use tally_core::{
  Error,
  goal::NewGoal,
  store::FinanceStore,
  transaction::{Bucket, NewTransaction, TransactionQuery, TransactionType},
  voice::{PROCESSING_INTENT, UNKNOWN_INTENT},
};
use tally_store_sqlite::SqliteStore;

use crate::{
  Dispatcher, LlmClient, LlmConfig, Transcriber, TranscriptionConfig, VoiceService,
  command::Command, registry::Operation,
};

struct MockLlm {
  url:  String,
  hits: Arc<AtomicUsize>,
}

impl MockLlm {
  fn hits(&self) -> usize { self.hits.load(Ordering::SeqCst) }
}

/// Serve `body` with `status` for every POST and count the requests.
async fn mock_llm(status: StatusCode, body: Value) -> MockLlm {
  let hits = Arc::new(AtomicUsize::new(0));
  let counter = Arc::clone(&hits);
  let app = Router::new().route(
    "/chat/completions",
    post(move || {
      let counter = Arc::clone(&counter);
      let body = body.clone();
      async move {
        counter.fetch_add(1, Ordering::SeqCst);
        (status, Json(body))
      }
    }),
  );

  let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

  MockLlm { url: format!("http://{addr}/chat/completions"), hits }
}

fn tool_call(name: &str, arguments: Value) -> Value {
  json!({
    "choices": [{
      "message": {
        "content": null,
        "tool_calls": [{
          "id": "call_0",
          "type": "function",
          "function": { "name": name, "arguments": arguments.to_string() }
        }]
      }
    }]
  })
}

async fn service(llm_url: Option<String>) -> (Arc<SqliteStore>, VoiceService<SqliteStore>) {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let llm = LlmClient::new(LlmConfig {
    url: llm_url,
    api_key: Some("test-key".into()),
    ..LlmConfig::default()
  })
  .unwrap();
  let transcriber = Transcriber::new(TranscriptionConfig::default()).unwrap();
  let svc = VoiceService::new(Arc::clone(&store), llm, transcriber, Decimal::from(3000));
  (store, svc)
}

async fn count_transactions(store: &SqliteStore) -> usize {
  store
    .list_transactions(&TransactionQuery::default())
    .await
    .unwrap()
    .len()
}

// ─── Input guards ────────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_text_makes_no_remote_call_and_no_audit_row() {
  let mock = mock_llm(StatusCode::OK, tool_call("listGoals", json!({}))).await;
  let (store, svc) = service(Some(mock.url.clone())).await;

  let err = svc.handle_text("   \n").await.unwrap_err();
  assert!(matches!(err, Error::EmptyInput));
  assert_eq!(mock.hits(), 0);
  assert!(store.list_voice_commands(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn empty_audio_is_rejected_before_transcription() {
  let (store, svc) = service(None).await;

  let err = svc
    .handle_audio(Bytes::new(), "note.webm", Some("audio/webm"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::EmptyAudio));
  assert!(store.list_voice_commands(10).await.unwrap().is_empty());
}

// ─── Audit lifecycle ─────────────────────────────────────────────────────────

#[tokio::test]
async fn successful_command_is_audited_and_recorded() {
  let body = json!({
    "choices": [{
      "message": {
        "content": "Groceries are a need.",
        "tool_calls": [{
          "function": {
            "name": "addTransaction",
            "arguments": json!({
              "amount": 20,
              "type": "expense",
              "description": "weekly shop",
              "category": "Groceries",
              "bucket": "need"
            }).to_string()
          }
        }]
      }
    }]
  });
  let mock = mock_llm(StatusCode::OK, body).await;
  let (store, svc) = service(Some(mock.url.clone())).await;

  let reply = svc.handle_text("I spent 20 dollars on groceries").await.unwrap();
  assert_eq!(mock.hits(), 1);
  assert_eq!(reply.intent, "addTransaction");
  assert!(reply.message.contains("Groceries"), "{}", reply.message);
  assert!(reply.message.contains("need"), "{}", reply.message);

  let txs = store.list_transactions(&TransactionQuery::default()).await.unwrap();
  assert_eq!(txs.len(), 1);
  assert_eq!(txs[0].amount, Decimal::from(20));
  let analysis = txs[0].ai_analysis.as_ref().unwrap();
  assert_eq!(analysis.sentiment, "Groceries are a need.");
  assert_eq!(analysis.confidence, 1.0);

  let history = svc.history().await.unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].command_id, reply.command_id);
  assert_eq!(history[0].raw_text, "I spent 20 dollars on groceries");
  assert_eq!(history[0].intent, "addTransaction");
  assert!(history[0].success);
  assert_eq!(history[0].parameters["category"], "Groceries");
}

#[tokio::test]
async fn negative_amount_is_rejected_without_writes() {
  let mock = mock_llm(
    StatusCode::OK,
    tool_call(
      "addTransaction",
      json!({
        "amount": -5,
        "type": "expense",
        "description": "refund?",
        "category": "Dining",
        "bucket": "want"
      }),
    ),
  )
  .await;
  let (store, svc) = service(Some(mock.url.clone())).await;

  let err = svc.handle_text("spent minus five on dinner").await.unwrap_err();
  assert!(matches!(err, Error::InvalidAmount(_)));
  assert_eq!(count_transactions(&store).await, 0);
  assert!(store.list_categories().await.unwrap().is_empty());

  let history = svc.history().await.unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].intent, "addTransaction");
  assert!(!history[0].success);
}

#[tokio::test]
async fn deleting_a_missing_goal_is_not_found() {
  let mock = mock_llm(
    StatusCode::OK,
    tool_call("deleteGoal", json!({ "goalId": uuid::Uuid::new_v4().to_string() })),
  )
  .await;
  let (_store, svc) = service(Some(mock.url.clone())).await;

  let err = svc.handle_text("delete my boat goal").await.unwrap_err();
  assert!(matches!(err, Error::NotFound(_)));

  let history = svc.history().await.unwrap();
  assert_eq!(history[0].intent, "deleteGoal");
  assert!(!history[0].success);
}

#[tokio::test]
async fn unknown_operation_is_rejected_and_audited() {
  let mock = mock_llm(StatusCode::OK, tool_call("transferFunds", json!({ "amount": 10 }))).await;
  let (_store, svc) = service(Some(mock.url.clone())).await;

  let err = svc.handle_text("move 10 to savings").await.unwrap_err();
  assert!(matches!(err, Error::UnknownOperation(name) if name == "transferFunds"));

  let history = svc.history().await.unwrap();
  assert_eq!(history[0].intent, "transferFunds");
  assert!(!history[0].success);
}

#[tokio::test]
async fn prose_reply_gets_help_message() {
  let mock = mock_llm(
    StatusCode::OK,
    json!({ "choices": [{ "message": { "content": "Hi! How can I help?" } }] }),
  )
  .await;
  let (_store, svc) = service(Some(mock.url.clone())).await;

  let reply = svc.handle_text("hello").await.unwrap();
  assert_eq!(reply.intent, UNKNOWN_INTENT);
  assert!(reply.result.is_null());
  assert!(!reply.message.is_empty());

  let history = svc.history().await.unwrap();
  assert_eq!(history[0].intent, UNKNOWN_INTENT);
  assert!(!history[0].success);
}

#[tokio::test]
async fn remote_failure_leaves_processing_intent() {
  let mock = mock_llm(StatusCode::SERVICE_UNAVAILABLE, json!({ "error": "overloaded" })).await;
  let (store, svc) = service(Some(mock.url.clone())).await;

  let err = svc.handle_text("how am I doing").await.unwrap_err();
  assert!(matches!(err, Error::RemoteUnavailable(_)));
  assert_eq!(mock.hits(), 1);

  let history = store.list_voice_commands(10).await.unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].intent, PROCESSING_INTENT);
  assert!(!history[0].success);
}

#[tokio::test]
async fn missing_llm_configuration_fails_the_command() {
  let (store, svc) = service(None).await;

  let err = svc.handle_text("list my goals").await.unwrap_err();
  assert!(matches!(err, Error::MissingConfiguration("llm.url")));
  assert!(!store.list_voice_commands(1).await.unwrap()[0].success);
}

// ─── Dispatcher ──────────────────────────────────────────────────────────────

async fn dispatcher() -> (Arc<SqliteStore>, Dispatcher<SqliteStore>) {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let dispatcher = Dispatcher::new(Arc::clone(&store), Decimal::from(3000));
  (store, dispatcher)
}

async fn run(dispatcher: &Dispatcher<SqliteStore>, op: Operation, args: Value) -> crate::Outcome {
  let command = Command::parse(op, args).unwrap();
  dispatcher.dispatch(command, Utc::now()).await.unwrap()
}

fn expense(amount: i64, bucket: Bucket, category: &str) -> Value {
  json!({
    "amount": amount,
    "type": "EXPENSE",
    "description": format!("{category} purchase"),
    "category": category,
    "bucket": bucket,
  })
}

#[tokio::test]
async fn every_operation_dispatches() {
  let (store, d) = dispatcher().await;

  let tx = store
    .add_transaction(NewTransaction {
      amount:      Decimal::from(12),
      description: "Lunch".into(),
      kind:        TransactionType::Expense,
      bucket:      Bucket::Want,
      date:        None,
      category:    "Dining".into(),
      tags:        vec![],
      ai_analysis: None,
    })
    .await
    .unwrap();
  let goal = store
    .create_goal(NewGoal {
      name:           "Bike".into(),
      target_amount:  Decimal::from(500),
      deadline:       None,
      category:       None,
      ai_suggestions: None,
    })
    .await
    .unwrap();
  let tx_id = tx.transaction_id.to_string();
  let goal_id = goal.goal_id.to_string();

  for op in Operation::iter() {
    let args = match op {
      Operation::AddTransaction => expense(30, Bucket::Need, "Groceries"),
      Operation::UpdateTransaction => json!({ "transactionId": tx_id, "amount": 15 }),
      Operation::DeleteTransaction => json!({ "transactionId": tx_id }),
      Operation::ListTransactions => json!({ "category": "groceries" }),
      Operation::CreateGoal => json!({ "name": "Trip", "targetAmount": 2000 }),
      Operation::UpdateGoal => json!({ "goalId": goal_id, "addAmount": 50 }),
      Operation::DeleteGoal => json!({ "goalId": goal_id }),
      Operation::ListGoals => json!({}),
      Operation::SetCategoryBudget => json!({ "category": "Groceries", "budget": 400 }),
      Operation::SetMonthlyIncome => json!({ "amount": 4200 }),
      Operation::GetBudgetStatus => json!({ "period": "week" }),
      Operation::GetFinancialTip => Value::Null,
      Operation::ShowRecentActivity => json!({ "limit": 2 }),
      Operation::ShowTopSpendingCategories => json!({ "limit": 1 }),
      Operation::ShowIncomeVsExpenses => json!({ "period": "month" }),
    };
    let command = Command::parse(op, args).unwrap();
    let outcome = d.dispatch(command, Utc::now()).await;
    assert!(outcome.is_ok(), "{op}: {:?}", outcome.err());
  }

  assert!(store.get_transaction(tx.transaction_id).await.unwrap().is_none());
  assert!(store.get_goal(goal.goal_id).await.unwrap().is_none());
}

#[tokio::test]
async fn budget_status_reflects_spending_against_income() {
  let (_store, d) = dispatcher().await;

  run(&d, Operation::SetMonthlyIncome, json!({ "amount": 3000 })).await;
  run(&d, Operation::AddTransaction, expense(150, Bucket::Need, "Rent")).await;

  let status = run(&d, Operation::GetBudgetStatus, json!({})).await;
  assert!(status.message.contains("$150.00"), "{}", status.message);
  assert!(status.result["alerts"].as_array().unwrap().is_empty());

  run(&d, Operation::AddTransaction, expense(950, Bucket::Want, "Gadgets")).await;
  let status = run(&d, Operation::GetBudgetStatus, json!({ "period": "month" })).await;
  assert!(
    status.message.contains("over budget by $50.00"),
    "{}",
    status.message
  );
}

#[tokio::test]
async fn goal_contribution_reports_progress() {
  let (_store, d) = dispatcher().await;

  let created = run(&d, Operation::CreateGoal, json!({ "name": "Laptop", "targetAmount": 1200 })).await;
  let goal_id = created.result["goalId"].as_str().unwrap().to_owned();

  let updated = run(&d, Operation::UpdateGoal, json!({ "goalId": goal_id, "addAmount": "100" })).await;
  assert!(updated.message.contains("$100.00 of $1200.00"), "{}", updated.message);
}

#[tokio::test]
async fn dispatcher_rejects_bad_arguments_before_writing() {
  let (store, d) = dispatcher().await;

  let past = Command::parse(
    Operation::CreateGoal,
    json!({ "name": "Old", "targetAmount": 10, "deadline": "2000-01-01" }),
  )
  .unwrap();
  assert!(matches!(
    d.dispatch(past, Utc::now()).await,
    Err(Error::InvalidArguments(_))
  ));
  assert!(store.list_goals(None).await.unwrap().is_empty());

  let missing = Command::parse(
    Operation::SetCategoryBudget,
    json!({ "category": "Nowhere", "budget": 10 }),
  )
  .unwrap();
  assert!(matches!(d.dispatch(missing, Utc::now()).await, Err(Error::NotFound(_))));

  let bad_id = Command::parse(Operation::UpdateTransaction, json!({ "transactionId": "abc" })).unwrap();
  assert!(matches!(d.dispatch(bad_id, Utc::now()).await, Err(Error::NotFound(_))));

  let negative_budget = Command::parse(
    Operation::SetCategoryBudget,
    json!({ "category": "Nowhere", "budget": -1 }),
  )
  .unwrap();
  assert!(matches!(
    d.dispatch(negative_budget, Utc::now()).await,
    Err(Error::InvalidAmount(_))
  ));
}

#[tokio::test]
async fn top_categories_only_counts_expenses() {
  let (_store, d) = dispatcher().await;

  run(&d, Operation::AddTransaction, expense(40, Bucket::Want, "Dining")).await;
  run(&d, Operation::AddTransaction, expense(90, Bucket::Need, "Utilities")).await;
  run(
    &d,
    Operation::AddTransaction,
    json!({
      "amount": 5000,
      "type": "income",
      "description": "Salary",
      "category": "Salary",
      "bucket": "SAVING"
    }),
  )
  .await;

  let top = run(&d, Operation::ShowTopSpendingCategories, json!({})).await;
  let names: Vec<&str> = top
    .result
    .as_array()
    .unwrap()
    .iter()
    .map(|c| c["category"].as_str().unwrap())
    .collect();
  assert_eq!(names, vec!["Utilities", "Dining"]);
}
