//! [`SqliteStore`], the SQLite implementation of [`FinanceStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use rust_decimal::Decimal;
use uuid::Uuid;

use tally_core::{
  category::{Category, NewCategory},
  goal::{Goal, GoalPatch, GoalStatus, NewGoal},
  recurring::{NewRecurringExpense, RecurringExpense},
  settings::UserConfig,
  store::FinanceStore,
  transaction::{NewTransaction, Transaction, TransactionPatch, TransactionQuery},
  voice::{PROCESSING_INTENT, VoiceCommand, VoiceCommandUpdate},
};

use crate::{
  Result,
  encode::{
    CATEGORY_COLUMNS, GOAL_SELECT, RECURRING_SELECT, RawCategory, RawConfig, RawGoal,
    RawRecurring, RawTransaction, RawVoiceCommand, TRANSACTION_SELECT, VOICE_COLUMNS,
    decode_decimal, encode_analysis, encode_day, encode_decimal, encode_dt, encode_tags,
    encode_uuid,
  },
  error::Error,
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Tally finance store backed by a single SQLite file.
///
/// The inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Statement helpers ───────────────────────────────────────────────────────
//
// These run inside a `call` closure so several of them can share one SQLite
// transaction.

/// Insert the category if no category with this name exists (ignoring case),
/// then return the stored row.
fn upsert_category_in(
  conn: &rusqlite::Connection,
  name: &str,
  budget: Option<&str>,
  kind: &str,
) -> rusqlite::Result<RawCategory> {
  conn.execute(
    "INSERT OR IGNORE INTO categories (category_id, name, budget, kind, created_at)
     VALUES (?1, ?2, ?3, ?4, ?5)",
    rusqlite::params![
      encode_uuid(Uuid::new_v4()),
      name,
      budget,
      kind,
      encode_dt(Utc::now())
    ],
  )?;
  conn.query_row(
    &format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE name = ?1"),
    [name],
    RawCategory::from_row,
  )
}

fn transaction_in(
  conn: &rusqlite::Connection,
  id: &str,
) -> rusqlite::Result<Option<RawTransaction>> {
  conn
    .query_row(
      &format!("{TRANSACTION_SELECT} WHERE t.transaction_id = ?1"),
      [id],
      RawTransaction::from_row,
    )
    .optional()
}

fn goal_in(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<Option<RawGoal>> {
  conn
    .query_row(&format!("{GOAL_SELECT} WHERE g.goal_id = ?1"), [id], RawGoal::from_row)
    .optional()
}

fn other<E: std::error::Error + Send + Sync + 'static>(e: E) -> tokio_rusqlite::Error {
  tokio_rusqlite::Error::Other(Box::new(e))
}

// ─── FinanceStore impl ───────────────────────────────────────────────────────

impl FinanceStore for SqliteStore {
  type Error = Error;

  // ── Categories ────────────────────────────────────────────────────────────

  async fn list_categories(&self) -> Result<Vec<Category>> {
    let raws: Vec<RawCategory> = self
      .conn
      .call(|conn| {
        let mut stmt = conn
          .prepare(&format!("SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY name"))?;
        let rows = stmt
          .query_map([], RawCategory::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCategory::into_category).collect()
  }

  async fn get_category(&self, name: String) -> Result<Option<Category>> {
    let raw: Option<RawCategory> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE name = ?1"),
              [name.trim()],
              RawCategory::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCategory::into_category).transpose()
  }

  async fn upsert_category(&self, input: NewCategory) -> Result<Category> {
    let name = input.name.trim().to_owned();
    let budget = input.budget.map(encode_decimal);
    let kind = input.kind.as_ref().to_owned();

    let raw = self
      .conn
      .call(move |conn| Ok(upsert_category_in(conn, &name, budget.as_deref(), &kind)?))
      .await?;

    raw.into_category()
  }

  async fn set_category_budget(
    &self,
    name: String,
    budget: Option<Decimal>,
  ) -> Result<Option<Category>> {
    let budget = budget.map(encode_decimal);

    let raw: Option<RawCategory> = self
      .conn
      .call(move |conn| {
        let name = name.trim();
        let changed = conn.execute(
          "UPDATE categories SET budget = ?2 WHERE name = ?1",
          rusqlite::params![name, budget],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(Some(conn.query_row(
          &format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE name = ?1"),
          [name],
          RawCategory::from_row,
        )?))
      })
      .await?;

    raw.map(RawCategory::into_category).transpose()
  }

  // ── Transactions ──────────────────────────────────────────────────────────

  async fn add_transaction(&self, input: NewTransaction) -> Result<Transaction> {
    let now = Utc::now();
    let id_str = encode_uuid(Uuid::new_v4());
    let amount_str = encode_decimal(input.amount);
    let kind_str = input.kind.as_ref().to_owned();
    let bucket_str = input.bucket.as_ref().to_owned();
    let date_str = encode_dt(input.date.unwrap_or(now));
    let created_str = encode_dt(now);
    let tags_str = encode_tags(&input.tags)?;
    let analysis_str = encode_analysis(input.ai_analysis.as_ref())?;
    let category = input.category.trim().to_owned();
    let description = input.description;

    let raw: RawTransaction = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let cat = upsert_category_in(&tx, &category, None, "EXPENSE")?;
        tx.execute(
          "INSERT INTO transactions (
             transaction_id, amount, description, kind, bucket, date,
             category_id, tags, ai_analysis, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            id_str,
            amount_str,
            description,
            kind_str,
            bucket_str,
            date_str,
            cat.category_id,
            tags_str,
            analysis_str,
            created_str,
          ],
        )?;
        let raw = transaction_in(&tx, &id_str)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.into_transaction()
  }

  async fn get_transaction(&self, id: Uuid) -> Result<Option<Transaction>> {
    let id_str = encode_uuid(id);

    let raw = self
      .conn
      .call(move |conn| Ok(transaction_in(conn, &id_str)?))
      .await?;

    raw.map(RawTransaction::into_transaction).transpose()
  }

  async fn list_transactions<'a>(&'a self, query: &'a TransactionQuery) -> Result<Vec<Transaction>> {
    let start_str = query.start.map(encode_dt);
    let end_str = query.end.map(encode_dt);
    let category = query.category.as_deref().map(|c| c.trim().to_owned());
    let bucket_str = query.bucket.map(|b| b.as_ref().to_owned());
    let kind_str = query.kind.map(|k| k.as_ref().to_owned());
    // SQLite treats a negative LIMIT as "no limit".
    let limit_val = query.limit.map_or(-1, |l| l as i64);

    let raws: Vec<RawTransaction> = self
      .conn
      .call(move |conn| {
        // Build WHERE clause dynamically. Every parameter is always bound, so
        // the placeholder numbers are fixed.
        let mut conds: Vec<&'static str> = vec![];
        if start_str.is_some() {
          conds.push("t.date >= ?1");
        }
        if end_str.is_some() {
          conds.push("t.date <= ?2");
        }
        if category.is_some() {
          conds.push("c.name = ?3");
        }
        if bucket_str.is_some() {
          conds.push("t.bucket = ?4");
        }
        if kind_str.is_some() {
          conds.push("t.kind = ?5");
        }

        let where_clause = if conds.is_empty() {
          String::new()
        } else {
          format!("WHERE {}", conds.join(" AND "))
        };

        let sql = format!(
          "{TRANSACTION_SELECT}
           {where_clause}
           ORDER BY t.date DESC, t.created_at DESC
           LIMIT ?6"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              start_str.as_deref(),
              end_str.as_deref(),
              category.as_deref(),
              bucket_str.as_deref(),
              kind_str.as_deref(),
              limit_val,
            ],
            RawTransaction::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTransaction::into_transaction).collect()
  }

  async fn update_transaction(
    &self,
    id: Uuid,
    patch: TransactionPatch,
  ) -> Result<Option<Transaction>> {
    let id_str = encode_uuid(id);
    let amount_str = patch.amount.map(encode_decimal);
    let description = patch.description;
    let kind_str = patch.kind.map(|k| k.as_ref().to_owned());
    let bucket_str = patch.bucket.map(|b| b.as_ref().to_owned());
    let date_str = patch.date.map(encode_dt);
    let category = patch.category.map(|c| c.trim().to_owned());
    let tags_str = patch.tags.as_deref().map(encode_tags).transpose()?;

    let raw: Option<RawTransaction> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if transaction_in(&tx, &id_str)?.is_none() {
          return Ok(None);
        }
        let category_id = category
          .as_deref()
          .map(|name| upsert_category_in(&tx, name, None, "EXPENSE"))
          .transpose()?
          .map(|c| c.category_id);

        tx.execute(
          "UPDATE transactions SET
             amount      = COALESCE(?2, amount),
             description = COALESCE(?3, description),
             kind        = COALESCE(?4, kind),
             bucket      = COALESCE(?5, bucket),
             date        = COALESCE(?6, date),
             category_id = COALESCE(?7, category_id),
             tags        = COALESCE(?8, tags)
           WHERE transaction_id = ?1",
          rusqlite::params![
            id_str,
            amount_str,
            description,
            kind_str,
            bucket_str,
            date_str,
            category_id,
            tags_str,
          ],
        )?;
        let raw = transaction_in(&tx, &id_str)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawTransaction::into_transaction).transpose()
  }

  async fn delete_transaction(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM transactions WHERE transaction_id = ?1", [id_str])?)
      })
      .await?;

    Ok(changed > 0)
  }

  // ── Goals ─────────────────────────────────────────────────────────────────

  async fn create_goal(&self, input: NewGoal) -> Result<Goal> {
    let id_str = encode_uuid(Uuid::new_v4());
    let target_str = encode_decimal(input.target_amount);
    let deadline_str = input.deadline.map(encode_day);
    let status_str = GoalStatus::InProgress.as_ref().to_owned();
    let suggestions_str = encode_analysis(input.ai_suggestions.as_ref())?;
    let created_str = encode_dt(Utc::now());
    let category = input.category.map(|c| c.trim().to_owned());
    let name = input.name;

    let raw: RawGoal = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let category_id = category
          .as_deref()
          .map(|name| upsert_category_in(&tx, name, None, "SAVING"))
          .transpose()?
          .map(|c| c.category_id);

        tx.execute(
          "INSERT INTO goals (
             goal_id, name, target_amount, current_amount, deadline,
             status, category_id, ai_suggestions, created_at
           ) VALUES (?1, ?2, ?3, '0', ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str,
            name,
            target_str,
            deadline_str,
            status_str,
            category_id,
            suggestions_str,
            created_str,
          ],
        )?;
        let raw = goal_in(&tx, &id_str)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.into_goal()
  }

  async fn get_goal(&self, id: Uuid) -> Result<Option<Goal>> {
    let id_str = encode_uuid(id);

    let raw = self.conn.call(move |conn| Ok(goal_in(conn, &id_str)?)).await?;

    raw.map(RawGoal::into_goal).transpose()
  }

  async fn list_goals(&self, status: Option<GoalStatus>) -> Result<Vec<Goal>> {
    let status_str = status.map(|s| s.as_ref().to_owned());

    let raws: Vec<RawGoal> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "{GOAL_SELECT}
           WHERE ?1 IS NULL OR g.status = ?1
           ORDER BY g.created_at DESC"
        ))?;
        let rows = stmt
          .query_map([status_str], RawGoal::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawGoal::into_goal).collect()
  }

  async fn update_goal(&self, id: Uuid, patch: GoalPatch) -> Result<Option<Goal>> {
    let id_str = encode_uuid(id);
    let name = patch.name;
    let target_str = patch.target_amount.map(encode_decimal);
    let status_str = patch.status.map(|s| s.as_ref().to_owned());
    let deadline_str = patch.deadline.map(encode_day);
    let add_amount = patch.add_amount;

    let raw: Option<RawGoal> = self
      .conn
      .call(move |conn| {
        // IMMEDIATE takes the write lock before the read, so concurrent
        // contributions cannot both read the same `current_amount`.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current: Option<String> = tx
          .query_row(
            "SELECT current_amount FROM goals WHERE goal_id = ?1",
            [&id_str],
            |r| r.get(0),
          )
          .optional()?;
        let Some(current) = current else {
          return Ok(None);
        };

        let new_current = match add_amount {
          Some(add) => {
            let current = decode_decimal(&current).map_err(other)?;
            Some(encode_decimal(current + add))
          }
          None => None,
        };

        tx.execute(
          "UPDATE goals SET
             name           = COALESCE(?2, name),
             target_amount  = COALESCE(?3, target_amount),
             status         = COALESCE(?4, status),
             deadline       = COALESCE(?5, deadline),
             current_amount = COALESCE(?6, current_amount)
           WHERE goal_id = ?1",
          rusqlite::params![id_str, name, target_str, status_str, deadline_str, new_current],
        )?;
        let raw = goal_in(&tx, &id_str)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawGoal::into_goal).transpose()
  }

  async fn delete_goal(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let changed = self
      .conn
      .call(move |conn| Ok(conn.execute("DELETE FROM goals WHERE goal_id = ?1", [id_str])?))
      .await?;

    Ok(changed > 0)
  }

  // ── Recurring expenses ────────────────────────────────────────────────────

  async fn add_recurring_expense(&self, input: NewRecurringExpense) -> Result<RecurringExpense> {
    let id_str = encode_uuid(Uuid::new_v4());
    let amount_str = encode_decimal(input.amount);
    let frequency_str = input.frequency.as_ref().to_owned();
    let due_str = encode_day(input.next_due_date);
    let bucket_str = input.bucket.as_ref().to_owned();
    let created_str = encode_dt(Utc::now());
    let category = input.category.trim().to_owned();
    let name = input.name;
    let is_automatic = input.is_automatic;

    let raw: RawRecurring = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let cat = upsert_category_in(&tx, &category, None, "EXPENSE")?;
        tx.execute(
          "INSERT INTO recurring_expenses (
             recurring_id, name, amount, frequency, next_due_date,
             bucket, category_id, is_automatic, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str,
            name,
            amount_str,
            frequency_str,
            due_str,
            bucket_str,
            cat.category_id,
            is_automatic,
            created_str,
          ],
        )?;
        let raw = tx.query_row(
          &format!("{RECURRING_SELECT} WHERE r.recurring_id = ?1"),
          [&id_str],
          RawRecurring::from_row,
        )?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.into_recurring()
  }

  async fn list_recurring_expenses(&self) -> Result<Vec<RecurringExpense>> {
    let raws: Vec<RawRecurring> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("{RECURRING_SELECT} ORDER BY r.next_due_date ASC"))?;
        let rows = stmt
          .query_map([], RawRecurring::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecurring::into_recurring).collect()
  }

  // ── Voice audit ───────────────────────────────────────────────────────────

  async fn begin_voice_command(&self, raw_text: String) -> Result<VoiceCommand> {
    let command = VoiceCommand {
      command_id: Uuid::new_v4(),
      raw_text,
      intent: PROCESSING_INTENT.to_owned(),
      parameters: serde_json::Value::Object(Default::default()),
      success: false,
      processing_time_ms: 0,
      created_at: Utc::now(),
    };

    let id_str = encode_uuid(command.command_id);
    let text = command.raw_text.clone();
    let intent = command.intent.clone();
    let params_str = command.parameters.to_string();
    let at_str = encode_dt(command.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!("INSERT INTO voice_commands ({VOICE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, 0, 0, ?5)"),
          rusqlite::params![id_str, text, intent, params_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(command)
  }

  async fn finish_voice_command(&self, id: Uuid, update: VoiceCommandUpdate) -> Result<bool> {
    let id_str = encode_uuid(id);
    let params_str = update.parameters.as_ref().map(serde_json::Value::to_string);
    let elapsed = i64::try_from(update.processing_time_ms).unwrap_or(i64::MAX);
    let intent = update.intent;
    let success = update.success;

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE voice_commands SET
             intent             = COALESCE(?2, intent),
             parameters         = COALESCE(?3, parameters),
             success            = ?4,
             processing_time_ms = ?5
           WHERE command_id = ?1",
          rusqlite::params![id_str, intent, params_str, success, elapsed],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn list_voice_commands(&self, limit: usize) -> Result<Vec<VoiceCommand>> {
    let limit_val = i64::try_from(limit).unwrap_or(i64::MAX);

    let raws: Vec<RawVoiceCommand> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {VOICE_COLUMNS} FROM voice_commands
           ORDER BY created_at DESC
           LIMIT ?1"
        ))?;
        let rows = stmt
          .query_map([limit_val], RawVoiceCommand::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawVoiceCommand::into_command).collect()
  }

  // ── User configuration ────────────────────────────────────────────────────

  async fn get_config(&self, key: String) -> Result<Option<UserConfig>> {
    let raw: Option<RawConfig> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT key, value, updated_at FROM user_config WHERE key = ?1",
              [key],
              RawConfig::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawConfig::into_config).transpose()
  }

  async fn set_config(&self, key: String, value: String) -> Result<UserConfig> {
    let config = UserConfig { key, value, updated_at: Utc::now() };

    let key = config.key.clone();
    let value = config.value.clone();
    let at_str = encode_dt(config.updated_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO user_config (key, value, updated_at) VALUES (?1, ?2, ?3)
           ON CONFLICT(key) DO UPDATE SET
             value      = excluded.value,
             updated_at = excluded.updated_at",
          rusqlite::params![key, value, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(config)
  }

  async fn list_config(&self) -> Result<Vec<UserConfig>> {
    let raws: Vec<RawConfig> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT key, value, updated_at FROM user_config ORDER BY key")?;
        let rows = stmt
          .query_map([], RawConfig::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawConfig::into_config).collect()
  }

  // ── Maintenance ───────────────────────────────────────────────────────────

  async fn reset(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        let tx = conn.transaction()?;
        tx.execute_batch(
          "DELETE FROM transactions;
           DELETE FROM goals;
           DELETE FROM recurring_expenses;
           DELETE FROM voice_commands;
           DELETE FROM user_config;
           DELETE FROM categories;",
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
