//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings with millisecond
//! precision, calendar dates as `YYYY-MM-DD`, money as decimal text and enums
//! by their upper-case names. Tags and model commentary are compact JSON.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rust_decimal::Decimal;
use tally_core::{
  category::Category,
  goal::Goal,
  recurring::RecurringExpense,
  settings::UserConfig,
  transaction::{AiAnalysis, Transaction},
  voice::VoiceCommand,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_day(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_day(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_decimal(d: Decimal) -> String { d.to_string() }

pub fn decode_decimal(s: &str) -> Result<Decimal> { Ok(Decimal::from_str(s)?) }

pub fn encode_tags(tags: &[String]) -> Result<String> { Ok(serde_json::to_string(tags)?) }

pub fn decode_tags(s: &str) -> Result<Vec<String>> { Ok(serde_json::from_str(s)?) }

pub fn encode_analysis(a: Option<&AiAnalysis>) -> Result<Option<String>> {
  a.map(serde_json::to_string).transpose().map_err(Error::from)
}

fn decode_analysis(s: Option<&str>) -> Result<Option<AiAnalysis>> {
  s.map(serde_json::from_str).transpose().map_err(Error::from)
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const CATEGORY_COLUMNS: &str = "category_id, name, budget, kind, created_at";

/// Raw strings read directly from a `categories` row.
pub struct RawCategory {
  pub category_id: String,
  pub name:        String,
  pub budget:      Option<String>,
  pub kind:        String,
  pub created_at:  String,
}

impl RawCategory {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      category_id: row.get(0)?,
      name:        row.get(1)?,
      budget:      row.get(2)?,
      kind:        row.get(3)?,
      created_at:  row.get(4)?,
    })
  }

  pub fn into_category(self) -> Result<Category> {
    Ok(Category {
      category_id: decode_uuid(&self.category_id)?,
      name:        self.name,
      budget:      self.budget.as_deref().map(decode_decimal).transpose()?,
      kind:        self.kind.parse()?,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

pub const TRANSACTION_SELECT: &str = "
  SELECT t.transaction_id, t.amount, t.description, t.kind, t.bucket, t.date,
         t.category_id, c.name, t.tags, t.ai_analysis, t.created_at
  FROM transactions t
  JOIN categories c ON c.category_id = t.category_id";

/// Raw strings read from a `transactions` row joined with its category.
pub struct RawTransaction {
  pub transaction_id: String,
  pub amount:         String,
  pub description:    String,
  pub kind:           String,
  pub bucket:         String,
  pub date:           String,
  pub category_id:    String,
  pub category_name:  String,
  pub tags:           String,
  pub ai_analysis:    Option<String>,
  pub created_at:     String,
}

impl RawTransaction {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      transaction_id: row.get(0)?,
      amount:         row.get(1)?,
      description:    row.get(2)?,
      kind:           row.get(3)?,
      bucket:         row.get(4)?,
      date:           row.get(5)?,
      category_id:    row.get(6)?,
      category_name:  row.get(7)?,
      tags:           row.get(8)?,
      ai_analysis:    row.get(9)?,
      created_at:     row.get(10)?,
    })
  }

  pub fn into_transaction(self) -> Result<Transaction> {
    Ok(Transaction {
      transaction_id: decode_uuid(&self.transaction_id)?,
      amount:         decode_decimal(&self.amount)?,
      description:    self.description,
      kind:           self.kind.parse()?,
      bucket:         self.bucket.parse()?,
      date:           decode_dt(&self.date)?,
      category_id:    decode_uuid(&self.category_id)?,
      category_name:  self.category_name,
      tags:           decode_tags(&self.tags)?,
      ai_analysis:    decode_analysis(self.ai_analysis.as_deref())?,
      created_at:     decode_dt(&self.created_at)?,
    })
  }
}

pub const GOAL_SELECT: &str = "
  SELECT g.goal_id, g.name, g.target_amount, g.current_amount, g.deadline,
         g.status, g.category_id, c.name, g.ai_suggestions, g.created_at
  FROM goals g
  LEFT JOIN categories c ON c.category_id = g.category_id";

/// Raw strings read from a `goals` row, optionally joined with a category.
pub struct RawGoal {
  pub goal_id:        String,
  pub name:           String,
  pub target_amount:  String,
  pub current_amount: String,
  pub deadline:       Option<String>,
  pub status:         String,
  pub category_id:    Option<String>,
  pub category_name:  Option<String>,
  pub ai_suggestions: Option<String>,
  pub created_at:     String,
}

impl RawGoal {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      goal_id:        row.get(0)?,
      name:           row.get(1)?,
      target_amount:  row.get(2)?,
      current_amount: row.get(3)?,
      deadline:       row.get(4)?,
      status:         row.get(5)?,
      category_id:    row.get(6)?,
      category_name:  row.get(7)?,
      ai_suggestions: row.get(8)?,
      created_at:     row.get(9)?,
    })
  }

  pub fn into_goal(self) -> Result<Goal> {
    Ok(Goal {
      goal_id:        decode_uuid(&self.goal_id)?,
      name:           self.name,
      target_amount:  decode_decimal(&self.target_amount)?,
      current_amount: decode_decimal(&self.current_amount)?,
      deadline:       self.deadline.as_deref().map(decode_day).transpose()?,
      status:         self.status.parse()?,
      category_id:    self.category_id.as_deref().map(decode_uuid).transpose()?,
      category_name:  self.category_name,
      ai_suggestions: decode_analysis(self.ai_suggestions.as_deref())?,
      created_at:     decode_dt(&self.created_at)?,
    })
  }
}

pub const RECURRING_SELECT: &str = "
  SELECT r.recurring_id, r.name, r.amount, r.frequency, r.next_due_date,
         r.bucket, r.category_id, c.name, r.is_automatic
  FROM recurring_expenses r
  JOIN categories c ON c.category_id = r.category_id";

pub struct RawRecurring {
  pub recurring_id:  String,
  pub name:          String,
  pub amount:        String,
  pub frequency:     String,
  pub next_due_date: String,
  pub bucket:        String,
  pub category_id:   String,
  pub category_name: String,
  pub is_automatic:  bool,
}

impl RawRecurring {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      recurring_id:  row.get(0)?,
      name:          row.get(1)?,
      amount:        row.get(2)?,
      frequency:     row.get(3)?,
      next_due_date: row.get(4)?,
      bucket:        row.get(5)?,
      category_id:   row.get(6)?,
      category_name: row.get(7)?,
      is_automatic:  row.get(8)?,
    })
  }

  pub fn into_recurring(self) -> Result<RecurringExpense> {
    Ok(RecurringExpense {
      recurring_id:  decode_uuid(&self.recurring_id)?,
      name:          self.name,
      amount:        decode_decimal(&self.amount)?,
      frequency:     self.frequency.parse()?,
      next_due_date: decode_day(&self.next_due_date)?,
      bucket:        self.bucket.parse()?,
      category_id:   decode_uuid(&self.category_id)?,
      category_name: self.category_name,
      is_automatic:  self.is_automatic,
    })
  }
}

pub const VOICE_COLUMNS: &str =
  "command_id, raw_text, intent, parameters, success, processing_time_ms, created_at";

pub struct RawVoiceCommand {
  pub command_id:         String,
  pub raw_text:           String,
  pub intent:             String,
  pub parameters:         String,
  pub success:            bool,
  pub processing_time_ms: i64,
  pub created_at:         String,
}

impl RawVoiceCommand {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      command_id:         row.get(0)?,
      raw_text:           row.get(1)?,
      intent:             row.get(2)?,
      parameters:         row.get(3)?,
      success:            row.get(4)?,
      processing_time_ms: row.get(5)?,
      created_at:         row.get(6)?,
    })
  }

  pub fn into_command(self) -> Result<VoiceCommand> {
    Ok(VoiceCommand {
      command_id:         decode_uuid(&self.command_id)?,
      raw_text:           self.raw_text,
      intent:             self.intent,
      parameters:         serde_json::from_str(&self.parameters)?,
      success:            self.success,
      processing_time_ms: u64::try_from(self.processing_time_ms).unwrap_or_default(),
      created_at:         decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawConfig {
  pub key:        String,
  pub value:      String,
  pub updated_at: String,
}

impl RawConfig {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      key:        row.get(0)?,
      value:      row.get(1)?,
      updated_at: row.get(2)?,
    })
  }

  pub fn into_config(self) -> Result<UserConfig> {
    Ok(UserConfig {
      key:        self.key,
      value:      self.value,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn timestamps_are_fixed_width_and_sortable() {
    let a = DateTime::parse_from_rfc3339("2024-01-05T09:00:00Z")
      .unwrap()
      .with_timezone(&Utc);
    let b = DateTime::parse_from_rfc3339("2024-01-05T10:30:00.250Z")
      .unwrap()
      .with_timezone(&Utc);
    let (ea, eb) = (encode_dt(a), encode_dt(b));
    assert_eq!(ea, "2024-01-05T09:00:00.000Z");
    assert_eq!(ea.len(), eb.len());
    assert!(ea < eb);
    assert_eq!(decode_dt(&eb).unwrap(), b);
  }

  #[test]
  fn decimals_keep_their_scale() {
    let d = Decimal::new(1999, 2);
    assert_eq!(encode_decimal(d), "19.99");
    assert_eq!(decode_decimal("19.99").unwrap(), d);
    assert!(decode_decimal("nineteen").is_err());
  }
}
