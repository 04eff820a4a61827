//! SQL schema for the Tally SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Money is stored as decimal TEXT and timestamps as fixed-width RFC 3339 UTC
/// strings, so lexical order on `date` is chronological order.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS categories (
    category_id TEXT PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE COLLATE NOCASE,
    budget      TEXT,
    kind        TEXT NOT NULL DEFAULT 'EXPENSE',   -- 'EXPENSE' | 'SAVING' | 'INVESTMENT'
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS transactions (
    transaction_id TEXT PRIMARY KEY,
    amount         TEXT NOT NULL,
    description    TEXT NOT NULL,
    kind           TEXT NOT NULL,                  -- 'INCOME' | 'EXPENSE'
    bucket         TEXT NOT NULL,                  -- 'NEED' | 'WANT' | 'SAVING'
    date           TEXT NOT NULL,
    category_id    TEXT NOT NULL REFERENCES categories(category_id),
    tags           TEXT NOT NULL DEFAULT '[]',
    ai_analysis    TEXT,                           -- JSON or NULL
    created_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS goals (
    goal_id        TEXT PRIMARY KEY,
    name           TEXT NOT NULL,
    target_amount  TEXT NOT NULL,
    current_amount TEXT NOT NULL DEFAULT '0',
    deadline       TEXT,                           -- YYYY-MM-DD
    status         TEXT NOT NULL DEFAULT 'IN_PROGRESS',
    category_id    TEXT REFERENCES categories(category_id),
    ai_suggestions TEXT,
    created_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS recurring_expenses (
    recurring_id  TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    amount        TEXT NOT NULL,
    frequency     TEXT NOT NULL,
    next_due_date TEXT NOT NULL,
    bucket        TEXT NOT NULL,
    category_id   TEXT NOT NULL REFERENCES categories(category_id),
    is_automatic  INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL
);

-- One row per natural-language command, updated once on completion.
CREATE TABLE IF NOT EXISTS voice_commands (
    command_id         TEXT PRIMARY KEY,
    raw_text           TEXT NOT NULL,
    intent             TEXT NOT NULL,
    parameters         TEXT NOT NULL DEFAULT '{}',
    success            INTEGER NOT NULL DEFAULT 0,
    processing_time_ms INTEGER NOT NULL DEFAULT 0,
    created_at         TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS user_config (
    key        TEXT PRIMARY KEY,
    value      TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS transactions_date_idx     ON transactions(date);
CREATE INDEX IF NOT EXISTS transactions_category_idx ON transactions(category_id);
CREATE INDEX IF NOT EXISTS voice_commands_created_idx ON voice_commands(created_at);

PRAGMA user_version = 1;
";
