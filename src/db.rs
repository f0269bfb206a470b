// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::{Connection, params};

use crate::models::{Expense, MonthKey, Record, amount_text};

static APP: Lazy<(&str, &str, &str)> = Lazy::new(|| ("com.alphavelocity", "Outlay", "outlay"));

const CONNECT_ATTEMPTS: u32 = 3;

pub fn data_dir() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.to_path_buf())
}

pub fn db_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("outlay.sqlite"))
}

/// Handle on the persistent store, in one of two states: CONNECTED (a live
/// SQLite connection) or DEGRADED (no connection; every operation falls back
/// to the in-memory ledger). A persistence error degrades the handle for the
/// remainder of the process; there is no reconnection beyond the bounded
/// retry at startup.
pub struct Database {
    conn: Option<Connection>,
}

impl Database {
    /// Open the store, retrying a bounded number of times before continuing
    /// without it.
    pub fn open() -> Database {
        for attempt in 1..=CONNECT_ATTEMPTS {
            match Self::try_open() {
                Ok(db) => return db,
                Err(e) => eprintln!(
                    "warning: store connection failed ({attempt}/{CONNECT_ATTEMPTS}): {e:#}"
                ),
            }
        }
        eprintln!("warning: continuing without the persistent store");
        Database { conn: None }
    }

    fn try_open() -> Result<Database> {
        let path = db_path()?;
        let conn =
            Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
        init_schema(&conn)?;
        refresh_partitions(&conn)?;
        Ok(Database { conn: Some(conn) })
    }

    /// Wrap an existing connection (tests use an in-memory one). Bootstraps
    /// the schema and refreshes the partition registry, as `open` does.
    pub fn with_connection(conn: Connection) -> Result<Database> {
        init_schema(&conn)?;
        refresh_partitions(&conn)?;
        Ok(Database { conn: Some(conn) })
    }

    /// A handle that starts out degraded.
    pub fn detached() -> Database {
        Database { conn: None }
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    pub fn connection(&self) -> Option<&Connection> {
        self.conn.as_ref()
    }

    pub fn connection_mut(&mut self) -> Option<&mut Connection> {
        self.conn.as_mut()
    }

    /// Drop the connection for the remainder of the process.
    pub fn degrade(&mut self) {
        if self.conn.take().is_some() {
            eprintln!("warning: persistent store disabled for the rest of this run");
        }
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS expenses(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        category TEXT NOT NULL,
        amount TEXT NOT NULL,
        date TEXT NOT NULL,
        place TEXT NOT NULL DEFAULT '',
        autopay INTEGER NOT NULL DEFAULT 0
    );
    CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(date);

    CREATE TABLE IF NOT EXISTS received(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        sender TEXT NOT NULL,
        amount TEXT NOT NULL,
        date TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_received_date ON received(date);
    "#,
    )?;
    Ok(())
}

/// The single place the partition table name is rendered from its typed key.
fn partition_table(key: MonthKey) -> String {
    format!("expenses_{:04}_{:02}", key.year, key.month)
}

/// Create the monthly partition table if it does not exist yet. Partitions
/// are created lazily on first write for a month.
pub fn ensure_partition(conn: &Connection, key: MonthKey) -> rusqlite::Result<()> {
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {}(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            category TEXT NOT NULL,
            amount TEXT NOT NULL,
            date TEXT NOT NULL,
            place TEXT NOT NULL DEFAULT '',
            autopay INTEGER NOT NULL DEFAULT 0
        )",
        partition_table(key)
    ))
}

pub fn partition_insert(conn: &Connection, key: MonthKey, e: &Expense) -> rusqlite::Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO {}(category, amount, date, place, autopay) VALUES (?1, ?2, ?3, ?4, ?5)",
            partition_table(key)
        ),
        params![e.category, amount_text(e.amount), e.date, e.place, e.autopay],
    )?;
    Ok(())
}

pub fn partition_exists(conn: &Connection, key: MonthKey) -> rusqlite::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
        params![partition_table(key)],
        |r| r.get(0),
    )?;
    Ok(count > 0)
}

/// The partition registry: every monthly table currently in the store, read
/// back as typed keys.
pub fn partitions(conn: &Connection) -> rusqlite::Result<Vec<MonthKey>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type='table' AND name LIKE 'expenses\\_%' ESCAPE '\\'
         ORDER BY name",
    )?;
    let mut rows = stmt.query([])?;
    let mut keys = Vec::new();
    while let Some(r) = rows.next()? {
        let name: String = r.get(0)?;
        let suffix = name.trim_start_matches("expenses_");
        if let Some((y, m)) = suffix.split_once('_') {
            if let Some(key) = MonthKey::from_prefix(&format!("{}-{}", y, m)) {
                keys.push(key);
            }
        }
    }
    Ok(keys)
}

/// SQL snippet matching the query column order of `Record::from_row`.
pub fn select_sql<R: Record>(table: &str) -> String {
    format!("SELECT {} FROM {}", R::SELECT_FIELDS, table)
}

pub fn partition_select_sql(key: MonthKey) -> String {
    select_sql::<Expense>(&partition_table(key))
}

pub fn partition_sum_sql(key: MonthKey) -> String {
    format!("SELECT IFNULL(SUM(amount), 0) FROM {}", partition_table(key))
}

/// Base-table expense rows for the month that the partition does not hold
/// yet. Nonzero means the partition is behind and a refresh would copy rows.
pub fn partition_lag(conn: &Connection, key: MonthKey) -> rusqlite::Result<i64> {
    conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM expenses e
             WHERE substr(e.date,1,7) = ?1
               AND NOT EXISTS (
                   SELECT 1 FROM {} p
                   WHERE p.category=e.category AND p.amount=e.amount
                     AND p.date=e.date AND p.place=e.place AND p.autopay=e.autopay
               )",
            partition_table(key)
        ),
        params![key.prefix()],
        |r| r.get(0),
    )
}

/// Refresh every monthly partition from the base expense table: ensure a
/// table exists for each month that has expense rows, and additively copy in
/// any row the partition is missing. Stale partition rows are never removed.
pub fn refresh_partitions(conn: &Connection) -> Result<usize> {
    let months: Vec<MonthKey> = {
        let mut stmt = conn.prepare("SELECT DISTINCT substr(date,1,7) FROM expenses")?;
        let mut rows = stmt.query([])?;
        let mut keys = Vec::new();
        while let Some(r) = rows.next()? {
            let prefix: String = r.get(0)?;
            if let Some(key) = MonthKey::from_prefix(&prefix) {
                keys.push(key);
            }
        }
        keys
    };

    let mut copied = 0;
    for key in months {
        ensure_partition(conn, key)?;
        copied += conn.execute(
            &format!(
                "INSERT INTO {part}(category, amount, date, place, autopay)
                 SELECT e.category, e.amount, e.date, e.place, e.autopay
                 FROM expenses e
                 WHERE substr(e.date,1,7) = ?1
                   AND NOT EXISTS (
                       SELECT 1 FROM {part} p
                       WHERE p.category=e.category AND p.amount=e.amount
                         AND p.date=e.date AND p.place=e.place AND p.autopay=e.autopay
                   )",
                part = partition_table(key)
            ),
            params![key.prefix()],
        )?;
    }
    Ok(copied)
}
