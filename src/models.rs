// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use rusqlite::{Connection, Row, params};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::RowError;
use crate::ledger::Ledger;
use crate::utils;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Expense,
    Receipt,
}

impl RecordKind {
    pub fn noun(&self) -> &'static str {
        match self {
            RecordKind::Expense => "expense",
            RecordKind::Receipt => "received",
        }
    }
}

/// Canonical text form for stored amounts. Full-field equality in the store
/// compares text columns, so `20.00` and `20` must render identically.
pub fn amount_text(amount: Decimal) -> String {
    amount.normalize().to_string()
}

/// One record kind's field schema: how it parses from CSV columns, how it is
/// stored and probed in SQLite, which ledger slot holds it, and which of its
/// columns accept a `key=value` filter.
///
/// Import, sync, filtering, and totals are each written once against this
/// trait; the two kinds differ only in the schema they declare here.
pub trait Record: Clone + Serialize {
    const KIND: RecordKind;
    /// Base table name in the persistent store.
    const TABLE: &'static str;
    /// Required CSV columns, in export order.
    const CSV_COLUMNS: &'static [&'static str];
    /// Columns accepted as a `key=value` filter predicate.
    const FILTER_COLUMNS: &'static [&'static str];
    /// Column list matching `from_row`, also used for partition copies.
    const SELECT_FIELDS: &'static str;

    fn date(&self) -> NaiveDate;
    fn amount(&self) -> Decimal;

    /// Parse one row whose fields are ordered as `CSV_COLUMNS` and already
    /// trimmed. Failures are row-scoped.
    fn from_fields(fields: &[String], line: u64) -> Result<Self, RowError>;
    fn to_fields(&self) -> Vec<String>;

    /// Whether an identical row (full-field equality) already exists in the
    /// base table.
    fn exists(&self, conn: &Connection) -> rusqlite::Result<bool>;
    /// Insert into the base table.
    fn insert(&self, conn: &Connection) -> rusqlite::Result<()>;
    /// Mirror a newly written row into its derived monthly partition, for
    /// kinds that keep one.
    fn mirror_partition(&self, conn: &Connection) -> rusqlite::Result<()> {
        let _ = conn;
        Ok(())
    }
    /// Read one row of a `SELECT SELECT_FIELDS` result.
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    fn ledger_slice(ledger: &Ledger) -> &[Self];
    fn ledger_push(ledger: &mut Ledger, rec: Self);

    /// Exact-match predicate backing the in-memory path of `key=value`
    /// filters. `key` has already been checked against `FILTER_COLUMNS`.
    fn field_matches(&self, key: &str, value: &str) -> bool;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub category: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub place: String,
    pub autopay: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub sender: String,
    pub amount: Decimal,
    pub date: NaiveDate,
}

impl Record for Expense {
    const KIND: RecordKind = RecordKind::Expense;
    const TABLE: &'static str = "expenses";
    const CSV_COLUMNS: &'static [&'static str] =
        &["Category", "Amount", "Date", "Place of Spending", "Auto-Pay"];
    const FILTER_COLUMNS: &'static [&'static str] = &["category", "place"];
    const SELECT_FIELDS: &'static str = "category, amount, date, place, autopay";

    fn date(&self) -> NaiveDate {
        self.date
    }

    fn amount(&self) -> Decimal {
        self.amount
    }

    fn from_fields(fields: &[String], line: u64) -> Result<Self, RowError> {
        let fail = |reason: String| RowError { line, reason };
        let category = fields[0].clone();
        if category.is_empty() {
            return Err(fail("Category cannot be empty".into()));
        }
        let amount = utils::parse_amount(&fields[1]).map_err(|e| fail(e.to_string()))?;
        let date = utils::parse_date_lenient(&fields[2])
            .map_err(|_| fail(format!("Invalid date '{}', expected YYYY-MM-DD", fields[2])))?;
        let place = fields[3].clone();
        let autopay = utils::parse_bool(&fields[4]).map_err(|e| fail(e.to_string()))?;
        Ok(Expense {
            category,
            amount,
            date,
            place,
            autopay,
        })
    }

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.category.clone(),
            amount_text(self.amount),
            self.date.to_string(),
            self.place.clone(),
            self.autopay.to_string(),
        ]
    }

    fn exists(&self, conn: &Connection) -> rusqlite::Result<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM expenses
             WHERE category=?1 AND amount=?2 AND date=?3 AND place=?4 AND autopay=?5",
            params![
                self.category,
                amount_text(self.amount),
                self.date,
                self.place,
                self.autopay
            ],
            |r| r.get(0),
        )?;
        Ok(count > 0)
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT INTO expenses(category, amount, date, place, autopay)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                self.category,
                amount_text(self.amount),
                self.date,
                self.place,
                self.autopay
            ],
        )?;
        Ok(())
    }

    fn mirror_partition(&self, conn: &Connection) -> rusqlite::Result<()> {
        let key = MonthKey::of(self.date);
        crate::db::ensure_partition(conn, key)?;
        crate::db::partition_insert(conn, key, self)
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let amount_s: String = row.get(1)?;
        let amount = amount_s.parse::<Decimal>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
        })?;
        Ok(Expense {
            category: row.get(0)?,
            amount,
            date: row.get(2)?,
            place: row.get(3)?,
            autopay: row.get(4)?,
        })
    }

    fn ledger_slice(ledger: &Ledger) -> &[Self] {
        &ledger.expenses
    }

    fn ledger_push(ledger: &mut Ledger, rec: Self) {
        ledger.expenses.push(rec);
    }

    fn field_matches(&self, key: &str, value: &str) -> bool {
        match key {
            "category" => self.category == value,
            "place" => self.place == value,
            _ => false,
        }
    }
}

impl Record for Receipt {
    const KIND: RecordKind = RecordKind::Receipt;
    const TABLE: &'static str = "received";
    const CSV_COLUMNS: &'static [&'static str] = &["Sender", "Amount", "Date of Receiving"];
    const FILTER_COLUMNS: &'static [&'static str] = &["sender"];
    const SELECT_FIELDS: &'static str = "sender, amount, date";

    fn date(&self) -> NaiveDate {
        self.date
    }

    fn amount(&self) -> Decimal {
        self.amount
    }

    fn from_fields(fields: &[String], line: u64) -> Result<Self, RowError> {
        let fail = |reason: String| RowError { line, reason };
        let sender = fields[0].clone();
        if sender.is_empty() {
            return Err(fail("Sender cannot be empty".into()));
        }
        let amount = utils::parse_amount(&fields[1]).map_err(|e| fail(e.to_string()))?;
        let date = utils::parse_date_lenient(&fields[2])
            .map_err(|_| fail(format!("Invalid date '{}', expected YYYY-MM-DD", fields[2])))?;
        Ok(Receipt {
            sender,
            amount,
            date,
        })
    }

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.sender.clone(),
            amount_text(self.amount),
            self.date.to_string(),
        ]
    }

    fn exists(&self, conn: &Connection) -> rusqlite::Result<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM received WHERE sender=?1 AND amount=?2 AND date=?3",
            params![self.sender, amount_text(self.amount), self.date],
            |r| r.get(0),
        )?;
        Ok(count > 0)
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT INTO received(sender, amount, date) VALUES (?1, ?2, ?3)",
            params![self.sender, amount_text(self.amount), self.date],
        )?;
        Ok(())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let amount_s: String = row.get(1)?;
        let amount = amount_s.parse::<Decimal>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
        })?;
        Ok(Receipt {
            sender: row.get(0)?,
            amount,
            date: row.get(2)?,
        })
    }

    fn ledger_slice(ledger: &Ledger) -> &[Self] {
        &ledger.receipts
    }

    fn ledger_push(ledger: &mut Ledger, rec: Self) {
        ledger.receipts.push(rec);
    }

    fn field_matches(&self, key: &str, value: &str) -> bool {
        match key {
            "sender" => self.sender == value,
            _ => false,
        }
    }
}

/// Typed monthly partition key. The `expenses_YYYY_MM` table name is rendered
/// from this in exactly one place (`db`); everything else passes the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn of(date: NaiveDate) -> Self {
        MonthKey {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Parse a `YYYY-MM` prefix as produced by `substr(date,1,7)`.
    pub fn from_prefix(s: &str) -> Option<Self> {
        let (y, m) = s.split_once('-')?;
        let key = MonthKey {
            year: y.parse().ok()?,
            month: m.parse().ok()?,
        };
        (1..=12).contains(&key.month).then_some(key)
    }

    /// The `YYYY-MM` form used in date-prefix SQL filters and display.
    pub fn prefix(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

/// Derived balance figures for an optional month window. Recomputed on
/// demand, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceSheet {
    pub prior: Decimal,
    pub total_expenses: Decimal,
    pub total_received: Decimal,
    pub account_balance: Decimal,
    pub amount_left: Decimal,
    pub amount_needed: Decimal,
}

impl BalanceSheet {
    pub fn derive(prior: Decimal, total_expenses: Decimal, total_received: Decimal) -> Self {
        let account_balance = total_received + prior - total_expenses;
        BalanceSheet {
            prior,
            total_expenses,
            total_received,
            account_balance,
            amount_left: account_balance.max(Decimal::ZERO),
            amount_needed: (-account_balance).max(Decimal::ZERO),
        }
    }
}
