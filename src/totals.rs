// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::db::{self, Database};
use crate::error::LedgerError;
use crate::ledger::Ledger;
use crate::models::{BalanceSheet, Expense, MonthKey, Receipt, Record, RecordKind};

/// Which data source produced an aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TotalSource {
    Store,
    Memory,
}

#[derive(Debug, Clone, Serialize)]
pub struct Total {
    pub amount: Decimal,
    pub source: TotalSource,
}

/// Sum amounts of one kind, optionally bounded to a month.
///
/// CONNECTED uses a store-side SUM: over the monthly partition when the kind
/// keeps one and it exists, over a month-prefix filter on the base table
/// otherwise. When the store is absent or its query fails, the identical sum
/// is recomputed from the ledger (and a failure degrades the handle); the
/// result records which path produced it. Months arrive pre-validated as
/// typed keys, so this never fails.
pub fn total<R: Record>(db: &mut Database, ledger: &Ledger, month: Option<MonthKey>) -> Total {
    let computed = db.connection().map(|conn| sum_in_store::<R>(conn, month));
    match computed {
        Some(Ok(amount)) => Total {
            amount,
            source: TotalSource::Store,
        },
        Some(Err(e)) => {
            eprintln!("warning: store aggregate failed: {:#}", e);
            db.degrade();
            Total {
                amount: sum_ledger::<R>(ledger, month),
                source: TotalSource::Memory,
            }
        }
        None => Total {
            amount: sum_ledger::<R>(ledger, month),
            source: TotalSource::Memory,
        },
    }
}

fn sum_in_store<R: Record>(conn: &Connection, month: Option<MonthKey>) -> Result<Decimal> {
    let raw: f64 = match month {
        Some(key) if R::KIND == RecordKind::Expense && db::partition_exists(conn, key)? => {
            conn.query_row(&db::partition_sum_sql(key), [], |r| r.get(0))?
        }
        Some(key) => conn.query_row(
            &format!(
                "SELECT IFNULL(SUM(amount), 0) FROM {} WHERE substr(date,1,7)=?1",
                R::TABLE
            ),
            params![key.prefix()],
            |r| r.get(0),
        )?,
        None => conn.query_row(
            &format!("SELECT IFNULL(SUM(amount), 0) FROM {}", R::TABLE),
            [],
            |r| r.get(0),
        )?,
    };
    Decimal::try_from(raw).with_context(|| format!("Invalid stored total '{}'", raw))
}

fn sum_ledger<R: Record>(ledger: &Ledger, month: Option<MonthKey>) -> Decimal {
    ledger
        .records::<R>()
        .iter()
        .filter(|rec| month.is_none_or(|m| m.contains(rec.date())))
        .map(|rec| rec.amount())
        .sum()
}

/// Compose the two totals into the derived balance figures. Never fails: a
/// failed sub-total has already fallen back to the in-memory recomputation.
pub fn balance(
    db: &mut Database,
    ledger: &Ledger,
    month: Option<MonthKey>,
    prior: Decimal,
) -> BalanceSheet {
    let expenses = total::<Expense>(db, ledger, month).amount;
    let received = total::<Receipt>(db, ledger, month).amount;
    BalanceSheet::derive(prior, expenses, received)
}

pub fn prior_balance_path() -> Result<PathBuf> {
    Ok(db::data_dir()?.join("prior_balance.txt"))
}

/// Read the prior-balance scalar. A missing file reads as zero; an
/// unreadable one is a resource error the caller reports before proceeding
/// with zero.
pub fn read_prior_balance(path: &Path) -> Result<Decimal, LedgerError> {
    let text = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Decimal::ZERO),
        Err(e) => {
            return Err(LedgerError::Resource {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };
    let trimmed = text.trim();
    let amount = trimmed
        .parse::<Decimal>()
        .map_err(|e| LedgerError::Validation(format!("Invalid prior balance '{}': {}", trimmed, e)))?;
    if amount < Decimal::ZERO {
        return Err(LedgerError::Validation(
            "Prior balance cannot be negative".into(),
        ));
    }
    Ok(amount)
}

pub fn write_prior_balance(path: &Path, amount: Decimal) -> Result<(), LedgerError> {
    if amount < Decimal::ZERO {
        return Err(LedgerError::Validation(
            "Prior balance cannot be negative".into(),
        ));
    }
    fs::write(path, format!("{}\n", amount.normalize())).map_err(|e| LedgerError::Resource {
        path: path.to_path_buf(),
        source: e,
    })
}
