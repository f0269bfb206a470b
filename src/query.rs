// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::Connection;

use crate::db::{self, Database};
use crate::error::QueryError;
use crate::ledger::Ledger;
use crate::models::{MonthKey, Record, RecordKind};

/// Predicates for a filtered view over one record kind. All are optional and
/// combine with AND.
#[derive(Debug, Default, Clone)]
pub struct Filter {
    pub date_start: Option<NaiveDate>,
    pub date_end: Option<NaiveDate>,
    /// Exact-match column, checked against the kind's filterable columns.
    pub key: Option<String>,
    pub value: Option<String>,
    /// Resolve the monthly partition instead of the base table. A partition
    /// that does not exist is reported, never silently widened to the base
    /// table.
    pub month: Option<MonthKey>,
}

/// Return the records satisfying `filter`, in insertion order.
///
/// CONNECTED reads the store; DEGRADED runs the identical predicates over
/// the in-memory ledger (the month bound becomes a date predicate there). A
/// store failure mid-query degrades the handle and surfaces as an error the
/// caller renders as a warning plus an empty result; it never propagates
/// past the command boundary.
pub fn filter<R: Record>(
    db: &mut Database,
    ledger: &Ledger,
    filter: &Filter,
) -> Result<Vec<R>, QueryError> {
    if let (Some(key), Some(_)) = (&filter.key, &filter.value) {
        if !R::FILTER_COLUMNS.contains(&key.as_str()) {
            return Err(QueryError::InvalidKey(key.clone()));
        }
    }

    let fetched = db.connection().map(|conn| fetch::<R>(conn, filter));
    match fetched {
        None => Ok(filter_ledger(ledger, filter)),
        Some(Ok(rows)) => Ok(rows),
        Some(Err(QueryError::Store(e))) => {
            db.degrade();
            Err(QueryError::Store(e))
        }
        Some(Err(other)) => Err(other),
    }
}

fn fetch<R: Record>(conn: &Connection, filter: &Filter) -> Result<Vec<R>, QueryError> {
    let mut sql = match filter.month {
        // Partitions only exist for expenses; a month bound on the other
        // kind stays a date-prefix predicate on the base table.
        Some(key) if R::KIND == RecordKind::Expense => {
            if !db::partition_exists(conn, key)? {
                return Err(QueryError::MissingPartition(key));
            }
            db::partition_select_sql(key)
        }
        _ => db::select_sql::<R>(R::TABLE),
    };

    sql.push_str(" WHERE 1=1");
    let mut params_vec: Vec<String> = Vec::new();
    if let Some(start) = filter.date_start {
        sql.push_str(" AND date >= ?");
        params_vec.push(start.to_string());
    }
    if let Some(end) = filter.date_end {
        sql.push_str(" AND date <= ?");
        params_vec.push(end.to_string());
    }
    if let (Some(key), Some(value)) = (&filter.key, &filter.value) {
        // Allow-listed above; key never reaches the SQL text unchecked.
        sql.push_str(&format!(" AND {} = ?", key));
        params_vec.push(value.clone());
    }
    if let Some(key) = filter.month {
        if R::KIND != RecordKind::Expense {
            sql.push_str(" AND substr(date,1,7) = ?");
            params_vec.push(key.prefix());
        }
    }
    sql.push_str(" ORDER BY id");

    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn rusqlite::ToSql> = params_vec
        .iter()
        .map(|s| s as &dyn rusqlite::ToSql)
        .collect();
    let mut rows = stmt.query(rusqlite::params_from_iter(params))?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        out.push(R::from_row(r)?);
    }
    Ok(out)
}

fn filter_ledger<R: Record>(ledger: &Ledger, filter: &Filter) -> Vec<R> {
    ledger
        .records::<R>()
        .iter()
        .filter(|rec| {
            let date = rec.date();
            if let Some(start) = filter.date_start {
                if date < start {
                    return false;
                }
            }
            if let Some(end) = filter.date_end {
                if date > end {
                    return false;
                }
            }
            if let (Some(key), Some(value)) = (&filter.key, &filter.value) {
                if !rec.field_matches(key, value) {
                    return false;
                }
            }
            if let Some(month) = filter.month {
                if !month.contains(date) {
                    return false;
                }
            }
            true
        })
        .cloned()
        .collect()
}
