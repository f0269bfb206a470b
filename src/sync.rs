// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::{Connection, Transaction};
use serde::Serialize;

use crate::csv_io::{CsvPaths, read_records};
use crate::db::Database;
use crate::error::{LedgerError, RowError};
use crate::ledger::Ledger;
use crate::models::{Expense, Receipt, Record};

/// Insert `rec` unless an identical row (full-field equality) already exists.
///
/// Deduplication is a pre-insert probe rather than a uniqueness constraint:
/// the base tables carry no natural key, so repeated imports stay idempotent
/// only by checking before writing. Returns true when a row was written.
pub fn insert_missing<R: Record>(conn: &Connection, rec: &R) -> rusqlite::Result<bool> {
    if rec.exists(conn)? {
        return Ok(false);
    }
    rec.insert(conn)?;
    rec.mirror_partition(conn)?;
    Ok(true)
}

/// Write every missing record from the batch inside one transaction.
pub fn write_missing<R: Record>(conn: &mut Connection, records: &[R]) -> rusqlite::Result<usize> {
    let tx = conn.transaction()?;
    let mut inserted = 0;
    for rec in records {
        if insert_missing(&tx, rec)? {
            inserted += 1;
        }
    }
    tx.commit()?;
    Ok(inserted)
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Default, Serialize)]
pub struct SyncReport {
    /// False when no persistent store was available and the call was a no-op.
    pub performed: bool,
    /// Valid rows streamed from the import source.
    pub examined: usize,
    /// Rows the store was missing; each is also mirrored into the ledger.
    pub inserted: usize,
    pub skipped: Vec<RowError>,
}

/// Reconcile the CSV import source against the persistent store: re-validate
/// every row, probe for it by full-field equality, and insert the ones the
/// store is missing (expenses also land in their monthly partition, created
/// lazily). Newly inserted rows are mirrored into the ledger as they are
/// written.
///
/// The whole pass is one transaction. On a persistence failure every write of
/// this call is rolled back and the handle degrades; ledger appends made
/// before the failure are kept. The next connected startup heals that
/// inconsistency additively. Running sync twice over unchanged input inserts
/// nothing the second time.
pub fn sync(
    db: &mut Database,
    ledger: &mut Ledger,
    paths: &CsvPaths,
) -> Result<SyncReport, LedgerError> {
    if !db.is_connected() {
        return Ok(SyncReport::default());
    }

    let (expenses, mut skipped) = read_kind::<Expense>(&paths.expenses)?;
    let (receipts, more_skipped) = read_kind::<Receipt>(&paths.received)?;
    skipped.extend(more_skipped);
    let examined = expenses.len() + receipts.len();

    let Some(conn) = db.connection_mut() else {
        return Ok(SyncReport::default());
    };
    let result = reconcile(conn, ledger, &expenses, &receipts);
    match result {
        Ok(inserted) => Ok(SyncReport {
            performed: true,
            examined,
            inserted,
            skipped,
        }),
        Err(e) => {
            db.degrade();
            Err(LedgerError::Store(e))
        }
    }
}

/// A missing source file contributes nothing to the sync; any other file
/// problem fails the call before a transaction starts.
fn read_kind<R: Record>(path: &std::path::Path) -> Result<(Vec<R>, Vec<RowError>), LedgerError> {
    match read_records::<R>(path) {
        Ok(parsed) => Ok(parsed),
        Err(LedgerError::Resource { path, .. }) => {
            println!("{} not found. Nothing to sync for it.", path.display());
            Ok((Vec::new(), Vec::new()))
        }
        Err(e) => Err(e),
    }
}

fn reconcile(
    conn: &mut Connection,
    ledger: &mut Ledger,
    expenses: &[Expense],
    receipts: &[Receipt],
) -> rusqlite::Result<usize> {
    let tx = conn.transaction()?;
    let mut inserted = 0;
    inserted += apply_kind(&tx, ledger, expenses)?;
    inserted += apply_kind(&tx, ledger, receipts)?;
    tx.commit()?;
    Ok(inserted)
}

fn apply_kind<R: Record>(
    tx: &Transaction<'_>,
    ledger: &mut Ledger,
    records: &[R],
) -> rusqlite::Result<usize> {
    let mut inserted = 0;
    for rec in records {
        if insert_missing(tx, rec)? {
            ledger.push(rec.clone());
            inserted += 1;
        }
    }
    Ok(inserted)
}
