// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use serde::Serialize;

use crate::db::Database;
use crate::error::{LedgerError, RowError};
use crate::ledger::Ledger;
use crate::models::{Expense, MonthKey, Receipt, Record};
use crate::sync;

/// Locations of the canonical CSV files that mirror the ledger on disk.
#[derive(Debug, Clone)]
pub struct CsvPaths {
    pub expenses: PathBuf,
    pub received: PathBuf,
}

impl CsvPaths {
    pub fn in_dir(dir: &Path) -> Self {
        CsvPaths {
            expenses: dir.join("expenses.csv"),
            received: dir.join("received.csv"),
        }
    }

    pub fn for_kind(&self, kind: crate::models::RecordKind) -> &Path {
        match kind {
            crate::models::RecordKind::Expense => &self.expenses,
            crate::models::RecordKind::Receipt => &self.received,
        }
    }
}

/// Outcome of one import pass over a single file.
#[derive(Debug, Serialize)]
pub struct BatchReport {
    /// Rows that passed validation.
    pub read: usize,
    /// Rows appended to the in-memory ledger.
    pub appended: usize,
    /// Rows newly written to the persistent store; `None` when the store was
    /// not written (degraded, or it failed and the run degraded).
    pub inserted: Option<usize>,
    /// Rows that failed validation. Row failures never fail the batch.
    pub skipped: Vec<RowError>,
}

/// Read and validate one CSV file of records.
///
/// A missing file is a `Resource` error and a missing required column set is
/// a `Validation` error; both fail the file. Everything below that is
/// row-scoped: a row that fails to parse lands in the skipped list and the
/// rest of the batch goes through.
pub fn read_records<R: Record>(path: &Path) -> Result<(Vec<R>, Vec<RowError>), LedgerError> {
    let file = File::open(path).map_err(|e| LedgerError::Resource {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = rdr
        .headers()
        .map_err(|e| LedgerError::Validation(format!("{}: {}", path.display(), e)))?
        .clone();
    let mut indices = Vec::with_capacity(R::CSV_COLUMNS.len());
    let mut missing = Vec::new();
    for col in R::CSV_COLUMNS {
        match headers.iter().position(|h| h == *col) {
            Some(ix) => indices.push(ix),
            None => missing.push(*col),
        }
    }
    if !missing.is_empty() {
        return Err(LedgerError::Validation(format!(
            "{} missing required column(s): {}",
            path.display(),
            missing.join(", ")
        )));
    }

    let mut records = Vec::new();
    let mut skipped = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        // Header occupies line 1; data starts at 2.
        let fallback_line = (i + 2) as u64;
        match result {
            Err(e) => skipped.push(RowError {
                line: fallback_line,
                reason: e.to_string(),
            }),
            Ok(rec) => {
                let line = rec.position().map(|p| p.line()).unwrap_or(fallback_line);
                let fields: Vec<String> = indices
                    .iter()
                    .map(|&ix| rec.get(ix).unwrap_or("").to_string())
                    .collect();
                match R::from_fields(&fields, line) {
                    Ok(r) => records.push(r),
                    Err(e) => skipped.push(e),
                }
            }
        }
    }
    Ok((records, skipped))
}

/// Import one CSV file: append every valid row to the ledger and, when the
/// store is connected, insert missing rows (full-field dedup) inside a single
/// transaction. A store failure degrades the handle but keeps the in-memory
/// appends.
pub fn import_file<R: Record>(
    db: &mut Database,
    ledger: &mut Ledger,
    path: &Path,
) -> Result<BatchReport, LedgerError> {
    let (records, skipped) = read_records::<R>(path)?;
    let mut report = BatchReport {
        read: records.len(),
        appended: 0,
        inserted: None,
        skipped,
    };
    for rec in &records {
        ledger.push(rec.clone());
        report.appended += 1;
    }
    let written = db
        .connection_mut()
        .map(|conn| sync::write_missing(conn, &records));
    match written {
        Some(Ok(n)) => report.inserted = Some(n),
        Some(Err(e)) => {
            eprintln!("warning: store insert failed during import: {}", e);
            db.degrade();
        }
        None => {}
    }
    Ok(report)
}

/// Reload the canonical CSV files into the ledger at startup. Missing files
/// are fine (nothing has been exported yet); rows failing validation are
/// skipped with a warning.
pub fn load_ledger(ledger: &mut Ledger, paths: &CsvPaths) {
    load_one::<Expense>(ledger, &paths.expenses);
    load_one::<Receipt>(ledger, &paths.received);
}

fn load_one<R: Record>(ledger: &mut Ledger, path: &Path) {
    match read_records::<R>(path) {
        Ok((records, skipped)) => {
            for rec in records {
                ledger.push(rec);
            }
            if !skipped.is_empty() {
                eprintln!(
                    "warning: {}: skipped {} invalid row(s)",
                    path.display(),
                    skipped.len()
                );
            }
        }
        Err(LedgerError::Resource { .. }) => {}
        Err(e) => eprintln!("warning: {}", e),
    }
}

/// Render the in-memory store back to one CSV file. Returns the row count.
pub fn export_file<R: Record>(ledger: &Ledger, path: &Path) -> Result<usize> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Open CSV {} for writing", path.display()))?;
    wtr.write_record(R::CSV_COLUMNS)?;
    let records = ledger.records::<R>();
    for rec in records {
        wtr.write_record(rec.to_fields())?;
    }
    wtr.flush()?;
    Ok(records.len())
}

/// Render the in-memory store to one file per (kind, year, month) group,
/// named `<kind>_<YYYY>_<MM>.csv` under `dir`.
pub fn export_monthly<R: Record>(
    ledger: &Ledger,
    dir: &Path,
) -> Result<Vec<(MonthKey, PathBuf, usize)>> {
    let mut groups: BTreeMap<MonthKey, Vec<&R>> = BTreeMap::new();
    for rec in ledger.records::<R>() {
        groups.entry(MonthKey::of(rec.date())).or_default().push(rec);
    }

    let mut written = Vec::new();
    for (key, group) in groups {
        let path = dir.join(format!(
            "{}_{:04}_{:02}.csv",
            R::TABLE,
            key.year,
            key.month
        ));
        let mut wtr = csv::Writer::from_path(&path)
            .with_context(|| format!("Open CSV {} for writing", path.display()))?;
        wtr.write_record(R::CSV_COLUMNS)?;
        for rec in &group {
            wtr.write_record(rec.to_fields())?;
        }
        wtr.flush()?;
        written.push((key, path, group.len()));
    }
    Ok(written)
}
