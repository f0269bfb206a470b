// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::PathBuf;

use anyhow::Result;

use crate::csv_io::{self, BatchReport, CsvPaths};
use crate::db::{self, Database};
use crate::error::LedgerError;
use crate::ledger::Ledger;
use crate::models::{Expense, Receipt, Record, RecordKind};

/// Resolve the CSV source paths: explicit arguments win, the data-dir copies
/// are the default. The data dir is only resolved when actually needed.
pub fn source_paths(m: &clap::ArgMatches) -> Result<CsvPaths> {
    let expenses = m
        .get_one::<String>("expenses")
        .map(|s| PathBuf::from(s.trim()));
    let received = m
        .get_one::<String>("received")
        .map(|s| PathBuf::from(s.trim()));
    if let (Some(expenses), Some(received)) = (&expenses, &received) {
        return Ok(CsvPaths {
            expenses: expenses.clone(),
            received: received.clone(),
        });
    }
    let defaults = CsvPaths::in_dir(&db::data_dir()?);
    Ok(CsvPaths {
        expenses: expenses.unwrap_or(defaults.expenses),
        received: received.unwrap_or(defaults.received),
    })
}

pub fn handle(db: &mut Database, ledger: &mut Ledger, m: &clap::ArgMatches) -> Result<()> {
    let paths = source_paths(m)?;
    import_one::<Expense>(db, ledger, &paths);
    import_one::<Receipt>(db, ledger, &paths);
    Ok(())
}

fn import_one<R: Record>(db: &mut Database, ledger: &mut Ledger, paths: &CsvPaths) {
    let path = paths.for_kind(R::KIND);
    match csv_io::import_file::<R>(db, ledger, path) {
        Ok(report) => print_report(R::KIND, &report),
        Err(LedgerError::Resource { path, .. }) => {
            println!("{} not found. Nothing to import.", path.display());
        }
        Err(e) => eprintln!("warning: {}", e),
    }
}

fn print_report(kind: RecordKind, report: &BatchReport) {
    match report.inserted {
        Some(n) => println!(
            "Imported {} {} row(s); {} new in the store.",
            report.appended,
            kind.noun(),
            n
        ),
        None => println!(
            "Imported {} {} row(s) (in-memory only).",
            report.appended,
            kind.noun()
        ),
    }
    for row in &report.skipped {
        println!("Skipped {}", row);
    }
}
