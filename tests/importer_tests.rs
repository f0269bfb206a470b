// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::io::Write;

use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use tempfile::NamedTempFile;

use outlay::cli;
use outlay::commands::importer;
use outlay::csv_io::{self, CsvPaths};
use outlay::db::Database;
use outlay::error::LedgerError;
use outlay::ledger::Ledger;
use outlay::models::Expense;
use outlay::query::{self, Filter};
use outlay::sync;

const EXPENSE_HEADER: &str = "Category,Amount,Date,Place of Spending,Auto-Pay";

fn store() -> Database {
    Database::with_connection(Connection::open_in_memory().unwrap()).unwrap()
}

fn csv_file(content: &str) -> NamedTempFile {
    let mut f = NamedTempFile::new().unwrap();
    write!(f, "{}", content).unwrap();
    f.flush().unwrap();
    f
}

fn expense_count(db: &Database) -> i64 {
    db.connection()
        .unwrap()
        .query_row("SELECT COUNT(*) FROM expenses", [], |r| r.get(0))
        .unwrap()
}

#[test]
fn import_preserves_rows_order_and_fields() {
    let f = csv_file(&format!(
        "{}\nFood,20.00,2025-03-01,Cafe,false\nTravel,50,2025-04-01,Station,true\n",
        EXPENSE_HEADER
    ));
    let mut db = store();
    let mut ledger = Ledger::default();

    let report = csv_io::import_file::<Expense>(&mut db, &mut ledger, f.path()).unwrap();
    assert_eq!(report.appended, 2);
    assert_eq!(report.inserted, Some(2));
    assert!(report.skipped.is_empty());

    let rows = query::filter::<Expense>(&mut db, &ledger, &Filter::default()).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].category, "Food");
    assert_eq!(rows[0].amount, "20.00".parse::<Decimal>().unwrap());
    assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
    assert_eq!(rows[0].place, "Cafe");
    assert!(!rows[0].autopay);
    assert_eq!(rows[1].category, "Travel");
    assert!(rows[1].autopay);
}

#[test]
fn import_skips_bad_amount_row_not_the_batch() {
    let f = csv_file(&format!(
        "{}\nFood,abc,2025-03-01,Cafe,false\nRent,800,2025-03-02,Home,true\n",
        EXPENSE_HEADER
    ));
    let mut db = store();
    let mut ledger = Ledger::default();

    let report = csv_io::import_file::<Expense>(&mut db, &mut ledger, f.path()).unwrap();
    assert_eq!(report.appended, 1);
    assert_eq!(report.inserted, Some(1));
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].line, 2);
    assert!(report.skipped[0].reason.contains("Invalid decimal 'abc'"));
    assert_eq!(ledger.expenses[0].category, "Rent");
}

#[test]
fn import_skips_negative_amount_row() {
    let f = csv_file(&format!("{}\nFood,-5,2025-03-01,Cafe,false\n", EXPENSE_HEADER));
    let mut db = store();
    let mut ledger = Ledger::default();

    let report = csv_io::import_file::<Expense>(&mut db, &mut ledger, f.path()).unwrap();
    assert_eq!(report.appended, 0);
    assert!(report.skipped[0].reason.contains("Amount cannot be negative"));
}

#[test]
fn import_date_falls_back_to_lenient_formats() {
    let f = csv_file(&format!(
        "{}\nFood,20,2025/03/05,Cafe,false\nRent,30,05-04-2025,Home,false\nJunk,40,not-a-date,Nowhere,false\n",
        EXPENSE_HEADER
    ));
    let mut db = store();
    let mut ledger = Ledger::default();

    let report = csv_io::import_file::<Expense>(&mut db, &mut ledger, f.path()).unwrap();
    assert_eq!(report.appended, 2);
    assert_eq!(
        ledger.expenses[0].date,
        NaiveDate::from_ymd_opt(2025, 3, 5).unwrap()
    );
    // Day-first wins for ambiguous numeric dates.
    assert_eq!(
        ledger.expenses[1].date,
        NaiveDate::from_ymd_opt(2025, 4, 5).unwrap()
    );
    assert_eq!(report.skipped.len(), 1);
    assert!(report.skipped[0].reason.contains("Invalid date 'not-a-date'"));
}

#[test]
fn import_fails_file_on_missing_required_columns() {
    let f = csv_file("Category,Amount,Date\nFood,20,2025-03-01\n");
    let mut db = store();
    let mut ledger = Ledger::default();

    let err = csv_io::import_file::<Expense>(&mut db, &mut ledger, f.path()).unwrap_err();
    match err {
        LedgerError::Validation(msg) => {
            assert!(msg.contains("missing required column(s)"));
            assert!(msg.contains("Place of Spending"));
            assert!(msg.contains("Auto-Pay"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(ledger.expenses.len(), 0);
}

#[test]
fn import_missing_file_is_resource_error() {
    let mut db = store();
    let mut ledger = Ledger::default();
    let err = csv_io::import_file::<Expense>(&mut db, &mut ledger, "no-such-file.csv".as_ref())
        .unwrap_err();
    assert!(matches!(err, LedgerError::Resource { .. }));
}

#[test]
fn duplicate_rows_collapse_in_store_across_import_and_sync() {
    let dir = tempfile::tempdir().unwrap();
    let paths = CsvPaths::in_dir(dir.path());
    std::fs::write(
        &paths.expenses,
        format!(
            "{}\nFood,20.00,2025-03-01,Cafe,false\nFood,20.00,2025-03-01,Cafe,false\n",
            EXPENSE_HEADER
        ),
    )
    .unwrap();
    std::fs::write(&paths.received, "Sender,Amount,Date of Receiving\n").unwrap();

    let mut db = store();
    let mut ledger = Ledger::default();
    csv_io::import_file::<Expense>(&mut db, &mut ledger, &paths.expenses).unwrap();
    assert_eq!(expense_count(&db), 1);

    let report = sync::sync(&mut db, &mut ledger, &paths).unwrap();
    assert!(report.performed);
    assert_eq!(report.inserted, 0);
    assert_eq!(expense_count(&db), 1);
}

#[test]
fn amount_text_is_canonical_for_dedup() {
    // 20.00 and 20 are the same amount; full-field equality must agree.
    let f = csv_file(&format!(
        "{}\nFood,20.00,2025-03-01,Cafe,false\nFood,20,2025-03-01,Cafe,false\n",
        EXPENSE_HEADER
    ));
    let mut db = store();
    let mut ledger = Ledger::default();
    csv_io::import_file::<Expense>(&mut db, &mut ledger, f.path()).unwrap();
    assert_eq!(expense_count(&db), 1);
}

#[test]
fn degraded_import_is_memory_only() {
    let f = csv_file(&format!("{}\nFood,20,2025-03-01,Cafe,false\n", EXPENSE_HEADER));
    let mut db = Database::detached();
    let mut ledger = Ledger::default();

    let report = csv_io::import_file::<Expense>(&mut db, &mut ledger, f.path()).unwrap();
    assert_eq!(report.appended, 1);
    assert_eq!(report.inserted, None);
    assert_eq!(ledger.expenses.len(), 1);
}

#[test]
fn importer_trims_cli_path_argument() {
    let dir = tempfile::tempdir().unwrap();
    let paths = CsvPaths::in_dir(dir.path());
    std::fs::write(
        &paths.expenses,
        format!("{}\nFood,20,2025-03-01,Cafe,false\n", EXPENSE_HEADER),
    )
    .unwrap();
    std::fs::write(&paths.received, "Sender,Amount,Date of Receiving\n").unwrap();

    let padded_expenses = format!("  {}  ", paths.expenses.display());
    let padded_received = format!("  {}  ", paths.received.display());
    let cli = cli::build_cli();
    let matches = cli.get_matches_from([
        "outlay",
        "import",
        "--expenses",
        &padded_expenses,
        "--received",
        &padded_received,
    ]);
    let Some(("import", import_m)) = matches.subcommand() else {
        panic!("no import subcommand");
    };

    let mut db = store();
    let mut ledger = Ledger::default();
    importer::handle(&mut db, &mut ledger, import_m).unwrap();
    assert_eq!(expense_count(&db), 1);
    assert_eq!(ledger.expenses.len(), 1);
}
