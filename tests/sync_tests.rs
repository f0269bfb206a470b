// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::Connection;
use tempfile::TempDir;

use outlay::csv_io::CsvPaths;
use outlay::db::{self, Database};
use outlay::error::LedgerError;
use outlay::ledger::Ledger;
use outlay::models::MonthKey;
use outlay::sync;

fn store() -> Database {
    Database::with_connection(Connection::open_in_memory().unwrap()).unwrap()
}

fn write_sources(expense_rows: &str, received_rows: &str) -> (TempDir, CsvPaths) {
    let dir = tempfile::tempdir().unwrap();
    let paths = CsvPaths::in_dir(dir.path());
    std::fs::write(
        &paths.expenses,
        format!("Category,Amount,Date,Place of Spending,Auto-Pay\n{}", expense_rows),
    )
    .unwrap();
    std::fs::write(
        &paths.received,
        format!("Sender,Amount,Date of Receiving\n{}", received_rows),
    )
    .unwrap();
    (dir, paths)
}

fn count(db: &Database, table: &str) -> i64 {
    db.connection()
        .unwrap()
        .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
        .unwrap()
}

#[test]
fn sync_inserts_missing_rows_and_mirrors_ledger() {
    let (_dir, paths) = write_sources(
        "Food,20,2025-03-01,Cafe,false\nRent,800,2025-03-02,Home,true\n",
        "Employer,1000,2025-03-05\n",
    );
    let mut db = store();
    let mut ledger = Ledger::default();

    let report = sync::sync(&mut db, &mut ledger, &paths).unwrap();
    assert!(report.performed);
    assert_eq!(report.examined, 3);
    assert_eq!(report.inserted, 3);
    assert_eq!(count(&db, "expenses"), 2);
    assert_eq!(count(&db, "received"), 1);
    assert_eq!(ledger.expenses.len(), 2);
    assert_eq!(ledger.receipts.len(), 1);
}

#[test]
fn sync_twice_adds_nothing_the_second_time() {
    let (_dir, paths) = write_sources(
        "Food,20,2025-03-01,Cafe,false\n",
        "Employer,1000,2025-03-05\n",
    );
    let mut db = store();
    let mut ledger = Ledger::default();

    sync::sync(&mut db, &mut ledger, &paths).unwrap();
    let after_first = (count(&db, "expenses"), count(&db, "received"));

    let report = sync::sync(&mut db, &mut ledger, &paths).unwrap();
    assert_eq!(report.inserted, 0);
    assert_eq!(
        (count(&db, "expenses"), count(&db, "received")),
        after_first
    );
    assert_eq!(ledger.expenses.len(), 1);
}

#[test]
fn sync_creates_month_partition_lazily() {
    let (_dir, paths) = write_sources(
        "Food,20,2025-03-01,Cafe,false\nTravel,50,2025-04-01,Station,false\n",
        "",
    );
    let mut db = store();
    let mut ledger = Ledger::default();
    sync::sync(&mut db, &mut ledger, &paths).unwrap();

    let conn = db.connection().unwrap();
    let march = MonthKey { year: 2025, month: 3 };
    let april = MonthKey { year: 2025, month: 4 };
    assert!(db::partition_exists(conn, march).unwrap());
    assert!(db::partition_exists(conn, april).unwrap());
    assert_eq!(db::partitions(conn).unwrap(), vec![march, april]);
    assert_eq!(db::partition_lag(conn, march).unwrap(), 0);
}

#[test]
fn sync_without_store_is_a_reported_noop() {
    let (_dir, paths) = write_sources("Food,20,2025-03-01,Cafe,false\n", "");
    let mut db = Database::detached();
    let mut ledger = Ledger::default();

    let report = sync::sync(&mut db, &mut ledger, &paths).unwrap();
    assert!(!report.performed);
    assert_eq!(report.inserted, 0);
    assert!(ledger.expenses.is_empty());
}

#[test]
fn sync_rolls_back_every_write_on_store_failure() {
    let (_dir, paths) = write_sources(
        "Food,20,2025-03-01,Cafe,false\nRent,800,2025-03-02,Home,true\n",
        "Employer,1000,2025-03-05\n",
    );
    let mut db = store();
    // Break the second half of the pass: the received inserts will fail.
    db.connection()
        .unwrap()
        .execute("DROP TABLE received", [])
        .unwrap();
    let mut ledger = Ledger::default();

    let err = sync::sync(&mut db, &mut ledger, &paths).unwrap_err();
    assert!(matches!(err, LedgerError::Store(_)));
    // The whole transaction rolled back and the handle degraded.
    assert!(!db.is_connected());
    // Ledger appends from the successful steps are kept.
    assert_eq!(ledger.expenses.len(), 2);
}

#[test]
fn sync_reports_skipped_rows_without_aborting() {
    let (_dir, paths) = write_sources(
        "Food,abc,2025-03-01,Cafe,false\nRent,800,2025-03-02,Home,true\n",
        "",
    );
    let mut db = store();
    let mut ledger = Ledger::default();

    let report = sync::sync(&mut db, &mut ledger, &paths).unwrap();
    assert_eq!(report.examined, 1);
    assert_eq!(report.inserted, 1);
    assert_eq!(report.skipped.len(), 1);
    assert!(report.skipped[0].reason.contains("Invalid decimal 'abc'"));
    assert_eq!(count(&db, "expenses"), 1);
}

#[test]
fn sync_with_missing_source_files_syncs_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let paths = CsvPaths::in_dir(dir.path());
    let mut db = store();
    let mut ledger = Ledger::default();

    let report = sync::sync(&mut db, &mut ledger, &paths).unwrap();
    assert!(report.performed);
    assert_eq!(report.examined, 0);
    assert_eq!(report.inserted, 0);
}
