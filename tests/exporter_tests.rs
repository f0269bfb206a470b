// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use outlay::csv_io;
use outlay::ledger::Ledger;
use outlay::models::{Expense, Receipt};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn sample_ledger() -> Ledger {
    let mut ledger = Ledger::default();
    ledger.push(Expense {
        category: "Food".into(),
        amount: dec("20.00"),
        date: date(2025, 3, 1),
        place: "Cafe".into(),
        autopay: false,
    });
    ledger.push(Expense {
        category: "Travel".into(),
        amount: dec("50"),
        date: date(2025, 4, 1),
        place: "Station".into(),
        autopay: true,
    });
    ledger.push(Receipt {
        sender: "Employer".into(),
        amount: dec("1000"),
        date: date(2025, 3, 5),
    });
    ledger
}

#[test]
fn export_writes_header_and_rows_that_reimport_identically() {
    let ledger = sample_ledger();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("expenses.csv");

    let written = csv_io::export_file::<Expense>(&ledger, &path).unwrap();
    assert_eq!(written, 2);

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("Category,Amount,Date,Place of Spending,Auto-Pay"));

    let (records, skipped) = csv_io::read_records::<Expense>(&path).unwrap();
    assert!(skipped.is_empty());
    assert_eq!(records, ledger.expenses);
}

#[test]
fn monthly_export_names_files_from_the_partition_key() {
    let ledger = sample_ledger();
    let dir = tempfile::tempdir().unwrap();

    let written = csv_io::export_monthly::<Expense>(&ledger, dir.path()).unwrap();
    assert_eq!(written.len(), 2);
    assert!(dir.path().join("expenses_2025_03.csv").is_file());
    assert!(dir.path().join("expenses_2025_04.csv").is_file());
    assert_eq!(written[0].2, 1);
    assert_eq!(written[1].2, 1);

    let written = csv_io::export_monthly::<Receipt>(&ledger, dir.path()).unwrap();
    assert_eq!(written.len(), 1);
    assert!(dir.path().join("received_2025_03.csv").is_file());

    assert_eq!(written[0].0.to_string(), "2025-03");
}

#[test]
fn monthly_export_with_empty_ledger_writes_nothing() {
    let ledger = Ledger::default();
    let dir = tempfile::tempdir().unwrap();
    let written = csv_io::export_monthly::<Expense>(&ledger, dir.path()).unwrap();
    assert!(written.is_empty());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
