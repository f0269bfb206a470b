// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, bail};
use rusqlite::Connection;

use crate::db::Database;
use crate::ledger::Ledger;
use crate::models::{Expense, Receipt, Record};
use crate::utils::{currency_symbol, fmt_money, parse_amount, parse_date_lenient};

pub fn handle(db: &mut Database, ledger: &mut Ledger, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("expense", sub)) => add_expense(db, ledger, sub),
        Some(("received", sub)) => add_received(db, ledger, sub),
        _ => Ok(()),
    }
}

fn add_expense(db: &mut Database, ledger: &mut Ledger, sub: &clap::ArgMatches) -> Result<()> {
    let category = sub.get_one::<String>("category").unwrap().trim().to_string();
    if category.is_empty() {
        bail!("Category cannot be empty");
    }
    let amount = parse_amount(sub.get_one::<String>("amount").unwrap())?;
    let date = parse_date_lenient(sub.get_one::<String>("date").unwrap())?;
    let place = sub.get_one::<String>("place").unwrap().trim().to_string();
    let autopay = sub.get_flag("autopay");

    let symbol = currency_symbol(db);
    let expense = Expense {
        category,
        amount,
        date,
        place,
        autopay,
    };
    ledger.push(expense.clone());
    store_record(db, &expense);
    println!(
        "Recorded expense: {}, {}, {}",
        expense.category,
        fmt_money(expense.amount, &symbol),
        expense.date
    );
    Ok(())
}

fn add_received(db: &mut Database, ledger: &mut Ledger, sub: &clap::ArgMatches) -> Result<()> {
    let sender = sub.get_one::<String>("sender").unwrap().trim().to_string();
    if sender.is_empty() {
        bail!("Sender cannot be empty");
    }
    let amount = parse_amount(sub.get_one::<String>("amount").unwrap())?;
    let date = parse_date_lenient(sub.get_one::<String>("date").unwrap())?;

    let symbol = currency_symbol(db);
    let receipt = Receipt {
        sender,
        amount,
        date,
    };
    ledger.push(receipt.clone());
    store_record(db, &receipt);
    println!(
        "Recorded received: {}, {}, {}",
        receipt.sender,
        fmt_money(receipt.amount, &symbol),
        receipt.date
    );
    Ok(())
}

/// Manual entries insert directly (no dedup probe: entering the same expense
/// twice on purpose is legitimate). The expense partition is maintained in
/// the same transaction; a store failure keeps the ledger entry and degrades.
fn store_record<R: Record>(db: &mut Database, rec: &R) {
    let written = db.connection_mut().map(|conn| write_one(conn, rec));
    if let Some(Err(e)) = written {
        eprintln!("warning: store insert failed: {}", e);
        db.degrade();
    }
}

fn write_one<R: Record>(conn: &mut Connection, rec: &R) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    rec.insert(&tx)?;
    rec.mirror_partition(&tx)?;
    tx.commit()
}
