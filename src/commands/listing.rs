// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use crate::db::Database;
use crate::error::QueryError;
use crate::ledger::Ledger;
use crate::models::{Expense, Receipt};
use crate::query::{self, Filter};
use crate::utils::{currency_symbol, fmt_money, maybe_print_json, parse_date, parse_month, pretty_table};

pub fn handle(db: &mut Database, ledger: &Ledger, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("expenses", sub)) => expenses(db, ledger, sub),
        Some(("received", sub)) => received(db, ledger, sub),
        _ => Ok(()),
    }
}

fn date_bounds(sub: &clap::ArgMatches) -> Result<(Option<chrono::NaiveDate>, Option<chrono::NaiveDate>)> {
    let from = sub.get_one::<String>("from").map(|s| parse_date(s)).transpose()?;
    let to = sub.get_one::<String>("to").map(|s| parse_date(s)).transpose()?;
    Ok((from, to))
}

fn expenses(db: &mut Database, ledger: &Ledger, sub: &clap::ArgMatches) -> Result<()> {
    let (date_start, date_end) = date_bounds(sub)?;
    let category = sub.get_one::<String>("category").cloned();
    let month = sub.get_one::<String>("month").map(|s| parse_month(s)).transpose()?;
    let filter = Filter {
        date_start,
        date_end,
        key: category.as_ref().map(|_| "category".to_string()),
        value: category,
        month,
    };

    let rows = match query::filter::<Expense>(db, ledger, &filter) {
        Ok(rows) => rows,
        Err(e @ QueryError::MissingPartition(_)) => {
            println!("{}.", e);
            return Ok(());
        }
        Err(e) => {
            eprintln!("warning: {}; showing no rows", e);
            Vec::new()
        }
    };
    if rows.is_empty() {
        println!("No expenses match the filter.");
        return Ok(());
    }

    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
        let symbol = currency_symbol(db);
        let data = rows
            .iter()
            .map(|e| {
                vec![
                    e.date.to_string(),
                    fmt_money(e.amount, &symbol),
                    e.category.clone(),
                    e.place.clone(),
                    e.autopay.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Date", "Amount", "Category", "Place", "Auto-Pay"], data)
        );
    }
    Ok(())
}

fn received(db: &mut Database, ledger: &Ledger, sub: &clap::ArgMatches) -> Result<()> {
    let (date_start, date_end) = date_bounds(sub)?;
    let sender = sub.get_one::<String>("sender").cloned();
    let filter = Filter {
        date_start,
        date_end,
        key: sender.as_ref().map(|_| "sender".to_string()),
        value: sender,
        month: None,
    };

    let rows = match query::filter::<Receipt>(db, ledger, &filter) {
        Ok(rows) => rows,
        Err(e) => {
            eprintln!("warning: {}; showing no rows", e);
            Vec::new()
        }
    };
    if rows.is_empty() {
        println!("No received amounts match the filter.");
        return Ok(());
    }

    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
        let symbol = currency_symbol(db);
        let data = rows
            .iter()
            .map(|r| {
                vec![
                    r.date.to_string(),
                    fmt_money(r.amount, &symbol),
                    r.sender.clone(),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Date", "Amount", "Sender"], data));
    }
    Ok(())
}
