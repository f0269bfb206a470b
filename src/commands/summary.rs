// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rust_decimal::Decimal;

use crate::db::Database;
use crate::ledger::Ledger;
use crate::models::{Expense, Receipt, Record};
use crate::totals::{self, TotalSource};
use crate::utils::{currency_symbol, fmt_money, maybe_print_json, parse_amount, parse_month};

pub fn totals(db: &mut Database, ledger: &Ledger, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("expenses", sub)) => show_total::<Expense>(db, ledger, sub, "Expenses"),
        Some(("received", sub)) => show_total::<Receipt>(db, ledger, sub, "Received"),
        _ => Ok(()),
    }
}

fn show_total<R: Record>(
    db: &mut Database,
    ledger: &Ledger,
    sub: &clap::ArgMatches,
    label: &str,
) -> Result<()> {
    let month = sub.get_one::<String>("month").map(|s| parse_month(s)).transpose()?;
    let total = totals::total::<R>(db, ledger, month);
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &total)? {
        return Ok(());
    }
    let symbol = currency_symbol(db);
    let month_str = month.map(|k| format!(" for {}", k)).unwrap_or_default();
    match total.source {
        TotalSource::Store => println!(
            "Total {}{}: {}",
            label,
            month_str,
            fmt_money(total.amount, &symbol)
        ),
        TotalSource::Memory => println!(
            "Total {}{}: {} (from in-memory records)",
            label,
            month_str,
            fmt_money(total.amount, &symbol)
        ),
    }
    Ok(())
}

pub fn balance(db: &mut Database, ledger: &Ledger, sub: &clap::ArgMatches) -> Result<()> {
    let month = sub.get_one::<String>("month").map(|s| parse_month(s)).transpose()?;
    let prior = match sub.get_one::<String>("prior") {
        Some(s) => parse_amount(s)?,
        None => {
            let path = totals::prior_balance_path()?;
            match totals::read_prior_balance(&path) {
                Ok(d) => d,
                Err(e) => {
                    eprintln!("warning: {}; using 0", e);
                    Decimal::ZERO
                }
            }
        }
    };

    let sheet = totals::balance(db, ledger, month, prior);
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &sheet)? {
        return Ok(());
    }
    let symbol = currency_symbol(db);
    let month_str = month.map(|k| format!(" for {}", k)).unwrap_or_default();
    println!(
        "Total Expenses{}: {}",
        month_str,
        fmt_money(sheet.total_expenses, &symbol)
    );
    println!(
        "Total Received{}: {}",
        month_str,
        fmt_money(sheet.total_received, &symbol)
    );
    println!("Prior Balance: {}", fmt_money(sheet.prior, &symbol));
    println!(
        "Account Balance: {}",
        fmt_money(sheet.account_balance, &symbol)
    );
    println!("Amount Left: {}", fmt_money(sheet.amount_left, &symbol));
    if sheet.amount_needed > Decimal::ZERO {
        println!("Amount Needed: {}", fmt_money(sheet.amount_needed, &symbol));
    }
    Ok(())
}

pub fn prior(db: &Database, m: &clap::ArgMatches) -> Result<()> {
    let path = totals::prior_balance_path()?;
    match m.subcommand() {
        Some(("set", sub)) => {
            let amount = parse_amount(sub.get_one::<String>("amount").unwrap())?;
            totals::write_prior_balance(&path, amount)?;
            println!(
                "Prior balance set to {}",
                fmt_money(amount, &currency_symbol(db))
            );
        }
        Some(("show", _)) => {
            let amount = totals::read_prior_balance(&path)?;
            println!("Prior balance: {}", fmt_money(amount, &currency_symbol(db)));
        }
        _ => {}
    }
    Ok(())
}
