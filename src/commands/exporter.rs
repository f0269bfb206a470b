// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::PathBuf;

use anyhow::Result;

use crate::csv_io::{self, CsvPaths};
use crate::db;
use crate::ledger::Ledger;
use crate::models::{Expense, Receipt, Record};

pub fn handle(ledger: &Ledger, m: &clap::ArgMatches) -> Result<()> {
    let dir = match m.get_one::<String>("dir") {
        Some(d) => PathBuf::from(d.trim()),
        None => db::data_dir()?,
    };

    if m.get_flag("monthly") {
        export_monthly::<Expense>(ledger, &dir)?;
        export_monthly::<Receipt>(ledger, &dir)?;
        println!("Data saved to monthly CSV files successfully.");
    } else {
        let paths = CsvPaths::in_dir(&dir);
        let n = csv_io::export_file::<Expense>(ledger, &paths.expenses)?;
        println!("Saved {} expense row(s) to '{}'", n, paths.expenses.display());
        let n = csv_io::export_file::<Receipt>(ledger, &paths.received)?;
        println!("Saved {} received row(s) to '{}'", n, paths.received.display());
    }
    Ok(())
}

fn export_monthly<R: Record>(ledger: &Ledger, dir: &std::path::Path) -> Result<()> {
    let written = csv_io::export_monthly::<R>(ledger, dir)?;
    if written.is_empty() {
        println!("No {} data to save.", R::KIND.noun());
    }
    for (key, path, rows) in written {
        println!(
            "Saved {} {} row(s) for {} to '{}'",
            rows,
            R::KIND.noun(),
            key,
            path.display()
        );
    }
    Ok(())
}
