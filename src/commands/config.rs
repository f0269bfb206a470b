// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, bail};

use crate::db::Database;
use crate::utils::{currency_symbol, set_currency_symbol};

pub fn handle(db: &Database, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("currency", sub)) => currency(db, sub),
        _ => Ok(()),
    }
}

fn currency(db: &Database, sub: &clap::ArgMatches) -> Result<()> {
    match sub.get_one::<String>("symbol") {
        Some(symbol) => {
            let Some(conn) = db.connection() else {
                bail!("No persistent store; the currency symbol cannot be saved");
            };
            set_currency_symbol(conn, symbol)?;
            println!("Currency symbol set to '{}'", symbol);
        }
        None => println!("Currency symbol: '{}'", currency_symbol(db)),
    }
    Ok(())
}
