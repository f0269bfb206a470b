// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use outlay::{cli, commands, csv_io, db, ledger::Ledger};

fn main() -> Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let mut db = db::Database::open();
    let mut ledger = Ledger::default();
    let paths = csv_io::CsvPaths::in_dir(&db::data_dir()?);
    csv_io::load_ledger(&mut ledger, &paths);

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", db::db_path()?.display());
        }
        Some(("add", sub)) => commands::entries::handle(&mut db, &mut ledger, sub)?,
        Some(("list", sub)) => commands::listing::handle(&mut db, &ledger, sub)?,
        Some(("total", sub)) => commands::summary::totals(&mut db, &ledger, sub)?,
        Some(("balance", sub)) => commands::summary::balance(&mut db, &ledger, sub)?,
        Some(("prior", sub)) => commands::summary::prior(&db, sub)?,
        Some(("import", sub)) => commands::importer::handle(&mut db, &mut ledger, sub)?,
        Some(("sync", sub)) => commands::syncer::handle(&mut db, &mut ledger, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&ledger, sub)?,
        Some(("config", sub)) => commands::config::handle(&db, sub)?,
        Some(("doctor", _)) => commands::doctor::handle(&db)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
