// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use crate::commands::importer::source_paths;
use crate::db::Database;
use crate::ledger::Ledger;
use crate::sync;

pub fn handle(db: &mut Database, ledger: &mut Ledger, m: &clap::ArgMatches) -> Result<()> {
    let paths = source_paths(m)?;
    match sync::sync(db, ledger, &paths) {
        Ok(report) if !report.performed => {
            println!("No persistent store. Syncing skipped.");
        }
        Ok(report) => {
            println!(
                "Sync complete: {} row(s) examined, {} added.",
                report.examined, report.inserted
            );
            for row in &report.skipped {
                println!("Skipped {}", row);
            }
        }
        Err(e) => {
            eprintln!("warning: sync failed, all changes rolled back: {}", e);
        }
    }
    Ok(())
}
