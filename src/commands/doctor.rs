// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use crate::db::{self, Database};
use crate::models::MonthKey;
use crate::utils::pretty_table;

pub fn handle(db: &Database) -> Result<()> {
    let Some(conn) = db.connection() else {
        println!("No persistent store; nothing to check.");
        return Ok(());
    };
    let mut rows: Vec<Vec<String>> = Vec::new();

    // 1) Every month with expense rows should have a partition table that
    //    holds a copy of each row.
    let months: Vec<MonthKey> = {
        let mut stmt = conn.prepare("SELECT DISTINCT substr(date,1,7) FROM expenses ORDER BY 1")?;
        let mut cur = stmt.query([])?;
        let mut keys = Vec::new();
        while let Some(r) = cur.next()? {
            let prefix: String = r.get(0)?;
            match MonthKey::from_prefix(&prefix) {
                Some(key) => keys.push(key),
                None => rows.push(vec!["unparsable_month".into(), prefix]),
            }
        }
        keys
    };
    for key in months {
        if !db::partition_exists(conn, key)? {
            rows.push(vec!["missing_partition".into(), key.to_string()]);
            continue;
        }
        let lag = db::partition_lag(conn, key)?;
        if lag > 0 {
            rows.push(vec![
                "partition_behind".into(),
                format!("{} ({} row(s) not mirrored)", key, lag),
            ]);
        }
    }

    // 2) Stored amounts must be non-negative.
    for table in ["expenses", "received"] {
        let negative: i64 = conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM {} WHERE CAST(amount AS REAL) < 0",
                table
            ),
            [],
            |r| r.get(0),
        )?;
        if negative > 0 {
            rows.push(vec![
                "negative_amount".into(),
                format!("{} row(s) in {}", negative, table),
            ]);
        }
    }

    if rows.is_empty() {
        println!("doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
