// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::models::MonthKey;

/// Failure taxonomy for ledger-facing operations.
///
/// `Validation` is scoped to a single call or file and never aborts a batch
/// that has already started; `Store` triggers rollback of the current write
/// unit and the degraded in-memory fallback; `Resource` means a file was
/// missing or unreadable and the operation proceeds with in-memory data.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{0}")]
    Validation(String),
    #[error("persistent store error: {0}")]
    Store(#[from] rusqlite::Error),
    #[error("cannot read {}: {source}", path.display())]
    Resource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from the query/filter engine. A store failure here degrades the
/// connection; callers render it as a warning plus an empty result.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("monthly table for {0} does not exist")]
    MissingPartition(MonthKey),
    #[error("'{0}' is not a filterable column")]
    InvalidKey(String),
    #[error("persistent store error: {0}")]
    Store(#[from] rusqlite::Error),
}

/// One row that failed validation during import or sync. Row failures are
/// collected into batch reports; they never fail the batch.
#[derive(Debug, Clone, Serialize)]
pub struct RowError {
    pub line: u64,
    pub reason: String,
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.reason)
    }
}
