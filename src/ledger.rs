// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{Expense, Receipt, Record};

/// The in-memory record store: ordered, append-only, and the fallback data
/// source whenever the persistent store is unavailable.
///
/// Constructed once at startup and passed by reference into every component;
/// nothing reads ambient state. Insertion order is preserved.
#[derive(Debug, Default)]
pub struct Ledger {
    pub expenses: Vec<Expense>,
    pub receipts: Vec<Receipt>,
}

impl Ledger {
    pub fn push<R: Record>(&mut self, rec: R) {
        R::ledger_push(self, rec);
    }

    pub fn records<R: Record>(&self) -> &[R] {
        R::ledger_slice(self)
    }
}
