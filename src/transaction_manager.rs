// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Append-only transaction ledger.
//!
//! The manager is the only source of transaction ids. Ids come from a
//! dedicated counter rather than the ledger length, so an id is never handed
//! out twice even if the ledger were ever pruned.

use crate::DiningError;
use crate::base::{ReservationId, StudentId, TransactionId};
use crate::transaction::{Transaction, TransactionStatus};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Ordered, append-only ledger with id lookup.
///
/// A [`DashMap`] indexes transactions by id for O(1) duplicate checks and
/// lookups; the [`RwLock`]ed vector keeps insertion order for reporting.
#[derive(Debug)]
pub struct TransactionManager {
    /// Next id to hand out.
    next_id: AtomicU32,

    /// Index for duplicate detection and `find_by_id`.
    index: DashMap<TransactionId, Arc<Transaction>>,

    /// Transactions in the order they were added.
    ledger: RwLock<Vec<Arc<Transaction>>>,
}

impl TransactionManager {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Ledger whose first id is `first`.
    pub(crate) fn starting_at(first: u32) -> Self {
        Self {
            next_id: AtomicU32::new(first),
            index: DashMap::new(),
            ledger: RwLock::new(Vec::new()),
        }
    }

    /// Reserves the next transaction id. Strictly increasing, starting at 1.
    ///
    /// # Errors
    ///
    /// [`DiningError::IdsExhausted`] once the counter would pass `u32::MAX`;
    /// the counter never wraps, so an id is never handed out twice.
    pub fn next_id(&self) -> Result<TransactionId, DiningError> {
        self.next_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |id| id.checked_add(1))
            .map(TransactionId)
            .map_err(|_| DiningError::IdsExhausted)
    }

    /// Appends a transaction to the ledger.
    ///
    /// # Errors
    ///
    /// [`DiningError::DuplicateTransaction`] if the id is already recorded.
    pub fn add(&self, transaction: Transaction) -> Result<Arc<Transaction>, DiningError> {
        let id = transaction.id();

        // Hold the ledger lock across the index insert so both views agree on order.
        let mut ledger = self.ledger.write();
        match self.index.entry(id) {
            Entry::Occupied(_) => Err(DiningError::DuplicateTransaction(id)),
            Entry::Vacant(entry) => {
                let transaction = Arc::new(transaction);
                entry.insert(Arc::clone(&transaction));
                ledger.push(Arc::clone(&transaction));
                Ok(transaction)
            }
        }
    }

    /// Creates a transaction with a fresh id and appends it.
    pub fn record(
        &self,
        student: StudentId,
        reservation: ReservationId,
        amount: Decimal,
        status: TransactionStatus,
    ) -> Result<Arc<Transaction>, DiningError> {
        let mut recorded = self.record_batch(student, &[(reservation, amount)], status)?;
        recorded.pop().ok_or(DiningError::IdsExhausted)
    }

    /// Appends one transaction per `(reservation, amount)` pair, in order.
    ///
    /// Ids already taken by a hand-added transaction are skipped. Either every
    /// transaction of the batch is appended or none is.
    ///
    /// # Errors
    ///
    /// [`DiningError::IdsExhausted`] if the counter runs out before every item
    /// has an id; the ledger is left unchanged.
    pub fn record_batch(
        &self,
        student: StudentId,
        items: &[(ReservationId, Decimal)],
        status: TransactionStatus,
    ) -> Result<Vec<Arc<Transaction>>, DiningError> {
        // `add` takes the ledger lock before touching the index, so no id can
        // be claimed between the vacancy check and the insert below.
        let mut ledger = self.ledger.write();

        let mut batch = Vec::with_capacity(items.len());
        for (reservation, amount) in items {
            let id = loop {
                let id = self.next_id()?;
                if !self.index.contains_key(&id) {
                    break id;
                }
            };
            batch.push(Arc::new(Transaction::new(
                id,
                student,
                *reservation,
                *amount,
                status,
            )));
        }

        for transaction in &batch {
            self.index.insert(transaction.id(), Arc::clone(transaction));
            ledger.push(Arc::clone(transaction));
        }
        Ok(batch)
    }

    pub fn find_by_id(&self, id: TransactionId) -> Option<Arc<Transaction>> {
        self.index.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Snapshot of the whole ledger in insertion order.
    pub fn transactions(&self) -> Vec<Arc<Transaction>> {
        self.ledger.read().clone()
    }

    /// Snapshot of one student's transactions in insertion order.
    pub fn for_student(&self, student: StudentId) -> Vec<Arc<Transaction>> {
        self.ledger
            .read()
            .iter()
            .filter(|t| t.student_id() == student)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.ledger.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ledger.read().is_empty()
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new()
    }
}
