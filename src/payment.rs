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

//! Settlement of a shopping cart against a student's balance.
//!
//! # Algorithm
//!
//! 1. Snapshot the cart in insertion order. An empty cart settles to
//!    [`Settlement::Empty`] without side effects.
//! 2. Sum the current price of every `NOT_PAID` entry, once per reservation
//!    id. Entries already settled elsewhere are skipped.
//! 3. If the balance does not cover the sum, every pending entry becomes
//!    `FAILED` and nothing else changes (no debit, no transaction).
//! 4. Otherwise the `COMPLETED` transactions of the whole batch are appended
//!    to the ledger first; this is the last step that can fail. Then each
//!    pending entry, in order, is marked `SUCCESS`, debited and appended to
//!    the history.
//! 5. The cart is cleared in both cases.
//!
//! Steps 2 through 4 run under the student's lock, so two settlements for the
//! same student cannot both pass the affordability check on a stale balance.

use crate::DiningError;
use crate::base::{ReservationId, TransactionId};
use crate::cart::ShoppingCart;
use crate::journal::{Journal, best_effort};
use crate::reservation::{Reservation, ReservationStatus};
use crate::student::Student;
use crate::transaction::{Transaction, TransactionStatus};
use crate::transaction_manager::TransactionManager;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Outcome of one settlement attempt.
///
/// Insufficient balance is a normal outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    /// The cart held nothing.
    Empty,
    /// Every pending reservation was paid.
    Committed {
        total: Decimal,
        balance: Decimal,
        reservations: Vec<ReservationId>,
        transactions: Vec<TransactionId>,
    },
    /// The balance could not cover the batch; every pending reservation failed.
    Rejected {
        total: Decimal,
        balance: Decimal,
        reservations: Vec<ReservationId>,
    },
}

impl Settlement {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }
}

impl fmt::Display for Settlement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Cart is empty, nothing to settle"),
            Self::Committed {
                total,
                balance,
                reservations,
                ..
            } => write!(
                f,
                "Payment successful: {} reservation(s) for {}, remaining balance {}",
                reservations.len(),
                total,
                balance
            ),
            Self::Rejected { total, balance, .. } => write!(
                f,
                "Insufficient balance: {} required, {} available",
                total, balance
            ),
        }
    }
}

/// Settles carts and records the resulting transactions.
pub struct PaymentProcessor {
    ledger: Arc<TransactionManager>,
    journal: Option<Arc<dyn Journal>>,
}

impl PaymentProcessor {
    pub fn new(ledger: Arc<TransactionManager>) -> Self {
        Self {
            ledger,
            journal: None,
        }
    }

    /// Attaches a journal that receives every settled reservation and
    /// transaction after the settlement has committed.
    pub fn with_journal(mut self, journal: Arc<dyn Journal>) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn ledger(&self) -> &Arc<TransactionManager> {
        &self.ledger
    }

    /// Settles all pending reservations in `cart` against `student`'s balance.
    ///
    /// # Errors
    ///
    /// Only for contract violations, all detected before any mutation:
    /// - [`DiningError::StudentInactive`] - the student account is disabled; the cart is kept.
    /// - [`DiningError::StudentMismatch`] - the cart holds another student's reservation.
    pub fn settle(
        &self,
        student: &Student,
        cart: &mut ShoppingCart,
    ) -> Result<Settlement, DiningError> {
        if !student.is_active() {
            return Err(DiningError::StudentInactive);
        }

        let snapshot = cart.snapshot();
        if snapshot.is_empty() {
            tracing::info!(student = %student.id(), "nothing to settle");
            return Ok(Settlement::Empty);
        }
        if snapshot.iter().any(|r| r.student_id() != student.id()) {
            return Err(DiningError::StudentMismatch);
        }

        let mut account = student.account();

        // Prices are read once so the check and the debits agree even if a
        // meal is repriced mid-settlement.
        let mut seen = HashSet::new();
        let pending: Vec<(Arc<Reservation>, Decimal)> = snapshot
            .into_iter()
            .filter(|r| r.status() == ReservationStatus::NotPaid && seen.insert(r.id()))
            .map(|r| {
                let price = r.price();
                (r, price)
            })
            .collect();
        let total: Decimal = pending.iter().map(|(_, price)| *price).sum();
        let reservations: Vec<ReservationId> = pending.iter().map(|(r, _)| r.id()).collect();

        if account.balance() < total {
            for (reservation, _) in &pending {
                reservation.mark_settled(false)?;
            }
            let balance = account.balance();
            drop(account);
            cart.clear();

            tracing::info!(
                student = %student.id(),
                %total,
                %balance,
                count = pending.len(),
                "settlement rejected: insufficient balance"
            );
            let settlement = Settlement::Rejected {
                total,
                balance,
                reservations,
            };
            self.journal_outcome(&pending, &[], &settlement);
            return Ok(settlement);
        }

        let items: Vec<(ReservationId, Decimal)> =
            pending.iter().map(|(r, price)| (r.id(), *price)).collect();
        let recorded = self
            .ledger
            .record_batch(student.id(), &items, TransactionStatus::Completed)?;

        // Every pending entry was NOT_PAID under this student's lock and
        // appears once, so these transitions cannot fail.
        for (reservation, price) in &pending {
            reservation.mark_settled(true)?;
            account.debit(*price);
            account.append_to_history(Arc::clone(reservation));
        }
        let balance = account.balance();
        drop(account);
        cart.clear();

        tracing::info!(
            student = %student.id(),
            %total,
            %balance,
            count = pending.len(),
            "settlement committed"
        );
        let settlement = Settlement::Committed {
            total,
            balance,
            reservations,
            transactions: recorded.iter().map(|t| t.id()).collect(),
        };
        self.journal_outcome(&pending, &recorded, &settlement);
        Ok(settlement)
    }

    fn journal_outcome(
        &self,
        reservations: &[(Arc<Reservation>, Decimal)],
        transactions: &[Arc<Transaction>],
        settlement: &Settlement,
    ) {
        let Some(journal) = &self.journal else {
            return;
        };
        for (reservation, price) in reservations {
            best_effort(
                journal.record_reservation(reservation, *price),
                "reservation record",
            );
        }
        for transaction in transactions {
            best_effort(journal.record_transaction(transaction), "transaction record");
        }
        best_effort(journal.log_line(&settlement.to_string()), "log line");
    }
}
