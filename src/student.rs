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

//! Students, their balance and their committed reservation history.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use dining_ledger_rs::{Student, StudentId};
//!
//! let student = Student::new(StudentId(1), "S-001", "Ada", "ada@campus.edu", dec!(20)).unwrap();
//! assert_eq!(student.balance(), dec!(20));
//! assert!(student.reservations().is_empty());
//! ```

use crate::DiningError;
use crate::base::{Describe, StudentId};
use crate::catalog::Meal;
use crate::reservation::{Reservation, ReservationStatus};
use parking_lot::{Mutex, MutexGuard};
use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Balance and committed history, always accessed under the student's lock.
#[derive(Debug)]
pub struct StudentAccount {
    balance: Decimal,
    /// Reservations that were paid, in settlement order.
    reservations: Vec<Arc<Reservation>>,
}

impl StudentAccount {
    fn new(balance: Decimal) -> Self {
        Self {
            balance,
            reservations: Vec::new(),
        }
    }

    fn assert_invariants(&self) {
        debug_assert!(
            self.balance >= Decimal::ZERO,
            "Invariant violated: balance went negative: {}",
            self.balance
        );
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn set_balance(&mut self, balance: Decimal) -> Result<(), DiningError> {
        if balance < Decimal::ZERO {
            return Err(DiningError::InvalidAmount);
        }
        self.balance = balance;
        Ok(())
    }

    pub fn append_to_history(&mut self, reservation: Arc<Reservation>) {
        self.reservations.push(reservation);
    }

    pub fn reservations(&self) -> &[Arc<Reservation>] {
        &self.reservations
    }

    /// Decreases the balance. The caller has already checked affordability.
    pub(crate) fn debit(&mut self, amount: Decimal) {
        self.balance -= amount;
        self.assert_invariants();
    }
}

/// A student who reserves meals.
#[derive(Debug)]
pub struct Student {
    id: StudentId,
    student_number: String,
    name: String,
    email: String,
    active: AtomicBool,
    inner: Mutex<StudentAccount>,
}

impl Student {
    const DECIMAL_PRECISION: u32 = 4;

    /// Creates an active student.
    ///
    /// # Errors
    ///
    /// [`DiningError::InvalidAmount`] if `balance` is negative.
    pub fn new(
        id: StudentId,
        student_number: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        balance: Decimal,
    ) -> Result<Self, DiningError> {
        if balance < Decimal::ZERO {
            return Err(DiningError::InvalidAmount);
        }
        Ok(Self {
            id,
            student_number: student_number.into(),
            name: name.into(),
            email: email.into(),
            active: AtomicBool::new(true),
            inner: Mutex::new(StudentAccount::new(balance)),
        })
    }

    pub fn id(&self) -> StudentId {
        self.id
    }

    pub fn student_number(&self) -> &str {
        &self.student_number
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    pub fn balance(&self) -> Decimal {
        self.inner.lock().balance
    }

    pub fn set_balance(&self, balance: Decimal) -> Result<(), DiningError> {
        self.inner.lock().set_balance(balance)
    }

    pub fn append_to_history(&self, reservation: Arc<Reservation>) {
        self.inner.lock().append_to_history(reservation);
    }

    /// Snapshot of the committed history.
    pub fn reservations(&self) -> Vec<Arc<Reservation>> {
        self.inner.lock().reservations.clone()
    }

    /// Cancels the paid reservation at `index` in the history.
    ///
    /// Returns `false` if the index is out of range or the reservation is not
    /// `SUCCESS`. No refund is made.
    pub fn cancel_reservation(&self, index: usize) -> bool {
        let data = self.inner.lock();
        data.reservations
            .get(index)
            .is_some_and(|reservation| reservation.cancel())
    }

    /// Whether a paid reservation for a meal of the same type was created on
    /// the same UTC day as `on`.
    pub fn has_paid_meal_type_on(&self, meal: &Meal, on: chrono::NaiveDate) -> bool {
        self.inner.lock().reservations.iter().any(|r| {
            r.status() == ReservationStatus::Success
                && r.meal().meal_type() == meal.meal_type()
                && r.created_at().date_naive() == on
        })
    }

    /// Locks the account for a read-check-debit sequence.
    ///
    /// Hold the guard for the whole sequence so no other settlement can
    /// observe a stale balance.
    pub(crate) fn account(&self) -> MutexGuard<'_, StudentAccount> {
        self.inner.lock()
    }
}

impl Describe for Student {
    fn describe(&self) -> String {
        let data = self.inner.lock();
        format!(
            "Student #{} {} ({})\n  email: {}\n  balance: {}\n  reservations: {}\n  active: {}",
            self.id,
            self.name,
            self.student_number,
            self.email,
            data.balance,
            data.reservations.len(),
            self.is_active()
        )
    }
}

impl Serialize for Student {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let data = self.inner.lock();
        let paid = data
            .reservations
            .iter()
            .filter(|r| r.status() == ReservationStatus::Success)
            .count();
        let mut state = serializer.serialize_struct("Student", 4)?;
        state.serialize_field("student", &self.id)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field(
            "balance",
            &data.balance.round_dp(Student::DECIMAL_PRECISION),
        )?;
        state.serialize_field("active_reservations", &paid)?;
        state.end()
    }
}

/// Staff account. Shares nothing with [`Student`] beyond having an identity
/// and a description; its only power in the core is repricing meals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admin {
    pub id: u32,
    pub name: String,
    pub email: String,
}

impl Admin {
    pub fn new(id: u32, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
        }
    }

    pub fn update_meal_price(&self, meal: &Meal, new_price: Decimal) -> Result<(), DiningError> {
        meal.update_price(new_price)?;
        tracing::info!(admin = self.id, meal = %meal.id(), price = %new_price, "meal repriced");
        Ok(())
    }
}

impl Describe for Admin {
    fn describe(&self) -> String {
        format!("Admin #{} {}\n  email: {}", self.id, self.name, self.email)
    }
}
