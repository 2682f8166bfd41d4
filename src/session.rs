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

//! One student's staging session.
//!
//! # Example
//!
//! ```
//! use dining_ledger_rs::{DiningHall, Engine, HallId, Meal, MealId, MealType,
//!     Student, StudentId};
//! use rust_decimal_macros::dec;
//!
//! let engine = Engine::new();
//! engine.catalog().add_meal(Meal::new(MealId(1), "Soup", dec!(3), MealType::Lunch).unwrap());
//! engine.catalog().add_hall(DiningHall::new(HallId(1), "North", "1 Campus Way", 100));
//! engine.register_student(Student::new(StudentId(1), "S-1", "Ada", "ada@campus.edu", dec!(10)).unwrap());
//!
//! let mut session = engine.open_session(StudentId(1)).unwrap();
//! session.add_to_cart(MealId(1), HallId(1)).unwrap();
//! let settlement = session.confirm().unwrap();
//!
//! assert!(settlement.is_committed());
//! assert_eq!(session.student().balance(), dec!(7));
//! ```

use crate::DiningError;
use crate::base::{HallId, MealId, ReservationId};
use crate::cart::ShoppingCart;
use crate::engine::Engine;
use crate::payment::Settlement;
use crate::reservation::{Reservation, ReservationStatus};
use crate::student::Student;
use chrono::Utc;
use std::sync::Arc;

/// A student's cart plus the operations a front end drives.
///
/// The cart lives and dies with the session.
pub struct Session<'a> {
    engine: &'a Engine,
    student: Arc<Student>,
    cart: ShoppingCart,
}

impl<'a> Session<'a> {
    pub(crate) fn new(engine: &'a Engine, student: Arc<Student>) -> Self {
        Self {
            engine,
            student,
            cart: ShoppingCart::new(),
        }
    }

    pub fn student(&self) -> &Arc<Student> {
        &self.student
    }

    pub fn cart(&self) -> &ShoppingCart {
        &self.cart
    }

    /// Creates a reservation for `meal` at `hall` and stages it.
    ///
    /// # Errors
    ///
    /// - [`DiningError::MealNotFound`] / [`DiningError::HallNotFound`] for unknown ids.
    /// - [`DiningError::DuplicateMealType`] if a meal of the same type is
    ///   already staged, or was paid for today.
    pub fn add_to_cart(
        &mut self,
        meal: MealId,
        hall: HallId,
    ) -> Result<Arc<Reservation>, DiningError> {
        let today = Utc::now().date_naive();
        let requested = self.engine.catalog().meal(meal)?;
        let meal_type = requested.meal_type();

        let staged_same_type = self.cart.reservations().iter().any(|r| {
            r.status() == ReservationStatus::NotPaid
                && r.meal().meal_type() == meal_type
                && r.created_at().date_naive() == today
        });
        if staged_same_type || self.student.has_paid_meal_type_on(&requested, today) {
            return Err(DiningError::DuplicateMealType);
        }

        let reservation = self
            .engine
            .create_reservation(self.student.id(), meal, hall)?;
        self.cart.add(Arc::clone(&reservation))?;
        Ok(reservation)
    }

    /// Unstages a reservation.
    pub fn remove_from_cart(
        &mut self,
        id: ReservationId,
    ) -> Result<Arc<Reservation>, DiningError> {
        self.cart.remove_by_id(id)
    }

    /// Settles the cart. The cart is empty afterwards whatever the outcome.
    pub fn confirm(&mut self) -> Result<Settlement, DiningError> {
        self.engine.settle(&self.student, &mut self.cart)
    }

    /// Cancels a paid reservation from the student's history.
    ///
    /// Returns `Ok(false)` if the reservation is not `SUCCESS`. The balance is
    /// not refunded.
    ///
    /// # Errors
    ///
    /// [`DiningError::ReservationNotFound`] if the history has no such reservation.
    pub fn cancel_reservation(&self, id: ReservationId) -> Result<bool, DiningError> {
        let reservation = self
            .student
            .reservations()
            .into_iter()
            .find(|r| r.id() == id)
            .ok_or(DiningError::ReservationNotFound(id))?;

        let cancelled = reservation.cancel();
        if cancelled {
            tracing::info!(student = %self.student.id(), reservation = %id, "reservation cancelled");
        } else {
            tracing::info!(
                student = %self.student.id(),
                reservation = %id,
                status = %reservation.status(),
                "reservation not cancellable"
            );
        }
        Ok(cancelled)
    }
}
