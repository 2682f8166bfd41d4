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

//! Staging area for unpaid reservations.

use crate::DiningError;
use crate::base::ReservationId;
use crate::reservation::{Reservation, ReservationStatus};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Ordered list of reservations waiting for settlement.
///
/// Insertion order is the settlement order. Only `NOT_PAID` reservations are
/// accepted, and settlement empties the cart whatever the outcome, so a
/// failed reservation is never retried unless it is staged again.
#[derive(Debug, Default)]
pub struct ShoppingCart {
    reservations: Vec<Arc<Reservation>>,
}

impl ShoppingCart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a reservation.
    ///
    /// # Errors
    ///
    /// - [`DiningError::InvalidState`] if the reservation has already left `NOT_PAID`.
    /// - [`DiningError::DuplicateReservation`] if a reservation with the same id
    ///   is already staged.
    pub fn add(&mut self, reservation: Arc<Reservation>) -> Result<(), DiningError> {
        let status = reservation.status();
        if status != ReservationStatus::NotPaid {
            return Err(DiningError::InvalidState(status));
        }
        if self.reservations.iter().any(|r| r.id() == reservation.id()) {
            return Err(DiningError::DuplicateReservation(reservation.id()));
        }
        tracing::debug!(reservation = %reservation.id(), "staged reservation");
        self.reservations.push(reservation);
        Ok(())
    }

    /// Removes the first reservation with `id` and returns it.
    ///
    /// # Errors
    ///
    /// [`DiningError::ReservationNotFound`] if no staged reservation has that id.
    pub fn remove_by_id(&mut self, id: ReservationId) -> Result<Arc<Reservation>, DiningError> {
        let position = self
            .reservations
            .iter()
            .position(|r| r.id() == id)
            .ok_or(DiningError::ReservationNotFound(id))?;
        tracing::debug!(reservation = %id, "unstaged reservation");
        Ok(self.reservations.remove(position))
    }

    /// Read-only view in insertion order.
    pub fn reservations(&self) -> &[Arc<Reservation>] {
        &self.reservations
    }

    /// Owned copy of the current contents, in insertion order.
    pub fn snapshot(&self) -> Vec<Arc<Reservation>> {
        self.reservations.clone()
    }

    /// Sum of current prices of all `NOT_PAID` entries.
    pub fn total(&self) -> Decimal {
        self.reservations
            .iter()
            .filter(|r| r.status() == ReservationStatus::NotPaid)
            .map(|r| r.price())
            .sum()
    }

    pub fn clear(&mut self) {
        self.reservations.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.reservations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.reservations.len()
    }

    /// Stages without any checks, for exercising settlement on carts `add`
    /// would refuse to build.
    #[cfg(test)]
    pub(crate) fn push_unchecked(&mut self, reservation: Arc<Reservation>) {
        self.reservations.push(reservation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{HallId, MealId, StudentId};
    use crate::catalog::{DiningHall, Meal, MealType};
    use rust_decimal_macros::dec;

    fn reservation(id: u32, price: Decimal) -> Arc<Reservation> {
        let meal = Arc::new(Meal::new(MealId(id), "Meal", price, MealType::Lunch).unwrap());
        let hall = Arc::new(DiningHall::new(HallId(1), "North", "1 Campus Way", 100));
        Arc::new(Reservation::new(ReservationId(id), StudentId(1), meal, hall))
    }

    #[test]
    fn total_skips_settled_entries() {
        let mut cart = ShoppingCart::new();
        let paid = reservation(1, dec!(10));
        cart.add(reservation(2, dec!(2.50))).unwrap();
        cart.add(Arc::clone(&paid)).unwrap();
        paid.mark_settled(true).unwrap();

        assert_eq!(cart.total(), dec!(2.50));
    }

    #[test]
    fn snapshot_is_independent_of_cart() {
        let mut cart = ShoppingCart::new();
        cart.add(reservation(1, dec!(1))).unwrap();
        let snapshot = cart.snapshot();
        cart.clear();

        assert_eq!(snapshot.len(), 1);
        assert!(cart.is_empty());
    }
}
