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

//! Reservation lifecycle.
//!
//! Implemented State Machine
//!
//! ```text
//! NOT_PAID ──settle(ok)────► SUCCESS ──cancel──► CANCELLED
//!    │
//!    └──────settle(fail)───► FAILED
//! ```
//!
//! A reservation never returns to `NOT_PAID`, and `CANCELLED` and `FAILED`
//! are terminal. Only the payment processor settles; only [`Reservation::cancel`]
//! cancels.
//!
//! # Example
//!
//! ```
//! use dining_ledger_rs::{DiningHall, HallId, Meal, MealId, MealType, Reservation,
//!     ReservationId, ReservationStatus, StudentId};
//! use rust_decimal_macros::dec;
//! use std::sync::Arc;
//!
//! let meal = Arc::new(Meal::new(MealId(1), "Soup", dec!(3), MealType::Lunch).unwrap());
//! let hall = Arc::new(DiningHall::new(HallId(1), "North", "1 Campus Way", 100));
//! let reservation = Reservation::new(ReservationId(1), StudentId(1), meal, hall);
//!
//! assert_eq!(reservation.status(), ReservationStatus::NotPaid);
//! assert!(!reservation.cancel());
//! ```

use crate::DiningError;
use crate::base::{Describe, ReservationId, StudentId};
use crate::catalog::{DiningHall, Meal};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    NotPaid,
    Success,
    Cancelled,
    Failed,
}

impl ReservationStatus {
    /// Whether the lifecycle allows moving from `self` to `to`.
    pub fn can_transition_to(self, to: ReservationStatus) -> bool {
        matches!(
            (self, to),
            (Self::NotPaid, Self::Success)
                | (Self::NotPaid, Self::Failed)
                | (Self::Success, Self::Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Failed)
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotPaid => "NOT_PAID",
            Self::Success => "SUCCESS",
            Self::Cancelled => "CANCELLED",
            Self::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// One attempt by a student to obtain a meal at a hall.
///
/// Shared by reference between a [`ShoppingCart`](crate::ShoppingCart) and the
/// owning student's history, so the status sits behind a lock.
#[derive(Debug)]
pub struct Reservation {
    id: ReservationId,
    student_id: StudentId,
    meal: Arc<Meal>,
    hall: Arc<DiningHall>,
    created_at: DateTime<Utc>,
    status: Mutex<ReservationStatus>,
}

impl Reservation {
    /// Creates an unpaid reservation stamped with the current time.
    pub fn new(
        id: ReservationId,
        student_id: StudentId,
        meal: Arc<Meal>,
        hall: Arc<DiningHall>,
    ) -> Self {
        Self {
            id,
            student_id,
            meal,
            hall,
            created_at: Utc::now(),
            status: Mutex::new(ReservationStatus::NotPaid),
        }
    }

    pub fn id(&self) -> ReservationId {
        self.id
    }

    pub fn student_id(&self) -> StudentId {
        self.student_id
    }

    pub fn meal(&self) -> &Arc<Meal> {
        &self.meal
    }

    pub fn hall(&self) -> &Arc<DiningHall> {
        &self.hall
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn status(&self) -> ReservationStatus {
        *self.status.lock()
    }

    /// Current price of the reserved meal.
    pub fn price(&self) -> Decimal {
        self.meal.price()
    }

    /// Cancels a paid reservation.
    ///
    /// Returns `false` and leaves the status untouched unless the reservation
    /// is `SUCCESS`. The balance is not refunded.
    pub fn cancel(&self) -> bool {
        let mut status = self.status.lock();
        if !status.can_transition_to(ReservationStatus::Cancelled) {
            return false;
        }
        *status = ReservationStatus::Cancelled;
        true
    }

    /// Records the settlement outcome.
    ///
    /// # Errors
    ///
    /// [`DiningError::InvalidTransition`] unless the reservation is still `NOT_PAID`.
    pub(crate) fn mark_settled(&self, success: bool) -> Result<(), DiningError> {
        let to = if success {
            ReservationStatus::Success
        } else {
            ReservationStatus::Failed
        };
        let mut status = self.status.lock();
        if !status.can_transition_to(to) {
            return Err(DiningError::InvalidTransition { from: *status, to });
        }
        *status = to;
        Ok(())
    }
}

impl Describe for Reservation {
    fn describe(&self) -> String {
        format!(
            "Reservation #{} [{}]\n  meal: {} ({})\n  hall: {}\n  price: {}\n  created: {}",
            self.id,
            self.status(),
            self.meal.name(),
            self.meal.meal_type(),
            self.hall.name(),
            self.price(),
            self.created_at.format("%Y-%m-%d %H:%M:%S")
        )
    }
}
