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

//! Error types for reservation staging and settlement.

use crate::base::{HallId, MealId, ReservationId, StudentId, TransactionId};
use crate::reservation::ReservationStatus;
use thiserror::Error;

/// Reservation, cart and settlement errors.
///
/// Insufficient balance and empty carts are not errors: settlement reports
/// them through [`Settlement`](crate::Settlement).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiningError {
    /// Status change not allowed by the reservation lifecycle
    #[error("invalid reservation transition from {from} to {to}")]
    InvalidTransition {
        from: ReservationStatus,
        to: ReservationStatus,
    },

    /// Only unpaid reservations can be staged
    #[error("reservation is {0}, only NOT_PAID reservations can be staged")]
    InvalidState(ReservationStatus),

    #[error("reservation {0} not found")]
    ReservationNotFound(ReservationId),

    #[error("meal {0} not found")]
    MealNotFound(MealId),

    #[error("dining hall {0} not found")]
    HallNotFound(HallId),

    #[error("student {0} not found")]
    StudentNotFound(StudentId),

    /// Reservation belongs to another student
    #[error("reservation does not belong to this student")]
    StudentMismatch,

    #[error("student account is inactive")]
    StudentInactive,

    /// Price or balance is negative
    #[error("invalid amount (must not be negative)")]
    InvalidAmount,

    #[error("duplicate transaction ID {0}")]
    DuplicateTransaction(TransactionId),

    /// A meal of the same type is already staged or reserved today
    #[error("a meal of this type is already reserved for today")]
    DuplicateMealType,

    /// The same reservation is already staged in this cart
    #[error("reservation {0} is already in the cart")]
    DuplicateReservation(ReservationId),

    /// Every id of the counter's range has been handed out
    #[error("identifier space exhausted")]
    IdsExhausted,
}

/// Failures of the best-effort persistence hooks.
///
/// Never propagated out of settlement; see [`Journal`](crate::Journal).
#[derive(Error, Debug)]
pub enum JournalError {
    #[error("journal write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("journal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}
