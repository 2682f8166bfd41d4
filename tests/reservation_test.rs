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

//! Reservation lifecycle integration tests.

mod common;

use dining_ledger_rs::{Describe, ReservationStatus, StudentId};
use rust_decimal_macros::dec;

#[test]
fn new_reservation_is_not_paid() {
    let r = common::reservation(StudentId(1), dec!(3.00));
    assert_eq!(r.status(), ReservationStatus::NotPaid);
    assert_eq!(r.student_id(), StudentId(1));
    assert_eq!(r.price(), dec!(3.00));
}

#[test]
fn cancel_unpaid_reservation_fails() {
    let r = common::reservation(StudentId(1), dec!(3.00));
    assert!(!r.cancel());
    assert_eq!(r.status(), ReservationStatus::NotPaid);
}

// Scenario C
#[test]
fn cancel_paid_reservation_once() {
    let student = common::student(1, dec!(50.0));
    let (mut cart, staged) = common::cart(StudentId(1), &[dec!(10.0)]);
    common::processor().settle(&student, &mut cart).unwrap();
    let r = &staged[0];
    assert_eq!(r.status(), ReservationStatus::Success);

    assert!(r.cancel());
    assert_eq!(r.status(), ReservationStatus::Cancelled);

    assert!(!r.cancel());
    assert_eq!(r.status(), ReservationStatus::Cancelled);
}

#[test]
fn cancel_does_not_refund() {
    let student = common::student(1, dec!(50.0));
    let (mut cart, staged) = common::cart(StudentId(1), &[dec!(10.0)]);
    common::processor().settle(&student, &mut cart).unwrap();

    assert!(staged[0].cancel());
    assert_eq!(student.balance(), dec!(40.0));
}

#[test]
fn failed_reservation_cannot_be_cancelled() {
    let student = common::student(1, dec!(1.0));
    let (mut cart, staged) = common::cart(StudentId(1), &[dec!(10.0)]);
    common::processor().settle(&student, &mut cart).unwrap();

    assert_eq!(staged[0].status(), ReservationStatus::Failed);
    assert!(!staged[0].cancel());
    assert_eq!(staged[0].status(), ReservationStatus::Failed);
}

#[test]
fn settled_reservation_is_not_settled_again() {
    let student = common::student(1, dec!(50.0));
    let (mut cart, staged) = common::cart(StudentId(1), &[dec!(10.0)]);
    let processor = common::processor();
    processor.settle(&student, &mut cart).unwrap();

    // Re-staging a paid reservation is refused, so it can never be paid twice.
    let result = cart.add(staged[0].clone());
    assert!(result.is_err());
    assert_eq!(student.balance(), dec!(40.0));
    assert_eq!(processor.ledger().len(), 1);
}

#[test]
fn describe_includes_status_and_meal() {
    let r = common::reservation(StudentId(1), dec!(4.50));
    let text = r.describe();
    assert!(text.contains("[NOT_PAID]"));
    assert!(text.contains("price: 4.50"));
    assert!(text.contains("hall: North"));
}
