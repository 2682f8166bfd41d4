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

//! Shared fixtures for integration tests.

#![allow(dead_code)]

use dining_ledger_rs::{
    DiningHall, HallId, Meal, MealId, MealType, PaymentProcessor, Reservation, ReservationId,
    ShoppingCart, Student, StudentId, TransactionManager,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_RESERVATION: AtomicU32 = AtomicU32::new(1);

pub fn hall() -> Arc<DiningHall> {
    Arc::new(DiningHall::new(HallId(1), "North", "1 Campus Way", 300))
}

pub fn meal(id: u32, price: Decimal) -> Arc<Meal> {
    Arc::new(Meal::new(MealId(id), format!("Meal {id}"), price, MealType::Lunch).unwrap())
}

pub fn student(id: u32, balance: Decimal) -> Student {
    Student::new(
        StudentId(id),
        format!("S-{id:03}"),
        format!("Student {id}"),
        format!("s{id}@campus.edu"),
        balance,
    )
    .unwrap()
}

/// Unpaid reservation of a meal priced `price` for `student`.
pub fn reservation(student: StudentId, price: Decimal) -> Arc<Reservation> {
    let id = NEXT_RESERVATION.fetch_add(1, Ordering::SeqCst);
    Arc::new(Reservation::new(
        ReservationId(id),
        student,
        meal(id, price),
        hall(),
    ))
}

/// Cart staged with one reservation per price, in order.
pub fn cart(student: StudentId, prices: &[Decimal]) -> (ShoppingCart, Vec<Arc<Reservation>>) {
    let mut cart = ShoppingCart::new();
    let mut staged = Vec::new();
    for price in prices {
        let r = reservation(student, *price);
        cart.add(Arc::clone(&r)).unwrap();
        staged.push(r);
    }
    (cart, staged)
}

pub fn processor() -> PaymentProcessor {
    PaymentProcessor::new(Arc::new(TransactionManager::new()))
}
