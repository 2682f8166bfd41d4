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

//! # Dining Ledger
//!
//! This library provides the reservation and settlement engine behind a campus
//! meal-reservation workflow: students stage meal reservations in a cart and
//! pay for them, all or nothing, from their account balance.
//!
//! ## Core Components
//!
//! - [`Reservation`]: one meal at one hall for one student, with its lifecycle
//!   `NOT_PAID` → `SUCCESS` → `CANCELLED`, or `NOT_PAID` → `FAILED`
//! - [`ShoppingCart`]: ordered staging list of unpaid reservations
//! - [`PaymentProcessor`]: settles a cart against a [`Student`]'s balance
//! - [`TransactionManager`]: append-only ledger of [`Transaction`]s
//! - [`Engine`] and [`Session`]: wiring for a front end
//! - [`DiningError`]: contract violations and lookup failures
//!
//! ## Example
//!
//! ```
//! use dining_ledger_rs::{DiningHall, Engine, HallId, Meal, MealId, MealType, ReservationStatus,
//!     Settlement, Student, StudentId};
//! use rust_decimal_macros::dec;
//!
//! let engine = Engine::new();
//! engine.catalog().add_meal(Meal::new(MealId(1), "Pancakes", dec!(25.0), MealType::Breakfast).unwrap());
//! engine.catalog().add_meal(Meal::new(MealId(2), "Curry", dec!(20.0), MealType::Dinner).unwrap());
//! engine.catalog().add_hall(DiningHall::new(HallId(1), "North", "1 Campus Way", 300));
//! engine.register_student(Student::new(StudentId(1), "S-001", "Ada", "ada@campus.edu", dec!(100.0)).unwrap());
//!
//! let mut session = engine.open_session(StudentId(1)).unwrap();
//! let breakfast = session.add_to_cart(MealId(1), HallId(1)).unwrap();
//! session.add_to_cart(MealId(2), HallId(1)).unwrap();
//!
//! let settlement = session.confirm().unwrap();
//! assert!(matches!(settlement, Settlement::Committed { .. }));
//! assert_eq!(session.student().balance(), dec!(55.0));
//! assert_eq!(breakfast.status(), ReservationStatus::Success);
//! assert_eq!(engine.ledger().len(), 2);
//! assert!(session.cart().is_empty());
//! ```
//!
//! ## Thread Safety
//!
//! Each student serializes its own settlements behind a lock, and the ledger
//! assigns transaction ids from an atomic counter, so sessions for different
//! students can run on different threads.

mod base;
mod cart;
mod catalog;
mod engine;
pub mod error;
pub mod journal;
mod payment;
mod reservation;
mod session;
mod student;
mod transaction;
mod transaction_manager;

pub use base::{Describe, HallId, MealId, ReservationId, StudentId, TransactionId};
pub use cart::ShoppingCart;
pub use catalog::{Catalog, DiningHall, Meal, MealType};
pub use engine::Engine;
pub use error::{DiningError, JournalError};
pub use journal::{CsvJournal, Journal, JournalEntry, MemoryJournal};
pub use payment::{PaymentProcessor, Settlement};
pub use reservation::{Reservation, ReservationStatus};
pub use session::Session;
pub use student::{Admin, Student, StudentAccount};
pub use transaction::{Transaction, TransactionStatus};
pub use transaction_manager::TransactionManager;
