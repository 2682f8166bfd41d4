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

//! Reservation engine.
//!
//! The [`Engine`] wires the in-process collaborators together: the meal and
//! hall [`Catalog`], the registered students, the transaction ledger and the
//! [`PaymentProcessor`]. Nothing here is global; construct one engine and
//! pass it to whatever needs it.
//!
//! # Thread Safety
//!
//! Students live in a [`DashMap`] and each student serializes its own
//! settlements, so different students can settle in parallel.

use crate::DiningError;
use crate::base::{HallId, MealId, ReservationId, StudentId};
use crate::cart::ShoppingCart;
use crate::catalog::Catalog;
use crate::journal::Journal;
use crate::payment::{PaymentProcessor, Settlement};
use crate::reservation::Reservation;
use crate::session::Session;
use crate::student::Student;
use crate::transaction_manager::TransactionManager;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Owns students, catalog and ledger, and hands out sessions.
///
/// # Invariants
///
/// - Reservation ids are unique and never reused.
/// - Transaction ids are assigned only by the ledger.
/// - A student's balance never goes negative.
pub struct Engine {
    catalog: Catalog,
    /// Students indexed by id.
    students: DashMap<StudentId, Arc<Student>>,
    processor: PaymentProcessor,
    next_reservation: AtomicU32,
}

impl Engine {
    /// Creates an engine with an empty catalog, no students and an empty ledger.
    pub fn new() -> Self {
        Self::with_processor(PaymentProcessor::new(Arc::new(TransactionManager::new())))
    }

    /// Creates an engine whose settlements are also written to `journal`.
    pub fn with_journal(journal: Arc<dyn Journal>) -> Self {
        Self::with_processor(
            PaymentProcessor::new(Arc::new(TransactionManager::new())).with_journal(journal),
        )
    }

    pub fn with_processor(processor: PaymentProcessor) -> Self {
        Engine {
            catalog: Catalog::new(),
            students: DashMap::new(),
            processor,
            next_reservation: AtomicU32::new(1),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn ledger(&self) -> &Arc<TransactionManager> {
        self.processor.ledger()
    }

    /// Registers a student, replacing any student with the same id.
    pub fn register_student(&self, student: Student) -> Arc<Student> {
        let student = Arc::new(student);
        self.students.insert(student.id(), Arc::clone(&student));
        student
    }

    pub fn student(&self, id: StudentId) -> Result<Arc<Student>, DiningError> {
        self.students
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(DiningError::StudentNotFound(id))
    }

    /// All students, ordered by id.
    pub fn students(&self) -> Vec<Arc<Student>> {
        let mut students: Vec<_> = self
            .students
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        students.sort_by_key(|student| student.id());
        students
    }

    /// Creates an unpaid reservation with a fresh id.
    ///
    /// # Errors
    ///
    /// - [`DiningError::StudentNotFound`], [`DiningError::MealNotFound`],
    ///   [`DiningError::HallNotFound`] for unknown ids.
    /// - [`DiningError::IdsExhausted`] once every reservation id has been used.
    pub fn create_reservation(
        &self,
        student: StudentId,
        meal: MealId,
        hall: HallId,
    ) -> Result<Arc<Reservation>, DiningError> {
        let student = self.student(student)?;
        let meal = self.catalog.meal(meal)?;
        let hall = self.catalog.hall(hall)?;
        let id = self
            .next_reservation
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |id| id.checked_add(1))
            .map(ReservationId)
            .map_err(|_| DiningError::IdsExhausted)?;
        Ok(Arc::new(Reservation::new(id, student.id(), meal, hall)))
    }

    /// Opens a session with a fresh, empty cart for `student`.
    pub fn open_session(&self, student: StudentId) -> Result<Session<'_>, DiningError> {
        Ok(Session::new(self, self.student(student)?))
    }

    /// Settles `cart` for `student`. See [`PaymentProcessor::settle`].
    pub fn settle(
        &self,
        student: &Student,
        cart: &mut ShoppingCart,
    ) -> Result<Settlement, DiningError> {
        self.processor.settle(student, cart)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
