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

//! Persistence hooks run after settlement.
//!
//! Journals are side channels: settlement has already committed in memory by
//! the time they are called, and a failing journal is logged and ignored.

use crate::base::{ReservationId, StudentId, TransactionId};
use crate::error::JournalError;
use crate::reservation::{Reservation, ReservationStatus};
use crate::transaction::Transaction;
use chrono::{DateTime, Utc};
use crossbeam::queue::SegQueue;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Sink for reservation, transaction and log records.
pub trait Journal: Send + Sync {
    /// Records a settled reservation with the amount settlement charged or
    /// checked for it, which may differ from the meal's current price.
    fn record_reservation(
        &self,
        reservation: &Reservation,
        amount: Decimal,
    ) -> Result<(), JournalError>;

    fn record_transaction(&self, transaction: &Transaction) -> Result<(), JournalError>;

    fn log_line(&self, line: &str) -> Result<(), JournalError>;
}

/// Logs and swallows a journal failure.
pub(crate) fn best_effort(result: Result<(), JournalError>, what: &str) {
    if let Err(e) = result {
        tracing::warn!(error = %e, "journal {what} failed, continuing");
    }
}

/// One CSV row. Columns: `kind,id,student,status,amount,detail,at`.
#[derive(Debug, Serialize)]
struct JournalRow<'a> {
    kind: &'static str,
    id: Option<u32>,
    student: Option<StudentId>,
    status: Option<String>,
    amount: Option<Decimal>,
    detail: &'a str,
    at: DateTime<Utc>,
}

/// Appends journal records as CSV rows.
///
/// Each record is flushed immediately so a crash loses at most the record
/// being written.
pub struct CsvJournal<W: Write + Send> {
    writer: Mutex<csv::Writer<W>>,
}

impl CsvJournal<File> {
    /// Opens `path` in append mode, creating it if needed.
    pub fn append(path: impl AsRef<Path>) -> Result<Self, JournalError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::from_writer(file))
    }
}

impl<W: Write + Send> CsvJournal<W> {
    pub fn from_writer(writer: W) -> Self {
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Consumes the journal and returns the underlying writer.
    pub fn into_inner(self) -> Result<W, JournalError> {
        self.writer
            .into_inner()
            .into_inner()
            .map_err(|e| JournalError::Io(e.into_error()))
    }

    fn write_row(&self, row: &JournalRow<'_>) -> Result<(), JournalError> {
        let mut writer = self.writer.lock();
        writer.serialize(row)?;
        writer.flush()?;
        Ok(())
    }
}

impl<W: Write + Send> Journal for CsvJournal<W> {
    fn record_reservation(
        &self,
        reservation: &Reservation,
        amount: Decimal,
    ) -> Result<(), JournalError> {
        self.write_row(&JournalRow {
            kind: "reservation",
            id: Some(reservation.id().0),
            student: Some(reservation.student_id()),
            status: Some(reservation.status().to_string()),
            amount: Some(amount),
            detail: reservation.meal().name(),
            at: reservation.created_at(),
        })
    }

    fn record_transaction(&self, transaction: &Transaction) -> Result<(), JournalError> {
        self.write_row(&JournalRow {
            kind: "transaction",
            id: Some(transaction.id().0),
            student: Some(transaction.student_id()),
            status: Some(transaction.status().to_string()),
            amount: Some(transaction.amount()),
            detail: "",
            at: transaction.created_at(),
        })
    }

    fn log_line(&self, line: &str) -> Result<(), JournalError> {
        self.write_row(&JournalRow {
            kind: "log",
            id: None,
            student: None,
            status: None,
            amount: None,
            detail: line,
            at: Utc::now(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalEntry {
    Reservation {
        id: ReservationId,
        status: ReservationStatus,
        amount: Decimal,
    },
    Transaction {
        id: TransactionId,
        amount: Decimal,
    },
    Log(String),
}

/// Lock-free in-memory journal, drained by the caller.
#[derive(Debug, Default)]
pub struct MemoryJournal {
    entries: SegQueue<JournalEntry>,
}

impl MemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns everything recorded so far, oldest first.
    pub fn drain(&self) -> Vec<JournalEntry> {
        std::iter::from_fn(|| self.entries.pop()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Journal for MemoryJournal {
    fn record_reservation(
        &self,
        reservation: &Reservation,
        amount: Decimal,
    ) -> Result<(), JournalError> {
        self.entries.push(JournalEntry::Reservation {
            id: reservation.id(),
            status: reservation.status(),
            amount,
        });
        Ok(())
    }

    fn record_transaction(&self, transaction: &Transaction) -> Result<(), JournalError> {
        self.entries.push(JournalEntry::Transaction {
            id: transaction.id(),
            amount: transaction.amount(),
        });
        Ok(())
    }

    fn log_line(&self, line: &str) -> Result<(), JournalError> {
        self.entries.push(JournalEntry::Log(line.to_string()));
        Ok(())
    }
}
