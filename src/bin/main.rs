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

use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use dining_ledger_rs::{
    CsvJournal, DiningHall, Engine, HallId, Journal, Meal, MealId, MealType, ReservationId,
    Session, Student, StudentId,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Dining Ledger - replay meal orders against student balances
///
/// Loads students, meals and halls from CSV files, replays an orders CSV
/// (stage, unstage, confirm, cancel) and prints the resulting student
/// balances to stdout.
#[derive(Parser, Debug)]
#[command(name = "dining-ledger-rs")]
#[command(about = "Replays meal reservation orders and settles them", long_about = None)]
struct Args {
    /// Path to CSV file with orders
    ///
    /// Expected format: action,student,meal,hall,reservation
    /// Actions: add, remove, confirm, cancel
    #[arg(value_name = "ORDERS")]
    orders: PathBuf,

    /// Students CSV: student,name,email,balance[,active]
    #[arg(long, env = "DINING_STUDENTS")]
    students: PathBuf,

    /// Meals CSV: meal,name,price,type[,sides] (sides separated by ';')
    #[arg(long, env = "DINING_MEALS")]
    meals: PathBuf,

    /// Dining halls CSV: hall,name,address,capacity
    #[arg(long, env = "DINING_HALLS")]
    halls: PathBuf,

    /// Append settled reservations and transactions to this CSV journal
    #[arg(long, env = "DINING_JOURNAL")]
    journal: Option<PathBuf>,

    /// Write the transaction ledger to this CSV file
    #[arg(long)]
    ledger: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "DINING_LOG", default_value = "warn")]
    log_level: String,
}

fn main() {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let engine = match &args.journal {
        Some(path) => match CsvJournal::append(path) {
            Ok(journal) => Engine::with_journal(Arc::new(journal) as Arc<dyn Journal>),
            Err(e) => {
                eprintln!("Error opening journal '{}': {}", path.display(), e);
                process::exit(1);
            }
        },
        None => Engine::new(),
    };

    if let Err(e) = load_catalog(&engine, &args) {
        eprintln!("Error loading catalog: {}", e);
        process::exit(1);
    }

    let file = match File::open(&args.orders) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", args.orders.display(), e);
            process::exit(1);
        }
    };
    if let Err(e) = process_orders(&engine, BufReader::new(file)) {
        eprintln!("Error processing orders: {}", e);
        process::exit(1);
    }

    if let Some(path) = &args.ledger {
        let written = File::create(path)
            .map_err(csv::Error::from)
            .and_then(|file| write_ledger(&engine, file));
        if let Err(e) = written {
            eprintln!("Error writing ledger '{}': {}", path.display(), e);
            process::exit(1);
        }
    }

    if let Err(e) = write_students(&engine, std::io::stdout()) {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }
}

fn reader_for<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader)
}

#[derive(Debug, Deserialize)]
struct StudentRecord {
    student: u32,
    name: String,
    email: String,
    balance: Decimal,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    active: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct MealRecord {
    meal: u32,
    name: String,
    price: Decimal,
    #[serde(rename = "type")]
    meal_type: String,
    #[serde(default)]
    sides: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HallRecord {
    hall: u32,
    name: String,
    address: String,
    capacity: u32,
}

/// Loads students, meals and halls. Invalid rows are skipped with a warning.
fn load_catalog(engine: &Engine, args: &Args) -> Result<(), csv::Error> {
    for record in reader_for(open(&args.students)?).deserialize::<StudentRecord>() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed student row");
                continue;
            }
        };
        let id = StudentId(record.student);
        let number = format!("S-{:05}", record.student);
        match Student::new(id, number, record.name, record.email, record.balance) {
            Ok(student) => {
                student.set_active(record.active.unwrap_or(true));
                engine.register_student(student);
            }
            Err(e) => tracing::warn!(student = %id, error = %e, "skipping student"),
        }
    }

    for record in reader_for(open(&args.meals)?).deserialize::<MealRecord>() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed meal row");
                continue;
            }
        };
        let meal_type = match record.meal_type.parse::<MealType>() {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(meal = record.meal, error = %e, "skipping meal");
                continue;
            }
        };
        match Meal::new(MealId(record.meal), record.name, record.price, meal_type) {
            Ok(meal) => {
                for side in record.sides.iter().flat_map(|s| s.split(';')) {
                    if !side.trim().is_empty() {
                        meal.add_side_item(side.trim());
                    }
                }
                engine.catalog().add_meal(meal);
            }
            Err(e) => tracing::warn!(meal = record.meal, error = %e, "skipping meal"),
        }
    }

    for record in reader_for(open(&args.halls)?).deserialize::<HallRecord>() {
        match record {
            Ok(r) => {
                engine.catalog().add_hall(DiningHall::new(
                    HallId(r.hall),
                    r.name,
                    r.address,
                    r.capacity,
                ));
            }
            Err(e) => tracing::warn!(error = %e, "skipping malformed hall row"),
        }
    }

    Ok(())
}

fn open(path: &Path) -> Result<BufReader<File>, csv::Error> {
    Ok(BufReader::new(File::open(path)?))
}

/// Raw order row.
///
/// Fields: `action, student, meal, hall, reservation`
#[derive(Debug, Deserialize)]
struct OrderRecord {
    action: String,
    student: u32,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    meal: Option<u32>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    hall: Option<u32>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    reservation: Option<u32>,
}

/// Replays orders, one session per student.
///
/// Failed orders are reported at `warn` and do not stop processing.
/// Carts still holding reservations at the end are discarded.
///
/// # CSV Format
///
/// ```csv
/// action,student,meal,hall,reservation
/// add,1,1,1,
/// add,1,2,1,
/// confirm,1,,,
/// cancel,1,,,1
/// ```
fn process_orders<R: Read>(engine: &Engine, reader: R) -> Result<(), csv::Error> {
    let mut sessions: HashMap<StudentId, Session<'_>> = HashMap::new();

    for result in reader_for(reader).deserialize::<OrderRecord>() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed order row");
                continue;
            }
        };

        let student = StudentId(record.student);
        let session = match sessions.entry(student) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => match engine.open_session(student) {
                Ok(session) => entry.insert(session),
                Err(e) => {
                    tracing::warn!(%student, error = %e, "skipping order");
                    continue;
                }
            },
        };

        let action = record.action.to_lowercase();
        let outcome = match (action.as_str(), record.meal, record.hall, record.reservation) {
            ("add", Some(meal), Some(hall), _) => session
                .add_to_cart(MealId(meal), HallId(hall))
                .map(|r| format!("Reservation {} added to cart", r.id())),
            ("remove", _, _, Some(id)) => session
                .remove_from_cart(ReservationId(id))
                .map(|r| format!("Reservation {} removed from cart", r.id())),
            ("confirm", ..) => session.confirm().map(|settlement| settlement.to_string()),
            ("cancel", _, _, Some(id)) => session
                .cancel_reservation(ReservationId(id))
                .map(|cancelled| {
                    if cancelled {
                        "Reservation cancelled successfully".to_string()
                    } else {
                        "Reservation cannot be cancelled".to_string()
                    }
                }),
            (action, ..) => {
                tracing::warn!(%student, action, "skipping invalid order");
                continue;
            }
        };

        match outcome {
            Ok(message) => tracing::info!(%student, "{message}"),
            Err(e) => tracing::warn!(%student, error = %e, "order failed"),
        }
    }

    Ok(())
}

/// Writes student balances as CSV.
///
/// Columns: `student, name, balance, active_reservations`
fn write_students<W: Write>(engine: &Engine, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);
    for student in engine.students() {
        wtr.serialize(student.as_ref())?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes the transaction ledger as CSV, in the order it was recorded.
fn write_ledger<W: Write>(engine: &Engine, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);
    for transaction in engine.ledger().transactions() {
        wtr.serialize(transaction.as_ref())?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dining_ledger_rs::ReservationStatus;
    use rust_decimal_macros::dec;
    use std::io::Cursor;

    fn engine() -> Engine {
        let engine = Engine::new();
        engine
            .catalog()
            .add_meal(Meal::new(MealId(1), "Pancakes", dec!(25.0), MealType::Breakfast).unwrap());
        engine
            .catalog()
            .add_meal(Meal::new(MealId(2), "Curry", dec!(20.0), MealType::Dinner).unwrap());
        engine
            .catalog()
            .add_hall(DiningHall::new(HallId(1), "North", "1 Campus Way", 300));
        engine.register_student(
            Student::new(StudentId(1), "S-1", "Ada", "ada@campus.edu", dec!(100.0)).unwrap(),
        );
        engine.register_student(
            Student::new(StudentId(2), "S-2", "Bob", "bob@campus.edu", dec!(10.0)).unwrap(),
        );
        engine
    }

    #[test]
    fn replay_commits_affordable_cart() {
        let engine = engine();
        let csv = "action,student,meal,hall,reservation\n\
                   add,1,1,1,\n\
                   add,1,2,1,\n\
                   confirm,1,,,\n";

        process_orders(&engine, Cursor::new(csv)).unwrap();

        assert_eq!(engine.student(StudentId(1)).unwrap().balance(), dec!(55.0));
        assert_eq!(engine.ledger().len(), 2);
    }

    #[test]
    fn replay_rejects_unaffordable_cart() {
        let engine = engine();
        let csv = "action,student,meal,hall,reservation\n\
                   add,2,1,1,\n\
                   confirm,2,,,\n";

        process_orders(&engine, Cursor::new(csv)).unwrap();

        assert_eq!(engine.student(StudentId(2)).unwrap().balance(), dec!(10.0));
        assert!(engine.ledger().is_empty());
    }

    #[test]
    fn replay_cancel_after_confirm() {
        let engine = engine();
        let csv = "action,student,meal,hall,reservation\n\
                   add,1,2,1,\n\
                   confirm,1,,,\n\
                   cancel,1,,,1\n";

        process_orders(&engine, Cursor::new(csv)).unwrap();

        let student = engine.student(StudentId(1)).unwrap();
        assert_eq!(student.reservations()[0].status(), ReservationStatus::Cancelled);
        assert_eq!(student.balance(), dec!(80.0));
    }

    #[test]
    fn skip_malformed_and_unknown_rows() {
        let engine = engine();
        let csv = "action,student,meal,hall,reservation\n\
                   add,abc,1,1,\n\
                   fly,1,,,\n\
                   add,99,1,1,\n\
                   add,1,2,1,\n\
                   confirm,1,,,\n";

        process_orders(&engine, Cursor::new(csv)).unwrap();

        assert_eq!(engine.student(StudentId(1)).unwrap().balance(), dec!(80.0));
    }

    #[test]
    fn write_students_to_csv() {
        let engine = engine();
        let mut output = Vec::new();
        write_students(&engine, &mut output).unwrap();

        let output = String::from_utf8(output).unwrap();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines[0], "student,name,balance,active_reservations");
        assert_eq!(lines[1], "1,Ada,100.0,0");
        assert_eq!(lines[2], "2,Bob,10.0,0");
    }

    #[test]
    fn write_ledger_to_csv() {
        let engine = engine();
        let csv = "action,student,meal,hall,reservation\n\
                   add,1,1,1,\n\
                   confirm,1,,,\n";
        process_orders(&engine, Cursor::new(csv)).unwrap();

        let mut output = Vec::new();
        write_ledger(&engine, &mut output).unwrap();

        let output = String::from_utf8(output).unwrap();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines[0], "id,student,reservation,amount,status,created_at");
        assert!(lines[1].starts_with("1,1,1,25.0,COMPLETED,"));
    }
}
