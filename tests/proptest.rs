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

//! Property-based tests for settlement.
//!
//! These tests verify invariants that should hold for any sequence of
//! settlements, whatever the prices and balances involved.

mod common;

use dining_ledger_rs::{ReservationStatus, Settlement, StudentId, TransactionManager, TransactionStatus};
use proptest::prelude::*;
use rust_decimal::Decimal;

// =============================================================================
// Arbitrary Strategies
// =============================================================================

/// Generate a price (0 to 100 with 2 decimal places).
fn arb_price() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Generate a balance (0 to 300 with 2 decimal places).
fn arb_balance() -> impl Strategy<Value = Decimal> {
    (0i64..=30_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn arb_cart() -> impl Strategy<Value = Vec<Decimal>> {
    prop::collection::vec(arb_price(), 0..6)
}

// =============================================================================
// Balance Invariant Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Balance after each settlement equals the balance before minus the
    /// prices of the reservations that ended SUCCESS in that call.
    #[test]
    fn balance_drops_by_successful_prices(
        balance in arb_balance(),
        carts in prop::collection::vec(arb_cart(), 1..8),
    ) {
        let processor = common::processor();
        let student = common::student(1, balance);

        for prices in &carts {
            let before = student.balance();
            let (mut cart, staged) = common::cart(StudentId(1), prices);
            processor.settle(&student, &mut cart).unwrap();

            let paid: Decimal = staged
                .iter()
                .filter(|r| r.status() == ReservationStatus::Success)
                .map(|r| r.price())
                .sum();
            prop_assert_eq!(student.balance(), before - paid);
            prop_assert!(student.balance() >= Decimal::ZERO);
        }
    }

    /// A cart costing more than the balance fails as a whole.
    #[test]
    fn unaffordable_cart_fails_entirely(
        balance in arb_balance(),
        prices in prop::collection::vec(arb_price(), 1..6),
    ) {
        let total: Decimal = prices.iter().copied().sum();
        prop_assume!(total > balance);

        let processor = common::processor();
        let student = common::student(1, balance);
        let (mut cart, staged) = common::cart(StudentId(1), &prices);

        let settlement = processor.settle(&student, &mut cart).unwrap();

        let is_rejected = matches!(settlement, Settlement::Rejected { .. });
        prop_assert!(is_rejected);
        prop_assert!(staged.iter().all(|r| r.status() == ReservationStatus::Failed));
        prop_assert_eq!(student.balance(), balance);
        prop_assert!(processor.ledger().is_empty());
    }

    /// An affordable cart succeeds as a whole.
    #[test]
    fn affordable_cart_succeeds_entirely(
        prices in prop::collection::vec(arb_price(), 1..6),
        spare in arb_balance(),
    ) {
        let total: Decimal = prices.iter().copied().sum();
        let processor = common::processor();
        let student = common::student(1, total + spare);
        let (mut cart, staged) = common::cart(StudentId(1), &prices);

        let settlement = processor.settle(&student, &mut cart).unwrap();

        prop_assert!(settlement.is_committed());
        prop_assert!(staged.iter().all(|r| r.status() == ReservationStatus::Success));
        prop_assert_eq!(student.balance(), spare);
    }
}

// =============================================================================
// Ledger and Cart Reconciliation Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// After every settlement the cart is empty and the number of new
    /// COMPLETED transactions equals the number of new SUCCESS reservations,
    /// with matching amounts in cart order.
    #[test]
    fn ledger_reconciles_with_cart(
        balance in arb_balance(),
        carts in prop::collection::vec(arb_cart(), 1..8),
    ) {
        let processor = common::processor();
        let student = common::student(1, balance);

        for prices in &carts {
            let recorded_before = processor.ledger().len();
            let (mut cart, staged) = common::cart(StudentId(1), prices);
            processor.settle(&student, &mut cart).unwrap();

            prop_assert!(cart.is_empty());
            let succeeded: Vec<_> = staged
                .iter()
                .filter(|r| r.status() == ReservationStatus::Success)
                .collect();
            let ledger = processor.ledger().transactions();
            let new = &ledger[recorded_before..];
            prop_assert_eq!(new.len(), succeeded.len());
            for (transaction, reservation) in new.iter().zip(succeeded) {
                prop_assert_eq!(transaction.status(), TransactionStatus::Completed);
                prop_assert_eq!(transaction.reservation_id(), reservation.id());
                prop_assert_eq!(transaction.amount(), reservation.price());
            }
        }
    }

    /// Ids handed out by the ledger are strictly increasing and start at 1.
    #[test]
    fn ids_strictly_increase(count in 1usize..500) {
        let ledger = TransactionManager::new();
        let ids: Vec<u32> = (0..count).map(|_| ledger.next_id().unwrap().0).collect();

        prop_assert_eq!(ids[0], 1);
        prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }
}

// =============================================================================
// Cancellation Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Cancelling a cancelled reservation always fails and changes nothing.
    #[test]
    fn cancel_is_idempotent(price in arb_price(), repeats in 1usize..10) {
        let processor = common::processor();
        let student = common::student(1, price);
        let (mut cart, staged) = common::cart(StudentId(1), &[price]);
        processor.settle(&student, &mut cart).unwrap();
        let balance = student.balance();

        prop_assert!(staged[0].cancel());
        for _ in 0..repeats {
            prop_assert!(!staged[0].cancel());
            prop_assert_eq!(staged[0].status(), ReservationStatus::Cancelled);
        }
        prop_assert_eq!(student.balance(), balance);
    }
}
