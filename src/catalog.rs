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

//! Meals, dining halls and the in-memory catalog the core reads them from.
//!
//! The settlement path only ever reads a meal's id, type and current price.
//! Price updates are administrative and take effect for any settlement that
//! runs after them.
//!
//! # Example
//!
//! ```
//! use dining_ledger_rs::{Catalog, DiningHall, HallId, Meal, MealId, MealType};
//! use rust_decimal_macros::dec;
//!
//! let catalog = Catalog::new();
//! catalog.add_meal(Meal::new(MealId(1), "Omelette", dec!(4.50), MealType::Breakfast).unwrap());
//! catalog.add_hall(DiningHall::new(HallId(1), "North", "1 Campus Way", 200));
//!
//! assert_eq!(catalog.meal(MealId(1)).unwrap().price(), dec!(4.50));
//! ```

use crate::DiningError;
use crate::base::{Describe, HallId, MealId};
use dashmap::DashMap;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Meal category, used for the one-per-type-per-day staging check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
        };
        f.write_str(name)
    }
}

impl FromStr for MealType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "breakfast" => Ok(Self::Breakfast),
            "lunch" => Ok(Self::Lunch),
            "dinner" => Ok(Self::Dinner),
            other => Err(format!("unknown meal type '{other}'")),
        }
    }
}

/// A meal on the menu.
#[derive(Debug)]
pub struct Meal {
    id: MealId,
    name: String,
    meal_type: MealType,
    price: RwLock<Decimal>,
    side_items: RwLock<Vec<String>>,
}

impl Meal {
    /// Creates a meal.
    ///
    /// # Errors
    ///
    /// [`DiningError::InvalidAmount`] if `price` is negative.
    pub fn new(
        id: MealId,
        name: impl Into<String>,
        price: Decimal,
        meal_type: MealType,
    ) -> Result<Self, DiningError> {
        if price < Decimal::ZERO {
            return Err(DiningError::InvalidAmount);
        }
        Ok(Self {
            id,
            name: name.into(),
            meal_type,
            price: RwLock::new(price),
            side_items: RwLock::new(Vec::new()),
        })
    }

    pub fn id(&self) -> MealId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn meal_type(&self) -> MealType {
        self.meal_type
    }

    pub fn price(&self) -> Decimal {
        *self.price.read()
    }

    /// Replaces the price. Reservations already settled keep the amount
    /// recorded in their transaction.
    pub fn update_price(&self, new_price: Decimal) -> Result<(), DiningError> {
        if new_price < Decimal::ZERO {
            return Err(DiningError::InvalidAmount);
        }
        *self.price.write() = new_price;
        Ok(())
    }

    pub fn add_side_item(&self, item: impl Into<String>) {
        self.side_items.write().push(item.into());
    }

    pub fn side_items(&self) -> Vec<String> {
        self.side_items.read().clone()
    }
}

impl Describe for Meal {
    fn describe(&self) -> String {
        let sides = self.side_items();
        let mut out = format!(
            "Meal #{} {} ({}) - {}",
            self.id,
            self.name,
            self.meal_type,
            self.price()
        );
        if !sides.is_empty() {
            out.push_str(&format!("\n  sides: {}", sides.join(", ")));
        }
        out
    }
}

/// A dining hall. Capacity is informational; nothing enforces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiningHall {
    id: HallId,
    name: String,
    address: String,
    capacity: u32,
}

impl DiningHall {
    pub fn new(
        id: HallId,
        name: impl Into<String>,
        address: impl Into<String>,
        capacity: u32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            address: address.into(),
            capacity,
        }
    }

    pub fn id(&self) -> HallId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }
}

impl Describe for DiningHall {
    fn describe(&self) -> String {
        format!(
            "Dining hall #{} {}\n  address: {}\n  capacity: {}",
            self.id, self.name, self.address, self.capacity
        )
    }
}

/// Read-mostly lookup of meals and halls.
#[derive(Debug, Default)]
pub struct Catalog {
    meals: DashMap<MealId, Arc<Meal>>,
    halls: DashMap<HallId, Arc<DiningHall>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a meal, replacing any meal with the same id.
    pub fn add_meal(&self, meal: Meal) -> Arc<Meal> {
        let meal = Arc::new(meal);
        self.meals.insert(meal.id(), Arc::clone(&meal));
        meal
    }

    /// Inserts a hall, replacing any hall with the same id.
    pub fn add_hall(&self, hall: DiningHall) -> Arc<DiningHall> {
        let hall = Arc::new(hall);
        self.halls.insert(hall.id(), Arc::clone(&hall));
        hall
    }

    pub fn meal(&self, id: MealId) -> Result<Arc<Meal>, DiningError> {
        self.meals
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(DiningError::MealNotFound(id))
    }

    pub fn hall(&self, id: HallId) -> Result<Arc<DiningHall>, DiningError> {
        self.halls
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(DiningError::HallNotFound(id))
    }

    /// All meals, ordered by id.
    pub fn meals(&self) -> Vec<Arc<Meal>> {
        let mut meals: Vec<_> = self.meals.iter().map(|e| Arc::clone(e.value())).collect();
        meals.sort_by_key(|meal| meal.id());
        meals
    }

    /// All halls, ordered by id.
    pub fn halls(&self) -> Vec<Arc<DiningHall>> {
        let mut halls: Vec<_> = self.halls.iter().map(|e| Arc::clone(e.value())).collect();
        halls.sort_by_key(|hall| hall.id());
        halls
    }
}
