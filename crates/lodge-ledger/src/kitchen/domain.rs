use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::store::PropertyId;

/// Identifier wrapper for stocked kitchen items.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InventoryItemId(pub String);

/// Identifier wrapper for dated meal plans.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MealPlanId(pub String);

impl fmt::Display for InventoryItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for MealPlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Kg,
    G,
    L,
    Ml,
    Pcs,
}

impl Unit {
    pub const fn label(self) -> &'static str {
        match self {
            Unit::Kg => "kg",
            Unit::G => "g",
            Unit::L => "l",
            Unit::Ml => "ml",
            Unit::Pcs => "pcs",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An amount paired with its unit, rendered as `6kg`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantity {
    pub amount: Decimal,
    pub unit: Unit,
}

impl Quantity {
    pub fn new(amount: Decimal, unit: Unit) -> Self {
        Self { amount, unit }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount.normalize(), self.unit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: InventoryItemId,
    pub property_id: PropertyId,
    pub name: String,
    pub unit: Unit,
    pub quantity: Decimal,
    pub min_quantity: Decimal,
    pub price_per_unit: Decimal,
    pub last_updated: DateTime<Utc>,
}

impl InventoryItem {
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.min_quantity
    }

    pub fn stock(&self) -> Quantity {
        Quantity::new(self.quantity, self.unit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MealKind {
    Breakfast,
    Lunch,
    Dinner,
}

/// One ingredient line of a meal, in whatever unit the cook wrote it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientRequirement {
    pub name: String,
    pub quantity: Decimal,
    pub unit: Unit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meal {
    #[serde(rename = "type")]
    pub kind: MealKind,
    #[serde(default)]
    pub items: Vec<IngredientRequirement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealPlan {
    pub id: MealPlanId,
    pub property_id: PropertyId,
    pub date: NaiveDate,
    pub meals: Vec<Meal>,
    pub created_at: DateTime<Utc>,
}

impl MealPlan {
    /// Every ingredient line across all meals, in plan order.
    pub fn requirements(&self) -> impl Iterator<Item = &IngredientRequirement> {
        self.meals.iter().flat_map(|meal| meal.items.iter())
    }
}
