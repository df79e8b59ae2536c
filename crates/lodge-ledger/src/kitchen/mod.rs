//! Kitchen stock and meal plan consumption.

pub mod catalog;
pub mod domain;
pub mod memory;
pub mod repository;
pub mod router;
pub mod units;
pub mod usage;

#[cfg(test)]
mod tests;

pub use catalog::{CatalogError, KitchenCatalog, NewInventoryItem, NewMealPlan};
pub use domain::{
    IngredientRequirement, InventoryItem, InventoryItemId, Meal, MealKind, MealPlan, MealPlanId,
    Quantity, Unit,
};
pub use memory::{InMemoryInventoryRepository, InMemoryMealPlanRepository};
pub use repository::{InventoryRepository, MealPlanRepository};
pub use router::{kitchen_router, KitchenServices};
pub use units::{convert, Conversion};
pub use usage::{
    AppliedUsage, InventoryUsageEngine, UsageApplication, UsageError, UsageIssue, UsageReport,
    ValidatedPlan,
};
