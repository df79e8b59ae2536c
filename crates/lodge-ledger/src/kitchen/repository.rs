use chrono::NaiveDate;

use super::domain::{InventoryItem, InventoryItemId, MealPlan, MealPlanId};
use crate::store::{PropertyId, RepositoryError};

pub trait InventoryRepository: Send + Sync {
    fn insert(&self, item: InventoryItem) -> Result<InventoryItem, RepositoryError>;
    fn update(&self, item: InventoryItem) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &InventoryItemId) -> Result<Option<InventoryItem>, RepositoryError>;
    /// Case-insensitive lookup of an item by name within one property.
    fn find_by_name(
        &self,
        property_id: &PropertyId,
        name: &str,
    ) -> Result<Option<InventoryItem>, RepositoryError>;
    fn list_by_property(
        &self,
        property_id: &PropertyId,
    ) -> Result<Vec<InventoryItem>, RepositoryError>;
}

pub trait MealPlanRepository: Send + Sync {
    fn insert(&self, plan: MealPlan) -> Result<MealPlan, RepositoryError>;
    fn fetch(&self, id: &MealPlanId) -> Result<Option<MealPlan>, RepositoryError>;
    fn find_by_date(
        &self,
        property_id: &PropertyId,
        date: NaiveDate,
    ) -> Result<Option<MealPlan>, RepositoryError>;
}
