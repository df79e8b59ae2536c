use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use super::domain::{InventoryItem, InventoryItemId, MealPlan, MealPlanId};
use super::repository::{InventoryRepository, MealPlanRepository};
use crate::store::{lock, PropertyId, RepositoryError};

#[derive(Default, Clone)]
pub struct InMemoryInventoryRepository {
    records: Arc<Mutex<HashMap<InventoryItemId, InventoryItem>>>,
}

impl InventoryRepository for InMemoryInventoryRepository {
    fn insert(&self, item: InventoryItem) -> Result<InventoryItem, RepositoryError> {
        let mut guard = lock(&self.records)?;
        if guard.contains_key(&item.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(item.id.clone(), item.clone());
        Ok(item)
    }

    fn update(&self, item: InventoryItem) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.records)?;
        match guard.get_mut(&item.id) {
            Some(existing) => {
                *existing = item;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: &InventoryItemId) -> Result<Option<InventoryItem>, RepositoryError> {
        Ok(lock(&self.records)?.get(id).cloned())
    }

    fn find_by_name(
        &self,
        property_id: &PropertyId,
        name: &str,
    ) -> Result<Option<InventoryItem>, RepositoryError> {
        let wanted = name.to_lowercase();
        Ok(lock(&self.records)?
            .values()
            .find(|item| &item.property_id == property_id && item.name.to_lowercase() == wanted)
            .cloned())
    }

    fn list_by_property(
        &self,
        property_id: &PropertyId,
    ) -> Result<Vec<InventoryItem>, RepositoryError> {
        let mut items: Vec<InventoryItem> = lock(&self.records)?
            .values()
            .filter(|item| &item.property_id == property_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }
}

#[derive(Default, Clone)]
pub struct InMemoryMealPlanRepository {
    records: Arc<Mutex<HashMap<MealPlanId, MealPlan>>>,
}

impl MealPlanRepository for InMemoryMealPlanRepository {
    fn insert(&self, plan: MealPlan) -> Result<MealPlan, RepositoryError> {
        let mut guard = lock(&self.records)?;
        if guard.contains_key(&plan.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(plan.id.clone(), plan.clone());
        Ok(plan)
    }

    fn fetch(&self, id: &MealPlanId) -> Result<Option<MealPlan>, RepositoryError> {
        Ok(lock(&self.records)?.get(id).cloned())
    }

    fn find_by_date(
        &self,
        property_id: &PropertyId,
        date: NaiveDate,
    ) -> Result<Option<MealPlan>, RepositoryError> {
        Ok(lock(&self.records)?
            .values()
            .find(|plan| &plan.property_id == property_id && plan.date == date)
            .cloned())
    }
}
