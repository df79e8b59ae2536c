use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{InventoryItem, InventoryItemId, Meal, MealPlan, MealPlanId, Unit};
use super::repository::{InventoryRepository, MealPlanRepository};
use crate::clock::Clock;
use crate::error::ErrorKind;
use crate::store::{PropertyId, RepositoryError};

static ITEM_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static PLAN_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_item_id() -> InventoryItemId {
    let id = ITEM_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    InventoryItemId(format!("item-{id:06}"))
}

fn next_plan_id() -> MealPlanId {
    let id = PLAN_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    MealPlanId(format!("plan-{id:06}"))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInventoryItem {
    pub property_id: PropertyId,
    pub name: String,
    #[serde(default)]
    pub unit: Unit,
    #[serde(default)]
    pub quantity: Decimal,
    #[serde(default)]
    pub min_quantity: Decimal,
    #[serde(default)]
    pub price_per_unit: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMealPlan {
    pub property_id: PropertyId,
    pub date: NaiveDate,
    #[serde(default)]
    pub meals: Vec<Meal>,
}

/// Stock items and meal plans, keyed per property.
pub struct KitchenCatalog<I, M> {
    inventory: Arc<I>,
    plans: Arc<M>,
    clock: Arc<dyn Clock>,
}

impl<I, M> KitchenCatalog<I, M>
where
    I: InventoryRepository + 'static,
    M: MealPlanRepository + 'static,
{
    pub fn new(inventory: Arc<I>, plans: Arc<M>, clock: Arc<dyn Clock>) -> Self {
        Self {
            inventory,
            plans,
            clock,
        }
    }

    pub fn create_item(&self, request: NewInventoryItem) -> Result<InventoryItem, CatalogError> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(CatalogError::Validation("item name is required".to_string()));
        }
        if request.quantity < Decimal::ZERO
            || request.min_quantity < Decimal::ZERO
            || request.price_per_unit < Decimal::ZERO
        {
            return Err(CatalogError::Validation(
                "quantity, minimum quantity and price cannot be negative".to_string(),
            ));
        }
        if self
            .inventory
            .find_by_name(&request.property_id, &name)?
            .is_some()
        {
            return Err(CatalogError::Validation(format!(
                "{name} is already stocked in property {}",
                request.property_id
            )));
        }

        let item = self.inventory.insert(InventoryItem {
            id: next_item_id(),
            property_id: request.property_id,
            name,
            unit: request.unit,
            quantity: request.quantity,
            min_quantity: request.min_quantity,
            price_per_unit: request.price_per_unit,
            last_updated: self.clock.now(),
        })?;
        info!(item_id = %item.id, name = %item.name, stock = %item.stock(), "inventory item added");
        Ok(item)
    }

    pub fn get_item(&self, item_id: &InventoryItemId) -> Result<InventoryItem, CatalogError> {
        self.inventory
            .fetch(item_id)?
            .ok_or_else(|| CatalogError::ItemNotFound(item_id.clone()))
    }

    /// Items of a property sorted by name.
    pub fn list_items(&self, property_id: &PropertyId) -> Result<Vec<InventoryItem>, CatalogError> {
        Ok(self.inventory.list_by_property(property_id)?)
    }

    /// Items at or below their minimum quantity.
    pub fn low_stock(&self, property_id: &PropertyId) -> Result<Vec<InventoryItem>, CatalogError> {
        Ok(self
            .list_items(property_id)?
            .into_iter()
            .filter(InventoryItem::is_low_stock)
            .collect())
    }

    /// Stores a plan as written. Ingredients are only checked against stock when the plan is
    /// validated or applied.
    pub fn create_plan(&self, request: NewMealPlan) -> Result<MealPlan, CatalogError> {
        for item in request.meals.iter().flat_map(|meal| meal.items.iter()) {
            if item.name.trim().is_empty() {
                return Err(CatalogError::Validation(
                    "ingredient name is required".to_string(),
                ));
            }
            if item.quantity < Decimal::ZERO {
                return Err(CatalogError::Validation(format!(
                    "ingredient {} has a negative quantity",
                    item.name
                )));
            }
        }
        if self
            .plans
            .find_by_date(&request.property_id, request.date)?
            .is_some()
        {
            return Err(CatalogError::Validation(format!(
                "a meal plan for {} already exists in property {}",
                request.date, request.property_id
            )));
        }

        let plan = self.plans.insert(MealPlan {
            id: next_plan_id(),
            property_id: request.property_id,
            date: request.date,
            meals: request.meals,
            created_at: self.clock.now(),
        })?;
        info!(plan_id = %plan.id, date = %plan.date, meals = plan.meals.len(), "meal plan created");
        Ok(plan)
    }

    pub fn get_plan(&self, plan_id: &MealPlanId) -> Result<MealPlan, CatalogError> {
        self.plans
            .fetch(plan_id)?
            .ok_or_else(|| CatalogError::PlanNotFound(plan_id.clone()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("invalid kitchen record: {0}")]
    Validation(String),
    #[error("inventory item {0} not found")]
    ItemNotFound(InventoryItemId),
    #[error("meal plan {0} not found")]
    PlanNotFound(MealPlanId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::Validation(_) => ErrorKind::Validation,
            CatalogError::ItemNotFound(_) | CatalogError::PlanNotFound(_) => ErrorKind::NotFound,
            CatalogError::Repository(err) => err.kind(),
        }
    }
}
