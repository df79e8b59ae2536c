use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::clock::{Clock, FixedClock};
use crate::kitchen::catalog::{NewInventoryItem, NewMealPlan};
use crate::kitchen::domain::{
    IngredientRequirement, InventoryItem, InventoryItemId, Meal, MealKind, MealPlan, Unit,
};
use crate::kitchen::memory::{InMemoryInventoryRepository, InMemoryMealPlanRepository};
use crate::kitchen::repository::{InventoryRepository, MealPlanRepository};
use crate::kitchen::router::KitchenServices;
use crate::store::{PropertyId, RepositoryError};

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 15, 6, 30, 0)
        .single()
        .expect("valid instant")
}

pub(super) fn clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(now()))
}

pub(super) fn property() -> PropertyId {
    PropertyId("prop-riverside".to_string())
}

pub(super) fn day(offset: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 16 + offset).expect("valid date")
}

pub(super) struct Harness {
    pub(super) inventory: Arc<InMemoryInventoryRepository>,
    pub(super) services: KitchenServices<InMemoryInventoryRepository, InMemoryMealPlanRepository>,
}

pub(super) fn harness() -> Harness {
    let inventory = Arc::new(InMemoryInventoryRepository::default());
    let plans = Arc::new(InMemoryMealPlanRepository::default());
    Harness {
        services: KitchenServices::new(inventory.clone(), plans, clock()),
        inventory,
    }
}

pub(super) fn stock<I, M>(
    services: &KitchenServices<I, M>,
    name: &str,
    unit: Unit,
    quantity: Decimal,
) -> InventoryItem
where
    I: InventoryRepository + 'static,
    M: MealPlanRepository + 'static,
{
    services
        .catalog
        .create_item(NewInventoryItem {
            property_id: property(),
            name: name.to_string(),
            unit,
            quantity,
            min_quantity: Decimal::ONE,
            price_per_unit: Decimal::ZERO,
        })
        .expect("item stocked")
}

pub(super) fn ingredient(name: &str, quantity: Decimal, unit: Unit) -> IngredientRequirement {
    IngredientRequirement {
        name: name.to_string(),
        quantity,
        unit,
    }
}

pub(super) fn meal(kind: MealKind, items: Vec<IngredientRequirement>) -> Meal {
    Meal { kind, items }
}

pub(super) fn plan<I, M>(
    services: &KitchenServices<I, M>,
    date: NaiveDate,
    meals: Vec<Meal>,
) -> MealPlan
where
    I: InventoryRepository + 'static,
    M: MealPlanRepository + 'static,
{
    services
        .catalog
        .create_plan(NewMealPlan {
            property_id: property(),
            date,
            meals,
        })
        .expect("plan created")
}

pub(super) fn quantity_of(harness: &Harness, item_id: &InventoryItemId) -> Decimal {
    harness
        .inventory
        .fetch(item_id)
        .expect("fetch succeeds")
        .expect("item present")
        .quantity
}

/// Inventory store that accepts a fixed number of updates and then goes offline.
pub(super) struct FlakyInventory {
    pub(super) inner: InMemoryInventoryRepository,
    updates_left: AtomicUsize,
}

impl FlakyInventory {
    pub(super) fn new(updates_allowed: usize) -> Self {
        Self {
            inner: InMemoryInventoryRepository::default(),
            updates_left: AtomicUsize::new(updates_allowed),
        }
    }
}

impl InventoryRepository for FlakyInventory {
    fn insert(&self, item: InventoryItem) -> Result<InventoryItem, RepositoryError> {
        self.inner.insert(item)
    }

    fn update(&self, item: InventoryItem) -> Result<(), RepositoryError> {
        let allowed = self
            .updates_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if !allowed {
            return Err(RepositoryError::Unavailable("inventory offline".to_string()));
        }
        self.inner.update(item)
    }

    fn fetch(&self, id: &InventoryItemId) -> Result<Option<InventoryItem>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn find_by_name(
        &self,
        property_id: &PropertyId,
        name: &str,
    ) -> Result<Option<InventoryItem>, RepositoryError> {
        self.inner.find_by_name(property_id, name)
    }

    fn list_by_property(
        &self,
        property_id: &PropertyId,
    ) -> Result<Vec<InventoryItem>, RepositoryError> {
        self.inner.list_by_property(property_id)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
