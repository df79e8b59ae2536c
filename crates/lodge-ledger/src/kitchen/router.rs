use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use super::catalog::{CatalogError, KitchenCatalog, NewInventoryItem, NewMealPlan};
use super::domain::{InventoryItemId, MealPlanId};
use super::repository::{InventoryRepository, MealPlanRepository};
use super::usage::{InventoryUsageEngine, UsageError};
use crate::clock::Clock;
use crate::error::error_response;
use crate::store::PropertyId;

/// Catalog and usage engine sharing one set of kitchen stores.
pub struct KitchenServices<I, M> {
    pub catalog: Arc<KitchenCatalog<I, M>>,
    pub usage: Arc<InventoryUsageEngine<I, M>>,
}

impl<I, M> Clone for KitchenServices<I, M> {
    fn clone(&self) -> Self {
        Self {
            catalog: self.catalog.clone(),
            usage: self.usage.clone(),
        }
    }
}

impl<I, M> KitchenServices<I, M>
where
    I: InventoryRepository + 'static,
    M: MealPlanRepository + 'static,
{
    pub fn new(inventory: Arc<I>, plans: Arc<M>, clock: Arc<dyn Clock>) -> Self {
        Self {
            catalog: Arc::new(KitchenCatalog::new(
                inventory.clone(),
                plans.clone(),
                clock.clone(),
            )),
            usage: Arc::new(InventoryUsageEngine::new(inventory, plans, clock)),
        }
    }
}

/// Router builder exposing inventory and meal plan endpoints.
pub fn kitchen_router<I, M>(services: KitchenServices<I, M>) -> Router
where
    I: InventoryRepository + 'static,
    M: MealPlanRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/inventory",
            get(list_items_handler::<I, M>).post(create_item_handler::<I, M>),
        )
        .route("/api/v1/inventory/low-stock", get(low_stock_handler::<I, M>))
        .route(
            "/api/v1/inventory/:item_id/adjust",
            patch(adjust_handler::<I, M>),
        )
        .route("/api/v1/meal-plans", post(create_plan_handler::<I, M>))
        .route("/api/v1/meal-plans/:plan_id", get(plan_handler::<I, M>))
        .route(
            "/api/v1/meal-plans/:plan_id/validate",
            post(validate_handler::<I, M>),
        )
        .route("/api/v1/meals/apply-usage", post(apply_usage_handler::<I, M>))
        .with_state(services)
}

#[derive(Debug, Deserialize)]
pub(crate) struct PropertyQuery {
    pub(crate) property_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AdjustRequest {
    pub(crate) delta: Decimal,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApplyUsageRequest {
    pub(crate) meal_plan_id: MealPlanId,
}

pub(crate) async fn list_items_handler<I, M>(
    State(services): State<KitchenServices<I, M>>,
    Query(query): Query<PropertyQuery>,
) -> Response
where
    I: InventoryRepository + 'static,
    M: MealPlanRepository + 'static,
{
    match services.catalog.list_items(&PropertyId(query.property_id)) {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn create_item_handler<I, M>(
    State(services): State<KitchenServices<I, M>>,
    Json(request): Json<NewInventoryItem>,
) -> Response
where
    I: InventoryRepository + 'static,
    M: MealPlanRepository + 'static,
{
    match services.catalog.create_item(request) {
        Ok(item) => (StatusCode::CREATED, Json(item)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn low_stock_handler<I, M>(
    State(services): State<KitchenServices<I, M>>,
    Query(query): Query<PropertyQuery>,
) -> Response
where
    I: InventoryRepository + 'static,
    M: MealPlanRepository + 'static,
{
    match services.catalog.low_stock(&PropertyId(query.property_id)) {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn adjust_handler<I, M>(
    State(services): State<KitchenServices<I, M>>,
    Path(item_id): Path<String>,
    Json(request): Json<AdjustRequest>,
) -> Response
where
    I: InventoryRepository + 'static,
    M: MealPlanRepository + 'static,
{
    match services
        .usage
        .adjust(&InventoryItemId(item_id), request.delta)
    {
        Ok(item) => (StatusCode::OK, Json(item)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn create_plan_handler<I, M>(
    State(services): State<KitchenServices<I, M>>,
    Json(request): Json<NewMealPlan>,
) -> Response
where
    I: InventoryRepository + 'static,
    M: MealPlanRepository + 'static,
{
    match services.catalog.create_plan(request) {
        Ok(plan) => (StatusCode::CREATED, Json(plan)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn plan_handler<I, M>(
    State(services): State<KitchenServices<I, M>>,
    Path(plan_id): Path<String>,
) -> Response
where
    I: InventoryRepository + 'static,
    M: MealPlanRepository + 'static,
{
    match services.catalog.get_plan(&MealPlanId(plan_id)) {
        Ok(plan) => (StatusCode::OK, Json(plan)).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Dry run: reports every missing or short ingredient without touching stock.
pub(crate) async fn validate_handler<I, M>(
    State(services): State<KitchenServices<I, M>>,
    Path(plan_id): Path<String>,
) -> Response
where
    I: InventoryRepository + 'static,
    M: MealPlanRepository + 'static,
{
    let plan = match services.catalog.get_plan(&MealPlanId(plan_id)) {
        Ok(plan) => plan,
        Err(err) => return err.into_response(),
    };
    match services.usage.check(&plan) {
        Ok(report) => {
            let payload = json!({
                "plan_id": report.plan_id,
                "valid": report.is_clean(),
                "issues": report.issues,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn apply_usage_handler<I, M>(
    State(services): State<KitchenServices<I, M>>,
    Json(request): Json<ApplyUsageRequest>,
) -> Response
where
    I: InventoryRepository + 'static,
    M: MealPlanRepository + 'static,
{
    match services.usage.apply_usage(&request.meal_plan_id) {
        Ok(application) => {
            let payload = json!({
                "plan_id": application.plan_id,
                "applied": application.applied,
                "applied_items": application.summary(),
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        error_response(self.kind(), self.to_string(), None)
    }
}

impl IntoResponse for UsageError {
    fn into_response(self) -> Response {
        error_response(self.kind(), self.to_string(), self.items())
    }
}
