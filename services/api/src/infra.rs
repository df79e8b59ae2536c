use chrono::NaiveDate;
use lodge_ledger::clock::Clock;
use lodge_ledger::config::PolicyConfig;
use lodge_ledger::kitchen::{
    InMemoryInventoryRepository, InMemoryMealPlanRepository, KitchenServices,
};
use lodge_ledger::lodging::{
    InMemoryPaymentRepository, InMemoryRoomRepository, InMemoryTenantRepository, LodgingServices,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type MemoryLodging =
    LodgingServices<InMemoryRoomRepository, InMemoryTenantRepository, InMemoryPaymentRepository>;

pub(crate) type MemoryKitchen =
    KitchenServices<InMemoryInventoryRepository, InMemoryMealPlanRepository>;

/// Lodging and kitchen services over fresh in-memory stores sharing one clock.
pub(crate) fn in_memory_services(
    clock: Arc<dyn Clock>,
    policy: PolicyConfig,
) -> (MemoryLodging, MemoryKitchen) {
    let lodging = LodgingServices::new(
        Arc::new(InMemoryRoomRepository::default()),
        Arc::new(InMemoryTenantRepository::default()),
        Arc::new(InMemoryPaymentRepository::default()),
        clock.clone(),
        policy,
    );
    let kitchen = KitchenServices::new(
        Arc::new(InMemoryInventoryRepository::default()),
        Arc::new(InMemoryMealPlanRepository::default()),
        clock,
    );
    (lodging, kitchen)
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
