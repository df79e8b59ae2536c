use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::clock::{Clock, FixedClock};
use crate::config::PolicyConfig;
use crate::lodging::domain::{
    BillingPeriod, Payment, PaymentId, Room, RoomId, RoomSnapshot, RoomType, Tenant, TenantId,
};
use crate::lodging::memory::{
    InMemoryPaymentRepository, InMemoryRoomRepository, InMemoryTenantRepository,
};
use crate::lodging::repository::{PaymentRepository, TenantRepository};
use crate::lodging::rooms::NewRoom;
use crate::lodging::router::LodgingServices;
use crate::lodging::tenancy::NewTenant;
use crate::store::{PropertyId, RepositoryError};

pub(super) type MemoryServices =
    LodgingServices<InMemoryRoomRepository, InMemoryTenantRepository, InMemoryPaymentRepository>;

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 15, 10, 0, 0)
        .single()
        .expect("valid instant")
}

pub(super) fn clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(now()))
}

pub(super) fn june() -> BillingPeriod {
    BillingPeriod::new(6, 2025).expect("valid period")
}

pub(super) fn property() -> PropertyId {
    PropertyId("prop-riverside".to_string())
}

pub(super) struct Harness {
    pub(super) rooms: Arc<InMemoryRoomRepository>,
    pub(super) tenants: Arc<InMemoryTenantRepository>,
    pub(super) payments: Arc<InMemoryPaymentRepository>,
    pub(super) services: MemoryServices,
}

pub(super) fn harness() -> Harness {
    let rooms = Arc::new(InMemoryRoomRepository::default());
    let tenants = Arc::new(InMemoryTenantRepository::default());
    let payments = Arc::new(InMemoryPaymentRepository::default());
    let services = LodgingServices::new(
        rooms.clone(),
        tenants.clone(),
        payments.clone(),
        clock(),
        PolicyConfig::default(),
    );
    Harness {
        rooms,
        tenants,
        payments,
        services,
    }
}

pub(super) fn services_with<T, P>(
    tenants: Arc<T>,
    payments: Arc<P>,
) -> LodgingServices<InMemoryRoomRepository, T, P>
where
    T: TenantRepository + 'static,
    P: PaymentRepository + 'static,
{
    LodgingServices::new(
        Arc::new(InMemoryRoomRepository::default()),
        tenants,
        payments,
        clock(),
        PolicyConfig::default(),
    )
}

pub(super) fn room_request(
    number: &str,
    room_type: RoomType,
    total_rent: Decimal,
    custom_capacity: Option<u32>,
) -> NewRoom {
    NewRoom {
        property_id: property(),
        number: number.to_string(),
        room_type,
        total_rent,
        custom_capacity,
    }
}

pub(super) fn tenant_request(name: &str, phone: &str, room_id: Option<&RoomId>) -> NewTenant {
    NewTenant {
        property_id: property(),
        name: name.to_string(),
        phone: phone.to_string(),
        email: None,
        room_id: room_id.cloned(),
        monthly_rent: None,
        security_deposit: None,
    }
}

pub(super) fn unassigned_request(name: &str, phone: &str, monthly_rent: Decimal) -> NewTenant {
    NewTenant {
        monthly_rent: Some(monthly_rent),
        ..tenant_request(name, phone, None)
    }
}

pub(super) fn add_room<T, P>(
    services: &LodgingServices<InMemoryRoomRepository, T, P>,
    number: &str,
    room_type: RoomType,
    total_rent: Decimal,
) -> RoomSnapshot
where
    T: TenantRepository + 'static,
    P: PaymentRepository + 'static,
{
    services
        .rooms
        .create_room(room_request(number, room_type, total_rent, None))
        .expect("room created")
}

/// Payment store that refuses every write.
#[derive(Default)]
pub(super) struct UnavailablePayments;

impl PaymentRepository for UnavailablePayments {
    fn insert(&self, _payment: Payment) -> Result<Payment, RepositoryError> {
        Err(RepositoryError::Unavailable("ledger offline".to_string()))
    }

    fn append(&self, _payments: Vec<Payment>) -> Result<Vec<Payment>, RepositoryError> {
        Err(RepositoryError::Unavailable("ledger offline".to_string()))
    }

    fn update_unlocked(&self, _payment: Payment) -> Result<bool, RepositoryError> {
        Err(RepositoryError::Unavailable("ledger offline".to_string()))
    }

    fn fetch(&self, _id: &PaymentId) -> Result<Option<Payment>, RepositoryError> {
        Ok(None)
    }

    fn list_by_tenant(&self, _tenant_id: &TenantId) -> Result<Vec<Payment>, RepositoryError> {
        Ok(Vec::new())
    }

    fn list_by_room_period(
        &self,
        _room_id: &RoomId,
        _period: BillingPeriod,
    ) -> Result<Vec<Payment>, RepositoryError> {
        Ok(Vec::new())
    }
}

/// Tenant store whose first `parties` occupancy counts are taken and then held at a barrier,
/// so concurrent assignments all observe the same pre-write occupancy.
pub(super) struct GatedTenants {
    pub(super) inner: InMemoryTenantRepository,
    barrier: Barrier,
    remaining: AtomicUsize,
}

impl GatedTenants {
    pub(super) fn new(parties: usize) -> Self {
        Self {
            inner: InMemoryTenantRepository::default(),
            barrier: Barrier::new(parties),
            remaining: AtomicUsize::new(0),
        }
    }

    pub(super) fn arm(&self, parties: usize) {
        self.remaining.store(parties, Ordering::SeqCst);
    }
}

impl TenantRepository for GatedTenants {
    fn insert(&self, tenant: Tenant) -> Result<Tenant, RepositoryError> {
        self.inner.insert(tenant)
    }

    fn update(&self, tenant: Tenant) -> Result<(), RepositoryError> {
        self.inner.update(tenant)
    }

    fn fetch(&self, id: &TenantId) -> Result<Option<Tenant>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn delete(&self, id: &TenantId) -> Result<Option<Tenant>, RepositoryError> {
        self.inner.delete(id)
    }

    fn count_by_room(&self, room_id: &RoomId) -> Result<u32, RepositoryError> {
        let count = self.inner.count_by_room(room_id)?;
        let gated = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if gated {
            self.barrier.wait();
        }
        Ok(count)
    }

    fn list_by_room(&self, room_id: &RoomId) -> Result<Vec<Tenant>, RepositoryError> {
        self.inner.list_by_room(room_id)
    }

    fn find_by_phone(&self, phone: &str) -> Result<Option<Tenant>, RepositoryError> {
        self.inner.find_by_phone(phone)
    }
}

/// Payment store whose first `parties` fetches are held at a barrier, so concurrent status
/// changes all load the same entry before either writes.
pub(super) struct GatedPayments {
    pub(super) inner: InMemoryPaymentRepository,
    barrier: Barrier,
    remaining: AtomicUsize,
}

impl GatedPayments {
    pub(super) fn new(parties: usize) -> Self {
        Self {
            inner: InMemoryPaymentRepository::default(),
            barrier: Barrier::new(parties),
            remaining: AtomicUsize::new(0),
        }
    }

    pub(super) fn arm(&self, parties: usize) {
        self.remaining.store(parties, Ordering::SeqCst);
    }
}

impl PaymentRepository for GatedPayments {
    fn insert(&self, payment: Payment) -> Result<Payment, RepositoryError> {
        self.inner.insert(payment)
    }

    fn append(&self, payments: Vec<Payment>) -> Result<Vec<Payment>, RepositoryError> {
        self.inner.append(payments)
    }

    fn update_unlocked(&self, payment: Payment) -> Result<bool, RepositoryError> {
        self.inner.update_unlocked(payment)
    }

    fn fetch(&self, id: &PaymentId) -> Result<Option<Payment>, RepositoryError> {
        let found = self.inner.fetch(id)?;
        let gated = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if gated {
            self.barrier.wait();
        }
        Ok(found)
    }

    fn list_by_tenant(&self, tenant_id: &TenantId) -> Result<Vec<Payment>, RepositoryError> {
        self.inner.list_by_tenant(tenant_id)
    }

    fn list_by_room_period(
        &self,
        room_id: &RoomId,
        period: BillingPeriod,
    ) -> Result<Vec<Payment>, RepositoryError> {
        self.inner.list_by_room_period(room_id, period)
    }
}

pub(super) fn stored_room(harness: &Harness, room_id: &RoomId) -> Room {
    use crate::lodging::repository::RoomRepository;
    harness
        .rooms
        .fetch(room_id)
        .expect("fetch succeeds")
        .expect("room present")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
