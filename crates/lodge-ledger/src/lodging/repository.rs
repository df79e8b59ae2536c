use super::domain::{BillingPeriod, Payment, PaymentId, Room, RoomId, Tenant, TenantId};
use crate::store::{PropertyId, RepositoryError};

/// Room storage. Rooms are never deleted by the core.
pub trait RoomRepository: Send + Sync {
    fn insert(&self, room: Room) -> Result<Room, RepositoryError>;
    fn update(&self, room: Room) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &RoomId) -> Result<Option<Room>, RepositoryError>;
    fn find_by_number(
        &self,
        property_id: &PropertyId,
        number: &str,
    ) -> Result<Option<Room>, RepositoryError>;
}

/// Tenant storage. The room binding lives only here, so occupancy is always a count over it.
pub trait TenantRepository: Send + Sync {
    fn insert(&self, tenant: Tenant) -> Result<Tenant, RepositoryError>;
    fn update(&self, tenant: Tenant) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &TenantId) -> Result<Option<Tenant>, RepositoryError>;
    fn delete(&self, id: &TenantId) -> Result<Option<Tenant>, RepositoryError>;
    fn count_by_room(&self, room_id: &RoomId) -> Result<u32, RepositoryError>;
    fn list_by_room(&self, room_id: &RoomId) -> Result<Vec<Tenant>, RepositoryError>;
    fn find_by_phone(&self, phone: &str) -> Result<Option<Tenant>, RepositoryError>;
}

/// Append-mostly payment ledger. Entries are updated in place but never removed.
pub trait PaymentRepository: Send + Sync {
    fn insert(&self, payment: Payment) -> Result<Payment, RepositoryError>;
    /// Appends every entry or none of them.
    fn append(&self, payments: Vec<Payment>) -> Result<Vec<Payment>, RepositoryError>;
    /// Replaces an entry only while the stored copy is still unlocked. Returns `false`, writing
    /// nothing, when the entry was locked after the caller read it.
    fn update_unlocked(&self, payment: Payment) -> Result<bool, RepositoryError>;
    fn fetch(&self, id: &PaymentId) -> Result<Option<Payment>, RepositoryError>;
    fn list_by_tenant(&self, tenant_id: &TenantId) -> Result<Vec<Payment>, RepositoryError>;
    fn list_by_room_period(
        &self,
        room_id: &RoomId,
        period: BillingPeriod,
    ) -> Result<Vec<Payment>, RepositoryError>;
}
