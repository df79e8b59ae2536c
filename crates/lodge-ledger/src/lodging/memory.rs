//! Mutex-backed stores used by the service binary, the demo and the test suites.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::domain::{BillingPeriod, Payment, PaymentId, Room, RoomId, Tenant, TenantId};
use super::repository::{PaymentRepository, RoomRepository, TenantRepository};
use crate::store::{lock, PropertyId, RepositoryError};

#[derive(Default, Clone)]
pub struct InMemoryRoomRepository {
    records: Arc<Mutex<HashMap<RoomId, Room>>>,
}

impl RoomRepository for InMemoryRoomRepository {
    fn insert(&self, room: Room) -> Result<Room, RepositoryError> {
        let mut guard = lock(&self.records)?;
        if guard.contains_key(&room.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(room.id.clone(), room.clone());
        Ok(room)
    }

    fn update(&self, room: Room) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.records)?;
        match guard.get_mut(&room.id) {
            Some(existing) => {
                *existing = room;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: &RoomId) -> Result<Option<Room>, RepositoryError> {
        Ok(lock(&self.records)?.get(id).cloned())
    }

    fn find_by_number(
        &self,
        property_id: &PropertyId,
        number: &str,
    ) -> Result<Option<Room>, RepositoryError> {
        Ok(lock(&self.records)?
            .values()
            .find(|room| &room.property_id == property_id && room.number == number)
            .cloned())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryTenantRepository {
    records: Arc<Mutex<HashMap<TenantId, Tenant>>>,
}

impl TenantRepository for InMemoryTenantRepository {
    fn insert(&self, tenant: Tenant) -> Result<Tenant, RepositoryError> {
        let mut guard = lock(&self.records)?;
        if guard.contains_key(&tenant.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(tenant.id.clone(), tenant.clone());
        Ok(tenant)
    }

    fn update(&self, tenant: Tenant) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.records)?;
        match guard.get_mut(&tenant.id) {
            Some(existing) => {
                *existing = tenant;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: &TenantId) -> Result<Option<Tenant>, RepositoryError> {
        Ok(lock(&self.records)?.get(id).cloned())
    }

    fn delete(&self, id: &TenantId) -> Result<Option<Tenant>, RepositoryError> {
        Ok(lock(&self.records)?.remove(id))
    }

    fn count_by_room(&self, room_id: &RoomId) -> Result<u32, RepositoryError> {
        let count = lock(&self.records)?
            .values()
            .filter(|tenant| tenant.room_id.as_ref() == Some(room_id))
            .count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    fn list_by_room(&self, room_id: &RoomId) -> Result<Vec<Tenant>, RepositoryError> {
        let mut tenants: Vec<Tenant> = lock(&self.records)?
            .values()
            .filter(|tenant| tenant.room_id.as_ref() == Some(room_id))
            .cloned()
            .collect();
        tenants.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(tenants)
    }

    fn find_by_phone(&self, phone: &str) -> Result<Option<Tenant>, RepositoryError> {
        Ok(lock(&self.records)?
            .values()
            .find(|tenant| tenant.phone == phone)
            .cloned())
    }
}

/// Payments kept in insertion order.
#[derive(Default, Clone)]
pub struct InMemoryPaymentRepository {
    records: Arc<Mutex<Vec<Payment>>>,
}

impl InMemoryPaymentRepository {
    pub fn all(&self) -> Result<Vec<Payment>, RepositoryError> {
        Ok(lock(&self.records)?.clone())
    }
}

impl PaymentRepository for InMemoryPaymentRepository {
    fn insert(&self, payment: Payment) -> Result<Payment, RepositoryError> {
        let mut guard = lock(&self.records)?;
        if guard.iter().any(|existing| existing.id == payment.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(payment.clone());
        Ok(payment)
    }

    fn append(&self, payments: Vec<Payment>) -> Result<Vec<Payment>, RepositoryError> {
        let mut guard = lock(&self.records)?;
        let duplicate = payments.iter().enumerate().any(|(index, payment)| {
            guard.iter().any(|existing| existing.id == payment.id)
                || payments[..index].iter().any(|other| other.id == payment.id)
        });
        if duplicate {
            return Err(RepositoryError::Conflict);
        }
        guard.extend(payments.iter().cloned());
        Ok(payments)
    }

    fn update_unlocked(&self, payment: Payment) -> Result<bool, RepositoryError> {
        let mut guard = lock(&self.records)?;
        match guard.iter_mut().find(|existing| existing.id == payment.id) {
            Some(existing) if existing.is_locked => Ok(false),
            Some(existing) => {
                *existing = payment;
                Ok(true)
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: &PaymentId) -> Result<Option<Payment>, RepositoryError> {
        Ok(lock(&self.records)?
            .iter()
            .find(|payment| &payment.id == id)
            .cloned())
    }

    fn list_by_tenant(&self, tenant_id: &TenantId) -> Result<Vec<Payment>, RepositoryError> {
        Ok(lock(&self.records)?
            .iter()
            .filter(|payment| &payment.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    fn list_by_room_period(
        &self,
        room_id: &RoomId,
        period: BillingPeriod,
    ) -> Result<Vec<Payment>, RepositoryError> {
        Ok(lock(&self.records)?
            .iter()
            .filter(|payment| {
                payment.room_id.as_ref() == Some(room_id) && payment.period == Some(period)
            })
            .cloned()
            .collect())
    }
}
