//! Tenant ⇄ room binding.
//!
//! Capacity is checked by counting bound tenants and the binding is written afterwards, with no
//! guard in between. Two assignments racing for the last seat of a room can both pass the check;
//! callers that need a strict bound must serialize assignments per room themselves.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::capacity::RoomCapacityModel;
use super::domain::{Payment, PaymentSource, Room, RoomId, RoomSnapshot, Tenant, TenantId};
use super::ledger::{LedgerError, PaymentLedger};
use super::rent::{RentAllocationCalculator, RentTerms};
use super::repository::{PaymentRepository, RoomRepository, TenantRepository};
use crate::clock::Clock;
use crate::config::PolicyConfig;
use crate::error::ErrorKind;
use crate::store::{PropertyId, RepositoryError};

static TENANT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_tenant_id() -> TenantId {
    let id = TENANT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    TenantId(format!("tenant-{id:06}"))
}

/// Intake payload. `monthly_rent`/`security_deposit` are only read when no room is given;
/// with a room, both come from the room's seat price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTenant {
    pub property_id: PropertyId,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub room_id: Option<RoomId>,
    #[serde(default)]
    pub monthly_rent: Option<Decimal>,
    #[serde(default)]
    pub security_deposit: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenantCreation {
    pub tenant: Tenant,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<RoomSnapshot>,
    pub payments: Vec<Payment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub tenant: Tenant,
    pub room: RoomSnapshot,
    pub payments: Vec<Payment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reassignment {
    pub tenant: Tenant,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_room: Option<RoomSnapshot>,
    pub room: RoomSnapshot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unassignment {
    pub tenant: Tenant,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vacated_room: Option<RoomSnapshot>,
}

pub struct TenancyAssignmentService<R, T, P> {
    rooms: Arc<R>,
    tenants: Arc<T>,
    capacity: RoomCapacityModel<T>,
    ledger: Arc<PaymentLedger<R, T, P>>,
    clock: Arc<dyn Clock>,
    policy: PolicyConfig,
}

impl<R, T, P> TenancyAssignmentService<R, T, P>
where
    R: RoomRepository + 'static,
    T: TenantRepository + 'static,
    P: PaymentRepository + 'static,
{
    pub fn new(
        rooms: Arc<R>,
        tenants: Arc<T>,
        ledger: Arc<PaymentLedger<R, T, P>>,
        clock: Arc<dyn Clock>,
        policy: PolicyConfig,
    ) -> Self {
        Self {
            rooms,
            capacity: RoomCapacityModel::new(tenants.clone()),
            tenants,
            ledger,
            clock,
            policy,
        }
    }

    /// Creates a tenant. With a room this is a first assignment: the rent snapshot comes from
    /// the room and the deposit/rent entries are generated. Without one the manual terms are
    /// stored as given.
    pub fn create_tenant(&self, request: NewTenant) -> Result<TenantCreation, TenancyError> {
        let name = request.name.trim().to_string();
        let phone = request.phone.trim().to_string();
        let email = request
            .email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .map(str::to_string);
        validate_identity(&name, &phone, email.as_deref())?;

        if let Some(existing) = self.tenants.find_by_phone(&phone)? {
            return Err(TenancyError::Validation(format!(
                "a tenant with phone number {phone} already exists ({})",
                existing.name
            )));
        }

        let room = match &request.room_id {
            Some(room_id) => Some(self.admit(room_id)?),
            None => None,
        };
        let terms = match &room {
            Some(room) => RentTerms::Allocated(RentAllocationCalculator::allocate(
                room.total_rent,
                RoomCapacityModel::<T>::capacity(room),
            )),
            None => self.manual_terms(&request)?,
        };

        let tenant = Tenant {
            id: next_tenant_id(),
            property_id: request.property_id,
            name,
            phone,
            email,
            room_id: room.as_ref().map(|room| room.id.clone()),
            monthly_rent: terms.monthly_rent(),
            security_deposit: terms.security_deposit(),
            created_at: self.clock.now(),
        };
        let tenant = self.tenants.insert(tenant)?;

        let Some(room) = room else {
            info!(tenant_id = %tenant.id, "tenant created without room");
            return Ok(TenantCreation {
                tenant,
                room: None,
                payments: Vec::new(),
            });
        };

        let payments = match self.ledger.create_initial_payments(&tenant, &room) {
            Ok(payments) => payments,
            Err(err) => {
                if let Err(rollback) = self.tenants.delete(&tenant.id) {
                    warn!(tenant_id = %tenant.id, error = %rollback, "tenant rollback failed");
                }
                return Err(err.into());
            }
        };
        let snapshot = self.capacity.snapshot(&room)?;
        info!(
            tenant_id = %tenant.id,
            room_id = %room.id,
            occupancy = snapshot.occupancy,
            capacity = snapshot.capacity,
            "tenant created and assigned"
        );
        Ok(TenantCreation {
            tenant,
            room: Some(snapshot),
            payments,
        })
    }

    /// Binds an unassigned tenant to a room, snapshots the seat price as rent and deposit, and
    /// generates the initial ledger entries. A tenant who already has generated entries (moved
    /// out and now returning) keeps the earlier snapshot and gets no new entries. Nothing is
    /// written unless every check passes.
    pub fn assign(&self, tenant_id: &TenantId, room_id: &RoomId) -> Result<Assignment, TenancyError> {
        let original = self.load_tenant(tenant_id)?;
        if let Some(current) = &original.room_id {
            return Err(TenancyError::Validation(format!(
                "tenant {tenant_id} already occupies room {current}; use reassign"
            )));
        }

        let room = self.admit(room_id)?;
        let returning = self
            .ledger
            .payments_for_tenant(tenant_id)?
            .iter()
            .any(|payment| payment.source == PaymentSource::Ledger);

        let mut tenant = original.clone();
        tenant.room_id = Some(room.id.clone());
        if returning {
            self.tenants.update(tenant.clone())?;
            let snapshot = self.capacity.snapshot(&room)?;
            info!(
                tenant_id = %tenant_id,
                room_id = %room_id,
                occupancy = snapshot.occupancy,
                "returning tenant assigned on existing terms"
            );
            return Ok(Assignment {
                tenant,
                room: snapshot,
                payments: Vec::new(),
            });
        }

        let allocation = RentAllocationCalculator::allocate(
            room.total_rent,
            RoomCapacityModel::<T>::capacity(&room),
        );
        tenant.monthly_rent = allocation.rent_per_seat;
        tenant.security_deposit = allocation.security_deposit;
        self.tenants.update(tenant.clone())?;

        let payments = match self.ledger.create_initial_payments(&tenant, &room) {
            Ok(payments) => payments,
            Err(err) => {
                if let Err(rollback) = self.tenants.update(original) {
                    warn!(tenant_id = %tenant_id, error = %rollback, "binding rollback failed");
                }
                return Err(err.into());
            }
        };

        let snapshot = self.capacity.snapshot(&room)?;
        info!(
            tenant_id = %tenant_id,
            room_id = %room_id,
            occupancy = snapshot.occupancy,
            status = snapshot.status.label(),
            "tenant assigned"
        );
        Ok(Assignment {
            tenant,
            room: snapshot,
            payments,
        })
    }

    /// Moves a tenant to another room. Rent snapshots stay as they are and no ledger entries
    /// are generated; only the first assignment produces those.
    pub fn reassign(
        &self,
        tenant_id: &TenantId,
        new_room_id: &RoomId,
    ) -> Result<Reassignment, TenancyError> {
        let mut tenant = self.load_tenant(tenant_id)?;
        if tenant.room_id.as_ref() == Some(new_room_id) {
            let room = self.load_room(new_room_id)?;
            return Ok(Reassignment {
                room: self.capacity.snapshot(&room)?,
                tenant,
                previous_room: None,
            });
        }

        let room = self.admit(new_room_id)?;
        let previous = tenant.room_id.replace(room.id.clone());
        self.tenants.update(tenant.clone())?;

        let previous_room = match previous {
            Some(previous_id) => self.vacated_snapshot(&previous_id)?,
            None => None,
        };
        let snapshot = self.capacity.snapshot(&room)?;
        info!(
            tenant_id = %tenant_id,
            room_id = %new_room_id,
            previous_room = ?previous_room.as_ref().map(|room| room.id.0.as_str()),
            "tenant reassigned"
        );
        Ok(Reassignment {
            tenant,
            previous_room,
            room: snapshot,
        })
    }

    /// Clears the binding. The tenant keeps its rent and deposit snapshots.
    pub fn unassign(&self, tenant_id: &TenantId) -> Result<Unassignment, TenancyError> {
        let mut tenant = self.load_tenant(tenant_id)?;
        let Some(room_id) = tenant.room_id.take() else {
            return Ok(Unassignment {
                tenant,
                vacated_room: None,
            });
        };
        self.tenants.update(tenant.clone())?;

        let vacated_room = self.vacated_snapshot(&room_id)?;
        info!(tenant_id = %tenant_id, room_id = %room_id, "tenant unassigned");
        Ok(Unassignment {
            tenant,
            vacated_room,
        })
    }

    /// Removes a tenant and returns the recomputed room it occupied. Ledger entries remain.
    pub fn delete_tenant(&self, tenant_id: &TenantId) -> Result<Option<RoomSnapshot>, TenancyError> {
        let tenant = self
            .tenants
            .delete(tenant_id)?
            .ok_or_else(|| TenancyError::TenantNotFound(tenant_id.clone()))?;
        let vacated = match &tenant.room_id {
            Some(room_id) => self.vacated_snapshot(room_id)?,
            None => None,
        };
        info!(tenant_id = %tenant_id, "tenant deleted");
        Ok(vacated)
    }

    pub fn get_tenant(&self, tenant_id: &TenantId) -> Result<Tenant, TenancyError> {
        self.load_tenant(tenant_id)
    }

    /// Room checks shared by every binding path: exists, not under maintenance, has a free seat.
    fn admit(&self, room_id: &RoomId) -> Result<Room, TenancyError> {
        let room = self.load_room(room_id)?;
        if room.under_maintenance {
            warn!(room_id = %room_id, "assignment rejected: room under maintenance");
            return Err(TenancyError::MaintenanceConflict {
                room_id: room_id.clone(),
            });
        }

        let capacity = RoomCapacityModel::<T>::capacity(&room);
        let occupancy = self.capacity.occupancy_of(room_id)?;
        if occupancy >= capacity {
            warn!(room_id = %room_id, occupancy, capacity, "assignment rejected: room full");
            return Err(TenancyError::CapacityExceeded {
                room_id: room_id.clone(),
                occupancy,
                capacity,
            });
        }
        Ok(room)
    }

    fn manual_terms(&self, request: &NewTenant) -> Result<RentTerms, TenancyError> {
        let monthly_rent = request.monthly_rent.ok_or_else(|| {
            TenancyError::Validation("monthly rent is required when no room is assigned".to_string())
        })?;
        if monthly_rent <= Decimal::ZERO || monthly_rent > self.policy.max_monthly_rent {
            return Err(TenancyError::Validation(format!(
                "monthly rent must be greater than 0 and at most {}",
                self.policy.max_monthly_rent
            )));
        }
        let security_deposit = request.security_deposit.unwrap_or(Decimal::ZERO);
        if security_deposit < Decimal::ZERO {
            return Err(TenancyError::Validation(
                "security deposit cannot be negative".to_string(),
            ));
        }
        Ok(RentTerms::Manual {
            monthly_rent,
            security_deposit,
        })
    }

    fn vacated_snapshot(&self, room_id: &RoomId) -> Result<Option<RoomSnapshot>, TenancyError> {
        match self.rooms.fetch(room_id)? {
            Some(room) => Ok(Some(self.capacity.snapshot(&room)?)),
            None => Ok(None),
        }
    }

    fn load_tenant(&self, tenant_id: &TenantId) -> Result<Tenant, TenancyError> {
        self.tenants
            .fetch(tenant_id)?
            .ok_or_else(|| TenancyError::TenantNotFound(tenant_id.clone()))
    }

    fn load_room(&self, room_id: &RoomId) -> Result<Room, TenancyError> {
        self.rooms
            .fetch(room_id)?
            .ok_or_else(|| TenancyError::RoomNotFound(room_id.clone()))
    }
}

fn validate_identity(name: &str, phone: &str, email: Option<&str>) -> Result<(), TenancyError> {
    let name_len = name.chars().count();
    if !(2..=100).contains(&name_len) {
        return Err(TenancyError::Validation(
            "name must be between 2 and 100 characters".to_string(),
        ));
    }
    if !name
        .chars()
        .all(|c| c.is_alphabetic() || c.is_whitespace() || matches!(c, '-' | '\'' | '.'))
    {
        return Err(TenancyError::Validation(
            "name can only contain letters, spaces, hyphens, apostrophes, and periods".to_string(),
        ));
    }
    if !(10..=15).contains(&phone.len()) || !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err(TenancyError::Validation(
            "phone number must be 10-15 digits".to_string(),
        ));
    }
    if let Some(email) = email {
        let valid = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        if !valid {
            return Err(TenancyError::Validation(format!(
                "{email} is not a valid email address"
            )));
        }
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum TenancyError {
    #[error("invalid tenancy request: {0}")]
    Validation(String),
    #[error("tenant {0} not found")]
    TenantNotFound(TenantId),
    #[error("room {0} not found")]
    RoomNotFound(RoomId),
    #[error("room {room_id} is under maintenance")]
    MaintenanceConflict { room_id: RoomId },
    #[error("room {room_id} is at full capacity ({occupancy}/{capacity} tenants)")]
    CapacityExceeded {
        room_id: RoomId,
        occupancy: u32,
        capacity: u32,
    },
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl TenancyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TenancyError::Validation(_) => ErrorKind::Validation,
            TenancyError::TenantNotFound(_) | TenancyError::RoomNotFound(_) => ErrorKind::NotFound,
            TenancyError::MaintenanceConflict { .. } => ErrorKind::MaintenanceConflict,
            TenancyError::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
            TenancyError::Ledger(err) => err.kind(),
            TenancyError::Repository(err) => err.kind(),
        }
    }
}
