use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::capacity::RoomCapacityModel;
use super::domain::{Room, RoomId, RoomSnapshot, RoomType};
use super::repository::{RoomRepository, TenantRepository};
use crate::clock::Clock;
use crate::config::PolicyConfig;
use crate::error::ErrorKind;
use crate::store::{PropertyId, RepositoryError};

const MAX_ROOM_NUMBER_LEN: usize = 20;

static ROOM_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_room_id() -> RoomId {
    let id = ROOM_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    RoomId(format!("room-{id:06}"))
}

/// Registration payload for a new room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRoom {
    pub property_id: PropertyId,
    pub number: String,
    #[serde(rename = "type")]
    pub room_type: RoomType,
    pub total_rent: Decimal,
    #[serde(default)]
    pub custom_capacity: Option<u32>,
}

/// Room registration, the maintenance flag, and derived room views.
pub struct RoomService<R, T> {
    rooms: Arc<R>,
    capacity: RoomCapacityModel<T>,
    clock: Arc<dyn Clock>,
    policy: PolicyConfig,
}

impl<R, T> RoomService<R, T>
where
    R: RoomRepository + 'static,
    T: TenantRepository + 'static,
{
    pub fn new(rooms: Arc<R>, tenants: Arc<T>, clock: Arc<dyn Clock>, policy: PolicyConfig) -> Self {
        Self {
            rooms,
            capacity: RoomCapacityModel::new(tenants),
            clock,
            policy,
        }
    }

    pub fn create_room(&self, request: NewRoom) -> Result<RoomSnapshot, RoomError> {
        let number = request.number.trim().to_string();
        self.validate(&request, &number)?;

        if self
            .rooms
            .find_by_number(&request.property_id, &number)?
            .is_some()
        {
            return Err(RoomError::Validation(format!(
                "room {number} already exists in property {}",
                request.property_id
            )));
        }

        let room = Room {
            id: next_room_id(),
            property_id: request.property_id,
            number,
            room_type: request.room_type,
            total_rent: request.total_rent,
            custom_capacity: match request.room_type {
                RoomType::Dorm => request.custom_capacity,
                _ => None,
            },
            under_maintenance: false,
            created_at: self.clock.now(),
        };
        let stored = self.rooms.insert(room)?;
        let snapshot = self.capacity.snapshot(&stored)?;
        info!(
            room_id = %snapshot.id,
            room_type = snapshot.room_type.label(),
            capacity = snapshot.capacity,
            "room registered"
        );
        Ok(snapshot)
    }

    /// Sets or clears the sticky maintenance flag. Clearing it lets occupancy drive status again.
    pub fn set_maintenance(
        &self,
        room_id: &RoomId,
        under_maintenance: bool,
    ) -> Result<RoomSnapshot, RoomError> {
        let mut room = self.load(room_id)?;
        room.under_maintenance = under_maintenance;
        self.rooms.update(room.clone())?;
        let snapshot = self.capacity.snapshot(&room)?;
        info!(room_id = %room_id, status = snapshot.status.label(), "room maintenance flag updated");
        Ok(snapshot)
    }

    pub fn room_view(&self, room_id: &RoomId) -> Result<RoomSnapshot, RoomError> {
        let room = self.load(room_id)?;
        Ok(self.capacity.snapshot(&room)?)
    }

    fn load(&self, room_id: &RoomId) -> Result<Room, RoomError> {
        self.rooms
            .fetch(room_id)?
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))
    }

    fn validate(&self, request: &NewRoom, number: &str) -> Result<(), RoomError> {
        if number.is_empty() || number.len() > MAX_ROOM_NUMBER_LEN {
            return Err(RoomError::Validation(format!(
                "room number must be 1-{MAX_ROOM_NUMBER_LEN} characters"
            )));
        }
        if !number
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(RoomError::Validation(
                "room number can only contain letters, numbers, hyphens, and underscores"
                    .to_string(),
            ));
        }
        if request.total_rent <= Decimal::ZERO || request.total_rent > self.policy.max_monthly_rent
        {
            return Err(RoomError::Validation(format!(
                "total rent must be greater than 0 and at most {}",
                self.policy.max_monthly_rent
            )));
        }
        match (request.room_type, request.custom_capacity) {
            (RoomType::Dorm, Some(custom))
                if custom < self.policy.dorm_min_capacity
                    || custom > self.policy.dorm_max_capacity =>
            {
                Err(RoomError::Validation(format!(
                    "custom capacity must be between {} and {}",
                    self.policy.dorm_min_capacity, self.policy.dorm_max_capacity
                )))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    #[error("invalid room: {0}")]
    Validation(String),
    #[error("room {0} not found")]
    NotFound(RoomId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl RoomError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RoomError::Validation(_) => ErrorKind::Validation,
            RoomError::NotFound(_) => ErrorKind::NotFound,
            RoomError::Repository(err) => err.kind(),
        }
    }
}
