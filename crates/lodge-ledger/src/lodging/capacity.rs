use std::sync::Arc;

use rust_decimal::Decimal;

use super::domain::{Room, RoomId, RoomSnapshot, RoomStatus, RoomType};
use super::rent::RentAllocationCalculator;
use super::repository::TenantRepository;
use crate::store::RepositoryError;

/// Seat capacity for a room layout. The custom value only applies to dormitories.
pub const fn capacity_of(room_type: RoomType, custom_capacity: Option<u32>) -> u32 {
    match (room_type, custom_capacity) {
        (RoomType::Dorm, Some(custom)) if custom > 0 => custom,
        _ => room_type.standard_capacity(),
    }
}

/// Status from occupancy, with the maintenance flag taking precedence.
pub const fn status_for(under_maintenance: bool, occupancy: u32, capacity: u32) -> RoomStatus {
    if under_maintenance {
        RoomStatus::Maintenance
    } else if occupancy == 0 {
        RoomStatus::Vacant
    } else if occupancy >= capacity {
        RoomStatus::FullyOccupied
    } else {
        RoomStatus::PartiallyOccupied
    }
}

/// Derives occupancy and status from the tenant store on every call.
pub struct RoomCapacityModel<T> {
    tenants: Arc<T>,
}

impl<T> Clone for RoomCapacityModel<T> {
    fn clone(&self) -> Self {
        Self {
            tenants: self.tenants.clone(),
        }
    }
}

impl<T> RoomCapacityModel<T>
where
    T: TenantRepository,
{
    pub fn new(tenants: Arc<T>) -> Self {
        Self { tenants }
    }

    pub fn capacity(room: &Room) -> u32 {
        capacity_of(room.room_type, room.custom_capacity)
    }

    pub fn rent_per_seat(room: &Room) -> Decimal {
        RentAllocationCalculator::rent_per_seat(room.total_rent, Self::capacity(room))
    }

    pub fn occupancy_of(&self, room_id: &RoomId) -> Result<u32, RepositoryError> {
        self.tenants.count_by_room(room_id)
    }

    pub fn status_of(&self, room: &Room) -> Result<RoomStatus, RepositoryError> {
        if room.under_maintenance {
            return Ok(RoomStatus::Maintenance);
        }
        let occupancy = self.occupancy_of(&room.id)?;
        Ok(status_for(false, occupancy, Self::capacity(room)))
    }

    /// Recomputes the room's derived fields from the current tenant bindings.
    pub fn snapshot(&self, room: &Room) -> Result<RoomSnapshot, RepositoryError> {
        let capacity = Self::capacity(room);
        let occupancy = self.occupancy_of(&room.id)?;
        Ok(RoomSnapshot {
            id: room.id.clone(),
            property_id: room.property_id.clone(),
            number: room.number.clone(),
            room_type: room.room_type,
            total_rent: room.total_rent,
            custom_capacity: room.custom_capacity,
            capacity,
            occupancy,
            status: status_for(room.under_maintenance, occupancy, capacity),
            rent_per_seat: Self::rent_per_seat(room),
        })
    }
}
