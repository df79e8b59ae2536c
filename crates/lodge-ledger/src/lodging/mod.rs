//! Rooms, tenants and the rent ledger.
//!
//! Room occupancy and status are derived from tenant bindings on every read; the only stored
//! room state besides its layout and rent is the maintenance flag.

pub mod capacity;
pub mod domain;
pub mod ledger;
pub mod memory;
pub mod rent;
pub mod repository;
pub mod rooms;
pub mod router;
pub mod tenancy;

#[cfg(test)]
mod tests;

pub use capacity::{capacity_of, status_for, RoomCapacityModel};
pub use domain::{
    BillingPeriod, Payment, PaymentId, PaymentMethod, PaymentSource, PaymentStatus, PaymentType,
    Room, RoomId, RoomSnapshot, RoomStatus, RoomType, Tenant, TenantId,
};
pub use ledger::{
    CollectionStatus, LedgerError, PaymentLedger, PaymentRecording, RoomRentStatus,
    TenantRentLine,
};
pub use memory::{InMemoryPaymentRepository, InMemoryRoomRepository, InMemoryTenantRepository};
pub use rent::{RentAllocation, RentAllocationCalculator, RentTerms};
pub use repository::{PaymentRepository, RoomRepository, TenantRepository};
pub use rooms::{NewRoom, RoomError, RoomService};
pub use router::{lodging_router, LodgingServices};
pub use tenancy::{
    Assignment, NewTenant, Reassignment, TenancyAssignmentService, TenancyError, TenantCreation,
    Unassignment,
};
