use std::fmt;

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::store::PropertyId;

/// Identifier wrapper for rooms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoomId(pub String);

/// Identifier wrapper for tenants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TenantId(pub String);

/// Identifier wrapper for payment ledger entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PaymentId(pub String);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Room layouts; each maps to a fixed seat count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomType {
    Single,
    Double,
    Triple,
    Dorm,
}

impl RoomType {
    pub const fn label(self) -> &'static str {
        match self {
            RoomType::Single => "SINGLE",
            RoomType::Double => "DOUBLE",
            RoomType::Triple => "TRIPLE",
            RoomType::Dorm => "DORM",
        }
    }

    /// Seat count for the layout when no dormitory override applies.
    pub const fn standard_capacity(self) -> u32 {
        match self {
            RoomType::Single => 1,
            RoomType::Double => 2,
            RoomType::Triple => 3,
            RoomType::Dorm => 4,
        }
    }
}

/// Derived room status. `Maintenance` only ever comes from the room's maintenance flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomStatus {
    Vacant,
    PartiallyOccupied,
    FullyOccupied,
    Maintenance,
}

impl RoomStatus {
    pub const fn label(self) -> &'static str {
        match self {
            RoomStatus::Vacant => "VACANT",
            RoomStatus::PartiallyOccupied => "PARTIALLY_OCCUPIED",
            RoomStatus::FullyOccupied => "FULLY_OCCUPIED",
            RoomStatus::Maintenance => "MAINTENANCE",
        }
    }
}

/// Stored room record. Occupancy and status are not stored; see [`RoomSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub property_id: PropertyId,
    pub number: String,
    #[serde(rename = "type")]
    pub room_type: RoomType,
    pub total_rent: Decimal,
    pub custom_capacity: Option<u32>,
    pub under_maintenance: bool,
    pub created_at: DateTime<Utc>,
}

/// Room projected with its derived capacity, occupancy, status and seat price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub id: RoomId,
    pub property_id: PropertyId,
    pub number: String,
    #[serde(rename = "type")]
    pub room_type: RoomType,
    pub total_rent: Decimal,
    pub custom_capacity: Option<u32>,
    pub capacity: u32,
    pub occupancy: u32,
    pub status: RoomStatus,
    pub rent_per_seat: Decimal,
}

impl RoomSnapshot {
    pub fn available_seats(&self) -> u32 {
        self.capacity.saturating_sub(self.occupancy)
    }
}

/// Stored tenant. `monthly_rent` and `security_deposit` are snapshots, never recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub property_id: PropertyId,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub room_id: Option<RoomId>,
    pub monthly_rent: Decimal,
    pub security_deposit: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentType {
    Rent,
    Food,
    Deposit,
    Other,
}

impl PaymentType {
    pub const fn label(self) -> &'static str {
        match self {
            PaymentType::Rent => "RENT",
            PaymentType::Food => "FOOD",
            PaymentType::Deposit => "DEPOSIT",
            PaymentType::Other => "OTHER",
        }
    }
}

/// Ledger status. `Overdue` is reserved: no transition in this crate produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Overdue,
}

impl PaymentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "UNPAID",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Overdue => "OVERDUE",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Upi,
    Card,
    Online,
}

/// Which producer wrote a ledger entry. The two are never reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentSource {
    /// Generated at assignment time (deposit + first month's rent).
    Ledger,
    /// Recorded directly as already paid.
    Recorded,
}

/// Billing cycle of a rent entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BillingPeriod {
    pub month: u32,
    pub year: i32,
}

impl BillingPeriod {
    pub fn new(month: u32, year: i32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { month, year })
    }

    pub fn containing(instant: DateTime<Utc>) -> Self {
        Self {
            month: instant.month(),
            year: instant.year(),
        }
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub property_id: PropertyId,
    pub tenant_id: TenantId,
    pub room_id: Option<RoomId>,
    #[serde(rename = "type")]
    pub payment_type: PaymentType,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub is_locked: bool,
    pub period: Option<BillingPeriod>,
    pub method: Option<PaymentMethod>,
    pub reference: Option<String>,
    pub date_paid: Option<DateTime<Utc>>,
    pub source: PaymentSource,
    pub created_at: DateTime<Utc>,
}
