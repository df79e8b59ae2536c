use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Seat price and deposit derived from a room's whole-room rent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentAllocation {
    pub rent_per_seat: Decimal,
    pub security_deposit: Decimal,
}

/// Rent and deposit stored on a tenant, either derived from a room or entered by hand for
/// tenants created without one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RentTerms {
    Allocated(RentAllocation),
    Manual {
        monthly_rent: Decimal,
        security_deposit: Decimal,
    },
}

impl RentTerms {
    pub fn monthly_rent(&self) -> Decimal {
        match self {
            RentTerms::Allocated(allocation) => allocation.rent_per_seat,
            RentTerms::Manual { monthly_rent, .. } => *monthly_rent,
        }
    }

    pub fn security_deposit(&self) -> Decimal {
        match self {
            RentTerms::Allocated(allocation) => allocation.security_deposit,
            RentTerms::Manual {
                security_deposit, ..
            } => *security_deposit,
        }
    }
}

pub struct RentAllocationCalculator;

impl RentAllocationCalculator {
    /// Whole-room rent divided by seat capacity, rounded to a whole amount (halves round up).
    /// Occupancy never enters the calculation.
    pub fn rent_per_seat(total_rent: Decimal, capacity: u32) -> Decimal {
        if capacity == 0 {
            return total_rent;
        }
        (total_rent / Decimal::from(capacity))
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .normalize()
    }

    /// One month of seat rent.
    pub fn security_deposit(rent_per_seat: Decimal) -> Decimal {
        rent_per_seat
    }

    pub fn allocate(total_rent: Decimal, capacity: u32) -> RentAllocation {
        let rent_per_seat = Self::rent_per_seat(total_rent, capacity);
        RentAllocation {
            rent_per_seat,
            security_deposit: Self::security_deposit(rent_per_seat),
        }
    }
}
