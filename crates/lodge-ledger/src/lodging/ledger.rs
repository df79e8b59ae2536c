//! Payment lifecycle.
//!
//! Two producers write into the same ledger and are never reconciled: entries generated when a
//! tenant is first assigned (`create_initial_payments`, status `UNPAID`) and ad-hoc entries from
//! `record_payment` (status `PAID` on creation). A tenant can therefore hold an unpaid generated
//! rent entry and a paid recorded one for the same period.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::capacity::RoomCapacityModel;
use super::domain::{
    BillingPeriod, Payment, PaymentId, PaymentMethod, PaymentSource, PaymentStatus, PaymentType,
    Room, RoomId, Tenant, TenantId,
};
use super::repository::{PaymentRepository, RoomRepository, TenantRepository};
use crate::clock::Clock;
use crate::config::PolicyConfig;
use crate::error::ErrorKind;
use crate::store::{PropertyId, RepositoryError};

const MAX_REFERENCE_LEN: usize = 100;

static PAYMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_payment_id() -> PaymentId {
    let id = PAYMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    PaymentId(format!("pay-{id:06}"))
}

/// Ad-hoc payment recorded as already paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecording {
    #[serde(rename = "type")]
    pub payment_type: PaymentType,
    pub tenant_id: TenantId,
    pub property_id: PropertyId,
    /// Defaults to the tenant's current room.
    #[serde(default)]
    pub room_id: Option<RoomId>,
    pub amount: Decimal,
    #[serde(default)]
    pub method: PaymentMethod,
    #[serde(default)]
    pub reference: Option<String>,
}

/// Collection state of a room's rent for one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CollectionStatus {
    Complete,
    Partial,
    Unpaid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantRentLine {
    pub tenant_id: TenantId,
    pub name: String,
    pub expected_amount: Decimal,
    pub status: PaymentStatus,
    pub paid_amount: Decimal,
    pub payment_id: Option<PaymentId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRentStatus {
    pub room_id: RoomId,
    pub room_number: String,
    pub period: BillingPeriod,
    pub rent_per_seat: Decimal,
    pub total_expected: Decimal,
    pub total_paid: Decimal,
    pub percentage: u32,
    pub collection: CollectionStatus,
    pub tenants: Vec<TenantRentLine>,
}

pub struct PaymentLedger<R, T, P> {
    rooms: Arc<R>,
    tenants: Arc<T>,
    payments: Arc<P>,
    clock: Arc<dyn Clock>,
    policy: PolicyConfig,
}

impl<R, T, P> PaymentLedger<R, T, P>
where
    R: RoomRepository + 'static,
    T: TenantRepository + 'static,
    P: PaymentRepository + 'static,
{
    pub fn new(
        rooms: Arc<R>,
        tenants: Arc<T>,
        payments: Arc<P>,
        clock: Arc<dyn Clock>,
        policy: PolicyConfig,
    ) -> Self {
        Self {
            rooms,
            tenants,
            payments,
            clock,
            policy,
        }
    }

    pub fn current_period(&self) -> BillingPeriod {
        BillingPeriod::containing(self.clock.now())
    }

    /// Deposit entry (only when the tenant's deposit is positive) and first month's rent entry,
    /// both unpaid and unlocked, appended together.
    pub fn create_initial_payments(
        &self,
        tenant: &Tenant,
        room: &Room,
    ) -> Result<Vec<Payment>, LedgerError> {
        let now = self.clock.now();
        let mut entries = Vec::with_capacity(2);

        if tenant.security_deposit > Decimal::ZERO {
            entries.push(Payment {
                id: next_payment_id(),
                property_id: tenant.property_id.clone(),
                tenant_id: tenant.id.clone(),
                room_id: tenant.room_id.clone(),
                payment_type: PaymentType::Deposit,
                amount: tenant.security_deposit,
                status: PaymentStatus::Unpaid,
                is_locked: false,
                period: None,
                method: None,
                reference: None,
                date_paid: None,
                source: PaymentSource::Ledger,
                created_at: now,
            });
        }

        entries.push(Payment {
            id: next_payment_id(),
            property_id: tenant.property_id.clone(),
            tenant_id: tenant.id.clone(),
            room_id: tenant.room_id.clone(),
            payment_type: PaymentType::Rent,
            amount: RoomCapacityModel::<T>::rent_per_seat(room),
            status: PaymentStatus::Unpaid,
            is_locked: false,
            period: Some(BillingPeriod::containing(now)),
            method: None,
            reference: None,
            date_paid: None,
            source: PaymentSource::Ledger,
            created_at: now,
        });

        let stored = self.payments.append(entries)?;
        info!(
            tenant_id = %tenant.id,
            room_id = %room.id,
            entries = stored.len(),
            "initial payments generated"
        );
        Ok(stored)
    }

    /// Marks an entry paid. Paying a deposit locks it for good.
    pub fn mark_paid(&self, payment_id: &PaymentId) -> Result<Payment, LedgerError> {
        let mut payment = self.load_unlocked(payment_id)?;
        payment.status = PaymentStatus::Paid;
        payment.date_paid = Some(self.clock.now());
        if payment.payment_type == PaymentType::Deposit {
            payment.is_locked = true;
        }
        self.store_unlocked(&payment)?;
        info!(
            payment_id = %payment.id,
            payment_type = payment.payment_type.label(),
            locked = payment.is_locked,
            "payment marked paid"
        );
        Ok(payment)
    }

    pub fn mark_unpaid(&self, payment_id: &PaymentId) -> Result<Payment, LedgerError> {
        let mut payment = self.load_unlocked(payment_id)?;
        payment.status = PaymentStatus::Unpaid;
        payment.date_paid = None;
        self.store_unlocked(&payment)?;
        info!(payment_id = %payment.id, "payment marked unpaid");
        Ok(payment)
    }

    /// Writes a new paid entry without looking at existing entries for the same obligation.
    pub fn record_payment(&self, recording: PaymentRecording) -> Result<Payment, LedgerError> {
        if recording.amount <= Decimal::ZERO || recording.amount > self.policy.max_payment_amount
        {
            return Err(LedgerError::Validation(format!(
                "amount must be greater than 0 and at most {}",
                self.policy.max_payment_amount
            )));
        }
        let reference = recording
            .reference
            .as_deref()
            .map(str::trim)
            .filter(|reference| !reference.is_empty())
            .map(str::to_string);
        if reference
            .as_ref()
            .is_some_and(|reference| reference.len() > MAX_REFERENCE_LEN)
        {
            return Err(LedgerError::Validation(format!(
                "reference must be at most {MAX_REFERENCE_LEN} characters"
            )));
        }

        let tenant = self
            .tenants
            .fetch(&recording.tenant_id)?
            .ok_or_else(|| LedgerError::TenantNotFound(recording.tenant_id.clone()))?;
        if tenant.property_id != recording.property_id {
            return Err(LedgerError::Validation(format!(
                "tenant {} does not belong to property {}",
                tenant.id, recording.property_id
            )));
        }

        let now = self.clock.now();
        let period = (recording.payment_type == PaymentType::Rent)
            .then(|| BillingPeriod::containing(now));
        let payment = Payment {
            id: next_payment_id(),
            property_id: recording.property_id,
            tenant_id: tenant.id,
            room_id: recording.room_id.or(tenant.room_id),
            payment_type: recording.payment_type,
            amount: recording.amount,
            status: PaymentStatus::Paid,
            is_locked: false,
            period,
            method: Some(recording.method),
            reference,
            date_paid: Some(now),
            source: PaymentSource::Recorded,
            created_at: now,
        };

        let stored = self.payments.insert(payment)?;
        info!(
            payment_id = %stored.id,
            tenant_id = %stored.tenant_id,
            payment_type = stored.payment_type.label(),
            "payment recorded"
        );
        Ok(stored)
    }

    pub fn get(&self, payment_id: &PaymentId) -> Result<Payment, LedgerError> {
        self.payments
            .fetch(payment_id)?
            .ok_or_else(|| LedgerError::PaymentNotFound(payment_id.clone()))
    }

    pub fn payments_for_tenant(&self, tenant_id: &TenantId) -> Result<Vec<Payment>, LedgerError> {
        Ok(self.payments.list_by_tenant(tenant_id)?)
    }

    /// Rent collection for a room and period. Every paid rent entry counts towards the total,
    /// whichever producer wrote it; each tenant line shows the first rent entry found for them.
    pub fn monthly_status(
        &self,
        room_id: &RoomId,
        period: BillingPeriod,
    ) -> Result<RoomRentStatus, LedgerError> {
        let room = self
            .rooms
            .fetch(room_id)?
            .ok_or_else(|| LedgerError::RoomNotFound(room_id.clone()))?;
        let tenants = self.tenants.list_by_room(room_id)?;
        let rent_entries: Vec<Payment> = self
            .payments
            .list_by_room_period(room_id, period)?
            .into_iter()
            .filter(|payment| payment.payment_type == PaymentType::Rent)
            .collect();

        let rent_per_seat = RoomCapacityModel::<T>::rent_per_seat(&room);
        let total_expected = room.total_rent;
        let total_paid: Decimal = rent_entries
            .iter()
            .filter(|payment| payment.status == PaymentStatus::Paid)
            .map(|payment| payment.amount)
            .sum();

        let lines = tenants
            .into_iter()
            .map(|tenant| {
                let entry = rent_entries
                    .iter()
                    .find(|payment| payment.tenant_id == tenant.id);
                TenantRentLine {
                    expected_amount: rent_per_seat,
                    status: entry.map_or(PaymentStatus::Unpaid, |payment| payment.status),
                    paid_amount: entry
                        .filter(|payment| payment.status == PaymentStatus::Paid)
                        .map_or(Decimal::ZERO, |payment| payment.amount),
                    payment_id: entry.map(|payment| payment.id.clone()),
                    tenant_id: tenant.id,
                    name: tenant.name,
                }
            })
            .collect();

        let percentage = if total_expected > Decimal::ZERO {
            (total_paid * Decimal::ONE_HUNDRED / total_expected)
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                .to_u32()
                .unwrap_or(u32::MAX)
        } else {
            0
        };
        let collection = if total_expected > Decimal::ZERO && total_paid >= total_expected {
            CollectionStatus::Complete
        } else if total_paid > Decimal::ZERO {
            CollectionStatus::Partial
        } else {
            CollectionStatus::Unpaid
        };

        Ok(RoomRentStatus {
            room_id: room.id,
            room_number: room.number,
            period,
            rent_per_seat,
            total_expected,
            total_paid,
            percentage,
            collection,
            tenants: lines,
        })
    }

    fn load_unlocked(&self, payment_id: &PaymentId) -> Result<Payment, LedgerError> {
        let payment = self.get(payment_id)?;
        if payment.is_locked {
            warn!(payment_id = %payment_id, "rejected change to locked payment");
            return Err(LedgerError::Locked {
                payment_id: payment_id.clone(),
            });
        }
        Ok(payment)
    }

    /// Writes a status change unless the entry was locked after it was loaded.
    fn store_unlocked(&self, payment: &Payment) -> Result<(), LedgerError> {
        if self.payments.update_unlocked(payment.clone())? {
            return Ok(());
        }
        warn!(payment_id = %payment.id, "payment locked before the change was written");
        Err(LedgerError::Locked {
            payment_id: payment.id.clone(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("invalid payment: {0}")]
    Validation(String),
    #[error("payment {0} not found")]
    PaymentNotFound(PaymentId),
    #[error("tenant {0} not found")]
    TenantNotFound(TenantId),
    #[error("room {0} not found")]
    RoomNotFound(RoomId),
    #[error("payment {payment_id} is locked and cannot be modified")]
    Locked { payment_id: PaymentId },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::Validation(_) => ErrorKind::Validation,
            LedgerError::PaymentNotFound(_)
            | LedgerError::TenantNotFound(_)
            | LedgerError::RoomNotFound(_) => ErrorKind::NotFound,
            LedgerError::Locked { .. } => ErrorKind::LockedPayment,
            LedgerError::Repository(err) => err.kind(),
        }
    }
}
