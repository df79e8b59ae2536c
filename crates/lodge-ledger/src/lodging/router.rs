use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{BillingPeriod, PaymentId, RoomId, TenantId};
use super::ledger::{LedgerError, PaymentLedger, PaymentRecording};
use super::repository::{PaymentRepository, RoomRepository, TenantRepository};
use super::rooms::{NewRoom, RoomError, RoomService};
use super::tenancy::{NewTenant, TenancyAssignmentService, TenancyError};
use crate::clock::Clock;
use crate::config::PolicyConfig;
use crate::error::{error_response, ErrorKind};

/// Room, tenancy and ledger services sharing one set of stores.
pub struct LodgingServices<R, T, P> {
    pub rooms: Arc<RoomService<R, T>>,
    pub tenancy: Arc<TenancyAssignmentService<R, T, P>>,
    pub ledger: Arc<PaymentLedger<R, T, P>>,
}

impl<R, T, P> Clone for LodgingServices<R, T, P> {
    fn clone(&self) -> Self {
        Self {
            rooms: self.rooms.clone(),
            tenancy: self.tenancy.clone(),
            ledger: self.ledger.clone(),
        }
    }
}

impl<R, T, P> LodgingServices<R, T, P>
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
        let ledger = Arc::new(PaymentLedger::new(
            rooms.clone(),
            tenants.clone(),
            payments,
            clock.clone(),
            policy.clone(),
        ));
        let tenancy = Arc::new(TenancyAssignmentService::new(
            rooms.clone(),
            tenants.clone(),
            ledger.clone(),
            clock.clone(),
            policy.clone(),
        ));
        let rooms = Arc::new(RoomService::new(rooms, tenants, clock, policy));
        Self {
            rooms,
            tenancy,
            ledger,
        }
    }
}

/// Router builder exposing room, tenancy and payment endpoints.
pub fn lodging_router<R, T, P>(services: LodgingServices<R, T, P>) -> Router
where
    R: RoomRepository + 'static,
    T: TenantRepository + 'static,
    P: PaymentRepository + 'static,
{
    Router::new()
        .route("/api/v1/rooms", post(create_room_handler::<R, T, P>))
        .route("/api/v1/rooms/:room_id", get(room_handler::<R, T, P>))
        .route(
            "/api/v1/rooms/:room_id/maintenance",
            put(maintenance_handler::<R, T, P>),
        )
        .route(
            "/api/v1/rooms/:room_id/rent-status",
            get(rent_status_handler::<R, T, P>),
        )
        .route("/api/v1/tenants", post(create_tenant_handler::<R, T, P>))
        .route(
            "/api/v1/tenants/:tenant_id",
            get(tenant_handler::<R, T, P>).delete(delete_tenant_handler::<R, T, P>),
        )
        .route(
            "/api/v1/tenants/:tenant_id/assign",
            post(assign_handler::<R, T, P>),
        )
        .route(
            "/api/v1/tenants/:tenant_id/reassign",
            post(reassign_handler::<R, T, P>),
        )
        .route(
            "/api/v1/tenants/:tenant_id/unassign",
            post(unassign_handler::<R, T, P>),
        )
        .route(
            "/api/v1/tenants/:tenant_id/payments",
            get(tenant_payments_handler::<R, T, P>),
        )
        .route("/api/v1/payments", post(record_payment_handler::<R, T, P>))
        .route(
            "/api/v1/payments/:payment_id/mark-paid",
            patch(mark_paid_handler::<R, T, P>),
        )
        .route(
            "/api/v1/payments/:payment_id/mark-unpaid",
            patch(mark_unpaid_handler::<R, T, P>),
        )
        .with_state(services)
}

#[derive(Debug, Deserialize)]
pub(crate) struct RoomBinding {
    pub(crate) room_id: RoomId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MaintenanceRequest {
    pub(crate) under_maintenance: bool,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PeriodQuery {
    pub(crate) month: Option<u32>,
    pub(crate) year: Option<i32>,
}

pub(crate) async fn create_room_handler<R, T, P>(
    State(services): State<LodgingServices<R, T, P>>,
    Json(request): Json<NewRoom>,
) -> Response
where
    R: RoomRepository + 'static,
    T: TenantRepository + 'static,
    P: PaymentRepository + 'static,
{
    match services.rooms.create_room(request) {
        Ok(room) => (StatusCode::CREATED, Json(room)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn room_handler<R, T, P>(
    State(services): State<LodgingServices<R, T, P>>,
    Path(room_id): Path<String>,
) -> Response
where
    R: RoomRepository + 'static,
    T: TenantRepository + 'static,
    P: PaymentRepository + 'static,
{
    match services.rooms.room_view(&RoomId(room_id)) {
        Ok(room) => (StatusCode::OK, Json(room)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn maintenance_handler<R, T, P>(
    State(services): State<LodgingServices<R, T, P>>,
    Path(room_id): Path<String>,
    Json(request): Json<MaintenanceRequest>,
) -> Response
where
    R: RoomRepository + 'static,
    T: TenantRepository + 'static,
    P: PaymentRepository + 'static,
{
    match services
        .rooms
        .set_maintenance(&RoomId(room_id), request.under_maintenance)
    {
        Ok(room) => (StatusCode::OK, Json(room)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn rent_status_handler<R, T, P>(
    State(services): State<LodgingServices<R, T, P>>,
    Path(room_id): Path<String>,
    Query(query): Query<PeriodQuery>,
) -> Response
where
    R: RoomRepository + 'static,
    T: TenantRepository + 'static,
    P: PaymentRepository + 'static,
{
    let current = services.ledger.current_period();
    let month = query.month.unwrap_or(current.month);
    let year = query.year.unwrap_or(current.year);
    let Some(period) = BillingPeriod::new(month, year) else {
        return error_response(
            ErrorKind::Validation,
            format!("month must be between 1 and 12, got {month}"),
            None,
        );
    };

    match services.ledger.monthly_status(&RoomId(room_id), period) {
        Ok(status) => (StatusCode::OK, Json(status)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn create_tenant_handler<R, T, P>(
    State(services): State<LodgingServices<R, T, P>>,
    Json(request): Json<NewTenant>,
) -> Response
where
    R: RoomRepository + 'static,
    T: TenantRepository + 'static,
    P: PaymentRepository + 'static,
{
    match services.tenancy.create_tenant(request) {
        Ok(creation) => (StatusCode::CREATED, Json(creation)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn tenant_handler<R, T, P>(
    State(services): State<LodgingServices<R, T, P>>,
    Path(tenant_id): Path<String>,
) -> Response
where
    R: RoomRepository + 'static,
    T: TenantRepository + 'static,
    P: PaymentRepository + 'static,
{
    match services.tenancy.get_tenant(&TenantId(tenant_id)) {
        Ok(tenant) => (StatusCode::OK, Json(tenant)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn delete_tenant_handler<R, T, P>(
    State(services): State<LodgingServices<R, T, P>>,
    Path(tenant_id): Path<String>,
) -> Response
where
    R: RoomRepository + 'static,
    T: TenantRepository + 'static,
    P: PaymentRepository + 'static,
{
    let tenant_id = TenantId(tenant_id);
    match services.tenancy.delete_tenant(&tenant_id) {
        Ok(vacated_room) => {
            let payload = json!({
                "tenant_id": tenant_id,
                "vacated_room": vacated_room,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn assign_handler<R, T, P>(
    State(services): State<LodgingServices<R, T, P>>,
    Path(tenant_id): Path<String>,
    Json(binding): Json<RoomBinding>,
) -> Response
where
    R: RoomRepository + 'static,
    T: TenantRepository + 'static,
    P: PaymentRepository + 'static,
{
    match services
        .tenancy
        .assign(&TenantId(tenant_id), &binding.room_id)
    {
        Ok(assignment) => (StatusCode::OK, Json(assignment)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn reassign_handler<R, T, P>(
    State(services): State<LodgingServices<R, T, P>>,
    Path(tenant_id): Path<String>,
    Json(binding): Json<RoomBinding>,
) -> Response
where
    R: RoomRepository + 'static,
    T: TenantRepository + 'static,
    P: PaymentRepository + 'static,
{
    match services
        .tenancy
        .reassign(&TenantId(tenant_id), &binding.room_id)
    {
        Ok(reassignment) => (StatusCode::OK, Json(reassignment)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn unassign_handler<R, T, P>(
    State(services): State<LodgingServices<R, T, P>>,
    Path(tenant_id): Path<String>,
) -> Response
where
    R: RoomRepository + 'static,
    T: TenantRepository + 'static,
    P: PaymentRepository + 'static,
{
    match services.tenancy.unassign(&TenantId(tenant_id)) {
        Ok(unassignment) => (StatusCode::OK, Json(unassignment)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn tenant_payments_handler<R, T, P>(
    State(services): State<LodgingServices<R, T, P>>,
    Path(tenant_id): Path<String>,
) -> Response
where
    R: RoomRepository + 'static,
    T: TenantRepository + 'static,
    P: PaymentRepository + 'static,
{
    match services.ledger.payments_for_tenant(&TenantId(tenant_id)) {
        Ok(payments) => (StatusCode::OK, Json(payments)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn record_payment_handler<R, T, P>(
    State(services): State<LodgingServices<R, T, P>>,
    Json(recording): Json<PaymentRecording>,
) -> Response
where
    R: RoomRepository + 'static,
    T: TenantRepository + 'static,
    P: PaymentRepository + 'static,
{
    match services.ledger.record_payment(recording) {
        Ok(payment) => (StatusCode::CREATED, Json(payment)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn mark_paid_handler<R, T, P>(
    State(services): State<LodgingServices<R, T, P>>,
    Path(payment_id): Path<String>,
) -> Response
where
    R: RoomRepository + 'static,
    T: TenantRepository + 'static,
    P: PaymentRepository + 'static,
{
    match services.ledger.mark_paid(&PaymentId(payment_id)) {
        Ok(payment) => (StatusCode::OK, Json(payment)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn mark_unpaid_handler<R, T, P>(
    State(services): State<LodgingServices<R, T, P>>,
    Path(payment_id): Path<String>,
) -> Response
where
    R: RoomRepository + 'static,
    T: TenantRepository + 'static,
    P: PaymentRepository + 'static,
{
    match services.ledger.mark_unpaid(&PaymentId(payment_id)) {
        Ok(payment) => (StatusCode::OK, Json(payment)).into_response(),
        Err(err) => err.into_response(),
    }
}

impl IntoResponse for RoomError {
    fn into_response(self) -> Response {
        error_response(self.kind(), self.to_string(), None)
    }
}

impl IntoResponse for TenancyError {
    fn into_response(self) -> Response {
        error_response(self.kind(), self.to_string(), None)
    }
}

impl IntoResponse for LedgerError {
    fn into_response(self) -> Response {
        error_response(self.kind(), self.to_string(), None)
    }
}
