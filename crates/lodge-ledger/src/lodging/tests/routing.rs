use super::common::*;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use axum::Json;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::lodging::domain::RoomType;
use crate::lodging::memory::{InMemoryRoomRepository, InMemoryTenantRepository};
use crate::lodging::router::{self, lodging_router};

fn json_request(method: &str, uri: &str, payload: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request")
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

#[tokio::test]
async fn create_room_route_returns_derived_fields() {
    let harness = harness();
    let router = lodging_router(harness.services.clone());

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/rooms",
            json!({
                "property_id": "prop-riverside",
                "number": "101",
                "type": "DOUBLE",
                "total_rent": 24000
            }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(body["capacity"], json!(2));
    assert_eq!(body["occupancy"], json!(0));
    assert_eq!(body["status"], json!("VACANT"));
    assert_eq!(body["rent_per_seat"], json!("12000"));
}

#[tokio::test]
async fn full_room_assignment_maps_to_conflict() {
    let harness = harness();
    let room = add_room(&harness.services, "S1", RoomType::Single, dec!(9000));
    harness
        .services
        .tenancy
        .create_tenant(tenant_request("Asha Rao", "9810000001", Some(&room.id)))
        .expect("occupant");
    let waiting = harness
        .services
        .tenancy
        .create_tenant(unassigned_request("Ravi Kumar", "9810000002", dec!(5000)))
        .expect("waiting tenant");
    let router = lodging_router(harness.services.clone());

    let response = router
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/tenants/{}/assign", waiting.tenant.id),
            json!({ "room_id": room.id }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = read_json_body(response).await;
    assert_eq!(body["kind"], json!("capacity_exceeded"));
    assert!(body["error"]
        .as_str()
        .is_some_and(|message| message.contains("full capacity")));
}

#[tokio::test]
async fn maintenance_route_blocks_assignment() {
    let harness = harness();
    let room = add_room(&harness.services, "T1", RoomType::Triple, dec!(15000));
    let router = lodging_router(harness.services.clone());

    let response = router
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/rooms/{}/maintenance", room.id),
            json!({ "under_maintenance": true }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json_body(response).await["status"], json!("MAINTENANCE"));

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/tenants",
            json!({
                "property_id": "prop-riverside",
                "name": "Asha Rao",
                "phone": "9810000001",
                "room_id": room.id
            }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
        read_json_body(response).await["kind"],
        json!("maintenance_conflict")
    );
}

#[tokio::test]
async fn locked_deposit_rejects_changes() {
    let harness = harness();
    let room = add_room(&harness.services, "101", RoomType::Double, dec!(24000));
    let creation = harness
        .services
        .tenancy
        .create_tenant(tenant_request("Asha Rao", "9810000001", Some(&room.id)))
        .expect("tenant");
    let deposit_id = creation.payments[0].id.clone();
    let router = lodging_router(harness.services.clone());

    let response = router
        .clone()
        .oneshot(empty_request(
            "PATCH",
            &format!("/api/v1/payments/{deposit_id}/mark-paid"),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json_body(response).await["is_locked"], json!(true));

    let response = router
        .oneshot(empty_request(
            "PATCH",
            &format!("/api/v1/payments/{deposit_id}/mark-unpaid"),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(read_json_body(response).await["kind"], json!("locked_payment"));
}

#[tokio::test]
async fn invalid_tenant_payload_is_unprocessable() {
    let harness = harness();
    let router = lodging_router(harness.services.clone());

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/tenants",
            json!({
                "property_id": "prop-riverside",
                "name": "Asha Rao",
                "phone": "12345",
                "monthly_rent": 5000
            }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(read_json_body(response).await["kind"], json!("validation"));
}

#[tokio::test]
async fn unknown_records_are_not_found() {
    let harness = harness();
    let router = lodging_router(harness.services.clone());

    for uri in [
        "/api/v1/rooms/room-missing",
        "/api/v1/tenants/tenant-missing",
        "/api/v1/rooms/room-missing/rent-status?month=6&year=2025",
    ] {
        let response = router
            .clone()
            .oneshot(empty_request("GET", uri))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn rent_status_route_validates_month() {
    let harness = harness();
    let room = add_room(&harness.services, "101", RoomType::Double, dec!(24000));
    let router = lodging_router(harness.services.clone());

    let response = router
        .clone()
        .oneshot(empty_request(
            "GET",
            &format!("/api/v1/rooms/{}/rent-status?month=13&year=2025", room.id),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = router
        .oneshot(empty_request(
            "GET",
            &format!("/api/v1/rooms/{}/rent-status", room.id),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["period"], json!({ "month": 6, "year": 2025 }));
    assert_eq!(body["collection"], json!("UNPAID"));
}

#[tokio::test]
async fn delete_route_reports_vacated_room() {
    let harness = harness();
    let room = add_room(&harness.services, "101", RoomType::Double, dec!(24000));
    let creation = harness
        .services
        .tenancy
        .create_tenant(tenant_request("Asha Rao", "9810000001", Some(&room.id)))
        .expect("tenant");
    let router = lodging_router(harness.services.clone());

    let response = router
        .oneshot(empty_request(
            "DELETE",
            &format!("/api/v1/tenants/{}", creation.tenant.id),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["vacated_room"]["occupancy"], json!(0));
    assert_eq!(body["vacated_room"]["status"], json!("VACANT"));
}

#[tokio::test]
async fn assign_handler_returns_internal_error_when_ledger_is_offline() {
    let tenants = Arc::new(InMemoryTenantRepository::default());
    let services = services_with(tenants, Arc::new(UnavailablePayments));
    let room = add_room(&services, "101", RoomType::Double, dec!(24000));
    let creation = services
        .tenancy
        .create_tenant(unassigned_request("Asha Rao", "9810000001", dec!(5000)))
        .expect("tenant");

    let response = router::assign_handler::<
        InMemoryRoomRepository,
        InMemoryTenantRepository,
        UnavailablePayments,
    >(
        State(services),
        Path(creation.tenant.id.0.clone()),
        Json(router::RoomBinding { room_id: room.id }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(read_json_body(response).await["kind"], json!("unavailable"));
}
