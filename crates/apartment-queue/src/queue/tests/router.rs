use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use super::common::*;
use crate::queue::domain::OwnershipType;
use crate::queue::router::queue_router;

fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

#[tokio::test]
async fn submit_route_returns_created_reservations() {
    let (service, _store) = build_service();
    let router = queue_router(Arc::new(service));
    let application = application(OwnershipType::Haso, 12, false);
    let body = serde_json::to_value(&application).expect("serializable");

    let response = router
        .oneshot(json_request("/api/v1/applications", body))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload[0]["queue_position"], json!(1));
    assert_eq!(payload[0]["list_position"], json!(1));
    assert_eq!(payload[0]["state"], json!("submitted"));
    assert_eq!(payload[0]["application_id"], json!(application.id.0));
}

#[tokio::test]
async fn submit_route_rejects_unknown_ownership_type() {
    let (service, _store) = build_service();
    let router = queue_router(Arc::new(service));
    let mut body = serde_json::to_value(application(OwnershipType::Hitas, 0, false))
        .expect("serializable");
    body["ownership_type"] = json!("ASO");

    let response = router
        .oneshot(json_request("/api/v1/applications", body))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .expect("error message")
        .contains("ASO"));
}

#[tokio::test]
async fn queue_route_lists_active_reservations_in_order() {
    let (service, _store) = build_service();
    let service = Arc::new(service);
    for key in [30, 10, 20] {
        service
            .submit(application(OwnershipType::Haso, key, false), "", None)
            .expect("admitted");
    }
    let router = queue_router(service);

    let response = router
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/apartments/{}/reservations", apartment_id()))
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let positions: Vec<u64> = payload
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|entry| entry["queue_position"].as_u64())
        .collect();
    assert_eq!(positions, vec![1, 2, 3]);
}

#[tokio::test]
async fn cancel_route_withdraws_reservation() {
    let (service, store) = build_service();
    let service = Arc::new(service);
    let first = service
        .submit(application(OwnershipType::Hitas, 0, false), "", None)
        .expect("admitted");
    service
        .submit(application(OwnershipType::Hitas, 0, false), "", None)
        .expect("admitted");
    let router = queue_router(service);

    let response = router
        .oneshot(json_request(
            &format!("/api/v1/reservations/{}/cancel", first[0].id),
            json!({ "cancellation_reason": "terminated", "comment": "moved abroad" }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["state_change"]["state"], json!("canceled"));
    assert_eq!(
        payload["state_change"]["cancellation_reason"],
        json!("terminated")
    );
    assert_eq!(payload["already_removed"], json!(false));
    assert_eq!(active_positions(&store, &apartment_id()), vec![1]);
}

#[tokio::test]
async fn cancel_route_reports_missing_reservation() {
    let (service, _store) = build_service();
    let router = queue_router(Arc::new(service));

    let response = router
        .oneshot(json_request(
            &format!(
                "/api/v1/reservations/{}/cancel",
                crate::queue::domain::ReservationId::generate()
            ),
            json!({}),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn state_route_rejects_reopening_canceled_reservation() {
    let (service, _store) = build_service();
    let service = Arc::new(service);
    let reservations = service
        .submit(application(OwnershipType::Hitas, 0, false), "", None)
        .expect("admitted");
    service
        .withdraw(&reservations[0].id, None, None, None)
        .expect("withdrawn");
    let router = queue_router(service);

    let response = router
        .oneshot(json_request(
            &format!("/api/v1/reservations/{}/state", reservations[0].id),
            json!({ "state": "offered" }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::CONFLICT);
}
