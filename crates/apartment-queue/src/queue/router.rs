use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::domain::{
    ApartmentId, Application, ApplicationId, CancellationReason, Reservation, ReservationId,
    ReservationState,
};
use super::error::QueueError;
use super::service::QueueService;
use super::store::{ReservationStore, StoreError};

/// Router builder exposing queue admission, withdrawal and queue listing.
pub fn queue_router<S>(service: Arc<QueueService<S>>) -> Router
where
    S: ReservationStore + 'static,
{
    Router::new()
        .route("/api/v1/applications", post(submit_handler::<S>))
        .route(
            "/api/v1/apartments/:apartment_id/reservations",
            get(queue_handler::<S>),
        )
        .route(
            "/api/v1/reservations/:reservation_id/cancel",
            post(cancel_handler::<S>),
        )
        .route(
            "/api/v1/reservations/:reservation_id/state",
            post(state_handler::<S>),
        )
        .with_state(service)
}

/// Public shape of a queue entry.
#[derive(Debug, Clone, Serialize)]
pub struct QueueEntryView {
    pub reservation_id: ReservationId,
    pub apartment_id: ApartmentId,
    pub application_id: ApplicationId,
    pub queue_position: Option<u32>,
    pub list_position: Option<u32>,
    pub state: &'static str,
    pub submitted_late: bool,
}

impl From<&Reservation> for QueueEntryView {
    fn from(reservation: &Reservation) -> Self {
        Self {
            reservation_id: reservation.id,
            apartment_id: reservation.apartment_id,
            application_id: reservation.application_id.clone(),
            queue_position: reservation.queue_position,
            list_position: reservation.list_position,
            state: reservation.state.label(),
            submitted_late: reservation.submitted_late(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelRequest {
    #[serde(default)]
    pub cancellation_reason: Option<CancellationReason>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub changed_by: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StateChangeRequest {
    pub state: ReservationState,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub changed_by: Option<String>,
}

pub(crate) async fn submit_handler<S>(
    State(service): State<Arc<QueueService<S>>>,
    axum::Json(application): axum::Json<Application>,
) -> Response
where
    S: ReservationStore + 'static,
{
    match service.submit(application, "", None) {
        Ok(reservations) => {
            let views: Vec<QueueEntryView> =
                reservations.iter().map(QueueEntryView::from).collect();
            (StatusCode::CREATED, axum::Json(views)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn queue_handler<S>(
    State(service): State<Arc<QueueService<S>>>,
    Path(apartment_id): Path<Uuid>,
) -> Response
where
    S: ReservationStore + 'static,
{
    match service.active_queue(&ApartmentId(apartment_id)) {
        Ok(reservations) => {
            let views: Vec<QueueEntryView> =
                reservations.iter().map(QueueEntryView::from).collect();
            (StatusCode::OK, axum::Json(views)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn cancel_handler<S>(
    State(service): State<Arc<QueueService<S>>>,
    Path(reservation_id): Path<Uuid>,
    axum::Json(request): axum::Json<CancelRequest>,
) -> Response
where
    S: ReservationStore + 'static,
{
    let reservation_id = ReservationId(reservation_id);
    match service.withdraw(
        &reservation_id,
        request.cancellation_reason,
        request.comment.as_deref(),
        request.changed_by.as_deref(),
    ) {
        Ok(withdrawal) => (StatusCode::OK, axum::Json(withdrawal)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn state_handler<S>(
    State(service): State<Arc<QueueService<S>>>,
    Path(reservation_id): Path<Uuid>,
    axum::Json(request): axum::Json<StateChangeRequest>,
) -> Response
where
    S: ReservationStore + 'static,
{
    let reservation_id = ReservationId(reservation_id);
    match service.set_state(
        &reservation_id,
        request.state,
        request.comment.as_deref(),
        request.changed_by.as_deref(),
    ) {
        Ok(event) => (StatusCode::OK, axum::Json(event)).into_response(),
        Err(err) => error_response(err),
    }
}

/// HTTP status reported for a failed queue operation.
pub(crate) fn status_for(err: &QueueError) -> StatusCode {
    match err {
        QueueError::UnsupportedOwnershipType(_)
        | QueueError::MissingOrderingNumber(_)
        | QueueError::ApartmentNotApplied { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        QueueError::ReservationNotFound(_) | QueueError::ApplicationNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        QueueError::Store(err) => store_status(err),
        QueueError::InconsistentQueueState { .. } | QueueError::ReservationCanceled(_) => {
            StatusCode::CONFLICT
        }
    }
}

pub(crate) fn store_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::Conflict => StatusCode::CONFLICT,
        StoreError::NotFound => StatusCode::NOT_FOUND,
        StoreError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn error_response(err: QueueError) -> Response {
    let payload = json!({
        "error": err.to_string(),
    });
    (status_for(&err), axum::Json(payload)).into_response()
}
