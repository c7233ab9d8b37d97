use crate::infra::{deserialize_date, AppState, ExportContext};
use apartment_queue::catalog::ApartmentCatalog;
use apartment_queue::error::AppError;
use apartment_queue::export::{
    sold_events_between, ApplicantExport, CsvExport, ProjectLotteryResultExport, SaleReportExport,
};
use apartment_queue::queue::{queue_router, InMemoryReservationStore, ProjectId, QueueService};
use axum::extract::{Path, Query};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub(crate) struct SaleReportQuery {
    #[serde(deserialize_with = "deserialize_date")]
    pub(crate) start: NaiveDate,
    #[serde(deserialize_with = "deserialize_date")]
    pub(crate) end: NaiveDate,
}

pub(crate) fn with_queue_routes(
    service: Arc<QueueService<InMemoryReservationStore>>,
    exports: ExportContext,
) -> axum::Router {
    queue_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/projects/:project_id/export/lottery_result",
            axum::routing::get(lottery_result_endpoint),
        )
        .route(
            "/api/v1/projects/:project_id/export/applicants",
            axum::routing::get(applicants_endpoint),
        )
        .route(
            "/api/v1/sales/report",
            axum::routing::get(sale_report_endpoint),
        )
        .layer(Extension(exports))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn lottery_result_endpoint(
    Extension(exports): Extension<ExportContext>,
    Path(project_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let project_id = ProjectId(project_id);
    exports.catalog.project(&project_id)?;
    let export =
        ProjectLotteryResultExport::new(exports.catalog.as_ref(), exports.store.as_ref(), project_id);
    csv_response(&export, &format!("lottery_result_{project_id}.csv"))
}

pub(crate) async fn applicants_endpoint(
    Extension(exports): Extension<ExportContext>,
    Path(project_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let project_id = ProjectId(project_id);
    let export = ApplicantExport::for_project(
        exports.catalog.as_ref(),
        exports.store.as_ref(),
        &project_id,
    )?;
    csv_response(&export, &format!("applicants_{project_id}.csv"))
}

pub(crate) async fn sale_report_endpoint(
    Extension(exports): Extension<ExportContext>,
    Query(query): Query<SaleReportQuery>,
) -> Result<Response, AppError> {
    if query.start > query.end {
        return Err(AppError::InvalidRequest(format!(
            "start {} is after end {}",
            query.start, query.end
        )));
    }
    let events = sold_events_between(exports.store.as_ref(), query.start, query.end)?;
    let export = SaleReportExport::new(exports.catalog.as_ref(), exports.store.as_ref(), events)?;
    csv_response(
        &export,
        &format!("sale_report_{}_{}.csv", query.start, query.end),
    )
}

fn csv_response(export: &dyn CsvExport, filename: &str) -> Result<Response, AppError> {
    let body = export.to_csv_string()?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response())
}
