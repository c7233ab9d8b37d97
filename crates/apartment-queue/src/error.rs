use crate::catalog::CatalogError;
use crate::config::ConfigError;
use crate::export::ExportError;
use crate::queue::router::{status_for, store_status};
use crate::queue::QueueError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Queue(QueueError),
    Catalog(CatalogError),
    Export(ExportError),
    InvalidRequest(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Queue(err) => write!(f, "queue error: {}", err),
            AppError::Catalog(err) => write!(f, "catalog error: {}", err),
            AppError::Export(err) => write!(f, "export error: {}", err),
            AppError::InvalidRequest(reason) => write!(f, "invalid request: {}", reason),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Queue(err) => Some(err),
            AppError::Catalog(err) => Some(err),
            AppError::Export(err) => Some(err),
            AppError::InvalidRequest(_) => None,
        }
    }
}

fn catalog_status(err: &CatalogError) -> StatusCode {
    match err {
        CatalogError::ApartmentNotFound(_) | CatalogError::ProjectNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        CatalogError::Io(_) | CatalogError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Queue(err) => status_for(err),
            AppError::Catalog(err) => catalog_status(err),
            AppError::Export(ExportError::Catalog(err)) => catalog_status(err),
            AppError::Export(ExportError::Store(err)) => store_status(err),
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Export(_)
            | AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<QueueError> for AppError {
    fn from(value: QueueError) -> Self {
        Self::Queue(value)
    }
}

impl From<CatalogError> for AppError {
    fn from(value: CatalogError) -> Self {
        Self::Catalog(value)
    }
}

impl From<ExportError> for AppError {
    fn from(value: ExportError) -> Self {
        Self::Export(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::{ApartmentId, StoreError};
    use uuid::Uuid;

    #[test]
    fn caller_errors_map_to_client_statuses() {
        let missing = AppError::from(CatalogError::ApartmentNotFound(ApartmentId(Uuid::nil())));
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let conflict = AppError::from(QueueError::Store(StoreError::Conflict));
        assert_eq!(conflict.status(), StatusCode::CONFLICT);

        let bad_range = AppError::InvalidRequest("start after end".to_string());
        assert_eq!(bad_range.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn infrastructure_errors_map_to_server_statuses() {
        let unavailable = AppError::from(ExportError::Store(StoreError::Unavailable(
            "lock poisoned".to_string(),
        )));
        assert_eq!(unavailable.status(), StatusCode::SERVICE_UNAVAILABLE);

        let io = AppError::from(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
        assert_eq!(io.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(io.to_string(), "io error: disk full");
    }
}
