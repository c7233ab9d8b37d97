use apartment_queue::catalog::InMemoryCatalog;
use apartment_queue::config::CatalogConfig;
use apartment_queue::error::AppError;
use apartment_queue::queue::{Application, InMemoryReservationStore};
use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Read-side handles shared by the export endpoints.
#[derive(Clone)]
pub(crate) struct ExportContext {
    pub(crate) catalog: Arc<InMemoryCatalog>,
    pub(crate) store: Arc<InMemoryReservationStore>,
}

pub(crate) fn load_catalog(config: &CatalogConfig) -> Result<InMemoryCatalog, AppError> {
    match &config.path {
        Some(path) => {
            let catalog = InMemoryCatalog::from_path(path)?;
            info!(path = %path.display(), projects = catalog.projects().count(), "catalog loaded");
            Ok(catalog)
        }
        None => {
            warn!("APP_CATALOG_PATH not set; exports will find no projects");
            Ok(InMemoryCatalog::default())
        }
    }
}

/// Applications stored as a JSON array, in submission order.
pub(crate) fn load_applications(path: &Path) -> Result<Vec<Application>, AppError> {
    let file = File::open(path)?;
    serde_json::from_reader(BufReader::new(file)).map_err(|err| {
        AppError::InvalidRequest(format!(
            "failed to parse applications from {}: {err}",
            path.display()
        ))
    })
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).map_err(serde::de::Error::custom)
}
