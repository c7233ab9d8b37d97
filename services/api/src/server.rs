use crate::cli::ServeArgs;
use crate::infra::{load_catalog, AppState, ExportContext};
use crate::routes::with_queue_routes;
use apartment_queue::config::AppConfig;
use apartment_queue::error::AppError;
use apartment_queue::queue::{InMemoryReservationStore, QueueService};
use apartment_queue::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let catalog = Arc::new(load_catalog(&config.catalog)?);
    let store = Arc::new(InMemoryReservationStore::new());
    let queue_service = Arc::new(QueueService::new(store.clone()));
    let exports = ExportContext { catalog, store };

    let app = with_queue_routes(queue_service, exports)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "apartment queue service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
