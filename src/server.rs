use std::time::Duration;

use anyhow::Context;
use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::{delete, get, post},
    Router,
};
use tokio::{net::TcpListener, signal};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::info;

use crate::{
    config::SiteDirs,
    routes::{
        append_alert_handler, clear_alerts_handler, list_alerts_handler,
        list_attendance_handler, record_attendance_handler,
    },
    state::AppState,
};

pub fn build_router(state: AppState, site: &SiteDirs) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route_service("/", ServeFile::new(site.templates.join("index.html")))
        .route_service(
            "/frequencia",
            ServeFile::new(site.templates.join("frequencia.html")),
        )
        .route_service(
            "/buscativa",
            ServeFile::new(site.templates.join("buscativa.html")),
        )
        .nest_service("/static", ServeDir::new(&site.assets))
        .route("/api/frequencia", post(record_attendance_handler))
        .route("/api/frequencia-listar", get(list_attendance_handler))
        .route(
            "/api/buscativa",
            get(list_alerts_handler).post(append_alert_handler),
        )
        .route("/api/limpar-alertas", delete(clear_alerts_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(state: AppState, site: &SiteDirs, address: &str) -> anyhow::Result<()> {
    let app = build_router(state, site);

    info!("Binding to {address}");
    let listener = TcpListener::bind(address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated unexpectedly")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::warn!("Failed to install terminate handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
