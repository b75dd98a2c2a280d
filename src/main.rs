use axum::routing::{get, post};
use axum::Router;
use mimalloc::MiMalloc;
use std::net::SocketAddr;
use tracing::info;

use brevet_align::{handlers, logging, metrics};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() {
    logging::init();
    metrics::initialize_metrics_baseline();

    let app = Router::new()
        .route("/align", post(handlers::align_track))
        .route("/route/plot", post(handlers::plot_route))
        .route("/healthz", get(handlers::healthz))
        .route("/metrics", get(metrics::serve_metrics))
        .layer(metrics::HttpMetricsLayer::new());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind listener");
    axum::serve(listener, app.into_make_service())
        .await
        .expect("server error");
}
