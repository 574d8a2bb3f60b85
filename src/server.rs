use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::{Method, Request},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use std::net::SocketAddr;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::Config;
use crate::handlers::{
    cancel_upload, delete_file, download_file, get_stats, health_check, list_files,
    upload_files, view_file,
};
use crate::middleware::{add_security_headers, require_pin, track_visitor};
use crate::state::AppState;
use crate::utils::shutdown_signal;

/// build the complete router
pub fn build_router(state: Arc<AppState>, max_upload_size: usize) -> Router {
    tracing::debug!("Building router with max upload size: {} bytes", max_upload_size);

    // range responses must not be re-encoded, so no compression here
    let media = Router::new()
        .route("/view/*path", get(view_file))
        .route("/files/*path", get(download_file));

    let api = Router::new()
        .route("/api/files", get(list_files))
        .route("/stats", get(get_stats))
        .layer(CompressionLayer::new()
            .gzip(true)
            .br(true)
            .zstd(true)
        );

    let upload = Router::new()
        .route("/upload", post(upload_files))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_size));

    let manage = Router::new()
        .route("/cancel-upload", post(cancel_upload))
        .route("/delete/*path", post(delete_file));

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .merge(media)
        .merge(api)
        .merge(upload)
        .merge(manage)
        .route_layer(from_fn_with_state(state.clone(), require_pin))
        .route("/health", get(health_check))
        .layer(from_fn_with_state(state.clone(), track_visitor))
        .layer(from_fn(add_security_headers))
        .layer(cors)
        .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
            tracing::info_span!(
                "request",
                id = %Uuid::new_v4(),
                method = %req.method(),
                uri = %req.uri()
            )
        }))
        .with_state(state)
}

/// serve until a shutdown signal arrives
pub async fn start_server(app: Router, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::debug!("Listener bound to {}", addr);

    tracing::info!("Server running and ready to accept connections");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .tcp_nodelay(true)
    .await
}

/// print startup banner with server info
pub fn print_startup_banner(config: &Config) {
    tracing::info!("LocalShare starting...");
    tracing::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    tracing::info!("📡 Open from other devices: http://<your_local_ip>:{}", config.port);
    tracing::info!("🔌 Listening on {}:{}", config.host, config.port);
    tracing::info!("📁 Serving directory: {:?}", config.files_dir.canonicalize().unwrap_or(config.files_dir.clone()));
    tracing::info!("🔐 PIN protection: {}", if config.pin_hash.is_some() { "enabled" } else { "disabled" });
    tracing::info!("🗑️  Delete enabled: {}", config.allow_delete);
    if config.cleanup_on_exit {
        tracing::warn!("⚠️  Shared files will be deleted on shutdown");
    }
    tracing::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}
