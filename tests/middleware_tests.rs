use localshare::config::Config;
use localshare::middleware::{add_security_headers, track_visitor};
use localshare::server::build_router;
use localshare::state::AppState;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, Request, StatusCode};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::util::ServiceExt;

fn pinned_app(dir: &std::path::Path, pin: &str) -> Router {
    let mut state = AppState::new(dir.to_path_buf());
    state.pin_hash = Some(Config::hash_pin(pin));
    build_router(Arc::new(state), 1024)
}

#[tokio::test]
async fn test_add_security_headers() {
    let app = Router::new()
        .route("/", get(|| async { "hello" }))
        .layer(from_fn(add_security_headers));

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(headers.get("x-frame-options").unwrap(), "SAMEORIGIN");
}

#[tokio::test]
async fn test_require_pin() {
    let dir = tempfile::tempdir().unwrap();
    let app = pinned_app(dir.path(), "4321");

    // Test missing pin
    let response = app.clone()
        .oneshot(Request::builder().uri("/api/files").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Test wrong pin
    let response = app.clone()
        .oneshot(
            Request::builder()
                .uri("/api/files")
                .header("X-Share-Pin", "0000")
                .body(Body::empty())
                .unwrap()
            )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Test correct pin via header
    let response = app.clone()
        .oneshot(
            Request::builder()
                .uri("/api/files")
                .header("X-Share-Pin", "4321")
                .body(Body::empty())
                .unwrap()
            )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Test correct pin via cookie, as a <video> element would send it
    let response = app.clone()
        .oneshot(
            Request::builder()
                .uri("/api/files")
                .header(header::COOKIE, "theme=dark; share_pin=4321")
                .body(Body::empty())
                .unwrap()
            )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // health stays open
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_open_share_needs_no_pin() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(Arc::new(AppState::new(dir.path().to_path_buf())), 1024);

    let response = app
        .oneshot(Request::builder().uri("/api/files").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_track_visitor() {
    let dir = tempfile::tempdir().unwrap();
    let state = Arc::new(AppState::new(dir.path().to_path_buf()));
    let app = Router::new()
        .route("/", get(|| async { "hello" }))
        .layer(from_fn_with_state(state.clone(), track_visitor));

    for addr in ["10.0.0.1:5000", "10.0.0.1:5001", "10.0.0.2:5000"] {
        let addr: SocketAddr = addr.parse().unwrap();
        let mut request = Request::builder().uri("/").body(Body::empty()).unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));
        app.clone().oneshot(request).await.unwrap();
    }

    // same ip on two ports counts once
    assert_eq!(state.visitors.len(), 2);
}
