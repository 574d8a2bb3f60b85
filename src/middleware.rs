use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::config::Config;
use crate::error::ShareError;
use crate::state::AppState;

pub const PIN_HEADER: &str = "X-Share-Pin";
pub const PIN_COOKIE: &str = "share_pin";

// pin check, a no-op when no pin is configured
pub async fn require_pin(
    State(state): State<Arc<AppState>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(expected) = state.pin_hash.as_deref() else {
        return next.run(req).await;
    };

    // media elements cannot set headers, so the cookie is accepted too
    let provided = req
        .headers()
        .get(PIN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| cookie_value(&req, PIN_COOKIE));

    let Some(provided) = provided else {
        tracing::warn!("Missing access pin for {}", req.uri().path());
        return ShareError::Unauthorized.into_response();
    };

    if Config::hash_pin(&provided) != expected {
        tracing::warn!("🚫 Invalid pin attempt for {}", req.uri().path());
        return ShareError::Unauthorized.into_response();
    }

    tracing::trace!("Pin validated");
    next.run(req).await
}

// remember who connected, for /stats
pub async fn track_visitor(
    State(state): State<Arc<AppState>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        if state.visitors.insert(addr.ip()) {
            tracing::info!("👋 New visitor: {}", addr.ip());
        }
    }
    next.run(req).await
}

/// headers & shit
pub async fn add_security_headers(
    req: Request<Body>,
    next: Next,
) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::X_FRAME_OPTIONS,
        HeaderValue::from_static("SAMEORIGIN"),
    );
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("no-referrer"),
    );

    response
}

fn cookie_value(req: &Request<Body>, name: &str) -> Option<String> {
    req.headers()
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}
