use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::models::ErrorResponse;

/// non-standard "client closed request" status the upload page keys on
pub const STATUS_UPLOAD_CANCELLED: u16 = 499;

pub type Result<T> = std::result::Result<T, ShareError>;

#[derive(Debug, Error)]
pub enum ShareError {
    #[error("file not found")]
    NotFound,

    #[error("requested range not satisfiable for {size} byte file")]
    RangeNotSatisfiable { size: u64 },

    #[error("session not found")]
    SessionNotFound,

    #[error("upload cancelled")]
    UploadCancelled,

    #[error("upload failed: {0}")]
    UploadFailed(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ShareError {
    pub fn status(&self) -> StatusCode {
        match self {
            ShareError::NotFound | ShareError::SessionNotFound => StatusCode::NOT_FOUND,
            ShareError::RangeNotSatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            ShareError::UploadCancelled => StatusCode::from_u16(STATUS_UPLOAD_CANCELLED)
                .unwrap_or(StatusCode::BAD_REQUEST),
            ShareError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ShareError::Forbidden(_) => StatusCode::FORBIDDEN,
            ShareError::Unauthorized => StatusCode::UNAUTHORIZED,
            ShareError::UploadFailed(_) | ShareError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ShareError {
    fn into_response(self) -> Response {
        let status = self.status();

        // 416 carries no body, only the total length
        if let ShareError::RangeNotSatisfiable { size } = self {
            let mut response = status.into_response();
            if let Ok(value) = HeaderValue::from_str(&format!("bytes */{}", size)) {
                response.headers_mut().insert(header::CONTENT_RANGE, value);
            }
            return response;
        }

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
