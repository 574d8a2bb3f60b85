use axum::{
    extract::{Multipart, Path, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Json, Response},
};
use futures::TryStreamExt;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tokio_util::io::StreamReader;

use crate::archive::zip_directory;
use crate::catalog::FileEntry;
use crate::error::{Result, ShareError};
use crate::models::{
    CancelUploadRequest, FileInfo, FileListResponse, StatsResponse, SuccessResponse,
    UploadResponse,
};
use crate::state::AppState;
use crate::streamer::{self, MediaResponse};
use crate::upload::UploadBatch;

pub const SESSION_HEADER: &str = "X-Upload-Session-ID";

// list the shared directory, newest first
pub async fn list_files(
    State(state): State<Arc<AppState>>,
) -> Result<Json<FileListResponse>> {
    let entries = state.catalog.list().await?;
    let files: Vec<FileInfo> = entries.iter().map(FileInfo::from).collect();
    let total = files.len();
    Ok(Json(FileListResponse { files, total }))
}

// inline view with byte-range support, used by the media players
pub async fn view_file(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> Result<MediaResponse> {
    tracing::debug!("View request: {}", path);
    open_media(&state, &path, &headers).await
}

// same bytes as view, but as an attachment; folders arrive as a zip
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> Result<Response> {
    tracing::debug!("Download request: {}", path);
    let entry = state.catalog.entry(&path).await?;
    if entry.is_dir {
        return download_folder(entry.path, &entry.name).await;
    }

    let media = stream_entry(&entry, &headers).await?;
    let mut response = media.into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_DISPOSITION, attachment(&entry.name));
    Ok(response)
}

async fn download_folder(dir: PathBuf, name: &str) -> Result<Response> {
    tracing::info!("📦 Zipping folder for download: {:?}", dir);
    let bytes = tokio::task::spawn_blocking(move || zip_directory(&dir))
        .await
        .map_err(|e| ShareError::Io(io::Error::new(io::ErrorKind::Other, e)))??;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/zip")),
            (header::CONTENT_DISPOSITION, attachment(&format!("{}.zip", name))),
        ],
        bytes,
    )
        .into_response())
}

fn attachment(filename: &str) -> HeaderValue {
    let filename = filename.replace('"', "");
    HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

async fn open_media(state: &AppState, path: &str, headers: &HeaderMap) -> Result<MediaResponse> {
    let entry = state.catalog.entry(path).await?;
    if entry.is_dir {
        tracing::warn!("Refusing to stream directory: {}", path);
        return Err(ShareError::NotFound);
    }
    stream_entry(&entry, headers).await
}

async fn stream_entry(entry: &FileEntry, headers: &HeaderMap) -> Result<MediaResponse> {
    // an unreadable header is malformed, not absent
    let range = headers
        .get(header::RANGE)
        .map(|v| v.to_str().unwrap_or_default());

    streamer::serve_file(&entry.path, entry.size, &entry.content_type(), range).await
}

// multipart upload of one or more files under a cancellable session
pub async fn upload_files(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let session_id = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            tracing::warn!("Upload request without session id");
            ShareError::BadRequest("No session ID provided".to_string())
        })?;

    tracing::debug!("Processing upload for session {}", session_id);
    let mut batch = UploadBatch::begin(state.uploads.clone(), session_id, state.files_dir.clone());

    // path_<i> fields seen so far, keyed by file index
    let mut declared: HashMap<usize, String> = HashMap::new();
    let mut file_index = 0usize;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to read multipart field: {}", e);
        ShareError::BadRequest(format!("Failed to read multipart field: {}", e))
    })? {
        let name = field.name().unwrap_or_default().to_string();

        if name == "file" {
            let index = file_index;
            file_index += 1;

            let declared_path = declared
                .remove(&index)
                .filter(|p| !p.is_empty())
                .or_else(|| field.file_name().map(str::to_string))
                .unwrap_or_default();
            if declared_path.is_empty() {
                tracing::debug!("Skipping unnamed file field {}", index);
                continue;
            }

            let reader = std::pin::pin!(StreamReader::new(
                field.map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))
            ));
            batch.write_file(&declared_path, reader).await?;
        } else if let Some(index) = name.strip_prefix("path_").and_then(|i| i.parse().ok()) {
            let value = field.text().await.map_err(|e| {
                ShareError::BadRequest(format!("Failed to read field {}: {}", name, e))
            })?;
            declared.insert(index, value);
        } else {
            tracing::trace!("Ignoring multipart field {:?}", name);
        }
    }

    if batch.filenames().is_empty() {
        tracing::warn!("Upload {} contained no files", session_id);
        batch.abort();
        return Err(ShareError::BadRequest("No files provided".to_string()));
    }

    Ok(Json(UploadResponse {
        success: true,
        files: batch.finish(),
    }))
}

// flag a live upload session as cancelled
pub async fn cancel_upload(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CancelUploadRequest>,
) -> Result<Json<SuccessResponse>> {
    let session_id = payload
        .session_id
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ShareError::BadRequest("No session ID provided".to_string()))?;

    state.uploads.cancel(session_id.trim())?;
    Ok(Json(SuccessResponse { success: true }))
}

// remove a shared file or directory tree
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> Result<Json<SuccessResponse>> {
    if !state.allow_delete {
        tracing::warn!("Delete attempted while disabled: {}", path);
        return Err(ShareError::Forbidden("Delete is disabled".to_string()));
    }

    let target = state.catalog.resolve(&path)?;
    if target == state.files_dir {
        return Err(ShareError::BadRequest("Refusing to delete the shared root".to_string()));
    }

    let metadata = fs::metadata(&target).await.map_err(|_| ShareError::NotFound)?;
    if metadata.is_dir() {
        fs::remove_dir_all(&target).await?;
    } else {
        fs::remove_file(&target).await?;
    }

    tracing::info!("🗑️  Deleted: {}", path);
    Ok(Json(SuccessResponse { success: true }))
}

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    Json(StatsResponse {
        connected_users: state.visitors.len(),
    })
}

// health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "localshare",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
