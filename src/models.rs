use serde::{Deserialize, Serialize};

use crate::catalog::{FileEntry, MediaKind};
use crate::utils::human_size;

// one entry of the shared directory listing
#[derive(Serialize, Debug)]
pub struct FileInfo {
    pub name: String,
    pub path: String,
    pub size: u64,
    pub size_human: String,
    pub modified: String,
    pub is_dir: bool,
    pub kind: MediaKind,
    pub can_stream: bool,
}

impl From<&FileEntry> for FileInfo {
    fn from(entry: &FileEntry) -> Self {
        let modified = entry
            .modified
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .and_then(|d| chrono::DateTime::from_timestamp(d.as_secs() as i64, 0))
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "Unknown".to_string());

        Self {
            name: entry.name.clone(),
            path: entry.relative.clone(),
            size: entry.size,
            size_human: human_size(entry.size),
            modified,
            is_dir: entry.is_dir,
            kind: entry.kind,
            can_stream: !entry.is_dir && entry.kind.can_stream(),
        }
    }
}

// response for file listing endpoint
#[derive(Serialize, Debug)]
pub struct FileListResponse {
    pub files: Vec<FileInfo>,
    pub total: usize,
}

// response for a completed upload batch
#[derive(Serialize, Debug)]
pub struct UploadResponse {
    pub success: bool,
    pub files: Vec<String>,
}

#[derive(Deserialize, Debug)]
pub struct CancelUploadRequest {
    #[serde(default)]
    pub session_id: Option<String>,
}

// shared by cancel and delete
#[derive(Serialize, Debug)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Serialize, Debug)]
pub struct StatsResponse {
    pub connected_users: usize,
}

// generic error response
#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}
