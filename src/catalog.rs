use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;
use tokio::fs;

use crate::error::{Result, ShareError};

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "ogg", "mov", "avi", "mkv", "flv", "wmv", "m4v"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "m4a", "flac", "aac", "wma", "opus"];
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp", "svg", "ico"];
const SUBTITLE_EXTENSIONS: &[&str] = &["srt", "vtt"];

/// coarse classification used by the listing UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
    Image,
    Subtitle,
    Other,
}

impl MediaKind {
    /// `.ogg` counts as video, matching the player page.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        let ext = ext.as_str();

        if VIDEO_EXTENSIONS.contains(&ext) {
            MediaKind::Video
        } else if AUDIO_EXTENSIONS.contains(&ext) {
            MediaKind::Audio
        } else if IMAGE_EXTENSIONS.contains(&ext) {
            MediaKind::Image
        } else if SUBTITLE_EXTENSIONS.contains(&ext) {
            MediaKind::Subtitle
        } else {
            MediaKind::Other
        }
    }

    pub fn can_stream(&self) -> bool {
        matches!(self, MediaKind::Video | MediaKind::Audio | MediaKind::Image)
    }
}

/// mime type guessed from the file name, `application/octet-stream` if unknown
pub fn content_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

#[derive(Debug, Clone)]
pub struct FileEntry {
    pub name: String,
    /// path relative to the shared root, `/`-separated
    pub relative: String,
    pub path: PathBuf,
    pub size: u64,
    pub modified: Option<SystemTime>,
    pub is_dir: bool,
    pub kind: MediaKind,
}

impl FileEntry {
    pub fn content_type(&self) -> String {
        content_type(&self.path)
    }
}

/// Read-only view of the shared directory.
#[derive(Debug, Clone)]
pub struct Catalog {
    root: PathBuf,
}

impl Catalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a request path onto the root. Anything that could escape it is
    /// reported as `NotFound`.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf> {
        let mut path = self.root.clone();
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => path.push(part),
                _ => {
                    tracing::warn!("Rejected path outside shared root: {:?}", relative);
                    return Err(ShareError::NotFound);
                }
            }
        }
        Ok(path)
    }

    pub async fn entry(&self, relative: &str) -> Result<FileEntry> {
        let path = self.resolve(relative)?;
        let metadata = fs::metadata(&path).await.map_err(|e| {
            tracing::debug!("No entry for {:?}: {}", path, e);
            ShareError::NotFound
        })?;

        let is_dir = metadata.is_dir();
        let size = if is_dir { dir_size(&path).await } else { metadata.len() };

        Ok(FileEntry {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            relative: relative.trim_matches('/').to_string(),
            kind: MediaKind::from_path(&path),
            modified: metadata.modified().ok(),
            path,
            size,
            is_dir,
        })
    }

    /// Top-level entries, newest first.
    pub async fn list(&self) -> Result<Vec<FileEntry>> {
        tracing::debug!("Listing shared directory: {:?}", self.root);
        let mut entries = fs::read_dir(&self.root).await.map_err(|e| {
            tracing::error!("Failed to read directory {:?}: {}", self.root, e);
            ShareError::Io(e)
        })?;

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            match self.entry(&name).await {
                Ok(file) => files.push(file),
                // vanished between read_dir and stat
                Err(e) => tracing::warn!("Skipping {}: {}", name, e),
            }
        }

        files.sort_by(|a, b| b.modified.cmp(&a.modified));
        tracing::debug!("Found {} entries", files.len());
        Ok(files)
    }
}

/// Sum of all regular files below `dir`; unreadable parts count as empty.
pub async fn dir_size(dir: &Path) -> u64 {
    let mut total = 0;
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let Ok(mut entries) = fs::read_dir(&current).await else {
            continue;
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            match entry.metadata().await {
                Ok(m) if m.is_dir() => pending.push(entry.path()),
                Ok(m) => total += m.len(),
                Err(_) => {}
            }
        }
    }
    total
}
