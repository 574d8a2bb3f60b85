//! Cancellable multi-file upload writer.
//!
//! A batch writes each incoming file chunk by chunk, polling the session
//! registry before every chunk. Cancellation, any I/O failure, or dropping
//! the batch before [`UploadBatch::finish`] removes every file and directory
//! the batch created and closes the session.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

use crate::error::{Result, ShareError};
use crate::sessions::UploadRegistry;
use crate::utils::sanitize_filename;
use crate::CHUNK_SIZE;

pub struct UploadBatch {
    registry: Arc<UploadRegistry>,
    session_id: String,
    root: PathBuf,
    written: Vec<PathBuf>,
    // directories this batch created, shallowest first
    created_dirs: Vec<PathBuf>,
    filenames: Vec<String>,
    done: bool,
}

impl UploadBatch {
    /// Open (or join) the session `session_id` and write under `root`.
    pub fn begin(
        registry: Arc<UploadRegistry>,
        session_id: impl Into<String>,
        root: impl Into<PathBuf>,
    ) -> Self {
        let session_id = session_id.into();
        registry.open(&session_id);
        Self {
            registry,
            session_id,
            root: root.into(),
            written: Vec::new(),
            created_dirs: Vec::new(),
            filenames: Vec::new(),
            done: false,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// files completed so far, in write order
    pub fn filenames(&self) -> &[String] {
        &self.filenames
    }

    /// Stream `source` to a fresh destination derived from `declared_path`.
    ///
    /// Returns the final, possibly disambiguated, file name. On error the
    /// whole batch has already been rolled back and the session closed.
    pub async fn write_file<R>(&mut self, declared_path: &str, source: R) -> Result<String>
    where
        R: AsyncRead + Unpin,
    {
        if self.done {
            return Err(ShareError::UploadFailed("upload already closed".to_string()));
        }
        match self.write_one(declared_path, source).await {
            Ok(name) => {
                self.filenames.push(name.clone());
                Ok(name)
            }
            Err(e) => {
                match &e {
                    ShareError::UploadCancelled => {
                        tracing::info!("🛑 Upload {} cancelled, rolling back", self.session_id)
                    }
                    other => tracing::error!(
                        "Upload {} failed, rolling back: {}",
                        self.session_id,
                        other
                    ),
                }
                self.rollback();
                Err(e)
            }
        }
    }

    /// Close the session and return the written names in input order.
    pub fn finish(mut self) -> Vec<String> {
        self.done = true;
        self.registry.close(&self.session_id);
        tracing::info!(
            "✅ Upload {} completed: {} file(s)",
            self.session_id,
            self.filenames.len()
        );
        std::mem::take(&mut self.filenames)
    }

    /// Roll back everything written so far.
    pub fn abort(mut self) {
        self.rollback();
    }

    async fn write_one<R>(&mut self, declared_path: &str, mut source: R) -> Result<String>
    where
        R: AsyncRead + Unpin,
    {
        self.check_cancelled()?;

        let relative = safe_relative_path(declared_path)?;
        let (path, mut file) = create_unique(&self.root, &relative, &mut self.created_dirs)
            .await
            .map_err(failed)?;
        self.written.push(path.clone());
        if !self.registry.record_written(&self.session_id, path.clone()) {
            // another request sharing this id closed it; reopen so cancel still reaches us
            tracing::warn!("Upload session {} was closed underneath a running batch", self.session_id);
            self.registry.open(&self.session_id);
            self.registry.record_written(&self.session_id, path.clone());
        }

        tracing::debug!("Writing upload {} -> {:?}", self.session_id, path);

        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut total = 0u64;
        loop {
            self.check_cancelled()?;

            let n = source.read(&mut buf).await.map_err(failed)?;
            if n == 0 {
                break;
            }
            file.write_all(&buf[..n]).await.map_err(failed)?;
            total += n as u64;
        }
        file.flush().await.map_err(failed)?;
        file.sync_all().await.map_err(failed)?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        tracing::debug!("Stored {} ({} bytes)", name, total);
        Ok(name)
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.registry.is_cancelled(&self.session_id) {
            return Err(ShareError::UploadCancelled);
        }
        Ok(())
    }

    // best effort: failures are logged, never returned
    fn rollback(&mut self) {
        if self.done {
            return;
        }
        self.done = true;

        // only this batch's own files; a shared session id never widens the rollback
        self.registry.close(&self.session_id);

        for path in self.written.drain(..).rev() {
            match std::fs::remove_file(&path) {
                Ok(()) => tracing::debug!("Removed partial upload {:?}", path),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => tracing::error!("Failed to remove partial upload {:?}: {}", path, e),
            }
        }

        // deepest first; a directory someone else wrote into stays
        for dir in self.created_dirs.drain(..).rev() {
            match std::fs::remove_dir(&dir) {
                Ok(()) => tracing::debug!("Removed upload directory {:?}", dir),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => tracing::debug!("Keeping upload directory {:?}: {}", dir, e),
            }
        }
        self.filenames.clear();
    }
}

impl Drop for UploadBatch {
    fn drop(&mut self) {
        if !self.done {
            tracing::warn!(
                "Upload {} dropped before completion, rolling back",
                self.session_id
            );
            self.rollback();
        }
    }
}

/// Write a complete batch of `(declared path, source)` pairs.
pub async fn write_batch<R>(
    registry: Arc<UploadRegistry>,
    session_id: &str,
    root: &Path,
    files: Vec<(String, R)>,
) -> Result<Vec<String>>
where
    R: AsyncRead + Unpin,
{
    let mut batch = UploadBatch::begin(registry, session_id, root);
    for (declared_path, source) in files {
        batch.write_file(&declared_path, source).await?;
    }
    Ok(batch.finish())
}

/// Sanitize a client supplied relative path one component at a time.
///
/// Empty, `.` and `..` components are dropped, so the result always stays
/// below the upload root.
pub fn safe_relative_path(declared: &str) -> Result<PathBuf> {
    let components: Vec<String> = declared
        .split(['/', '\\'])
        .filter(|c| !c.is_empty() && *c != "." && *c != "..")
        .map(sanitize_filename)
        .filter(|c| !c.is_empty())
        .collect();

    if components.is_empty() {
        tracing::warn!("Rejected upload path {:?}", declared);
        return Err(ShareError::BadRequest(format!(
            "Invalid file name: {:?}",
            declared
        )));
    }

    Ok(components.iter().collect())
}

/// `name.ext`, `name_1.ext`, `name_2.ext`, ...
pub fn numbered_name(filename: &str, n: u32) -> String {
    if n == 0 {
        return filename.to_string();
    }
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}_{}.{}", stem, n, ext),
        _ => format!("{}_{}", filename, n),
    }
}

/// Create `root/relative`, probing numbered names until one can be created
/// exclusively. Every parent directory created on the way is pushed onto
/// `created_dirs`.
async fn create_unique(
    root: &Path,
    relative: &Path,
    created_dirs: &mut Vec<PathBuf>,
) -> io::Result<(PathBuf, File)> {
    fs::create_dir_all(root).await?;

    let mut dir = root.to_path_buf();
    if let Some(parent) = relative.parent() {
        for component in parent.components() {
            dir.push(component);
            match fs::create_dir(&dir).await {
                Ok(()) => created_dirs.push(dir.clone()),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
                Err(e) => return Err(e),
            }
        }
    }

    let filename = relative
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "missing file name"))?;

    let mut n = 0u32;
    loop {
        let candidate = dir.join(numbered_name(&filename, n));
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
            .await
        {
            Ok(file) => return Ok((candidate, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                tracing::trace!("{:?} exists, trying next suffix", candidate);
                n = n
                    .checked_add(1)
                    .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "no free file name"))?;
            }
            Err(e) => return Err(e),
        }
    }
}

fn failed(e: io::Error) -> ShareError {
    ShareError::UploadFailed(e.to_string())
}
