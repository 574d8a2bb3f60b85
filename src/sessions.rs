//! Live upload sessions and their cancellation flags.
//!
//! One mutex guards the whole table. Every operation holds it only for a
//! map lookup, so a `cancel` is seen by the writer's next chunk poll.

use std::collections::HashMap;
use std::path::PathBuf;

use parking_lot::Mutex;

use crate::error::{Result, ShareError};

/// Per-upload state owned by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSession {
    pub id: String,
    pub cancelled: bool,
    /// every destination created by this upload, in creation order
    pub written_paths: Vec<PathBuf>,
}

impl UploadSession {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            cancelled: false,
            written_paths: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct UploadRegistry {
    sessions: Mutex<HashMap<String, UploadSession>>,
}

impl UploadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fresh session, or return the existing one untouched.
    pub fn open(&self, id: &str) -> UploadSession {
        let mut sessions = self.sessions.lock();
        sessions
            .entry(id.to_string())
            .or_insert_with(|| {
                tracing::debug!("Opened upload session {}", id);
                UploadSession::new(id)
            })
            .clone()
    }

    pub fn cancel(&self, id: &str) -> Result<()> {
        let mut sessions = self.sessions.lock();
        match sessions.get_mut(id) {
            Some(session) => {
                session.cancelled = true;
                tracing::info!("🛑 Cancellation requested for upload session {}", id);
                Ok(())
            }
            None => Err(ShareError::SessionNotFound),
        }
    }

    /// Unknown ids report `false`.
    pub fn is_cancelled(&self, id: &str) -> bool {
        self.sessions
            .lock()
            .get(id)
            .map(|s| s.cancelled)
            .unwrap_or(false)
    }

    /// Remember a destination so it can be rolled back. Returns `false` if
    /// the session is gone.
    pub fn record_written(&self, id: &str, path: PathBuf) -> bool {
        match self.sessions.lock().get_mut(id) {
            Some(session) => {
                session.written_paths.push(path);
                true
            }
            None => false,
        }
    }

    /// Remove the session, handing back its final state. No-op when absent.
    pub fn close(&self, id: &str) -> Option<UploadSession> {
        let removed = self.sessions.lock().remove(id);
        if removed.is_some() {
            tracing::debug!("Closed upload session {}", id);
        }
        removed
    }

    pub fn get(&self, id: &str) -> Option<UploadSession> {
        self.sessions.lock().get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}
