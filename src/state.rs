use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashSet;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::sessions::UploadRegistry;

/// shared application state
#[derive(Clone)]
pub struct AppState {
    pub files_dir: PathBuf,
    pub catalog: Catalog,
    /// live upload sessions, injected so tests can use their own
    pub uploads: Arc<UploadRegistry>,
    pub allow_delete: bool,
    /// sha256 hex of the access pin, if one is required
    pub pin_hash: Option<String>,
    /// distinct client addresses seen since start
    pub visitors: Arc<DashSet<IpAddr>>,
}

impl AppState {
    /// open state over `files_dir`: no pin, delete enabled
    pub fn new(files_dir: PathBuf) -> Self {
        Self::with_registry(files_dir, Arc::new(UploadRegistry::new()))
    }

    pub fn with_registry(files_dir: PathBuf, uploads: Arc<UploadRegistry>) -> Self {
        Self {
            catalog: Catalog::new(files_dir.clone()),
            files_dir,
            uploads,
            allow_delete: true,
            pin_hash: None,
            visitors: Arc::new(DashSet::new()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let mut state = Self::new(config.files_dir.clone());
        state.allow_delete = config.allow_delete;
        state.pin_hash = config.pin_hash.clone();
        state
    }
}
