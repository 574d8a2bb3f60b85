use std::path::PathBuf;
use sha2::{Sha256, Digest};

/// application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// directory being shared
    pub files_dir: PathBuf,
    /// bind address
    pub host: String,
    /// bind port
    pub port: u16,
    /// sha256 hex of the access pin; `None` leaves the share open
    pub pin_hash: Option<String>,
    /// whether clients may delete shared files
    pub allow_delete: bool,
    /// maximum upload request size in bytes
    pub max_upload_size: usize,
    /// number of tokio worker threads
    pub worker_threads: usize,
    /// empty the shared directory on shutdown
    pub cleanup_on_exit: bool,
}

impl Config {
    /// load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let pin_hash = std::env::var("SHARE_PIN")
            .ok()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .map(|p| Self::hash_pin(&p));

        Self {
            files_dir: std::env::var("SHARE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| Self::default_dir()),
            host: std::env::var("SHARE_HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("SHARE_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            pin_hash,
            allow_delete: !env_flag("DISABLE_DELETE"),
            max_upload_size: std::env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(16 * 1024 * 1024 * 1024), // 16GB default
            worker_threads: std::env::var("WORKER_THREADS")
                .ok()
                .and_then(|t| t.parse().ok())
                .filter(|t| *t > 0)
                .unwrap_or(8),
            cleanup_on_exit: env_flag("CLEANUP_ON_EXIT"),
        }
    }

    /// `$HOME/LocalShare`, falling back to the working directory
    pub fn default_dir() -> PathBuf {
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("LocalShare")
    }

    // hash pin using sha256
    pub fn hash_pin(pin: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(pin.as_bytes());
        hex::encode(hasher.finalize())
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}
