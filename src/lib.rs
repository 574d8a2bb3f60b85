pub mod archive;
pub mod catalog;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod range;
pub mod server;
pub mod sessions;
pub mod state;
pub mod streamer;
pub mod upload;
pub mod utils;

pub use error::{Result, ShareError};

/// read/write granularity shared by the streamer and the upload writer
pub const CHUNK_SIZE: usize = 8192;
