//! API handlers.

pub mod file;

pub use file::*;

use std::sync::Arc;

use crate::file::FileService;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    /// File service that uploads and queries are delegated to.
    pub service: Arc<dyn FileService>,
    /// Maximum upload size in bytes.
    pub max_upload_size: u64,
}

impl AppState {
    /// Create a new application state.
    pub fn new(service: Arc<dyn FileService>, max_upload_size: u64) -> Self {
        Self {
            service,
            max_upload_size,
        }
    }
}
