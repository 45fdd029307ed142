use std::sync::Arc;

use taskflow_core::blob::BlobStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is a pool handle or behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub pool: taskflow_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Storage for avatars, report files and chat attachments.
    pub blobs: Arc<dyn BlobStore>,
}
