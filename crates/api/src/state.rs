use std::sync::Arc;

use storyweave_events::Notifier;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: storyweave_db::DbPool,
    /// Server configuration (base URL, review inbox, JWT secrets).
    pub config: Arc<ServerConfig>,
    /// Outbound notification dispatcher (may be unconfigured).
    pub notifier: Arc<Notifier>,
}
