use std::path::PathBuf;

use crate::bus::BusTracker;
use crate::db::Database;
use crate::session::SessionManager;

/// Where uploaded media lands on disk and how it is addressed publicly.
#[derive(Clone)]
pub struct MediaConfig {
    pub dir: PathBuf,
    pub public_base_url: String,
    pub max_upload_bytes: u64,
}

/// Upstream telematics endpoint plus the local snapshot used as fallback.
#[derive(Clone)]
pub struct BusConfig {
    pub upstream_url: String,
    pub snapshot_path: PathBuf,
}

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub session_manager: SessionManager,
    pub http: reqwest::Client,
    pub bus_tracker: BusTracker,
    pub bus: BusConfig,
    pub media: MediaConfig,
}

impl AppState {
    pub fn new(db: Database, http: reqwest::Client, bus: BusConfig, media: MediaConfig) -> Self {
        let session_manager = SessionManager::new(db.clone());
        Self {
            db,
            session_manager,
            http,
            bus_tracker: BusTracker::new(),
            bus,
            media,
        }
    }

    /// Get authenticated user ID from session token
    pub fn get_authenticated_user_id_from_token(&self, token: &str) -> Option<uuid::Uuid> {
        self.session_manager.validate_session(token).ok()
    }
}
