pub mod api;
pub mod catalog;
pub mod config;
pub mod crypto;
pub mod db;
pub mod session;

pub use db::DbPool;

use std::sync::Arc;

use config::Config;
use crypto::CredentialVerifier;
use session::{SessionManager, SessionStore};

pub struct AppState {
    pub config: Config,
    pub db: DbPool,
    pub store: Arc<dyn SessionStore>,
    pub sessions: SessionManager,
}

impl AppState {
    pub fn new(
        config: Config,
        db: DbPool,
        store: Arc<dyn SessionStore>,
        verifier: CredentialVerifier,
    ) -> Self {
        let sessions = SessionManager::new(db.clone(), store.clone(), verifier);
        Self {
            config,
            db,
            store,
            sessions,
        }
    }
}
