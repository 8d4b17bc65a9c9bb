//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the per-user progress stores.

use crate::adapters::FileLocalStore;
use crate::config::Config;
use biblio_core::memory::MemoryLocalStore;
use biblio_core::ports::{LocalStore, RemoteStore};
use biblio_core::{LocatorParser, ProgressStore};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{error, info};

//=========================================================================================
// Local profiles
//=========================================================================================

/// Where each user's local store lives.
#[derive(Clone, Debug)]
pub enum LocalProfiles {
    /// One sub-directory per user below the given root.
    Directory(PathBuf),
    /// Process memory only; nothing survives a restart.
    InMemory,
}

impl LocalProfiles {
    fn open(&self, user_id: &str) -> Arc<dyn LocalStore> {
        match self {
            LocalProfiles::Directory(root) => match FileLocalStore::open_profile(root, user_id) {
                Ok(store) => Arc::new(store),
                Err(e) => {
                    error!(
                        "Could not open local profile for {} under {:?}, using memory: {}",
                        user_id, root, e
                    );
                    Arc::new(MemoryLocalStore::new())
                }
            },
            LocalProfiles::InMemory => Arc::new(MemoryLocalStore::new()),
        }
    }
}

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    pub config: Arc<Config>,
    pub locator: LocatorParser,
    /// `None` when the bootstrap could not reach the remote database.
    pub remote: Option<Arc<dyn RemoteStore>>,
    pub profiles: LocalProfiles,
    stores: Mutex<HashMap<String, ProgressStore>>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        locator: LocatorParser,
        remote: Option<Arc<dyn RemoteStore>>,
        profiles: LocalProfiles,
    ) -> Self {
        Self {
            config,
            locator,
            remote,
            profiles,
            stores: Mutex::new(HashMap::new()),
        }
    }

    /// The progress store of one user, created on first use and kept for the
    /// process lifetime so its backend selection carries across requests.
    pub fn progress_for(&self, user_id: &str) -> ProgressStore {
        let mut stores = self.stores.lock().unwrap_or_else(|p| p.into_inner());
        stores
            .entry(user_id.to_string())
            .or_insert_with(|| {
                info!("Creating progress store for user {}", user_id);
                ProgressStore::new(user_id, self.remote.clone(), self.profiles.open(user_id))
            })
            .clone()
    }
}
