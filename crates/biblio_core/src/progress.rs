//! crates/biblio_core/src/progress.rs
//!
//! Reading-position, annotation and favorites persistence over two backends.
//!
//! Reads try the remote store first and fall back to the local store; writes
//! always land in the local store and additionally reach the remote store when
//! the last successful read came from it. Nothing here ever returns an error to
//! the caller: the worst case is page 1 or an empty annotation list.

use crate::domain::{Annotation, ReadingProgress};
use crate::ports::{LocalStore, PortError, PortResult, RemoteStore};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, warn};

pub const PROGRESS_COLLECTION: &str = "readingProgress";
pub const ANNOTATIONS_COLLECTION: &str = "annotations";
pub const FAVORITES_COLLECTION: &str = "favorites";

/// The backend a read was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Remote,
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordKind {
    Progress,
    Annotations,
    Favorites,
}

impl RecordKind {
    fn collection(self) -> &'static str {
        match self {
            RecordKind::Progress => PROGRESS_COLLECTION,
            RecordKind::Annotations => ANNOTATIONS_COLLECTION,
            RecordKind::Favorites => FAVORITES_COLLECTION,
        }
    }
}

/// Where one record lives in each backend.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Slot {
    kind: RecordKind,
    local_key: String,
    remote_id: String,
}

/// A record read through the fallback chain.
struct Fetched<T> {
    record: Option<T>,
    /// `false` when every backend failed, so `record` says nothing about what is stored.
    answered: bool,
}

/// How a remote write should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RemoteWrite {
    /// The last read came from the remote store; failures are worth a warning.
    Targeted,
    /// No read has happened yet; the result is ignored.
    Opportunistic,
}

#[derive(Default)]
struct StoreState {
    last_read: Option<Backend>,
    /// Local keys written through this store. Reads for them go to the local
    /// store first so a caller always sees its own writes.
    ///
    /// Holds at most two keys per document the user has touched plus the
    /// favorites key; it is never pruned while the store lives.
    written: HashSet<String>,
}

struct Inner {
    user_id: String,
    remote: Option<Arc<dyn RemoteStore>>,
    local: Arc<dyn LocalStore>,
    state: Mutex<StoreState>,
}

/// Per-user facade over the remote and local stores. Cheap to clone.
#[derive(Clone)]
pub struct ProgressStore {
    inner: Arc<Inner>,
}

impl ProgressStore {
    /// `remote` is `None` when the bootstrap found no remote backend.
    pub fn new(
        user_id: impl Into<String>,
        remote: Option<Arc<dyn RemoteStore>>,
        local: Arc<dyn LocalStore>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                user_id: user_id.into(),
                remote,
                local,
                state: Mutex::new(StoreState::default()),
            }),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.inner.user_id
    }

    pub fn has_remote(&self) -> bool {
        self.inner.remote.is_some()
    }

    /// The backend used by the most recent successful backend-selecting read.
    pub fn last_read_backend(&self) -> Option<Backend> {
        self.state().last_read
    }

    //=====================================================================================
    // Reading progress
    //=====================================================================================

    /// The saved progress record, with its page clamped to the stored page count.
    pub async fn get_progress(&self, document_id: &str) -> Option<ReadingProgress> {
        let slot = self.document_slot(RecordKind::Progress, document_id);
        self.read::<ReadingProgress>(&slot)
            .await
            .record
            .map(ReadingProgress::clamped)
    }

    /// The last saved page, or 1 for a document never seen before.
    pub async fn get_page(&self, document_id: &str) -> u32 {
        self.get_progress(document_id)
            .await
            .map(|p| p.page)
            .unwrap_or(1)
    }

    pub async fn set_page(&self, document_id: &str, page: u32, total_pages: u32) {
        let progress = ReadingProgress::new(document_id, page, total_pages, Utc::now());
        let slot = self.document_slot(RecordKind::Progress, document_id);
        self.write(&slot, &progress).await;
    }

    /// Fire-and-forget variant of [`ProgressStore::set_page`].
    ///
    /// The local write completes before this returns; the remote write runs on
    /// the current Tokio runtime and is skipped when there is none.
    pub fn set_page_detached(&self, document_id: &str, page: u32, total_pages: u32) {
        let progress = ReadingProgress::new(document_id, page, total_pages, Utc::now());
        let Some(value) = encode(&progress) else {
            return;
        };
        let slot = self.document_slot(RecordKind::Progress, document_id);

        self.write_local(&slot, &value);

        let Some((remote, mode)) = self.remote_target() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    write_remote(remote, mode, &slot, value).await;
                });
            }
            Err(_) => warn!(
                "No async runtime available; progress for {} kept locally only",
                document_id
            ),
        }
    }

    //=====================================================================================
    // Annotations
    //=====================================================================================

    /// All annotations for a document, in the order they were added.
    pub async fn get_annotations(&self, document_id: &str) -> Vec<Annotation> {
        let slot = self.document_slot(RecordKind::Annotations, document_id);
        self.read(&slot).await.record.unwrap_or_default()
    }

    /// Appends an annotation. Prior annotations are kept in place.
    pub async fn add_annotation(&self, document_id: &str, mut annotation: Annotation) {
        annotation.document_id = document_id.to_string();
        let slot = self.document_slot(RecordKind::Annotations, document_id);
        let fetched = self.read::<Vec<Annotation>>(&slot).await;
        let answered = fetched.answered;
        let mut annotations = fetched.record.unwrap_or_default();
        annotations.push(annotation);
        self.write_merged(&slot, &annotations, answered).await;
    }

    //=====================================================================================
    // Favorites
    //=====================================================================================

    /// Ids of the user's favorite documents, oldest first.
    pub async fn get_favorites(&self) -> Vec<String> {
        self.read(&self.favorites_slot())
            .await
            .record
            .unwrap_or_default()
    }

    pub async fn is_favorite(&self, document_id: &str) -> bool {
        self.get_favorites().await.iter().any(|id| id == document_id)
    }

    /// Marks a document as favorite. Returns `false` if it already was one.
    pub async fn add_favorite(&self, document_id: &str) -> bool {
        let slot = self.favorites_slot();
        let fetched = self.read::<Vec<String>>(&slot).await;
        let answered = fetched.answered;
        let mut favorites = fetched.record.unwrap_or_default();
        if favorites.iter().any(|id| id == document_id) {
            return false;
        }
        favorites.push(document_id.to_string());
        self.write_merged(&slot, &favorites, answered).await;
        true
    }

    /// Unmarks a document. Returns `false` if it was not a favorite.
    pub async fn remove_favorite(&self, document_id: &str) -> bool {
        let slot = self.favorites_slot();
        let fetched = self.read::<Vec<String>>(&slot).await;
        let answered = fetched.answered;
        let mut favorites = fetched.record.unwrap_or_default();
        let before = favorites.len();
        favorites.retain(|id| id != document_id);
        if favorites.len() == before {
            return false;
        }
        self.write_merged(&slot, &favorites, answered).await;
        true
    }

    //=====================================================================================
    // Backend selection
    //=====================================================================================

    fn state(&self) -> MutexGuard<'_, StoreState> {
        // The state is plain bookkeeping, so a poisoned lock is still usable.
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn document_slot(&self, kind: RecordKind, document_id: &str) -> Slot {
        let prefix = match kind {
            RecordKind::Progress => "progress",
            RecordKind::Annotations => "annotations",
            RecordKind::Favorites => "favorites",
        };
        Slot {
            kind,
            local_key: format!("{}_{}", prefix, document_id),
            remote_id: format!("{}:{}", self.inner.user_id, document_id),
        }
    }

    /// Favorites are one list per user; the local profile is already per user.
    fn favorites_slot(&self) -> Slot {
        Slot {
            kind: RecordKind::Favorites,
            local_key: "favorites".to_string(),
            remote_id: self.inner.user_id.clone(),
        }
    }

    async fn read<T: DeserializeOwned>(&self, slot: &Slot) -> Fetched<T> {
        let key = &slot.local_key;
        let collection = slot.kind.collection();

        let written_here = self.state().written.contains(key);
        let mut local_ok = false;
        if written_here {
            match self.read_local::<T>(key) {
                Ok(Some(record)) => {
                    return Fetched {
                        record: Some(record),
                        answered: true,
                    }
                }
                Ok(None) => local_ok = true,
                Err(e) => warn!("Local read of {} failed: {}", key, e),
            }
        }

        let mut remote_ok = false;
        if let Some(remote) = &self.inner.remote {
            match self.read_remote::<T>(remote.as_ref(), slot).await {
                Ok(Some(record)) => {
                    self.note_read(Backend::Remote, written_here);
                    return Fetched {
                        record: Some(record),
                        answered: true,
                    };
                }
                Ok(None) => {
                    debug!("No remote {} record for {}", collection, slot.remote_id);
                    self.note_read(Backend::Remote, written_here);
                    remote_ok = true;
                }
                Err(e) => warn!(
                    "Remote read of {} for {} failed, falling back to local store: {}",
                    collection, slot.remote_id, e
                ),
            }
        }

        if written_here {
            // The local store was consulted above.
            return Fetched {
                record: None,
                answered: local_ok || remote_ok,
            };
        }

        match self.read_local::<T>(key) {
            Ok(record) => {
                if !remote_ok {
                    self.note_read(Backend::Local, false);
                }
                Fetched {
                    record,
                    answered: true,
                }
            }
            Err(e) => {
                if remote_ok {
                    warn!("Local read of {} failed: {}", key, e);
                } else {
                    error!("Both backends failed reading {}: {}", key, e);
                }
                Fetched {
                    record: None,
                    answered: remote_ok,
                }
            }
        }
    }

    fn note_read(&self, backend: Backend, written_here: bool) {
        if !written_here {
            self.state().last_read = Some(backend);
        }
    }

    fn read_local<T: DeserializeOwned>(&self, key: &str) -> PortResult<Option<T>> {
        match self.inner.local.get(key)? {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    async fn read_remote<T: DeserializeOwned>(
        &self,
        remote: &dyn RemoteStore,
        slot: &Slot,
    ) -> PortResult<Option<T>> {
        match remote.get(slot.kind.collection(), &slot.remote_id).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    fn remote_target(&self) -> Option<(Arc<dyn RemoteStore>, RemoteWrite)> {
        let remote = self.inner.remote.clone()?;
        match self.state().last_read {
            Some(Backend::Remote) => Some((remote, RemoteWrite::Targeted)),
            None => Some((remote, RemoteWrite::Opportunistic)),
            Some(Backend::Local) => None,
        }
    }

    async fn write<T: Serialize>(&self, slot: &Slot, record: &T) {
        let Some(value) = encode(record) else {
            return;
        };
        self.write_local(slot, &value);
        if let Some((remote, mode)) = self.remote_target() {
            write_remote(remote, mode, slot, value).await;
        }
    }

    /// Writes the result of a read-modify-write. When no backend answered the
    /// read, the merged list is partial and must not replace the remote copy.
    async fn write_merged<T: Serialize>(&self, slot: &Slot, record: &T, answered: bool) {
        if answered {
            self.write(slot, record).await;
            return;
        }
        warn!(
            "Could not read {} before updating it; keeping the update local",
            slot.local_key
        );
        if let Some(value) = encode(record) {
            self.write_local(slot, &value);
        }
    }

    fn write_local(&self, slot: &Slot, value: &Value) {
        let key = &slot.local_key;
        match self.inner.local.set(key, &value.to_string()) {
            Ok(()) => {
                self.state().written.insert(key.clone());
            }
            Err(e) => error!("Local write of {} failed: {}", key, e),
        }
    }
}

fn encode<T: Serialize>(record: &T) -> Option<Value> {
    match serde_json::to_value(record) {
        Ok(value) => Some(value),
        Err(e) => {
            error!("Could not encode record: {}", PortError::from(e));
            None
        }
    }
}

async fn write_remote(remote: Arc<dyn RemoteStore>, mode: RemoteWrite, slot: &Slot, value: Value) {
    let collection = slot.kind.collection();
    if let Err(e) = remote.set(collection, &slot.remote_id, value).await {
        match mode {
            RemoteWrite::Targeted => warn!(
                "Remote write of {} for {} failed; local copy stands: {}",
                collection, slot.remote_id, e
            ),
            RemoteWrite::Opportunistic => debug!(
                "Opportunistic remote write of {} for {} failed: {}",
                collection, slot.remote_id, e
            ),
        }
    }
}
