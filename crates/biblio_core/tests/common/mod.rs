//! Port doubles shared by the integration tests.
//! Note: #[allow(dead_code)] because each test file compiles common/ separately.
#![allow(dead_code)]

use async_trait::async_trait;
use biblio_core::memory::MemoryRemoteStore;
use biblio_core::ports::{LocalStore, PortError, PortResult, ReachabilityService, RemoteStore};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// A remote store whose reads and writes can be switched to fail.
#[derive(Default)]
pub struct SwitchableRemote {
    inner: MemoryRemoteStore,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
    pub reads: AtomicUsize,
    pub writes: AtomicUsize,
}

impl SwitchableRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let remote = Self::default();
        remote.fail_reads.store(true, Ordering::SeqCst);
        remote.fail_writes.store(true, Ordering::SeqCst);
        remote
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub async fn seed(&self, collection: &str, document_id: &str, value: Value) {
        self.inner.set(collection, document_id, value).await.unwrap();
    }

    pub async fn peek(&self, collection: &str, document_id: &str) -> Option<Value> {
        self.inner.get(collection, document_id).await.unwrap()
    }
}

#[async_trait]
impl RemoteStore for SwitchableRemote {
    async fn get(&self, collection: &str, document_id: &str) -> PortResult<Option<Value>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(PortError::Unavailable("remote read refused".to_string()));
        }
        self.inner.get(collection, document_id).await
    }

    async fn set(&self, collection: &str, document_id: &str, value: Value) -> PortResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PortError::Unavailable("remote write refused".to_string()));
        }
        self.inner.set(collection, document_id, value).await
    }
}

/// A local store that refuses every operation.
pub struct BrokenLocal;

impl LocalStore for BrokenLocal {
    fn get(&self, _key: &str) -> PortResult<Option<String>> {
        Err(PortError::Unexpected("storage quota exceeded".to_string()))
    }

    fn set(&self, _key: &str, _value: &str) -> PortResult<()> {
        Err(PortError::Unexpected("storage quota exceeded".to_string()))
    }
}

/// A probe that answers from a fixed script and records the URLs it was asked about.
pub struct ScriptedProbe {
    answer: Option<bool>,
    pub seen: Mutex<Vec<String>>,
}

impl ScriptedProbe {
    pub fn answering(reachable: bool) -> Self {
        Self {
            answer: Some(reachable),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn erroring() -> Self {
        Self {
            answer: None,
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ReachabilityService for ScriptedProbe {
    async fn probe(&self, url: &str) -> PortResult<bool> {
        self.seen.lock().unwrap().push(url.to_string());
        self.answer
            .ok_or_else(|| PortError::Unavailable("connection reset".to_string()))
    }
}

/// Gives spawned fire-and-forget tasks a chance to run.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
