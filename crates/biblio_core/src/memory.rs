//! crates/biblio_core/src/memory.rs
//!
//! In-process implementations of the storage ports. Used when no durable
//! backend is configured, and as the baseline doubles in tests.

use crate::ports::{LocalStore, PortResult, RemoteStore};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Default)]
pub struct MemoryLocalStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryLocalStore {
    fn get(&self, key: &str) -> PortResult<Option<String>> {
        let entries = self.entries.read().unwrap_or_else(|p| p.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> PortResult<()> {
        let mut entries = self.entries.write().unwrap_or_else(|p| p.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Documents keyed by `(collection, document_id)`.
#[derive(Default)]
pub struct MemoryRemoteStore {
    documents: RwLock<HashMap<(String, String), Value>>,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.read().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn get(&self, collection: &str, document_id: &str) -> PortResult<Option<Value>> {
        let documents = self.documents.read().unwrap_or_else(|p| p.into_inner());
        Ok(documents
            .get(&(collection.to_string(), document_id.to_string()))
            .cloned())
    }

    async fn set(&self, collection: &str, document_id: &str, value: Value) -> PortResult<()> {
        let mut documents = self.documents.write().unwrap_or_else(|p| p.into_inner());
        documents.insert((collection.to_string(), document_id.to_string()), value);
        Ok(())
    }
}
