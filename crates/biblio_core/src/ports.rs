//! crates/biblio_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the library's core logic.
//! These traits form the boundary of the hexagonal architecture: the hosted
//! document database, the browser-profile storage and the file host all live
//! behind them, so the core never depends on a concrete backend.

use async_trait::async_trait;
use serde_json::Value;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The hosted, authoritative document store.
///
/// Documents are addressed by `(collection, document_id)`. A missing document is
/// `Ok(None)`; failures are signalled through `Err`, never through a sentinel value.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn get(&self, collection: &str, document_id: &str) -> PortResult<Option<Value>>;

    /// Replaces the whole document. Last write wins.
    async fn set(&self, collection: &str, document_id: &str, value: Value) -> PortResult<()>;
}

/// Durable key-value storage scoped to one client profile. Values are text.
pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> PortResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> PortResult<()>;
}

#[async_trait]
pub trait ReachabilityService: Send + Sync {
    /// Issues a single existence probe against `url`.
    async fn probe(&self, url: &str) -> PortResult<bool>;
}
