//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `RemoteStore` port from the `core` crate. Every document lives as one
//! JSONB row in PostgreSQL, addressed by `(collection, document_id)`.

use async_trait::async_trait;
use biblio_core::ports::{PortError, PortResult, RemoteStore};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `RemoteStore` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct DocumentRecord {
    body: Json<Value>,
}

//=========================================================================================
// `RemoteStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl RemoteStore for DbAdapter {
    async fn get(&self, collection: &str, document_id: &str) -> PortResult<Option<Value>> {
        let record = sqlx::query_as::<_, DocumentRecord>(
            "SELECT body FROM remote_documents WHERE collection = $1 AND document_id = $2",
        )
        .bind(collection)
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(record.map(|r| r.body.0))
    }

    async fn set(&self, collection: &str, document_id: &str, value: Value) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO remote_documents (collection, document_id, body, updated_at) \
             VALUES ($1, $2, $3, now()) \
             ON CONFLICT (collection, document_id) \
             DO UPDATE SET body = EXCLUDED.body, updated_at = EXCLUDED.updated_at",
        )
        .bind(collection)
        .bind(document_id)
        .bind(Json(value))
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(())
    }
}

fn map_db_error(e: sqlx::Error) -> PortError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            PortError::Unavailable(e.to_string())
        }
        _ => PortError::Unexpected(e.to_string()),
    }
}
