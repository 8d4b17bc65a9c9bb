//! crates/biblio_core/src/catalog.rs
//!
//! Building catalog entries from share links.

use crate::domain::{BookMetadata, CatalogEntry};
use crate::locator::LocatorParser;
use chrono::{Datelike, Utc};
use uuid::Uuid;

pub const DEFAULT_COVER_URL: &str =
    "https://images.unsplash.com/photo-1543002588-bfa74002ed7e?w=400&h=600&fit=crop";

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Not a valid file reference: {0}")]
    InvalidReference(String),
}

impl CatalogEntry {
    /// Creates an entry for the file behind `reference`, filling missing
    /// metadata with placeholders.
    pub fn from_reference(
        parser: &LocatorParser,
        reference: &str,
        metadata: BookMetadata,
        uploaded_by: &str,
    ) -> Result<Self, CatalogError> {
        let locator = parser.parse(reference);
        let (Some(file_id), Some(view_url), Some(preview_url), Some(download_url)) = (
            locator.canonical_id,
            locator.view_url,
            locator.preview_url,
            locator.download_url,
        ) else {
            return Err(CatalogError::InvalidReference(reference.to_string()));
        };

        let now = Utc::now();
        Ok(Self {
            id: format!("book_{}", Uuid::new_v4().simple()),
            title: metadata.title.unwrap_or_else(|| "Untitled".to_string()),
            author: metadata
                .author
                .unwrap_or_else(|| "Unknown author".to_string()),
            category: metadata
                .category
                .unwrap_or_else(|| "Uncategorized".to_string()),
            description: metadata
                .description
                .unwrap_or_else(|| "No description".to_string()),
            pages: metadata.pages.unwrap_or(0),
            year: metadata.year.unwrap_or_else(|| now.year()),
            cover_url: metadata
                .cover_url
                .unwrap_or_else(|| DEFAULT_COVER_URL.to_string()),
            file_id,
            view_url,
            preview_url,
            download_url,
            is_remote_file: true,
            has_pdf: true,
            uploaded_by: uploaded_by.to_string(),
            created_at: now,
        })
    }
}
