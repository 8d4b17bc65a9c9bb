//! crates/biblio_core/src/domain.rs
//!
//! Defines the pure, core data structures for the library.
//! These structs carry serde derives only so the persistence ports can store them
//! as JSON text; they know nothing about any particular backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which positional pattern produced a canonical identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocatorKind {
    File,
    Folder,
    Query,
    Bare,
}

/// A parsed external resource reference (share link) and the access URLs derived from it.
///
/// Built only by [`crate::locator::LocatorParser`]. Either every derived field is
/// present (`valid == true`) or none is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLocator {
    pub raw_reference: String,
    pub canonical_id: Option<String>,
    pub kind: Option<LocatorKind>,
    pub preview_url: Option<String>,
    pub download_url: Option<String>,
    pub view_url: Option<String>,
    pub valid: bool,
}

impl ResourceLocator {
    pub(crate) fn invalid(raw_reference: &str) -> Self {
        Self {
            raw_reference: raw_reference.to_string(),
            canonical_id: None,
            kind: None,
            preview_url: None,
            download_url: None,
            view_url: None,
            valid: false,
        }
    }

    /// The URL handed to the renderer for this resource.
    pub fn render_url(&self) -> Option<&str> {
        self.preview_url.as_deref()
    }
}

/// The last page a user reached in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingProgress {
    #[serde(alias = "bookId")]
    pub document_id: String,
    pub page: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(alias = "lastRead")]
    pub last_read_timestamp: DateTime<Utc>,
}

impl ReadingProgress {
    /// Builds a progress record, clamping `page` into `1..=total_pages`
    /// (or just `>= 1` while the page count is unknown).
    pub fn new(document_id: &str, page: u32, total_pages: u32, now: DateTime<Utc>) -> Self {
        Self {
            document_id: document_id.to_string(),
            page: clamp_page(page, total_pages),
            total_pages,
            last_read_timestamp: now,
        }
    }

    /// The same record with `page` clamped, for records written by other clients.
    pub fn clamped(mut self) -> Self {
        self.page = clamp_page(self.page, self.total_pages);
        self
    }
}

/// Clamps a page number into the valid range for a document of `total_pages` pages.
pub fn clamp_page(page: u32, total_pages: u32) -> u32 {
    let page = page.max(1);
    if total_pages > 0 {
        page.min(total_pages)
    } else {
        page
    }
}

/// A note attached to a piece of selected text.
///
/// Annotations have no identity beyond their position in the per-document list.
/// The aliases accept records written by the older browser client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    #[serde(default)]
    pub document_id: String,
    pub page: u32,
    #[serde(alias = "text")]
    pub quoted_text: String,
    #[serde(alias = "note")]
    pub note_text: String,
    #[serde(alias = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Annotation {
    pub fn new(document_id: &str, page: u32, quoted_text: &str, note_text: &str) -> Self {
        Self {
            document_id: document_id.to_string(),
            page: page.max(1),
            quoted_text: quoted_text.to_string(),
            note_text: note_text.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Optional, user-supplied descriptive fields for a new catalog entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub pages: Option<u32>,
    pub year: Option<i32>,
    pub cover_url: Option<String>,
}

/// A document in the catalog, backed by a file held in remote file storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub title: String,
    pub author: String,
    pub category: String,
    pub description: String,
    pub pages: u32,
    pub year: i32,
    pub cover_url: String,

    pub file_id: String,
    pub view_url: String,
    pub preview_url: String,
    pub download_url: String,

    pub is_remote_file: bool,
    pub has_pdf: bool,

    pub uploaded_by: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_page_is_clamped_to_document() {
        let now = Utc::now();
        assert_eq!(ReadingProgress::new("d", 0, 10, now).page, 1);
        assert_eq!(ReadingProgress::new("d", 42, 10, now).page, 10);
        assert_eq!(ReadingProgress::new("d", 42, 0, now).page, 42);
    }

    #[test]
    fn annotation_accepts_legacy_field_names() {
        let legacy = r#"{"page":3,"text":"quoted","note":"mine","timestamp":"2024-05-01T10:00:00.000Z"}"#;
        let annotation: Annotation = serde_json::from_str(legacy).unwrap();
        assert_eq!(annotation.page, 3);
        assert_eq!(annotation.quoted_text, "quoted");
        assert_eq!(annotation.note_text, "mine");
        assert!(annotation.document_id.is_empty());
    }

    #[test]
    fn progress_accepts_legacy_field_names() {
        let legacy = r#"{"bookId":"b1","page":5,"totalPages":9,"lastRead":"2024-05-01T10:00:00Z"}"#;
        let progress: ReadingProgress = serde_json::from_str(legacy).unwrap();
        assert_eq!(progress.document_id, "b1");
        assert_eq!(progress.page, 5);
        assert_eq!(progress.total_pages, 9);
    }
}
