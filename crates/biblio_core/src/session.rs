//! crates/biblio_core/src/session.rs
//!
//! The state of one open document on the reading surface: current page, zoom,
//! highlight mode and the annotation list. Page changes are persisted through
//! the [`ProgressStore`] without waiting for the remote backend.

use crate::domain::{clamp_page, Annotation};
use crate::progress::ProgressStore;
use tracing::{debug, info};

pub const MIN_ZOOM: f32 = 0.5;
pub const MAX_ZOOM: f32 = 2.0;

pub struct ReadingSession {
    store: ProgressStore,
    document_id: String,
    current_page: u32,
    total_pages: u32,
    zoom: f32,
    highlight_mode: bool,
    annotations: Vec<Annotation>,
}

impl ReadingSession {
    /// Opens a document, restoring the saved page and the annotations.
    pub async fn open(store: ProgressStore, document_id: &str, total_pages: u32) -> Self {
        let saved_page = store.get_page(document_id).await;
        let annotations = store.get_annotations(document_id).await;
        let current_page = clamp_page(saved_page, total_pages);
        info!(
            "Opened {} at page {}/{} with {} annotations",
            document_id,
            current_page,
            total_pages,
            annotations.len()
        );

        Self {
            store,
            document_id: document_id.to_string(),
            current_page,
            total_pages,
            zoom: 1.0,
            highlight_mode: false,
            annotations,
        }
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn highlight_mode(&self) -> bool {
        self.highlight_mode
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Returns `false` when already on the last page, or while the page count
    /// is still unknown.
    pub fn next_page(&mut self) -> bool {
        if self.current_page >= self.total_pages {
            return false;
        }
        self.go_to_page(self.current_page + 1);
        true
    }

    /// Returns `false` when already on the first page.
    pub fn prev_page(&mut self) -> bool {
        if self.current_page <= 1 {
            return false;
        }
        self.go_to_page(self.current_page - 1);
        true
    }

    /// Moves to `page`, clamped to the document, and returns the page landed on.
    pub fn go_to_page(&mut self, page: u32) -> u32 {
        let page = clamp_page(page, self.total_pages);
        if page != self.current_page {
            self.current_page = page;
            self.persist();
        }
        self.current_page
    }

    /// Applies the position the renderer reports after drawing a page.
    pub fn sync_from_renderer(&mut self, page: u32, total_pages: u32) {
        let page = clamp_page(page, total_pages);
        if page == self.current_page && total_pages == self.total_pages {
            return;
        }
        self.total_pages = total_pages;
        self.current_page = page;
        self.persist();
    }

    /// Changes zoom by `delta`, kept within [`MIN_ZOOM`, `MAX_ZOOM`].
    pub fn adjust_zoom(&mut self, delta: f32) -> f32 {
        let zoom = (self.zoom + delta).clamp(MIN_ZOOM, MAX_ZOOM);
        // Only absorb float noise; the delta itself is kept as given.
        self.zoom = (zoom * 10_000.0).round() / 10_000.0;
        self.zoom
    }

    pub fn toggle_highlight(&mut self) -> bool {
        self.highlight_mode = !self.highlight_mode;
        self.highlight_mode
    }

    /// Attaches a note to `quoted_text` on the current page.
    ///
    /// Blank notes are ignored and return `None`.
    pub async fn add_note(&mut self, quoted_text: &str, note_text: &str) -> Option<&Annotation> {
        if note_text.trim().is_empty() {
            debug!("Ignoring empty note for {}", self.document_id);
            return None;
        }

        let annotation = Annotation::new(
            &self.document_id,
            self.current_page,
            quoted_text,
            note_text,
        );
        self.store
            .add_annotation(&self.document_id, annotation.clone())
            .await;
        self.annotations.push(annotation);
        self.annotations.last()
    }

    fn persist(&self) {
        self.store
            .set_page_detached(&self.document_id, self.current_page, self.total_pages);
    }
}
