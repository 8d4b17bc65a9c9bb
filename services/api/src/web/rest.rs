//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::middleware::UserIdentity;
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use biblio_core::domain::{Annotation, BookMetadata, CatalogEntry, LocatorKind, ResourceLocator};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        parse_locator_handler,
        reachability_handler,
        create_catalog_entry_handler,
        get_progress_handler,
        update_progress_handler,
        list_annotations_handler,
        add_annotation_handler,
        list_favorites_handler,
        add_favorite_handler,
        remove_favorite_handler,
    ),
    components(
        schemas(
            ParseLocatorRequest,
            LocatorKindResponse,
            LocatorResponse,
            ReachabilityResponse,
            CreateCatalogEntryRequest,
            MetadataPayload,
            CatalogEntryResponse,
            ProgressResponse,
            UpdateProgressRequest,
            AnnotationPayload,
            AnnotationResponse,
            FavoritesResponse,
        )
    ),
    tags(
        (name = "Digital Library API", description = "Share-link parsing, catalog entries, reading progress, annotations and favorites.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct ParseLocatorRequest {
    pub reference: String,
}

/// Which link shape the identifier was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LocatorKindResponse {
    File,
    Folder,
    Query,
    Bare,
}

impl From<LocatorKind> for LocatorKindResponse {
    fn from(kind: LocatorKind) -> Self {
        match kind {
            LocatorKind::File => Self::File,
            LocatorKind::Folder => Self::Folder,
            LocatorKind::Query => Self::Query,
            LocatorKind::Bare => Self::Bare,
        }
    }
}

/// A parsed share link. Every URL is `null` when `valid` is false.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct LocatorResponse {
    pub raw_reference: String,
    pub canonical_id: Option<String>,
    pub kind: Option<LocatorKindResponse>,
    pub preview_url: Option<String>,
    pub download_url: Option<String>,
    pub view_url: Option<String>,
    pub valid: bool,
}

impl From<ResourceLocator> for LocatorResponse {
    fn from(locator: ResourceLocator) -> Self {
        Self {
            raw_reference: locator.raw_reference,
            canonical_id: locator.canonical_id,
            kind: locator.kind.map(LocatorKindResponse::from),
            preview_url: locator.preview_url,
            download_url: locator.download_url,
            view_url: locator.view_url,
            valid: locator.valid,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ReachabilityResponse {
    pub canonical_id: String,
    pub reachable: bool,
}

#[derive(Deserialize, Default, ToSchema)]
pub struct MetadataPayload {
    pub title: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub pages: Option<u32>,
    pub year: Option<i32>,
    pub cover_url: Option<String>,
}

impl From<MetadataPayload> for BookMetadata {
    fn from(p: MetadataPayload) -> Self {
        Self {
            title: p.title,
            author: p.author,
            category: p.category,
            description: p.description,
            pages: p.pages,
            year: p.year,
            cover_url: p.cover_url,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct CreateCatalogEntryRequest {
    pub reference: String,
    #[serde(default)]
    pub metadata: Option<MetadataPayload>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct CatalogEntryResponse {
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

impl From<CatalogEntry> for CatalogEntryResponse {
    fn from(e: CatalogEntry) -> Self {
        Self {
            id: e.id,
            title: e.title,
            author: e.author,
            category: e.category,
            description: e.description,
            pages: e.pages,
            year: e.year,
            cover_url: e.cover_url,
            file_id: e.file_id,
            view_url: e.view_url,
            preview_url: e.preview_url,
            download_url: e.download_url,
            is_remote_file: e.is_remote_file,
            has_pdf: e.has_pdf,
            uploaded_by: e.uploaded_by,
            created_at: e.created_at,
        }
    }
}

/// The saved position in a document. `page` is 1 when nothing was saved.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ProgressResponse {
    pub document_id: String,
    pub page: u32,
    pub total_pages: Option<u32>,
    pub last_read: Option<DateTime<Utc>>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateProgressRequest {
    pub page: u32,
    #[serde(default)]
    pub total_pages: u32,
}

#[derive(Deserialize, ToSchema)]
pub struct AnnotationPayload {
    pub page: u32,
    #[serde(default)]
    pub quoted_text: String,
    pub note_text: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct AnnotationResponse {
    pub document_id: String,
    pub page: u32,
    pub quoted_text: String,
    pub note_text: String,
    pub created_at: DateTime<Utc>,
}

/// The user's favorite documents, oldest first.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct FavoritesResponse {
    pub document_ids: Vec<String>,
}

impl From<Annotation> for AnnotationResponse {
    fn from(a: Annotation) -> Self {
        Self {
            document_id: a.document_id,
            page: a.page,
            quoted_text: a.quoted_text,
            note_text: a.note_text,
            created_at: a.created_at,
        }
    }
}

//=========================================================================================
// Locator Handlers
//=========================================================================================

/// Parse a share link into its canonical identifier and access URLs.
///
/// Unrecognised input is not an error: the response has `valid = false`.
#[utoipa::path(
    post,
    path = "/locators/parse",
    request_body = ParseLocatorRequest,
    responses(
        (status = 200, description = "Reference parsed", body = LocatorResponse),
        (status = 401, description = "Missing user identity")
    )
)]
pub async fn parse_locator_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<ParseLocatorRequest>,
) -> Json<LocatorResponse> {
    Json(app_state.locator.parse(&req.reference).into())
}

/// Probe whether the file behind a canonical identifier answers.
#[utoipa::path(
    get,
    path = "/locators/{canonical_id}/reachable",
    params(
        ("canonical_id" = String, Path, description = "The canonical file identifier.")
    ),
    responses(
        (status = 200, description = "Probe finished", body = ReachabilityResponse),
        (status = 401, description = "Missing user identity")
    )
)]
pub async fn reachability_handler(
    State(app_state): State<Arc<AppState>>,
    Path(canonical_id): Path<String>,
) -> Json<ReachabilityResponse> {
    let reachable = app_state.locator.check_reachable(&canonical_id).await;
    Json(ReachabilityResponse {
        canonical_id,
        reachable,
    })
}

//=========================================================================================
// Catalog Handlers
//=========================================================================================

/// Create a catalog entry for the file behind a share link.
#[utoipa::path(
    post,
    path = "/catalog/entries",
    request_body = CreateCatalogEntryRequest,
    responses(
        (status = 201, description = "Entry created", body = CatalogEntryResponse),
        (status = 400, description = "The reference does not identify a file"),
        (status = 401, description = "Missing user identity")
    ),
    params(
        ("x-user-id" = String, Header, description = "The resolved user identity.")
    )
)]
pub async fn create_catalog_entry_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(UserIdentity(user_id)): Extension<UserIdentity>,
    Json(req): Json<CreateCatalogEntryRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let metadata = req.metadata.unwrap_or_default().into();
    let entry = CatalogEntry::from_reference(&app_state.locator, &req.reference, metadata, &user_id)
        .map_err(|e| {
            warn!("Rejected catalog entry for {}: {}", user_id, e);
            (StatusCode::BAD_REQUEST, e.to_string())
        })?;

    info!("Catalog entry {} created by {}", entry.id, user_id);
    Ok((StatusCode::CREATED, Json(CatalogEntryResponse::from(entry))))
}

//=========================================================================================
// Progress Handlers
//=========================================================================================

/// Get the last saved page of a document.
#[utoipa::path(
    get,
    path = "/progress/{document_id}",
    params(
        ("document_id" = String, Path, description = "The document identifier."),
        ("x-user-id" = String, Header, description = "The resolved user identity.")
    ),
    responses(
        (status = 200, description = "Saved position (page 1 when none)", body = ProgressResponse),
        (status = 401, description = "Missing user identity")
    )
)]
pub async fn get_progress_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(UserIdentity(user_id)): Extension<UserIdentity>,
    Path(document_id): Path<String>,
) -> Json<ProgressResponse> {
    let store = app_state.progress_for(&user_id);
    let response = match store.get_progress(&document_id).await {
        Some(progress) => ProgressResponse {
            document_id,
            page: progress.page,
            total_pages: Some(progress.total_pages),
            last_read: Some(progress.last_read_timestamp),
        },
        None => ProgressResponse {
            document_id,
            page: 1,
            total_pages: None,
            last_read: None,
        },
    };
    Json(response)
}

/// Save the current page of a document.
///
/// The local copy is written before the response; the remote write finishes
/// in the background.
#[utoipa::path(
    put,
    path = "/progress/{document_id}",
    request_body = UpdateProgressRequest,
    params(
        ("document_id" = String, Path, description = "The document identifier."),
        ("x-user-id" = String, Header, description = "The resolved user identity.")
    ),
    responses(
        (status = 202, description = "Progress accepted"),
        (status = 401, description = "Missing user identity")
    )
)]
pub async fn update_progress_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(UserIdentity(user_id)): Extension<UserIdentity>,
    Path(document_id): Path<String>,
    Json(req): Json<UpdateProgressRequest>,
) -> StatusCode {
    app_state
        .progress_for(&user_id)
        .set_page_detached(&document_id, req.page, req.total_pages);
    StatusCode::ACCEPTED
}

//=========================================================================================
// Annotation Handlers
//=========================================================================================

/// List the annotations of a document in the order they were added.
#[utoipa::path(
    get,
    path = "/annotations/{document_id}",
    params(
        ("document_id" = String, Path, description = "The document identifier."),
        ("x-user-id" = String, Header, description = "The resolved user identity.")
    ),
    responses(
        (status = 200, description = "Annotations, possibly empty", body = [AnnotationResponse]),
        (status = 401, description = "Missing user identity")
    )
)]
pub async fn list_annotations_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(UserIdentity(user_id)): Extension<UserIdentity>,
    Path(document_id): Path<String>,
) -> Json<Vec<AnnotationResponse>> {
    let annotations = app_state
        .progress_for(&user_id)
        .get_annotations(&document_id)
        .await;
    Json(annotations.into_iter().map(AnnotationResponse::from).collect())
}

/// Attach a note to a piece of quoted text.
#[utoipa::path(
    post,
    path = "/annotations/{document_id}",
    request_body = AnnotationPayload,
    params(
        ("document_id" = String, Path, description = "The document identifier."),
        ("x-user-id" = String, Header, description = "The resolved user identity.")
    ),
    responses(
        (status = 201, description = "Annotation stored", body = AnnotationResponse),
        (status = 400, description = "The note text is empty"),
        (status = 401, description = "Missing user identity")
    )
)]
pub async fn add_annotation_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(UserIdentity(user_id)): Extension<UserIdentity>,
    Path(document_id): Path<String>,
    Json(req): Json<AnnotationPayload>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if req.note_text.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "note_text must not be empty".to_string(),
        ));
    }

    let annotation = Annotation::new(&document_id, req.page, &req.quoted_text, &req.note_text);
    app_state
        .progress_for(&user_id)
        .add_annotation(&document_id, annotation.clone())
        .await;

    Ok((
        StatusCode::CREATED,
        Json(AnnotationResponse::from(annotation)),
    ))
}

//=========================================================================================
// Favorite Handlers
//=========================================================================================

/// List the user's favorite documents.
#[utoipa::path(
    get,
    path = "/favorites",
    params(
        ("x-user-id" = String, Header, description = "The resolved user identity.")
    ),
    responses(
        (status = 200, description = "Favorites, possibly empty", body = FavoritesResponse),
        (status = 401, description = "Missing user identity")
    )
)]
pub async fn list_favorites_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(UserIdentity(user_id)): Extension<UserIdentity>,
) -> Json<FavoritesResponse> {
    let document_ids = app_state.progress_for(&user_id).get_favorites().await;
    Json(FavoritesResponse { document_ids })
}

/// Mark a document as favorite.
#[utoipa::path(
    put,
    path = "/favorites/{document_id}",
    params(
        ("document_id" = String, Path, description = "The document identifier."),
        ("x-user-id" = String, Header, description = "The resolved user identity.")
    ),
    responses(
        (status = 201, description = "Added to favorites", body = FavoritesResponse),
        (status = 200, description = "Already a favorite", body = FavoritesResponse),
        (status = 401, description = "Missing user identity")
    )
)]
pub async fn add_favorite_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(UserIdentity(user_id)): Extension<UserIdentity>,
    Path(document_id): Path<String>,
) -> impl IntoResponse {
    let store = app_state.progress_for(&user_id);
    let status = if store.add_favorite(&document_id).await {
        info!("{} added {} to favorites", user_id, document_id);
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    let document_ids = store.get_favorites().await;
    (status, Json(FavoritesResponse { document_ids }))
}

/// Remove a document from the favorites.
#[utoipa::path(
    delete,
    path = "/favorites/{document_id}",
    params(
        ("document_id" = String, Path, description = "The document identifier."),
        ("x-user-id" = String, Header, description = "The resolved user identity.")
    ),
    responses(
        (status = 204, description = "Removed from favorites"),
        (status = 404, description = "The document was not a favorite"),
        (status = 401, description = "Missing user identity")
    )
)]
pub async fn remove_favorite_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(UserIdentity(user_id)): Extension<UserIdentity>,
    Path(document_id): Path<String>,
) -> StatusCode {
    if app_state
        .progress_for(&user_id)
        .remove_favorite(&document_id)
        .await
    {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
