//! crates/biblio_core/src/locator.rs
//!
//! Turns opaque share links into a canonical file identifier plus the access
//! URLs derived from it.
//!
//! Matching is an ordered list of matchers; the first one that captures an
//! identifier wins. Malformed input is an expected case and yields an invalid
//! locator rather than an error.

use crate::domain::{LocatorKind, ResourceLocator};
use crate::ports::ReachabilityService;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, warn};

pub const DEFAULT_FILE_HOST_BASE_URL: &str = "https://drive.google.com";

/// Minimum length for a bare string to be accepted as an identifier.
///
/// A heuristic: shorter strings are too likely to be unrelated tokens.
pub const DEFAULT_MIN_BARE_ID_LEN: usize = 25;

const DOCUMENTS_HOST: &str = "docs.google.com";

static RE_FILE_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"/d/([A-Za-z0-9_-]+)").unwrap());
static RE_FOLDER_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/folders/([A-Za-z0-9_-]+)").unwrap());
static RE_QUERY_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"[?&]id=([A-Za-z0-9_-]+)").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorConfig {
    /// Scheme and host the derived URLs are built on, without a trailing slash.
    pub base_url: String,
    pub min_bare_id_len: usize,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_FILE_HOST_BASE_URL.to_string(),
            min_bare_id_len: DEFAULT_MIN_BARE_ID_LEN,
        }
    }
}

/// One positional pattern. Listed in precedence order in [`MATCHERS`].
#[derive(Debug, Clone, Copy)]
enum Matcher {
    FilePath,
    FolderPath,
    QueryParam,
    Bare,
}

const MATCHERS: [Matcher; 4] = [
    Matcher::FilePath,
    Matcher::FolderPath,
    Matcher::QueryParam,
    Matcher::Bare,
];

impl Matcher {
    fn kind(self) -> LocatorKind {
        match self {
            Matcher::FilePath => LocatorKind::File,
            Matcher::FolderPath => LocatorKind::Folder,
            Matcher::QueryParam => LocatorKind::Query,
            Matcher::Bare => LocatorKind::Bare,
        }
    }

    fn capture(self, reference: &str, min_bare_id_len: usize) -> Option<String> {
        let regex = match self {
            Matcher::FilePath => &*RE_FILE_PATH,
            Matcher::FolderPath => &*RE_FOLDER_PATH,
            Matcher::QueryParam => &*RE_QUERY_ID,
            Matcher::Bare => {
                return is_bare_identifier(reference, min_bare_id_len)
                    .then(|| reference.to_string());
            }
        };
        regex
            .captures(reference)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

fn is_bare_identifier(reference: &str, min_len: usize) -> bool {
    reference.len() >= min_len
        && reference
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Parses share links for the configured file host.
///
/// Parsing itself is pure; only [`LocatorParser::check_reachable`] touches the
/// network, through the injected [`ReachabilityService`].
#[derive(Clone)]
pub struct LocatorParser {
    config: LocatorConfig,
    probe: Option<Arc<dyn ReachabilityService>>,
}

impl LocatorParser {
    pub fn new(config: LocatorConfig) -> Self {
        Self {
            config,
            probe: None,
        }
    }

    pub fn with_probe(mut self, probe: Arc<dyn ReachabilityService>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn config(&self) -> &LocatorConfig {
        &self.config
    }

    /// Parses a raw reference. Never fails: unrecognised input gives `valid == false`.
    pub fn parse(&self, raw_reference: &str) -> ResourceLocator {
        let reference = raw_reference.trim();

        let found = MATCHERS.iter().find_map(|matcher| {
            matcher
                .capture(reference, self.config.min_bare_id_len)
                .map(|id| (matcher.kind(), id))
        });

        match found {
            Some((kind, id)) => ResourceLocator {
                raw_reference: raw_reference.to_string(),
                preview_url: Some(self.preview_url(&id)),
                download_url: Some(self.download_url(&id)),
                view_url: Some(self.view_url(&id)),
                canonical_id: Some(id),
                kind: Some(kind),
                valid: true,
            },
            None => {
                debug!("No identifier found in reference {:?}", raw_reference);
                ResourceLocator::invalid(raw_reference)
            }
        }
    }

    pub fn preview_url(&self, canonical_id: &str) -> String {
        format!("{}/file/d/{}/preview", self.config.base_url, canonical_id)
    }

    pub fn download_url(&self, canonical_id: &str) -> String {
        format!(
            "{}/uc?id={}&export=download",
            self.config.base_url, canonical_id
        )
    }

    pub fn view_url(&self, canonical_id: &str) -> String {
        format!("{}/file/d/{}/view", self.config.base_url, canonical_id)
    }

    /// Whether `url` points at the file host or the documents host.
    pub fn is_remote_file_url(&self, url: &str) -> bool {
        let host = self
            .config
            .base_url
            .split("://")
            .nth(1)
            .unwrap_or(&self.config.base_url);
        !url.is_empty() && (url.contains(host) || url.contains(DOCUMENTS_HOST))
    }

    /// Extracts a folder identifier; only the folder-path form is recognised.
    pub fn extract_folder_id(&self, url: &str) -> Option<String> {
        Matcher::FolderPath.capture(url.trim(), self.config.min_bare_id_len)
    }

    /// Probes the preview URL once. A positive answer does not guarantee the
    /// file will render later. Every failure, including a missing probe, is `false`.
    pub async fn check_reachable(&self, canonical_id: &str) -> bool {
        let Some(probe) = &self.probe else {
            warn!("No reachability probe configured; reporting {} unreachable", canonical_id);
            return false;
        };

        let url = self.preview_url(canonical_id);
        match probe.probe(&url).await {
            Ok(reachable) => reachable,
            Err(e) => {
                warn!("Reachability probe for {} failed: {}", canonical_id, e);
                false
            }
        }
    }
}

impl Default for LocatorParser {
    fn default() -> Self {
        Self::new(LocatorConfig::default())
    }
}
