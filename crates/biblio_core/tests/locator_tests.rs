mod common;

use biblio_core::{LocatorConfig, LocatorKind, LocatorParser};
use common::ScriptedProbe;
use std::sync::Arc;

#[test]
fn file_path_reference_yields_captured_id() {
    let parser = LocatorParser::default();
    let locator = parser.parse("https://host/file/d/ABC123XYZ/view");

    assert!(locator.valid);
    assert_eq!(locator.canonical_id.as_deref(), Some("ABC123XYZ"));
    assert_eq!(locator.kind, Some(LocatorKind::File));
    assert!(locator
        .preview_url
        .as_deref()
        .unwrap()
        .ends_with("/ABC123XYZ/preview"));
    assert_eq!(
        locator.download_url.as_deref(),
        Some("https://drive.google.com/uc?id=ABC123XYZ&export=download")
    );
    assert_eq!(
        locator.view_url.as_deref(),
        Some("https://drive.google.com/file/d/ABC123XYZ/view")
    );
    assert_eq!(locator.render_url(), locator.preview_url.as_deref());
}

#[test]
fn common_share_link_shapes_are_recognised() {
    let parser = LocatorParser::default();
    let cases = [
        ("https://drive.google.com/file/d/1a2B3c_-Z/view?usp=sharing", "1a2B3c_-Z"),
        ("  https://docs.google.com/document/d/doc-42/edit  ", "doc-42"),
        ("https://drive.google.com/drive/folders/fold_99", "fold_99"),
        ("https://drive.google.com/open?id=open-7", "open-7"),
        ("https://drive.google.com/uc?export=download&id=dl_8", "dl_8"),
        ("0B62YiQW9g0Z2fmhiSFhGc0JrcmpEV2VJUzFCOG5IQldNVldk", "0B62YiQW9g0Z2fmhiSFhGc0JrcmpEV2VJUzFCOG5IQldNVldk"),
    ];

    for (reference, expected) in cases {
        let locator = parser.parse(reference);
        assert!(locator.valid, "{} should be valid", reference);
        assert_eq!(locator.canonical_id.as_deref(), Some(expected), "{}", reference);
    }
}

#[test]
fn short_unmatched_references_are_invalid() {
    let parser = LocatorParser::default();
    for reference in ["not-a-url", "", "   ", "hello world", "abc123", "https://example.com/book.pdf"] {
        let locator = parser.parse(reference);
        assert!(!locator.valid, "{:?} should be invalid", reference);
        assert!(locator.canonical_id.is_none());
        assert!(locator.kind.is_none());
        assert!(locator.preview_url.is_none());
        assert!(locator.download_url.is_none());
        assert!(locator.view_url.is_none());
        assert_eq!(locator.raw_reference, reference);
    }
}

#[test]
fn bare_identifier_boundary_is_inclusive() {
    let parser = LocatorParser::default();
    let at_threshold = "a".repeat(25);
    let below = "a".repeat(24);

    assert_eq!(parser.parse(&at_threshold).kind, Some(LocatorKind::Bare));
    assert!(!parser.parse(&below).valid);
}

#[test]
fn parsing_is_idempotent() {
    let parser = LocatorParser::default();
    for reference in [
        "https://host/file/d/ABC123XYZ/view",
        "not-a-url",
        "https://drive.google.com/open?id=open-7",
    ] {
        assert_eq!(parser.parse(reference), parser.parse(reference));
    }
}

#[test]
fn derived_urls_follow_configured_host() {
    let parser = LocatorParser::new(LocatorConfig {
        base_url: "http://files.local".to_string(),
        ..LocatorConfig::default()
    });
    let locator = parser.parse("/file/d/XYZ/view");
    assert_eq!(
        locator.preview_url.as_deref(),
        Some("http://files.local/file/d/XYZ/preview")
    );
    assert!(parser.is_remote_file_url("http://files.local/file/d/XYZ/view"));
}

#[tokio::test]
async fn reachability_uses_preview_url() {
    let probe = Arc::new(ScriptedProbe::answering(true));
    let parser = LocatorParser::default().with_probe(probe.clone());

    assert!(parser.check_reachable("ABC").await);
    assert_eq!(
        *probe.seen.lock().unwrap(),
        vec!["https://drive.google.com/file/d/ABC/preview".to_string()]
    );
}

#[tokio::test]
async fn reachability_failures_map_to_false() {
    let erroring = LocatorParser::default().with_probe(Arc::new(ScriptedProbe::erroring()));
    assert!(!erroring.check_reachable("ABC").await);

    let negative = LocatorParser::default().with_probe(Arc::new(ScriptedProbe::answering(false)));
    assert!(!negative.check_reachable("ABC").await);

    let unprobed = LocatorParser::default();
    assert!(!unprobed.check_reachable("ABC").await);
}
