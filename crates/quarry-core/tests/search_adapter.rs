use std::sync::Arc;

use proptest::prelude::*;
use tempfile::TempDir;

use quarry_core::error::FailureKind;
use quarry_core::search::{SearchOutcome, PREVIEW_CHARS};
use quarry_core::{CollectionRegistry, MemoryIndex, SearchAdapter};

const COLLECTIONS: &str = r#"{
    "vehicle_issues": {
        "search_fields": ["model^2", "system", "problem"],
        "source_fields": ["model", "system", "problem", "cause", "remedy"],
        "display_name": "Vehicle issues",
        "description": "Known defects",
        "result_format": {
            "type": "vehicle",
            "title_fields": ["model", "system"],
            "content_fields": {"Problem": "problem", "Cause": "cause", "Remedy": "remedy"}
        }
    },
    "documents": {
        "search_fields": ["title", "content"],
        "source_fields": ["title", "content", "url"],
        "display_name": "Manuals",
        "description": "Service manuals",
        "result_format": {"type": "document", "title_field": "title", "content_field": "content", "url_field": "url"}
    }
}"#;

fn index_json() -> String {
    let long_body = "브레이크 패드 점검 ".repeat(60);
    serde_json::json!({
        "vehicle_issues": [
            {"model": "K5", "system": "브레이크", "problem": "브레이크 소음", "cause": "패드 마모", "remedy": "패드 교체"},
            {"model": "K5", "system": "엔진", "problem": "엔진 떨림", "cause": "점화 플러그"},
            {"model": "K8", "system": "브레이크", "problem": "제동 밀림", "cause": "오일 누유", "remedy": "오일 보충"},
            {"model": "Sorento", "system": "브레이크", "problem": "브레이크 경고등", "cause": "센서"}
        ],
        "documents": [
            {"title": "Brake service", "content": long_body, "url": "https://manuals/brake"},
            {"title": "Engine service", "content": "Spark plugs", "url": ""}
        ],
        ".internal": []
    })
    .to_string()
}

fn adapter_from_disk() -> (TempDir, SearchAdapter) {
    let dir = TempDir::new().unwrap();
    let collections_path = dir.path().join("collections.json");
    let index_path = dir.path().join("index.json");
    std::fs::write(&collections_path, COLLECTIONS).unwrap();
    std::fs::write(&index_path, index_json()).unwrap();

    let registry = CollectionRegistry::load(&collections_path);
    let index = MemoryIndex::from_json_file(&index_path).unwrap();
    let adapter = SearchAdapter::new(Arc::new(index), Arc::new(registry), "vehicle_issues");
    (dir, adapter)
}

#[tokio::test]
async fn test_registry_and_index_from_files() {
    let (_dir, adapter) = adapter_from_disk();
    assert_eq!(adapter.registry().list(), vec!["vehicle_issues", "documents"]);

    let outcome = adapter.search("K5 브레이크", None, 3).await.unwrap();
    let hits = outcome.hits();
    assert!(!hits.is_empty() && hits.len() <= 3);
    assert_eq!(hits[0].title, "K5 - 브레이크");
    assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
}

#[tokio::test]
async fn test_missing_remedy_renders_placeholder() {
    let (_dir, adapter) = adapter_from_disk();
    let text = adapter.search("엔진 떨림", None, 1).await.unwrap().to_string();
    assert!(text.contains("K5 - 엔진"));
    assert!(text.contains("Remedy: N/A"));
}

#[tokio::test]
async fn test_document_preview_truncated() {
    let (_dir, adapter) = adapter_from_disk();
    let outcome = adapter
        .search("brake", Some("documents"), 5)
        .await
        .unwrap();
    let first = &outcome.hits()[0];
    assert_eq!(first.content.chars().count(), PREVIEW_CHARS + 3);
    assert!(first.content.ends_with("..."));
    assert_eq!(first.url.as_deref(), Some("https://manuals/brake"));
}

#[tokio::test]
async fn test_empty_url_is_omitted() {
    let (_dir, adapter) = adapter_from_disk();
    let text = adapter
        .search("engine", Some("documents"), 5)
        .await
        .unwrap()
        .to_string();
    assert!(text.contains("[1] Engine service"));
    assert!(!text.contains("URL:"));
}

#[tokio::test]
async fn test_missing_registry_file_means_configuration_errors() {
    let dir = TempDir::new().unwrap();
    let registry = CollectionRegistry::load(&dir.path().join("absent.json"));
    assert!(registry.is_empty());

    let index = MemoryIndex::from_json(&index_json()).unwrap();
    let adapter = SearchAdapter::new(Arc::new(index), Arc::new(registry), "documents");
    let err = adapter.search("brake", None, 5).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::ConfigurationError);
    assert!(err.to_tool_text().contains("(none configured)"));
}

#[tokio::test]
async fn test_listing_skips_system_collections() {
    let (_dir, adapter) = adapter_from_disk();
    let listing = adapter.list_collections().await.unwrap();
    assert_eq!(listing.names, vec!["documents", "vehicle_issues"]);
}

#[tokio::test]
async fn test_no_results_value() {
    let (_dir, adapter) = adapter_from_disk();
    let outcome = adapter.search("transmission", None, 5).await.unwrap();
    assert!(matches!(
        outcome,
        SearchOutcome::NoResults { ref collection, .. } if collection == "vehicle_issues"
    ));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_limit_caps_ranked_hits(limit in 1usize..6, query in prop::sample::select(vec![
        "K5", "브레이크", "K5 브레이크", "엔진", "Sorento 센서", "K8 오일",
    ])) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let (_dir, adapter) = adapter_from_disk();

        let first = rt.block_on(adapter.search(query, None, limit)).unwrap();
        let second = rt.block_on(adapter.search(query, None, limit)).unwrap();

        let hits = first.hits();
        prop_assert!(hits.len() <= limit);
        prop_assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
        prop_assert!(hits.iter().enumerate().all(|(i, h)| h.rank == i + 1));
        prop_assert_eq!(first, second);
    }
}
