//! Search adapter behind the agent's `search` tool
//!
//! Resolves the target collection, checks it against the index and the
//! collection registry, runs a fuzzy best-field query and renders the hits.
//! Every failure is returned as a typed value with a human-readable message;
//! nothing here panics or bubbles an error up into the reasoning loop.

use super::render::{render_hit, RenderedHit};
use super::{FullTextQuery, SearchFailure, SearchIndex};
use crate::config::CollectionRegistry;
use crate::error::FailureKind;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Prefix every failure text starts with
pub const FAILURE_MARKER: &str = "Error:";

/// Elasticsearch's default `index.max_result_window`
pub const MAX_RESULT_WINDOW: usize = 10_000;

/// Typed failure of a search or listing request
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AdapterError {
    #[error("collection '{collection}' does not exist in the index")]
    CollectionNotFound { collection: String },

    #[error(
        "no search configuration found for collection '{collection}'. Available collections: {}",
        format_available(.available)
    )]
    ConfigurationMissing {
        collection: String,
        available: Vec<String>,
    },

    #[error("collection '{collection}' has no searchable fields configured")]
    NoSearchableFields { collection: String },

    #[error("could not connect to the search index; check that it is running ({0})")]
    Connectivity(String),

    #[error("the search index did not respond in time ({0})")]
    Timeout(String),

    #[error("authentication with the search index failed; check the username and password ({0})")]
    Authentication(String),

    #[error("collection '{0}' could not be found; check the available collections")]
    IndexNotFound(String),

    #[error("no collections are available in the index")]
    NoCollections,

    #[error("search failed: {0}")]
    Generic(String),
}

fn format_available(available: &[String]) -> String {
    if available.is_empty() {
        "(none configured)".to_string()
    } else {
        available.join(", ")
    }
}

impl AdapterError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::CollectionNotFound { .. } | Self::IndexNotFound(_) | Self::NoCollections => {
                FailureKind::NotFound
            }
            Self::ConfigurationMissing { .. } => FailureKind::ConfigurationError,
            Self::NoSearchableFields { .. } => FailureKind::NoSearchableFields,
            Self::Connectivity(_) => FailureKind::ConnectivityFailure,
            Self::Timeout(_) => FailureKind::Timeout,
            Self::Authentication(_) => FailureKind::AuthFailure,
            Self::Generic(_) => FailureKind::GenericFailure,
        }
    }

    /// The text handed back to the reasoning stage
    pub fn to_tool_text(&self) -> String {
        format!("{} {}", FAILURE_MARKER, self)
    }
}

impl From<SearchFailure> for AdapterError {
    fn from(failure: SearchFailure) -> Self {
        match failure {
            SearchFailure::Connection(msg) => Self::Connectivity(msg),
            SearchFailure::Timeout(msg) => Self::Timeout(msg),
            SearchFailure::Authentication(msg) => Self::Authentication(msg),
            SearchFailure::IndexNotFound(index) => Self::IndexNotFound(index),
            other => Self::Generic(other.to_string()),
        }
    }
}

/// Successful search result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchOutcome {
    Found(SearchReport),
    /// Zero hits; a success, so the caller can still answer
    NoResults { query: String, collection: String },
}

impl SearchOutcome {
    pub fn hits(&self) -> &[RenderedHit] {
        match self {
            Self::Found(report) => &report.hits,
            Self::NoResults { .. } => &[],
        }
    }
}

impl fmt::Display for SearchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Found(report) => report.fmt(f),
            Self::NoResults { query, collection } => write!(
                f,
                "No results found for '{}' in '{}'.",
                query, collection
            ),
        }
    }
}

/// Rendered hits for one query, best first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchReport {
    pub collection: String,
    pub query: String,
    /// Total matches in the collection
    pub total: u64,
    pub hits: Vec<RenderedHit>,
}

impl fmt::Display for SearchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Search results ({}) from '{}', {} total matches:",
            self.hits.len(),
            self.collection,
            self.total
        )?;
        for hit in &self.hits {
            writeln!(f)?;
            hit.fmt(f)?;
        }
        Ok(())
    }
}

/// Collection names known to the index, system collections excluded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionListing {
    pub names: Vec<String>,
}

impl fmt::Display for CollectionListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Available collections:")?;
        writeln!(f)?;
        for name in &self.names {
            writeln!(f, "  - {}", name)?;
        }
        Ok(())
    }
}

/// Maps free-text search requests onto configured collections
pub struct SearchAdapter {
    index: Arc<dyn SearchIndex>,
    registry: Arc<CollectionRegistry>,
    default_collection: String,
}

impl SearchAdapter {
    pub fn new(
        index: Arc<dyn SearchIndex>,
        registry: Arc<CollectionRegistry>,
        default_collection: impl Into<String>,
    ) -> Self {
        Self {
            index,
            registry,
            default_collection: default_collection.into(),
        }
    }

    pub fn default_collection(&self) -> &str {
        &self.default_collection
    }

    pub fn registry(&self) -> &CollectionRegistry {
        &self.registry
    }

    pub fn index(&self) -> &Arc<dyn SearchIndex> {
        &self.index
    }

    /// The collection a request actually targets
    pub fn resolve_collection<'a>(&'a self, collection: Option<&'a str>) -> &'a str {
        match collection.map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => &self.default_collection,
        }
    }

    /// Search one collection and render the hits
    pub async fn search(
        &self,
        query: &str,
        collection: Option<&str>,
        limit: usize,
    ) -> Result<SearchOutcome, AdapterError> {
        let start = Instant::now();
        if collection.map_or(true, |c| c.trim().is_empty()) {
            tracing::info!("Using default collection: {}", self.default_collection);
        }
        let collection = self.resolve_collection(collection);

        tracing::info!(
            "Search started - query: '{}', collection: {}, max results: {}",
            query,
            collection,
            limit
        );

        let result = self
            .run_search(query, collection, limit.clamp(1, MAX_RESULT_WINDOW))
            .await;
        let elapsed = start.elapsed().as_secs_f64();

        match &result {
            Ok(outcome) => tracing::info!(
                "Search completed in {:.3}s with {} results",
                elapsed,
                outcome.hits().len()
            ),
            Err(e) => tracing::error!("Search failed after {:.3}s - {}", elapsed, e),
        }

        result
    }

    async fn run_search(
        &self,
        query: &str,
        collection: &str,
        limit: usize,
    ) -> Result<SearchOutcome, AdapterError> {
        if !self.index.collection_exists(collection).await? {
            tracing::warn!("Collection '{}' does not exist", collection);
            return Err(AdapterError::CollectionNotFound {
                collection: collection.to_string(),
            });
        }

        let config = self.registry.get(collection).ok_or_else(|| {
            tracing::error!("No configuration found for collection '{}'", collection);
            AdapterError::ConfigurationMissing {
                collection: collection.to_string(),
                available: self.registry.list().into_iter().map(String::from).collect(),
            }
        })?;

        if !config.is_searchable() {
            tracing::error!("No search fields configured for collection '{}'", collection);
            return Err(AdapterError::NoSearchableFields {
                collection: collection.to_string(),
            });
        }

        let full_text = FullTextQuery::new(query, config.search_fields.clone(), limit)
            .with_source_fields(config.source_fields.clone());

        let query_start = Instant::now();
        let response = self.index.search(collection, &full_text).await?;
        tracing::info!(
            "Query completed in {:.3}s - {} total matches, returning {}",
            query_start.elapsed().as_secs_f64(),
            response.total,
            response.hits.len()
        );

        if response.hits.is_empty() {
            tracing::info!("No results found for query: '{}'", query);
            return Ok(SearchOutcome::NoResults {
                query: query.to_string(),
                collection: collection.to_string(),
            });
        }

        log_score_stats(response.hits.iter().map(|h| h.score));

        let hits = response
            .hits
            .iter()
            .take(limit)
            .enumerate()
            .map(|(i, hit)| render_hit(i + 1, hit, &config.result_format))
            .collect();

        Ok(SearchOutcome::Found(SearchReport {
            collection: collection.to_string(),
            query: query.to_string(),
            total: response.total,
            hits,
        }))
    }

    /// List collections known to the index, independent of the registry
    pub async fn list_collections(&self) -> Result<CollectionListing, AdapterError> {
        let mut names: Vec<String> = self
            .index
            .list_collections()
            .await?
            .into_iter()
            .filter(|name| !name.starts_with('.'))
            .collect();
        names.sort();

        if names.is_empty() {
            return Err(AdapterError::NoCollections);
        }
        Ok(CollectionListing { names })
    }
}

fn log_score_stats(scores: impl Iterator<Item = f64>) {
    let scores: Vec<f64> = scores.collect();
    if scores.is_empty() {
        return;
    }
    let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let avg = scores.iter().sum::<f64>() / scores.len() as f64;
    tracing::info!("Score stats - min: {:.2}, max: {:.2}, avg: {:.2}", min, max, avg);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{ClusterInfo, MemoryIndex, SearchResponse};
    use async_trait::async_trait;
    use serde_json::json;

    const REGISTRY: &str = r#"{
        "vehicle_issues": {
            "search_fields": ["model", "system", "problem"],
            "source_fields": ["model", "system", "problem", "cause"],
            "display_name": "Vehicle issues",
            "description": "Known defects",
            "result_format": {
                "type": "vehicle",
                "title_fields": ["model", "system"],
                "content_fields": {"Problem": "problem", "Cause": "cause"}
            }
        },
        "documents": {
            "search_fields": ["title", "content"],
            "source_fields": ["title", "content", "url"],
            "result_format": {"type": "document"}
        },
        "drafts": {"search_fields": []}
    }"#;

    fn adapter() -> SearchAdapter {
        let index = MemoryIndex::new()
            .with_collection(
                "vehicle_issues",
                vec![
                    json!({
                        "model": "K5", "system": "브레이크",
                        "problem": "브레이크 소음", "cause": "패드 마모"
                    }),
                    json!({
                        "model": "K5", "system": "엔진",
                        "problem": "엔진 떨림", "cause": "점화 플러그"
                    }),
                    json!({
                        "model": "Sorento", "system": "브레이크",
                        "problem": "제동 밀림", "cause": "오일 누유"
                    }),
                ],
            )
            .with_collection(
                "documents",
                vec![json!({
                    "title": "Brake maintenance",
                    "content": "Replace pads every 40k km",
                    "url": "https://docs/brakes"
                })],
            )
            .with_collection("drafts", vec![])
            .with_collection("unconfigured", vec![json!({"title": "x"})])
            .with_collection(".kibana", vec![]);

        SearchAdapter::new(
            Arc::new(index),
            Arc::new(CollectionRegistry::from_json(REGISTRY).unwrap()),
            "vehicle_issues",
        )
    }

    #[tokio::test]
    async fn test_default_collection_is_used() {
        let adapter = adapter();
        assert_eq!(adapter.resolve_collection(None), "vehicle_issues");
        assert_eq!(adapter.resolve_collection(Some("  ")), "vehicle_issues");
        assert_eq!(adapter.resolve_collection(Some("documents")), "documents");

        match adapter.search("브레이크", None, 5).await.unwrap() {
            SearchOutcome::Found(report) => assert_eq!(report.collection, "vehicle_issues"),
            other => panic!("Expected results, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_limit_and_ordering() {
        let adapter = adapter();
        let outcome = adapter.search("K5 브레이크", None, 2).await.unwrap();
        let hits = outcome.hits();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].rank, 1);
        assert_eq!(hits[1].rank, 2);
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn test_search_is_idempotent() {
        let adapter = adapter();
        let first = adapter.search("K5 브레이크", None, 5).await.unwrap();
        let second = adapter.search("K5 브레이크", None, 5).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_report_text() {
        let adapter = adapter();
        let text = adapter
            .search("brake", Some("documents"), 5)
            .await
            .unwrap()
            .to_string();
        assert!(text.starts_with("Search results (1) from 'documents'"));
        assert!(text.contains("[1] Brake maintenance (score: "));
        assert!(text.contains("URL: https://docs/brakes"));
    }

    #[tokio::test]
    async fn test_missing_collection() {
        let err = adapter().search("x", Some("nope"), 5).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::NotFound);
        assert!(err.to_tool_text().starts_with("Error: collection 'nope'"));
    }

    #[tokio::test]
    async fn test_unconfigured_collection_lists_registry() {
        let err = adapter()
            .search("x", Some("unconfigured"), 5)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::ConfigurationError);
        assert!(err
            .to_string()
            .ends_with("Available collections: vehicle_issues, documents, drafts"));
    }

    #[tokio::test]
    async fn test_no_searchable_fields() {
        let err = adapter().search("x", Some("drafts"), 5).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::NoSearchableFields);
    }

    #[tokio::test]
    async fn test_no_results_is_success() {
        let outcome = adapter()
            .search("transmission", Some("documents"), 5)
            .await
            .unwrap();
        assert!(matches!(outcome, SearchOutcome::NoResults { .. }));
        assert_eq!(
            outcome.to_string(),
            "No results found for 'transmission' in 'documents'."
        );
    }

    #[tokio::test]
    async fn test_list_collections_hides_system() {
        let listing = adapter().list_collections().await.unwrap();
        assert_eq!(
            listing.names,
            vec!["documents", "drafts", "unconfigured", "vehicle_issues"]
        );
        assert!(listing.to_string().contains("  - documents\n"));
    }

    struct DownIndex(SearchFailure);

    #[async_trait]
    impl SearchIndex for DownIndex {
        async fn collection_exists(&self, _c: &str) -> Result<bool, SearchFailure> {
            Err(self.0.clone())
        }
        async fn search(
            &self,
            _c: &str,
            _q: &FullTextQuery,
        ) -> Result<SearchResponse, SearchFailure> {
            Err(self.0.clone())
        }
        async fn list_collections(&self) -> Result<Vec<String>, SearchFailure> {
            Err(self.0.clone())
        }
        async fn cluster_info(&self) -> Result<ClusterInfo, SearchFailure> {
            Err(self.0.clone())
        }
        fn backend_name(&self) -> &str {
            "down"
        }
    }

    /// Records the size of every query it receives
    #[derive(Default)]
    struct RecordingIndex(std::sync::Mutex<Vec<usize>>);

    #[async_trait]
    impl SearchIndex for RecordingIndex {
        async fn collection_exists(&self, _c: &str) -> Result<bool, SearchFailure> {
            Ok(true)
        }
        async fn search(
            &self,
            _c: &str,
            q: &FullTextQuery,
        ) -> Result<SearchResponse, SearchFailure> {
            self.0.lock().unwrap().push(q.size);
            Ok(SearchResponse::default())
        }
        async fn list_collections(&self) -> Result<Vec<String>, SearchFailure> {
            Ok(Vec::new())
        }
        async fn cluster_info(&self) -> Result<ClusterInfo, SearchFailure> {
            Ok(ClusterInfo::default())
        }
        fn backend_name(&self) -> &str {
            "recording"
        }
    }

    #[tokio::test]
    async fn test_limit_clamped_to_result_window() {
        let index = Arc::new(RecordingIndex::default());
        let adapter = SearchAdapter::new(
            index.clone(),
            Arc::new(CollectionRegistry::from_json(REGISTRY).unwrap()),
            "documents",
        );

        for limit in [0, 7, usize::MAX] {
            adapter.search("brake", None, limit).await.unwrap();
        }
        assert_eq!(*index.0.lock().unwrap(), vec![1, 7, MAX_RESULT_WINDOW]);
    }

    fn down(failure: SearchFailure) -> SearchAdapter {
        SearchAdapter::new(
            Arc::new(DownIndex(failure)),
            Arc::new(CollectionRegistry::empty()),
            "documents",
        )
    }

    #[tokio::test]
    async fn test_failure_taxonomy() {
        let cases = vec![
            (SearchFailure::Connection("refused".into()), FailureKind::ConnectivityFailure),
            (SearchFailure::Timeout("30s".into()), FailureKind::Timeout),
            (SearchFailure::Authentication("HTTP 401".into()), FailureKind::AuthFailure),
            (SearchFailure::IndexNotFound("documents".into()), FailureKind::NotFound),
            (SearchFailure::Other("boom".into()), FailureKind::GenericFailure),
        ];

        for (failure, kind) in cases {
            let adapter = down(failure);
            let err = adapter.search("q", None, 5).await.unwrap_err();
            assert_eq!(err.kind(), kind);
            assert!(err.to_tool_text().starts_with(FAILURE_MARKER));
            let listing_err = adapter.list_collections().await.unwrap_err();
            assert!(listing_err.to_tool_text().starts_with(FAILURE_MARKER));
        }
    }

    #[tokio::test]
    async fn test_generic_failure_keeps_message() {
        let err = down(SearchFailure::Other("shard failure".into()))
            .search("q", None, 5)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "search failed: shard failure");
    }
}
