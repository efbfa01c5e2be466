//! Search index boundary

use super::{FullTextQuery, SearchFailure, SearchResponse};
use async_trait::async_trait;
use serde::Serialize;

/// Read-only access to an external document index.
///
/// Implementations are shared across conversations and must be safe for
/// concurrent use.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Whether a collection (index) with this name exists
    async fn collection_exists(&self, collection: &str) -> Result<bool, SearchFailure>;

    /// Run a ranked full-text query against one collection
    async fn search(
        &self,
        collection: &str,
        query: &FullTextQuery,
    ) -> Result<SearchResponse, SearchFailure>;

    /// All collection names the index knows about, system ones included
    async fn list_collections(&self) -> Result<Vec<String>, SearchFailure>;

    /// Basic identity of the backing cluster
    async fn cluster_info(&self) -> Result<ClusterInfo, SearchFailure>;

    /// Short backend name for logs
    fn backend_name(&self) -> &str;
}

/// Cluster identity reported by the health check
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClusterInfo {
    pub cluster_name: String,
    pub version: Option<String>,
}
