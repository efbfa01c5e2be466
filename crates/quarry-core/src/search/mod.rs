//! Search engine module
//!
//! Provides:
//! - The `SearchIndex` boundary to the external document index
//! - An Elasticsearch REST client and an in-memory index implementing it
//! - Per-collection query building and result rendering
//! - The `SearchAdapter` the agent's `search` tool runs through

mod adapter;
mod elasticsearch;
mod failure;
mod index;
mod memory;
mod query;
mod render;

pub use adapter::{
    AdapterError, CollectionListing, SearchAdapter, SearchOutcome, SearchReport, FAILURE_MARKER,
};
pub use elasticsearch::ElasticsearchClient;
pub use failure::SearchFailure;
pub use index::{ClusterInfo, SearchIndex};
pub use memory::MemoryIndex;
pub use query::{FullTextQuery, Fuzziness};
pub use render::{render_hit, truncate_preview, RenderedHit, PREVIEW_CHARS};

use serde::{Deserialize, Serialize};

/// Results returned by the index for one query, best match first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Total matching documents in the collection (may exceed `hits.len()`)
    pub total: u64,
    pub hits: Vec<Hit>,
}

/// One ranked document: an opaque field map plus its relevance score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub source: serde_json::Map<String, serde_json::Value>,
    pub score: f64,
}

impl Hit {
    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.source.get(name)
    }
}
