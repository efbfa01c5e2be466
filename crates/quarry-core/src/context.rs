//! Explicitly constructed process context
//!
//! Bundles the settings, the collection registry, the shared index and
//! generation clients, and the answer cache. Everything here is read-only after construction and
//! shared across threads through `Arc`.

use crate::agent::{CacheStats, ReactAgent, ResponseCache, SessionStore, TurnOutcome};
use crate::config::{CollectionRegistry, Config};
use crate::error::Result;
use crate::llm::{LLMClient, MetricsSnapshot, OpenAIClient};
use crate::search::{ElasticsearchClient, SearchAdapter, SearchIndex};
use std::sync::Arc;

pub struct AgentContext {
    config: Config,
    registry: Arc<CollectionRegistry>,
    index: Arc<dyn SearchIndex>,
    llm: Arc<dyn LLMClient>,
    adapter: Arc<SearchAdapter>,
    sessions: SessionStore,
    cache: Option<Arc<ResponseCache>>,
}

impl AgentContext {
    /// Build the context from configuration: registry file, Elasticsearch and
    /// the OpenAI-compatible generation service
    pub fn from_config(config: Config) -> Result<Self> {
        let registry = Arc::new(CollectionRegistry::load(
            &config.elasticsearch.collections_file,
        ));
        let index: Arc<dyn SearchIndex> =
            Arc::new(ElasticsearchClient::new(&config.elasticsearch)?);
        let llm: Arc<dyn LLMClient> = Arc::new(OpenAIClient::new(config.llm_service.clone())?);
        Ok(Self::from_parts(config, registry, index, llm))
    }

    pub fn from_parts(
        config: Config,
        registry: Arc<CollectionRegistry>,
        index: Arc<dyn SearchIndex>,
        llm: Arc<dyn LLMClient>,
    ) -> Self {
        let adapter = Arc::new(SearchAdapter::new(
            index.clone(),
            registry.clone(),
            config.elasticsearch.default_collection.clone(),
        ));

        tracing::debug!(
            "Context ready: {} backend, {} configured collections, model {}",
            index.backend_name(),
            registry.len(),
            llm.model_name()
        );

        let cache = config
            .agent
            .cache_ttl()
            .map(|ttl| Arc::new(ResponseCache::with_ttl(ttl)));

        Self {
            config,
            registry,
            index,
            llm,
            adapter,
            sessions: SessionStore::new(),
            cache,
        }
    }

    /// Swap the index backend, keeping everything else
    pub fn with_index(self, index: Arc<dyn SearchIndex>) -> Self {
        Self::from_parts(self.config, self.registry, index, self.llm)
    }

    /// Change the collection searched when a request names none
    pub fn with_default_collection(mut self, collection: impl Into<String>) -> Self {
        self.config.elasticsearch.default_collection = collection.into();
        Self::from_parts(self.config, self.registry, self.index, self.llm)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &Arc<CollectionRegistry> {
        &self.registry
    }

    pub fn index(&self) -> &Arc<dyn SearchIndex> {
        &self.index
    }

    pub fn adapter(&self) -> Arc<SearchAdapter> {
        self.adapter.clone()
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn cache(&self) -> Option<&Arc<ResponseCache>> {
        self.cache.as_ref()
    }

    /// Cache counters, `None` when caching is disabled
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(|cache| cache.stats())
    }

    /// Request counters of the generation client
    pub fn llm_metrics(&self) -> Option<MetricsSnapshot> {
        self.llm.metrics()
    }

    /// A reasoning loop wired to this context's clients
    pub fn agent(&self) -> ReactAgent {
        let agent = ReactAgent::new(self.llm.clone(), self.adapter.clone(), &self.registry)
            .with_max_iterations(self.config.agent.max_iterations);
        match &self.cache {
            Some(cache) => agent.with_cache(cache.clone()),
            None => agent,
        }
    }

    /// Run one turn on a thread
    pub async fn ask(&self, thread_id: &str, query: &str) -> Result<TurnOutcome> {
        let agent = self.agent();
        self.sessions.run_turn(&agent, thread_id, query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::MemoryIndex;

    #[test]
    fn test_from_config_builds_clients() {
        let mut config = Config::default();
        config.elasticsearch.collections_file = "/nonexistent/collections.json".into();
        config.agent.max_iterations = 3;

        let context = AgentContext::from_config(config).unwrap();
        assert!(context.registry().is_empty());
        assert_eq!(context.index().backend_name(), "elasticsearch");
        assert_eq!(context.agent().max_iterations(), 3);

        let metrics = context.llm_metrics().unwrap();
        assert_eq!(metrics.total_requests, 0);
    }

    #[test]
    fn test_cache_follows_ttl_setting() {
        let mut config = Config::default();
        config.elasticsearch.collections_file = "/nonexistent/collections.json".into();
        config.agent.cache_ttl_secs = 120;

        let context = AgentContext::from_config(config.clone()).unwrap();
        let cache = context.cache().unwrap();
        assert_eq!(cache.ttl().as_secs(), 120);
        assert_eq!(context.cache_stats().unwrap().total_queries, 0);

        config.agent.cache_ttl_secs = 0;
        let context = AgentContext::from_config(config).unwrap();
        assert!(context.cache().is_none());
        assert!(context.cache_stats().is_none());
    }

    #[test]
    fn test_with_index_rebuilds_adapter() {
        let mut config = Config::default();
        config.elasticsearch.collections_file = "/nonexistent/collections.json".into();
        config.elasticsearch.default_collection = "manuals".to_string();

        let context = AgentContext::from_config(config)
            .unwrap()
            .with_index(Arc::new(MemoryIndex::new()));
        assert_eq!(context.index().backend_name(), "memory");
        assert_eq!(context.adapter().index().backend_name(), "memory");
        assert_eq!(context.adapter().default_collection(), "manuals");

        let context = context.with_default_collection("vehicle_issues");
        assert_eq!(context.adapter().default_collection(), "vehicle_issues");
        assert_eq!(context.config().elasticsearch.default_collection, "vehicle_issues");
    }
}
