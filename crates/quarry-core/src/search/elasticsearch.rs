//! Elasticsearch REST client

use super::{ClusterInfo, FullTextQuery, Hit, SearchFailure, SearchIndex, SearchResponse};
use crate::config::ElasticsearchConfig;
use crate::error::{QuarryError, Result};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use std::time::{Duration, Instant};

/// Client for the Elasticsearch REST API.
///
/// Holds one connection pool; clone-free sharing goes through `Arc`.
pub struct ElasticsearchClient {
    http_client: reqwest::Client,
    base_url: String,
    auth: Option<(String, String)>,
}

impl ElasticsearchClient {
    /// Create new client from configuration
    pub fn new(config: &ElasticsearchConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(!config.verify_certs)
            .build()
            .map_err(QuarryError::Http)?;

        Ok(Self {
            http_client,
            base_url: config.url.trim_end_matches('/').to_string(),
            auth: config
                .basic_auth()
                .map(|(user, pass)| (user.to_string(), pass.to_string())),
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(&ElasticsearchConfig::default())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let req = self.http_client.request(method, url);
        match &self.auth {
            Some((user, pass)) => req.basic_auth(user, Some(pass)),
            None => req,
        }
    }
}

/// Names that would break out of the `/{index}` path segment are never sent.
fn is_addressable(collection: &str) -> bool {
    !collection.is_empty()
        && !collection.starts_with('_')
        && !collection.contains(['/', '\\', '?', '#', '*', ',', ' ', '"', '<', '>', '|'])
        && collection != "."
        && collection != ".."
}

#[derive(Deserialize)]
struct EsSearchResponse {
    hits: EsHits,
}

#[derive(Deserialize)]
struct EsHits {
    #[serde(default)]
    total: Option<EsTotal>,
    #[serde(default)]
    hits: Vec<EsHit>,
}

/// `hits.total` is an object since 7.x and a bare number before that
#[derive(Deserialize)]
#[serde(untagged)]
enum EsTotal {
    Object { value: u64 },
    Count(u64),
}

#[derive(Deserialize)]
struct EsHit {
    #[serde(rename = "_score", default)]
    score: Option<f64>,
    #[serde(rename = "_source", default)]
    source: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct EsRootInfo {
    #[serde(default)]
    cluster_name: String,
    #[serde(default)]
    version: Option<EsVersion>,
}

#[derive(Deserialize)]
struct EsVersion {
    number: String,
}

#[async_trait]
impl SearchIndex for ElasticsearchClient {
    async fn collection_exists(
        &self,
        collection: &str,
    ) -> std::result::Result<bool, SearchFailure> {
        if !is_addressable(collection) {
            return Ok(false);
        }

        let response = self.request(Method::HEAD, collection).send().await?;
        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(SearchFailure::from_status(
                status.as_u16(),
                String::new(),
                collection,
            )),
        }
    }

    async fn search(
        &self,
        collection: &str,
        query: &FullTextQuery,
    ) -> std::result::Result<SearchResponse, SearchFailure> {
        if !is_addressable(collection) {
            return Err(SearchFailure::IndexNotFound(collection.to_string()));
        }

        let body = query.to_body();
        tracing::debug!("Elasticsearch query on {}: {}", collection, body);

        let start = Instant::now();
        let response = self
            .request(Method::POST, &format!("{}/_search", collection))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SearchFailure::from_status(status, body, collection));
        }

        let parsed: EsSearchResponse = response.json().await?;
        tracing::debug!(
            "Elasticsearch responded in {:.3}s",
            start.elapsed().as_secs_f64()
        );

        let hits: Vec<Hit> = parsed
            .hits
            .hits
            .into_iter()
            .map(|hit| Hit {
                source: hit.source,
                score: hit.score.unwrap_or(0.0),
            })
            .collect();

        let total = match parsed.hits.total {
            Some(EsTotal::Object { value }) | Some(EsTotal::Count(value)) => value,
            None => hits.len() as u64,
        };

        Ok(SearchResponse { total, hits })
    }

    async fn list_collections(&self) -> std::result::Result<Vec<String>, SearchFailure> {
        let response = self.request(Method::GET, "_alias").send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SearchFailure::from_status(status, body, "_alias"));
        }

        let aliases: serde_json::Map<String, serde_json::Value> = response.json().await?;
        Ok(aliases.into_iter().map(|(name, _)| name).collect())
    }

    async fn cluster_info(&self) -> std::result::Result<ClusterInfo, SearchFailure> {
        let response = self.request(Method::GET, "/").send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SearchFailure::from_status(status, body, ""));
        }

        let info: EsRootInfo = response.json().await?;
        Ok(ClusterInfo {
            cluster_name: info.cluster_name,
            version: info.version.map(|v| v.number),
        })
    }

    fn backend_name(&self) -> &str {
        "elasticsearch"
    }
}
