//! In-memory search index
//!
//! A small stand-in for Elasticsearch: best-field scoring over tokenized
//! fields with edit-distance term matching. Used for offline runs and tests.

use super::query::parse_boost;
use super::{ClusterInfo, FullTextQuery, Hit, SearchFailure, SearchIndex, SearchResponse};
use crate::error::{QuarryError, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

type Document = Map<String, Value>;

/// Collections of JSON documents held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryIndex {
    collections: BTreeMap<String, Vec<Document>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a collection
    pub fn with_collection(mut self, name: impl Into<String>, documents: Vec<Value>) -> Self {
        let docs = documents
            .into_iter()
            .filter_map(|doc| match doc {
                Value::Object(map) => Some(map),
                other => {
                    tracing::warn!("Skipping non-object document: {}", other);
                    None
                }
            })
            .collect();
        self.collections.insert(name.into(), docs);
        self
    }

    /// Load collections from a JSON file shaped `{"collection": [doc, ...]}`
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let parsed: BTreeMap<String, Vec<Value>> = serde_json::from_str(json)
            .map_err(|e| QuarryError::Config(format!("in-memory index data: {}", e)))?;
        Ok(parsed
            .into_iter()
            .fold(Self::new(), |index, (name, docs)| index.with_collection(name, docs)))
    }

    /// Documents held across all collections
    pub fn document_count(&self) -> usize {
        self.collections.values().map(Vec::len).sum()
    }
}

#[async_trait]
impl SearchIndex for MemoryIndex {
    async fn collection_exists(
        &self,
        collection: &str,
    ) -> std::result::Result<bool, SearchFailure> {
        Ok(self.collections.contains_key(collection))
    }

    async fn search(
        &self,
        collection: &str,
        query: &FullTextQuery,
    ) -> std::result::Result<SearchResponse, SearchFailure> {
        let docs = self
            .collections
            .get(collection)
            .ok_or_else(|| SearchFailure::IndexNotFound(collection.to_string()))?;

        let terms = tokenize(&query.text);
        if terms.is_empty() {
            return Ok(SearchResponse::default());
        }

        let mut scored: Vec<(f64, &Document)> = docs
            .iter()
            .filter_map(|doc| {
                let score = score_document(doc, &terms, query);
                (score > 0.0).then_some((score, doc))
            })
            .collect();

        // Stable sort keeps insertion order among equal scores
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        let total = scored.len() as u64;
        let hits = scored
            .into_iter()
            .take(query.size)
            .map(|(score, doc)| Hit {
                source: project(doc, &query.source_fields),
                score,
            })
            .collect();

        Ok(SearchResponse { total, hits })
    }

    async fn list_collections(&self) -> std::result::Result<Vec<String>, SearchFailure> {
        Ok(self.collections.keys().cloned().collect())
    }

    async fn cluster_info(&self) -> std::result::Result<ClusterInfo, SearchFailure> {
        Ok(ClusterInfo {
            cluster_name: "in-memory".to_string(),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
        })
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}

/// Best-field score: the strongest single field wins
fn score_document(doc: &Document, terms: &[String], query: &FullTextQuery) -> f64 {
    query
        .fields
        .iter()
        .map(|field| {
            let (name, boost) = parse_boost(field);
            let tokens = match doc.get(name) {
                Some(value) => tokenize(&value_text(value)),
                None => return 0.0,
            };
            let matched: f64 = terms
                .iter()
                .map(|term| term_weight(term, &tokens, query))
                .sum();
            matched * boost
        })
        .fold(0.0, f64::max)
}

fn term_weight(term: &str, tokens: &[String], query: &FullTextQuery) -> f64 {
    let term_len = term.chars().count();
    let max_edits = query.fuzziness.max_edits(term_len);

    tokens
        .iter()
        .map(|token| {
            if token == term {
                1.0
            } else if max_edits > 0 && edit_distance(term, token) <= max_edits {
                0.5
            } else {
                0.0
            }
        })
        .fold(0.0, f64::max)
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(value_text).collect::<Vec<_>>().join(" "),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn project(doc: &Document, fields: &[String]) -> Document {
    if fields.is_empty() {
        return doc.clone();
    }
    fields
        .iter()
        .filter_map(|f| doc.get(f).map(|v| (f.clone(), v.clone())))
        .collect()
}

/// Levenshtein distance over chars
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
