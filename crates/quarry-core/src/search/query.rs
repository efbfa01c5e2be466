//! Full-text query construction

use serde_json::{json, Value};

/// Typo tolerance for term matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fuzziness {
    /// Edit distance scales with term length (0 / 1 / 2)
    #[default]
    Auto,
    /// Fixed maximum edit distance
    Edits(u8),
}

impl Fuzziness {
    /// Maximum edit distance allowed for a term of `len` characters
    pub fn max_edits(&self, len: usize) -> usize {
        match self {
            Fuzziness::Auto => match len {
                0..=2 => 0,
                3..=5 => 1,
                _ => 2,
            },
            Fuzziness::Edits(n) => *n as usize,
        }
    }

    fn to_value(self) -> Value {
        match self {
            Fuzziness::Auto => json!("AUTO"),
            Fuzziness::Edits(n) => json!(n.to_string()),
        }
    }
}

/// Best-field multi-match query over a collection's searchable fields
#[derive(Debug, Clone, PartialEq)]
pub struct FullTextQuery {
    pub text: String,
    /// Fields to match against; `name^boost` is allowed
    pub fields: Vec<String>,
    /// Fields to return for each hit; empty means all
    pub source_fields: Vec<String>,
    pub size: usize,
    pub fuzziness: Fuzziness,
}

impl FullTextQuery {
    pub fn new(text: impl Into<String>, fields: Vec<String>, size: usize) -> Self {
        Self {
            text: text.into(),
            fields,
            source_fields: Vec::new(),
            size,
            fuzziness: Fuzziness::Auto,
        }
    }

    pub fn with_source_fields(mut self, source_fields: Vec<String>) -> Self {
        self.source_fields = source_fields;
        self
    }

    /// Elasticsearch `_search` request body
    pub fn to_body(&self) -> Value {
        let mut body = json!({
            "query": {
                "multi_match": {
                    "query": self.text,
                    "fields": self.fields,
                    "type": "best_fields",
                    "fuzziness": self.fuzziness.to_value(),
                }
            },
            "size": self.size,
        });
        if !self.source_fields.is_empty() {
            body["_source"] = json!(self.source_fields);
        }
        body
    }
}

/// Split `title^2` into (`title`, 2.0)
pub(crate) fn parse_boost(field: &str) -> (&str, f64) {
    match field.split_once('^') {
        Some((name, boost)) => (name, boost.parse().unwrap_or(1.0)),
        None => (field, 1.0),
    }
}
