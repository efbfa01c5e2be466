//! Per-collection search configuration
//!
//! The registry is read once from a declarative JSON file at startup:
//!
//! ```json
//! {
//!   "vehicle_issues": {
//!     "search_fields": ["model^2", "system", "problem", "cause"],
//!     "source_fields": ["model", "system", "problem", "cause", "action"],
//!     "display_name": "Vehicle issues",
//!     "description": "Known defects per model",
//!     "result_format": {
//!       "type": "vehicle",
//!       "title_fields": ["model", "system"],
//!       "content_fields": {"Problem": "problem", "Cause": "cause", "Action": "action"}
//!     }
//!   }
//! }
//! ```
//!
//! Collection order and label order are kept exactly as written in the file.

use crate::error::{QuarryError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Search configuration for one collection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectionConfig {
    /// Fields the full-text query runs against (boosts like `title^2` allowed)
    #[serde(default)]
    pub search_fields: Vec<String>,

    /// Fields fetched for each hit
    #[serde(default)]
    pub source_fields: Vec<String>,

    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default)]
    pub description: String,

    /// How hits from this collection are rendered
    #[serde(default)]
    pub result_format: ResultFormat,
}

impl CollectionConfig {
    pub fn is_searchable(&self) -> bool {
        !self.search_fields.is_empty()
    }
}

/// Rendering template for search hits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawResultFormat", into = "RawResultFormat")]
pub enum ResultFormat {
    /// Free-text document with a title, a body and an optional link
    Document {
        title_field: String,
        content_field: String,
        url_field: String,
    },
    /// Structured record: title joined from several fields, body as labeled lines
    Record {
        title_fields: Vec<String>,
        content_fields: LabeledFields,
    },
}

impl Default for ResultFormat {
    fn default() -> Self {
        Self::Document {
            title_field: "title".to_string(),
            content_field: "content".to_string(),
            url_field: "url".to_string(),
        }
    }
}

impl ResultFormat {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Document { .. } => "document",
            Self::Record { .. } => "vehicle",
        }
    }
}

/// Wire shape of `result_format`; every key is optional in the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawResultFormat {
    #[serde(rename = "type", default = "default_format_type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title_field: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    title_fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content_field: Option<String>,
    #[serde(default, skip_serializing_if = "LabeledFields::is_empty")]
    content_fields: LabeledFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url_field: Option<String>,
}

fn default_format_type() -> String {
    "document".to_string()
}

impl From<RawResultFormat> for ResultFormat {
    fn from(raw: RawResultFormat) -> Self {
        match raw.kind.as_str() {
            "vehicle" | "record" => ResultFormat::Record {
                title_fields: raw.title_fields,
                content_fields: raw.content_fields,
            },
            other => {
                if other != "document" {
                    tracing::warn!("Unknown result_format type '{}', using document", other);
                }
                ResultFormat::Document {
                    title_field: raw.title_field.unwrap_or_else(|| "title".to_string()),
                    content_field: raw.content_field.unwrap_or_else(|| "content".to_string()),
                    url_field: raw.url_field.unwrap_or_else(|| "url".to_string()),
                }
            }
        }
    }
}

impl From<ResultFormat> for RawResultFormat {
    fn from(format: ResultFormat) -> Self {
        match format {
            ResultFormat::Document {
                title_field,
                content_field,
                url_field,
            } => RawResultFormat {
                kind: "document".to_string(),
                title_field: Some(title_field),
                title_fields: Vec::new(),
                content_field: Some(content_field),
                content_fields: LabeledFields::default(),
                url_field: Some(url_field),
            },
            ResultFormat::Record {
                title_fields,
                content_fields,
            } => RawResultFormat {
                kind: "vehicle".to_string(),
                title_field: None,
                title_fields,
                content_field: None,
                content_fields,
                url_field: None,
            },
        }
    }
}

/// Ordered `label -> field` bindings.
///
/// Accepts either a JSON object (`{"Problem": "problem"}`) or a plain list of
/// field names, in which case each field is its own label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLabeledFields", into = "Map<String, Value>")]
pub struct LabeledFields(Vec<(String, String)>);

impl LabeledFields {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self(pairs)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(l, f)| (l.as_str(), f.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLabeledFields {
    Labeled(Map<String, Value>),
    Fields(Vec<String>),
}

impl TryFrom<RawLabeledFields> for LabeledFields {
    type Error = String;

    fn try_from(raw: RawLabeledFields) -> std::result::Result<Self, Self::Error> {
        match raw {
            RawLabeledFields::Fields(fields) => {
                Ok(Self(fields.into_iter().map(|f| (f.clone(), f)).collect()))
            }
            RawLabeledFields::Labeled(map) => map
                .into_iter()
                .map(|(label, field)| match field {
                    Value::String(field) => Ok((label, field)),
                    other => Err(format!(
                        "field for label '{}' must be a string, got {}",
                        label, other
                    )),
                })
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(Self),
        }
    }
}

impl From<LabeledFields> for Map<String, Value> {
    fn from(fields: LabeledFields) -> Self {
        fields
            .0
            .into_iter()
            .map(|(label, field)| (label, Value::String(field)))
            .collect()
    }
}

/// Immutable collection registry, loaded once per process
#[derive(Debug, Clone, Default)]
pub struct CollectionRegistry {
    entries: Vec<(String, CollectionConfig)>,
}

impl CollectionRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the registry from a JSON file.
    ///
    /// A missing or malformed file yields an empty registry and a log line;
    /// the agent stays usable and reports the problem per search.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("Collection config file not found: {}", path.display());
                tracing::warn!("Continuing with an empty collection registry");
                return Self::empty();
            }
            Err(e) => {
                tracing::error!("Failed to read collection config {}: {}", path.display(), e);
                return Self::empty();
            }
        };

        match Self::from_json(&content) {
            Ok(registry) => {
                tracing::info!(
                    "Loaded collection configurations for: {}",
                    registry.list().join(", ")
                );
                registry
            }
            Err(e) => {
                tracing::error!("Invalid collection config {}: {}", path.display(), e);
                Self::empty()
            }
        }
    }

    /// Parse a registry from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: Map<String, Value> = serde_json::from_str(json)
            .map_err(|e| QuarryError::Config(format!("collection registry: {}", e)))?;

        let entries = raw
            .into_iter()
            .map(|(name, value)| {
                serde_json::from_value(value)
                    .map(|config| (name.clone(), config))
                    .map_err(|e| QuarryError::Config(format!("collection '{}': {}", name, e)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }

    /// Build a registry from already parsed entries, in the given order
    pub fn from_entries(entries: Vec<(String, CollectionConfig)>) -> Self {
        Self { entries }
    }

    pub fn get(&self, id: &str) -> Option<&CollectionConfig> {
        self.entries
            .iter()
            .find(|(name, _)| name == id)
            .map(|(_, config)| config)
    }

    /// Collection identifiers in source order
    pub fn list(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CollectionConfig)> {
        self.entries.iter().map(|(name, config)| (name.as_str(), config))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One line per collection: `"id" (display name): description`
    pub fn describe(&self) -> Vec<String> {
        self.iter()
            .map(|(id, config)| {
                format!(
                    "\"{}\" ({}): {}",
                    id,
                    config.display_name.as_deref().unwrap_or(id),
                    config.description
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"{
        "vehicle_issues": {
            "search_fields": ["model", "system", "problem"],
            "source_fields": ["model", "system", "problem", "cause", "action"],
            "display_name": "Vehicle issues",
            "description": "Known defects per model",
            "result_format": {
                "type": "vehicle",
                "title_fields": ["model", "system"],
                "content_fields": {"Problem": "problem", "Cause": "cause", "Action": "action"}
            }
        },
        "documents": {
            "search_fields": ["title^2", "content"],
            "source_fields": ["title", "content", "url"],
            "description": "Technical documents",
            "result_format": {"type": "document"}
        },
        "archive": {
            "search_fields": [],
            "description": "Not searchable yet"
        }
    }"#;

    #[test]
    fn test_registry_keeps_source_order() {
        let registry = CollectionRegistry::from_json(SAMPLE).unwrap();
        assert_eq!(registry.list(), vec!["vehicle_issues", "documents", "archive"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_record_format_keeps_label_order() {
        let registry = CollectionRegistry::from_json(SAMPLE).unwrap();
        let config = registry.get("vehicle_issues").unwrap();
        match &config.result_format {
            ResultFormat::Record {
                title_fields,
                content_fields,
            } => {
                assert_eq!(title_fields, &vec!["model".to_string(), "system".to_string()]);
                let labels: Vec<&str> = content_fields.iter().map(|(l, _)| l).collect();
                assert_eq!(labels, vec!["Problem", "Cause", "Action"]);
            }
            other => panic!("Expected record format, got {:?}", other),
        }
    }

    #[test]
    fn test_document_format_defaults() {
        let registry = CollectionRegistry::from_json(SAMPLE).unwrap();
        let config = registry.get("documents").unwrap();
        assert_eq!(config.result_format, ResultFormat::default());
        assert!(config.display_name.is_none());

        // No result_format at all also means document
        let archive = registry.get("archive").unwrap();
        assert_eq!(archive.result_format.kind(), "document");
        assert!(!archive.is_searchable());
    }

    #[test]
    fn test_unknown_format_type_falls_back_to_document() {
        let json = r#"{"x": {
            "search_fields": ["a"],
            "result_format": {"type": "table", "title_field": "name"}
        }}"#;
        let registry = CollectionRegistry::from_json(json).unwrap();
        match &registry.get("x").unwrap().result_format {
            ResultFormat::Document { title_field, .. } => assert_eq!(title_field, "name"),
            other => panic!("Expected document format, got {:?}", other),
        }
    }

    #[test]
    fn test_content_fields_as_list() {
        let json = r#"{"x": {
            "search_fields": ["a"],
            "result_format": {"type": "vehicle", "content_fields": ["a", "b"]}
        }}"#;
        let registry = CollectionRegistry::from_json(json).unwrap();
        match &registry.get("x").unwrap().result_format {
            ResultFormat::Record { content_fields, .. } => {
                let pairs: Vec<(&str, &str)> = content_fields.iter().collect();
                assert_eq!(pairs, vec![("a", "a"), ("b", "b")]);
            }
            other => panic!("Expected record format, got {:?}", other),
        }
    }

    #[test]
    fn test_content_fields_must_be_strings() {
        let json = r#"{"x": {
            "search_fields": ["a"],
            "result_format": {"type": "vehicle", "content_fields": {"A": 1}}
        }}"#;
        let err = CollectionRegistry::from_json(json).unwrap_err();
        assert!(err.to_string().contains("collection 'x'"));
    }

    #[test]
    fn test_duplicate_key_keeps_first_position() {
        let json = r#"{"a": {"description": "first"}, "b": {}, "a": {"description": "second"}}"#;
        let registry = CollectionRegistry::from_json(json).unwrap();
        assert_eq!(registry.list(), vec!["a", "b"]);
        assert_eq!(registry.get("a").unwrap().description, "second");
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let registry = CollectionRegistry::load(&dir.path().join("missing.json"));
        assert!(registry.is_empty());
        assert!(registry.get("documents").is_none());
    }

    #[test]
    fn test_load_invalid_json_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("collections.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(CollectionRegistry::load(&path).is_empty());
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        assert!(CollectionRegistry::from_json("[1, 2]").is_err());
        assert!(CollectionRegistry::from_json("{} trailing").is_err());
    }

    #[test]
    fn test_describe_uses_display_name_fallback() {
        let registry = CollectionRegistry::from_json(SAMPLE).unwrap();
        let lines = registry.describe();
        assert_eq!(
            lines[0],
            "\"vehicle_issues\" (Vehicle issues): Known defects per model"
        );
        assert_eq!(lines[1], "\"documents\" (documents): Technical documents");
    }

    #[test]
    fn test_result_format_serializes_back() {
        let registry = CollectionRegistry::from_json(SAMPLE).unwrap();
        let config = registry.get("vehicle_issues").unwrap();
        let value = serde_json::to_value(config).unwrap();
        assert_eq!(value["result_format"]["type"], "vehicle");
        assert_eq!(value["result_format"]["content_fields"]["Cause"], "cause");
    }
}
