//! Result rendering for search hits

use super::Hit;
use crate::config::ResultFormat;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Maximum characters of free text shown per hit
pub const PREVIEW_CHARS: usize = 300;

const MISSING_FIELD: &str = "N/A";
const UNTITLED: &str = "(untitled)";

/// A hit rendered through its collection's template
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedHit {
    /// 1-based position in the result list
    pub rank: usize,
    pub title: String,
    pub score: f64,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl fmt::Display for RenderedHit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[{}] {} (score: {:.2})", self.rank, self.title, self.score)?;
        writeln!(f, "   Content:")?;
        writeln!(f, "   {}", self.content)?;
        if let Some(url) = &self.url {
            writeln!(f, "   URL: {}", url)?;
        }
        Ok(())
    }
}

/// Render one hit according to a collection's result format
pub fn render_hit(rank: usize, hit: &Hit, format: &ResultFormat) -> RenderedHit {
    let (title, content, url) = match format {
        ResultFormat::Document {
            title_field,
            content_field,
            url_field,
        } => {
            let title = field_text(hit, title_field).unwrap_or_else(|| UNTITLED.to_string());
            let content = field_text(hit, content_field).unwrap_or_default();
            let url = field_text(hit, url_field).filter(|u| !u.is_empty());
            (title, content, url)
        }
        ResultFormat::Record {
            title_fields,
            content_fields,
        } => {
            let title = title_fields
                .iter()
                .map(|f| field_text(hit, f).unwrap_or_else(|| MISSING_FIELD.to_string()))
                .collect::<Vec<_>>()
                .join(" - ");
            let content = content_fields
                .iter()
                .map(|(label, f)| {
                    format!(
                        "{}: {}",
                        label,
                        field_text(hit, f).unwrap_or_else(|| MISSING_FIELD.to_string())
                    )
                })
                .collect::<Vec<_>>()
                .join("\n   ");
            (title, content, None)
        }
    };

    RenderedHit {
        rank,
        title,
        score: hit.score,
        content: truncate_preview(&content, PREVIEW_CHARS),
        url,
    }
}

/// Cut `text` to at most `max_chars` characters, marking the cut with `...`
///
/// The kept part is always an exact prefix of the input.
pub fn truncate_preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

fn field_text(hit: &Hit, field: &str) -> Option<String> {
    hit.field(field).and_then(value_text)
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(value_text)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LabeledFields;
    use proptest::prelude::*;
    use serde_json::json;

    fn hit(source: Value, score: f64) -> Hit {
        Hit {
            source: source.as_object().cloned().unwrap(),
            score,
        }
    }

    fn record_format() -> ResultFormat {
        ResultFormat::Record {
            title_fields: vec!["model".to_string(), "system".to_string()],
            content_fields: LabeledFields::new(vec![
                ("Problem".to_string(), "problem".to_string()),
                ("Cause".to_string(), "cause".to_string()),
            ]),
        }
    }

    #[test]
    fn test_render_document() {
        let h = hit(
            json!({"title": "Brake guide", "content": "Check the pads.", "url": "https://x/1"}),
            4.567,
        );
        let rendered = render_hit(1, &h, &ResultFormat::default());
        assert_eq!(rendered.title, "Brake guide");
        assert_eq!(rendered.url.as_deref(), Some("https://x/1"));
        assert_eq!(
            rendered.to_string(),
            "[1] Brake guide (score: 4.57)\n   Content:\n   Check the pads.\n   URL: https://x/1\n"
        );
    }

    #[test]
    fn test_render_document_missing_fields() {
        let rendered = render_hit(2, &hit(json!({"body": "x"}), 0.0), &ResultFormat::default());
        assert_eq!(rendered.title, UNTITLED);
        assert_eq!(rendered.content, "");
        assert!(rendered.url.is_none());
        assert!(!rendered.to_string().contains("URL:"));
    }

    #[test]
    fn test_render_record() {
        let h = hit(
            json!({"model": "K5", "system": "브레이크", "problem": "소음", "cause": null}),
            12.0,
        );
        let rendered = render_hit(3, &h, &record_format());
        assert_eq!(rendered.title, "K5 - 브레이크");
        assert_eq!(rendered.content, "Problem: 소음\n   Cause: N/A");
        assert!(rendered.url.is_none());
        assert!(rendered.to_string().starts_with("[3] K5 - 브레이크 (score: 12.00)"));
    }

    #[test]
    fn test_render_non_string_values() {
        let h = hit(json!({"title": 42, "content": ["a", "b"]}), 1.0);
        let rendered = render_hit(1, &h, &ResultFormat::default());
        assert_eq!(rendered.title, "42");
        assert_eq!(rendered.content, "a, b");
    }

    #[test]
    fn test_truncate_exact_boundary() {
        let text = "가".repeat(PREVIEW_CHARS);
        assert_eq!(truncate_preview(&text, PREVIEW_CHARS), text);

        let longer = "가".repeat(PREVIEW_CHARS + 1);
        let cut = truncate_preview(&longer, PREVIEW_CHARS);
        assert_eq!(cut, format!("{}...", "가".repeat(PREVIEW_CHARS)));
    }

    #[test]
    fn test_long_content_is_truncated_in_render() {
        let long = "x".repeat(1000);
        let rendered = render_hit(1, &hit(json!({"content": long}), 1.0), &ResultFormat::default());
        assert_eq!(rendered.content.chars().count(), PREVIEW_CHARS + 3);
        assert!(rendered.content.ends_with("..."));
    }

    proptest! {
        #[test]
        fn prop_truncate_keeps_prefix(text in "\\PC{0,600}") {
            let out = truncate_preview(&text, PREVIEW_CHARS);
            let len = text.chars().count();
            if len <= PREVIEW_CHARS {
                prop_assert_eq!(out, text);
            } else {
                let kept = out.strip_suffix("...").unwrap();
                prop_assert_eq!(kept.chars().count(), PREVIEW_CHARS);
                prop_assert!(text.starts_with(kept));
            }
        }
    }
}
