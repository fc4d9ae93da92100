//! The document payload and search engine behind the listing page's search
//! box. The generator embeds a JSON array of [`Document`]s into every index
//! page (and writes the same array to `search.json`); the listing loads
//! that payload once per page view and narrows it with [`search`] as the
//! visitor types. Every failure path here degrades to "no documents" --
//! a page rendered without a payload gets a quiet no-op, never an error.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

/// A searchable record: one blog post as it appears in the embedded search
/// payload. The full document set is loaded once per page view and never
/// mutated.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub description: String,
    pub body: String,
    pub tags: Vec<String>,
}

/// Loads the document payload. The in-memory `primary` source wins when it
/// holds a JSON array; otherwise the `embedded` blob is parsed. A payload
/// that is absent, unparsable, or not an array yields the empty document
/// set. The two sources exist because the data may be injected either way
/// depending on how the page was rendered.
pub fn load_payload(primary: Option<&Value>, embedded: Option<&str>) -> Vec<Document> {
    if let Some(documents) = primary.and_then(documents_from_value) {
        return documents;
    }
    match embedded.map(serde_json::from_str::<Value>) {
        Some(Ok(value)) => documents_from_value(&value).unwrap_or_default(),
        _ => Vec::new(),
    }
}

fn documents_from_value(value: &Value) -> Option<Vec<Document>> {
    let items = value.as_array()?;
    Some(items.iter().filter_map(document_from_value).collect())
}

// An item with no string `id` is dropped; it could never bind to a card.
// Every other field defaults to empty when missing or of the wrong shape.
fn document_from_value(item: &Value) -> Option<Document> {
    let id = item.get("id")?.as_str()?;
    Some(Document {
        id: id.to_owned(),
        title: string_field(item, "title"),
        description: string_field(item, "description"),
        body: string_field(item, "body"),
        tags: tags_field(item),
    })
}

fn string_field(item: &Value, key: &str) -> String {
    match item.get(key).and_then(Value::as_str) {
        Some(text) => text.to_owned(),
        None => String::new(),
    }
}

// A `tags` value that isn't an array counts as the empty tag list;
// non-string entries within an array are skipped.
fn tags_field(item: &Value) -> Vec<String> {
    match item.get("tags").and_then(Value::as_array) {
        Some(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect(),
        None => Vec::new(),
    }
}

/// Canonicalizes text for case-insensitive comparison. Applied identically
/// to query text, document fields, and tags, so matching stays symmetric.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
}

/// Narrows `documents` to the set of ids matching `query`. Returns `None`
/// -- the "no filter" sentinel, distinct from an empty result set -- when
/// the trimmed query is empty: an empty query means "show everything,
/// subject to the tag filter", while a non-empty query with zero matches
/// means "show nothing". A document matches when the normalized query is a
/// substring of its normalized title, description, or body, or of any of
/// its normalized tags. One linear scan, no ranking; the result is an
/// unordered id set.
pub fn search(documents: &[Document], query: &str) -> Option<HashSet<String>> {
    let needle = normalize(query.trim());
    if needle.is_empty() {
        return None;
    }
    Some(
        documents
            .iter()
            .filter(|document| document.matches(&needle))
            .map(|document| document.id.clone())
            .collect(),
    )
}

impl Document {
    // `needle` must already be normalized.
    fn matches(&self, needle: &str) -> bool {
        [&self.title, &self.description, &self.body]
            .iter()
            .any(|field| normalize(field).contains(needle))
            || self.tags.iter().any(|tag| normalize(tag).contains(needle))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn document(id: &str, title: &str, tags: &[&str]) -> Document {
        Document {
            id: id.to_owned(),
            title: title.to_owned(),
            description: format!("Notes on {}", title),
            body: format!("A longer treatment of {}.", title),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn documents() -> Vec<Document> {
        vec![
            document("a", "Rust Basics", &["rust", "systems"]),
            document("b", "Go Routines", &["go", "concurrency"]),
        ]
    }

    fn ids(result: Option<HashSet<String>>) -> Vec<String> {
        let mut ids: Vec<String> = result.expect("wanted a result set").into_iter().collect();
        ids.sort();
        ids
    }

    #[test]
    fn test_empty_query_is_no_filter() {
        assert_eq!(None, search(&documents(), ""));
    }

    #[test]
    fn test_whitespace_query_is_no_filter() {
        assert_eq!(None, search(&documents(), "  \t "));
    }

    #[test]
    fn test_zero_matches_is_empty_set_not_no_filter() {
        let result = search(&documents(), "quantum");
        assert_eq!(Some(HashSet::new()), result);
    }

    #[test]
    fn test_matches_title() {
        assert_eq!(vec!["a"], ids(search(&documents(), "rust basics")));
    }

    #[test]
    fn test_matches_description() {
        assert_eq!(vec!["b"], ids(search(&documents(), "notes on go")));
    }

    #[test]
    fn test_matches_body() {
        assert_eq!(vec!["a"], ids(search(&documents(), "treatment of rust")));
    }

    #[test]
    fn test_matches_tag() {
        assert_eq!(vec!["b"], ids(search(&documents(), "concurrency")));
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(
            search(&documents(), "HELLO"),
            search(&documents(), "hello")
        );
        assert_eq!(vec!["a"], ids(search(&documents(), "RUST BAS")));
    }

    #[test]
    fn test_query_is_trimmed() {
        assert_eq!(vec!["a"], ids(search(&documents(), "  rust basics ")));
    }

    #[test]
    fn test_search_is_pure() {
        let documents = documents();
        let first = search(&documents, "go");
        let second = search(&documents, "go");
        assert_eq!(first, second);
        assert_eq!("Rust Basics", documents[0].title);
    }

    #[test]
    fn test_load_payload_primary_wins() {
        let primary = json!([{"id": "a", "title": "From Primary"}]);
        let loaded = load_payload(Some(&primary), Some(r#"[{"id": "b"}]"#));
        assert_eq!(1, loaded.len());
        assert_eq!("a", loaded[0].id);
        assert_eq!("From Primary", loaded[0].title);
    }

    #[test]
    fn test_load_payload_primary_not_array_falls_back() {
        let primary = json!({"posts": []});
        let loaded = load_payload(Some(&primary), Some(r#"[{"id": "b"}]"#));
        assert_eq!(1, loaded.len());
        assert_eq!("b", loaded[0].id);
    }

    #[test]
    fn test_load_payload_absent() {
        assert!(load_payload(None, None).is_empty());
    }

    #[test]
    fn test_load_payload_malformed_blob() {
        assert!(load_payload(None, Some("{not json")).is_empty());
    }

    #[test]
    fn test_load_payload_non_array_blob() {
        assert!(load_payload(None, Some(r#"{"id": "a"}"#)).is_empty());
    }

    #[test]
    fn test_load_payload_lenient_items() {
        let blob = r#"[
            {"id": "a", "title": 7, "tags": "not-an-array"},
            {"title": "no id"},
            {"id": "b", "tags": ["go", 3]}
        ]"#;
        let loaded = load_payload(None, Some(blob));
        assert_eq!(2, loaded.len());
        assert_eq!("a", loaded[0].id);
        assert_eq!("", loaded[0].title);
        assert!(loaded[0].tags.is_empty());
        assert_eq!(vec!["go".to_owned()], loaded[1].tags);
    }
}
