//! Link extraction.
//!
//! Objects reference other objects by hash. Which fields carry those
//! references depends on the object's shape, so extraction is a table of
//! [`LinkPattern`] handlers: the first pattern that recognises a payload
//! decides its links.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use hashmesh_types::ContentHash;
use serde_json::Value;
use tracing::debug;

/// Handler for one payload shape.
#[async_trait]
pub trait LinkPattern: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Returns `true` if `payload` has the shape this pattern handles.
    fn recognize(&self, payload: &Value) -> bool;

    /// Hashes referenced by `payload`.
    ///
    /// Only called on payloads this pattern recognised. Async because some
    /// shapes resolve their links through an external query.
    async fn links(&self, payload: &Value) -> Vec<ContentHash>;
}

/// Ordered table of link patterns.
#[derive(Clone, Default)]
pub struct PatternRegistry {
    patterns: Vec<Arc<dyn LinkPattern>>,
}

impl PatternRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pattern. Earlier registrations take precedence.
    pub fn register(&mut self, pattern: Arc<dyn LinkPattern>) -> &mut Self {
        self.patterns.push(pattern);
        self
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, pattern: Arc<dyn LinkPattern>) -> Self {
        self.patterns.push(pattern);
        self
    }

    /// First pattern recognising `payload`.
    pub fn recognize(&self, payload: &Value) -> Option<&Arc<dyn LinkPattern>> {
        self.patterns.iter().find(|p| p.recognize(payload))
    }

    /// Links of `payload` according to its first recognising pattern.
    /// Unrecognised payloads have no links.
    pub async fn links(&self, payload: &Value) -> Vec<ContentHash> {
        match self.recognize(payload) {
            Some(pattern) => {
                let links = pattern.links(payload).await;
                debug!(pattern = pattern.name(), links = links.len(), "extracted links");
                links
            }
            None => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl fmt::Debug for PatternRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.patterns.iter().map(|p| p.name()).collect();
        f.debug_struct("PatternRegistry")
            .field("patterns", &names)
            .finish()
    }
}

/// Pattern for objects that list their children in one field.
///
/// Recognises JSON objects carrying every `required` property, and reads
/// links from `field`, which may hold a single hash string or an array of
/// them. Entries that are not valid hashes are skipped.
#[derive(Clone, Debug)]
pub struct FieldLinks {
    name: String,
    required: Vec<String>,
    field: String,
}

impl FieldLinks {
    pub fn new(name: impl Into<String>, required: &[&str], field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: required.iter().map(|s| s.to_string()).collect(),
            field: field.into(),
        }
    }

    /// Document text nodes: `{ "text", "type", "links": [hash, ...] }`.
    pub fn text_node() -> Self {
        Self::new("text-node", &["text", "type", "links"], "links")
    }
}

#[async_trait]
impl LinkPattern for FieldLinks {
    fn name(&self) -> &str {
        &self.name
    }

    fn recognize(&self, payload: &Value) -> bool {
        match payload.as_object() {
            Some(map) => {
                map.contains_key(&self.field) && self.required.iter().all(|p| map.contains_key(p))
            }
            None => false,
        }
    }

    async fn links(&self, payload: &Value) -> Vec<ContentHash> {
        let parse = |v: &Value| v.as_str().and_then(|s| ContentHash::new(s).ok());
        match payload.get(&self.field) {
            Some(Value::Array(items)) => items.iter().filter_map(parse).collect(),
            Some(v @ Value::String(_)) => parse(v).into_iter().collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn h(s: &str) -> ContentHash {
        ContentHash::new(s).unwrap()
    }

    #[tokio::test]
    async fn text_node_links() {
        let registry = PatternRegistry::new().with(Arc::new(FieldLinks::text_node()));
        let node = json!({"text": "root", "type": "title", "links": ["c1", "c2"]});
        assert_eq!(registry.links(&node).await, vec![h("c1"), h("c2")]);
    }

    #[tokio::test]
    async fn single_string_field() {
        let head = FieldLinks::new("perspective", &["origin"], "head");
        let registry = PatternRegistry::new().with(Arc::new(head));
        let p = json!({"origin": "local", "head": "commit1"});
        assert_eq!(registry.links(&p).await, vec![h("commit1")]);
    }

    #[tokio::test]
    async fn unrecognised_payload_has_no_links() {
        let registry = PatternRegistry::new().with(Arc::new(FieldLinks::text_node()));
        assert!(registry.links(&json!({"text": "no links field"})).await.is_empty());
        assert!(registry.links(&json!("scalar")).await.is_empty());
        assert!(PatternRegistry::new().links(&json!({"links": ["x"]})).await.is_empty());
    }

    #[tokio::test]
    async fn invalid_entries_are_skipped() {
        let registry = PatternRegistry::new().with(Arc::new(FieldLinks::text_node()));
        let node = json!({"text": "", "type": "p", "links": ["ok", "", 7, "has space"]});
        assert_eq!(registry.links(&node).await, vec![h("ok")]);
    }

    #[tokio::test]
    async fn first_registered_pattern_wins() {
        let registry = PatternRegistry::new()
            .with(Arc::new(FieldLinks::new("children", &[], "children")))
            .with(Arc::new(FieldLinks::new("links", &[], "links")));
        let both = json!({"children": ["a"], "links": ["b"]});
        assert_eq!(registry.recognize(&both).unwrap().name(), "children");
        assert_eq!(registry.links(&both).await, vec![h("a")]);
    }

    #[test]
    fn register_in_place() {
        let mut registry = PatternRegistry::new();
        assert!(registry.is_empty());
        registry.register(Arc::new(FieldLinks::text_node()));
        assert_eq!(registry.len(), 1);
        assert!(format!("{registry:?}").contains("text-node"));
    }
}
