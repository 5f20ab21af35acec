//! In-memory JSON-like document with shareable nodes
//!
//! Index data is normally plain `serde_json::Value`, but callers assembling
//! indexes in memory may alias sub-trees through [`Document::Shared`]. Aliasing
//! makes reference cycles possible, so anything walking a `Document` must
//! track the shared nodes it is currently inside.

use parking_lot::RwLock;
use serde_json::{Number, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Handle to a node that can be referenced from several places
pub type SharedNode = Arc<RwLock<Document>>;

#[derive(Clone)]
pub enum Document {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Document>),
    Object(BTreeMap<String, Document>),
    Shared(SharedNode),
}

impl Document {
    /// Empty object
    pub fn object() -> Self {
        Document::Object(BTreeMap::new())
    }

    /// Wrap a document into a shareable node
    pub fn shared(inner: Document) -> Self {
        Document::Shared(Arc::new(RwLock::new(inner)))
    }

    /// Insert a key into an object, looking through shared handles
    ///
    /// Returns false when the target is not an object.
    pub fn insert(&mut self, key: impl Into<String>, value: Document) -> bool {
        match self {
            Document::Object(map) => {
                map.insert(key.into(), value);
                true
            }
            Document::Shared(node) => node.write().insert(key, value),
            _ => false,
        }
    }

    /// Append to an array, looking through shared handles
    pub fn push(&mut self, value: Document) -> bool {
        match self {
            Document::Array(items) => {
                items.push(value);
                true
            }
            Document::Shared(node) => node.write().push(value),
            _ => false,
        }
    }

    pub fn is_shared(&self) -> bool {
        matches!(self, Document::Shared(_))
    }

    /// Identity of a shared node, used to detect re-entry
    pub fn node_id(node: &SharedNode) -> usize {
        Arc::as_ptr(node) as *const () as usize
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Document::Null => f.write_str("Null"),
            Document::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Document::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Document::String(s) => f.debug_tuple("String").field(s).finish(),
            Document::Array(items) => f.debug_tuple("Array").field(items).finish(),
            Document::Object(map) => f.debug_tuple("Object").field(map).finish(),
            // Shared nodes may alias an ancestor; print the identity only
            Document::Shared(node) => write!(f, "Shared({:#x})", Document::node_id(node)),
        }
    }
}

impl From<Value> for Document {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Document::Null,
            Value::Bool(b) => Document::Bool(b),
            Value::Number(n) => Document::Number(n),
            Value::String(s) => Document::String(s),
            Value::Array(items) => Document::Array(items.into_iter().map(Document::from).collect()),
            Value::Object(map) => Document::Object(map.into_iter().map(|(k, v)| (k, Document::from(v))).collect()),
        }
    }
}

impl From<&str> for Document {
    fn from(value: &str) -> Self {
        Document::String(value.to_string())
    }
}
