//! Collections within a catalog

use serde_json::Value;
use std::cmp::Ordering;

/// A named dataset grouping inside one catalog
///
/// The owning catalog is referenced by href; `id` and `title` are read
/// from the raw collection document.
#[derive(Debug, Clone)]
pub struct Collection {
    api_href: String,
    data: Value,
}

impl Collection {
    pub fn new(api_href: impl Into<String>, data: Value) -> Self {
        Self {
            api_href: api_href.into(),
            data,
        }
    }

    /// Href of the catalog this collection belongs to
    pub fn api_href(&self) -> &str {
        &self.api_href
    }

    pub fn id(&self) -> Option<&str> {
        self.data.get("id").and_then(Value::as_str)
    }

    pub fn title(&self) -> Option<&str> {
        self.data.get("title").and_then(Value::as_str)
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Raw JSON, as stored in the catalog cache
    pub fn to_json(&self) -> Value {
        self.data.clone()
    }

    fn sort_key(&self) -> String {
        self.title().unwrap_or_default().to_lowercase()
    }
}

impl PartialEq for Collection {
    fn eq(&self, other: &Self) -> bool {
        self.sort_key() == other.sort_key()
    }
}

impl Eq for Collection {}

impl PartialOrd for Collection {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Collection {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}
