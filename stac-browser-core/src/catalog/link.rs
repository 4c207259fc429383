//! Catalog hyperlinks

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A `{rel, href, title}` link record from a catalog document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    #[serde(default)]
    pub rel: String,

    #[serde(default)]
    pub href: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Link {
    /// Build a link from a JSON record, tolerating missing fields
    pub fn from_json(value: &Value) -> Self {
        let field = |name: &str| value.get(name).and_then(Value::as_str).map(str::to_string);

        Self {
            rel: field("rel").unwrap_or_default(),
            href: field("href").unwrap_or_default(),
            title: field("title"),
        }
    }
}
