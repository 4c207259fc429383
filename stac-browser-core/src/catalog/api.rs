//! STAC API (catalog root) resolution and paginated item search

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use std::cmp::Ordering;
use tracing::{debug, info, warn};
use url::{ParseError, Url};

use super::{Collection, Item, ItemSearch, Link, SearchResult};
use crate::error::Result;
use crate::http::HttpClient;

static COLLECTION_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/collections/([^/]*)/?$").expect("collection path pattern is valid"));

/// Base that relative links are resolved against before matching
static RELATIVE_BASE: Lazy<Url> =
    Lazy::new(|| Url::parse("http://relative.invalid/").expect("relative base is a valid URL"));

/// Progress hook called with the API and page number before each page request
pub type PageHook<'a> = dyn Fn(&Api, u32) + Send + Sync + 'a;

/// Extract `<id>` from an href whose path ends in `/collections/<id>`
///
/// Only the path component is considered, so query strings and fragments
/// never leak into the id. One trailing slash is allowed and an empty id
/// still matches.
pub fn collection_id_from_href(href: &str) -> Option<String> {
    let path = href_path(href)?;
    COLLECTION_PATH
        .captures(&path)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn href_path(href: &str) -> Option<String> {
    let url = match Url::parse(href) {
        Ok(url) => url,
        Err(ParseError::RelativeUrlWithoutBase) => RELATIVE_BASE.join(href).ok()?,
        Err(e) => {
            debug!("Ignoring unparseable link '{}': {}", href, e);
            return None;
        }
    };
    Some(url.path().to_string())
}

/// One STAC-compatible server endpoint
#[derive(Debug, Clone)]
pub struct Api {
    href: String,
    data: Option<Value>,
    collections: Vec<Collection>,
}

impl Api {
    /// A lazy catalog; call [`Api::load`] to resolve it
    pub fn new(href: impl Into<String>) -> Self {
        let href: String = href.into();
        Self {
            href: href.trim_end_matches('/').to_string(),
            data: None,
            collections: Vec::new(),
        }
    }

    /// A hydrated catalog from `{href, data, collections}`
    ///
    /// Missing or mistyped fields degrade to empty values.
    pub fn from_json(json: &Value) -> Self {
        let mut api = Self::new(json.get("href").and_then(Value::as_str).unwrap_or_default());

        api.data = json.get("data").filter(|d| !d.is_null()).cloned();
        api.collections = json
            .get("collections")
            .and_then(Value::as_array)
            .map(|collections| {
                collections
                    .iter()
                    .map(|c| Collection::new(api.href.clone(), c.clone()))
                    .collect()
            })
            .unwrap_or_default();

        api
    }

    /// Hydrated form, suitable for [`Api::from_json`]
    pub fn to_json(&self) -> Value {
        json!({
            "href": self.href,
            "data": self.data,
            "collections": self.collections.iter().map(Collection::to_json).collect::<Vec<_>>(),
        })
    }

    pub fn href(&self) -> &str {
        &self.href
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn title(&self) -> Option<&str> {
        self.data.as_ref()?.get("title")?.as_str()
    }

    pub fn links(&self) -> Vec<Link> {
        self.data
            .as_ref()
            .and_then(|d| d.get("links"))
            .and_then(Value::as_array)
            .map(|links| links.iter().map(Link::from_json).collect())
            .unwrap_or_default()
    }

    /// Ids of every link pointing at a collection, in link order
    ///
    /// Links of other shapes are skipped; duplicates are kept.
    pub fn collection_ids(&self) -> Vec<String> {
        self.links()
            .iter()
            .filter_map(|link| collection_id_from_href(&link.href))
            .collect()
    }

    pub fn collections(&self) -> &[Collection] {
        &self.collections
    }

    pub fn collection(&self, id: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.id() == Some(id))
    }

    /// Case-insensitive title ordering
    pub fn cmp_title(&self, other: &Self) -> Ordering {
        let key = |api: &Self| api.title().unwrap_or_default().to_lowercase();
        key(self).cmp(&key(other))
    }

    /// Fetch the root document and every collection it links to
    ///
    /// Replaces both the raw data and the collection list. Request
    /// failures propagate; there is no partial-catalog recovery here.
    pub async fn load(&mut self, client: &dyn HttpClient) -> Result<()> {
        self.data = Some(client.request(&format!("{}/stac", self.href), None).await?);

        let mut collections = Vec::new();
        for id in self.collection_ids() {
            collections.push(self.load_collection(client, &id).await?);
        }

        debug!(
            "Loaded {} collections from {}",
            collections.len(),
            self.href
        );
        self.collections = collections;
        Ok(())
    }

    pub async fn load_collection(&self, client: &dyn HttpClient, id: &str) -> Result<Collection> {
        let data = client
            .request(&format!("{}/collections/{}", self.href, id), None)
            .await?;
        Ok(Collection::new(self.href.clone(), data))
    }

    /// Run a paginated item search, concatenating every page in order
    ///
    /// A page holding at least `limit` items means another page may
    /// follow. Compatibility note: when the last real page holds exactly
    /// `limit` items, one further request returns nothing before the
    /// search stops. Existing servers rely on this, so it is kept.
    pub async fn search_items(
        &self,
        client: &dyn HttpClient,
        search: &ItemSearch,
        on_next_page: Option<&PageHook<'_>>,
    ) -> Result<Vec<Item>> {
        let url = format!("{}/stac/search", self.href);
        let mut items = Vec::new();
        let mut page = search.page;

        loop {
            if let Some(hook) = on_next_page {
                hook(self, page);
            }

            let body = search.body(page);
            let result = SearchResult::new(self.href.clone(), client.request(&url, Some(&body)).await?);
            let page_items = result.into_items();
            let count = page_items.len();
            items.extend(page_items);

            debug!("Search page {} from {} returned {} items", page, self.href, count);

            // A zero limit would never produce a short page.
            if search.limit == 0 || count < search.limit as usize {
                break;
            }
            page += 1;
        }

        info!("Search on {} returned {} items", self.href, items.len());
        Ok(items)
    }
}

/// Load every API in order, skipping the ones that fail
pub async fn load_apis(client: &dyn HttpClient, hrefs: &[String]) -> Vec<Api> {
    let mut apis = Vec::with_capacity(hrefs.len());

    for href in hrefs {
        let mut api = Api::new(href.as_str());
        match api.load(client).await {
            Ok(()) => {
                debug!(
                    "Loaded API '{}': {} collections",
                    api.title().unwrap_or(href),
                    api.collections().len()
                );
                apis.push(api);
            }
            Err(e) => {
                warn!("Failed to load API '{}': {}", href, e);
            }
        }
    }

    apis
}
