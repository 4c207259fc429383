//! Catalog inspection commands: list collections, search items

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::{json, Value};
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};
use tracing::info;

use stac_browser_core::catalog::{load_apis, Api, Collection, Item, ItemSearch};
use stac_browser_core::config::ConfigStore;
use stac_browser_core::http::ReqwestClient;

use crate::QueryArgs;

/// Table row for collection listings
#[derive(Tabled)]
struct CollectionRow {
    #[tabled(rename = "API")]
    api: String,
    #[tabled(rename = "Collection")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
}

/// Table row for search results
#[derive(Tabled)]
struct ItemRow {
    #[tabled(rename = "Item")]
    id: String,
    #[tabled(rename = "Collection")]
    collection: String,
    #[tabled(rename = "Datetime")]
    datetime: String,
}

fn render<T: Tabled>(rows: &[T]) -> String {
    Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .to_string()
}

fn collection_rows(apis: &[Api]) -> Vec<CollectionRow> {
    let mut rows = Vec::new();
    for api in apis {
        let api_name = api.title().unwrap_or(api.href()).to_string();

        let mut collections: Vec<&Collection> = api.collections().iter().collect();
        collections.sort();

        rows.extend(collections.into_iter().map(|collection| CollectionRow {
            api: api_name.clone(),
            id: collection.id().unwrap_or_default().to_string(),
            title: collection.title().unwrap_or_default().to_string(),
        }));
    }
    rows
}

fn item_rows(items: &[Item]) -> Vec<ItemRow> {
    let field = |item: &Value, key: &str| item[key].as_str().unwrap_or_default().to_string();

    items
        .iter()
        .map(|item| ItemRow {
            id: field(item, "id"),
            collection: field(item, "collection"),
            datetime: item["properties"]["datetime"]
                .as_str()
                .unwrap_or_default()
                .to_string(),
        })
        .collect()
}

pub async fn execute_collections(
    mut store: ConfigStore,
    api_hrefs: Vec<String>,
    refresh: bool,
    json_output: bool,
) -> Result<()> {
    let config = store.config();
    let use_configured = api_hrefs.is_empty();

    let apis = if use_configured && !refresh && config.is_fresh(Utc::now()) {
        info!("Using cached catalogs");
        config.cached_apis()
    } else {
        let hrefs = if use_configured {
            config.api_hrefs.clone()
        } else {
            api_hrefs
        };

        eprintln!("Loading {} catalog(s)...", hrefs.len());
        let client = ReqwestClient::new(config.timeout_seconds)?;
        let apis = load_apis(&client, &hrefs).await;

        // Only a complete load of the configured set is cached
        if use_configured && store.config().is_complete(&apis) {
            store.config_mut().record_apis(&apis, Utc::now());
            store.save()?;
        }
        apis
    };

    if json_output {
        let output: Vec<Value> = apis.iter().map(Api::to_json).collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let rows = collection_rows(&apis);
    if rows.is_empty() {
        println!("No collections found.");
        return Ok(());
    }

    println!("Found {} collection(s):\n", rows.len());
    println!("{}", render(&rows));
    Ok(())
}

pub async fn execute_search(
    store: &ConfigStore,
    api_href: &str,
    query: &QueryArgs,
    limit: Option<u32>,
    json_output: bool,
) -> Result<()> {
    let api = Api::new(api_href);
    let collections: Vec<Collection> = query
        .collections
        .iter()
        .map(|id| Collection::new(api.href(), json!({ "id": id })))
        .collect();

    let search = ItemSearch::new(&collections, query.time_period())
        .with_extent(query.extent())
        .with_limit(limit.unwrap_or(store.config().search_limit));

    let client = ReqwestClient::new(store.config().timeout_seconds)?;
    let progress = |api: &Api, page: u32| {
        eprintln!("Searching {} (page {})...", api.href(), page);
    };

    let items = api
        .search_items(&client, &search, Some(&progress))
        .await
        .with_context(|| format!("Search on {} failed", api.href()))?;

    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "type": "FeatureCollection",
                "features": items,
            }))?
        );
        return Ok(());
    }

    if items.is_empty() {
        println!("No items found.");
        return Ok(());
    }

    println!("Found {} item(s):\n", items.len());
    println!("{}", render(&item_rows(&items)));
    Ok(())
}
