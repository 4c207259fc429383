//! Paginated item search against a fake backend

mod common;

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Mutex;

use common::{FakeClient, API_HREF};
use stac_browser_core::catalog::{Api, Collection, ItemSearch, Rectangle, TimePeriod};
use stac_browser_core::StacError;

fn search_url() -> String {
    format!("{API_HREF}/stac/search")
}

fn search() -> ItemSearch {
    let collections = vec![Collection::new(API_HREF, json!({ "id": "landsat-8-l1" }))];
    let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    ItemSearch::new(&collections, TimePeriod::instant(start))
}

fn item_ids(items: &[serde_json::Value]) -> Vec<String> {
    items
        .iter()
        .map(|item| item["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_stops_on_short_page() {
    let client = FakeClient::new().with_search_pages(&search_url(), &[50, 50, 30]);
    let api = Api::new(API_HREF);

    let items = api.search_items(&client, &search(), None).await.unwrap();

    assert_eq!(items.len(), 130);
    assert_eq!(client.requests().len(), 3);

    let pages: Vec<_> = client
        .requests()
        .iter()
        .map(|(_, body)| body.as_ref().unwrap()["page"].clone())
        .collect();
    assert_eq!(pages, vec![json!(1), json!(2), json!(3)]);
}

#[tokio::test]
async fn test_full_last_page_costs_one_empty_request() {
    let client = FakeClient::new().with_search_pages(&search_url(), &[50, 50, 50, 0]);
    let api = Api::new(API_HREF);

    let items = api.search_items(&client, &search(), None).await.unwrap();

    assert_eq!(items.len(), 150);
    assert_eq!(client.requests().len(), 4);
}

#[tokio::test]
async fn test_items_keep_page_order() {
    let client = FakeClient::new().with_search_pages(&search_url(), &[2, 2, 1]);
    let api = Api::new(API_HREF);

    let items = api
        .search_items(&client, &search().with_limit(2), None)
        .await
        .unwrap();

    assert_eq!(
        item_ids(&items),
        vec!["item-0", "item-1", "item-2", "item-3", "item-4"]
    );
}

#[tokio::test]
async fn test_hook_called_before_every_page() {
    let client = FakeClient::new().with_search_pages(&search_url(), &[50, 50, 30]);
    let api = Api::new(API_HREF);
    let calls = Mutex::new(Vec::new());

    let hook = |api: &Api, page: u32| {
        calls.lock().unwrap().push((api.href().to_string(), page));
    };
    api.search_items(&client, &search(), Some(&hook))
        .await
        .unwrap();

    assert_eq!(
        calls.into_inner().unwrap(),
        vec![
            (API_HREF.to_string(), 1),
            (API_HREF.to_string(), 2),
            (API_HREF.to_string(), 3),
        ]
    );
}

#[tokio::test]
async fn test_request_body_with_instant() {
    let client = FakeClient::new();
    let api = Api::new(API_HREF);

    let search = search().with_extent(Some(Rectangle::new(-120.5, 35.0, -119.0, 36.25)));
    let items = api.search_items(&client, &search, None).await.unwrap();
    assert!(items.is_empty());

    let requests = client.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].0, search_url());
    assert_eq!(
        requests[0].1,
        Some(json!({
            "collections": ["landsat-8-l1"],
            "bbox": [-120.5, 35.0, -119.0, 36.25],
            "time": "2020-01-01T00:00:00Z",
            "page": 1,
            "limit": 50,
        }))
    );
}

#[tokio::test]
async fn test_request_body_with_interval() {
    let client = FakeClient::new();
    let api = Api::new(API_HREF);

    let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2020, 2, 15, 23, 59, 59).unwrap();
    let mut search = search();
    search.period = TimePeriod::new(start, Some(end));

    api.search_items(&client, &search, None).await.unwrap();

    let body = client.requests()[0].1.clone().unwrap();
    assert_eq!(body["time"], json!("2020-01-01T00:00:00Z/2020-02-15T23:59:59Z"));
}

#[tokio::test]
async fn test_starts_from_requested_page() {
    let client = FakeClient::new().with_search_pages(&search_url(), &[10]);
    let api = Api::new(API_HREF);

    let items = api
        .search_items(&client, &search().with_page(4), None)
        .await
        .unwrap();

    assert_eq!(items.len(), 10);
    assert_eq!(client.requests()[0].1.as_ref().unwrap()["page"], json!(4));
}

#[tokio::test]
async fn test_zero_limit_fetches_one_page() {
    let client = FakeClient::new().with_search_pages(&search_url(), &[3, 3]);
    let api = Api::new(API_HREF);

    let items = api
        .search_items(&client, &search().with_limit(0), None)
        .await
        .unwrap();

    assert_eq!(items.len(), 3);
    assert_eq!(client.requests().len(), 1);
}

#[tokio::test]
async fn test_request_failure_propagates() {
    let client = FakeClient::new().with_failure(&search_url());
    let api = Api::new(API_HREF);

    let err = api.search_items(&client, &search(), None).await.unwrap_err();
    assert!(matches!(err, StacError::RequestFailed { ref url, .. } if url == &search_url()));
}
