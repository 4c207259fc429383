//! Item search requests and result pages

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{Collection, Item};
use crate::error::{Result, StacError};

/// Default page size for item search
pub const DEFAULT_LIMIT: u32 = 50;

/// Timestamp format used in the search `time` field
pub const STAC_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// A single instant or a closed interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimePeriod {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

impl TimePeriod {
    pub fn new(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    pub fn instant(start: DateTime<Utc>) -> Self {
        Self { start, end: None }
    }

    /// `START` for an instant, `START/END` for an interval
    pub fn to_query_string(&self) -> String {
        let start = self.start.format(STAC_TIME_FORMAT);
        match self.end {
            Some(end) => format!("{}/{}", start, end.format(STAC_TIME_FORMAT)),
            None => start.to_string(),
        }
    }

    /// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC)
    pub fn parse_instant(input: &str) -> Result<DateTime<Utc>> {
        let input = input.trim();

        if let Ok(parsed) = DateTime::parse_from_rfc3339(input) {
            return Ok(parsed.with_timezone(&Utc));
        }

        NaiveDate::parse_from_str(input, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
            .ok_or_else(|| StacError::InvalidTime(input.to_string()))
    }
}

/// Axis-aligned bounding rectangle of an extent layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl Rectangle {
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// `[min-x, min-y, max-x, max-y]`
    pub fn to_bbox(&self) -> Vec<f64> {
        vec![self.x_min, self.y_min, self.x_max, self.y_max]
    }
}

/// Parameters of a paginated item search against one API
#[derive(Debug, Clone, PartialEq)]
pub struct ItemSearch {
    /// Collection ids, in caller order
    pub collection_ids: Vec<String>,

    /// Empty means unscoped
    pub bbox: Vec<f64>,

    pub period: TimePeriod,

    /// First page to request
    pub page: u32,

    /// Page size; a page with fewer items ends the search
    pub limit: u32,
}

impl ItemSearch {
    pub fn new(collections: &[Collection], period: TimePeriod) -> Self {
        Self {
            collection_ids: collections
                .iter()
                .map(|c| c.id().unwrap_or_default().to_string())
                .collect(),
            bbox: Vec::new(),
            period,
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn with_extent(self, extent: Option<Rectangle>) -> Self {
        self.with_bbox(extent.map(|r| r.to_bbox()).unwrap_or_default())
    }

    pub fn with_bbox(mut self, bbox: Vec<f64>) -> Self {
        self.bbox = bbox;
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Request body for one page
    pub fn body(&self, page: u32) -> Value {
        json!({
            "collections": self.collection_ids,
            "bbox": self.bbox,
            "time": self.period.to_query_string(),
            "page": page,
            "limit": self.limit,
        })
    }
}

/// One page of search results
#[derive(Debug, Clone)]
pub struct SearchResult {
    api_href: String,
    data: Value,
}

impl SearchResult {
    pub fn new(api_href: impl Into<String>, data: Value) -> Self {
        Self {
            api_href: api_href.into(),
            data,
        }
    }

    pub fn api_href(&self) -> &str {
        &self.api_href
    }

    /// The page's `features` array, or `items` when a server uses that name
    pub fn items(&self) -> &[Item] {
        self.data
            .get("features")
            .or_else(|| self.data.get("items"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn into_items(self) -> Vec<Item> {
        let mut data = self.data;
        let items = match data.get_mut("features") {
            Some(features) => features.take(),
            None => data.get_mut("items").map(Value::take).unwrap_or_default(),
        };

        match items {
            Value::Array(items) => items,
            _ => Vec::new(),
        }
    }
}
