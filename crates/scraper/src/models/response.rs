use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Unparsed answer from a backend adapter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status of the final transport call
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, content_type: Option<String>, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type,
            body: body.into(),
        }
    }

    /// Shorthand for a 200 response without a content type.
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, None, body)
    }
}

/// Normalized vendor offer parsed from a structured listing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_product_id: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_product_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_charge: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub free_shipping_threshold: Option<f64>,

    pub is_backordered: bool,
    pub in_stock: bool,

    /// Remaining fields, already coerced
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// What a successful scrape hands back to callers.
#[derive(Clone, Debug, PartialEq)]
pub enum ScrapeResult {
    /// Structured listing converted into canonical items
    Items(Vec<CanonicalItem>),
    /// JSON payload passed through untouched
    Json(Value),
    /// Any other body (rendered HTML, plain text)
    Text(String),
}

impl ScrapeResult {
    /// Canonical items, if the payload was a structured listing.
    pub fn items(&self) -> Option<&[CanonicalItem]> {
        match self {
            Self::Items(items) => Some(items),
            _ => None,
        }
    }
}
