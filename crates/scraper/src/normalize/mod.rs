//! Response normalization.
//!
//! Turns a [`RawResponse`] into a [`ScrapeResult`]:
//! - XML listings are converted to a JSON tree, coerced, and mapped onto
//!   [`CanonicalItem`]s
//! - JSON bodies are passed through as parsed values
//! - anything else (rendered HTML, plain text) is returned as text

mod coerce;
mod xml;

pub use coerce::coerce;
pub use xml::xml_to_value;

use serde_json::{Map, Value};

use crate::errors::{Result, ScrapeError};
use crate::models::{CanonicalItem, RawResponse, ScrapeResult};

const XML_DECLARATION: &str = "<?xml";

/// Normalize a successful backend response.
pub fn normalize(raw: RawResponse) -> Result<ScrapeResult> {
    if is_xml(&raw) {
        return parse_items(&raw.body).map(ScrapeResult::Items);
    }

    let trimmed = raw.body.trim_start();
    let declared_json = raw
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.contains("json"));
    let looks_json = trimmed.starts_with('{') || trimmed.starts_with('[');

    if declared_json || looks_json {
        match serde_json::from_str::<Value>(trimmed) {
            Ok(value) => return Ok(ScrapeResult::Json(value)),
            Err(e) if declared_json => return Err(e.into()),
            Err(_) => {}
        }
    }

    Ok(ScrapeResult::Text(raw.body))
}

fn is_xml(raw: &RawResponse) -> bool {
    raw.content_type
        .as_deref()
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("xml"))
        || raw.body.trim_start().starts_with(XML_DECLARATION)
}

/// Parse an XML listing into canonical items.
///
/// The item node is the only child of the document root; an array there is a
/// list of items, an object is a single item.
pub fn parse_items(xml: &str) -> Result<Vec<CanonicalItem>> {
    let document = xml_to_value(xml)?;
    let root = match document {
        Value::Object(map) => map.into_iter().next().map(|(_, value)| value),
        _ => None,
    }
    .ok_or_else(|| ScrapeError::Parse("XML document has no root element".to_string()))?;

    let node = match root {
        Value::Object(map) if map.len() == 1 => match map.into_iter().next() {
            Some((_, child @ (Value::Array(_) | Value::Object(_)))) => child,
            Some((key, scalar)) => Value::Object(Map::from_iter([(key, scalar)])),
            None => Value::Null,
        },
        other => other,
    };

    let items = match coerce(node) {
        Value::Array(values) => values,
        object @ Value::Object(_) => vec![object],
        _ => Vec::new(),
    };

    Ok(items
        .into_iter()
        .filter_map(|value| match value {
            Value::Object(fields) => Some(to_canonical(fields)),
            _ => None,
        })
        .collect())
}

/// Map coerced fields onto a [`CanonicalItem`]. Field names match
/// case-insensitively; unknown fields land in `extra`.
fn to_canonical(mut fields: Map<String, Value>) -> CanonicalItem {
    CanonicalItem {
        vendor_product_id: take(&mut fields, "vendorProductId").and_then(as_i64),
        vendor_product_code: take(&mut fields, "vendorProductCode").and_then(as_string),
        vendor_id: take(&mut fields, "vendorId").and_then(as_i64),
        vendor_name: take(&mut fields, "vendorName").and_then(as_string),
        price: take(&mut fields, "price").and_then(|v| v.as_f64()),
        shipping_charge: take(&mut fields, "shippingCharge").and_then(|v| v.as_f64()),
        free_shipping_threshold: take(&mut fields, "freeShippingThreshold")
            .and_then(|v| v.as_f64()),
        is_backordered: take(&mut fields, "isBackordered").is_some_and(is_true),
        in_stock: take(&mut fields, "inStock").is_some_and(is_true),
        extra: fields,
    }
}

fn take(fields: &mut Map<String, Value>, name: &str) -> Option<Value> {
    let key = fields
        .keys()
        .find(|key| key.eq_ignore_ascii_case(name))
        .cloned()?;
    fields.remove(&key)
}

fn as_i64(value: Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        _ => None,
    }
}

fn as_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn is_true(value: Value) -> bool {
    matches!(value, Value::Bool(true))
}
