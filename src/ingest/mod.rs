// src/ingest/mod.rs
//! Normalization layer: payload unwrappers, the field extractor, the canonical
//! item and one adapter per third-party source.

pub mod extract;
pub mod providers;
pub mod types;
pub mod unwrap;
pub mod upstream;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{GatewayError, Result};
use crate::ingest::types::CanonicalItem;

/// Upper bound on items any adapter returns.
pub const MAX_ITEMS: usize = 10;

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("upstream_requests_total", "Upstream calls issued, per source.");
        describe_counter!(
            "upstream_errors_total",
            "Upstream calls that failed, per source and error kind."
        );
        describe_counter!("items_emitted_total", "Canonical items returned, per source.");
        describe_histogram!("upstream_fetch_ms", "Upstream round trip in milliseconds.");
        describe_gauge!(
            "gateway_cache_max_age_secs",
            "max-age advertised in the Cache-Control header."
        );
    });
}

/// How a located collection holds its items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// JSON array. A lone object counts as a one-item list (last.fm collapses
    /// single-entry charts that way).
    List,
    /// Object keyed by id; items are its values in document order.
    Keyed,
}

/// Decode each element of `collection` into the adapter's raw schema `T`,
/// map it, and keep at most [`MAX_ITEMS`].
///
/// A collection that was not found yields an empty result. An element that
/// does not fit `T` is a payload error. The mapper also gets the raw element
/// so it can pull optional nested fields through the extractor.
pub fn map_items<T, F>(
    provider: &'static str,
    collection: Option<&Value>,
    shape: Shape,
    mut map: F,
) -> Result<Vec<CanonicalItem>>
where
    T: DeserializeOwned,
    F: FnMut(T, &Value) -> CanonicalItem,
{
    let elements: Vec<&Value> = match (shape, collection) {
        (_, None) => return Ok(Vec::new()),
        (Shape::List, Some(Value::Array(items))) => items.iter().collect(),
        (Shape::List, Some(single @ Value::Object(_))) => vec![single],
        (Shape::Keyed, Some(Value::Object(by_id))) => by_id.values().collect(),
        (_, Some(other)) => {
            return Err(GatewayError::payload(
                provider,
                format!("expected a {shape:?} collection, got {}", type_name(other)),
            ))
        }
    };

    let mut out = Vec::with_capacity(elements.len().min(MAX_ITEMS));
    for el in elements.into_iter().take(MAX_ITEMS) {
        let raw = T::deserialize(el).map_err(|e| GatewayError::payload(provider, e))?;
        out.push(map(raw, el));
    }

    counter!("items_emitted_total", "source" => provider).increment(out.len() as u64);
    Ok(out)
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
