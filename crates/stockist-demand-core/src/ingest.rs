//! Parsing of backend reference-data responses.
//!
//! `GET /api/medicine` and `GET /api/stockist` both answer `{ "data": [...] }`.
//! A failed fetch or a malformed body degrades to an empty collection; the
//! resolver then routes every line to the unmatched group.

use serde_json::Value;

use crate::models::{Medicine, Stockist};

/// Reference snapshots for one resolution pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceData {
    pub medicines: Vec<Medicine>,
    pub stockists: Vec<Stockist>,
}

impl ReferenceData {
    /// Build from raw response bodies. `None` means the fetch failed.
    pub fn from_responses(medicine_body: Option<&str>, stockist_body: Option<&str>) -> Self {
        Self {
            medicines: parse_collection(medicine_body, "medicine"),
            stockists: parse_collection(stockist_body, "stockist"),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.medicines.is_empty() && self.stockists.is_empty()
    }
}

/// Parse a `{data: [...]}` body (or a bare array) into records, leniently.
pub fn parse_collection<T: From<Value>>(body: Option<&str>, what: &str) -> Vec<T> {
    let Some(body) = body else {
        tracing::warn!(collection = what, "no response body; using empty collection");
        return Vec::new();
    };

    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(collection = what, error = %e, "malformed response body; using empty collection");
            return Vec::new();
        }
    };

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("data") {
            Some(Value::Array(items)) => items,
            Some(_) => {
                tracing::warn!(collection = what, "response `data` is not an array; using empty collection");
                return Vec::new();
            }
            None => {
                tracing::warn!(collection = what, "response has no `data` key; using empty collection");
                return Vec::new();
            }
        },
        _ => {
            tracing::warn!(collection = what, "unexpected response shape; using empty collection");
            return Vec::new();
        }
    };

    items.into_iter().map(T::from).collect()
}
