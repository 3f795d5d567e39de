//! Alias-aware field lookups over loosely-typed backend records.
//!
//! The same relation shows up under different keys depending on which form
//! created the record (`name` vs `medicineName`, `seller` vs `supplier`, ...).
//! Every lookup here walks an explicit ordered list of keys and takes the
//! first usable value.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::{Medicine, Stockist};

/// Label used when a stockist has neither a name nor an id.
pub const UNKNOWN_STOCKIST: &str = "unknown stockist";

/// Ordered alias keys for every field the resolver reads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FieldAliases {
    pub medicine_name: Vec<String>,
    pub stockist_name: Vec<String>,
    pub id: Vec<String>,
    pub phone: Vec<String>,
    /// Stockist keys holding lists of medicine names
    pub inventory: Vec<String>,
    /// Medicine keys holding lists of stockist references
    pub reference_lists: Vec<String>,
    /// Medicine keys holding a single stockist reference
    pub reference_singular: Vec<String>,
}

fn keys(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for FieldAliases {
    fn default() -> Self {
        Self {
            medicine_name: keys(&["name", "medicineName", "title", "displayName", "brandName"]),
            stockist_name: keys(&["title", "name"]),
            id: keys(&["_id", "id"]),
            phone: keys(&["phone", "phoneNumber", "contact"]),
            inventory: keys(&["medicines", "inventory", "medicineNames"]),
            reference_lists: keys(&["stockists"]),
            reference_singular: keys(&["stockist", "seller", "vendor", "supplier"]),
        }
    }
}

/// Render a scalar as an id-like string. Blank strings count as absent.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First key whose value is a non-blank string (or a number).
pub fn first_present(record: &Map<String, Value>, keys: &[String]) -> Option<String> {
    keys.iter()
        .filter_map(|key| record.get(key))
        .find_map(scalar_text)
}

pub fn record_id(record: &Map<String, Value>, aliases: &FieldAliases) -> Option<String> {
    first_present(record, &aliases.id)
}

pub fn medicine_name(medicine: &Medicine, aliases: &FieldAliases) -> Option<String> {
    first_present(medicine.fields(), &aliases.medicine_name)
}

pub fn stockist_name(stockist: &Stockist, aliases: &FieldAliases) -> Option<String> {
    first_present(stockist.fields(), &aliases.stockist_name)
}

pub fn stockist_phone(stockist: &Stockist, aliases: &FieldAliases) -> Option<String> {
    first_present(stockist.fields(), &aliases.phone)
}

/// Group key for a stockist: display name, then raw id.
pub fn stockist_label(stockist: &Stockist, aliases: &FieldAliases) -> String {
    stockist_name(stockist, aliases)
        .or_else(|| record_id(stockist.fields(), aliases))
        .unwrap_or_else(|| UNKNOWN_STOCKIST.to_string())
}

fn collect_reference(value: &Value, aliases: &FieldAliases, out: &mut Vec<String>) {
    match value {
        Value::Array(items) => {
            for item in items {
                // nested arrays are not a shape the backend produces
                if !item.is_array() {
                    collect_reference(item, aliases, out);
                }
            }
        }
        Value::Object(obj) => {
            if let Some(id) = record_id(obj, aliases) {
                out.push(id);
            }
        }
        other => {
            if let Some(id) = scalar_text(other) {
                out.push(id);
            }
        }
    }
}

/// Candidate stockist ids referenced by a medicine record, in key order, de-duplicated.
pub fn reference_ids(medicine: &Medicine, aliases: &FieldAliases) -> Vec<String> {
    let mut ids = Vec::new();
    for key in aliases
        .reference_lists
        .iter()
        .chain(aliases.reference_singular.iter())
    {
        if let Some(value) = medicine.get(key) {
            collect_reference(value, aliases, &mut ids);
        }
    }

    let mut seen = std::collections::HashSet::new();
    ids.retain(|id| seen.insert(id.clone()));
    ids
}

/// Medicine names a stockist lists in its inventory.
pub fn inventory_names(stockist: &Stockist, aliases: &FieldAliases) -> Vec<String> {
    let mut names = Vec::new();
    for key in &aliases.inventory {
        match stockist.get(key) {
            Some(Value::Array(items)) => {
                for item in items {
                    let name = match item {
                        Value::Object(obj) => first_present(obj, &aliases.medicine_name),
                        other => scalar_text(other),
                    };
                    names.extend(name);
                }
            }
            Some(other) => names.extend(scalar_text(other)),
            None => {}
        }
    }
    names
}
