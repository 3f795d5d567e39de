//! Resolution output models: grouped entries, debug trace and cached snapshot.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{DemandLine, Medicine};
use crate::resolver::fields::{self, FieldAliases};

/// Group key for demand lines that could not be resolved to any stockist.
pub const UNMATCHED: &str = "unmatched";

/// Placeholder medicine for matches found only by name in a stockist inventory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct NamedMedicine {
    pub name: String,
}

/// The medicine attached to a resolved entry.
///
/// `NamedOnly` serializes as exactly `{"name": ...}` with no id, which is how
/// consumers of the cached JSON tell a name-only match from a canonical one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MatchedMedicine {
    NamedOnly(NamedMedicine),
    Canonical(Medicine),
}

impl MatchedMedicine {
    pub fn named(name: impl Into<String>) -> Self {
        MatchedMedicine::NamedOnly(NamedMedicine { name: name.into() })
    }

    /// True when the medicine carries an identifier under one of the id aliases.
    pub fn has_id(&self, aliases: &FieldAliases) -> bool {
        self.id(aliases).is_some()
    }

    pub fn is_canonical(&self) -> bool {
        matches!(self, MatchedMedicine::Canonical(_))
    }

    /// Display name, read through the medicine name aliases for canonical records.
    pub fn display_name(&self, aliases: &FieldAliases) -> Option<String> {
        match self {
            MatchedMedicine::NamedOnly(named) => Some(named.name.clone()),
            MatchedMedicine::Canonical(medicine) => fields::medicine_name(medicine, aliases),
        }
    }

    /// Identifier of a canonical record.
    pub fn id(&self, aliases: &FieldAliases) -> Option<String> {
        match self {
            MatchedMedicine::NamedOnly(_) => None,
            MatchedMedicine::Canonical(medicine) => fields::record_id(medicine.fields(), aliases),
        }
    }
}

/// A single entry in a resolution group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionEntry {
    pub demand_line: DemandLine,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medicine: Option<MatchedMedicine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
}

impl ResolutionEntry {
    /// Entry for a stockist that carries the medicine. Quantity is copied from the line.
    pub fn available(line: &DemandLine, medicine: MatchedMedicine) -> Self {
        Self {
            demand_line: line.clone(),
            medicine: Some(medicine),
            available: Some(true),
            quantity: Some(line.quantity),
        }
    }

    /// Entry for the unmatched group: the demand line and nothing else.
    pub fn unmatched(line: &DemandLine) -> Self {
        Self {
            demand_line: line.clone(),
            medicine: None,
            available: None,
            quantity: None,
        }
    }
}

/// One group of the result, keyed by stockist display name or [`UNMATCHED`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionGroup {
    pub key: String,
    pub entries: Vec<ResolutionEntry>,
}

/// Insertion-ordered mapping from group key to entries.
///
/// Serializes as a JSON object whose key order is the order groups were first
/// created during the resolution pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolutionResult {
    groups: Vec<ResolutionGroup>,
}

impl ResolutionResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry to a group, creating the group at the end if needed.
    pub fn push(&mut self, key: &str, entry: ResolutionEntry) {
        self.group_mut(key).entries.push(entry);
    }

    fn group_mut(&mut self, key: &str) -> &mut ResolutionGroup {
        let idx = match self.groups.iter().position(|g| g.key == key) {
            Some(idx) => idx,
            None => {
                self.groups.push(ResolutionGroup {
                    key: key.to_string(),
                    entries: Vec::new(),
                });
                self.groups.len() - 1
            }
        };
        &mut self.groups[idx]
    }

    pub fn get(&self, key: &str) -> Option<&[ResolutionEntry]> {
        self.groups
            .iter()
            .find(|g| g.key == key)
            .map(|g| g.entries.as_slice())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolutionGroup> {
        self.groups.iter()
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Entries of the unmatched group (empty if there is none).
    pub fn unmatched(&self) -> &[ResolutionEntry] {
        self.get(UNMATCHED).unwrap_or(&[])
    }

    /// Keys of every group the given demand line appears in, in group order.
    pub fn groups_for_line(&self, line_id: &str) -> Vec<&str> {
        self.groups
            .iter()
            .filter(|g| g.entries.iter().any(|e| e.demand_line.id == line_id))
            .map(|g| g.key.as_str())
            .collect()
    }

    pub fn total_entries(&self) -> usize {
        self.groups.iter().map(|g| g.entries.len()).sum()
    }
}

impl Serialize for ResolutionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for group in &self.groups {
            map.serialize_entry(&group.key, &group.entries)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ResolutionResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct GroupsVisitor;

        impl<'de> Visitor<'de> for GroupsVisitor {
            type Value = ResolutionResult;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of group key to resolution entries")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut result = ResolutionResult::new();
                while let Some((key, entries)) =
                    access.next_entry::<String, Vec<ResolutionEntry>>()?
                {
                    result.group_mut(&key).entries.extend(entries);
                }
                Ok(result)
            }
        }

        deserializer.deserialize_map(GroupsVisitor)
    }
}

/// How the medicine search for a line concluded.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum MatchKind {
    /// Query was empty; no search attempted
    Blank,
    /// One or more display names equal the query
    Exact,
    /// No exact match; display names containing the query
    Substring,
    /// No medicine matched
    None,
}

/// Which check found a stockist available.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum AvailabilitySource {
    /// Stockist inventory lists the medicine name or id
    Inventory,
    /// Medicine record references the stockist
    Reference,
    /// Stockist inventory lists the raw query (no medicine record)
    InventoryFallback,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRecord {
    pub medicine: String,
    pub stockist: String,
    pub source: AvailabilitySource,
}

/// Diagnostic record for one demand line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TraceRecord {
    pub line_id: String,
    pub query: String,
    pub match_kind: MatchKind,
    pub matched_medicines: Vec<String>,
    pub candidate_stockists: Vec<String>,
    /// Group keys the line landed in ([`UNMATCHED`] when unresolved)
    pub assigned_to: Vec<String>,
    pub availability: Vec<AvailabilityRecord>,
    /// Closest medicine names for unmatched lines
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

/// Append-only trace of matching decisions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ResolutionTrace {
    records: Vec<TraceRecord>,
}

impl ResolutionTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: TraceRecord) {
        self.records.push(record);
    }

    pub fn extend(&mut self, other: ResolutionTrace) {
        self.records.extend(other.records);
    }

    pub fn records(&self) -> &[TraceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Output of one resolution pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub result: ResolutionResult,
    pub trace: ResolutionTrace,
}

/// Cached copy of the last resolution result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionSnapshot {
    pub groups: ResolutionResult,
    /// RFC 3339 timestamp
    pub created_at: String,
}

impl ResolutionSnapshot {
    /// Snapshot stamped with the current time.
    pub fn now(groups: ResolutionResult) -> Self {
        Self {
            groups,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
