//! Medicine search and stockist availability checks.
//!
//! Search policy is exact-first: when any display name equals the query,
//! substring matches for that query are ignored entirely.

use strsim::{jaro_winkler, normalized_levenshtein};

use crate::models::{AvailabilitySource, MatchKind, Medicine, Stockist};

use super::fields::{self, FieldAliases};

/// Candidate medicines for one query.
#[derive(Debug, Clone)]
pub struct MedicineSearch<'a> {
    pub kind: MatchKind,
    pub candidates: Vec<&'a Medicine>,
}

/// Exact-first medicine search over a read-only snapshot.
pub struct MedicineMatcher<'a> {
    medicines: &'a [Medicine],
    /// Display names as stored, parallel to `medicines`
    display: Vec<Option<String>>,
    /// Lower-cased `display`, used for matching
    names: Vec<Option<String>>,
}

impl<'a> MedicineMatcher<'a> {
    pub fn new(medicines: &'a [Medicine], aliases: &FieldAliases) -> Self {
        let display: Vec<Option<String>> = medicines
            .iter()
            .map(|m| fields::medicine_name(m, aliases))
            .collect();
        let names = display
            .iter()
            .map(|name| name.as_ref().map(|n| n.to_lowercase()))
            .collect();
        Self {
            medicines,
            display,
            names,
        }
    }

    /// Search by lower-cased, trimmed query.
    pub fn search(&self, query: &str) -> MedicineSearch<'a> {
        if query.is_empty() {
            return MedicineSearch {
                kind: MatchKind::Blank,
                candidates: Vec::new(),
            };
        }

        let exact = self.collect(|name| name == query);
        if !exact.is_empty() {
            return MedicineSearch {
                kind: MatchKind::Exact,
                candidates: exact,
            };
        }

        // no exact match exists, so this set is disjoint from the exact one
        let partial = self.collect(|name| name.contains(query));
        let kind = if partial.is_empty() {
            MatchKind::None
        } else {
            MatchKind::Substring
        };
        MedicineSearch {
            kind,
            candidates: partial,
        }
    }

    fn collect(&self, pred: impl Fn(&str) -> bool) -> Vec<&'a Medicine> {
        let medicines = self.medicines;
        self.names
            .iter()
            .enumerate()
            .filter(|(_, name)| name.as_deref().is_some_and(&pred))
            .map(|(idx, _)| &medicines[idx])
            .collect()
    }

    /// Closest display names for a query that matched nothing, best first.
    pub fn suggest(&self, query: &str, limit: usize, threshold: f64) -> Vec<String> {
        if query.is_empty() || limit == 0 {
            return Vec::new();
        }

        let mut scored: Vec<(f64, &str, &str)> = self
            .names
            .iter()
            .zip(&self.display)
            .filter_map(|(name, display)| Some((name.as_deref()?, display.as_deref()?)))
            .map(|(name, display)| (fuzzy_match(query, name), name, display))
            .filter(|(score, _, _)| *score >= threshold)
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        // names differing only by case collapse into the best-scored spelling
        let mut seen: Vec<&str> = Vec::new();
        let mut out: Vec<String> = Vec::new();
        for (_, name, display) in scored {
            if !seen.contains(&name) {
                seen.push(name);
                out.push(display.to_string());
            }
            if out.len() == limit {
                break;
            }
        }
        out
    }
}

/// A stockist found to carry a medicine (or a raw query in the fallback pass).
#[derive(Debug, Clone)]
pub struct AvailableStockist<'a> {
    pub stockist: &'a Stockist,
    /// Group key: display name, falling back to id
    pub label: &'a str,
    pub source: AvailabilitySource,
}

struct StockistEntry<'a> {
    stockist: &'a Stockist,
    label: String,
    id: Option<String>,
    /// Lower-cased inventory names
    inventory: Vec<String>,
}

/// Availability checks over a read-only stockist snapshot.
pub struct StockistAvailability<'a> {
    entries: Vec<StockistEntry<'a>>,
    aliases: &'a FieldAliases,
}

impl<'a> StockistAvailability<'a> {
    pub fn new(stockists: &'a [Stockist], aliases: &'a FieldAliases) -> Self {
        let entries = stockists
            .iter()
            .map(|s| StockistEntry {
                stockist: s,
                label: fields::stockist_label(s, aliases),
                id: fields::record_id(s.fields(), aliases),
                inventory: fields::inventory_names(s, aliases)
                    .into_iter()
                    .map(|n| n.to_lowercase())
                    .collect(),
            })
            .collect();
        Self { entries, aliases }
    }

    /// Stockists carrying `medicine`, in stockist order.
    ///
    /// A stockist is available when its inventory lists the medicine's name
    /// or id (case-insensitive), or when one of the medicine's reference ids
    /// contains the stockist id as a substring.
    pub fn available_for(&self, medicine: &Medicine) -> Vec<AvailableStockist<'_>> {
        let name = fields::medicine_name(medicine, self.aliases).map(|n| n.to_lowercase());
        let id = fields::record_id(medicine.fields(), self.aliases).map(|i| i.to_lowercase());
        let references = fields::reference_ids(medicine, self.aliases);

        self.entries
            .iter()
            .filter_map(|entry| {
                let in_inventory = entry.inventory.iter().any(|item| {
                    name.as_deref() == Some(item.as_str()) || id.as_deref() == Some(item.as_str())
                });
                if in_inventory {
                    return Some(entry.available(AvailabilitySource::Inventory));
                }

                let sid = entry.id.as_deref()?;
                references
                    .iter()
                    .any(|candidate| candidate.contains(sid))
                    .then(|| entry.available(AvailabilitySource::Reference))
            })
            .collect()
    }

    /// Stockists whose inventory lists the raw query, ignoring medicine records.
    pub fn inventory_fallback(&self, query: &str) -> Vec<AvailableStockist<'_>> {
        if query.is_empty() {
            return Vec::new();
        }
        self.entries
            .iter()
            .filter(|entry| entry.inventory.iter().any(|item| item == query))
            .map(|entry| entry.available(AvailabilitySource::InventoryFallback))
            .collect()
    }
}

impl<'a> StockistEntry<'a> {
    fn available(&self, source: AvailabilitySource) -> AvailableStockist<'_> {
        AvailableStockist {
            stockist: self.stockist,
            label: &self.label,
            source,
        }
    }
}

/// Compute fuzzy string similarity using combined metrics.
pub(crate) fn fuzzy_match(a: &str, b: &str) -> f64 {
    // Jaro-Winkler rewards shared prefixes, Levenshtein overall edit distance
    let jw = jaro_winkler(a, b);
    let lev = normalized_levenshtein(a, b);
    jw * 0.6 + lev * 0.4
}
