//! Demand resolver.
//!
//! Pipeline per demand line: Normalize query → Medicine search (exact-first)
//! → Stockist availability → Inventory-only fallback → Unmatched.
//!
//! A line may land in several stockist groups. Every stockist that carries a
//! candidate medicine is notified.

pub mod fields;
mod matcher;

pub use matcher::*;

use crate::config::ResolverConfig;
use crate::models::{
    AvailabilityRecord, DemandLine, MatchKind, MatchedMedicine, Medicine, Resolution,
    ResolutionEntry, ResolutionResult, ResolutionTrace, Stockist, TraceRecord, UNMATCHED,
};

/// Resolve demand lines against medicine and stockist snapshots.
///
/// Pure: inputs are never mutated and nothing is persisted. Empty reference
/// collections route every line to [`UNMATCHED`].
pub fn resolve_demand(
    lines: &[DemandLine],
    medicines: &[Medicine],
    stockists: &[Stockist],
    config: &ResolverConfig,
) -> Resolution {
    let matcher = MedicineMatcher::new(medicines, &config.aliases);
    let availability = StockistAvailability::new(stockists, &config.aliases);

    let mut result = ResolutionResult::new();
    let mut trace = ResolutionTrace::new();

    for line in lines {
        let record = resolve_line(line, &matcher, &availability, config, &mut result);
        tracing::debug!(
            line_id = %record.line_id,
            query = %record.query,
            match_kind = ?record.match_kind,
            assigned_to = ?record.assigned_to,
            "resolved demand line"
        );
        trace.push(record);
    }

    tracing::info!(
        lines = lines.len(),
        medicines = medicines.len(),
        stockists = stockists.len(),
        groups = result.len(),
        unmatched = result.unmatched().len(),
        "resolution pass complete"
    );

    Resolution { result, trace }
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

fn resolve_line(
    line: &DemandLine,
    matcher: &MedicineMatcher<'_>,
    availability: &StockistAvailability<'_>,
    config: &ResolverConfig,
    result: &mut ResolutionResult,
) -> TraceRecord {
    let query = line.query();
    let normalized = line.normalized_query();

    let mut record = TraceRecord {
        line_id: line.id.clone(),
        query: query.to_string(),
        match_kind: MatchKind::Blank,
        matched_medicines: Vec::new(),
        candidate_stockists: Vec::new(),
        assigned_to: Vec::new(),
        availability: Vec::new(),
        suggestions: Vec::new(),
    };

    if normalized.is_empty() {
        result.push(UNMATCHED, ResolutionEntry::unmatched(line));
        record.assigned_to.push(UNMATCHED.to_string());
        return record;
    }

    let search = matcher.search(&normalized);
    record.match_kind = search.kind;

    for medicine in &search.candidates {
        let medicine_label =
            fields::medicine_name(medicine, &config.aliases).unwrap_or_default();
        record.matched_medicines.push(medicine_label.clone());

        for found in availability.available_for(medicine) {
            result.push(
                found.label,
                ResolutionEntry::available(line, MatchedMedicine::Canonical((*medicine).clone())),
            );
            push_unique(&mut record.candidate_stockists, found.label);
            push_unique(&mut record.assigned_to, found.label);
            record.availability.push(AvailabilityRecord {
                medicine: medicine_label.clone(),
                stockist: found.label.to_string(),
                source: found.source,
            });
        }
    }

    if record.assigned_to.is_empty() {
        for found in availability.inventory_fallback(&normalized) {
            result.push(
                found.label,
                ResolutionEntry::available(line, MatchedMedicine::named(query)),
            );
            push_unique(&mut record.candidate_stockists, found.label);
            push_unique(&mut record.assigned_to, found.label);
            record.availability.push(AvailabilityRecord {
                medicine: query.to_string(),
                stockist: found.label.to_string(),
                source: found.source,
            });
        }
    }

    if record.assigned_to.is_empty() {
        result.push(UNMATCHED, ResolutionEntry::unmatched(line));
        record.assigned_to.push(UNMATCHED.to_string());
        record.suggestions = matcher.suggest(
            &normalized,
            config.suggestion_limit,
            config.suggestion_threshold,
        );
    }

    record
}

/// Resolver that keeps an append-only trace across resolution passes.
#[derive(Debug, Default)]
pub struct DemandResolver {
    config: ResolverConfig,
    trace: ResolutionTrace,
}

impl DemandResolver {
    /// Create a new resolver.
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config,
            trace: ResolutionTrace::new(),
        }
    }

    /// Run one resolution pass. Trace records are appended to the running trace.
    pub fn resolve(
        &mut self,
        lines: &[DemandLine],
        medicines: &[Medicine],
        stockists: &[Stockist],
    ) -> ResolutionResult {
        let Resolution { result, trace } = resolve_demand(lines, medicines, stockists, &self.config);
        self.trace.extend(trace);
        result
    }

    /// Accumulated trace for every pass since creation or the last clear.
    pub fn trace(&self) -> &ResolutionTrace {
        &self.trace
    }

    pub fn clear_trace(&mut self) {
        self.trace.clear();
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }
}
