//! Stockist Demand Core Library
//!
//! Resolves free-text pharmacy demand lines to the stockists that can supply
//! them, with a local cache of the last result.
//!
//! # Architecture
//!
//! ```text
//! GET /api/medicine ─┐
//!                    ├─→ ingest (lenient) ─→ ReferenceData
//! GET /api/stockist ─┘                           │
//!                                                ▼
//!   DemandLine[] ──────────────────────→ resolve_demand
//!                                                │
//!                          ┌─────────────────────┴──────────────┐
//!                          ▼                                    ▼
//!                  ResolutionResult                     ResolutionTrace
//!          (stockist groups + "unmatched")              (diagnostics only)
//!                          │
//!              ┌───────────┴───────────┐
//!              ▼                       ▼
//!       SnapshotStore            Purchase order
//!   (SQLite, best effort)            export
//! ```
//!
//! # Core Principle
//!
//! **The resolver never fails.** Missing or malformed reference data only
//! means more lines end up in the `unmatched` group.
//!
//! # Modules
//!
//! - [`models`]: Domain types (DemandLine, Medicine, Stockist, ResolutionResult, ...)
//! - [`resolver`]: Exact-first medicine search and stockist availability
//! - [`ingest`]: Backend response parsing
//! - [`db`]: SQLite result cache
//! - [`snapshot`]: Best-effort persistence of the last result
//! - [`export`]: Per-stockist purchase orders
//! - [`config`]: Resolver and cache configuration

pub mod config;
pub mod db;
pub mod export;
pub mod ingest;
pub mod models;
pub mod resolver;
pub mod snapshot;

// Re-export commonly used types
pub use config::{CacheConfig, ResolverConfig, DEFAULT_CACHE_KEY};
pub use db::Database;
pub use ingest::ReferenceData;
pub use models::{
    DemandLine, MatchedMedicine, Medicine, Resolution, ResolutionEntry, ResolutionResult,
    ResolutionSnapshot, ResolutionTrace, Stockist, TraceRecord, UNMATCHED,
};
pub use resolver::{resolve_demand, DemandResolver};
pub use snapshot::SnapshotStore;

use resolver::fields::FieldAliases;

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum DemandError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<db::DbError> for DemandError {
    fn from(e: db::DbError) -> Self {
        DemandError::DatabaseError(e.to_string())
    }
}

impl From<serde_json::Error> for DemandError {
    fn from(e: serde_json::Error) -> Self {
        DemandError::SerializationError(e.to_string())
    }
}

impl From<config::ConfigError> for DemandError {
    fn from(e: config::ConfigError) -> Self {
        DemandError::InvalidInput(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for DemandError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        DemandError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

fn resolver_config(config_json: Option<String>) -> Result<ResolverConfig, DemandError> {
    match config_json {
        Some(json) if !json.trim().is_empty() => Ok(ResolverConfig::from_json_str(&json)?),
        _ => Ok(ResolverConfig::default()),
    }
}

/// Open or create a result cache at the given path.
///
/// `cache_key` defaults to [`DEFAULT_CACHE_KEY`]; `config_json` to the default
/// resolver configuration.
#[uniffi::export]
pub fn open_demand_core(
    path: String,
    cache_key: Option<String>,
    config_json: Option<String>,
) -> Result<Arc<DemandCore>, DemandError> {
    let cache = CacheConfig::new(PathBuf::from(path), config::cache_key_from_value(cache_key))?;
    let db = Database::open(cache.path())?;
    Ok(DemandCore::wrap(db, cache.cache_key(), resolver_config(config_json)?))
}

/// Create a core backed by an in-memory cache (for testing).
#[uniffi::export]
pub fn open_demand_core_in_memory() -> Result<Arc<DemandCore>, DemandError> {
    let db = Database::open_in_memory()?;
    Ok(DemandCore::wrap(db, DEFAULT_CACHE_KEY, ResolverConfig::default()))
}

// =========================================================================
// Main API Object
// =========================================================================

struct CoreState {
    db: Database,
    cache_key: String,
    resolver: DemandResolver,
    /// Last result and the stockists it was resolved against. Restored from
    /// the snapshot cache on open, without stockist details.
    last: Option<(ResolutionResult, Vec<Stockist>)>,
}

/// Thread-safe resolver and cache wrapper for FFI.
#[derive(uniffi::Object)]
pub struct DemandCore {
    state: Arc<Mutex<CoreState>>,
}

impl DemandCore {
    fn wrap(db: Database, cache_key: &str, config: ResolverConfig) -> Arc<Self> {
        let last = SnapshotStore::new(&db, cache_key)
            .load_last()
            .map(|snapshot| (snapshot.groups, Vec::new()));
        Arc::new(Self {
            state: Arc::new(Mutex::new(CoreState {
                db,
                cache_key: cache_key.to_string(),
                resolver: DemandResolver::new(config),
                last,
            })),
        })
    }
}

#[uniffi::export]
impl DemandCore {
    // =========================================================================
    // Resolution
    // =========================================================================

    /// Resolve demand lines against raw backend response bodies.
    ///
    /// A `None` or malformed body is treated as an empty collection. The
    /// result is cached on a best-effort basis.
    pub fn resolve(
        &self,
        lines: Vec<FfiDemandLine>,
        medicine_body: Option<String>,
        stockist_body: Option<String>,
    ) -> Result<FfiResolution, DemandError> {
        let mut state = self.state.lock()?;
        let reference =
            ReferenceData::from_responses(medicine_body.as_deref(), stockist_body.as_deref());
        let lines: Vec<DemandLine> = lines.into_iter().map(DemandLine::from).collect();

        let result = state
            .resolver
            .resolve(&lines, &reference.medicines, &reference.stockists);

        SnapshotStore::new(&state.db, &state.cache_key).persist(&result);

        let ffi = FfiResolution::from_result(&result, &state.resolver.config().aliases);
        state.last = Some((result, reference.stockists));
        Ok(ffi)
    }

    /// The cached snapshot as JSON (`{groups, createdAt}`), if any.
    pub fn last_snapshot_json(&self) -> Result<Option<String>, DemandError> {
        let state = self.state.lock()?;
        let snapshot = SnapshotStore::new(&state.db, &state.cache_key).load_last();
        Ok(snapshot.map(|s| s.to_json()).transpose()?)
    }

    // =========================================================================
    // Trace
    // =========================================================================

    /// Accumulated matching trace as JSON.
    pub fn trace_json(&self) -> Result<String, DemandError> {
        let state = self.state.lock()?;
        Ok(state.resolver.trace().to_json()?)
    }

    pub fn clear_trace(&self) -> Result<(), DemandError> {
        let mut state = self.state.lock()?;
        state.resolver.clear_trace();
        Ok(())
    }

    // =========================================================================
    // Export Operations
    // =========================================================================

    /// Export purchase orders for the last resolution as JSON.
    pub fn export_orders_json(&self) -> Result<String, DemandError> {
        let state = self.state.lock()?;
        Ok(Self::orders(&state)?.to_json()?)
    }

    /// Export purchase orders for the last resolution as CSV.
    pub fn export_orders_csv(&self) -> Result<String, DemandError> {
        let state = self.state.lock()?;
        Ok(Self::orders(&state)?.to_csv())
    }
}

impl DemandCore {
    fn orders(state: &CoreState) -> Result<export::PurchaseOrderBatch, DemandError> {
        let (result, stockists) = state
            .last
            .as_ref()
            .ok_or_else(|| DemandError::NotFound("no resolution available".into()))?;
        Ok(export::PurchaseOrderBatch::from_result(
            result,
            stockists,
            &state.resolver.config().aliases,
        ))
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe demand line. A missing id gets a fresh one.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDemandLine {
    pub id: Option<String>,
    pub name: String,
    pub quantity: u32,
}

impl From<FfiDemandLine> for DemandLine {
    fn from(line: FfiDemandLine) -> Self {
        match line.id.filter(|id| !id.trim().is_empty()) {
            Some(id) => DemandLine::with_id(id, line.name, line.quantity),
            None => DemandLine::new(line.name, line.quantity),
        }
    }
}

/// FFI-safe resolution entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiResolutionEntry {
    pub demand_line_id: String,
    pub name: String,
    pub quantity: u32,
    pub medicine_name: Option<String>,
    pub medicine_id: Option<String>,
    pub available: bool,
}

impl FfiResolutionEntry {
    fn from_entry(entry: &ResolutionEntry, aliases: &FieldAliases) -> Self {
        Self {
            demand_line_id: entry.demand_line.id.clone(),
            name: entry.demand_line.name.clone(),
            quantity: entry.quantity.unwrap_or(entry.demand_line.quantity),
            medicine_name: entry.medicine.as_ref().and_then(|m| m.display_name(aliases)),
            medicine_id: entry.medicine.as_ref().and_then(|m| m.id(aliases)),
            available: entry.available.unwrap_or(false),
        }
    }
}

/// FFI-safe resolution group.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiResolutionGroup {
    pub key: String,
    pub entries: Vec<FfiResolutionEntry>,
}

/// FFI-safe resolution result, groups in insertion order.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiResolution {
    pub groups: Vec<FfiResolutionGroup>,
    pub unmatched_count: u32,
}

impl FfiResolution {
    fn from_result(result: &ResolutionResult, aliases: &FieldAliases) -> Self {
        Self {
            groups: result
                .iter()
                .map(|group| FfiResolutionGroup {
                    key: group.key.clone(),
                    entries: group
                        .entries
                        .iter()
                        .map(|entry| FfiResolutionEntry::from_entry(entry, aliases))
                        .collect(),
                })
                .collect(),
            unmatched_count: result.unmatched().len() as u32,
        }
    }
}
