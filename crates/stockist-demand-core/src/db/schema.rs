//! SQLite schema definition.

/// Complete database schema for the local result cache.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Resolution Cache
-- ============================================================================

-- One row per cache key; each write replaces the row wholesale. No expiry.
CREATE TABLE IF NOT EXISTS resolution_cache (
    cache_key TEXT PRIMARY KEY,
    payload TEXT NOT NULL,                       -- JSON {groups, createdAt}
    digest TEXT NOT NULL,                        -- SHA-256 hex of payload
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;
