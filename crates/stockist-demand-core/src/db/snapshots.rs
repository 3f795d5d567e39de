//! Resolution snapshot cache operations.

use rusqlite::{params, OptionalExtension};
use sha2::{Digest, Sha256};

use super::{Database, DbError, DbResult};
use crate::models::ResolutionSnapshot;

/// SHA-256 hex digest of a cached payload.
pub fn payload_digest(payload: &str) -> String {
    hex::encode(Sha256::digest(payload.as_bytes()))
}

impl Database {
    /// Write a snapshot under `key`, replacing any previous one.
    pub fn write_snapshot(&self, key: &str, snapshot: &ResolutionSnapshot) -> DbResult<()> {
        let payload = snapshot.to_json()?;
        let digest = payload_digest(&payload);

        self.conn.execute(
            r#"
            INSERT INTO resolution_cache (cache_key, payload, digest, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, datetime('now'))
            ON CONFLICT(cache_key) DO UPDATE SET
                payload = excluded.payload,
                digest = excluded.digest,
                created_at = excluded.created_at,
                updated_at = datetime('now')
            "#,
            params![key, payload, digest, snapshot.created_at],
        )?;
        Ok(())
    }

    /// Read the snapshot stored under `key`.
    pub fn read_snapshot(&self, key: &str) -> DbResult<Option<ResolutionSnapshot>> {
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT payload, digest FROM resolution_cache WHERE cache_key = ?",
                [key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((payload, digest)) = row else {
            return Ok(None);
        };

        if payload_digest(&payload) != digest {
            return Err(DbError::Corrupt(format!("digest mismatch for {}", key)));
        }

        Ok(Some(serde_json::from_str(&payload)?))
    }

    /// Delete the snapshot under `key`. Returns false if none was stored.
    pub fn delete_snapshot(&self, key: &str) -> DbResult<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM resolution_cache WHERE cache_key = ?", [key])?;
        Ok(rows > 0)
    }
}
