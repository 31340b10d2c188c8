// Copyright (c) 2025 Slidechain Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Peg row operations (spec §3 "Peg record", §4.5).

use super::models::PegRow;
use super::Store;
use crate::types::{NonceHash, PegRecord};
use crate::Result;

impl Store {
    /// Inserts a peg row keyed by nonce hash, written by the pre-peg
    /// RPC after the uniqueness-token transaction is confirmed (spec
    /// §4.5).
    pub async fn insert_peg(&self, peg: &PegRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO pegs (nonce_hash, amount, asset_xdr, recipient_pubkey, nonce_expms, imported, stellar_tx)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(peg.nonce_hash.0.as_slice())
        .bind(peg.amount as i64)
        .bind(peg.asset.0.as_slice())
        .bind(peg.recipient_pubkey.0.as_slice())
        .bind(peg.expiration_ms)
        .bind(peg.imported as i64)
        .bind(peg.stellar_seen as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_peg(&self, nonce_hash: &NonceHash) -> Result<Option<PegRecord>> {
        let row: Option<PegRow> = sqlx::query_as("SELECT * FROM pegs WHERE nonce_hash = ?1")
            .bind(nonce_hash.0.as_slice())
            .fetch_optional(&self.pool)
            .await?;
        row.map(PegRecord::try_from).transpose()
    }

    /// Marks a peg row `stellar-seen`, called by the main-chain
    /// watcher after observing the matching payment (spec §4.5).
    /// Returns `false` if no row with this nonce hash exists, so the
    /// watcher can log an orphaned payment without failing the whole
    /// stream.
    pub async fn mark_stellar_seen(&self, nonce_hash: &NonceHash) -> Result<bool> {
        let result = sqlx::query("UPDATE pegs SET stellar_tx = 1 WHERE nonce_hash = ?1 AND imported = 0")
            .bind(nonce_hash.0.as_slice())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Rows ready for the import loop to process: `imported = 0 AND
    /// stellar_tx = 1` (spec §4.5 "Import loop"), ordered by rowid so
    /// processing follows insertion order within a wake.
    pub async fn pegs_ready_to_import(&self) -> Result<Vec<PegRecord>> {
        let rows: Vec<PegRow> =
            sqlx::query_as("SELECT * FROM pegs WHERE imported = 0 AND stellar_tx = 1 ORDER BY rowid")
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(PegRecord::try_from).collect()
    }

    /// Atomically marks a peg row imported, the commit point for spec
    /// §8 property 1 (conservation).
    pub async fn mark_imported(&self, nonce_hash: &NonceHash) -> Result<()> {
        sqlx::query("UPDATE pegs SET imported = 1 WHERE nonce_hash = ?1")
            .bind(nonce_hash.0.as_slice())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Deletes peg rows past expiration that were never imported
    /// (spec §3's garbage-collection invariant).
    pub async fn gc_expired_pegs(&self, now_ms: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM pegs WHERE imported = 0 AND nonce_expms < ?1")
            .bind(now_ms)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
