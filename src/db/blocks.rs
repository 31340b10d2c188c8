// Copyright (c) 2025 Slidechain Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Block and snapshot operations (spec §3, §4.1). Append-only by
//! height; a block at height H may be deleted iff `H > 1` and `H <
//! min(latest snapshot height, min pin height)`, per spec §3.

use super::Store;
use crate::Result;

impl Store {
    /// `AppendBlock(H, hash, bytes)` and `SaveSnapshot(H, bytes)`
    /// combined into the single atomic write spec §4.1 requires for
    /// "FinalizeHeight": a block's commit must never be observable
    /// without its snapshot, or vice versa.
    pub async fn finalize_height(
        &self,
        height: u64,
        hash: &[u8],
        block_bits: &[u8],
        snapshot_bits: &[u8],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let height = height as i64;
        sqlx::query("INSERT INTO blocks (height, hash, bits) VALUES (?1, ?2, ?3)")
            .bind(height)
            .bind(hash)
            .bind(block_bits)
            .execute(&mut *tx)
            .await?;
        sqlx::query("INSERT INTO snapshots (height, bits) VALUES (?1, ?2)")
            .bind(height)
            .bind(snapshot_bits)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn get_block(&self, height: u64) -> Result<Option<Vec<u8>>> {
        let row: Option<(Vec<u8>,)> = sqlx::query_as("SELECT bits FROM blocks WHERE height = ?1")
            .bind(height as i64)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(bits,)| bits))
    }

    pub async fn latest_block_height(&self) -> Result<u64> {
        let (height,): (Option<i64>,) = sqlx::query_as("SELECT MAX(height) FROM blocks")
            .fetch_one(&self.pool)
            .await?;
        Ok(height.unwrap_or(0) as u64)
    }

    pub async fn latest_snapshot(&self) -> Result<Option<(u64, Vec<u8>)>> {
        let row: Option<(i64, Vec<u8>)> =
            sqlx::query_as("SELECT height, bits FROM snapshots ORDER BY height DESC LIMIT 1")
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(h, bits)| (h as u64, bits)))
    }

    /// Deletes blocks in the open range `(1, upper)`, retaining
    /// genesis and the latest block, per spec §4.1's GC loop.
    pub async fn gc_blocks(&self, upper: u64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM blocks WHERE height > 1 AND height < ?1")
            .bind(upper as i64)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn min_pin_height(&self) -> Result<u64> {
        let (height,): (Option<i64>,) = sqlx::query_as("SELECT MIN(height) FROM pins")
            .fetch_one(&self.pool)
            .await?;
        Ok(height.unwrap_or(0) as u64)
    }
}
