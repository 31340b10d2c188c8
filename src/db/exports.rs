// Copyright (c) 2025 Slidechain Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Export row operations (spec §3 "Export record", §4.6).

use super::models::ExportRow;
use super::Store;
use crate::types::{ExportRecord, PegOutState};
use crate::Result;

impl Store {
    /// Inserts an export row keyed by side-chain txid, idempotent on
    /// conflict (spec §4.6 "Retire watcher" — a retire transaction may
    /// be observed more than once across a crash/restart).
    pub async fn insert_export(&self, export: &ExportRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO exports (txid, exporter, amount, asset_xdr, temp_addr, seqnum, anchor, pubkey, pegged_out)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(txid) DO NOTHING",
        )
        .bind(export.txid.as_slice())
        .bind(&export.exporter)
        .bind(export.amount as i64)
        .bind(export.asset.0.as_slice())
        .bind(&export.temp_addr)
        .bind(export.escrow_seqnum)
        .bind(export.retire_anchor.as_slice())
        .bind(export.exporter_pubkey.0.as_slice())
        .bind(export.state as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_export(&self, txid: &[u8; 32]) -> Result<Option<ExportRecord>> {
        let row: Option<ExportRow> = sqlx::query_as("SELECT * FROM exports WHERE txid = ?1")
            .bind(txid.as_slice())
            .fetch_optional(&self.pool)
            .await?;
        row.map(ExportRecord::try_from).transpose()
    }

    /// Rows in state `NotYet` or `Retry`, the peg-out loop's wakeup
    /// query (spec §4.6).
    pub async fn exports_pending(&self) -> Result<Vec<ExportRecord>> {
        let rows: Vec<ExportRow> = sqlx::query_as(
            "SELECT * FROM exports WHERE pegged_out IN (0, 2) ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(ExportRecord::try_from).collect()
    }

    pub async fn set_export_state(&self, txid: &[u8; 32], state: PegOutState) -> Result<()> {
        sqlx::query("UPDATE exports SET pegged_out = ?1 WHERE txid = ?2")
            .bind(state as i64)
            .bind(txid.as_slice())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Rows in a terminal state awaiting finalization, re-emitted to
    /// the finalization channel on supervisor recovery (spec §8 S6:
    /// "rows with OK or Fail that still exist in `exports` are
    /// re-emitted to the finalization channel").
    pub async fn exports_awaiting_finalization(&self) -> Result<Vec<ExportRecord>> {
        let rows: Vec<ExportRow> =
            sqlx::query_as("SELECT * FROM exports WHERE pegged_out IN (1, 3) ORDER BY rowid")
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(ExportRecord::try_from).collect()
    }

    /// Deleted after the corresponding finalization side-chain
    /// transaction is confirmed (spec §3).
    pub async fn delete_export(&self, txid: &[u8; 32]) -> Result<()> {
        sqlx::query("DELETE FROM exports WHERE txid = ?1")
            .bind(txid.as_slice())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
