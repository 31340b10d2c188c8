// Copyright (c) 2025 Slidechain Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The single-row custodian identity table (spec §3, §4.7). Created
//! once on first startup, reused forever.

use super::Store;
use crate::types::CustodianIdentity;
use crate::Result;

impl Store {
    pub async fn load_custodian(&self) -> Result<Option<CustodianIdentity>> {
        let row: Option<(Vec<u8>, String)> =
            sqlx::query_as("SELECT seed, cursor FROM custodian LIMIT 1")
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(seed, cursor)| CustodianIdentity { seed, cursor }))
    }

    /// Persists the identity created on first boot (spec §4.7: "on
    /// creation: generate keypair, ... persist the seed").
    pub async fn create_custodian(&self, identity: &CustodianIdentity) -> Result<()> {
        sqlx::query("INSERT INTO custodian (seed, cursor) VALUES (?1, ?2)")
            .bind(&identity.seed)
            .bind(&identity.cursor)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Advances the main-chain watcher's persisted stream cursor
    /// (spec §4.5: "Cursor is advanced only after the row update
    /// commits").
    pub async fn advance_custodian_cursor(&self, cursor: &str) -> Result<()> {
        sqlx::query("UPDATE custodian SET cursor = ?1")
            .bind(cursor)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
