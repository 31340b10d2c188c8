// Copyright (c) 2025 Slidechain Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pin cursor operations (spec §3 "Pin cursor", §4.3).

use super::Store;
use crate::Result;

impl Store {
    /// `(1)` of the Pin Runner's startup sequence: insert `(name, 0)`
    /// if absent.
    pub async fn ensure_pin(&self, name: &str) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO pins (name, height) VALUES (?1, 0)")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// `(2)`: read the persisted height.
    pub async fn pin_height(&self, name: &str) -> Result<u64> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT height FROM pins WHERE name = ?1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(h,)| h).unwrap_or(0) as u64)
    }

    /// Invariant from spec §3: a pin's recorded height is
    /// non-decreasing. Called after every successful `handler` call,
    /// not only at the end of a backlog, so a crash mid-backlog
    /// resumes close to where it left off.
    pub async fn advance_pin(&self, name: &str, height: u64) -> Result<()> {
        sqlx::query("UPDATE pins SET height = ?1 WHERE name = ?2 AND height < ?1")
            .bind(height as i64)
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ensure_then_advance_is_monotonic() {
        let store = Store::open_in_memory().await.unwrap();
        store.ensure_pin("exports").await.unwrap();
        assert_eq!(store.pin_height("exports").await.unwrap(), 0);

        store.advance_pin("exports", 5).await.unwrap();
        assert_eq!(store.pin_height("exports").await.unwrap(), 5);

        // Advancing backwards is a no-op (spec §3 pin monotonicity).
        store.advance_pin("exports", 3).await.unwrap();
        assert_eq!(store.pin_height("exports").await.unwrap(), 5);
    }

    #[tokio::test]
    async fn ensure_pin_is_idempotent() {
        let store = Store::open_in_memory().await.unwrap();
        store.ensure_pin("pegouts").await.unwrap();
        store.advance_pin("pegouts", 2).await.unwrap();
        store.ensure_pin("pegouts").await.unwrap();
        assert_eq!(store.pin_height("pegouts").await.unwrap(), 2);
    }
}
