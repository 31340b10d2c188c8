// Copyright (c) 2025 Slidechain Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The durable store (spec §4.1): blocks, snapshots, pegs, exports,
//! pin cursors, and the custodian identity, behind a single
//! transactional `sqlx` sqlite pool. The underlying storage engine is
//! the external collaborator named in spec §1's out-of-scope list;
//! this module is the in-scope component from spec §2's table that
//! wraps it with the operations the reconciliation core depends on.

pub mod blocks;
pub mod custodian;
pub mod exports;
pub mod models;
pub mod pegs;
pub mod pins;

use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::Result;

#[derive(Clone)]
pub struct Store {
    pub(crate) pool: SqlitePool,
}

impl Store {
    /// Opens (creating if absent) the sqlite database at `path` and
    /// runs embedded migrations. `path` may be `:memory:` for a
    /// throwaway store, which tests use to exercise real SQL against
    /// real `sqlx` rather than a hand-rolled in-memory double.
    pub async fn open(path: &str) -> Result<Self> {
        let opts = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(opts)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Store { pool })
    }

    /// Opens an in-process in-memory store, for tests and the
    /// `slidechain-cli`'s dry-run helpers.
    pub async fn open_in_memory() -> Result<Self> {
        Self::open(":memory:").await
    }
}
