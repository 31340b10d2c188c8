// Copyright (c) 2025 Slidechain Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The peg-in pipeline (spec §4.5): the pre-peg RPC, the main-chain
//! watcher, and the import loop, sharing a [`tokio::sync::Notify`] in
//! place of the original's condition variable (spec §9 design note).

pub mod import_loop;
pub mod watcher;

use std::sync::Arc;

use crate::contract::uniqueness_token::UniquenessToken;
use crate::db::Store;
use crate::submitter::builder::RawTx;
use crate::submitter::Submitter;
use crate::types::PegRecord;
use crate::Result;

/// Backs the pre-peg RPC (`POST /peg-in`, spec §6): submits a
/// client-built uniqueness-token transaction, waits for inclusion,
/// then writes the peg row. Failure at any step leaves the database
/// unchanged (spec §4.5).
pub async fn record_peg_in(
    store: &Store,
    submitter: &Arc<Submitter>,
    prepeg_tx: Option<RawTx>,
    token: UniquenessToken,
    expiration_ms: i64,
) -> Result<()> {
    if let Some(tx) = prepeg_tx {
        let id = tx.id.clone();
        let sub = submitter.submit(tx).await;
        let (_tx, cancel) = tokio::sync::watch::channel(false);
        submitter.wait_for_tx(&id, sub, cancel).await?;
    }

    let peg = PegRecord {
        nonce_hash: token.nonce_hash,
        recipient_pubkey: token.recipient,
        asset: token.asset.clone(),
        amount: token.amount,
        expiration_ms,
        stellar_seen: false,
        imported: false,
    };
    store.insert_peg(&peg).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AssetId, SideChainPubkey};
    use std::time::Duration;

    #[tokio::test]
    async fn record_peg_in_without_prepeg_tx_just_inserts() {
        let store = Store::open_in_memory().await.unwrap();
        let submitter = Submitter::new(store.clone(), Duration::from_secs(5));
        let token = UniquenessToken::new(
            AssetId(b"native".to_vec()),
            100,
            SideChainPubkey([1u8; 32]),
            crate::nonce::nonce_hash(b"genesis", 5_000),
        );
        record_peg_in(&store, &submitter, None, token.clone(), 5_000)
            .await
            .unwrap();
        let peg = store.get_peg(&token.nonce_hash).await.unwrap().unwrap();
        assert_eq!(peg.amount, 100);
        assert!(!peg.imported);
    }
}
