// Copyright (c) 2025 Slidechain Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The import loop (spec §4.5): wakes on the shared [`Notify`], drains
//! every peg row ready to import, and submits one import-issuance
//! transaction per row.

use std::sync::Arc;

use tokio::sync::{watch, Notify};
use tracing::{error, info};

use crate::contract::issuance::{ImportIssuance, Issued};
use crate::contract::uniqueness_token::UniquenessToken;
use crate::contract::Seed;
use crate::db::Store;
use crate::error::Error;
use crate::submitter::builder::{RawTx, TAG_ISSUANCE};
use crate::submitter::Submitter;
use crate::types::CustodianIdentity;
use crate::Result;

const IMPORTER_SEED_DOMAIN: &[u8] = b"import-issuance-instance";

/// The deployed import-issuance contract's seed is fixed per
/// custodian, derived from the custodian's own persisted seed so it
/// survives restarts without a second row to track (spec §4.7, §9).
fn importer_seed(identity: &CustodianIdentity) -> Seed {
    Seed::of(IMPORTER_SEED_DOMAIN, &[&identity.seed])
}

/// Encodes an issuance as the opaque transaction bytes the side-chain
/// VM would accept (spec §6). This crate never interprets the
/// encoding; a length-stable concatenation is enough to exercise the
/// submitter/store/pin machinery end-to-end (spec §1).
fn encode_issuance(issued: &Issued) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(1 + 32 + 8 + 32);
    bytes.push(TAG_ISSUANCE);
    bytes.extend_from_slice(&issued.asset_id);
    bytes.extend_from_slice(&issued.amount.to_be_bytes());
    bytes.extend_from_slice(&issued.recipient.0);
    bytes
}

/// Runs until cancelled or a fatal error occurs (spec §4.5 "Import
/// loop"). A submission failure is fatal (spec §7): issued value
/// could otherwise be lost or double-spent.
pub async fn run(
    store: Store,
    submitter: Arc<Submitter>,
    notify: Arc<Notify>,
    mut cancel: watch::Receiver<bool>,
) -> Result<()> {
    loop {
        tokio::select! {
            biased;
            _ = cancel.changed() => return Err(Error::Cancelled),
            _ = notify.notified() => {}
        }

        let identity = store.load_custodian().await?.ok_or_else(|| {
            Error::TemplateResolution("custodian identity not initialized".to_string())
        })?;
        let importer = ImportIssuance::new(importer_seed(&identity));

        for peg in store.pegs_ready_to_import().await? {
            if *cancel.borrow() {
                return Err(Error::Cancelled);
            }

            let token = UniquenessToken::new(
                peg.asset.clone(),
                peg.amount,
                peg.recipient_pubkey,
                peg.nonce_hash,
            );
            let issued = importer.issue(token.consume());
            let id = peg.nonce_hash.as_bytes().to_vec();
            let tx = RawTx { id: id.clone(), bytes: encode_issuance(&issued) };

            let sub = submitter.submit(tx).await;
            match submitter.wait_for_tx(&id, sub, cancel.clone()).await {
                Ok(height) => {
                    store.mark_imported(&peg.nonce_hash).await?;
                    info!(nonce_hash = %peg.nonce_hash, height, "peg imported");
                }
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(err) => {
                    error!(%err, nonce_hash = %peg.nonce_hash, "fatal: issuance submission failed");
                    return Err(err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AssetId, CustodianIdentity, PegRecord, SideChainPubkey};
    use std::time::Duration;

    #[tokio::test]
    async fn imports_ready_peg_and_marks_it() {
        let store = Store::open_in_memory().await.unwrap();
        store
            .create_custodian(&CustodianIdentity { seed: vec![9, 9, 9], cursor: String::new() })
            .await
            .unwrap();
        let submitter = Submitter::new(store.clone(), Duration::from_millis(10));

        let peg = PegRecord {
            nonce_hash: crate::nonce::nonce_hash(b"genesis", 5_000),
            recipient_pubkey: SideChainPubkey([4u8; 32]),
            asset: AssetId(b"native".to_vec()),
            amount: 250,
            expiration_ms: 5_000,
            stellar_seen: true,
            imported: false,
        };
        store.insert_peg(&peg).await.unwrap();

        let notify = Arc::new(Notify::new());
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let store_clone = store.clone();
        let submitter_clone = submitter.clone();
        let notify_clone = notify.clone();
        let task = tokio::spawn(async move {
            run(store_clone, submitter_clone, notify_clone, cancel_rx).await
        });

        notify.notify_one();
        tokio::time::sleep(Duration::from_millis(60)).await;

        let updated = store.get_peg(&peg.nonce_hash).await.unwrap().unwrap();
        assert!(updated.imported);

        cancel_tx.send(true).unwrap();
        let result = task.await.unwrap();
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
