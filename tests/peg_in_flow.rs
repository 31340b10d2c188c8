// Copyright (c) 2025 Slidechain Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! S1: exact peg-in (spec §8). A peg is recorded, observed on the
//! main chain, and imported end-to-end through the real watcher,
//! import loop, and submitter.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use slidechain::contract::uniqueness_token::UniquenessToken;
use slidechain::db::Store;
use slidechain::mainchain::{IncomingPayment, MainChainClient, SettlementOutcome};
use slidechain::submitter::Submitter;
use slidechain::types::{AssetId, Amount, CustodianIdentity, SideChainPubkey};
use tokio::sync::{watch, Notify};

struct OneShotPaymentClient {
    payment: std::sync::Mutex<Option<IncomingPayment>>,
}

#[async_trait]
impl MainChainClient for OneShotPaymentClient {
    async fn account_id(&self) -> slidechain::Result<String> {
        Ok("GCUSTODIAN".to_string())
    }

    async fn stream_payments(&self, _cursor: &str) -> slidechain::Result<Vec<IncomingPayment>> {
        Ok(self.payment.lock().unwrap().take().into_iter().collect())
    }

    async fn submit_settlement(
        &self,
        _temp_addr: &str,
        _exporter: &str,
        _asset: &AssetId,
        _amount: Amount,
        _escrow_seqnum: i64,
    ) -> slidechain::Result<SettlementOutcome> {
        unreachable!("peg-in flow never settles a peg-out")
    }
}

#[tokio::test]
async fn exact_peg_in_is_imported_end_to_end() {
    let store = Store::open_in_memory().await.unwrap();
    store
        .create_custodian(&CustodianIdentity { seed: vec![7, 7, 7], cursor: String::new() })
        .await
        .unwrap();

    let exp_ms = 10_000;
    let nonce = slidechain::nonce::nonce_hash(slidechain::nonce::GENESIS_BLOCK_ID, exp_ms);
    let recipient = SideChainPubkey([42u8; 32]);
    let asset = AssetId(b"native".to_vec());

    let token = UniquenessToken::new(asset.clone(), 100, recipient, nonce);
    let submitter = Submitter::new(store.clone(), Duration::from_millis(10));
    slidechain::pegin::record_peg_in(&store, &submitter, None, token, exp_ms)
        .await
        .unwrap();

    let client: Arc<dyn MainChainClient> = Arc::new(OneShotPaymentClient {
        payment: std::sync::Mutex::new(Some(IncomingPayment {
            cursor: "1".to_string(),
            destination: "GCUSTODIAN".to_string(),
            amount: 100,
            asset: asset.clone(),
            memo_nonce_hash: Some(nonce),
        })),
    });

    let pegin_notify = Arc::new(Notify::new());
    let (cancel_tx, cancel_rx) = watch::channel(false);

    let watcher_task = tokio::spawn(slidechain::pegin::watcher::run(
        store.clone(),
        client,
        pegin_notify.clone(),
        5,
        cancel_rx.clone(),
    ));
    let import_task = tokio::spawn(slidechain::pegin::import_loop::run(
        store.clone(),
        submitter,
        pegin_notify,
        cancel_rx,
    ));

    tokio::time::sleep(Duration::from_millis(100)).await;

    let peg = store.get_peg(&nonce).await.unwrap().unwrap();
    assert!(peg.stellar_seen, "watcher should have marked the peg stellar-seen");
    assert!(peg.imported, "import loop should have imported the peg");

    cancel_tx.send(true).unwrap();
    let _ = watcher_task.await.unwrap();
    let _ = import_task.await.unwrap();
}
