// Copyright (c) 2025 Slidechain Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! S2: exact peg-out (spec §8). A retire transaction is observed by
//! the pin runner, the peg-out loop settles it on the (fake)
//! main chain, and the settlement watcher finalizes and deletes the
//! export row.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use slidechain::contract::export_contract::ExportReference;
use slidechain::db::Store;
use slidechain::mainchain::{IncomingPayment, MainChainClient, SettlementOutcome};
use slidechain::pegout::retire_watcher::RetireWatcher;
use slidechain::submitter::builder::{RawTx, TAG_EXPORT_STEP1};
use slidechain::submitter::Submitter;
use slidechain::types::{AssetId, Amount};
use tokio::sync::{mpsc, watch, Notify};

struct AlwaysSucceedsClient;

#[async_trait]
impl MainChainClient for AlwaysSucceedsClient {
    async fn account_id(&self) -> slidechain::Result<String> {
        Ok("GCUSTODIAN".to_string())
    }
    async fn stream_payments(&self, _cursor: &str) -> slidechain::Result<Vec<IncomingPayment>> {
        Ok(vec![])
    }
    async fn submit_settlement(
        &self,
        _temp_addr: &str,
        _exporter: &str,
        _asset: &AssetId,
        _amount: Amount,
        _escrow_seqnum: i64,
    ) -> slidechain::Result<SettlementOutcome> {
        Ok(SettlementOutcome::Success)
    }
}

#[tokio::test]
async fn exact_peg_out_settles_and_finalizes() {
    let store = Store::open_in_memory().await.unwrap();
    let submitter = Submitter::new(store.clone(), Duration::from_millis(10));

    let pegout_notify = Arc::new(Notify::new());
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let (finalize_tx, finalize_rx) = mpsc::channel(8);
    let client: Arc<dyn MainChainClient> = Arc::new(AlwaysSucceedsClient);

    let retire_watcher = RetireWatcher::new(store.clone(), pegout_notify.clone());
    let pin_task = tokio::spawn(slidechain::pin::run(
        "exports",
        store.clone(),
        submitter.clone(),
        retire_watcher,
        cancel_rx.clone(),
    ));
    let pegout_loop_task = tokio::spawn(slidechain::pegout::pegout_loop::run(
        store.clone(),
        client,
        pegout_notify,
        finalize_tx,
        cancel_rx.clone(),
    ));
    let settlement_task = tokio::spawn(slidechain::pegout::settlement_watcher::run(
        store.clone(),
        submitter.clone(),
        finalize_rx,
        cancel_rx,
    ));

    let reference = ExportReference {
        asset: AssetId(b"native".to_vec()),
        temp: "GTEMP".to_string(),
        seqnum: 3,
        exporter: "GEXPORTER".to_string(),
        amount: 50,
        anchor: vec![1, 2, 3],
        pubkey: [6u8; 32],
    };
    let mut bytes = vec![TAG_EXPORT_STEP1];
    bytes.extend_from_slice(&serde_json::to_vec(&reference).unwrap());
    submitter.submit(RawTx { id: vec![1], bytes }).await;

    tokio::time::sleep(Duration::from_millis(150)).await;

    let pending = store.exports_pending().await.unwrap();
    assert!(pending.is_empty(), "export should have reached a terminal state");

    let awaiting = store.exports_awaiting_finalization().await.unwrap();
    assert!(awaiting.is_empty(), "export should have been finalized and deleted");

    cancel_tx.send(true).unwrap();
    let _ = pin_task.await.unwrap();
    let _ = pegout_loop_task.await.unwrap();
    let _ = settlement_task.await.unwrap();
}
