// Copyright (c) 2025 Slidechain Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The main-chain watcher (spec §4.5): streams payments to the
//! custodian account from the persisted cursor, marks matching peg
//! rows `stellar-seen`, and wakes the import loop.

use std::sync::Arc;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use tokio::sync::{watch, Notify};
use tracing::{debug, warn};

use crate::db::Store;
use crate::error::Error;
use crate::mainchain::MainChainClient;
use crate::Result;

/// Runs until cancelled or a fatal store error occurs. Transient
/// stream errors back off exponentially from `backoff_base_ms` and
/// retry indefinitely (spec §4.5, §7); they never escalate.
pub async fn run(
    store: Store,
    client: Arc<dyn MainChainClient>,
    notify: Arc<Notify>,
    backoff_base_ms: u64,
    mut cancel: watch::Receiver<bool>,
) -> Result<()> {
    let builder = ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(backoff_base_ms))
        .with_jitter()
        .without_max_times();

    loop {
        if *cancel.borrow() {
            return Err(Error::Cancelled);
        }

        let identity = store.load_custodian().await?.ok_or_else(|| {
            Error::TemplateResolution("custodian identity not initialized".to_string())
        })?;
        let cursor = identity.cursor;

        let fetch = || async { client.stream_payments(&cursor).await };
        let payments = tokio::select! {
            biased;
            _ = cancel.changed() => return Err(Error::Cancelled),
            result = fetch
                .retry(builder)
                .when(|e: &Error| !e.is_fatal())
                .notify(|err: &Error, dur: Duration| {
                    warn!(%err, backoff = ?dur, "main-chain watcher stream error, retrying");
                }) => result?,
        };

        if payments.is_empty() {
            tokio::time::sleep(Duration::from_millis(backoff_base_ms)).await;
            continue;
        }

        for payment in payments {
            let Some(nonce_hash) = payment.memo_nonce_hash else {
                debug!(cursor = %payment.cursor, "payment carries no nonce-hash memo, skipping");
                store.advance_custodian_cursor(&payment.cursor).await?;
                continue;
            };
            if store.mark_stellar_seen(&nonce_hash).await? {
                notify.notify_one();
            } else {
                warn!(%nonce_hash, "observed main-chain payment for an unknown or already-imported peg");
            }
            // Cursor only advances once the row update above has
            // committed (spec §4.5).
            store.advance_custodian_cursor(&payment.cursor).await?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mainchain::IncomingPayment;
    use crate::types::{AssetId, CustodianIdentity};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeClient {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MainChainClient for FakeClient {
        async fn account_id(&self) -> Result<String> {
            Ok("custodian".to_string())
        }

        async fn stream_payments(&self, cursor: &str) -> Result<Vec<IncomingPayment>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call == 0 {
                assert_eq!(cursor, "");
                let nonce = crate::nonce::nonce_hash(b"genesis", 5_000);
                Ok(vec![IncomingPayment {
                    cursor: "1".to_string(),
                    destination: "custodian".to_string(),
                    amount: 100,
                    asset: AssetId(b"native".to_vec()),
                    memo_nonce_hash: Some(nonce),
                }])
            } else {
                Ok(vec![])
            }
        }

        async fn submit_settlement(
            &self,
            _temp_addr: &str,
            _exporter: &str,
            _asset: &AssetId,
            _amount: crate::types::Amount,
            _escrow_seqnum: i64,
        ) -> Result<crate::mainchain::SettlementOutcome> {
            unreachable!("not exercised by this test")
        }
    }

    #[tokio::test]
    async fn marks_matching_peg_and_advances_cursor() {
        let store = Store::open_in_memory().await.unwrap();
        store
            .create_custodian(&CustodianIdentity { seed: vec![1], cursor: String::new() })
            .await
            .unwrap();
        let peg = crate::types::PegRecord {
            nonce_hash: crate::nonce::nonce_hash(b"genesis", 5_000),
            recipient_pubkey: crate::types::SideChainPubkey([1u8; 32]),
            asset: AssetId(b"native".to_vec()),
            amount: 100,
            expiration_ms: 5_000,
            stellar_seen: false,
            imported: false,
        };
        store.insert_peg(&peg).await.unwrap();

        let client = Arc::new(FakeClient { calls: AtomicUsize::new(0) });
        let notify = Arc::new(Notify::new());
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let store_clone = store.clone();
        let notify_clone = notify.clone();
        let task = tokio::spawn(async move {
            run(store_clone, client, notify_clone, 5, cancel_rx).await
        });

        notify.notified().await;
        cancel_tx.send(true).unwrap();
        let result = task.await.unwrap();
        assert!(matches!(result, Err(Error::Cancelled)));

        let updated = store.get_peg(&peg.nonce_hash).await.unwrap().unwrap();
        assert!(updated.stellar_seen);
        let identity = store.load_custodian().await.unwrap().unwrap();
        assert_eq!(identity.cursor, "1");
    }
}
