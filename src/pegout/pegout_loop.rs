// Copyright (c) 2025 Slidechain Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The peg-out loop (spec §4.6): wakes on the shared [`Notify`],
//! drains every export row in `NotYet`/`Retry`, submits a main-chain
//! settlement per row, and emits terminal rows to the finalization
//! channel.

use std::sync::Arc;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use tokio::sync::{mpsc, watch, Notify};
use tracing::{info, warn};

use crate::db::Store;
use crate::error::Error;
use crate::mainchain::{MainChainClient, SettlementOutcome};
use crate::types::{ExportRecord, PegOutState};
use crate::Result;

/// A Retry-state row schedules its own re-wake after this delay rather
/// than waiting indefinitely for an external trigger (spec §4.6 rows
/// in `Retry` are eligible again on the next wake).
const RETRY_DELAY: Duration = Duration::from_millis(500);

/// Base delay for the jittered backoff wrapping each settlement
/// submission (spec §7: transient errors retry forever, never
/// escalate).
const TRANSIENT_BACKOFF_BASE_MS: u64 = 200;

/// Runs until cancelled. A row's outcome maps to a new state (spec
/// §4.6): `Success -> Ok`, `BadSequence -> Retry`, `Other -> Fail`.
/// Rows reaching `Ok` or `Fail` are pushed to `finalize`.
pub async fn run(
    store: Store,
    client: Arc<dyn MainChainClient>,
    notify: Arc<Notify>,
    finalize: mpsc::Sender<ExportRecord>,
    mut cancel: watch::Receiver<bool>,
) -> Result<()> {
    loop {
        tokio::select! {
            biased;
            _ = cancel.changed() => return Err(Error::Cancelled),
            _ = notify.notified() => {}
        }

        let mut any_retry = false;
        for export in store.exports_pending().await? {
            if *cancel.borrow() {
                return Err(Error::Cancelled);
            }

            let attempt = || async {
                client
                    .submit_settlement(
                        &export.temp_addr,
                        &export.exporter,
                        &export.asset,
                        export.amount,
                        export.escrow_seqnum,
                    )
                    .await
            };
            let outcome = attempt
                .retry(
                    ExponentialBuilder::default()
                        .with_min_delay(Duration::from_millis(TRANSIENT_BACKOFF_BASE_MS))
                        .with_jitter()
                        .without_max_times(),
                )
                .when(|e: &Error| !e.is_fatal())
                .notify(|err: &Error, dur: Duration| {
                    warn!(%err, backoff = ?dur, "peg-out settlement transient error, retrying");
                })
                .await?;

            let new_state = match outcome {
                SettlementOutcome::Success => PegOutState::Ok,
                SettlementOutcome::BadSequence => {
                    any_retry = true;
                    PegOutState::Retry
                }
                SettlementOutcome::Other(reason) => {
                    warn!(txid = %hex::encode(export.txid), %reason, "peg-out settlement failed");
                    PegOutState::Fail
                }
            };
            store.set_export_state(&export.txid, new_state).await?;
            info!(txid = %hex::encode(export.txid), ?new_state, "peg-out settlement submitted");

            if matches!(new_state, PegOutState::Ok | PegOutState::Fail) {
                let finalized = ExportRecord { state: new_state, ..export };
                if finalize.send(finalized).await.is_err() {
                    return Err(Error::Cancelled);
                }
            }
        }

        if any_retry {
            let notify = notify.clone();
            tokio::spawn(async move {
                tokio::time::sleep(RETRY_DELAY).await;
                notify.notify_one();
            });
        }
    }
}
