// Copyright (c) 2025 Slidechain Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The settlement watcher (spec §4.6): consumes the finalization
//! channel, submits the step-2 side-chain transaction, waits for
//! inclusion, then deletes the export row. A submission failure here
//! is fatal — funds would be neither retired nor refunded (spec §4.6,
//! §7).

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::info;

use crate::contract::export_contract::{ExportReference, ExportStep2};
use crate::db::Store;
use crate::error::Error;
use crate::submitter::builder::{RawTx, TAG_EXPORT_STEP2};
use crate::submitter::Submitter;
use crate::types::ExportRecord;
use crate::Result;

fn encode_step2(step2: &ExportStep2) -> Result<Vec<u8>> {
    let mut bytes = vec![TAG_EXPORT_STEP2, step2.selector.as_i64() as u8];
    let json = serde_json::to_vec(&step2.reference)
        .map_err(|e| Error::malformed(format!("encoding export-step2: {e}")))?;
    bytes.extend_from_slice(&json);
    Ok(bytes)
}

fn reference_of(export: &ExportRecord) -> ExportReference {
    ExportReference {
        asset: export.asset.clone(),
        temp: export.temp_addr.clone(),
        seqnum: export.escrow_seqnum,
        exporter: export.exporter.clone(),
        amount: export.amount,
        anchor: export.retire_anchor.clone(),
        pubkey: export.exporter_pubkey.0,
    }
}

/// Submits the finalization transaction for one terminal export row
/// and deletes it once included.
async fn finalize_one(store: &Store, submitter: &Arc<Submitter>, export: ExportRecord) -> Result<()> {
    let step2 = ExportStep2::from_settlement(reference_of(&export), export.state);
    let bytes = encode_step2(&step2)?;

    let mut hasher = blake2b_simd::Params::new().hash_length(32).to_state();
    hasher.update(&bytes);
    let id = hasher.finalize().as_bytes().to_vec();

    let sub = submitter.submit(RawTx { id: id.clone(), bytes }).await;
    let (_tx, cancel) = watch::channel(false);
    let height = submitter.wait_for_tx(&id, sub, cancel).await?;

    store.delete_export(&export.txid).await?;
    info!(
        txid = %hex::encode(export.txid),
        selector = ?step2.selector,
        height,
        "export finalized"
    );
    Ok(())
}

/// Runs until cancelled or the finalization channel closes, which
/// only happens alongside the peg-out loop's own shutdown.
pub async fn run(
    store: Store,
    submitter: Arc<Submitter>,
    mut finalize: mpsc::Receiver<ExportRecord>,
    mut cancel: watch::Receiver<bool>,
) -> Result<()> {
    loop {
        let export = tokio::select! {
            biased;
            _ = cancel.changed() => return Err(Error::Cancelled),
            recv = finalize.recv() => match recv {
                Some(export) => export,
                None => return Err(Error::Cancelled),
            },
        };
        finalize_one(&store, &submitter, export).await?;
    }
}

/// Recovery step run once at supervisor boot (spec §8 S6): rows left
/// in a terminal state across a crash still need their finalization
/// transaction submitted, so they are re-emitted to the channel the
/// settlement watcher reads from.
pub async fn reemit_unfinalized(store: &Store, finalize: &mpsc::Sender<ExportRecord>) -> Result<()> {
    for export in store.exports_awaiting_finalization().await? {
        if finalize.send(export).await.is_err() {
            return Err(Error::Cancelled);
        }
    }
    Ok(())
}
