// Copyright (c) 2025 Slidechain Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The retire watcher, run as the pin named `"exports"` (spec §4.6):
//! scans each finalized block for export-step1 log entries, inserts an
//! export row per entry, and wakes the peg-out loop.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;
use tracing::info;

use crate::contract::export_contract::ExportReference;
use crate::db::Store;
use crate::error::Error;
use crate::pin::BlockHandler;
use crate::submitter::builder::{decode_bits, TAG_EXPORT_STEP1};
use crate::types::{ExportRecord, PegOutState};
use crate::Result;

pub struct RetireWatcher {
    store: Store,
    notify: Arc<Notify>,
}

impl RetireWatcher {
    pub fn new(store: Store, notify: Arc<Notify>) -> Arc<Self> {
        Arc::new(RetireWatcher { store, notify })
    }
}

#[async_trait]
impl BlockHandler for RetireWatcher {
    async fn handle(&self, _height: u64, bits: &[u8]) -> Result<()> {
        for payload in decode_bits(bits) {
            let Some((&tag, body)) = payload.split_first() else { continue };
            if tag != TAG_EXPORT_STEP1 {
                continue;
            }
            let reference: ExportReference = serde_json::from_slice(body)
                .map_err(|e| Error::malformed(format!("export-step1 log entry: {e}")))?;

            let mut hasher = blake2b_simd::Params::new().hash_length(32).to_state();
            hasher.update(body);
            let mut txid = [0u8; 32];
            txid.copy_from_slice(hasher.finalize().as_bytes());

            let export = ExportRecord {
                txid,
                exporter: reference.exporter.clone(),
                asset: reference.asset.clone(),
                amount: reference.amount,
                temp_addr: reference.temp.clone(),
                escrow_seqnum: reference.seqnum,
                retire_anchor: reference.anchor.clone(),
                exporter_pubkey: crate::types::SideChainPubkey(reference.pubkey),
                state: PegOutState::NotYet,
            };
            self.store.insert_export(&export).await?;
            info!(txid = %hex::encode(txid), exporter = %export.exporter, "export observed");
            self.notify.notify_one();
        }
        Ok(())
    }
}
