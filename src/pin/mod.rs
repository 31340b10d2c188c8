// Copyright (c) 2025 Slidechain Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The pin runner (spec §4.3): given `(name, handler)`, replays every
//! side-chain block in ascending height to the handler, resuming from
//! a persisted height across restarts.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, trace, warn};

use crate::db::Store;
use crate::error::Error;
use crate::submitter::Submitter;
use crate::Result;

#[async_trait]
pub trait BlockHandler: Send + Sync {
    async fn handle(&self, height: u64, bits: &[u8]) -> Result<()>;
}

/// Runs the pin named `name` to completion (it only returns on fatal
/// error or clean cancellation; the supervisor treats either as a
/// reason to stop the whole process per spec §4.7).
pub async fn run(
    name: &'static str,
    store: Store,
    submitter: Arc<Submitter>,
    handler: Arc<dyn BlockHandler>,
    mut cancel: tokio::sync::watch::Receiver<bool>,
) -> Result<()> {
    // (1) insert (name, 0) if absent.
    store.ensure_pin(name).await?;
    // (2) read the persisted height.
    let mut last = store.pin_height(name).await?;

    // (3) drain the backlog: every height in (last, current_head].
    let head = store.latest_block_height().await?;
    let mut height = last + 1;
    while height <= head {
        if *cancel.borrow() {
            return Err(Error::Cancelled);
        }
        let Some(bits) = store.get_block(height).await? else {
            // Block not yet visible to this connection; retry shortly
            // rather than treating it as a gap.
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            continue;
        };
        handler.handle(height, &bits).await?;
        store.advance_pin(name, height).await?;
        last = height;
        height += 1;
    }
    trace!(pin = name, height = last, "backlog drained");

    // (4) subscribe to the submitter's broadcast and continue live.
    let mut subscriber = submitter.subscribe();
    loop {
        tokio::select! {
            biased;
            _ = cancel.changed() => return Err(Error::Cancelled),
            recv = subscriber.recv() => {
                let block = match recv {
                    Ok(block) => block,
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {
                        warn!(pin = name, "broadcast lagged, catching up from store");
                        height = last + 1;
                        let head = store.latest_block_height().await?;
                        while height <= head {
                            let Some(bits) = store.get_block(height).await? else { break };
                            handler.handle(height, &bits).await?;
                            store.advance_pin(name, height).await?;
                            last = height;
                            height += 1;
                        }
                        continue;
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        return Err(Error::Cancelled)
                    }
                };

                if block.height <= last {
                    // Late delivery of a block we already processed
                    // from the backlog; silently skipped (spec §4.3).
                    trace!(pin = name, height = block.height, "skipping already-processed block");
                    continue;
                }
                if block.height != last + 1 {
                    return Err(Error::PinGap {
                        name: name.to_string(),
                        expected: last + 1,
                        got: block.height,
                    });
                }
                handler.handle(block.height, &block.bits).await?;
                store.advance_pin(name, block.height).await?;
                last = block.height;
                info!(pin = name, height = last, "pin advanced");
            }
        }
    }
}
