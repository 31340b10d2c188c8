// Copyright (c) 2025 Slidechain Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The side-chain submitter (spec §4.2): batches submitted
//! transactions into blocks on a timer, persists them through the
//! durable store, and broadcasts committed blocks to subscribers.

pub mod broadcast;
pub mod builder;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{error, info};

use crate::db::Store;
use crate::error::Error;
use crate::Result;
use broadcast::{Broadcaster, Subscriber};
use builder::{BlockBuilder, RawTx};

/// A committed side-chain block, served by `GET /get` and observed by
/// pins, exactly the bytes the external VM produced (spec §6).
#[derive(Debug, Clone)]
pub struct Block {
    pub height: u64,
    pub hash: Vec<u8>,
    pub bits: Vec<u8>,
    /// Ids of the transactions this block includes, in order. Not
    /// persisted (the store only keeps the opaque `bits`); kept
    /// in-memory on the broadcast copy so `WaitForTx` can match by id
    /// rather than scanning raw bytes.
    pub tx_ids: Vec<Vec<u8>>,
}

impl Block {
    pub fn contains_tx(&self, id: &[u8]) -> bool {
        self.tx_ids.iter().any(|t| t == id)
    }
}

pub struct Submitter {
    store: Store,
    block_interval: Duration,
    builder: Mutex<Option<BlockBuilder>>,
    broadcaster: Broadcaster,
}

impl Submitter {
    pub fn new(store: Store, block_interval: Duration) -> Arc<Self> {
        Arc::new(Submitter {
            store,
            block_interval,
            builder: Mutex::new(None),
            broadcaster: Broadcaster::new(),
        })
    }

    /// `Submit(tx) -> subscriber` (spec §4.2). Opens a block if none is
    /// pending and arms its commit timer; returns a subscriber bound
    /// to every block committed from now on.
    pub async fn submit(self: &Arc<Self>, tx: RawTx) -> Subscriber {
        let mut guard = self.builder.lock().await;
        if guard.is_none() {
            let next_height = self.store.latest_block_height().await.unwrap_or(0) + 1;
            *guard = Some(BlockBuilder::new(next_height));
            self.arm_commit_timer();
        }
        if let Some(b) = guard.as_mut() {
            b.push(tx);
        }
        self.broadcaster.subscribe()
    }

    fn arm_commit_timer(self: &Arc<Self>) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(this.block_interval).await;
            this.commit().await;
        });
    }

    /// Fires on timer expiry. An empty pending block is skipped
    /// without committing (spec §4.2). Any store failure here is
    /// fatal: half-committed blocks are never tolerated. The builder
    /// lock is held across the `finalize_height` write, not just the
    /// `take()`, so a `submit()` racing this commit reads
    /// `latest_block_height()` only after the write lands — otherwise
    /// it would compute the same `next_height` and open a second
    /// block at an already-committed height.
    async fn commit(self: &Arc<Self>) {
        let mut guard = self.builder.lock().await;
        let Some(builder) = guard.take() else { return };
        if builder.is_empty() {
            return;
        }
        let height = builder.height;
        let tx_ids = builder.pending.iter().map(|tx| tx.id.clone()).collect();
        let (hash, bits, snapshot) = builder.commit();

        if let Err(err) = self
            .store
            .finalize_height(height, &hash, &bits, &snapshot)
            .await
        {
            error!(%err, height, "fatal: failed to commit side-chain block");
            std::process::exit(1);
        }
        drop(guard);

        info!(height, "committed side-chain block");
        self.broadcaster
            .publish(Arc::new(Block { height, hash, bits, tx_ids }));
    }

    /// `WaitForTx(id, subscriber)` (spec §4.2): resolves when `id`
    /// appears in a committed block, or returns
    /// [`Error::Cancelled`] if `cancel` fires first.
    pub async fn wait_for_tx(
        &self,
        id: &[u8],
        mut subscriber: Subscriber,
        mut cancel: tokio::sync::watch::Receiver<bool>,
    ) -> Result<u64> {
        loop {
            tokio::select! {
                biased;
                _ = cancel.changed() => return Err(Error::Cancelled),
                recv = subscriber.recv() => {
                    match recv {
                        Ok(block) => {
                            if block.contains_tx(id) {
                                return Ok(block.height);
                            }
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                            return Err(Error::Cancelled)
                        }
                    }
                }
            }
        }
    }

    /// `GetBlock(H, ctx)` (spec §4.2, §6): returns block `H`, blocking
    /// until it exists or `deadline` elapses, in which case the HTTP
    /// layer maps the resulting error to 408. `H=0` means "current
    /// head, blocking until one exists" (spec §6); the broadcaster is
    /// subscribed *before* the store is re-checked, so a block
    /// committed in the gap between the two checks is never missed,
    /// and the wait matches the first block received at any height
    /// rather than a height pinned at 0 before genesis.
    pub async fn get_block(&self, height: u64, deadline: Duration) -> Result<Vec<u8>> {
        if height != 0 {
            if let Some(bits) = self.store.get_block(height).await? {
                return Ok(bits);
            }
            let mut subscriber = self.broadcaster.subscribe();
            let wait = async {
                loop {
                    match subscriber.recv().await {
                        Ok(block) if block.height == height => return Ok(block.bits.clone()),
                        Ok(_) => continue,
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                            return Err(Error::Cancelled)
                        }
                    }
                }
            };
            return timeout(deadline, wait).await.map_err(|_| Error::Cancelled)?;
        }

        let mut subscriber = self.broadcaster.subscribe();
        let head = self.store.latest_block_height().await?;
        if head != 0 {
            if let Some(bits) = self.store.get_block(head).await? {
                return Ok(bits);
            }
        }
        let wait = async {
            loop {
                match subscriber.recv().await {
                    Ok(block) => return Ok(block.bits.clone()),
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        return Err(Error::Cancelled)
                    }
                }
            }
        };
        timeout(deadline, wait)
            .await
            .map_err(|_| Error::Cancelled)?
    }

    pub fn subscribe(&self) -> Subscriber {
        self.broadcaster.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn new_submitter() -> Arc<Submitter> {
        let store = Store::open_in_memory().await.unwrap();
        Submitter::new(store, Duration::from_millis(20))
    }

    #[tokio::test]
    async fn submit_then_get_block_after_commit() {
        let submitter = new_submitter().await;
        let _sub = submitter
            .submit(RawTx { id: vec![1], bytes: b"hello".to_vec() })
            .await;
        let bits = submitter
            .get_block(1, Duration::from_secs(2))
            .await
            .unwrap();
        assert!(!bits.is_empty());
    }

    #[tokio::test]
    async fn wait_for_tx_resolves_on_inclusion() {
        let submitter = new_submitter().await;
        let sub = submitter
            .submit(RawTx { id: b"needle".to_vec(), bytes: b"payload".to_vec() })
            .await;
        let (_tx, rx) = tokio::sync::watch::channel(false);
        let height = submitter.wait_for_tx(b"needle", sub, rx).await.unwrap();
        assert_eq!(height, 1);
    }

    #[tokio::test]
    async fn get_block_times_out_when_never_committed() {
        let submitter = new_submitter().await;
        let result = submitter.get_block(99, Duration::from_millis(50)).await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn get_block_zero_blocks_until_genesis_then_resolves() {
        let submitter = new_submitter().await;
        assert_eq!(submitter.store.latest_block_height().await.unwrap(), 0);

        let waiter = {
            let submitter = submitter.clone();
            tokio::spawn(async move { submitter.get_block(0, Duration::from_secs(2)).await })
        };
        // give get_block a chance to subscribe before the first block commits
        tokio::time::sleep(Duration::from_millis(10)).await;
        let _sub = submitter
            .submit(RawTx { id: vec![1], bytes: b"hello".to_vec() })
            .await;

        let bits = waiter.await.unwrap().unwrap();
        assert!(!bits.is_empty());
    }

    #[tokio::test]
    async fn empty_block_is_skipped() {
        let submitter = new_submitter().await;
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(submitter.store.latest_block_height().await.unwrap(), 0);
    }
}
