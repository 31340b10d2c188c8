// Copyright (c) 2025 Slidechain Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Two independently named pins replaying the same committed block
//! stream must each reach the full height on their own cursor,
//! confirming the pin mechanism (spec §4.3) generalizes across
//! multiple named consumers of one submitter.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use slidechain::db::Store;
use slidechain::pin::BlockHandler;
use slidechain::submitter::builder::RawTx;
use slidechain::submitter::Submitter;
use tokio::sync::watch;

struct CountingHandler(AtomicU64);

#[async_trait]
impl BlockHandler for CountingHandler {
    async fn handle(&self, _height: u64, _bits: &[u8]) -> slidechain::Result<()> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn two_named_pins_independently_replay_the_same_blocks() {
    let store = Store::open_in_memory().await.unwrap();
    let submitter = Submitter::new(store.clone(), Duration::from_millis(15));

    for i in 0..5u8 {
        submitter.submit(RawTx { id: vec![i], bytes: vec![i] }).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(store.latest_block_height().await.unwrap(), 5);

    let (cancel_tx, cancel_rx) = watch::channel(false);
    let exports_handler = Arc::new(CountingHandler(AtomicU64::new(0)));
    let pegouts_handler = Arc::new(CountingHandler(AtomicU64::new(0)));

    let exports_task = tokio::spawn(slidechain::pin::run(
        "exports",
        store.clone(),
        submitter.clone(),
        exports_handler.clone(),
        cancel_rx.clone(),
    ));
    let pegouts_task = tokio::spawn(slidechain::pin::run(
        "pegouts",
        store.clone(),
        submitter.clone(),
        pegouts_handler.clone(),
        cancel_rx.clone(),
    ));

    tokio::time::sleep(Duration::from_millis(80)).await;

    assert_eq!(exports_handler.0.load(Ordering::SeqCst), 5);
    assert_eq!(pegouts_handler.0.load(Ordering::SeqCst), 5);
    assert_eq!(store.pin_height("exports").await.unwrap(), 5);
    assert_eq!(store.pin_height("pegouts").await.unwrap(), 5);

    cancel_tx.send(true).unwrap();
    let _ = exports_task.await.unwrap();
    let _ = pegouts_task.await.unwrap();
}
